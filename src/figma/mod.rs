pub mod models;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use thiserror::Error;

pub use models::{Comment, CommentsResponse, FileResponse, Page, User};

pub const DEFAULT_API_BASE: &str = "https://api.figma.com/v1";
pub const TOKEN_HEADER: &str = "x-figma-token";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("access token contains characters not allowed in a header")]
    InvalidToken,

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("unexpected payload from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub api_base: String,
    pub timeout_seconds: u64,
    pub proxy: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_seconds: 30,
            proxy: None,
        }
    }
}

/// Both resources of one design file, fetched together.
#[derive(Clone, Debug, Default)]
pub struct FileSnapshot {
    pub project_name: String,
    pub pages: Vec<Page>,
    pub comments: Vec<Comment>,
}

#[derive(Clone, Debug)]
pub struct FigmaClient {
    http: reqwest::Client,
    api_base: String,
}

impl FigmaClient {
    pub fn new(token: &str, options: &ClientOptions) -> Result<Self, FetchError> {
        let mut token_value =
            HeaderValue::from_str(token.trim()).map_err(|_| FetchError::InvalidToken)?;
        token_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, token_value);
        headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(concat!("design-insights/", env!("CARGO_PKG_VERSION"))),
        );

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(options.timeout_seconds.max(1)));
        if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let p = reqwest::Proxy::all(proxy).map_err(|e| FetchError::ProxySetup {
                proxy: proxy.to_string(),
                source: e,
            })?;
            builder = builder.proxy(p);
        }
        let http = builder
            .build()
            .map_err(|e| FetchError::ClientBuild { source: e })?;

        Ok(Self {
            http,
            api_base: options.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let endpoint = self.endpoint(path);
        tracing::debug!(%endpoint, "requesting");

        let response = self
            .http
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| FetchError::Transport {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        tracing::debug!(%endpoint, bytes = body.len(), "response received");

        serde_json::from_slice::<T>(&body).map_err(|e| FetchError::Decode {
            endpoint,
            source: e,
        })
    }

    pub async fn fetch_comments(&self, file_key: &str) -> Result<Vec<Comment>, FetchError> {
        let response: CommentsResponse = self
            .get_json(&format!("files/{file_key}/comments"))
            .await?;
        Ok(response.comments)
    }

    pub async fn fetch_file(&self, file_key: &str) -> Result<FileResponse, FetchError> {
        self.get_json(&format!("files/{file_key}")).await
    }

    /// Runs both requests concurrently and fails on the first error.
    pub async fn fetch_snapshot(&self, file_key: &str) -> Result<FileSnapshot, FetchError> {
        let (comments, file) = futures::future::try_join(
            self.fetch_comments(file_key),
            self.fetch_file(file_key),
        )
        .await?;

        let pages = file.pages();
        tracing::info!(
            comments = comments.len(),
            pages = pages.len(),
            project = %file.name,
            "file data loaded"
        );

        Ok(FileSnapshot {
            project_name: file.name,
            pages,
            comments,
        })
    }
}

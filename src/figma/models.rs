use serde::{Deserialize, Serialize};

pub const CANVAS_NODE_TYPE: &str = "CANVAS";

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct User {
    #[serde(default)]
    pub handle: Option<String>,
}

/// A single review comment as returned by `GET /files/{key}/comments`.
///
/// `message` and `user.handle` are optional on the wire so that one broken
/// record can be skipped during aggregation instead of failing the whole
/// payload decode.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Comment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub resolved_at: Option<String>,
    #[serde(default)]
    pub client_meta: Option<serde_json::Value>,
}

impl Comment {
    pub fn author_handle(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.handle.as_deref())
    }

    /// Node the comment is pinned to. `client_meta` is either a frame offset
    /// carrying a `node_id`, a bare canvas position, or missing entirely.
    pub fn target_node_id(&self) -> Option<&str> {
        self.client_meta
            .as_ref()
            .and_then(|meta| meta.get("node_id"))
            .and_then(|node| node.as_str())
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_at
            .as_deref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Builders for fixtures.
#[cfg(test)]
impl Comment {
    pub fn new(id: &str, message: &str, author_handle: &str) -> Self {
        Self {
            id: id.to_string(),
            message: Some(message.to_string()),
            user: Some(User {
                handle: Some(author_handle.to_string()),
            }),
            ..Self::default()
        }
    }

    pub fn on_node(mut self, node_id: &str) -> Self {
        self.client_meta = Some(serde_json::json!({ "node_id": node_id }));
        self
    }

    pub fn created(mut self, at: &str) -> Self {
        self.created_at = at.to_string();
        self
    }

    pub fn resolved(mut self, at: &str) -> Self {
        self.resolved_at = Some(at.to_string());
        self
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CommentsResponse {
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Page {
    pub id: String,
    pub name: String,
}

impl Page {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

/// Top-level child of the document. Deeper levels of the tree are ignored.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DocumentChild {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub node_type: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DocumentNode {
    #[serde(default)]
    pub children: Vec<DocumentChild>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct FileResponse {
    #[serde(default)]
    pub name: String,
    pub document: DocumentNode,
}

impl FileResponse {
    pub fn pages(&self) -> Vec<Page> {
        self.document
            .children
            .iter()
            .filter(|child| child.node_type == CANVAS_NODE_TYPE)
            .map(|child| Page {
                id: child.id.clone(),
                name: child.name.clone(),
            })
            .collect()
    }
}

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use crate::aggregate::{self, AggregatedRow, Aggregation, TrackingConfig};
use crate::figma::{ClientOptions, FetchError, FigmaClient, FileSnapshot, Page};
use crate::filter::{self, FilterCriteria, FilterOutcome};

#[derive(Clone, Debug, Default)]
pub struct Options {
    pub token: String,
    pub file_key: String,
    pub client: ClientOptions,
    pub tracking: TrackingConfig,
    /// `page_id` may also hold a page name, see [`filter::resolve_page_selector`].
    pub criteria: FilterCriteria,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("missing {field}: both the access token and the file key are required")]
    MissingCredentials { field: &'static str },

    #[error("design data unavailable: {source}")]
    Fetch {
        #[from]
        source: FetchError,
    },
}

/// Everything needed to render one load: the joined rows, the counters and
/// the current filter state. A new value replaces the previous one on every
/// load.
#[derive(Clone, Debug)]
pub struct Insights {
    pub project_name: String,
    pub pages: Vec<Page>,
    pub aggregation: Aggregation,
    pub tracking: TrackingConfig,
    pub criteria: FilterCriteria,
    pub outcome: FilterOutcome,
    pub elapsed: Duration,
}

impl Insights {
    pub fn from_snapshot(
        snapshot: FileSnapshot,
        tracking: &TrackingConfig,
        criteria: &FilterCriteria,
    ) -> Self {
        let aggregation = aggregate::aggregate(&snapshot.comments, &snapshot.pages, tracking);
        let mut insights = Self {
            project_name: snapshot.project_name,
            pages: snapshot.pages,
            aggregation,
            tracking: tracking.clone(),
            criteria: FilterCriteria::default(),
            outcome: FilterOutcome::default(),
            elapsed: Duration::default(),
        };
        insights.apply_filters(criteria.clone());
        insights
    }

    /// Re-evaluates visibility for new criteria. Counters are not affected.
    pub fn apply_filters(&mut self, mut criteria: FilterCriteria) {
        criteria.page_id = filter::resolve_page_selector(&self.pages, &criteria.page_id);
        self.outcome = filter::evaluate(&self.aggregation.rows, &criteria);
        self.criteria = criteria;
        tracing::debug!(
            visible = self.outcome.visible_count,
            total = self.aggregation.rows.len(),
            "filters applied"
        );
    }

    pub fn visible_rows(&self) -> Vec<&AggregatedRow> {
        self.aggregation
            .rows
            .iter()
            .zip(self.outcome.visibility.iter())
            .filter(|(_, visible)| **visible)
            .map(|(row, _)| row)
            .collect()
    }

    pub fn visible_count(&self) -> usize {
        self.outcome.visible_count
    }

    pub fn total_count(&self) -> usize {
        self.aggregation.rows.len()
    }
}

#[derive(Clone, Debug)]
pub struct Runner {
    options: Options,
}

impl Runner {
    pub fn new(options: Options) -> Result<Self, RunnerError> {
        if options.token.trim().is_empty() {
            return Err(RunnerError::MissingCredentials {
                field: "access token",
            });
        }
        if options.file_key.trim().is_empty() {
            return Err(RunnerError::MissingCredentials { field: "file key" });
        }
        Ok(Self { options })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub async fn run(&self) -> Result<Insights, RunnerError> {
        let started_at = Instant::now();

        let client = FigmaClient::new(&self.options.token, &self.options.client)?;
        let snapshot = client
            .fetch_snapshot(self.options.file_key.trim())
            .await
            .map_err(|e| {
                tracing::error!("failed to load design data: {e}");
                e
            })?;

        let mut insights =
            Insights::from_snapshot(snapshot, &self.options.tracking, &self.options.criteria);
        insights.elapsed = started_at.elapsed();
        Ok(insights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figma::Comment;

    fn snapshot() -> FileSnapshot {
        FileSnapshot {
            project_name: "Loja".to_string(),
            pages: vec![Page::new("0:1", "Home"), Page::new("0:2", "Checkout")],
            comments: vec![
                Comment::new("1", "gutierres #estilos", "dana").on_node("0:1"),
                Comment::new("2", "layout", "marco").on_node("0:2"),
                Comment::new("3", "solto", "zoe"),
            ],
        }
    }

    #[test]
    fn missing_token_is_rejected_before_network() {
        let err = Runner::new(Options {
            token: "  ".to_string(),
            file_key: "abc".to_string(),
            ..Options::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            RunnerError::MissingCredentials {
                field: "access token"
            }
        ));
    }

    #[test]
    fn missing_file_key_is_rejected_before_network() {
        let err = Runner::new(Options {
            token: "t".to_string(),
            ..Options::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            RunnerError::MissingCredentials { field: "file key" }
        ));
    }

    #[test]
    fn page_name_selector_resolves_to_id() {
        let criteria = FilterCriteria {
            page_id: "checkout".to_string(),
            ..FilterCriteria::default()
        };
        let insights = Insights::from_snapshot(snapshot(), &TrackingConfig::default(), &criteria);
        assert_eq!(insights.criteria.page_id, "0:2");
        assert_eq!(insights.visible_count(), 1);
        assert_eq!(insights.visible_rows()[0].comment.id, "2");
        assert_eq!(insights.total_count(), 3);
    }

    #[test]
    fn refiltering_keeps_counters() {
        let mut insights = Insights::from_snapshot(
            snapshot(),
            &TrackingConfig::default(),
            &FilterCriteria::default(),
        );
        assert_eq!(insights.visible_count(), 3);
        let before = insights.aggregation.total_tag_counters.clone();

        insights.apply_filters(FilterCriteria {
            author_substring: "zo".to_string(),
            ..FilterCriteria::default()
        });
        assert_eq!(insights.visible_count(), 1);
        assert_eq!(insights.aggregation.total_tag_counters, before);
    }
}

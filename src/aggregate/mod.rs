use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::figma::{Comment, Page};

pub const NOT_FOUND_PAGE: &str = "Página não encontrada";

pub const DEFAULT_MENTIONS: [&str; 3] = ["jheny nunes", "gutierres", "emily salvador"];

pub const DEFAULT_TAGS: [&str; 5] = [
    "auto_layout",
    "estilos",
    "variaveis",
    "componentes",
    "prototipo",
];

/// Person names and tags counted during aggregation.
///
/// Both lists are stored lowercased, deduplicated, with whitespace runs
/// collapsed to a single space. Tags are kept
/// without their leading `#`; matching happens against `#<tag>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackingConfig {
    mentions: Vec<String>,
    tags: Vec<String>,
}

impl TrackingConfig {
    pub fn new<M, T>(mentions: M, tags: T) -> Self
    where
        M: IntoIterator,
        M::Item: AsRef<str>,
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        Self {
            mentions: normalize_list(mentions, str::trim),
            tags: normalize_list(tags, strip_hash),
        }
    }

    pub fn mentions(&self) -> &[String] {
        &self.mentions
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MENTIONS, DEFAULT_TAGS)
    }
}

fn strip_hash(tag: &str) -> &str {
    tag.trim().trim_start_matches('#')
}

fn normalize_list<I>(values: I, strip: fn(&str) -> &str) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for value in values {
        let v = strip(value.as_ref())
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        if v.is_empty() || out.contains(&v) {
            continue;
        }
        out.push(v);
    }
    out
}

/// Lookup from canvas node id to page name.
#[derive(Clone, Debug, Default)]
pub struct PageIndex {
    names: HashMap<String, String>,
}

impl PageIndex {
    pub fn from_pages(pages: &[Page]) -> Self {
        let mut names = HashMap::with_capacity(pages.len());
        for page in pages {
            // first page wins on duplicate ids
            names
                .entry(page.id.clone())
                .or_insert_with(|| page.name.clone());
        }
        Self { names }
    }

    pub fn resolve(&self, node_id: Option<&str>) -> Option<(&str, &str)> {
        let id = node_id?;
        self.names
            .get_key_value(id)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Per-tag counters in tracking order. Every tracked tag is always present.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TagCounters {
    entries: Vec<TagCount>,
}

impl TagCounters {
    fn zeroed(tags: &[String]) -> Self {
        Self {
            entries: tags
                .iter()
                .map(|tag| TagCount {
                    tag: tag.clone(),
                    count: 0,
                })
                .collect(),
        }
    }

    fn bump(&mut self, idx: usize) {
        if let Some(entry) = self.entries.get_mut(idx) {
            entry.count += 1;
        }
    }

    /// Count for `tag`, `None` when the tag is not tracked.
    pub fn get(&self, tag: &str) -> Option<usize> {
        let tag = tag.trim_start_matches('#').to_lowercase();
        self.entries.iter().find(|e| e.tag == tag).map(|e| e.count)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagCount> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct PersonCounters {
    pub person: String,
    pub tags: TagCounters,
}

/// Tag counters per tracked person, in tracking order.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct MentionCounters {
    entries: Vec<PersonCounters>,
}

impl MentionCounters {
    fn zeroed(tracking: &TrackingConfig) -> Self {
        Self {
            entries: tracking
                .mentions()
                .iter()
                .map(|person| PersonCounters {
                    person: person.clone(),
                    tags: TagCounters::zeroed(tracking.tags()),
                })
                .collect(),
        }
    }

    pub fn person(&self, person: &str) -> Option<&TagCounters> {
        let person = person.trim().to_lowercase();
        self.entries
            .iter()
            .find(|e| e.person == person)
            .map(|e| &e.tags)
    }

    /// Count for `(person, tag)`, `None` when either is not tracked.
    pub fn get(&self, person: &str, tag: &str) -> Option<usize> {
        self.person(person)?.get(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PersonCounters> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("comment '{id}' is missing its {field}")]
pub struct MalformedComment {
    pub id: String,
    pub field: &'static str,
}

/// One comment joined with its page, ready for filtering and rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregatedRow {
    pub comment: Comment,
    pub page_id: Option<String>,
    pub page_name: String,
    pub lowercase_message: String,
    pub lowercase_author: String,
    message: String,
    author: String,
}

impl AggregatedRow {
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn page_found(&self) -> bool {
        self.page_id.is_some()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Aggregation {
    pub rows: Vec<AggregatedRow>,
    pub mention_counters: MentionCounters,
    pub total_tag_counters: TagCounters,
    pub skipped: Vec<MalformedComment>,
}

impl Aggregation {
    /// Distinct author handles in first-seen order.
    pub fn authors(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for row in self.rows.iter() {
            if !out.contains(&row.author()) {
                out.push(row.author());
            }
        }
        out
    }
}

fn validate(comment: &Comment) -> Result<(&str, &str), MalformedComment> {
    let message = comment.message.as_deref().ok_or_else(|| MalformedComment {
        id: comment.id.clone(),
        field: "message",
    })?;
    let author = comment.author_handle().ok_or_else(|| MalformedComment {
        id: comment.id.clone(),
        field: "author handle",
    })?;
    Ok((message, author))
}

/// Joins comments with their pages and tallies tracked mentions and tags.
///
/// Rows keep input order. A comment missing its message or author handle is
/// skipped and listed in [`Aggregation::skipped`].
pub fn aggregate(comments: &[Comment], pages: &[Page], tracking: &TrackingConfig) -> Aggregation {
    let index = PageIndex::from_pages(pages);
    let hashtags: Vec<String> = tracking.tags().iter().map(|t| format!("#{t}")).collect();

    let mut mention_counters = MentionCounters::zeroed(tracking);
    let mut total_tag_counters = TagCounters::zeroed(tracking.tags());
    let mut rows = Vec::with_capacity(comments.len());
    let mut skipped = Vec::new();

    for comment in comments {
        let (message, author) = match validate(comment) {
            Ok(fields) => fields,
            Err(e) => {
                tracing::warn!("skipping comment: {e}");
                skipped.push(e);
                continue;
            }
        };

        let lowercase_message = message.to_lowercase();
        let found_tags: Vec<usize> = hashtags
            .iter()
            .enumerate()
            .filter(|(_, hashtag)| lowercase_message.contains(hashtag.as_str()))
            .map(|(idx, _)| idx)
            .collect();

        for person in mention_counters.entries.iter_mut() {
            if !lowercase_message.contains(person.person.as_str()) {
                continue;
            }
            for idx in found_tags.iter() {
                person.tags.bump(*idx);
            }
        }
        for idx in found_tags.iter() {
            total_tag_counters.bump(*idx);
        }

        let (page_id, page_name) = match index.resolve(comment.target_node_id()) {
            Some((id, name)) => (Some(id.to_string()), name.to_string()),
            None => (None, NOT_FOUND_PAGE.to_string()),
        };

        rows.push(AggregatedRow {
            comment: comment.clone(),
            page_id,
            page_name,
            lowercase_message,
            lowercase_author: author.to_lowercase(),
            message: message.to_string(),
            author: author.to_string(),
        });
    }

    tracing::debug!(
        rows = rows.len(),
        skipped = skipped.len(),
        pages = index.len(),
        "aggregation finished"
    );

    Aggregation {
        rows,
        mention_counters,
        total_tag_counters,
        skipped,
    }
}

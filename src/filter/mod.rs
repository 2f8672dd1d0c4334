use serde::{Deserialize, Serialize};

use crate::aggregate::AggregatedRow;
use crate::figma::Page;

/// Row filters. An empty field places no constraint on that dimension.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct FilterCriteria {
    #[serde(default)]
    pub page_id: String,
    #[serde(default)]
    pub free_text: String,
    #[serde(default)]
    pub mentioned_person: String,
    #[serde(default)]
    pub author_substring: String,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.page_id.is_empty()
            && self.free_text.is_empty()
            && self.mentioned_person.is_empty()
            && self.author_substring.is_empty()
    }

    fn predicate(&self) -> Predicate<'_> {
        Predicate {
            page_id: self.page_id.as_str(),
            free_text: self.free_text.to_lowercase(),
            mentioned_person: self.mentioned_person.to_lowercase(),
            author_substring: self.author_substring.to_lowercase(),
        }
    }

    pub fn matches(&self, row: &AggregatedRow) -> bool {
        self.predicate().matches(row)
    }
}

// criteria lowercased once per evaluation
struct Predicate<'a> {
    page_id: &'a str,
    free_text: String,
    mentioned_person: String,
    author_substring: String,
}

impl Predicate<'_> {
    fn matches(&self, row: &AggregatedRow) -> bool {
        let page_match =
            self.page_id.is_empty() || row.page_id.as_deref() == Some(self.page_id);
        let text_match =
            self.free_text.is_empty() || row.lowercase_message.contains(&self.free_text);
        let mention_match = self.mentioned_person.is_empty()
            || row.lowercase_message.contains(&self.mentioned_person);
        let author_match = self.author_substring.is_empty()
            || row.lowercase_author.contains(&self.author_substring);
        page_match && text_match && mention_match && author_match
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    pub visibility: Vec<bool>,
    pub visible_count: usize,
}

pub fn evaluate(rows: &[AggregatedRow], criteria: &FilterCriteria) -> FilterOutcome {
    let predicate = criteria.predicate();
    let visibility: Vec<bool> = rows.iter().map(|row| predicate.matches(row)).collect();
    let visible_count = visibility.iter().filter(|v| **v).count();
    FilterOutcome {
        visibility,
        visible_count,
    }
}

pub fn visible_rows<'a>(
    rows: &'a [AggregatedRow],
    criteria: &FilterCriteria,
) -> Vec<&'a AggregatedRow> {
    let predicate = criteria.predicate();
    rows.iter().filter(|row| predicate.matches(row)).collect()
}

/// Maps a `--page` selector to a page id.
///
/// An exact id wins. Otherwise a page name matching exactly one page
/// (case-insensitive) resolves to that page's id. Anything else is kept
/// verbatim and will simply match no row.
pub fn resolve_page_selector(pages: &[Page], selector: &str) -> String {
    let selector = selector.trim();
    if selector.is_empty() || pages.iter().any(|p| p.id == selector) {
        return selector.to_string();
    }
    let wanted = selector.to_lowercase();
    let mut by_name = pages.iter().filter(|p| p.name.to_lowercase() == wanted);
    match (by_name.next(), by_name.next()) {
        (Some(page), None) => page.id.clone(),
        _ => selector.to_string(),
    }
}

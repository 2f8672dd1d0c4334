pub mod report;

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use crate::aggregate::{AggregatedRow, MentionCounters, TagCounters};
use crate::figma::Page;
use crate::filter::FilterCriteria;
use crate::runner::Insights;

pub const STATUS_RESOLVED: &str = "Resolvido";
pub const STATUS_OPEN: &str = "Não Resolvido";
pub const COMMENT_HEADERS: [&str; 6] = [
    "Comentário",
    "Página",
    "Autor",
    "Criado em",
    "Status",
    "Resolvido em",
];
pub const KEYWORD_HEADERS: [&str; 2] = ["Palavra-chave", "Ocorrências"];
pub const TOTAL_TABLE_TITLE: &str = "Total de Ocorrências por Tag";
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Tsv,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "tsv" | "copy" => Some(Self::Tsv),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".tsv") {
        return Some(OutputFormat::Tsv);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

/// Text of one cell as it is displayed: whitespace runs collapsed to a
/// single space and trimmed, so tabs and newlines never leak into the
/// tab-separated copy format.
pub fn cell_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(ts) => ts.with_timezone(&Utc).format(TIMESTAMP_FORMAT).to_string(),
        Err(_) => raw.trim().to_string(),
    }
}

pub fn report_title(project_name: &str) -> String {
    format!("Design Insights | {project_name}")
}

pub fn count_line(count: usize) -> String {
    format!("Total de Comentários: {count}")
}

pub fn keyword_table_title(person: &str) -> String {
    format!("Responsável - {person}")
}

/// A rendered table: optional title row, header row, body rows.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct TableView {
    pub title: Option<String>,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    /// Every displayed line, title and header included.
    pub fn lines(&self) -> Vec<Vec<String>> {
        let mut out = Vec::with_capacity(self.rows.len() + 2);
        if let Some(title) = self.title.as_ref() {
            out.push(vec![title.clone()]);
        }
        if !self.header.is_empty() {
            out.push(self.header.clone());
        }
        out.extend(self.rows.iter().cloned());
        out
    }

    /// Copy format: cells joined by tabs, each line ended by a newline.
    pub fn to_tsv(&self) -> String {
        let mut out = String::new();
        for line in self.lines() {
            out.push_str(&line.join("\t"));
            out.push('\n');
        }
        out
    }
}

fn comment_cells(row: &AggregatedRow) -> Vec<String> {
    let comment = &row.comment;
    let (status, resolved_at) = if comment.is_resolved() {
        (
            STATUS_RESOLVED.to_string(),
            format_timestamp(comment.resolved_at.as_deref().unwrap_or_default()),
        )
    } else {
        (STATUS_OPEN.to_string(), STATUS_OPEN.to_string())
    };
    vec![
        cell_text(row.message()),
        cell_text(&row.page_name),
        cell_text(row.author()),
        cell_text(&format_timestamp(&comment.created_at)),
        status,
        cell_text(&resolved_at),
    ]
}

pub fn comments_table(rows: &[&AggregatedRow]) -> TableView {
    TableView {
        title: None,
        header: COMMENT_HEADERS.iter().map(|h| h.to_string()).collect(),
        rows: rows.iter().map(|row| comment_cells(row)).collect(),
    }
}

fn counts_table(title: &str, counters: &TagCounters) -> TableView {
    TableView {
        title: Some(cell_text(title)),
        header: KEYWORD_HEADERS.iter().map(|h| h.to_string()).collect(),
        rows: counters
            .iter()
            .map(|c| vec![cell_text(&c.tag), c.count.to_string()])
            .collect(),
    }
}

pub fn keyword_tables(counters: &MentionCounters) -> Vec<TableView> {
    counters
        .iter()
        .map(|p| counts_table(&keyword_table_title(&p.person), &p.tags))
        .collect()
}

pub fn total_table(totals: &TagCounters) -> TableView {
    counts_table(TOTAL_TABLE_TITLE, totals)
}

pub fn all_tables(insights: &Insights) -> Vec<TableView> {
    let mut tables = vec![comments_table(&insights.visible_rows())];
    tables.extend(keyword_tables(&insights.aggregation.mention_counters));
    tables.push(total_table(&insights.aggregation.total_tag_counters));
    tables
}

pub fn render_tsv(insights: &Insights) -> Vec<u8> {
    all_tables(insights)
        .iter()
        .map(|t| t.to_tsv())
        .collect::<Vec<_>>()
        .join("\n")
        .into_bytes()
}

fn column_widths(table: &TableView) -> Vec<usize> {
    let mut widths: Vec<usize> = vec![0; table.header.len()];
    for line in std::iter::once(&table.header).chain(table.rows.iter()) {
        for (idx, cell) in line.iter().enumerate() {
            if idx >= widths.len() {
                widths.push(0);
            }
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }
    widths
}

fn pad(cell: &str, width: usize) -> String {
    let len = cell.chars().count();
    format!("{cell}{}", " ".repeat(width.saturating_sub(len)))
}

fn render_table_text(out: &mut String, table: &TableView) {
    let widths = column_widths(table);
    if let Some(title) = table.title.as_ref() {
        out.push_str(&format!(":: {}\n", title.bold()));
    }
    let header = table
        .header
        .iter()
        .enumerate()
        .map(|(idx, h)| pad(h, widths[idx]).cyan().bold().to_string())
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(header.trim_end());
    out.push('\n');
    for row in table.rows.iter() {
        let line = row
            .iter()
            .enumerate()
            .map(|(idx, cell)| pad(cell, widths[idx]))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
}

pub fn render_text(insights: &Insights) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(&format!(":: {}\n", report_title(&insights.project_name).bold()));
    out.push_str(&format!(":: {}\n\n", count_line(insights.visible_count())));

    let tables = all_tables(insights);
    for (idx, table) in tables.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        render_table_text(&mut out, table);
    }
    out.into_bytes()
}

#[derive(Clone, Debug, Serialize)]
pub struct CommentRecord {
    pub id: String,
    pub message: String,
    pub page_id: Option<String>,
    pub page: String,
    pub author: String,
    pub created_at: String,
    pub status: String,
    pub resolved_at: String,
    /// Match keys shared with the filter engine, before cell collapsing.
    pub lowercase_message: String,
    pub lowercase_author: String,
    pub visible: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct InsightsRecord<'a> {
    pub title: String,
    pub project: &'a str,
    pub total_comments: usize,
    pub visible_comments: usize,
    pub filters: &'a FilterCriteria,
    pub pages: &'a [Page],
    pub page_options: Vec<Page>,
    pub authors: Vec<&'a str>,
    pub mentions: &'a [String],
    pub tags: &'a [String],
    pub comments: Vec<CommentRecord>,
    pub mention_counters: &'a MentionCounters,
    pub total_tag_counters: &'a TagCounters,
    pub skipped: Vec<String>,
}

/// Choices for the report's page selector. A page filter naming no page is
/// kept as its own option so the report shows the same rows as the CLI.
fn page_options(pages: &[Page], page_id: &str) -> Vec<Page> {
    let mut options = pages.to_vec();
    if !page_id.is_empty() && !pages.iter().any(|p| p.id == page_id) {
        options.push(Page::new(page_id, page_id));
    }
    options
}

pub fn build_record(insights: &Insights) -> InsightsRecord<'_> {
    let comments = insights
        .aggregation
        .rows
        .iter()
        .zip(insights.outcome.visibility.iter())
        .map(|(row, visible)| {
            let cells = comment_cells(row);
            CommentRecord {
                id: row.comment.id.clone(),
                message: cells[0].clone(),
                page_id: row.page_id.clone(),
                page: cells[1].clone(),
                author: cells[2].clone(),
                created_at: cells[3].clone(),
                status: cells[4].clone(),
                resolved_at: cells[5].clone(),
                lowercase_message: row.lowercase_message.clone(),
                lowercase_author: row.lowercase_author.clone(),
                visible: *visible,
            }
        })
        .collect();

    InsightsRecord {
        title: report_title(&insights.project_name),
        project: &insights.project_name,
        total_comments: insights.total_count(),
        visible_comments: insights.visible_count(),
        filters: &insights.criteria,
        pages: &insights.pages,
        page_options: page_options(&insights.pages, &insights.criteria.page_id),
        authors: insights.aggregation.authors(),
        mentions: insights.tracking.mentions(),
        tags: insights.tracking.tags(),
        comments,
        mention_counters: &insights.aggregation.mention_counters,
        total_tag_counters: &insights.aggregation.total_tag_counters,
        skipped: insights
            .aggregation
            .skipped
            .iter()
            .map(|e| e.to_string())
            .collect(),
    }
}

pub fn render_json(insights: &Insights) -> Vec<u8> {
    serde_json::to_vec_pretty(&build_record(insights)).unwrap_or_else(|_| b"{}\n".to_vec())
}

pub fn render_html(insights: &Insights) -> Vec<u8> {
    report::render_html(&build_record(insights))
}

pub fn render(format: OutputFormat, insights: &Insights) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(insights),
        OutputFormat::Tsv => render_tsv(insights),
        OutputFormat::Json => render_json(insights),
        OutputFormat::Html => render_html(insights),
    }
}

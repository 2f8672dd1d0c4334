use design_insights::aggregate::TrackingConfig;
use design_insights::figma::{CommentsResponse, FileResponse, FileSnapshot};
use design_insights::filter::FilterCriteria;
use design_insights::output;
use design_insights::runner::Insights;
use std::error::Error;

// Usage: cargo run --example offline_aggregate -- comments.json file.json [mentioned]
fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let comments_path = args.next().ok_or("missing comments.json path")?;
    let file_path = args.next().ok_or("missing file.json path")?;
    let mentioned = args.next().unwrap_or_default();

    let comments: CommentsResponse =
        serde_json::from_str(&std::fs::read_to_string(comments_path)?)?;
    let file: FileResponse = serde_json::from_str(&std::fs::read_to_string(file_path)?)?;

    let snapshot = FileSnapshot {
        pages: file.pages(),
        project_name: file.name,
        comments: comments.comments,
    };
    let insights = Insights::from_snapshot(
        snapshot,
        &TrackingConfig::default(),
        &FilterCriteria {
            mentioned_person: mentioned,
            ..FilterCriteria::default()
        },
    );

    println!("{}", output::count_line(insights.visible_count()));
    print!("{}", String::from_utf8(output::render_tsv(&insights))?);

    Ok(())
}

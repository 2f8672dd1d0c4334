use crate::cli::args::CliArgs;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(raw) = args.output_format.as_deref() {
        if crate::output::OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --output-format '{raw}', expected text, tsv, json or html"
            ));
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.api_base.as_deref() {
        reqwest::Url::parse(raw).map_err(|e| format!("invalid --api-base '{raw}': {e}"))?;
    }
    if args.mention.iter().any(|m| m.trim().is_empty()) {
        return Err("invalid --mention, expected a non-empty name".to_string());
    }
    if args.tag.iter().any(|t| t.trim().trim_start_matches('#').is_empty()) {
        return Err("invalid --tag, expected a non-empty tag".to_string());
    }
    Ok(())
}

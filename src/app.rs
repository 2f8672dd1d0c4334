use std::collections::HashMap;
use std::io::{self, Write};
use std::time::Duration;

use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing_subscriber::EnvFilter;

use crate::aggregate::TrackingConfig;
use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::figma::{ClientOptions, DEFAULT_API_BASE};
use crate::filter::FilterCriteria;
use crate::output::{self, OutputFormat};
use crate::runner::{Options, Runner};

fn print_banner(out: &mut dyn Write) -> io::Result<()> {
    writeln!(
        out,
        "{} {}",
        "design-insights".bold(),
        concat!("v", env!("CARGO_PKG_VERSION"), " - design review comment insights")
    )?;
    writeln!(out)
}

fn format_kv_line(out: &mut dyn Write, label: &str, value: &str) -> io::Result<()> {
    writeln!(out, ":: {:<10}: {}", label, value)
}

fn render_custom_help() -> String {
    let cmd = CliArgs::command();
    let mut out = String::new();

    if let Some(version) = cmd.get_version() {
        out.push_str(cmd.get_name());
        out.push(' ');
        out.push_str(version);
        out.push('\n');
    } else {
        out.push_str(cmd.get_name());
        out.push('\n');
    }

    if let Some(about) = cmd.get_about() {
        out.push_str(&about.to_string());
        out.push('\n');
    }

    if let Some(long_about) = cmd.get_long_about() {
        out.push('\n');
        out.push_str(&long_about.to_string());
        out.push('\n');
    }

    out.push('\n');
    out.push_str("Usage: ");
    out.push_str(cmd.get_name());
    out.push_str(" [OPTIONS]\n\n");

    let mut sections: Vec<(String, Vec<&clap::Arg>)> = Vec::new();
    let mut section_idx: HashMap<String, usize> = HashMap::new();

    for arg in cmd.get_arguments() {
        if arg.is_hide_set() {
            continue;
        }

        let heading = arg.get_help_heading().unwrap_or("Options").to_string();

        let idx = match section_idx.get(&heading).copied() {
            Some(i) => i,
            None => {
                sections.push((heading.clone(), Vec::new()));
                let i = sections.len() - 1;
                section_idx.insert(heading, i);
                i
            }
        };

        sections[idx].1.push(arg);
    }

    for (heading, args) in sections {
        out.push_str(&heading);
        out.push_str(":\n");

        for arg in args {
            let mut parts: Vec<String> = Vec::new();

            if let Some(short) = arg.get_short() {
                parts.push(format!("-{short}"));
            }

            if let Some(long) = arg.get_long() {
                parts.push(format!("--{long}"));
            }

            if let Some(aliases) = arg.get_visible_aliases() {
                for alias in aliases {
                    let rendered = format!("--{alias}");
                    if !parts.iter().any(|p| p == &rendered) {
                        parts.push(rendered);
                    }
                }
            }

            let mut flags = parts.join(", ");

            if arg.get_action().takes_values() {
                let value_name = arg
                    .get_value_names()
                    .and_then(|names| names.first())
                    .map(|name| name.as_str())
                    .unwrap_or("VALUE");
                flags.push_str(&format!(" <{value_name}>"));
            }

            out.push_str("  ");
            out.push_str(&flags);
            out.push('\n');

            if let Some(help) = arg.get_help() {
                let help = help.to_string();
                if !help.trim().is_empty() {
                    out.push_str("          ");
                    out.push_str(help.trim());
                    out.push('\n');
                }
            }

            if let Some(env) = arg.get_env() {
                out.push_str("          [env: ");
                out.push_str(&env.to_string_lossy());
                out.push_str("]\n");
            }

            out.push('\n');
        }
    }

    out
}

fn format_opt_value<'a>(v: &'a str, default: &'a str) -> &'a str {
    if v.trim().is_empty() {
        default
    } else {
        v
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn summarize_filters(criteria: &FilterCriteria) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !criteria.page_id.is_empty() {
        parts.push(format!("page={}", criteria.page_id));
    }
    if !criteria.free_text.is_empty() {
        parts.push(format!("text={}", criteria.free_text));
    }
    if !criteria.mentioned_person.is_empty() {
        parts.push(format!("mentioned={}", criteria.mentioned_person));
    }
    if !criteria.author_substring.is_empty() {
        parts.push(format!("author={}", criteria.author_substring));
    }
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(" ")
    }
}

#[derive(Clone, Debug)]
struct RunConfig {
    token: String,
    file_key: String,
    api_base: String,
    timeout: u64,
    proxy: Option<String>,
    tracking: TrackingConfig,
    criteria: FilterCriteria,
    output: Option<String>,
    output_format: OutputFormat,
    no_color: bool,
    verbose: u8,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let token = non_empty(args.token.or(cfg.token)).unwrap_or_default();
    let file_key = non_empty(args.file_key.or(cfg.file_key)).unwrap_or_default();
    if token.is_empty() || file_key.is_empty() {
        return Err(
            "both a Figma token (--token or FIGMA_TOKEN) and a file key (--file-key) are required"
                .to_string(),
        );
    }

    let api_base = non_empty(args.api_base.or(cfg.api_base))
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    reqwest::Url::parse(&api_base).map_err(|e| format!("invalid api base '{api_base}': {e}"))?;

    let timeout = args.timeout.or(cfg.timeout).unwrap_or(30);
    if timeout == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    let proxy = non_empty(args.proxy.or(cfg.proxy));

    let mentions = if args.mention.is_empty() {
        cfg.mentions
    } else {
        Some(args.mention)
    };
    let tags = if args.tag.is_empty() {
        cfg.tags
    } else {
        Some(args.tag)
    };
    let tracking = match (mentions, tags) {
        (None, None) => TrackingConfig::default(),
        (mentions, tags) => {
            let defaults = TrackingConfig::default();
            TrackingConfig::new(
                mentions.unwrap_or_else(|| defaults.mentions().to_vec()),
                tags.unwrap_or_else(|| defaults.tags().to_vec()),
            )
        }
    };

    let criteria = FilterCriteria {
        page_id: non_empty(args.page.or(cfg.page)).unwrap_or_default(),
        free_text: non_empty(args.text.or(cfg.text)).unwrap_or_default(),
        mentioned_person: non_empty(args.mentioned.or(cfg.mentioned)).unwrap_or_default(),
        author_substring: non_empty(args.author.or(cfg.author)).unwrap_or_default(),
    };

    let output = args
        .output
        .or(cfg.output)
        .map(|p| config::expand_tilde_string(&p));
    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => OutputFormat::parse(&raw)
            .ok_or_else(|| format!("invalid output format '{raw}'"))?,
        None => output
            .as_deref()
            .and_then(output::infer_format_from_path)
            .unwrap_or(OutputFormat::Text),
    };

    Ok(RunConfig {
        token,
        file_key,
        api_base,
        timeout,
        proxy,
        tracking,
        criteria,
        output,
        output_format,
        no_color,
        verbose: args.verbose,
    })
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("design_insights={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Status lines share stdout with the document only for plain text; a
/// structured document on stdout keeps them on stderr so it stays parseable.
fn status_on_stderr(run: &RunConfig) -> bool {
    run.output.is_none() && run.output_format != OutputFormat::Text
}

fn status_err(e: io::Error) -> String {
    format!("failed to write status output: {e}")
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    let mut stdout = tokio::io::stdout();
    if status_on_stderr(&run) {
        run_with_sinks(run, &mut stdout, &mut io::stderr()).await
    } else {
        run_with_sinks(run, &mut stdout, &mut io::stdout()).await
    }
}

/// Runs one load. The rendered document goes to `document` unless an output
/// file is configured; every status line goes to `status`.
async fn run_with_sinks<D>(
    run: RunConfig,
    document: &mut D,
    status: &mut dyn Write,
) -> Result<(), String>
where
    D: AsyncWrite + Unpin,
{
    print_banner(status).map_err(status_err)?;

    format_kv_line(status, "File", &run.file_key).map_err(status_err)?;
    format_kv_line(
        status,
        "HTTP",
        &format!(
            "api={} timeout={}s proxy={}",
            run.api_base,
            run.timeout,
            format_opt_value(run.proxy.as_deref().unwrap_or_default(), "off"),
        ),
    )
    .map_err(status_err)?;
    format_kv_line(
        status,
        "Tracking",
        &format!(
            "mentions={} tags={}",
            run.tracking.mentions().join(","),
            run.tracking.tags().join(",")
        ),
    )
    .map_err(status_err)?;
    format_kv_line(status, "Filters", &summarize_filters(&run.criteria)).map_err(status_err)?;
    writeln!(status).map_err(status_err)?;
    status.flush().map_err(status_err)?;

    let runner = Runner::new(Options {
        token: run.token.clone(),
        file_key: run.file_key.clone(),
        client: ClientOptions {
            api_base: run.api_base.clone(),
            timeout_seconds: run.timeout,
            proxy: run.proxy.clone(),
        },
        tracking: run.tracking.clone(),
        criteria: run.criteria.clone(),
    })
    .map_err(|e| e.to_string())?;

    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_style(
        ProgressStyle::with_template(":: {spinner} {msg} [{elapsed_precise}]")
            .map_err(|e| format!("failed to build progress bar style: {e}"))?,
    );
    pb.set_message("Loading comments and pages...");

    let result = runner.run().await;
    pb.finish_and_clear();
    let insights = result.map_err(|e| e.to_string())?;

    if !insights.aggregation.skipped.is_empty() {
        writeln!(
            status,
            "{}",
            format!(
                ":: skipped {} malformed comment(s), see -v for details",
                insights.aggregation.skipped.len()
            )
            .yellow()
        )
        .map_err(status_err)?;
        status.flush().map_err(status_err)?;
    }

    let rendered = output::render(run.output_format, &insights);

    match run.output.as_ref() {
        Some(outfile_path) => {
            let mut outfile = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(outfile_path)
                .await
                .map_err(|e| format!("failed to open output file: {e}"))?;
            outfile
                .write_all(&rendered)
                .await
                .map_err(|_| "failed to write output file".to_string())?;
            format_kv_line(status, "Output", outfile_path).map_err(status_err)?;
        }
        None => {
            document
                .write_all(&rendered)
                .await
                .map_err(|e| format!("failed to write output: {e}"))?;
            document
                .flush()
                .await
                .map_err(|e| format!("failed to write output: {e}"))?;
        }
    }

    writeln!(status).map_err(status_err)?;
    writeln!(
        status,
        ":: Completed :: {} of {} comments shown, loaded in {}ms ::",
        insights.visible_count(),
        insights.total_count(),
        insights.elapsed.as_millis()
    )
    .map_err(status_err)?;
    status.flush().map_err(status_err)?;

    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", render_custom_help());
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    init_tracing(args.verbose);

    let cfg = match args.config.as_ref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;
    tracing::debug!(verbose = run.verbose, format = ?run.output_format, "run configured");

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["design-insights", "--token", "t0k", "--file-key", "AbC"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn defaults_apply_without_config() {
        let run = build_run_config(args(&[]), ConfigFile::default()).unwrap();
        assert_eq!(run.api_base, DEFAULT_API_BASE);
        assert_eq!(run.timeout, 30);
        assert_eq!(run.output_format, OutputFormat::Text);
        assert_eq!(run.tracking, TrackingConfig::default());
        assert!(run.criteria.is_empty());
    }

    #[test]
    fn missing_file_key_is_rejected() {
        let argv = ["design-insights", "--token", "t0k"];
        let err = build_run_config(CliArgs::parse_from(argv), ConfigFile::default()).unwrap_err();
        assert!(err.contains("file key"));
    }

    #[test]
    fn cli_overrides_config() {
        let cfg = ConfigFile {
            timeout: Some(5),
            author: Some("zoe".to_string()),
            page: Some("0:1".to_string()),
            ..ConfigFile::default()
        };
        let run = build_run_config(args(&["--author", "dana", "--timeout", "9"]), cfg).unwrap();
        assert_eq!(run.timeout, 9);
        assert_eq!(run.criteria.author_substring, "dana");
        assert_eq!(run.criteria.page_id, "0:1");
    }

    #[test]
    fn credentials_can_come_from_config() {
        let cfg = ConfigFile {
            token: Some("from-file".to_string()),
            file_key: Some("Key1".to_string()),
            ..ConfigFile::default()
        };
        let run = build_run_config(CliArgs::parse_from(["design-insights"]), cfg);
        // FIGMA_TOKEN in the environment would take precedence over the file
        if std::env::var_os("FIGMA_TOKEN").is_none() {
            let run = run.unwrap();
            assert_eq!(run.token, "from-file");
            assert_eq!(run.file_key, "Key1");
        }
    }

    #[test]
    fn tracking_lists_replace_defaults_independently() {
        let run = build_run_config(args(&["--mention", "Ana", "--mention", "Bia"]), ConfigFile::default())
            .unwrap();
        assert_eq!(run.tracking.mentions(), &["ana".to_string(), "bia".to_string()]);
        assert_eq!(run.tracking.tags(), TrackingConfig::default().tags());
    }

    #[test]
    fn output_format_inferred_from_path() {
        let run = build_run_config(args(&["-o", "report.html"]), ConfigFile::default()).unwrap();
        assert_eq!(run.output_format, OutputFormat::Html);

        let run =
            build_run_config(args(&["-o", "report.html", "-A", "tsv"]), ConfigFile::default())
                .unwrap();
        assert_eq!(run.output_format, OutputFormat::Tsv);
    }

    #[test]
    fn invalid_output_format_is_rejected() {
        let err = build_run_config(args(&["-A", "xml"]), ConfigFile::default()).unwrap_err();
        assert!(err.contains("--output-format"));
    }

    #[test]
    fn help_lists_sections() {
        let help = render_custom_help();
        assert!(help.contains("Filters:"));
        assert!(help.contains("--mentioned"));
        assert!(help.contains("[env: FIGMA_TOKEN]"));
    }

    async fn mock_figma() -> wiremock::MockServer {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/AbC"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Loja",
                "document": {"children": [{"id": "0:1", "name": "Home", "type": "CANVAS"}]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/AbC/comments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "comments": [
                    {"id": "1", "message": "gutierres #estilos", "user": {"handle": "dana"},
                     "created_at": "2024-05-01T10:00:00Z", "client_meta": {"node_id": "0:1"}},
                    {"id": "2", "user": {"handle": "zoe"}, "created_at": "2024-05-01T10:00:00Z"}
                ]
            })))
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn status_moves_to_stderr_only_for_structured_stdout() {
        let run = build_run_config(args(&["-A", "json"]), ConfigFile::default()).unwrap();
        assert!(status_on_stderr(&run));
        let run = build_run_config(args(&[]), ConfigFile::default()).unwrap();
        assert!(!status_on_stderr(&run));
        let run = build_run_config(args(&["-o", "out.json"]), ConfigFile::default()).unwrap();
        assert!(!status_on_stderr(&run));
    }

    #[tokio::test]
    async fn structured_stdout_holds_only_the_document() {
        let server = mock_figma().await;
        for format in ["json", "tsv"] {
            let run = build_run_config(
                args(&["-A", format, "--api-base", &server.uri(), "--no-color"]),
                ConfigFile::default(),
            )
            .unwrap();

            let runner = Runner::new(Options {
                token: run.token.clone(),
                file_key: run.file_key.clone(),
                client: ClientOptions {
                    api_base: run.api_base.clone(),
                    timeout_seconds: run.timeout,
                    proxy: None,
                },
                tracking: run.tracking.clone(),
                criteria: run.criteria.clone(),
            })
            .unwrap();
            let expected = output::render(run.output_format, &runner.run().await.unwrap());

            let mut document: Vec<u8> = Vec::new();
            let mut status: Vec<u8> = Vec::new();
            run_with_sinks(run, &mut document, &mut status).await.unwrap();

            assert_eq!(document, expected);
            let status = String::from_utf8(status).unwrap();
            assert!(status.contains(":: File"));
            assert!(status.contains("skipped 1 malformed comment(s)"));
            assert!(status.contains(":: Completed :: 1 of 1 comments shown"));
        }

        let json = {
            let run = build_run_config(
                args(&["-A", "json", "--api-base", &server.uri()]),
                ConfigFile::default(),
            )
            .unwrap();
            let mut document: Vec<u8> = Vec::new();
            run_with_sinks(run, &mut document, &mut io::sink()).await.unwrap();
            document
        };
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["project"], "Loja");
    }
}

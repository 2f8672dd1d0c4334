use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "design-insights",
    version,
    about = "design-review comment insights for Figma files",
    long_about = "Design Insights pulls the review comments of a Figma file, joins them with the file's pages, counts tracked mentions and tags, and renders filterable tables.\n\nExamples:\n  design-insights --token $FIGMA_TOKEN --file-key AbC123\n  design-insights --file-key AbC123 --page Home --mentioned gutierres\n  design-insights --file-key AbC123 -o report.html\n\nTip: Use --config to keep the token and tracked names out of your shell history."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "clr",
        visible_alias = "color",
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write results to a file instead of stdout."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (text, tsv, json, html)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 't',
        long = "tk",
        visible_alias = "token",
        value_name = "TOKEN",
        env = "FIGMA_TOKEN",
        hide_env_values = true,
        help_heading = "Input",
        help = "Figma personal access token."
    )]
    pub token: Option<String>,

    #[arg(
        short = 'k',
        long = "fk",
        visible_alias = "file-key",
        value_name = "KEY",
        help_heading = "Input",
        help = "Key of the Figma file to inspect."
    )]
    pub file_key: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.design-insights/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'p',
        long = "pg",
        visible_alias = "page",
        value_name = "PAGE",
        help_heading = "Filters",
        help = "Only show comments on this page (page id, or a unique page name)."
    )]
    pub page: Option<String>,

    #[arg(
        short = 'q',
        long = "txt",
        visible_alias = "text",
        value_name = "TEXT",
        help_heading = "Filters",
        help = "Only show comments containing this text (case-insensitive)."
    )]
    pub text: Option<String>,

    #[arg(
        short = 'm',
        long = "mtd",
        visible_alias = "mentioned",
        value_name = "NAME",
        help_heading = "Filters",
        help = "Only show comments mentioning this person."
    )]
    pub mentioned: Option<String>,

    #[arg(
        short = 'a',
        long = "au",
        visible_alias = "author",
        value_name = "HANDLE",
        help_heading = "Filters",
        help = "Only show comments whose author handle contains this text."
    )]
    pub author: Option<String>,

    #[arg(
        short = 'M',
        long = "mn",
        visible_alias = "mention",
        value_name = "NAME",
        action = ArgAction::Append,
        help_heading = "Tracking",
        help = "Person name to tally tags for (repeatable, replaces the defaults)."
    )]
    pub mention: Vec<String>,

    #[arg(
        short = 'g',
        long = "tg",
        visible_alias = "tag",
        value_name = "TAG",
        action = ArgAction::Append,
        help_heading = "Tracking",
        help = "Hashtag to count, with or without '#' (repeatable, replaces the defaults)."
    )]
    pub tag: Vec<String>,

    #[arg(
        long = "api",
        visible_alias = "api-base",
        value_name = "URL",
        help_heading = "HTTP",
        help = "Base URL of the Figma REST API."
    )]
    pub api_base: Option<String>,

    #[arg(
        short = 'T',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'x',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,
}

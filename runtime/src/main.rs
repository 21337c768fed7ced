use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pagetype_runtime::acquisition::sitemap::DirectoryFilter;
use pagetype_runtime::acquisition::url_source::UrlSource;
use pagetype_runtime::cartography::rules::DEFAULT_RULE_SET;
use pagetype_runtime::cli::{classify_cmd, discover_cmd, match_cmd};
use pagetype_runtime::config::{RunConfig, ScreenshotPolicy, SubtypePolicy, DEFAULT_OUTPUT};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pagetype", version, about = "Classify web pages by page type and content subtype")]
struct Cli {
    /// Debug logging and one line per classified URL
    #[arg(long, global = true)]
    verbose: bool,

    /// Only errors
    #[arg(long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    /// Print results as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify URLs and write the results as CSV
    Classify(ClassifyArgs),
    /// List the page URLs found in a sitemap tree
    Discover {
        /// Sitemap or sitemap index URL
        #[arg(long)]
        sitemap: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Classify URLs by pattern only, without fetching them
    Match {
        /// URLs to match
        #[arg(required = true)]
        urls: Vec<String>,
        /// Built-in rule set name or path to a rule file
        #[arg(long, default_value = DEFAULT_RULE_SET)]
        rules: String,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Keep only sitemap URLs containing this substring (repeatable)
    #[arg(long, requires = "sitemap")]
    include: Vec<String>,
    /// Drop sitemap URLs containing this substring (repeatable)
    #[arg(long, requires = "sitemap")]
    exclude: Vec<String>,
}

#[derive(Args)]
struct ClassifyArgs {
    /// File with one URL per line ("-" for stdin; stdin if no source is given)
    #[arg(long, group = "source")]
    input: Option<PathBuf>,
    /// CSV file with URLs in the first column below a header row
    #[arg(long, group = "source")]
    csv: Option<PathBuf>,
    /// Sitemap or sitemap index URL
    #[arg(long, group = "source")]
    sitemap: Option<String>,
    #[command(flatten)]
    filter: FilterArgs,
    /// Built-in rule set name or path to a rule file
    #[arg(long, default_value = DEFAULT_RULE_SET)]
    rules: String,
    #[arg(long, value_enum, default_value_t = SubtypePolicy::Direct)]
    subtypes: SubtypePolicy,
    #[arg(long, value_enum, default_value_t = ScreenshotPolicy::Never)]
    screenshot: ScreenshotPolicy,
    /// Output CSV path
    #[arg(long, short, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,
    /// Oracle API key (overrides OPENAI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,
    /// Oracle model (overrides PAGETYPE_MODEL)
    #[arg(long)]
    model: Option<String>,
    /// No oracle calls; pages needing one become error records
    #[arg(long)]
    offline: bool,
}

impl ClassifyArgs {
    fn source(&self) -> Result<UrlSource> {
        if let Some(root) = &self.sitemap {
            return Ok(UrlSource::Sitemap {
                root: root.clone(),
                filter: DirectoryFilter::new(self.filter.include.clone(), self.filter.exclude.clone()),
            });
        }
        if let Some(path) = &self.csv {
            return Ok(UrlSource::Table(path.clone()));
        }
        let block = match &self.input {
            Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
            _ => std::io::read_to_string(std::io::stdin()).context("failed to read stdin")?,
        };
        Ok(UrlSource::Explicit(block))
    }
}

fn init_tracing(verbose: bool, quiet: bool, json: bool) {
    let default = if verbose {
        "pagetype_runtime=debug"
    } else if quiet {
        "error"
    } else {
        "pagetype_runtime=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Output-mode flags are read by the command modules.
    if cli.quiet {
        std::env::set_var("PAGETYPE_QUIET", "1");
    }
    if cli.verbose {
        std::env::set_var("PAGETYPE_VERBOSE", "1");
    }
    if cli.json {
        std::env::set_var("PAGETYPE_JSON", "1");
    }
    init_tracing(cli.verbose, cli.quiet, cli.log_json);

    match cli.command {
        Commands::Classify(args) => {
            let source = args.source()?;
            let mut config = RunConfig::from_env();
            if let Some(key) = args.api_key {
                config.api_key = Some(key);
            }
            if let Some(model) = args.model {
                config.model = model;
            }
            config.subtypes = args.subtypes;
            config.screenshot = args.screenshot;

            classify_cmd::run(
                source,
                classify_cmd::ClassifyOptions {
                    rules: args.rules,
                    output: args.output,
                    offline: args.offline,
                    config,
                },
            )
            .await
        }
        Commands::Discover { sitemap, filter } => {
            let filter = DirectoryFilter::new(filter.include, filter.exclude);
            discover_cmd::run(&sitemap, filter, &RunConfig::from_env()).await
        }
        Commands::Match { urls, rules } => match_cmd::run(&urls, &rules),
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use factstream_common::observability::{LogFormat, init_logging};
use factstream_config::{FactsConfig, FactsConfigLoader};
use factstream_core::{CardRequest, CardSource, FactService, MockCardSource};
use std::path::PathBuf;
use std::sync::Arc;
mod repl;

const DEFAULT_CONFIG_FILE: &str = "factstream.yaml";

#[derive(Parser)]
#[command(author, version, about = "An endless stream of fact cards", long_about = None)]
struct Cli {
    /// YAML config file (defaults to ./factstream.yaml when present)
    #[arg(long, global = true, env = "FACTSTREAM_CONFIG")]
    config: Option<PathBuf>,

    /// Serve canned offline cards instead of calling the provider
    #[arg(long, global = true)]
    mock: bool,

    /// Write JSON log lines instead of text
    #[arg(long, global = true)]
    log_json: bool,

    /// Mirror logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one batch of cards and print it as JSON
    Cards {
        /// Subject to fetch facts about
        topic: String,

        /// 1-based page number
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Card the request refers to
        #[arg(long)]
        parent: Option<String>,

        /// Follow-up question about the parent card
        #[arg(short, long)]
        question: Option<String>,

        /// Ask for one long-form research report
        #[arg(long)]
        deep: bool,
    },

    /// Interactive feed on stdin
    Feed {
        /// Topic to start with
        topic: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let loader = match &cli.config {
        Some(path) => FactsConfigLoader::new().with_file(path),
        None => FactsConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    let cfg: FactsConfig = loader.load().context("failed to load configuration")?;

    // 2) Logging
    let mut log_config = cfg.logging.to_log_config();
    if cli.log_json {
        log_config.format = LogFormat::Json;
    }
    log_config.emit_stderr |= cli.verbose;
    let log_path = init_logging(log_config)?;
    tracing::info!(log_path = %log_path.display(), mock = cli.mock, "factstream.start");
    if cfg.search.any_configured() {
        tracing::debug!("factstream.search_keys.present");
    }

    // 3) Card source
    let source = build_source(&cfg, cli.mock)?;

    match cli.command {
        Commands::Cards {
            topic,
            page,
            parent,
            question,
            deep,
        } => {
            let mut request = CardRequest::new(topic).page(page).deep(deep);
            if let Some(parent) = parent {
                request = request.parent(parent);
            }
            if let Some(question) = question {
                request = request.follow_up(question);
            }
            let cards = source.get_cards(&request).await;
            println!("{}", serde_json::to_string_pretty(&cards)?);
            Ok(())
        }
        Commands::Feed { topic } => repl::run(source, topic).await,
    }
}

fn build_source(cfg: &FactsConfig, mock: bool) -> Result<Arc<dyn CardSource>> {
    if mock {
        return Ok(Arc::new(MockCardSource::new()));
    }
    let client = factstream_llm::build_client(
        &cfg.llm_config(),
        cfg.provider.request_timeout(),
        cfg.provider.retries,
    )?;
    Ok(Arc::new(FactService::with_fresh_dedup(client)))
}

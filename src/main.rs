use anyhow::Context;
use artifact_store::FsArtifactStore;
use clap::Parser;
use digest_core::{AppConfig, ConfigOverrides, ErrorExt, FileConfig};
use digest_pipeline::{DigestMode, PostCollector, RunOrchestrator};
use llm_interface::{OpenAiProvider, Summarizer};
use notifier::TelegramNotifier;
use reddit_client::RedditClient;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Daily forum digest: collect, summarize, deliver.
#[derive(Debug, Parser)]
#[command(name = "forum-digest", version, about)]
struct Cli {
    /// TOML file with non-secret settings
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Base directory for dated artifact folders
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Source to process; repeat for several. Replaces the configured list.
    #[arg(long = "source", value_name = "NAME")]
    sources: Vec<String>,

    /// Re-summarize today's stored digests instead of fetching
    #[arg(long)]
    from_digests: bool,

    /// Do not produce the cross-source summary
    #[arg(long)]
    skip_aggregate: bool,
}

/// Secrets may live in a `.env` file in the working directory.
const ENV_FILE: &str = ".env";

/// Loads `KEY=value` lines into the process environment. Variables that are already set win,
/// and a missing file is not an error. Returns whether a file was read.
fn load_env_file(path: &Path) -> anyhow::Result<bool> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => FileConfig::default(),
    };

    let config = AppConfig::from_parts(file, |name| std::env::var(name).ok())
        .map_err(|e| {
            e.log_error();
            anyhow::anyhow!(e.user_friendly_message())
        })?
        .with_overrides(ConfigOverrides {
            output_dir: cli.output_dir.clone(),
            sources: cli.sources.clone(),
        })?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_loaded = load_env_file(Path::new(ENV_FILE))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,forum_digest=debug")),
        )
        .init();
    if env_loaded {
        tracing::debug!("Loaded environment from {}", ENV_FILE);
    }

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    tracing::debug!("Resolved configuration: {:?}", config);

    let run_date = chrono::Local::now().date_naive();
    let store = FsArtifactStore::open(&config.run.output_dir, run_date)
        .await
        .context("creating artifact directory")?;

    let forum = RedditClient::new(&config.reddit)?;
    let backend = OpenAiProvider::new(&config.openai)?;
    let notifier = TelegramNotifier::new(&config.telegram)?;

    let mode = if cli.from_digests {
        DigestMode::Stored
    } else {
        DigestMode::Fetch
    };
    let orchestrator = RunOrchestrator::new(
        PostCollector::new(forum, &config.run),
        Summarizer::new(backend, config.openai.max_completion_tokens),
        notifier,
        store,
    )
    .with_mode(mode);

    tracing::info!(
        "Starting digest run for {} sources into {}",
        config.run.sources.len(),
        orchestrator.store().root().display()
    );
    let report = orchestrator
        .run(&config.run.sources, cli.skip_aggregate)
        .await;

    for source in &report.sources {
        match (&source.error, source.failed_at) {
            (Some(error), Some(reached)) => {
                tracing::warn!("r/{}: failed after {} ({})", source.source, reached, error)
            }
            (Some(error), None) => tracing::warn!("r/{}: {} ({})", source.source, source.state, error),
            (None, _) if source.degraded => {
                tracing::warn!("r/{}: {} with degraded summary", source.source, source.state)
            }
            (None, _) => tracing::info!("r/{}: {}", source.source, source.state),
        }
    }
    if let Some(aggregate) = &report.aggregate {
        tracing::info!(
            "Aggregate summary from {} sources{}",
            aggregate.sources_included,
            if aggregate.degraded { " (degraded)" } else { "" }
        );
    }

    Ok(())
}

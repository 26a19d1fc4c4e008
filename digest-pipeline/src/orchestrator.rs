use crate::collector::PostCollector;
use crate::formatter::format_digest;
use digest_core::{
    ArtifactPattern, ArtifactStore, CoreError, ErrorExt, ErrorReporter, FailureScope, ForumClient,
    InferenceBackend, NotificationSink,
};
use llm_interface::Summarizer;
use std::fmt;
use tracing::{error, info, warn};

/// Suffix shared by every per-source summary artifact, and only by them.
pub const SUMMARY_SUFFIX: &str = "-summary.txt";
pub const AGGREGATE_ARTIFACT: &str = "summary.txt";
const AGGREGATE_HEADER: &str = "📊 TODAY'S SUMMARY\n\n";

pub fn digest_artifact(source: &str) -> String {
    format!("{}.txt", source)
}

pub fn summary_artifact(source: &str) -> String {
    format!("{}{}", source, SUMMARY_SUFFIX)
}

fn summary_header(source: &str) -> String {
    format!("📊 TODAY'S r/{} SUMMARY\n\n", source)
}

/// Where each source's digest text comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestMode {
    /// Collect from the forum and format.
    #[default]
    Fetch,
    /// Reuse the digest artifact already stored for the source.
    Stored,
}

/// Progress of one source. `Failed` is terminal and yields an empty result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Pending,
    Collected,
    Formatted,
    Summarized,
    Persisted,
    Notified,
    Failed,
}

impl SourceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceState::Pending => "pending",
            SourceState::Collected => "collected",
            SourceState::Formatted => "formatted",
            SourceState::Summarized => "summarized",
            SourceState::Persisted => "persisted",
            SourceState::Notified => "notified",
            SourceState::Failed => "failed",
        }
    }
}

impl fmt::Display for SourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub source: String,
    pub state: SourceState,
    /// Persisted summary text; empty when the source failed.
    pub summary: String,
    pub degraded: bool,
    /// Last state reached before a failure.
    pub failed_at: Option<SourceState>,
    pub error: Option<String>,
}

impl SourceReport {
    fn failed(source: &str, reached: SourceState, error: &CoreError) -> Self {
        Self {
            source: source.to_string(),
            state: SourceState::Failed,
            summary: String::new(),
            degraded: false,
            failed_at: Some(reached),
            error: Some(error.to_string()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.state == SourceState::Failed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateReport {
    pub summary: String,
    pub degraded: bool,
    pub notified: bool,
    pub sources_included: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunReport {
    pub sources: Vec<SourceReport>,
    /// `None` when aggregation was skipped or could not complete.
    pub aggregate: Option<AggregateReport>,
}

impl RunReport {
    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources.iter().filter(|report| report.is_failed())
    }
}

/// Drives every source through collect, format, summarize, persist and notify, one at a
/// time, then summarizes the stored per-source summaries.
pub struct RunOrchestrator<F, B, N, S> {
    collector: PostCollector<F>,
    summarizer: Summarizer<B>,
    notifier: N,
    store: S,
    mode: DigestMode,
    reporter: ErrorReporter,
}

impl<F, B, N, S> RunOrchestrator<F, B, N, S>
where
    F: ForumClient,
    B: InferenceBackend,
    N: NotificationSink,
    S: ArtifactStore,
{
    pub fn new(collector: PostCollector<F>, summarizer: Summarizer<B>, notifier: N, store: S) -> Self {
        Self {
            collector,
            summarizer,
            notifier,
            store,
            mode: DigestMode::Fetch,
            reporter: ErrorReporter::new(),
        }
    }

    pub fn with_mode(mut self, mode: DigestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn collector(&self) -> &PostCollector<F> {
        &self.collector
    }

    pub fn summarizer(&self) -> &Summarizer<B> {
        &self.summarizer
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn run(&self, sources: &[String], skip_aggregate: bool) -> RunReport {
        let mut report = RunReport::default();
        for source in sources {
            report.sources.push(self.run_source(source).await);
        }

        if skip_aggregate {
            info!("Skipping aggregate summary");
            return report;
        }

        match self.aggregate().await {
            Ok(aggregate) => report.aggregate = Some(aggregate),
            Err(e) => error!("Aggregate summary failed ({}): {}", e.error_code(), e),
        }
        report
    }

    /// Runs one source to completion. Any failure is absorbed into a `Failed` report.
    pub async fn run_source(&self, source: &str) -> SourceReport {
        info!("Starting r/{} summary", source);
        let mut state = SourceState::Pending;

        match self.try_run_source(source, &mut state).await {
            Ok(report) => {
                info!("r/{} finished: {}", source, report.state);
                report
            }
            Err(e) => {
                error!(
                    "r/{} failed after reaching {} ({}): {}",
                    source,
                    state,
                    e.error_code(),
                    e
                );
                SourceReport::failed(source, state, &e)
            }
        }
    }

    async fn try_run_source(
        &self,
        source: &str,
        state: &mut SourceState,
    ) -> Result<SourceReport, CoreError> {
        let digest = match self.mode {
            DigestMode::Fetch => {
                let posts = self.collector.collect(source).await?;
                *state = SourceState::Collected;
                format_digest(source, &posts)
            }
            DigestMode::Stored => self.store.read(&digest_artifact(source)).await?,
        };
        *state = SourceState::Formatted;

        let outcome = self.summarizer.summarize(&digest).await;
        *state = SourceState::Summarized;
        let degraded = outcome.is_degraded();
        if degraded {
            warn!("r/{} summary is degraded", source);
        }
        let summary = format!("{}{}", summary_header(source), outcome.render());

        if self.mode == DigestMode::Fetch {
            self.store.write(&digest_artifact(source), &digest).await?;
        }
        self.store.write(&summary_artifact(source), &summary).await?;
        *state = SourceState::Persisted;

        if self.notify(&summary).await {
            *state = SourceState::Notified;
        }

        Ok(SourceReport {
            source: source.to_string(),
            state: *state,
            summary,
            degraded,
            failed_at: None,
            error: None,
        })
    }

    /// Per-source summaries in name order, trimmed, empty ones dropped, blank-line separated.
    /// Unreadable artifacts are skipped.
    pub async fn collect_summaries(&self) -> Result<(String, usize), CoreError> {
        let mut names = self.store.list(&ArtifactPattern::suffix(SUMMARY_SUFFIX)).await?;
        names.sort();

        let mut chunks = Vec::new();
        for name in names {
            match self.store.read(&name).await {
                Ok(text) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        chunks.push(text.to_string());
                    }
                }
                Err(e) => {
                    self.report(&e);
                    warn!("Skipping unreadable {} ({})", name, e.error_code());
                }
            }
        }

        let included = chunks.len();
        Ok((chunks.join("\n\n"), included))
    }

    pub async fn aggregate(&self) -> Result<AggregateReport, CoreError> {
        let (combined, sources_included) = self.collect_summaries().await?;
        info!("Aggregating {} source summaries", sources_included);

        let outcome = self.summarizer.summarize(&combined).await;
        let degraded = outcome.is_degraded();
        let summary = format!("{}{}", AGGREGATE_HEADER, outcome.render());

        self.store.write(AGGREGATE_ARTIFACT, &summary).await?;
        let notified = self.notify(&summary).await;

        Ok(AggregateReport {
            summary,
            degraded,
            notified,
            sources_included,
        })
    }

    async fn notify(&self, text: &str) -> bool {
        match self.notifier.send(text).await {
            Ok(()) => true,
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    fn report(&self, error: &CoreError) {
        match error.scope() {
            FailureScope::Item => self.reporter.report_warning(error),
            FailureScope::Source | FailureScope::Fatal => self.reporter.report_error(error),
        }
    }
}

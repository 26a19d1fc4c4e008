//! Collection and aggregation pipeline: collect each source's recent posts,
//! render them into a digest, summarize, persist and notify, then summarize
//! the per-source summaries once more.

pub mod collector;
pub mod comments;
pub mod formatter;
pub mod orchestrator;

pub use collector::{PostCollector, BODY_EXCERPT_CHARS, COLLECTION_WINDOW_HOURS};
pub use comments::{collect_comments, flatten_comments};
pub use formatter::{format_digest, NO_POSTS_MESSAGE};
pub use orchestrator::{
    digest_artifact, summary_artifact, AggregateReport, DigestMode, RunOrchestrator, RunReport,
    SourceReport, SourceState, AGGREGATE_ARTIFACT, SUMMARY_SUFFIX,
};

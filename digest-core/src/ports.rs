//! Contracts for the external collaborators the pipeline drives.
//!
//! The pipeline runs on a single task, so none of these futures need to be `Send`.
#![allow(async_fn_in_trait)]

use crate::{CommentTree, CoreError, RawItem};

/// Read access to a topical forum.
pub trait ForumClient {
    /// The `limit` newest items of `source`, newest first.
    async fn list_recent(&self, source: &str, limit: usize) -> Result<Vec<RawItem>, CoreError>;

    /// The item's comment tree with at most `limit` placeholders expanded.
    async fn resolve_comment_tree(
        &self,
        item: &RawItem,
        limit: usize,
    ) -> Result<CommentTree, CoreError>;
}

/// A language-model text generation backend.
pub trait InferenceBackend {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<String, CoreError>;
}

/// Where finished summaries are delivered.
pub trait NotificationSink {
    async fn send(&self, text: &str) -> Result<(), CoreError>;
}

/// Selects artifact names by prefix and/or suffix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactPattern {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
}

impl ArtifactPattern {
    pub fn suffix(suffix: impl Into<String>) -> Self {
        Self {
            prefix: None,
            suffix: Some(suffix.into()),
        }
    }

    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            suffix: None,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        let prefix_ok = self
            .prefix
            .as_deref()
            .map_or(true, |prefix| name.starts_with(prefix));
        let suffix_ok = self
            .suffix
            .as_deref()
            .map_or(true, |suffix| name.ends_with(suffix));
        prefix_ok && suffix_ok
    }
}

/// Flat store of named text artifacts for one date partition.
pub trait ArtifactStore {
    async fn write(&self, name: &str, text: &str) -> Result<(), CoreError>;

    /// Fails with `ArtifactError::NotFound` when nothing is stored under `name`.
    async fn read(&self, name: &str) -> Result<String, CoreError>;

    /// Matching names in lexicographic order.
    async fn list(&self, pattern: &ArtifactPattern) -> Result<Vec<String>, CoreError>;
}

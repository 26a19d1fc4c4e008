#![allow(dead_code)]

use artifact_store::MemoryArtifactStore;
use chrono::{DateTime, Duration, Utc};
use digest_core::{
    ArtifactError, ArtifactPattern, ArtifactStore, Comment, CommentNode, CommentTree, CoreError,
    ForumApiError, ForumClient, InferenceBackend, LlmError, NotificationSink, NotifyError, RawItem,
};
use digest_pipeline::{PostCollector, RunOrchestrator};
use llm_interface::Summarizer;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub fn raw_item(source: &str, id: &str, score: i64, created_at: DateTime<Utc>) -> RawItem {
    RawItem {
        id: id.to_string(),
        source: source.to_string(),
        title: format!("title {id}"),
        score,
        comment_count: 0,
        body: String::new(),
        permalink: format!("https://redd.it/{id}"),
        created_at,
    }
}

pub fn recent_item(source: &str, id: &str, score: i64) -> RawItem {
    raw_item(source, id, score, Utc::now() - Duration::hours(1))
}

/// A flat tree whose first comment is the usual moderator notice.
pub fn tree_with_comments(count: usize) -> CommentTree {
    let mut nodes = vec![CommentNode::Comment(Comment {
        id: "automod".to_string(),
        body: Some("Please read the rules".to_string()),
        replies: Vec::new(),
    })];
    nodes.extend((1..=count).map(|n| {
        CommentNode::Comment(Comment {
            id: format!("c{n}"),
            body: Some(format!("comment {n}\nsecond line")),
            replies: Vec::new(),
        })
    }));
    CommentTree::new(nodes)
}

#[derive(Default)]
pub struct FakeForum {
    pub items: HashMap<String, Vec<RawItem>>,
    pub trees: HashMap<String, CommentTree>,
    pub failing_sources: HashSet<String>,
    pub failing_trees: HashSet<String>,
    pub listed: Mutex<Vec<(String, usize)>>,
}

impl FakeForum {
    pub fn with_items(mut self, source: &str, items: Vec<RawItem>) -> Self {
        self.items.insert(source.to_string(), items);
        self
    }

    pub fn with_tree(mut self, item_id: &str, tree: CommentTree) -> Self {
        self.trees.insert(item_id.to_string(), tree);
        self
    }

    pub fn failing_source(mut self, source: &str) -> Self {
        self.failing_sources.insert(source.to_string());
        self
    }

    pub fn failing_tree(mut self, item_id: &str) -> Self {
        self.failing_trees.insert(item_id.to_string());
        self
    }
}

impl ForumClient for FakeForum {
    async fn list_recent(&self, source: &str, limit: usize) -> Result<Vec<RawItem>, CoreError> {
        self.listed.lock().unwrap().push((source.to_string(), limit));
        if self.failing_sources.contains(source) {
            return Err(CoreError::ForumApi(ForumApiError::ServerError { status_code: 503 }));
        }
        Ok(self
            .items
            .get(source)
            .map(|items| items.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn resolve_comment_tree(
        &self,
        item: &RawItem,
        _limit: usize,
    ) -> Result<CommentTree, CoreError> {
        if self.failing_trees.contains(&item.id) {
            return Err(CoreError::ForumApi(ForumApiError::RequestTimeout));
        }
        Ok(self.trees.get(&item.id).cloned().unwrap_or_default())
    }
}

/// Answers every prompt with a fixed reply, or fails when `reply` is `None`.
#[derive(Default)]
pub struct FakeBackend {
    pub reply: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl InferenceBackend for FakeBackend {
    async fn generate(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        _max_tokens: u32,
    ) -> Result<String, CoreError> {
        self.prompts.lock().unwrap().push(user_prompt.to_string());
        self.reply.clone().ok_or_else(|| {
            CoreError::Llm(LlmError::ServiceUnavailable {
                provider: "openai".to_string(),
            })
        })
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub fail: bool,
    pub sent: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<(), CoreError> {
        if self.fail {
            return Err(CoreError::Notify(NotifyError::Timeout));
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Memory store where some names list fine but cannot be read back.
pub struct PartlyUnreadableStore {
    pub inner: MemoryArtifactStore,
    pub unreadable: HashSet<String>,
}

impl ArtifactStore for PartlyUnreadableStore {
    async fn write(&self, name: &str, text: &str) -> Result<(), CoreError> {
        self.inner.write(name, text).await
    }

    async fn read(&self, name: &str) -> Result<String, CoreError> {
        if self.unreadable.contains(name) {
            return Err(CoreError::Artifact(ArtifactError::ReadFailed {
                name: name.to_string(),
                reason: "stream did not contain valid UTF-8".to_string(),
            }));
        }
        self.inner.read(name).await
    }

    async fn list(&self, pattern: &ArtifactPattern) -> Result<Vec<String>, CoreError> {
        self.inner.list(pattern).await
    }
}

/// Memory store that refuses every write.
#[derive(Default)]
pub struct FullDiskStore {
    pub inner: MemoryArtifactStore,
}

impl ArtifactStore for FullDiskStore {
    async fn write(&self, name: &str, _text: &str) -> Result<(), CoreError> {
        Err(CoreError::Artifact(ArtifactError::WriteFailed {
            name: name.to_string(),
            reason: "No space left on device".to_string(),
        }))
    }

    async fn read(&self, name: &str) -> Result<String, CoreError> {
        self.inner.read(name).await
    }

    async fn list(&self, pattern: &ArtifactPattern) -> Result<Vec<String>, CoreError> {
        self.inner.list(pattern).await
    }
}

pub fn orchestrator<S: ArtifactStore>(
    forum: FakeForum,
    backend: FakeBackend,
    notifier: RecordingNotifier,
    store: S,
) -> RunOrchestrator<FakeForum, FakeBackend, RecordingNotifier, S> {
    RunOrchestrator::new(
        PostCollector::with_caps(forum, 8, 21),
        Summarizer::new(backend, 4000),
        notifier,
        store,
    )
}

pub fn sources(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

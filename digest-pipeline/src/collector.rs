use crate::comments::collect_comments;
use chrono::{DateTime, Duration, Utc};
use digest_core::{truncate_chars, CoreError, ForumClient, Post, RunSettings};
use tracing::{debug, info};

pub const COLLECTION_WINDOW_HOURS: i64 = 24;
pub const BODY_EXCERPT_CHARS: usize = 1000;

/// Fetches one source's newest items and keeps those inside the collection window.
#[derive(Debug)]
pub struct PostCollector<F> {
    forum: F,
    max_posts: usize,
    max_comments: usize,
}

impl<F: ForumClient> PostCollector<F> {
    pub fn new(forum: F, settings: &RunSettings) -> Self {
        Self::with_caps(forum, settings.max_posts, settings.max_comments)
    }

    pub fn with_caps(forum: F, max_posts: usize, max_comments: usize) -> Self {
        Self {
            forum,
            max_posts,
            max_comments,
        }
    }

    pub fn forum(&self) -> &F {
        &self.forum
    }

    pub async fn collect(&self, source: &str) -> Result<Vec<Post>, CoreError> {
        self.collect_at(source, Utc::now()).await
    }

    /// Only the newest `max_posts` items are considered at all, so older in-window
    /// items beyond that page are never seen.
    pub async fn collect_at(&self, source: &str, now: DateTime<Utc>) -> Result<Vec<Post>, CoreError> {
        let cutoff = now - Duration::hours(COLLECTION_WINDOW_HOURS);
        let items = self.forum.list_recent(source, self.max_posts).await?;

        let mut posts = Vec::new();
        for item in items.into_iter().take(self.max_posts) {
            if item.created_at < cutoff {
                debug!("r/{}: {} is older than the window", source, item.id);
                continue;
            }

            debug!("r/{}: collecting post #{}", source, posts.len() + 1);
            let comments = collect_comments(&self.forum, &item, self.max_comments).await;
            posts.push(Post {
                body_excerpt: truncate_chars(&item.body, BODY_EXCERPT_CHARS).to_string(),
                title: item.title,
                score: item.score,
                comment_count: item.comment_count,
                permalink: item.permalink,
                created_at: item.created_at,
                comments,
            });
        }

        info!("r/{}: collected {} posts", source, posts.len());
        Ok(posts)
    }
}

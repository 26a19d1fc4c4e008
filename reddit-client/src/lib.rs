pub mod api;
pub mod auth;
pub mod expand;
pub mod rate_limiter;


pub use api::{assemble_thread, status_error, RedditApiClient, RedditPostData, RedditThing};
pub use auth::{AppOnlyAuth, RedditToken};
pub use expand::{expand_more, MoreChildrenSource};

use digest_core::{CommentTree, CoreError, ForumClient, RawItem, RedditCredentials};
use tracing::info;

/// Reddit as a [`ForumClient`]: app-only auth plus the read endpoints the pipeline needs.
#[derive(Debug)]
pub struct RedditClient {
    api: RedditApiClient,
    auth: AppOnlyAuth,
}

impl RedditClient {
    pub fn new(credentials: &RedditCredentials) -> Result<Self, CoreError> {
        let api = RedditApiClient::new(credentials.user_agent.clone())?;
        let auth = AppOnlyAuth::new(credentials, api.http_client().clone())?;
        Ok(Self { api, auth })
    }

    pub fn auth(&self) -> &AppOnlyAuth {
        &self.auth
    }
}

impl ForumClient for RedditClient {
    async fn list_recent(&self, source: &str, limit: usize) -> Result<Vec<RawItem>, CoreError> {
        let access_token = self.auth.access_token().await?;
        let listing = self.api.get_new_posts(&access_token, source, limit).await?;

        let items = listing
            .data
            .children
            .into_iter()
            .filter(|child| child.kind == "t3")
            .map(|child| child.data.into_raw_item())
            .collect::<Result<Vec<_>, _>>()?;

        info!("r/{}: {} recent items", source, items.len());
        Ok(items)
    }

    async fn resolve_comment_tree(
        &self,
        item: &RawItem,
        limit: usize,
    ) -> Result<CommentTree, CoreError> {
        let access_token = self.auth.access_token().await?;
        let things = self.api.get_comments(&access_token, &item.id).await?;

        let mut tree = CommentTree::new(things.into_iter().map(RedditThing::into_node).collect());
        expand_more(&self.api, &access_token, &item.id, &mut tree, limit).await;
        Ok(tree)
    }
}

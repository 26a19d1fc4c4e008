#![allow(async_fn_in_trait)]

use crate::api::{assemble_thread, RedditApiClient, RedditThing};
use digest_core::{CommentTree, CoreError, MoreComments};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Fetches the comments hidden behind a "load more" placeholder.
pub trait MoreChildrenSource {
    async fn more_children(
        &self,
        access_token: &str,
        link_name: &str,
        children: &[String],
    ) -> Result<Vec<RedditThing>, CoreError>;
}

impl MoreChildrenSource for RedditApiClient {
    async fn more_children(
        &self,
        access_token: &str,
        link_name: &str,
        children: &[String],
    ) -> Result<Vec<RedditThing>, CoreError> {
        self.get_more_children(access_token, link_name, children).await
    }
}

/// Expands up to `limit` placeholders, breadth first, including ones revealed by earlier
/// expansions. A failed expansion stops further expansion; what was expanded is kept.
pub async fn expand_more<M: MoreChildrenSource>(
    source: &M,
    access_token: &str,
    item_id: &str,
    tree: &mut CommentTree,
    limit: usize,
) {
    let link_name = format!("t3_{}", item_id);
    let mut attempted: HashSet<String> = HashSet::new();
    let mut budget = limit;

    while budget > 0 {
        let batch: Vec<MoreComments> = tree
            .pending_more()
            .into_iter()
            .filter(|more| !more.children.is_empty() && !attempted.contains(&more.id))
            .take(budget)
            .cloned()
            .collect();
        if batch.is_empty() {
            break;
        }

        let mut replacements = HashMap::new();
        for more in batch {
            budget -= 1;
            attempted.insert(more.id.clone());

            match source
                .more_children(access_token, &link_name, &more.children)
                .await
            {
                Ok(things) => {
                    debug!(
                        "Expanded {} hidden comments under {}",
                        things.len(),
                        more.id
                    );
                    replacements.insert(more.id, assemble_thread(things));
                }
                Err(e) => {
                    warn!("Stopping comment expansion for {}: {}", item_id, e);
                    tree.splice(&mut replacements);
                    return;
                }
            }
        }
        tree.splice(&mut replacements);
    }
}

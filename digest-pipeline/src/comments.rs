use digest_core::{collapse_newlines, CommentTree, ErrorExt, ForumClient, RawItem};
use tracing::{debug, warn};

/// Flattens `tree` into at most `limit` single-line bodies in breadth-first order.
///
/// The first node is dropped (the stickied moderator notice on most forums), as are
/// nodes with no text.
pub fn flatten_comments(tree: &CommentTree, limit: usize) -> Vec<String> {
    tree.breadth_first()
        .into_iter()
        .skip(1)
        .filter_map(|node| node.body())
        .map(collapse_newlines)
        .filter(|body| !body.is_empty())
        .take(limit)
        .collect()
}

/// Resolves and flattens an item's comments. Never fails: a resolution error yields no comments.
pub async fn collect_comments<F: ForumClient>(forum: &F, item: &RawItem, limit: usize) -> Vec<String> {
    match forum.resolve_comment_tree(item, limit).await {
        Ok(tree) => {
            let comments = flatten_comments(&tree, limit);
            debug!("{}: kept {} comments", item.id, comments.len());
            comments
        }
        Err(e) => {
            warn!(
                "Could not load comments for {} ({}): {}",
                item.id,
                e.error_code(),
                e
            );
            Vec::new()
        }
    }
}

use digest_core::{truncate_chars, Post};

/// Digest text for a source with nothing in the window.
pub const NO_POSTS_MESSAGE: &str = "No posts found for today.";

const BODY_CHARS: usize = 1500;
const COMMENTS_CHARS: usize = 3000;
const COMMENT_SEPARATOR: &str = " \n- ";
const TRUNCATION_MARKER: &str = "...";

/// Renders posts, highest score first, as the text handed to the summarizer.
///
/// Equal scores keep their collection order.
pub fn format_digest(source: &str, posts: &[Post]) -> String {
    if posts.is_empty() {
        return NO_POSTS_MESSAGE.to_string();
    }

    let mut ranked: Vec<&Post> = posts.iter().collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));

    let mut digest = format!("Today's Reddit r/{} posts:\n\n", source);
    for (index, post) in ranked.into_iter().enumerate() {
        write_post(&mut digest, index + 1, post);
    }
    digest
}

fn write_post(digest: &mut String, number: usize, post: &Post) {
    digest.push_str(&format!("~~~POST #{} START\n", number));
    digest.push_str(&format!("Title: {}\n", post.title));
    digest.push_str(&format!("Score: {}\n", post.score));
    digest.push_str(&format!("Comments: {}\n", post.comment_count));
    digest.push_str(&format!("Link: {}\n", post.permalink));

    if !post.body_excerpt.is_empty() {
        digest.push_str(&format!(
            "Post content: {}...\n\n",
            truncate_chars(&post.body_excerpt, BODY_CHARS)
        ));
    }

    if !post.comments.is_empty() {
        let combined = post.comments.join(COMMENT_SEPARATOR);
        let capped = truncate_chars(&combined, COMMENTS_CHARS);
        let marker = if capped.len() < combined.len() {
            TRUNCATION_MARKER
        } else {
            ""
        };
        digest.push_str(&format!("Comments:\n- {}{}\n", capped, marker));
    }

    digest.push_str(&format!("~~~POST #{} END\n\n", number));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn post(title: &str, score: i64) -> Post {
        Post {
            title: title.to_string(),
            score,
            comment_count: 0,
            body_excerpt: String::new(),
            permalink: format!("https://redd.it/{title}"),
            created_at: Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap(),
            comments: Vec::new(),
        }
    }

    #[test]
    fn test_empty_input_is_fixed_message() {
        assert_eq!(format_digest("stocks", &[]), NO_POSTS_MESSAGE);
        assert!(!format_digest("stocks", &[]).is_empty());
    }

    #[test]
    fn test_full_block_layout() {
        let mut first = post("abc", 42);
        first.comment_count = 17;
        first.body_excerpt = "Going all in".to_string();
        first.comments = vec!["to the moon".to_string(), "bought puts".to_string()];

        let digest = format_digest("wallstreetbets", &[first]);
        assert_eq!(
            digest,
            "Today's Reddit r/wallstreetbets posts:\n\n\
             ~~~POST #1 START\n\
             Title: abc\n\
             Score: 42\n\
             Comments: 17\n\
             Link: https://redd.it/abc\n\
             Post content: Going all in...\n\n\
             Comments:\n- to the moon \n- bought puts\n\
             ~~~POST #1 END\n\n"
        );
    }

    #[test]
    fn test_consecutive_blocks_layout() {
        let digest = format_digest("stocks", &[post("first", 9), post("second", 3)]);
        assert_eq!(
            digest,
            "Today's Reddit r/stocks posts:\n\n\
             ~~~POST #1 START\n\
             Title: first\n\
             Score: 9\n\
             Comments: 0\n\
             Link: https://redd.it/first\n\
             ~~~POST #1 END\n\n\
             ~~~POST #2 START\n\
             Title: second\n\
             Score: 3\n\
             Comments: 0\n\
             Link: https://redd.it/second\n\
             ~~~POST #2 END\n\n"
        );
    }

    #[test]
    fn test_optional_sections_are_omitted() {
        let digest = format_digest("stocks", &[post("bare", 1)]);
        assert!(!digest.contains("Post content:"));
        assert!(!digest.contains("Comments:\n"));
        assert!(digest.contains("Comments: 0\n"));
        assert!(digest.ends_with("~~~POST #1 END\n\n"));
    }

    #[test]
    fn test_descending_score_order() {
        let posts = vec![post("low", 1), post("high", 300), post("mid", 12)];
        let digest = format_digest("stocks", &posts);

        let high = digest.find("Title: high").unwrap();
        let mid = digest.find("Title: mid").unwrap();
        let low = digest.find("Title: low").unwrap();
        assert!(high < mid && mid < low);
        assert!(digest.contains("~~~POST #1 START\nTitle: high"));
        assert!(digest.contains("~~~POST #3 START\nTitle: low"));
    }

    #[test]
    fn test_equal_scores_keep_collection_order() {
        let posts = vec![post("p1", 5), post("p2", 20), post("p3", 20)];
        let digest = format_digest("stocks", &posts);

        let p1 = digest.find("Title: p1").unwrap();
        let p2 = digest.find("Title: p2").unwrap();
        let p3 = digest.find("Title: p3").unwrap();
        assert!(p2 < p3 && p3 < p1);
    }

    #[test]
    fn test_long_body_is_cut_to_excerpt_ceiling() {
        let mut long = post("long", 1);
        long.body_excerpt = "b".repeat(2000);
        let digest = format_digest("stocks", &[long]);

        let expected = format!("Post content: {}...\n\n", "b".repeat(1500));
        assert!(digest.contains(&expected));
    }

    #[test]
    fn test_comment_block_is_capped_with_marker() {
        let mut busy = post("busy", 1);
        busy.comments = (0..21).map(|_| "c".repeat(200)).collect();
        let digest = format_digest("stocks", &[busy]);

        let start = digest.find("Comments:\n- ").unwrap() + "Comments:\n- ".len();
        let end = digest.find("\n~~~POST #1 END").unwrap();
        let block = &digest[start..end];
        assert_eq!(block.chars().count(), 3000 + 3);
        assert!(block.ends_with("..."));
    }

    #[test]
    fn test_comment_block_at_cap_has_no_marker() {
        let mut exact = post("exact", 1);
        exact.comments = vec!["é".repeat(3000)];
        let digest = format_digest("stocks", &[exact]);
        assert!(digest.contains(&format!("Comments:\n- {}\n~~~POST", "é".repeat(3000))));
    }
}

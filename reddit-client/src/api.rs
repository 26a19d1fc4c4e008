use crate::rate_limiter::{RateLimitConfig, RateLimiter};
use chrono::DateTime;
use digest_core::{
    Comment, CommentNode, CoreError, ForumApiError, MoreComments, RawItem,
};
use reqwest::{Client, Method, Response};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const REDDIT_API_BASE: &str = "https://oauth.reddit.com";
const SHORTLINK_BASE: &str = "https://redd.it";

/// Reddit accepts at most this many ids per `morechildren` call.
pub const MORECHILDREN_BATCH: usize = 100;

const REMOVED_MARKERS: [&str; 2] = ["[removed]", "[deleted]"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<T>,
    pub after: Option<String>,
    pub before: Option<String>,
    #[serde(default)]
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

pub type RedditPostListing = RedditListing<RedditListingChild<RedditPostData>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    pub subreddit: String,
    pub permalink: String,
    pub created_utc: f64,
    pub score: i64,
    pub num_comments: u64,
    #[serde(default)]
    pub stickied: bool,
}

/// A node of a comment listing: a comment or a "load more" stub.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum RedditThing {
    #[serde(rename = "t1")]
    Comment(RedditCommentData),
    #[serde(rename = "more")]
    More(RedditMoreData),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditCommentData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub replies: RedditReplies,
}

/// Reddit sends `""` instead of an empty listing when a comment has no replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RedditReplies {
    Listing(RedditListing<RedditThing>),
    Empty(String),
}

impl Default for RedditReplies {
    fn default() -> Self {
        RedditReplies::Empty(String::new())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditMoreData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub children: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenResponse {
    json: MoreChildrenJson,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenJson {
    #[serde(default)]
    errors: Vec<serde_json::Value>,
    data: Option<MoreChildrenData>,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenData {
    #[serde(default)]
    things: Vec<RedditThing>,
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    rate_limiter: RateLimiter,
    user_agent: String,
    api_base: String,
}

impl RedditApiClient {
    pub fn new(user_agent: String) -> Result<Self, CoreError> {
        Self::with_api_base(user_agent, REDDIT_API_BASE.to_string())
    }

    pub fn with_api_base(user_agent: String, api_base: String) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            rate_limiter: RateLimiter::new(RateLimitConfig::reddit_oauth()),
            user_agent,
            api_base,
        })
    }

    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: &[(&str, &str)],
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", self.api_base, endpoint);

        let permit = self.rate_limiter.acquire_permit().await;
        debug!(
            "Acquired rate limit permit for {} {} after {:?}",
            method, endpoint, permit.queue_wait_time
        );
        let budget = self.rate_limiter.get_rate_limit_status().await;
        if budget.is_near_limit() {
            debug!(
                "Burst allowance {:.0}% used ({} of {} left)",
                budget.utilization_percentage(),
                budget.available_tokens,
                budget.max_tokens
            );
        }

        let request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token)
            .query(query_params);

        debug!("Making Reddit API request: {} {}", method, endpoint);
        let response = match request_builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for {} {}: {}", method, endpoint, e);
                if e.is_timeout() {
                    return Err(CoreError::ForumApi(ForumApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!("Request successful: {} {}", status, endpoint);
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());
        Err(CoreError::ForumApi(status_error(
            status.as_u16(),
            endpoint,
            retry_after,
        )))
    }

    /// Newest posts of a subreddit, newest first.
    pub async fn get_new_posts(
        &self,
        access_token: &str,
        subreddit: &str,
        limit: usize,
    ) -> Result<RedditPostListing, CoreError> {
        let endpoint = format!("/r/{}/new", subreddit);
        let limit = limit.to_string();
        let params = [("limit", limit.as_str()), ("raw_json", "1")];

        let response = self
            .make_request(Method::GET, &endpoint, access_token, &params)
            .await?;

        let listing: RedditPostListing = response.json().await.map_err(|e| {
            error!("Failed to parse subreddit posts: {}", e);
            CoreError::ForumApi(ForumApiError::InvalidResponse {
                details: format!("Failed to parse posts for r/{}", subreddit),
            })
        })?;

        info!(
            "Retrieved {} posts from r/{}",
            listing.data.children.len(),
            subreddit
        );
        Ok(listing)
    }

    /// Top-level comment listing of a post.
    pub async fn get_comments(
        &self,
        access_token: &str,
        article_id: &str,
    ) -> Result<Vec<RedditThing>, CoreError> {
        let endpoint = format!("/comments/{}", article_id);
        let params = [("sort", "confidence"), ("raw_json", "1")];

        let response = self
            .make_request(Method::GET, &endpoint, access_token, &params)
            .await?;

        let (_post, comments): (IgnoredAny, RedditListing<RedditThing>) =
            response.json().await.map_err(|e| {
                error!("Failed to parse comments: {}", e);
                CoreError::ForumApi(ForumApiError::InvalidResponse {
                    details: format!("Failed to parse comments for {}", article_id),
                })
            })?;

        Ok(comments.data.children)
    }

    /// Expands a "load more" stub. Returns the flat list of things Reddit sent back.
    pub async fn get_more_children(
        &self,
        access_token: &str,
        link_name: &str,
        children: &[String],
    ) -> Result<Vec<RedditThing>, CoreError> {
        let ids = children
            .iter()
            .take(MORECHILDREN_BATCH)
            .cloned()
            .collect::<Vec<_>>()
            .join(",");
        let params = [
            ("api_type", "json"),
            ("link_id", link_name),
            ("children", ids.as_str()),
            ("raw_json", "1"),
        ];

        let response = self
            .make_request(Method::GET, "/api/morechildren", access_token, &params)
            .await?;

        let body: MoreChildrenResponse = response.json().await.map_err(|e| {
            error!("Failed to parse morechildren response: {}", e);
            CoreError::ForumApi(ForumApiError::InvalidResponse {
                details: format!("Failed to parse more comments for {}", link_name),
            })
        })?;

        if !body.json.errors.is_empty() {
            return Err(CoreError::ForumApi(ForumApiError::InvalidResponse {
                details: format!("morechildren errors: {:?}", body.json.errors),
            }));
        }

        Ok(body.json.data.map(|data| data.things).unwrap_or_default())
    }
}

/// Maps a failed status to the error the pipeline reports. A 404 under `/r/{name}` means the
/// community does not exist or is hidden.
pub fn status_error(status: u16, endpoint: &str, retry_after: Option<u64>) -> ForumApiError {
    match status {
        429 => {
            let retry_after = retry_after.unwrap_or(60);
            warn!("Rate limited, retry after {} seconds", retry_after);
            ForumApiError::RateLimitExceeded { retry_after }
        }
        401 => ForumApiError::InvalidToken,
        403 => ForumApiError::Forbidden {
            resource: endpoint.to_string(),
        },
        404 => match endpoint
            .strip_prefix("/r/")
            .and_then(|rest| rest.split('/').next())
            .filter(|name| !name.is_empty())
        {
            Some(source_name) => ForumApiError::SourceNotFound {
                source_name: source_name.to_string(),
            },
            None => ForumApiError::InvalidResponse {
                details: format!("Resource not found: {}", endpoint),
            },
        },
        code if (500..600).contains(&code) => ForumApiError::ServerError { status_code: code },
        code => ForumApiError::InvalidResponse {
            details: format!("Unexpected status {} for {}", code, endpoint),
        },
    }
}

impl RedditPostData {
    pub fn into_raw_item(self) -> Result<RawItem, CoreError> {
        let created_at = DateTime::from_timestamp_millis((self.created_utc * 1000.0) as i64)
            .ok_or_else(|| {
                CoreError::ForumApi(ForumApiError::InvalidResponse {
                    details: format!("Invalid created_utc {} on {}", self.created_utc, self.id),
                })
            })?;

        Ok(RawItem {
            permalink: format!("{}/{}", SHORTLINK_BASE, self.id),
            id: self.id,
            source: self.subreddit,
            title: self.title,
            score: self.score,
            comment_count: self.num_comments,
            body: self.selftext,
            created_at,
        })
    }
}

impl RedditThing {
    pub fn into_node(self) -> CommentNode {
        self.into_entry().2
    }

    /// `(name, parent_id, node)`.
    fn into_entry(self) -> (String, String, CommentNode) {
        match self {
            RedditThing::Comment(data) => {
                let replies = match data.replies {
                    RedditReplies::Listing(listing) => listing
                        .data
                        .children
                        .into_iter()
                        .map(RedditThing::into_node)
                        .collect(),
                    RedditReplies::Empty(_) => Vec::new(),
                };
                let body = data
                    .body
                    .filter(|body| !REMOVED_MARKERS.contains(&body.trim()));
                let node = CommentNode::Comment(Comment {
                    id: data.id,
                    body,
                    replies,
                });
                (data.name, data.parent_id, node)
            }
            RedditThing::More(data) => {
                let node = CommentNode::More(MoreComments {
                    id: data.id,
                    count: data.count,
                    children: data.children,
                });
                (data.name, data.parent_id, node)
            }
        }
    }
}

/// Rebuilds the nesting of a flat `morechildren` result.
///
/// Things whose parent is not part of the batch become roots, in the order Reddit sent them.
pub fn assemble_thread(things: Vec<RedditThing>) -> Vec<CommentNode> {
    let entries: Vec<(String, String, CommentNode)> = things
        .into_iter()
        .map(RedditThing::into_entry)
        .collect();
    let names: HashSet<String> = entries.iter().map(|(name, _, _)| name.clone()).collect();

    // Walking backwards means every child is finished before its parent is seen.
    let mut pending: HashMap<String, Vec<CommentNode>> = HashMap::new();
    let mut roots = Vec::new();
    for (name, parent_id, mut node) in entries.into_iter().rev() {
        if let (CommentNode::Comment(comment), Some(mut children)) =
            (&mut node, pending.remove(&name))
        {
            children.reverse();
            comment.replies.extend(children);
        }

        if names.contains(&parent_id) {
            pending.entry(parent_id).or_default().push(node);
        } else {
            roots.push(node);
        }
    }

    roots.reverse();
    roots
}

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};

/// A post as collected for one run. Only its serialized digest form is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub title: String,
    pub score: i64,
    pub comment_count: u64,
    pub body_excerpt: String,
    pub permalink: String,
    pub created_at: DateTime<Utc>,
    pub comments: Vec<String>,
}

/// An item exactly as the forum listed it, before the time window and comment flattening.
#[derive(Debug, Clone)]
pub struct RawItem {
    pub id: String,
    pub source: String,
    pub title: String,
    pub score: i64,
    pub comment_count: u64,
    pub body: String,
    pub permalink: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: String,
    /// `None` when the forum has no text for it (removed, deleted).
    pub body: Option<String>,
    pub replies: Vec<CommentNode>,
}

/// Placeholder for a subtree the forum did not inline.
#[derive(Debug, Clone, PartialEq)]
pub struct MoreComments {
    pub id: String,
    pub count: u32,
    pub children: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommentNode {
    Comment(Comment),
    More(MoreComments),
}

impl CommentNode {
    pub fn body(&self) -> Option<&str> {
        match self {
            CommentNode::Comment(comment) => comment.body.as_deref(),
            CommentNode::More(_) => None,
        }
    }
}

/// A post's comment forest: top-level nodes in the forum's order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentTree {
    pub nodes: Vec<CommentNode>,
}

impl CommentTree {
    pub fn new(nodes: Vec<CommentNode>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every node in breadth-first order, top level first.
    pub fn breadth_first(&self) -> Vec<&CommentNode> {
        let mut queue: VecDeque<&CommentNode> = self.nodes.iter().collect();
        let mut flat = Vec::new();

        while let Some(node) = queue.pop_front() {
            flat.push(node);
            if let CommentNode::Comment(comment) = node {
                queue.extend(comment.replies.iter());
            }
        }

        flat
    }

    /// Unexpanded placeholders in breadth-first order.
    pub fn pending_more(&self) -> Vec<&MoreComments> {
        self.breadth_first()
            .into_iter()
            .filter_map(|node| match node {
                CommentNode::More(more) => Some(more),
                CommentNode::Comment(_) => None,
            })
            .collect()
    }

    /// Replaces each placeholder whose id has an entry with the given nodes, in place.
    pub fn splice(&mut self, replacements: &mut HashMap<String, Vec<CommentNode>>) {
        splice_nodes(&mut self.nodes, replacements);
    }
}

fn splice_nodes(nodes: &mut Vec<CommentNode>, replacements: &mut HashMap<String, Vec<CommentNode>>) {
    if replacements.is_empty() {
        return;
    }

    let mut spliced = Vec::with_capacity(nodes.len());
    for mut node in nodes.drain(..) {
        let expanded = match &mut node {
            CommentNode::More(more) => replacements.remove(&more.id),
            CommentNode::Comment(comment) => {
                splice_nodes(&mut comment.replies, replacements);
                None
            }
        };
        match expanded {
            Some(expanded) => spliced.extend(expanded),
            None => spliced.push(node),
        }
    }
    *nodes = spliced;
}

//! # Materialized Paths
//!
//! A post's position in its thread is stored as the ordered list of its
//! ancestors' identifiers, ending in its own identifier. Comparing two paths
//! element by element (shorter prefix first) yields depth-first, left-to-right
//! order, which is what the tree listings and the `path` index rely on.
//! `Vec<i64>` ordering and Postgres `BIGINT[]` ordering agree on this.

use serde::{Deserialize, Serialize};

use crate::models::PostId;

/// The ancestor chain of a post, root first, the post itself last.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostPath(Vec<PostId>);

impl PostPath {
    /// Path of a top-level post.
    pub fn root(id: PostId) -> Self {
        Self(vec![id])
    }

    /// Path of a reply: the parent's path extended by one element.
    pub fn child(&self, id: PostId) -> Self {
        let mut ids = Vec::with_capacity(self.0.len() + 1);
        ids.extend_from_slice(&self.0);
        ids.push(id);
        Self(ids)
    }

    /// Picks `root` or `child` depending on whether a parent path is known.
    pub fn for_post(parent: Option<&PostPath>, id: PostId) -> Self {
        match parent {
            Some(parent) => parent.child(id),
            None => Self::root(id),
        }
    }

    /// First element, i.e. the top-level post this path descends from.
    pub fn root_id(&self) -> Option<PostId> {
        self.0.first().copied()
    }

    /// Last element, i.e. the post the path belongs to.
    pub fn leaf_id(&self) -> Option<PostId> {
        self.0.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    /// True when `self` lies inside the subtree rooted at `ancestor`
    /// (a path is inside its own subtree).
    pub fn descends_from(&self, ancestor: &PostPath) -> bool {
        self.0.starts_with(&ancestor.0)
    }

    pub fn as_slice(&self) -> &[PostId] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<PostId> {
        self.0
    }
}

impl From<Vec<PostId>> for PostPath {
    fn from(ids: Vec<PostId>) -> Self {
        Self(ids)
    }
}

//! # Domain Models
//!
//! These structs represent the entities a threaded discussion is built from.
//! Post identifiers are assigned by storage and grow monotonically, so they
//! double as creation order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::path::PostPath;

pub type PostId = i64;
pub type ThreadId = i32;

/// Parent value carried by top-level posts.
pub const NO_PARENT: PostId = 0;

/// A discussion thread. Owned by the thread service; only `id` and `forum`
/// matter to post storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
    /// Slug of the owning forum
    pub forum: String,
    pub slug: Option<String>,
}

/// A reply as submitted by a client, before storage assigns its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub author: String,
    pub message: String,
    #[serde(default)]
    pub parent: PostId,
}

impl NewPost {
    pub fn new(author: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            message: message.into(),
            parent: NO_PARENT,
        }
    }

    pub fn reply_to(mut self, parent: PostId) -> Self {
        self.parent = parent;
        self
    }

    /// The declared parent, if this is not a top-level post.
    pub fn parent_id(&self) -> Option<PostId> {
        (self.parent != NO_PARENT).then_some(self.parent)
    }
}

/// The fundamental unit of conversation.
///
/// Serializes to the output record shared by every listing mode; the path is
/// storage bookkeeping and stays off the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub author: String,
    pub message: String,
    /// Denormalized from the thread for query locality
    pub forum: String,
    pub thread: ThreadId,
    pub parent: PostId,
    pub created: DateTime<Utc>,
    pub is_edited: bool,
    #[serde(skip)]
    pub path: PostPath,
}

impl Post {
    pub fn parent_id(&self) -> Option<PostId> {
        (self.parent != NO_PARENT).then_some(self.parent)
    }

    pub fn is_root(&self) -> bool {
        self.parent_id().is_none()
    }
}

/// Post totals maintained alongside every successful create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCounters {
    /// Posts in one forum
    pub forum: i64,
    /// Posts across the whole service
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post_parent() {
        let root = NewPost::new("alice", "first!");
        assert_eq!(root.parent_id(), None);

        let reply = NewPost::new("bob", "welcome").reply_to(42);
        assert_eq!(reply.parent_id(), Some(42));
    }

    #[test]
    fn test_new_post_parent_defaults_to_root() {
        let post: NewPost =
            serde_json::from_str(r#"{"author":"alice","message":"hi"}"#).unwrap();
        assert_eq!(post.parent, NO_PARENT);
    }

    #[test]
    fn test_post_output_record_hides_path() {
        let post = Post {
            id: 3,
            author: "carol".to_string(),
            message: "nested".to_string(),
            forum: "rust".to_string(),
            thread: 1,
            parent: 1,
            created: Utc::now(),
            is_edited: false,
            path: PostPath::from(vec![1, 3]),
        };

        let json = serde_json::to_value(&post).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert!(json.get("path").is_none());
        assert_eq!(json["isEdited"], false);
        assert_eq!(json["parent"], 1);
        assert_eq!(keys.len(), 8);
    }
}

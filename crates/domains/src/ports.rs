//! # Core Traits (Ports)
//!
//! Any storage adapter must implement these traits to back the post service.

use async_trait::async_trait;

use crate::errors::DomainResult;
use crate::models::{NewPost, Post, PostCounters, PostId, Thread};
use crate::query::ListPlan;

/// Resolves a thread token (numeric id or slug) to the thread it names.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ThreadGateway: Send + Sync {
    async fn resolve(&self, slug_or_id: &str) -> DomainResult<Option<Thread>>;
}

/// Persistence contract for posts and their materialized paths.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Inserts a batch into `thread` as one unit of work: parents checked,
    /// rows written, paths stamped, forum and service counters bumped.
    /// Returns the stored posts in input order.
    async fn create_posts(&self, thread: &Thread, posts: &[NewPost]) -> DomainResult<Vec<Post>>;

    /// Runs a list plan inside one read-only unit of work.
    async fn list_posts(&self, plan: &ListPlan) -> DomainResult<Vec<Post>>;

    async fn get_post(&self, id: PostId) -> DomainResult<Option<Post>>;

    async fn post_counters(&self, forum: &str) -> DomainResult<PostCounters>;
}

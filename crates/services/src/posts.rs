//! # Post Service
//!
//! Coordinates thread resolution, batch creation and the three listing modes.
//! All storage work for a single call happens inside the repository, which
//! owns the unit-of-work boundary.

use std::sync::Arc;

use domains::{
    DomainError, DomainResult, ListOptions, ListPlan, NewPost, Post, PostCounters, PostId,
    PostRepository, SortMode, Thread, ThreadGateway,
};
use tracing::{debug, info, instrument, warn};

pub struct PostService {
    threads: Arc<dyn ThreadGateway>,
    posts: Arc<dyn PostRepository>,
}

impl PostService {
    pub fn new(threads: Arc<dyn ThreadGateway>, posts: Arc<dyn PostRepository>) -> Self {
        Self { threads, posts }
    }

    /// Creates a batch of replies in the thread named by `slug_or_id`.
    ///
    /// An empty batch succeeds without touching storage. Otherwise either
    /// every post is stored (paths stamped, counters bumped) or none is.
    #[instrument(skip(self, posts), fields(count = posts.len()))]
    pub async fn create_posts(&self, slug_or_id: &str, posts: Vec<NewPost>) -> DomainResult<Vec<Post>> {
        if posts.is_empty() {
            debug!("nothing to insert");
            return Ok(Vec::new());
        }

        let thread = self.resolve_thread(slug_or_id).await?;
        let created = self.posts.create_posts(&thread, &posts).await?;

        info!(thread = thread.id, forum = %thread.forum, created = created.len(), "posts created");
        Ok(created)
    }

    /// Lists one page of a thread in the requested traversal order.
    #[instrument(skip(self))]
    pub async fn list_posts(
        &self,
        slug_or_id: &str,
        sort: SortMode,
        options: ListOptions,
    ) -> DomainResult<Vec<Post>> {
        let thread = self.resolve_thread(slug_or_id).await?;
        let plan = ListPlan::new(thread.id, sort, &options);
        debug!(?plan, "list plan");

        let posts = self.posts.list_posts(&plan).await?;
        info!(thread = thread.id, fetched = posts.len(), "posts listed");
        Ok(posts)
    }

    pub async fn post_details(&self, id: PostId) -> DomainResult<Post> {
        self.posts
            .get_post(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    pub async fn post_counters(&self, forum: &str) -> DomainResult<PostCounters> {
        self.posts.post_counters(forum).await
    }

    async fn resolve_thread(&self, slug_or_id: &str) -> DomainResult<Thread> {
        match self.threads.resolve(slug_or_id).await? {
            Some(thread) => Ok(thread),
            None => {
                warn!(slug_or_id, "thread not found");
                Err(DomainError::ThreadNotFound(slug_or_id.to_string()))
            }
        }
    }
}

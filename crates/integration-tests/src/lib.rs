//! Shared fixtures for the integration suites.

use std::sync::Arc;

use domains::{ListOptions, NewPost, Post, PostId, PostRepository, SortMode, Thread, ThreadGateway};
use services::PostService;
use storage_adapters::InMemoryForum;

pub const FORUM: &str = "rust";
pub const THREAD: &str = "ownership";

pub fn thread(id: i32, forum: &str, slug: &str) -> Thread {
    Thread {
        id,
        forum: forum.to_string(),
        slug: Some(slug.to_string()),
    }
}

/// A service over a fresh in-memory store holding the default thread.
pub fn memory_service() -> (Arc<InMemoryForum>, PostService) {
    let store = Arc::new(InMemoryForum::with_threads([thread(1, FORUM, THREAD)]));
    let service = service_over(store.clone(), store.clone());
    (store, service)
}

pub fn service_over(
    threads: Arc<dyn ThreadGateway>,
    posts: Arc<dyn PostRepository>,
) -> PostService {
    PostService::new(threads, posts)
}

pub fn ids(posts: &[Post]) -> Vec<PostId> {
    posts.iter().map(|post| post.id).collect()
}

pub fn page(since: Option<PostId>, limit: Option<u32>, desc: bool) -> ListOptions {
    ListOptions { since, limit, desc }
}

pub async fn list(service: &PostService, sort: SortMode, options: ListOptions) -> Vec<PostId> {
    ids(&service.list_posts(THREAD, sort, options).await.unwrap())
}

/// Builds this tree in four batches on an empty thread; ids are local to
/// the batch order so callers can map them back:
///
/// ```text
/// r1 ─┬─ a ── d
///     ├─ b
///     └─ f
/// r2
/// r3 ─── c ── e
/// ```
///
/// Returned in the order `[r1, r2, r3, a, b, c, d, e, f]`.
pub async fn forest(service: &PostService) -> Vec<Post> {
    let roots = service
        .create_posts(
            THREAD,
            vec![NewPost::new("u1", "r1"), NewPost::new("u2", "r2"), NewPost::new("u3", "r3")],
        )
        .await
        .unwrap();
    let (r1, r3) = (roots[0].id, roots[2].id);

    let replies = service
        .create_posts(
            THREAD,
            vec![
                NewPost::new("u4", "a").reply_to(r1),
                NewPost::new("u5", "b").reply_to(r1),
                NewPost::new("u6", "c").reply_to(r3),
            ],
        )
        .await
        .unwrap();
    let (a, c) = (replies[0].id, replies[2].id);

    let nested = service
        .create_posts(
            THREAD,
            vec![NewPost::new("u7", "d").reply_to(a), NewPost::new("u8", "e").reply_to(c)],
        )
        .await
        .unwrap();

    let late = service
        .create_posts(THREAD, vec![NewPost::new("u9", "f").reply_to(r1)])
        .await
        .unwrap();

    roots.into_iter().chain(replies).chain(nested).chain(late).collect()
}

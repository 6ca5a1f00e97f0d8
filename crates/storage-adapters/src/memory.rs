//! # In-memory forum storage
//!
//! Implements both ports over a single `RwLock`ed state. Holding the write
//! lock for a whole batch makes each create one unit of work; readers take
//! the read lock and never see a post without its path.
//!
//! Query semantics mirror the Postgres adapter row for row, which keeps it
//! usable as a test double for the service layer.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use domains::{
    Direction, DomainError, DomainResult, ListPlan, NewPost, Post, PostCounters, PostFilter,
    PostId, PostOrder, PostPath, PostQuery, PostRepository, RootQuery, Thread, ThreadGateway,
    ThreadId,
};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct State {
    threads: Vec<Thread>,
    posts: BTreeMap<PostId, Post>,
    forum_posts: HashMap<String, i64>,
    total_posts: i64,
    last_id: PostId,
}

#[derive(Default)]
pub struct InMemoryForum {
    state: RwLock<State>,
}

impl InMemoryForum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threads(threads: impl IntoIterator<Item = Thread>) -> Self {
        let state = State {
            threads: threads.into_iter().collect(),
            ..State::default()
        };
        Self {
            state: RwLock::new(state),
        }
    }
}

impl State {
    fn find_thread(&self, slug_or_id: &str) -> Option<&Thread> {
        match slug_or_id.parse::<ThreadId>() {
            Ok(id) => self.threads.iter().find(|t| t.id == id),
            Err(_) => self.threads.iter().find(|t| {
                t.slug
                    .as_deref()
                    .is_some_and(|slug| slug.eq_ignore_ascii_case(slug_or_id))
            }),
        }
    }

    fn path_of(&self, id: PostId) -> Option<&PostPath> {
        self.posts.get(&id).map(|post| &post.path)
    }

    fn admits(&self, filter: Option<&PostFilter>, post: &Post) -> bool {
        match filter {
            None => true,
            Some(PostFilter::IdAfter(cursor)) => post.id > *cursor,
            Some(PostFilter::IdBefore(cursor)) => post.id < *cursor,
            Some(PostFilter::PathAfter(cursor)) => {
                self.path_of(*cursor).is_some_and(|path| post.path > *path)
            }
            Some(PostFilter::PathBefore(cursor)) => {
                self.path_of(*cursor).is_some_and(|path| post.path < *path)
            }
            Some(PostFilter::UnderRoots(roots)) => post
                .path
                .root_id()
                .is_some_and(|root| roots.contains(&root)),
        }
    }

    fn fetch(&self, query: &PostQuery) -> Vec<Post> {
        let mut rows: Vec<&Post> = self
            .posts
            .values()
            .filter(|post| post.thread == query.thread)
            .filter(|post| self.admits(query.filter.as_ref(), post))
            .collect();
        rows.sort_by(|a, b| compare(query.order, query.direction, a, b));
        if let Some(limit) = query.limit {
            rows.truncate(limit as usize);
        }
        rows.into_iter().cloned().collect()
    }

    fn select_roots(&self, query: &RootQuery) -> Vec<PostId> {
        let cursor_root = match query.since {
            Some(since) => match self.path_of(since).and_then(PostPath::root_id) {
                Some(root) => Some(root),
                None => return Vec::new(),
            },
            None => None,
        };

        let mut roots: Vec<&Post> = self
            .posts
            .values()
            .filter(|post| post.thread == query.thread && post.path.is_root())
            .filter(|post| match (cursor_root, query.direction) {
                (None, _) => true,
                (Some(cursor), Direction::Asc) => post.id > cursor,
                (Some(cursor), Direction::Desc) => post.id < cursor,
            })
            .collect();
        roots.sort_by(|a, b| compare(PostOrder::Path, query.direction, a, b));
        if let Some(limit) = query.limit {
            roots.truncate(limit as usize);
        }
        roots.into_iter().map(|post| post.id).collect()
    }
}

fn compare(order: PostOrder, direction: Direction, a: &Post, b: &Post) -> Ordering {
    let directed = |ordering: Ordering| match direction {
        Direction::Asc => ordering,
        Direction::Desc => ordering.reverse(),
    };
    match order {
        PostOrder::Id => directed(a.id.cmp(&b.id)),
        PostOrder::Path => directed(a.path.cmp(&b.path)),
        PostOrder::RootThenPath => directed(a.path.root_id().cmp(&b.path.root_id()))
            .then_with(|| a.path.cmp(&b.path)),
    }
}

#[async_trait]
impl ThreadGateway for InMemoryForum {
    async fn resolve(&self, slug_or_id: &str) -> DomainResult<Option<Thread>> {
        Ok(self.state.read().await.find_thread(slug_or_id).cloned())
    }
}

#[async_trait]
impl PostRepository for InMemoryForum {
    async fn create_posts(&self, thread: &Thread, posts: &[NewPost]) -> DomainResult<Vec<Post>> {
        let mut state = self.state.write().await;

        // Every parent is checked before the first row is written.
        let mut parent_paths = HashMap::new();
        for parent in posts.iter().filter_map(NewPost::parent_id) {
            let path = state
                .posts
                .get(&parent)
                .filter(|post| post.thread == thread.id)
                .map(|post| post.path.clone())
                .ok_or(DomainError::ParentNotFound(parent))?;
            parent_paths.insert(parent, path);
        }

        let created = Utc::now();
        let mut stored = Vec::with_capacity(posts.len());
        for new in posts {
            state.last_id += 1;
            let id = state.last_id;
            let parent_path = new.parent_id().and_then(|parent| parent_paths.get(&parent));
            stored.push(Post {
                id,
                author: new.author.clone(),
                message: new.message.clone(),
                forum: thread.forum.clone(),
                thread: thread.id,
                parent: new.parent,
                created,
                is_edited: false,
                path: PostPath::for_post(parent_path, id),
            });
        }

        for post in &stored {
            state.posts.insert(post.id, post.clone());
        }
        let count = stored.len() as i64;
        *state.forum_posts.entry(thread.forum.clone()).or_default() += count;
        state.total_posts += count;

        debug!(thread = thread.id, count, "stored posts in memory");
        Ok(stored)
    }

    async fn list_posts(&self, plan: &ListPlan) -> DomainResult<Vec<Post>> {
        let state = self.state.read().await;
        let posts = match plan {
            ListPlan::Posts(query) => state.fetch(query),
            ListPlan::RootGrouped(roots) => {
                let selected = state.select_roots(roots);
                if selected.is_empty() {
                    return Ok(Vec::new());
                }
                state.fetch(&roots.expand(selected))
            }
        };
        Ok(posts)
    }

    async fn get_post(&self, id: PostId) -> DomainResult<Option<Post>> {
        Ok(self.state.read().await.posts.get(&id).cloned())
    }

    async fn post_counters(&self, forum: &str) -> DomainResult<PostCounters> {
        let state = self.state.read().await;
        Ok(PostCounters {
            forum: state.forum_posts.get(forum).copied().unwrap_or_default(),
            total: state.total_posts,
        })
    }
}

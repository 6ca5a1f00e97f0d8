//! # PgPostRepository
//!
//! Batch creation runs in one transaction: parents are read (and share-locked)
//! first, rows are inserted, then each new row gets its path stamped from the
//! parent path read earlier in the same transaction. Counters are bumped last
//! so a failure anywhere rolls back the whole batch.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    DomainError, DomainResult, ListPlan, NewPost, Post, PostCounters, PostId, PostPath,
    PostQuery, PostRepository, Thread, ThreadId,
};
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::{debug, warn};

use super::sql;

/// Posts per INSERT statement; five binds each keeps a statement under the
/// 65535 parameter limit.
const INSERT_CHUNK: usize = 10_000;

#[derive(Debug, FromRow)]
struct PostRow {
    id: i64,
    author: String,
    message: String,
    forum: String,
    thread: i32,
    parent: i64,
    created: DateTime<Utc>,
    is_edited: bool,
    path: Vec<i64>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            author: row.author,
            message: row.message,
            forum: row.forum,
            thread: row.thread,
            parent: row.parent,
            created: row.created,
            is_edited: row.is_edited,
            path: PostPath::from(row.path),
        }
    }
}

#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Reads the paths of every declared parent, share-locking the rows so the
/// paths stay fixed until commit. Fails on the first parent that is missing
/// from `thread`.
async fn lock_parents(
    conn: &mut PgConnection,
    thread: ThreadId,
    posts: &[NewPost],
) -> DomainResult<HashMap<PostId, PostPath>> {
    let parents: Vec<PostId> = posts
        .iter()
        .filter_map(NewPost::parent_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if parents.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i64, Vec<i64>)> = sqlx::query_as(
        "SELECT id, path FROM posts WHERE thread = $1 AND id = ANY($2) FOR SHARE",
    )
    .bind(thread)
    .bind(&parents)
    .fetch_all(&mut *conn)
    .await
    .map_err(DomainError::storage)?;

    let paths: HashMap<PostId, PostPath> = rows
        .into_iter()
        .map(|(id, path)| (id, PostPath::from(path)))
        .collect();

    if let Some(missing) = parents.iter().find(|id| !paths.contains_key(id)) {
        warn!(parent = missing, thread, "parent post not found");
        return Err(DomainError::ParentNotFound(*missing));
    }
    Ok(paths)
}

async fn stamp_path(conn: &mut PgConnection, post: &Post) -> DomainResult<()> {
    sqlx::query("UPDATE posts SET path = $1 WHERE id = $2")
        .bind(post.path.as_slice().to_vec())
        .bind(post.id)
        .execute(&mut *conn)
        .await
        .map_err(DomainError::storage)?;
    Ok(())
}

async fn bump_counters(conn: &mut PgConnection, forum: &str, count: i64) -> DomainResult<()> {
    sqlx::query("UPDATE forums SET posts = posts + $1 WHERE slug = $2")
        .bind(count)
        .bind(forum)
        .execute(&mut *conn)
        .await
        .map_err(DomainError::storage)?;
    sqlx::query("UPDATE service_stats SET posts = posts + $1")
        .bind(count)
        .execute(&mut *conn)
        .await
        .map_err(DomainError::storage)?;
    Ok(())
}

async fn fetch(conn: &mut PgConnection, query: &PostQuery) -> DomainResult<Vec<Post>> {
    let mut qb = sql::select_posts(query);
    debug!(sql = qb.sql(), "fetching posts");
    let rows: Vec<PostRow> = qb
        .build_query_as()
        .fetch_all(&mut *conn)
        .await
        .map_err(DomainError::storage)?;
    Ok(rows.into_iter().map(Post::from).collect())
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create_posts(&self, thread: &Thread, posts: &[NewPost]) -> DomainResult<Vec<Post>> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        // Dropping `tx` on any early return rolls the batch back.
        let mut tx = self.pool.begin().await.map_err(DomainError::storage)?;

        let parent_paths = lock_parents(&mut tx, thread.id, posts).await?;

        let mut created = Vec::with_capacity(posts.len());
        for chunk in posts.chunks(INSERT_CHUNK) {
            let mut qb = sql::insert_posts(thread, chunk);
            let rows: Vec<PostRow> = qb
                .build_query_as()
                .fetch_all(&mut *tx)
                .await
                .map_err(DomainError::storage)?;
            created.extend(rows.into_iter().map(Post::from));
        }

        for post in &mut created {
            let parent_path = post.parent_id().and_then(|parent| parent_paths.get(&parent));
            post.path = PostPath::for_post(parent_path, post.id);
            stamp_path(&mut tx, post).await?;
        }

        bump_counters(&mut tx, &thread.forum, created.len() as i64).await?;
        tx.commit().await.map_err(DomainError::storage)?;

        debug!(thread = thread.id, count = created.len(), "batch committed");
        Ok(created)
    }

    async fn list_posts(&self, plan: &ListPlan) -> DomainResult<Vec<Post>> {
        let mut tx = self.pool.begin().await.map_err(DomainError::storage)?;
        // Root page and rows must come from the same snapshot.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(DomainError::storage)?;

        let posts = match plan {
            ListPlan::Posts(query) => fetch(&mut tx, query).await?,
            ListPlan::RootGrouped(roots) => {
                let mut qb = sql::select_roots(roots);
                let selected: Vec<PostId> = qb
                    .build_query_scalar()
                    .fetch_all(&mut *tx)
                    .await
                    .map_err(DomainError::storage)?;
                debug!(roots = ?selected, "selected root page");

                if selected.is_empty() {
                    Vec::new()
                } else {
                    fetch(&mut tx, &roots.expand(selected)).await?
                }
            }
        };

        tx.commit().await.map_err(DomainError::storage)?;
        Ok(posts)
    }

    async fn get_post(&self, id: PostId) -> DomainResult<Option<Post>> {
        let query = format!("SELECT {} FROM posts WHERE id = $1", sql::POST_COLUMNS);
        let row: Option<PostRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DomainError::storage)?;
        Ok(row.map(Post::from))
    }

    async fn post_counters(&self, forum: &str) -> DomainResult<PostCounters> {
        let (forum_posts, total): (i64, i64) = sqlx::query_as(
            "SELECT COALESCE((SELECT posts FROM forums WHERE slug = $1), 0), \
                    COALESCE((SELECT posts FROM service_stats), 0)",
        )
        .bind(forum)
        .fetch_one(&self.pool)
        .await
        .map_err(DomainError::storage)?;
        Ok(PostCounters {
            forum: forum_posts,
            total,
        })
    }
}

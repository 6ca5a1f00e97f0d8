//! Demo data. Forums and threads belong to the thread service, so they are
//! written here directly; posts go through `PostService` like any client.

use anyhow::Context;
use domains::{NewPost, Post, ThreadId};
use services::PostService;
use sqlx::PgPool;
use tracing::info;

pub async fn ensure_thread(pool: &PgPool, forum: &str, slug: &str) -> sqlx::Result<ThreadId> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO forums (slug, title, author) VALUES ($1, $2, 'seed') ON CONFLICT (slug) DO NOTHING",
    )
    .bind(forum)
    .bind(format!("{forum} discussions"))
    .execute(&mut *tx)
    .await?;

    let existing: Option<ThreadId> =
        sqlx::query_scalar("SELECT id FROM threads WHERE lower(slug) = lower($1)")
            .bind(slug)
            .fetch_optional(&mut *tx)
            .await?;

    let id = match existing {
        Some(id) => id,
        None => {
            sqlx::query_scalar(
                "INSERT INTO threads (slug, forum, title, author, message) \
                 VALUES ($1, $2, $3, 'seed', 'Say hello below.') RETURNING id",
            )
            .bind(slug)
            .bind(forum)
            .bind(format!("Thread {slug}"))
            .fetch_one(&mut *tx)
            .await?
        }
    };

    tx.commit().await?;
    Ok(id)
}

/// Two roots, a nested reply chain under the first and one reply under the
/// second. Returns every post created.
pub async fn reply_tree(service: &PostService, thread: &str) -> anyhow::Result<Vec<Post>> {
    let roots = service
        .create_posts(
            thread,
            vec![
                NewPost::new("alice", "What is ownership, really?"),
                NewPost::new("bob", "Share your favourite borrowck error."),
            ],
        )
        .await
        .context("creating root posts")?;
    let (first, second) = (roots[0].id, roots[1].id);

    let replies = service
        .create_posts(
            thread,
            vec![
                NewPost::new("carol", "Exactly one owner at a time.").reply_to(first),
                NewPost::new("dave", "E0502, every single day.").reply_to(second),
            ],
        )
        .await
        .context("creating replies")?;

    let nested = service
        .create_posts(
            thread,
            vec![NewPost::new("alice", "And moves transfer it.").reply_to(replies[0].id)],
        )
        .await
        .context("creating nested reply")?;

    let created: Vec<Post> = roots.into_iter().chain(replies).chain(nested).collect();
    info!(thread, count = created.len(), "seeded reply tree");
    Ok(created)
}

use async_trait::async_trait;
use domains::{DomainError, DomainResult, Thread, ThreadGateway, ThreadId};
use sqlx::{FromRow, PgPool};

#[derive(Debug, FromRow)]
struct ThreadRow {
    id: i32,
    forum: String,
    slug: Option<String>,
}

impl From<ThreadRow> for Thread {
    fn from(row: ThreadRow) -> Self {
        Thread {
            id: row.id,
            forum: row.forum,
            slug: row.slug,
        }
    }
}

/// Looks threads up by numeric id when the token parses as one, otherwise
/// by case-insensitive slug.
#[derive(Clone)]
pub struct PgThreadGateway {
    pool: PgPool,
}

impl PgThreadGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ThreadGateway for PgThreadGateway {
    async fn resolve(&self, slug_or_id: &str) -> DomainResult<Option<Thread>> {
        let row: Option<ThreadRow> = match slug_or_id.parse::<ThreadId>() {
            Ok(id) => {
                sqlx::query_as("SELECT id, forum, slug FROM threads WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
            }
            Err(_) => {
                sqlx::query_as("SELECT id, forum, slug FROM threads WHERE lower(slug) = lower($1)")
                    .bind(slug_or_id)
                    .fetch_optional(&self.pool)
                    .await
            }
        }
        .map_err(DomainError::storage)?;

        Ok(row.map(Thread::from))
    }
}

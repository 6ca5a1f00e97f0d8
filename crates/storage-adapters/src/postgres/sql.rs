//! Renders typed list queries into parameterized SQL. Every list request
//! goes through `select_posts` (plus `select_roots` for root-grouped pages),
//! so the three modes share the same thread filter, cursor handling and
//! limit binding.

use domains::{Direction, NewPost, PostFilter, PostOrder, PostQuery, RootQuery, Thread};
use sqlx::{Postgres, QueryBuilder};

pub(crate) const POST_COLUMNS: &str =
    "id, author, message, forum, thread, parent, created, is_edited, path";

fn keyword(direction: Direction) -> &'static str {
    match direction {
        Direction::Asc => "ASC",
        Direction::Desc => "DESC",
    }
}

pub(crate) fn select_posts(query: &PostQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(POST_COLUMNS)
        .push(" FROM posts WHERE thread = ")
        .push_bind(query.thread);

    match &query.filter {
        None => {}
        Some(PostFilter::IdAfter(cursor)) => {
            qb.push(" AND id > ").push_bind(*cursor);
        }
        Some(PostFilter::IdBefore(cursor)) => {
            qb.push(" AND id < ").push_bind(*cursor);
        }
        Some(PostFilter::PathAfter(cursor)) => {
            qb.push(" AND path > (SELECT path FROM posts WHERE id = ")
                .push_bind(*cursor)
                .push(")");
        }
        Some(PostFilter::PathBefore(cursor)) => {
            qb.push(" AND path < (SELECT path FROM posts WHERE id = ")
                .push_bind(*cursor)
                .push(")");
        }
        Some(PostFilter::UnderRoots(roots)) => {
            qb.push(" AND path[1] = ANY(").push_bind(roots.clone()).push(")");
        }
    }

    let direction = keyword(query.direction);
    match query.order {
        PostOrder::Id => qb.push(format_args!(" ORDER BY id {direction}")),
        PostOrder::Path => qb.push(format_args!(" ORDER BY path {direction}")),
        PostOrder::RootThenPath => qb.push(format_args!(" ORDER BY path[1] {direction}, path ASC")),
    };

    if let Some(limit) = query.limit {
        qb.push(" LIMIT ").push_bind(i64::from(limit));
    }
    qb
}

pub(crate) fn select_roots(query: &RootQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT id FROM posts WHERE thread = ");
    qb.push_bind(query.thread)
        .push(" AND array_length(path, 1) = 1");

    if let Some(since) = query.since {
        let op = match query.direction {
            Direction::Asc => ">",
            Direction::Desc => "<",
        };
        qb.push(format_args!(" AND path[1] {op} (SELECT path[1] FROM posts WHERE id = "))
            .push_bind(since)
            .push(")");
    }

    qb.push(format_args!(" ORDER BY path {}", keyword(query.direction)));
    if let Some(limit) = query.limit {
        qb.push(" LIMIT ").push_bind(i64::from(limit));
    }
    qb
}

pub(crate) fn insert_posts(thread: &Thread, posts: &[NewPost]) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("INSERT INTO posts (author, message, forum, thread, parent) ");
    qb.push_values(posts, |mut row, post| {
        row.push_bind(post.author.clone())
            .push_bind(post.message.clone())
            .push_bind(thread.forum.clone())
            .push_bind(thread.id)
            .push_bind(post.parent);
    });
    qb.push(" RETURNING ").push(POST_COLUMNS);
    qb
}

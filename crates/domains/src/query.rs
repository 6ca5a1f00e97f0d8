//! # Post List Queries
//!
//! Listing a thread is described by a small typed plan instead of
//! SQL text. Each sort mode has one builder; adapters render or evaluate the
//! resulting [`PostQuery`] / [`RootQuery`] through a single execution path.
//!
//! | mode          | filter on `since`            | order                        | `limit` caps   |
//! |---------------|------------------------------|------------------------------|----------------|
//! | `flat`        | id, strictly past the cursor | id                           | rows           |
//! | `tree`        | path of the cursor post      | path                         | rows           |
//! | `parent_tree` | root of the cursor post      | first path element, then path| root subtrees  |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::models::{PostId, ThreadId};

/// Traversal order requested by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    Flat,
    Tree,
    ParentTree,
}

impl SortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Tree => "tree",
            Self::ParentTree => "parent_tree",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat" => Ok(Self::Flat),
            "tree" => Ok(Self::Tree),
            "parent_tree" => Ok(Self::ParentTree),
            other => Err(DomainError::UnsupportedSort(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn from_desc(desc: bool) -> Self {
        if desc {
            Self::Desc
        } else {
            Self::Asc
        }
    }
}

/// Cursor pagination parameters. All three are independent and optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    /// An existing post id; rows at or before it (in listing order) are skipped
    pub since: Option<PostId>,
    pub limit: Option<u32>,
    #[serde(default)]
    pub desc: bool,
}

impl ListOptions {
    pub fn direction(&self) -> Direction {
        Direction::from_desc(self.desc)
    }

    pub fn is_unbounded(&self) -> bool {
        self.since.is_none() && self.limit.is_none() && !self.desc
    }
}

/// Row predicate beyond `thread = ?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    IdAfter(PostId),
    IdBefore(PostId),
    /// Path strictly greater than the path of the given post
    PathAfter(PostId),
    /// Path strictly less than the path of the given post
    PathBefore(PostId),
    /// First path element is one of these roots
    UnderRoots(Vec<PostId>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOrder {
    Id,
    Path,
    /// Group by first path element in the query direction, then path
    /// ascending inside each group.
    RootThenPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub thread: ThreadId,
    pub filter: Option<PostFilter>,
    pub order: PostOrder,
    pub direction: Direction,
    pub limit: Option<u32>,
}

impl PostQuery {
    pub fn flat(thread: ThreadId, options: &ListOptions) -> Self {
        let direction = options.direction();
        let filter = options.since.map(|since| match direction {
            Direction::Asc => PostFilter::IdAfter(since),
            Direction::Desc => PostFilter::IdBefore(since),
        });
        Self {
            thread,
            filter,
            order: PostOrder::Id,
            direction,
            limit: options.limit,
        }
    }

    pub fn tree(thread: ThreadId, options: &ListOptions) -> Self {
        let direction = options.direction();
        let filter = options.since.map(|since| match direction {
            Direction::Asc => PostFilter::PathAfter(since),
            Direction::Desc => PostFilter::PathBefore(since),
        });
        Self {
            thread,
            filter,
            order: PostOrder::Path,
            direction,
            limit: options.limit,
        }
    }

    /// Every post of the thread, whole subtrees kept together.
    pub fn all_subtrees(thread: ThreadId) -> Self {
        Self {
            thread,
            filter: None,
            order: PostOrder::RootThenPath,
            direction: Direction::Asc,
            limit: None,
        }
    }
}

/// Page of top-level posts that bounds a `parent_tree` listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootQuery {
    pub thread: ThreadId,
    /// Roots are compared against the root of this post
    pub since: Option<PostId>,
    pub direction: Direction,
    pub limit: Option<u32>,
}

impl RootQuery {
    pub fn new(thread: ThreadId, options: &ListOptions) -> Self {
        Self {
            thread,
            since: options.since,
            direction: options.direction(),
            limit: options.limit,
        }
    }

    /// The row query covering the subtrees of the selected roots. `limit`
    /// was already spent on roots, so the row count is left open.
    pub fn expand(&self, roots: Vec<PostId>) -> PostQuery {
        PostQuery {
            thread: self.thread,
            filter: Some(PostFilter::UnderRoots(roots)),
            order: PostOrder::RootThenPath,
            direction: self.direction,
            limit: None,
        }
    }
}

/// What an adapter runs for one list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListPlan {
    /// A single row query.
    Posts(PostQuery),
    /// Select roots first; an empty root page means an empty result.
    RootGrouped(RootQuery),
}

impl ListPlan {
    pub fn new(thread: ThreadId, sort: SortMode, options: &ListOptions) -> Self {
        match sort {
            SortMode::Flat => Self::Posts(PostQuery::flat(thread, options)),
            SortMode::Tree => Self::Posts(PostQuery::tree(thread, options)),
            SortMode::ParentTree if options.is_unbounded() => {
                Self::Posts(PostQuery::all_subtrees(thread))
            }
            SortMode::ParentTree => Self::RootGrouped(RootQuery::new(thread, options)),
        }
    }
}

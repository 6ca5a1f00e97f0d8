//! End-to-end behaviour of post creation and the three listing modes,
//! run through `PostService` against the in-memory store.

use std::collections::HashMap;
use std::sync::Arc;

use domains::{DomainError, NewPost, PostId, PostPath, PostRepository, SortMode};
use integration_tests::{forest, ids, list, memory_service, page, thread, FORUM, THREAD};
use storage_adapters::InMemoryForum;

#[tokio::test]
async fn test_small_thread_walkthrough() {
    let (_, service) = memory_service();
    let roots = service
        .create_posts(THREAD, vec![NewPost::new("a", "A"), NewPost::new("b", "B")])
        .await
        .unwrap();
    let replies = service
        .create_posts(THREAD, vec![NewPost::new("c", "C").reply_to(roots[0].id)])
        .await
        .unwrap();
    assert_eq!((roots[0].id, roots[1].id, replies[0].id), (1, 2, 3));

    assert_eq!(list(&service, SortMode::Flat, page(None, Some(2), false)).await, vec![1, 2]);
    assert_eq!(list(&service, SortMode::Tree, page(None, None, false)).await, vec![1, 3, 2]);
    assert_eq!(
        list(&service, SortMode::ParentTree, page(None, Some(1), false)).await,
        vec![1, 3]
    );
    assert_eq!(list(&service, SortMode::Flat, page(Some(1), None, false)).await, vec![2, 3]);
}

#[tokio::test]
async fn test_every_path_extends_its_parent() {
    let (store, service) = memory_service();
    let posts = forest(&service).await;

    for post in &posts {
        let stored = store.get_post(post.id).await.unwrap().unwrap();
        let expected = match post.parent_id() {
            Some(parent) => {
                let parent = store.get_post(parent).await.unwrap().unwrap();
                parent.path.child(post.id)
            }
            None => PostPath::root(post.id),
        };
        assert_eq!(stored.path, expected, "post {}", post.id);
        assert_eq!(post.path, expected, "returned post {}", post.id);
        assert_eq!((stored.forum.as_str(), stored.thread), (FORUM, 1));
    }
}

#[tokio::test]
async fn test_tree_order_is_depth_first() {
    let (_, service) = memory_service();
    let posts = forest(&service).await;
    let [r1, r2, r3, a, b, c, d, e, f]: [PostId; 9] = ids(&posts).try_into().unwrap();

    let tree = list(&service, SortMode::Tree, page(None, None, false)).await;
    assert_eq!(tree, vec![r1, a, d, b, f, r2, r3, c, e]);

    // Same sequence built by hand: roots in creation order, each subtree by path.
    let mut by_root: HashMap<PostId, Vec<&domains::Post>> = HashMap::new();
    for post in &posts {
        by_root.entry(post.path.root_id().unwrap()).or_default().push(post);
    }
    let mut roots: Vec<PostId> = by_root.keys().copied().collect();
    roots.sort();
    let expected: Vec<PostId> = roots
        .iter()
        .flat_map(|root| {
            let mut subtree = by_root[root].clone();
            subtree.sort_by(|x, y| x.path.cmp(&y.path));
            subtree.into_iter().map(|post| post.id).collect::<Vec<_>>()
        })
        .collect();
    assert_eq!(tree, expected);

    let reversed = list(&service, SortMode::Tree, page(None, None, true)).await;
    assert_eq!(reversed, tree.iter().rev().copied().collect::<Vec<_>>());
}

#[tokio::test]
async fn test_flat_pages() {
    let (_, service) = memory_service();
    let posts = forest(&service).await;
    let all = ids(&posts);

    assert_eq!(list(&service, SortMode::Flat, page(None, None, false)).await, all);
    assert_eq!(
        list(&service, SortMode::Flat, page(Some(5), Some(2), true)).await,
        vec![4, 3]
    );
    assert_eq!(list(&service, SortMode::Flat, page(Some(9), None, false)).await, Vec::<PostId>::new());
}

#[tokio::test]
async fn test_tree_pages_with_cursor() {
    let (_, service) = memory_service();
    let posts = forest(&service).await;
    let [r1, r2, r3, a, b, c, d, e, f]: [PostId; 9] = ids(&posts).try_into().unwrap();

    assert_eq!(
        list(&service, SortMode::Tree, page(Some(b), None, false)).await,
        vec![f, r2, r3, c, e]
    );
    assert_eq!(
        list(&service, SortMode::Tree, page(Some(b), Some(2), false)).await,
        vec![f, r2]
    );
    assert_eq!(
        list(&service, SortMode::Tree, page(Some(b), None, true)).await,
        vec![d, a, r1]
    );
}

#[tokio::test]
async fn test_cursor_never_in_its_own_page() {
    let (_, service) = memory_service();
    let posts = forest(&service).await;

    for cursor in ids(&posts) {
        for desc in [false, true] {
            for sort in [SortMode::Flat, SortMode::Tree] {
                let listed = list(&service, sort, page(Some(cursor), None, desc)).await;
                assert!(!listed.contains(&cursor), "{sort} desc={desc} cursor={cursor}");
            }
        }
    }
}

#[tokio::test]
async fn test_paging_tree_reassembles_full_order() {
    let (_, service) = memory_service();
    forest(&service).await;
    let full = list(&service, SortMode::Tree, page(None, None, false)).await;

    let mut walked = Vec::new();
    let mut since = None;
    loop {
        let chunk = list(&service, SortMode::Tree, page(since, Some(2), false)).await;
        if chunk.is_empty() {
            break;
        }
        since = chunk.last().copied();
        walked.extend(chunk);
    }
    assert_eq!(walked, full);
}

#[tokio::test]
async fn test_parent_tree_keeps_subtrees_together() {
    let (_, service) = memory_service();
    let posts = forest(&service).await;
    let [r1, r2, r3, a, b, c, d, e, f]: [PostId; 9] = ids(&posts).try_into().unwrap();

    assert_eq!(
        list(&service, SortMode::ParentTree, page(None, None, false)).await,
        vec![r1, a, d, b, f, r2, r3, c, e]
    );
    // Descending flips subtree order only.
    assert_eq!(
        list(&service, SortMode::ParentTree, page(None, Some(2), true)).await,
        vec![r3, c, e, r2]
    );
    assert_eq!(
        list(&service, SortMode::ParentTree, page(None, None, true)).await,
        vec![r3, c, e, r2, r1, a, d, b, f]
    );
    // Limit counts roots, not rows.
    let one_root = list(&service, SortMode::ParentTree, page(None, Some(1), false)).await;
    assert_eq!(one_root, vec![r1, a, d, b, f]);

    let next = list(&service, SortMode::ParentTree, page(Some(r1), Some(1), false)).await;
    assert_eq!(next, vec![r2]);
    let from_descendant = list(&service, SortMode::ParentTree, page(Some(d), Some(5), false)).await;
    assert_eq!(from_descendant, vec![r2, r3, c, e]);
    let before_last = list(&service, SortMode::ParentTree, page(Some(r3), None, true)).await;
    assert_eq!(before_last, vec![r2, r1, a, d, b, f]);
}

#[tokio::test]
async fn test_parent_tree_rows_never_interleave() {
    let (_, service) = memory_service();
    forest(&service).await;

    for desc in [false, true] {
        let rows = service
            .list_posts(THREAD, SortMode::ParentTree, page(None, None, desc))
            .await
            .unwrap();
        let mut seen: Vec<Option<PostId>> = Vec::new();
        for post in &rows {
            let root = post.path.root_id();
            if seen.last() != Some(&root) {
                assert!(!seen.contains(&root), "subtree {root:?} split");
                seen.push(root);
            }
        }
        assert_eq!(seen.len(), 3);
    }
}

#[tokio::test]
async fn test_empty_results_are_not_errors() {
    let (_, service) = memory_service();
    for sort in [SortMode::Flat, SortMode::Tree, SortMode::ParentTree] {
        assert!(list(&service, sort, page(None, Some(3), false)).await.is_empty());
        assert!(list(&service, sort, page(Some(1), None, true)).await.is_empty());
    }
}

#[tokio::test]
async fn test_invalid_parent_rolls_back_batch() {
    let (_, service) = memory_service();
    forest(&service).await;
    let before = service.post_counters(FORUM).await.unwrap();

    let err = service
        .create_posts(
            THREAD,
            vec![
                NewPost::new("x", "fine").reply_to(1),
                NewPost::new("y", "orphan").reply_to(999),
                NewPost::new("z", "fine too"),
            ],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::ParentNotFound(999)));

    assert_eq!(service.post_counters(FORUM).await.unwrap(), before);
    assert_eq!(list(&service, SortMode::Flat, page(None, None, false)).await.len(), 9);
    assert!(matches!(service.post_details(10).await, Err(DomainError::PostNotFound(10))));
}

#[tokio::test]
async fn test_counters_track_created_posts() {
    let store = Arc::new(InMemoryForum::with_threads([
        thread(1, FORUM, THREAD),
        thread(2, "go", "goroutines"),
    ]));
    let service = integration_tests::service_over(store.clone(), store.clone());

    service
        .create_posts(THREAD, vec![NewPost::new("a", "1"), NewPost::new("b", "2")])
        .await
        .unwrap();
    service
        .create_posts("2", vec![NewPost::new("c", "3")])
        .await
        .unwrap();
    service.create_posts(THREAD, Vec::new()).await.unwrap();

    let rust = service.post_counters(FORUM).await.unwrap();
    let go = service.post_counters("go").await.unwrap();
    assert_eq!((rust.forum, rust.total), (2, 3));
    assert_eq!((go.forum, go.total), (1, 3));
}

#[tokio::test]
async fn test_unknown_thread() {
    let (_, service) = memory_service();
    let create = service.create_posts("nope", vec![NewPost::new("a", "b")]).await;
    assert!(matches!(create, Err(DomainError::ThreadNotFound(_))));

    let listed = service.list_posts("404", SortMode::Tree, page(None, None, false)).await;
    assert!(matches!(listed, Err(DomainError::ThreadNotFound(_))));
    assert_eq!(service.post_counters(FORUM).await.unwrap().total, 0);
}

#[tokio::test]
async fn test_concurrent_sibling_batches() {
    let (store, service) = memory_service();
    let service = Arc::new(service);
    let root = service
        .create_posts(THREAD, vec![NewPost::new("op", "root")])
        .await
        .unwrap()[0]
        .id;

    let mut tasks = Vec::new();
    for worker in 0..8 {
        let service = service.clone();
        tasks.push(tokio::spawn(async move {
            let batch = (0..5)
                .map(|n| NewPost::new(format!("w{worker}"), format!("reply {n}")).reply_to(root))
                .collect();
            service.create_posts(THREAD, batch).await.unwrap()
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let rows = service
        .list_posts(THREAD, SortMode::Tree, page(None, None, false))
        .await
        .unwrap();
    assert_eq!(rows.len(), 41);
    for post in rows.iter().skip(1) {
        assert_eq!(post.path.as_slice(), &[root, post.id]);
    }
    assert_eq!(store.post_counters(FORUM).await.unwrap().total, 41);
}

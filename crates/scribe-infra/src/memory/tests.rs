use std::sync::Arc;

use scribe_core::domain::PostStatus;
use scribe_core::error::RepoError;
use scribe_core::ports::{AuthError, BaseRepository, LikeRepository, PasswordService};
use scribe_core::query::{PostFilter, PostSort, SortField, TaxonomySort};
use scribe_core::services::{
    BlogSettings, CommentChanges, LikeToggle, NewCategory, NewComment, NewPost, NewTag, PostChanges,
    RegisterUser,
};
use scribe_core::{Actor, BlogService, DomainError};
use uuid::Uuid;

use super::InMemoryStore;

/// Stores passwords verbatim; keeps these tests independent of argon2 cost.
struct PlainPasswords;

impl PasswordService for PlainPasswords {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        Ok(hash == format!("plain:{password}"))
    }
}

fn service() -> (BlogService, InMemoryStore) {
    let store = InMemoryStore::new();
    let service = BlogService::new(
        store.repositories(),
        Arc::new(PlainPasswords),
        BlogSettings::default(),
    );
    (service, store)
}

async fn register(service: &BlogService, name: &str) -> Actor {
    let user = service
        .register_user(RegisterUser {
            email: format!("{name}@example.com"),
            username: name.to_string(),
            password: "correct-horse".into(),
            password_confirm: "correct-horse".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    Actor::User(user.id)
}

async fn post(service: &BlogService, actor: &Actor, title: &str, status: PostStatus) -> Uuid {
    service
        .create_post(
            actor,
            NewPost {
                title: title.into(),
                content: format!("{title} body"),
                status,
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .summary
        .post
        .id
}

#[tokio::test]
async fn test_toggle_like_twice_restores_count() {
    let (service, _) = service();
    let author = register(&service, "author").await;
    let reader = register(&service, "reader").await;
    let id = post(&service, &author, "Hello", PostStatus::Published).await;

    let liked = service.toggle_like(&reader, id).await.unwrap();
    assert!(matches!(liked, LikeToggle::Liked { likes_count: 1, .. }));

    let unliked = service.toggle_like(&reader, id).await.unwrap();
    assert!(matches!(unliked, LikeToggle::Unliked { likes_count: 0 }));

    let detail = service.retrieve_post(&reader, id).await.unwrap();
    assert_eq!(detail.summary.post.likes_count, 0);
    assert!(!detail.is_liked);
}

#[tokio::test]
async fn test_anonymous_like_is_rejected() {
    let (service, _) = service();
    let author = register(&service, "author").await;
    let id = post(&service, &author, "Hello", PostStatus::Published).await;

    let err = service.toggle_like(&Actor::Anonymous, id).await.unwrap_err();
    assert!(matches!(err, DomainError::Unauthorized));
}

#[tokio::test]
async fn test_duplicate_like_insert_conflicts_and_keeps_count() {
    let (service, store) = service();
    let author = register(&service, "author").await;
    let reader = register(&service, "reader").await;
    let id = post(&service, &author, "Hello", PostStatus::Published).await;
    let reader_id = reader.user_id().unwrap();

    let likes = store.likes();
    let (_, count) = likes
        .create(scribe_core::domain::Like::new(reader_id, id))
        .await
        .unwrap();
    assert_eq!(count, 1);

    let second = likes.create(scribe_core::domain::Like::new(reader_id, id)).await;
    assert!(matches!(second, Err(RepoError::Constraint(_))));

    let stored = store.posts().find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.likes_count, 1);
    assert_eq!(likes.count_all().await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_likes_from_many_users_all_count() {
    let (service, store) = service();
    let service = Arc::new(service);
    let author = register(&service, "author").await;
    let id = post(&service, &author, "Hello", PostStatus::Published).await;

    let mut readers = Vec::new();
    for i in 0..16 {
        readers.push(register(&service, &format!("reader{i}")).await);
    }

    let mut tasks = tokio::task::JoinSet::new();
    for reader in readers {
        let service = service.clone();
        tasks.spawn(async move { service.toggle_like(&reader, id).await });
    }
    while let Some(result) = tasks.join_next().await {
        assert!(matches!(result.unwrap(), Ok(LikeToggle::Liked { .. })));
    }

    let stored = store.posts().find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.likes_count, 16);
    assert_eq!(store.likes().count_all().await.unwrap(), 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_racing_first_likes_by_one_user_leave_one_row() {
    let (service, store) = service();
    let author = register(&service, "author").await;
    let reader = register(&service, "reader").await;
    let id = post(&service, &author, "Hello", PostStatus::Published).await;
    let reader_id = reader.user_id().unwrap();

    // Both inserts start from the not-liked state.
    let likes = store.likes();
    let (first, second) = tokio::join!(
        likes.create(scribe_core::domain::Like::new(reader_id, id)),
        likes.create(scribe_core::domain::Like::new(reader_id, id)),
    );
    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(RepoError::Constraint(_))))
    );

    let stored = store.posts().find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.likes_count, 1);
    assert_eq!(likes.count_all().await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_toggles_by_one_user_keep_count_exact() {
    let (service, store) = service();
    let author = register(&service, "author").await;
    let reader = register(&service, "reader").await;
    let id = post(&service, &author, "Hello", PostStatus::Published).await;

    let (first, second) = tokio::join!(
        service.toggle_like(&reader, id),
        service.toggle_like(&reader, id),
    );
    for outcome in [&first, &second] {
        assert!(matches!(
            outcome,
            Ok(_) | Err(DomainError::Conflict(_))
        ));
    }

    let rows = store.likes().count_all().await.unwrap();
    assert!(rows <= 1);
    let stored = store.posts().find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.likes_count, rows);
}

#[tokio::test]
async fn test_views_only_count_for_published_posts() {
    let (service, _) = service();
    let author = register(&service, "author").await;
    let draft = post(&service, &author, "Draft", PostStatus::Draft).await;
    let live = post(&service, &author, "Live", PostStatus::Published).await;

    for _ in 0..3 {
        service.retrieve_post(&Actor::Anonymous, draft).await.unwrap();
        service.retrieve_post(&Actor::Anonymous, live).await.unwrap();
    }

    let draft = service.retrieve_post(&author, draft).await.unwrap();
    assert_eq!(draft.summary.post.views_count, 0);
    let live = service.retrieve_post(&author, live).await.unwrap();
    assert_eq!(live.summary.post.views_count, 4);
}

#[tokio::test]
async fn test_created_published_post_is_stamped_at_creation() {
    let (service, _) = service();
    let author = register(&service, "author").await;
    let id = post(&service, &author, "Live", PostStatus::Published).await;
    let draft = post(&service, &author, "Later", PostStatus::Draft).await;

    let live = service.retrieve_post(&author, id).await.unwrap().summary.post;
    assert_eq!(live.published_at, Some(live.created_at));
    let draft = service.retrieve_post(&author, draft).await.unwrap().summary.post;
    assert_eq!(draft.published_at, None);
}

#[tokio::test]
async fn test_published_at_is_set_once() {
    let (service, _) = service();
    let author = register(&service, "author").await;
    let id = post(&service, &author, "Story", PostStatus::Draft).await;

    let publish = |status| PostChanges {
        status: Some(status),
        ..Default::default()
    };

    let first = service
        .update_post(&author, id, publish(PostStatus::Published))
        .await
        .unwrap();
    let stamped = first.summary.post.published_at;
    assert!(stamped.is_some());

    service
        .update_post(&author, id, publish(PostStatus::Archived))
        .await
        .unwrap();
    let again = service
        .update_post(&author, id, publish(PostStatus::Published))
        .await
        .unwrap();
    assert_eq!(again.summary.post.published_at, stamped);
}

#[tokio::test]
async fn test_update_keeps_counters_and_stamp_from_storage() {
    let (service, store) = service();
    let author = register(&service, "author").await;
    let reader = register(&service, "reader").await;
    let id = post(&service, &author, "Story", PostStatus::Published).await;
    service.toggle_like(&reader, id).await.unwrap();

    let posts = store.posts();
    let mut stale = posts.find_by_id(id).await.unwrap().unwrap();
    let stamp = stale.published_at;
    stale.likes_count = 99;
    stale.views_count = 99;
    stale.published_at = None;

    let saved = posts.update(stale).await.unwrap();
    assert_eq!(saved.likes_count, 1);
    assert_eq!(saved.views_count, 0);
    assert_eq!(saved.published_at, stamp);
}

#[tokio::test]
async fn test_listing_hides_foreign_drafts() {
    let (service, _) = service();
    let alice = register(&service, "alice").await;
    let bob = register(&service, "bob").await;
    post(&service, &alice, "Alice draft", PostStatus::Draft).await;
    post(&service, &alice, "Alice live", PostStatus::Published).await;
    post(&service, &bob, "Bob draft", PostStatus::Draft).await;

    let titles = |page: scribe_core::query::Page<scribe_core::services::PostSummary>| {
        let mut titles: Vec<String> = page.items.into_iter().map(|s| s.post.title).collect();
        titles.sort();
        titles
    };

    let anonymous = service
        .list_posts(&Actor::Anonymous, PostFilter::default(), PostSort::default(), 1)
        .await
        .unwrap();
    assert_eq!(titles(anonymous), vec!["Alice live"]);

    let as_bob = service
        .list_posts(&bob, PostFilter::default(), PostSort::default(), 1)
        .await
        .unwrap();
    assert_eq!(titles(as_bob), vec!["Alice live", "Bob draft"]);

    // Asking for drafts explicitly only narrows the visible set.
    let drafts = service
        .list_posts(
            &bob,
            PostFilter {
                status: Some(PostStatus::Draft),
                ..Default::default()
            },
            PostSort::default(),
            1,
        )
        .await
        .unwrap();
    assert_eq!(titles(drafts), vec!["Bob draft"]);
}

#[tokio::test]
async fn test_draft_retrievable_by_id_without_counting_view() {
    let (service, _) = service();
    let author = register(&service, "author").await;
    let stranger = register(&service, "stranger").await;
    let id = post(&service, &author, "Hidden", PostStatus::Draft).await;

    let detail = service.retrieve_post(&stranger, id).await.unwrap();
    assert_eq!(detail.summary.post.status, PostStatus::Draft);
    assert_eq!(detail.summary.post.views_count, 0);

    let listed = service
        .list_posts(&stranger, PostFilter::default(), PostSort::default(), 1)
        .await
        .unwrap();
    assert_eq!(listed.total, 0);
}

#[tokio::test]
async fn test_non_owner_edit_is_forbidden_and_changes_nothing() {
    let (service, _) = service();
    let author = register(&service, "author").await;
    let intruder = register(&service, "intruder").await;
    let id = post(&service, &author, "Original", PostStatus::Published).await;

    let err = service
        .update_post(
            &intruder,
            id,
            PostChanges {
                title: Some("Defaced".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden));

    let err = service.delete_post(&intruder, id).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden));

    let err = service
        .update_post(&Actor::Anonymous, id, PostChanges::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Unauthorized));

    let detail = service.retrieve_post(&author, id).await.unwrap();
    assert_eq!(detail.summary.post.title, "Original");
}

#[tokio::test]
async fn test_missing_post_reports_not_found_before_ownership() {
    let (service, _) = service();
    let someone = register(&service, "someone").await;

    let err = service
        .update_post(&someone, Uuid::new_v4(), PostChanges::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity_type: "Post", .. }));
}

#[tokio::test]
async fn test_comment_author_only_edit_and_reply_tree_delete() {
    let (service, store) = service();
    let author = register(&service, "author").await;
    let reader = register(&service, "reader").await;
    let id = post(&service, &author, "Discuss", PostStatus::Published).await;

    let root = service
        .create_comment(
            &reader,
            NewComment {
                post_id: id,
                content: "First".into(),
                parent_id: None,
            },
        )
        .await
        .unwrap();
    let reply = service
        .create_comment(
            &author,
            NewComment {
                post_id: id,
                content: "Thanks".into(),
                parent_id: Some(root.comment.id),
            },
        )
        .await
        .unwrap();
    assert!(reply.comment.is_reply());

    let root_view = service.get_comment(root.comment.id).await.unwrap();
    assert_eq!(root_view.replies_count, 1);

    let err = service
        .update_comment(
            &author,
            root.comment.id,
            CommentChanges {
                content: Some("Edited by someone else".into()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden));

    service.delete_comment(&reader, root.comment.id).await.unwrap();
    assert!(store.comments().find_by_id(reply.comment.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_reply_must_share_parent_post() {
    let (service, _) = service();
    let author = register(&service, "author").await;
    let first = post(&service, &author, "First", PostStatus::Published).await;
    let second = post(&service, &author, "Second", PostStatus::Published).await;

    let parent = service
        .create_comment(
            &author,
            NewComment {
                post_id: first,
                content: "Parent".into(),
                parent_id: None,
            },
        )
        .await
        .unwrap();

    let err = service
        .create_comment(
            &author,
            NewComment {
                post_id: second,
                content: "Stray".into(),
                parent_id: Some(parent.comment.id),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn test_moderation_hides_comment_from_counts() {
    let (service, _) = service();
    let author = register(&service, "author").await;
    let reader = register(&service, "reader").await;
    let id = post(&service, &author, "Moderated", PostStatus::Published).await;

    let comment = service
        .create_comment(
            &reader,
            NewComment {
                post_id: id,
                content: "Spam".into(),
                parent_id: None,
            },
        )
        .await
        .unwrap();

    let err = service
        .moderate_comment(&reader, comment.comment.id, false)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden));

    service
        .moderate_comment(&author, comment.comment.id, false)
        .await
        .unwrap();
    let detail = service.retrieve_post(&author, id).await.unwrap();
    assert_eq!(detail.summary.comments_count, 0);
    assert!(detail.comments.is_empty());
}

#[tokio::test]
async fn test_deleting_category_uncategorizes_posts() {
    let (service, _) = service();
    let author = register(&service, "author").await;
    let category = service
        .create_category(
            &author,
            NewCategory {
                name: "Systems".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(category.category.slug, "systems");

    let id = service
        .create_post(
            &author,
            NewPost {
                title: "Kernels".into(),
                content: "Body".into(),
                category_id: Some(category.category.id),
                status: PostStatus::Published,
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .summary
        .post
        .id;
    assert_eq!(
        service.get_category(category.category.id).await.unwrap().post_count,
        1
    );

    service
        .delete_category(&author, category.category.id)
        .await
        .unwrap();
    let detail = service.retrieve_post(&author, id).await.unwrap();
    assert!(detail.summary.post.category_id.is_none());
    assert!(detail.summary.category.is_none());
}

#[tokio::test]
async fn test_tag_filter_and_unknown_tag_rejection() {
    let (service, _) = service();
    let author = register(&service, "author").await;
    let rust = service
        .create_tag(
            &author,
            NewTag {
                name: "Rust".into(),
                slug: None,
            },
        )
        .await
        .unwrap();

    let tagged = service
        .create_post(
            &author,
            NewPost {
                title: "Borrowck".into(),
                content: "Lifetimes".into(),
                tag_ids: vec![rust.tag.id, rust.tag.id],
                status: PostStatus::Published,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(tagged.summary.tags.len(), 1);
    post(&service, &author, "Untagged", PostStatus::Published).await;

    let page = service.tag_posts(&Actor::Anonymous, rust.tag.id, 1).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].post.title, "Borrowck");

    let err = service
        .create_post(
            &author,
            NewPost {
                title: "Ghost".into(),
                content: "Body".into(),
                tag_ids: vec![Uuid::new_v4()],
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn test_tag_listing_searches_orders_and_pages() {
    let store = InMemoryStore::new();
    let service = BlogService::new(
        store.repositories(),
        Arc::new(PlainPasswords),
        BlogSettings {
            page_size: 2,
            ..Default::default()
        },
    );
    let author = register(&service, "author").await;

    let mut ids = Vec::new();
    for name in ["tokio", "async", "actix", "serde"] {
        let tag = service
            .create_tag(
                &author,
                NewTag {
                    name: name.into(),
                    slug: None,
                },
            )
            .await
            .unwrap();
        ids.push(tag.tag.id);
    }
    // serde on two published posts, tokio on one, a draft counts for nothing.
    for (title, tags, status) in [
        ("One", vec![ids[3], ids[0]], PostStatus::Published),
        ("Two", vec![ids[3]], PostStatus::Published),
        ("Three", vec![ids[1]], PostStatus::Draft),
    ] {
        service
            .create_post(
                &author,
                NewPost {
                    title: title.into(),
                    content: "body".into(),
                    tag_ids: tags,
                    status,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    let names = |page: &scribe_core::query::Page<scribe_core::services::TagView>| {
        page.items.iter().map(|v| v.tag.name.clone()).collect::<Vec<_>>()
    };

    let first = service.list_tags(None, TaxonomySort::default(), 1).await.unwrap();
    assert_eq!(first.total, 4);
    assert_eq!(names(&first), ["actix", "async"]);
    let second = service.list_tags(None, TaxonomySort::default(), 2).await.unwrap();
    assert_eq!(names(&second), ["serde", "tokio"]);

    let busiest: TaxonomySort = "-post_count".parse().unwrap();
    let ranked = service.list_tags(None, busiest, 1).await.unwrap();
    assert_eq!(names(&ranked), ["serde", "tokio"]);
    assert_eq!(ranked.items[0].post_count, 2);

    let found = service.list_tags(Some(" A "), TaxonomySort::default(), 1).await.unwrap();
    assert_eq!(found.total, 2);
    assert_eq!(names(&found), ["actix", "async"]);

    let blank = service.list_tags(Some("  "), TaxonomySort::default(), 1).await.unwrap();
    assert_eq!(blank.total, 4);
}

#[tokio::test]
async fn test_category_search_covers_description() {
    let (service, _) = service();
    let author = register(&service, "author").await;
    for (name, description) in [
        ("Systems", "Kernels and drivers"),
        ("Web", "Servers written in Rust"),
        ("Rust", ""),
    ] {
        service
            .create_category(
                &author,
                NewCategory {
                    name: name.into(),
                    slug: None,
                    description: description.into(),
                },
            )
            .await
            .unwrap();
    }

    let found = service
        .list_categories(Some("rust"), TaxonomySort::default(), 1)
        .await
        .unwrap();
    let names: Vec<_> = found.items.iter().map(|v| v.category.name.as_str()).collect();
    assert_eq!(names, ["Rust", "Web"]);

    let newest: TaxonomySort = "-created_at".parse().unwrap();
    let all = service.list_categories(None, newest, 1).await.unwrap();
    assert_eq!(all.total, 3);
    assert!(
        all.items
            .windows(2)
            .all(|w| w[0].category.created_at >= w[1].category.created_at)
    );
}

#[tokio::test]
async fn test_duplicate_slug_is_a_conflict() {
    let (service, _) = service();
    let author = register(&service, "author").await;
    post(&service, &author, "Same Title", PostStatus::Draft).await;

    let err = service
        .create_post(
            &author,
            NewPost {
                title: "Same Title".into(),
                content: "Other".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
}

#[tokio::test]
async fn test_popular_orders_by_views() {
    let (service, _) = service();
    let author = register(&service, "author").await;
    let quiet = post(&service, &author, "Quiet", PostStatus::Published).await;
    let loud = post(&service, &author, "Loud", PostStatus::Published).await;
    post(&service, &author, "Unpublished", PostStatus::Draft).await;

    for _ in 0..3 {
        service.retrieve_post(&Actor::Anonymous, loud).await.unwrap();
    }
    service.retrieve_post(&Actor::Anonymous, quiet).await.unwrap();

    let popular = service.popular_posts(&Actor::Anonymous).await.unwrap();
    let ids: Vec<Uuid> = popular.iter().map(|s| s.post.id).collect();
    assert_eq!(ids, vec![loud, quiet]);

    let sorted = service
        .list_posts(
            &Actor::Anonymous,
            PostFilter::default(),
            PostSort::asc(SortField::ViewsCount),
            1,
        )
        .await
        .unwrap();
    assert_eq!(sorted.items[0].post.id, quiet);
}

#[tokio::test]
async fn test_deleting_user_cascades_and_recounts_likes() {
    let (service, store) = service();
    let author = register(&service, "author").await;
    let fan = register(&service, "fan").await;
    let kept = post(&service, &author, "Kept", PostStatus::Published).await;
    let fan_post = post(&service, &fan, "Fan post", PostStatus::Published).await;

    service.toggle_like(&fan, kept).await.unwrap();
    service.toggle_like(&author, fan_post).await.unwrap();
    assert_eq!(
        store.posts().find_by_id(kept).await.unwrap().unwrap().likes_count,
        1
    );

    let fan_id = fan.user_id().unwrap();
    service.delete_user(&fan, fan_id).await.unwrap();

    assert!(store.posts().find_by_id(fan_post).await.unwrap().is_none());
    let kept = store.posts().find_by_id(kept).await.unwrap().unwrap();
    assert_eq!(kept.likes_count, 0);
    assert_eq!(store.likes().count_all().await.unwrap(), 0);
}

#[tokio::test]
async fn test_registration_and_login() {
    let (service, _) = service();
    register(&service, "writer").await;

    let err = service
        .register_user(RegisterUser {
            email: "writer@example.com".into(),
            username: "other".into(),
            password: "correct-horse".into(),
            password_confirm: "correct-horse".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    let err = service
        .register_user(RegisterUser {
            email: "new@example.com".into(),
            username: "new".into(),
            password: "correct-horse".into(),
            password_confirm: "battery-staple".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let user = service
        .authenticate("writer@example.com", "correct-horse")
        .await
        .unwrap();
    assert!(user.last_login.is_some());

    let err = service
        .authenticate("writer@example.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Unauthorized));
}

#[tokio::test]
async fn test_stats_aggregate_every_table() {
    let (service, _) = service();
    let author = register(&service, "author").await;
    let reader = register(&service, "reader").await;
    let live = post(&service, &author, "Live", PostStatus::Published).await;
    post(&service, &author, "Draft", PostStatus::Draft).await;

    service.retrieve_post(&reader, live).await.unwrap();
    service.toggle_like(&reader, live).await.unwrap();
    service
        .create_comment(
            &reader,
            NewComment {
                post_id: live,
                content: "Nice".into(),
                parent_id: None,
            },
        )
        .await
        .unwrap();

    let stats = service.get_stats().await.unwrap();
    assert_eq!(stats.posts.total_posts, 2);
    assert_eq!(stats.posts.published_posts, 1);
    assert_eq!(stats.posts.draft_posts, 1);
    assert_eq!(stats.posts.total_views, 1);
    assert_eq!(stats.total_likes, 1);
    assert_eq!(stats.total_comments, 1);
    assert_eq!(stats.users.total_users, 2);
}

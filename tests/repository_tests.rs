//! Topic and reply repositories over the standard fixture

mod forum_harness;

use agora::core::error::{EntityError, ForumError};
use agora::core::query::QueryParams;
use agora::repository::{ReplyRepository, TopicRepository};
use forum_harness::*;
use serde_json::json;

fn params(include: &str) -> QueryParams {
    QueryParams {
        include: Some(include.to_string()),
        ..QueryParams::default()
    }
}

#[tokio::test]
async fn test_favorites_feed_is_fully_composed() {
    let repository = TopicRepository::new(seeded_store(), small_page_config());
    let registry = topic_registry(&repository);

    let page = repository
        .favorite_topics(
            &registry,
            1,
            &params("node,last_reply_user,replies,replies.user"),
            &["id", "title"],
        )
        .await
        .unwrap();

    assert_eq!(page.total, 3);
    assert_eq!(page.page_size, 2);
    assert_eq!(page.items.len(), 2);
    assert_eq!(
        page.items[0],
        json!({ "id": 3, "title": "Lifetimes", "node": { "name": "Rust" }, "last_reply_user": null, "replies": [] })
    );
    assert_eq!(
        page.items[1],
        json!({
            "id": 2,
            "title": "Pinning",
            "node": { "name": "Async" },
            "last_reply_user": null,
            "replies": [{ "id": 13, "body": "Pin<Box<T>>", "user": { "name": "ana" } }]
        })
    );
}

#[tokio::test]
async fn test_favorites_second_page() {
    let repository = TopicRepository::new(seeded_store(), small_page_config());
    let registry = topic_registry(&repository);
    let params = QueryParams {
        page: 2,
        ..params("last_reply_user")
    };

    let page = repository
        .favorite_topics(&registry, 1, &params, &["id"])
        .await
        .unwrap();

    assert_eq!(page.page_number, 2);
    assert_eq!(page.items, vec![json!({ "id": 1, "last_reply_user": { "name": "cy" } })]);
    let meta = page.meta();
    assert!(meta.has_prev);
    assert!(!meta.has_next);
}

#[tokio::test]
async fn test_attention_topics() {
    let repository = TopicRepository::new(seeded_store(), small_page_config());
    let registry = topic_registry(&repository);

    let page = repository
        .attention_topics(&registry, 2, &params("user:columns(name)"), &["id"])
        .await
        .unwrap();

    assert_eq!(page.items, vec![json!({ "id": 1, "user": { "name": "ana" } })]);
}

#[tokio::test]
async fn test_by_node_listing_caps_embedded_replies() {
    let repository = TopicRepository::new(seeded_store(), small_page_config());
    let registry = topic_registry(&repository);

    let page = repository
        .by_node(&registry, 1, &params("replies:columns(id)"), &["id"])
        .await
        .unwrap();

    assert_eq!(page.total, 2);
    assert_eq!(page.items, vec![
        json!({ "id": 1, "replies": [{ "id": 10 }, { "id": 11 }] }),
        json!({ "id": 3, "replies": [] }),
    ]);
}

#[tokio::test]
async fn test_list_with_sort() {
    let repository = TopicRepository::new(seeded_store(), small_page_config());
    let registry = repository.registry();
    let params = QueryParams {
        sort: Some("title:desc".to_string()),
        limit: Some(3),
        ..QueryParams::default()
    };

    let page = repository.list(&registry, &params, &["title"]).await.unwrap();
    assert_eq!(page.items, vec![
        json!({ "title": "Pinning" }),
        json!({ "title": "Ownership" }),
        json!({ "title": "Lifetimes" }),
    ]);
}

#[tokio::test]
async fn test_show_unknown_topic() {
    let repository = TopicRepository::new(seeded_store(), small_page_config());
    let registry = repository.registry();

    let err = repository.show(&registry, 77, &[], &["id"]).await.unwrap_err();
    assert!(matches!(err, ForumError::Entity(EntityError::NotFound { id: 77, .. })));
    assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_topic_and_reply_votes_share_a_ledger() {
    let store = seeded_store();
    let topics = TopicRepository::new(store.clone(), small_page_config());
    let replies = ReplyRepository::with_ledger(topics.ledger().clone(), small_page_config());
    let registry = topics.registry();

    assert!(topics.vote_down(2, 1).await.unwrap());
    assert!(replies.vote_up(2, 10).await.unwrap());
    assert!(replies.vote_up(3, 10).await.unwrap());

    let topic = topics.show(&registry, 1, &[], &["vote_count"]).await.unwrap();
    assert_eq!(topic, json!({ "vote_count": 4 }));

    let reply_registry = replies.registry();
    let page = replies
        .index_by_topic(&reply_registry, 1, &QueryParams::default(), &["id", "vote_count"])
        .await
        .unwrap();
    assert_eq!(page.items[0], json!({ "id": 10, "vote_count": 2 }));
}

#[tokio::test]
async fn test_reply_index_by_user() {
    let repository = ReplyRepository::new(seeded_store(), small_page_config());
    let mut registry = repository.registry();
    repository.include_user(&mut registry, &["name"]).unwrap();

    let page = repository
        .index_by_user(&registry, 2, &params("user"), &["id", "body"])
        .await
        .unwrap();

    assert_eq!(page.total, 2);
    assert_eq!(page.items, vec![
        json!({ "id": 10, "body": "first!", "user": { "name": "bo" } }),
        json!({ "id": 12, "body": "agreed", "user": { "name": "bo" } }),
    ]);
}

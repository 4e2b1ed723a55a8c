//! Forum Feed Example
//!
//! Seeds an in-memory forum, then:
//! - composes a user's favorites feed with nested includes
//! - toggles votes on a topic and a reply
//! - prints every response as JSON
//!
//! Run with `RUST_LOG=agora=debug` to watch the loader batch its fetches.

use agora::prelude::*;
use agora::storage::FAVORITES;
use chrono::{Duration, Utc};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Arc::new(ForumConfig::from_yaml_str(
        r#"
        pagination:
          per_page: 3
        votes:
          lock_timeout_ms: 500
        "#,
    )?);

    let store = Arc::new(InMemoryForumStore::new());
    populate_test_data(&store)?;

    let topics = TopicRepository::new(store.clone(), config.clone());
    let replies = ReplyRepository::with_ledger(topics.ledger().clone(), config);

    // Request-scoped registry for the favorites feed
    let mut registry = topics.registry();
    topics.include_node(&mut registry, &["name"])?;
    topics.include_user(&mut registry, &["name", "avatar"])?;
    topics.include_last_reply_user(&mut registry, &["name"])?;
    topics.include_replies(&mut registry, &["id", "body"])?;
    topics.include_replies_user(&mut registry, &["name"])?;

    let params = QueryParams {
        include: Some("node,last_reply_user,replies:columns(id|vote_count),replies.user".to_string()),
        ..QueryParams::default()
    };

    println!("⭐ Favorites of user 1:");
    let feed = topics
        .favorite_topics(&registry, 1, &params, &["id", "title", "vote_count"])
        .await?;
    println!("{}", serde_json::to_string_pretty(&feed.into_response())?);

    println!("\n👍 Votes:");
    println!("  user 2 up-votes topic 1   -> active: {}", topics.vote_up(2, 1).await?);
    println!("  user 3 up-votes topic 1   -> active: {}", topics.vote_up(3, 1).await?);
    println!("  user 2 down-votes topic 1 -> active: {}", topics.vote_down(2, 1).await?);
    println!("  user 3 up-votes topic 1   -> active: {}", topics.vote_up(3, 1).await?);
    println!("  user 1 up-votes reply 12  -> active: {}", replies.vote_up(1, 12).await?);

    let topic = topics
        .show(&registry, 1, &IncludeRequest::parse_list("user"), &["id", "title", "vote_count"])
        .await?;
    println!("\n📄 Topic 1 after voting:");
    println!("{}", serde_json::to_string_pretty(&topic)?);

    let mut reply_registry = replies.registry();
    replies.include_user(&mut reply_registry, &["name"])?;
    let thread = replies
        .index_by_topic(
            &reply_registry,
            1,
            &QueryParams {
                include: Some("user".to_string()),
                ..QueryParams::default()
            },
            &["id", "vote_count"],
        )
        .await?;
    println!("\n💬 Replies of topic 1:");
    println!("{}", serde_json::to_string_pretty(&thread.into_response())?);

    Ok(())
}

fn populate_test_data(store: &InMemoryForumStore) -> Result<()> {
    store.insert(&User::new(1, "ana").with_avatar("https://example.com/ana.png"))?;
    store.insert(&User::new(2, "bo"))?;
    store.insert(&User::new(3, "cy"))?;

    store.insert(&Node::new(1, "Rust"))?;
    store.insert(&Node::new(2, "Async").with_parent(1))?;

    let mut ownership = Topic::new(1, 1, 1, "Ownership in practice", "Borrowing rules explained");
    ownership.last_reply_user_id = Some(3);
    store.insert(&ownership)?;
    store.insert(&Topic::new(2, 2, 2, "Pinning", "Why futures need Pin"))?;
    store.insert(&Topic::new(3, 3, 1, "Lifetimes", "Elision by example"))?;

    for (id, topic_id, user_id, body) in [
        (10, 1, 2, "Great write-up"),
        (11, 1, 3, "What about interior mutability?"),
        (12, 1, 2, "RefCell covers that"),
        (13, 1, 3, "Thanks!"),
        (14, 2, 1, "Pin<Box<T>> is the easy path"),
    ] {
        store.insert(&Reply::new(id, topic_id, user_id, body))?;
    }

    let now = Utc::now();
    store.add_reference(FAVORITES, 1, 3, now - Duration::hours(3))?;
    store.add_reference(FAVORITES, 1, 1, now - Duration::hours(1))?;
    store.add_reference(FAVORITES, 1, 2, now - Duration::hours(2))?;
    // topic 99 was deleted after being favorited
    store.add_reference(FAVORITES, 1, 99, now - Duration::minutes(5))?;

    Ok(())
}

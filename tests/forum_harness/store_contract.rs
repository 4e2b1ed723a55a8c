//! Macro-generated contract suite for forum stores
//!
//! `forum_store_tests!` checks any store implementing `ForumStore` against
//! the behaviour the loader, the merge and the vote ledger rely on.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod forum_harness;
//!
//! use forum_harness::*;
//!
//! forum_store_tests!(seeded_store());
//! ```
//!
//! # Generated Tests
//!
//! - `test_fetch_one`: existing and missing rows
//! - `test_fetch_primary_pages`: page slicing keeps the full total
//! - `test_fetch_primary_filters`: exact-match filter and sort
//! - `test_fetch_by_keys_skips_missing`: unknown keys are absent, not errors
//! - `test_fetch_by_owners_respects_limit`: per-owner limit, natural order
//! - `test_reference_page_newest_first`: join rows ordered by creation time
//! - `test_commit_moves_counter`: vote row and counter change together
//! - `test_commit_stale_expected_vote`: a stale expected vote writes nothing
//! - `test_commit_missing_subject`: nothing written for an unknown subject
//! - `test_concurrent_ledger_tally`: ledger over the store keeps a true tally

/// Generate the contract suite.
///
/// `$factory` must evaluate to an `Arc` of a store holding the standard
/// fixture; it is re-evaluated for each test.
#[allow(unused_macros)]
macro_rules! forum_store_tests {
    ($factory:expr) => {
        mod forum_store_contract_tests {
            use super::*;
            use agora::config::VoteConfig;
            use agora::core::query::ListQuery;
            use agora::core::service::{EntityFetcher, ReferenceSource, VoteStore};
            use agora::core::vote::{SubjectRef, VoteDirection, VoteKey};
            use agora::votes::VoteLedger;
            use serde_json::json;

            #[tokio::test]
            async fn test_fetch_one() {
                let store = $factory;

                let topic = store.fetch_one("topics", 1).await.unwrap().unwrap();
                assert_eq!(topic.field("title"), Some(&json!("Ownership")));
                assert!(store.fetch_one("topics", 404).await.unwrap().is_none());
                assert!(store.fetch_one("no_such_table", 1).await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_fetch_primary_pages() {
                let store = $factory;

                let page = store
                    .fetch_primary("replies", &ListQuery::new(2, 3))
                    .await
                    .unwrap();
                assert_eq!(page.total, 4);
                assert_eq!(page.page_number, 2);
                assert_eq!(ids(&page.items), vec![13]);
            }

            #[tokio::test]
            async fn test_fetch_primary_filters() {
                let store = $factory;
                let query = ListQuery::new(1, 10)
                    .with_filter("user_id", json!(1))
                    .with_sort("title:asc");

                let page = store.fetch_primary("topics", &query).await.unwrap();
                assert_eq!(page.total, 2);
                assert_eq!(ids(&page.items), vec![3, 1]);
            }

            #[tokio::test]
            async fn test_fetch_by_keys_skips_missing() {
                let store = $factory;

                let mut found = ids(&store.fetch_by_keys("users", &[3, 99, 1]).await.unwrap());
                found.sort();
                assert_eq!(found, vec![1, 3]);
            }

            #[tokio::test]
            async fn test_fetch_by_owners_respects_limit() {
                let store = $factory;

                let rows = store
                    .fetch_by_owners("replies", "topic_id", &[1, 2], Some(2))
                    .await
                    .unwrap();
                assert_eq!(ids(&rows), vec![10, 11, 13]);
            }

            #[tokio::test]
            async fn test_reference_page_newest_first() {
                let store = $factory;

                let page = store.reference_page("favorites", 1, 1, 2).await.unwrap();
                assert_eq!(page.items, vec![3, 2]);
                assert_eq!(page.total, 3);

                let page = store.reference_page("favorites", 1, 2, 2).await.unwrap();
                assert_eq!(page.items, vec![1]);

                let page = store.reference_page("favorites", 2, 1, 2).await.unwrap();
                assert!(page.is_empty());
            }

            #[tokio::test]
            async fn test_commit_moves_counter() {
                let store = $factory;
                let key = VoteKey::new(2, SubjectRef::topic(1));

                assert_eq!(store.commit(&key, None, Some(VoteDirection::Down), -1).await.unwrap(), 4);
                assert_eq!(store.current_vote(&key).await.unwrap(), Some(VoteDirection::Down));
                assert_eq!(store.vote_count(&SubjectRef::topic(1)).await.unwrap(), 4);

                assert_eq!(
                    store.commit(&key, Some(VoteDirection::Down), Some(VoteDirection::Up), 2).await.unwrap(),
                    6
                );
                assert_eq!(store.current_vote(&key).await.unwrap(), Some(VoteDirection::Up));
            }

            #[tokio::test]
            async fn test_commit_stale_expected_vote() {
                let store = $factory;
                let key = VoteKey::new(2, SubjectRef::topic(1));
                store.commit(&key, None, Some(VoteDirection::Up), 1).await.unwrap();

                assert!(store.commit(&key, None, Some(VoteDirection::Up), 1).await.is_err());
                assert!(store.commit(&key, Some(VoteDirection::Down), None, 1).await.is_err());
                assert_eq!(store.vote_count(&SubjectRef::topic(1)).await.unwrap(), 6);
                assert_eq!(store.current_vote(&key).await.unwrap(), Some(VoteDirection::Up));
            }

            #[tokio::test]
            async fn test_commit_missing_subject() {
                let store = $factory;
                let key = VoteKey::new(2, SubjectRef::reply(404));

                assert!(store.commit(&key, None, Some(VoteDirection::Up), 1).await.is_err());
                assert_eq!(store.current_vote(&key).await.unwrap(), None);
            }

            #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
            async fn test_concurrent_ledger_tally() {
                let store = $factory;
                let ledger = VoteLedger::new(store.clone(), &VoteConfig::default());
                let reply = SubjectRef::reply(10);

                // voters 1..=3 each cast up 3 times, voter 4 casts down twice
                let mut handles = Vec::new();
                for (voter, direction, casts) in [
                    (1, VoteDirection::Up, 3),
                    (2, VoteDirection::Up, 3),
                    (3, VoteDirection::Up, 3),
                    (4, VoteDirection::Down, 2),
                ] {
                    for _ in 0..casts {
                        let ledger = ledger.clone();
                        handles.push(tokio::spawn(async move {
                            ledger.cast(voter, reply, direction).await
                        }));
                    }
                }
                for handle in handles {
                    handle.await.unwrap().unwrap();
                }

                assert_eq!(store.vote_count(&reply).await.unwrap(), 3);
                let key = VoteKey::new(4, reply);
                assert_eq!(store.current_vote(&key).await.unwrap(), None);
            }
        }
    };
}

//! Serialized vote casting
//!
//! Every cast for one (voter, subject) pair runs under a per-pair async lock,
//! so the read-transition-commit sequence never interleaves with another cast
//! on the same pair through this ledger. Casts on different pairs run
//! concurrently. The store re-checks the vote the transition was computed
//! from, so ledgers that do not share a lock table still cannot double count.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::VoteConfig;
use crate::core::entity::EntityId;
use crate::core::error::{ForumResult, StorageError, VoteError};
use crate::core::service::VoteStore;
use crate::core::vote::{SubjectRef, VoteDirection, VoteKey, VoteOutcome, VoteState};

type Slot = Arc<tokio::sync::Mutex<()>>;

/// Applies up/down casts through a [`VoteStore`]
///
/// Cloning is cheap and clones share their lock table, so one ledger can be
/// handed to every request that casts votes.
pub struct VoteLedger<S: VoteStore + ?Sized> {
    store: Arc<S>,
    locks: Arc<Mutex<HashMap<VoteKey, Slot>>>,
    lock_timeout: Duration,
}

impl<S: VoteStore + ?Sized> Clone for VoteLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            locks: self.locks.clone(),
            lock_timeout: self.lock_timeout,
        }
    }
}

impl<S: VoteStore + ?Sized> VoteLedger<S> {
    pub fn new(store: Arc<S>, config: &VoteConfig) -> Self {
        Self::with_lock_timeout(store, config.lock_timeout())
    }

    pub fn with_lock_timeout(store: Arc<S>, lock_timeout: Duration) -> Self {
        Self {
            store,
            locks: Arc::new(Mutex::new(HashMap::new())),
            lock_timeout,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Cast an up vote; true if the voter now holds an up vote
    pub async fn cast_up(&self, voter_id: EntityId, subject: SubjectRef) -> ForumResult<bool> {
        let outcome = self.cast(voter_id, subject, VoteDirection::Up).await?;
        Ok(outcome.is_active(VoteDirection::Up))
    }

    /// Cast a down vote; true if the voter now holds a down vote
    pub async fn cast_down(&self, voter_id: EntityId, subject: SubjectRef) -> ForumResult<bool> {
        let outcome = self.cast(voter_id, subject, VoteDirection::Down).await?;
        Ok(outcome.is_active(VoteDirection::Down))
    }

    /// Cast a vote and report the transition that was applied
    ///
    /// Casting the direction already held retracts the vote; casting the
    /// opposite direction flips it. If another cast on the same pair holds
    /// the lock past the configured timeout, or commits first from outside
    /// this ledger, nothing is written and a retryable [`VoteError::Conflict`]
    /// is returned.
    pub async fn cast(
        &self,
        voter_id: EntityId,
        subject: SubjectRef,
        direction: VoteDirection,
    ) -> ForumResult<VoteOutcome> {
        let key = VoteKey::new(voter_id, subject);
        let lease = self.lease(key)?;

        match tokio::time::timeout(self.lock_timeout, lease.slot.lock()).await {
            Ok(_guard) => self.apply(&key, direction).await,
            Err(_) => {
                tracing::warn!(
                    voter_id,
                    subject_type = %subject.subject_type,
                    subject_id = subject.subject_id,
                    timeout_ms = self.lock_timeout.as_millis() as u64,
                    "vote lock not acquired in time"
                );
                Err(VoteError::Conflict {
                    voter_id,
                    subject_type: subject.subject_type,
                    subject_id: subject.subject_id,
                }
                .into())
            }
        }
    }

    /// Current state of a voter on a subject
    pub async fn state(&self, voter_id: EntityId, subject: SubjectRef) -> ForumResult<VoteState> {
        let key = VoteKey::new(voter_id, subject);
        Ok(VoteState::from(self.store.current_vote(&key).await?))
    }

    /// Number of (voter, subject) pairs with a cast in flight
    pub fn pending_locks(&self) -> usize {
        self.locks.lock().map(|table| table.len()).unwrap_or(0)
    }

    async fn apply(&self, key: &VoteKey, direction: VoteDirection) -> ForumResult<VoteOutcome> {
        let previous = VoteState::from(self.store.current_vote(key).await?);
        let transition = previous.transition(direction);
        let vote_count = self
            .store
            .commit(key, previous.direction(), transition.to.direction(), transition.delta)
            .await?;

        tracing::debug!(
            voter_id = key.voter_id,
            subject_type = %key.subject.subject_type,
            subject_id = key.subject.subject_id,
            from = ?previous,
            to = ?transition.to,
            delta = transition.delta,
            vote_count,
            "vote cast"
        );

        Ok(VoteOutcome {
            previous,
            current: transition.to,
            delta: transition.delta,
            vote_count,
        })
    }

    fn lease(&self, key: VoteKey) -> ForumResult<SlotLease<'_>> {
        let mut table = self.locks.lock().map_err(|e| StorageError::LockPoisoned {
            kind: "vote lock table".to_string(),
            message: e.to_string(),
        })?;

        let slot = table.entry(key).or_default().clone();
        Ok(SlotLease {
            locks: &self.locks,
            key,
            slot,
        })
    }
}

/// A cast's claim on its pair's slot, released even if the cast is dropped
/// while waiting
struct SlotLease<'a> {
    locks: &'a Mutex<HashMap<VoteKey, Slot>>,
    key: VoteKey,
    slot: Slot,
}

impl Drop for SlotLease<'_> {
    // Remove the slot once only the table and this lease reference it
    fn drop(&mut self) {
        if let Ok(mut table) = self.locks.lock() {
            let idle = table
                .get(&self.key)
                .is_some_and(|slot| Arc::ptr_eq(slot, &self.slot) && Arc::strong_count(slot) == 2);
            if idle {
                table.remove(&self.key);
            }
        }
    }
}

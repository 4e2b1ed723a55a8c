//! Vote state machine
//!
//! Every (voter, subject) pair is in one of three states. Casting the same
//! direction twice clears the vote; casting the opposite direction switches
//! it. [`VoteState::transition`] is the single source of counter deltas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::core::entity::EntityId;

/// Kind of entity a vote applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    Topic,
    Reply,
}

impl SubjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectType::Topic => "topic",
            SubjectType::Reply => "reply",
        }
    }

    /// Resource type holding the subject's `vote_count`
    pub fn resource_type(&self) -> &'static str {
        match self {
            SubjectType::Topic => "topics",
            SubjectType::Reply => "replies",
        }
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The entity a vote applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectRef {
    pub subject_type: SubjectType,
    pub subject_id: EntityId,
}

impl SubjectRef {
    pub fn topic(id: EntityId) -> Self {
        Self {
            subject_type: SubjectType::Topic,
            subject_id: id,
        }
    }

    pub fn reply(id: EntityId) -> Self {
        Self {
            subject_type: SubjectType::Reply,
            subject_id: id,
        }
    }
}

/// Identifies the one live vote a voter may hold on a subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoteKey {
    pub voter_id: EntityId,
    pub subject: SubjectRef,
}

impl VoteKey {
    pub fn new(voter_id: EntityId, subject: SubjectRef) -> Self {
        Self { voter_id, subject }
    }
}

/// Direction of a cast vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

/// Vote state of one (voter, subject) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteState {
    None,
    Up,
    Down,
}

/// Result of applying a cast to a state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: VoteState,
    pub to: VoteState,
    /// Change to apply to the subject's `vote_count`
    pub delta: i64,
}

impl VoteState {
    /// Apply a cast in `direction`
    ///
    /// | from | cast | to   | delta |
    /// |------|------|------|-------|
    /// | none | up   | up   | +1    |
    /// | none | down | down | -1    |
    /// | up   | up   | none | -1    |
    /// | up   | down | down | -2    |
    /// | down | down | none | +1    |
    /// | down | up   | up   | +2    |
    pub const fn transition(self, direction: VoteDirection) -> Transition {
        let (to, delta) = match (self, direction) {
            (VoteState::None, VoteDirection::Up) => (VoteState::Up, 1),
            (VoteState::None, VoteDirection::Down) => (VoteState::Down, -1),
            (VoteState::Up, VoteDirection::Up) => (VoteState::None, -1),
            (VoteState::Up, VoteDirection::Down) => (VoteState::Down, -2),
            (VoteState::Down, VoteDirection::Down) => (VoteState::None, 1),
            (VoteState::Down, VoteDirection::Up) => (VoteState::Up, 2),
        };

        Transition {
            from: self,
            to,
            delta,
        }
    }

    /// Contribution of this state to the subject's `vote_count`
    pub const fn weight(self) -> i64 {
        match self {
            VoteState::None => 0,
            VoteState::Up => 1,
            VoteState::Down => -1,
        }
    }

    /// Direction of the live vote, if any
    pub const fn direction(self) -> Option<VoteDirection> {
        match self {
            VoteState::None => None,
            VoteState::Up => Some(VoteDirection::Up),
            VoteState::Down => Some(VoteDirection::Down),
        }
    }
}

impl From<Option<VoteDirection>> for VoteState {
    fn from(direction: Option<VoteDirection>) -> Self {
        match direction {
            None => VoteState::None,
            Some(VoteDirection::Up) => VoteState::Up,
            Some(VoteDirection::Down) => VoteState::Down,
        }
    }
}

/// A stored vote row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub id: Uuid,
    pub voter_id: EntityId,
    pub subject: SubjectRef,
    pub direction: VoteDirection,
    pub created_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(key: VoteKey, direction: VoteDirection) -> Self {
        Self {
            id: Uuid::new_v4(),
            voter_id: key.voter_id,
            subject: key.subject,
            direction,
            created_at: Utc::now(),
        }
    }

    pub fn key(&self) -> VoteKey {
        VoteKey::new(self.voter_id, self.subject)
    }
}

/// What a cast did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteOutcome {
    pub previous: VoteState,
    pub current: VoteState,
    pub delta: i64,
    /// Subject's `vote_count` after the cast
    pub vote_count: i64,
}

impl VoteOutcome {
    /// Whether the voter now holds a live vote in `direction`
    pub fn is_active(&self, direction: VoteDirection) -> bool {
        self.current.direction() == Some(direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATES: [VoteState; 3] = [VoteState::None, VoteState::Up, VoteState::Down];
    const DIRECTIONS: [VoteDirection; 2] = [VoteDirection::Up, VoteDirection::Down];

    #[test]
    fn test_transition_table() {
        let cases = [
            (VoteState::None, VoteDirection::Up, VoteState::Up, 1),
            (VoteState::None, VoteDirection::Down, VoteState::Down, -1),
            (VoteState::Up, VoteDirection::Up, VoteState::None, -1),
            (VoteState::Up, VoteDirection::Down, VoteState::Down, -2),
            (VoteState::Down, VoteDirection::Down, VoteState::None, 1),
            (VoteState::Down, VoteDirection::Up, VoteState::Up, 2),
        ];

        for (from, direction, to, delta) in cases {
            let transition = from.transition(direction);
            assert_eq!(transition.to, to, "{:?} + {:?}", from, direction);
            assert_eq!(transition.delta, delta, "{:?} + {:?}", from, direction);
        }
    }

    #[test]
    fn test_delta_matches_weights() {
        for from in STATES {
            for direction in DIRECTIONS {
                let transition = from.transition(direction);
                assert_eq!(transition.delta, transition.to.weight() - from.weight());
            }
        }
    }

    #[test]
    fn test_same_direction_twice_is_neutral() {
        for direction in DIRECTIONS {
            let first = VoteState::None.transition(direction);
            let second = first.to.transition(direction);
            assert_eq!(second.to, VoteState::None);
            assert_eq!(first.delta + second.delta, 0);
        }
    }

    #[test]
    fn test_state_direction_round_trip() {
        for state in STATES {
            assert_eq!(VoteState::from(state.direction()), state);
        }
    }

    #[test]
    fn test_outcome_is_active() {
        let outcome = VoteOutcome {
            previous: VoteState::Up,
            current: VoteState::None,
            delta: -1,
            vote_count: 4,
        };
        assert!(!outcome.is_active(VoteDirection::Up));
        assert!(!outcome.is_active(VoteDirection::Down));
    }

    #[test]
    fn test_subject_type_serialization() {
        assert_eq!(
            serde_json::to_value(SubjectType::Reply).unwrap(),
            serde_json::json!("reply")
        );
        assert_eq!(SubjectType::Topic.resource_type(), "topics");
    }
}

use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use super::UserId;

/// Canonical key of an unordered user pair: `low` is always the smaller ID.
///
/// Every friendship row is stored under this key, so `{A, B}` and `{B, A}`
/// can never be two separate rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PairKey {
    low: UserId,
    high: UserId,
}

impl PairKey {
    pub fn new(a: UserId, b: UserId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn low(&self) -> UserId {
        self.low
    }

    pub fn high(&self) -> UserId {
        self.high
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.low == user || self.high == user
    }

    /// The member of the pair that is not `user`
    pub fn other(&self, user: UserId) -> Option<UserId> {
        if self.low == user {
            Some(self.high)
        } else if self.high == user {
            Some(self.low)
        } else {
            None
        }
    }
}

impl Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.low, self.high)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Confirmed,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::Confirmed => "confirmed",
        }
    }
}

impl Display for FriendshipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FriendshipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FriendshipStatus::Pending),
            "confirmed" => Ok(FriendshipStatus::Confirmed),
            other => Err(format!("unknown friendship status '{}'", other)),
        }
    }
}

/// One ledger row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FriendshipRecord {
    pub pair: PairKey,
    /// User whose action created or last transitioned the row
    pub initiator: UserId,
    pub status: FriendshipStatus,
}

impl FriendshipRecord {
    pub fn pending(requester: UserId, target: UserId) -> Self {
        Self {
            pair: PairKey::new(requester, target),
            initiator: requester,
            status: FriendshipStatus::Pending,
        }
    }
}

/// State of a pair in the friendship state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FriendshipState {
    None,
    Pending { initiator: UserId },
    Confirmed,
}

/// Storage action required by a friend request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// No row yet: insert a pending one
    Create,
    /// The counter-party answered a pending request
    Confirm,
    /// Repeat request or already confirmed
    Unchanged,
}

impl FriendshipState {
    /// Decides what a friend request from `requester` does to this pair
    pub fn on_request(&self, requester: UserId) -> Transition {
        match *self {
            FriendshipState::None => Transition::Create,
            FriendshipState::Pending { initiator } if initiator != requester => {
                Transition::Confirm
            }
            FriendshipState::Pending { .. } | FriendshipState::Confirmed => Transition::Unchanged,
        }
    }
}

impl From<Option<FriendshipRecord>> for FriendshipState {
    fn from(record: Option<FriendshipRecord>) -> Self {
        match record {
            None => FriendshipState::None,
            Some(FriendshipRecord {
                status: FriendshipStatus::Pending,
                initiator,
                ..
            }) => FriendshipState::Pending { initiator },
            Some(FriendshipRecord {
                status: FriendshipStatus::Confirmed,
                ..
            }) => FriendshipState::Confirmed,
        }
    }
}

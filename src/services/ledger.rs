use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use crate::{
    db::Storage,
    error::{AppError, AppResult},
    models::{FriendshipRecord, FriendshipState, PairKey, Transition, User, UserId},
};

/// Attempts per ledger mutation: the first try plus one retry
const MAX_ATTEMPTS: u32 = 2;

/// Friendship state machine over canonical user pairs
#[derive(Clone)]
pub struct FriendshipLedger {
    storage: Arc<dyn Storage>,
}

impl FriendshipLedger {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Records a friend request from `requester` to `target`.
    ///
    /// The first request leaves the pair pending, the counter-party's request
    /// confirms it, and anything else is a no-op. Fails with `NotFound` if
    /// either user is unknown, before anything is written.
    pub async fn add_friend(&self, requester: UserId, target: UserId) -> AppResult<()> {
        if requester == target {
            return Err(AppError::InvalidInput(
                "Users cannot befriend themselves".to_string(),
            ));
        }
        self.storage.get_user(requester).await?;
        self.storage.get_user(target).await?;

        let pair = PairKey::new(requester, target);
        let transition =
            with_retry("add_friend", pair, move || self.apply_request(pair, requester)).await?;

        tracing::info!(
            requester_id = %requester,
            target_id = %target,
            transition = ?transition,
            "Friend request processed"
        );

        Ok(())
    }

    /// Reads the pair, decides the transition and writes it
    async fn apply_request(&self, pair: PairKey, requester: UserId) -> AppResult<Transition> {
        let state = FriendshipState::from(self.storage.get_friendship(pair).await?);
        let transition = state.on_request(requester);

        match transition {
            Transition::Create => {
                let target = pair.other(requester).ok_or_else(|| {
                    AppError::Internal(format!("User {} is not part of pair {}", requester, pair))
                })?;
                self.storage
                    .insert_friendship(FriendshipRecord::pending(requester, target))
                    .await?;
            }
            Transition::Confirm => {
                if !self.storage.confirm_friendship(pair, requester).await? {
                    return Err(AppError::Conflict(format!(
                        "Friendship {} changed during confirmation",
                        pair
                    )));
                }
            }
            Transition::Unchanged => {}
        }

        Ok(transition)
    }

    /// Removes any friendship between the two users, whatever its status
    pub async fn delete_friend(&self, user: UserId, other: UserId) -> AppResult<()> {
        let pair = PairKey::new(user, other);
        let removed =
            with_retry("delete_friend", pair, move || self.storage.delete_friendship(pair)).await?;

        tracing::info!(user_id = %user, other_id = %other, removed, "Friendship removed");

        Ok(())
    }

    /// Current state of the pair
    pub async fn friendship_status(
        &self,
        user: UserId,
        other: UserId,
    ) -> AppResult<FriendshipState> {
        let record = self
            .storage
            .get_friendship(PairKey::new(user, other))
            .await?;
        Ok(FriendshipState::from(record))
    }

    /// Users on the other side of every pending or confirmed row touching `user`
    pub async fn list_friends(&self, user: UserId) -> AppResult<Vec<User>> {
        let touching = self.storage.list_friendships_touching(user).await?;

        let mut friends = Vec::with_capacity(touching.len());
        for (other, _status) in touching {
            friends.push(self.storage.get_user(other).await?);
        }

        tracing::debug!(user_id = %user, count = friends.len(), "Listed friends");

        Ok(friends)
    }

    /// Friends shared by both users, in the order of `user`'s friend list
    pub async fn common_friends(&self, user: UserId, other: UserId) -> AppResult<Vec<User>> {
        let theirs: HashSet<UserId> = self
            .storage
            .list_friendships_touching(other)
            .await?
            .into_iter()
            .map(|(id, _)| id)
            .collect();

        let common: Vec<User> = self
            .list_friends(user)
            .await?
            .into_iter()
            .filter(|friend| theirs.contains(&friend.id))
            .collect();

        Ok(common)
    }
}

/// Runs a ledger mutation, retrying once when storage reports a transient failure
async fn with_retry<T, F, Fut>(operation: &str, pair: PairKey, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(e) if e.is_transient() && attempt < MAX_ATTEMPTS => {
                tracing::warn!(
                    operation,
                    pair = %pair,
                    attempt,
                    error = %e,
                    "Ledger mutation failed, retrying"
                );
                attempt += 1;
            }
            result => return result,
        }
    }
}

use std::collections::HashSet;

use crate::{
    error::AppResult,
    models::{Film, FilmId, UserId},
    services::affinity::{AffinityIndex, AffinitySnapshot},
};

/// The peer whose likes overlap most with the target user's
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor<'a> {
    pub user: UserId,
    /// Number of films both users like
    pub shared: usize,
    /// Films the neighbor likes that the target does not, in the neighbor's order
    pub disjoint: Vec<&'a Film>,
}

/// Picks the nearest neighbor of `user` in `snapshot`.
///
/// Overlap is the count of commonly liked films. The first user in snapshot
/// order with the strictly greatest overlap wins, and `user` itself is never
/// considered. Returns `None` when nobody shares a single film with `user`.
pub fn select_neighbor(snapshot: &AffinitySnapshot, user: UserId) -> Option<Neighbor<'_>> {
    let mine: HashSet<FilmId> = snapshot.get(user).iter().map(|f| f.id).collect();
    if mine.is_empty() {
        return None;
    }

    let mut best: Option<(UserId, usize, &[Film])> = None;
    for (other, films) in snapshot.iter().filter(|(other, _)| *other != user) {
        let shared = films.iter().filter(|f| mine.contains(&f.id)).count();
        let best_shared = best.map(|(_, n, _)| n).unwrap_or(0);
        if shared > best_shared {
            best = Some((other, shared, films));
        }
    }

    best.map(|(other, shared, films)| Neighbor {
        user: other,
        shared,
        disjoint: films.iter().filter(|f| !mine.contains(&f.id)).collect(),
    })
}

/// One-nearest-neighbor collaborative filter over likes
#[derive(Clone)]
pub struct RecommendationEngine {
    index: AffinityIndex,
}

impl RecommendationEngine {
    pub fn new(index: AffinityIndex) -> Self {
        Self { index }
    }

    /// Films the user's nearest neighbor likes and the user has not liked yet
    ///
    /// Rebuilds the affinity snapshot on every call. Empty when the user has no
    /// likes, has no overlapping peer, or the neighbor offers nothing new.
    pub async fn recommend(&self, user: UserId) -> AppResult<Vec<Film>> {
        let snapshot = self.index.snapshot().await?;

        let films = match select_neighbor(&snapshot, user) {
            Some(neighbor) => {
                tracing::debug!(
                    user_id = %user,
                    neighbor_id = %neighbor.user,
                    shared = neighbor.shared,
                    candidates = neighbor.disjoint.len(),
                    "Selected neighbor"
                );
                neighbor.disjoint.into_iter().cloned().collect()
            }
            None => {
                tracing::debug!(user_id = %user, "No overlapping neighbor");
                Vec::new()
            }
        };

        tracing::info!(user_id = %user, count = films.len(), "Recommendations computed");

        Ok(films)
    }
}

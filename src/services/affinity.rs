use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    db::Storage,
    error::{AppError, AppResult},
    models::{Film, FilmId, UserId},
};

/// Liked films per user, built for a single request and then dropped.
///
/// Users appear in the order storage enumerates them. Each user's films keep
/// the order the likes were recorded in, with repeats removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AffinitySnapshot {
    entries: Vec<(UserId, Vec<Film>)>,
}

impl AffinitySnapshot {
    pub fn from_entries(entries: impl IntoIterator<Item = (UserId, Vec<Film>)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(user, films)| {
                let mut seen = HashSet::new();
                let films = films.into_iter().filter(|f| seen.insert(f.id)).collect();
                (user, films)
            })
            .collect();
        Self { entries }
    }

    /// Films liked by `user`; empty for users without likes or unknown users
    pub fn get(&self, user: UserId) -> &[Film] {
        self.entries
            .iter()
            .find(|(id, _)| *id == user)
            .map(|(_, films)| films.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains_user(&self, user: UserId) -> bool {
        self.entries.iter().any(|(id, _)| *id == user)
    }

    pub fn iter(&self) -> impl Iterator<Item = (UserId, &[Film])> {
        self.entries
            .iter()
            .map(|(user, films)| (*user, films.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read projection from like records to per-user film sets
#[derive(Clone)]
pub struct AffinityIndex {
    storage: Arc<dyn Storage>,
}

impl AffinityIndex {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Builds a snapshot covering every known user
    ///
    /// Each distinct film is fetched once per snapshot. A film removed between
    /// reading the like and fetching the film is left out.
    pub async fn snapshot(&self) -> AppResult<AffinitySnapshot> {
        let users = self.storage.list_users().await?;
        let mut films: HashMap<FilmId, Film> = HashMap::new();
        let mut entries = Vec::with_capacity(users.len());
        let mut like_count = 0usize;

        for user in users {
            let liked = self.storage.list_likes_for_user(user.id).await?;
            like_count += liked.len();

            let mut user_films = Vec::with_capacity(liked.len());
            for film_id in liked {
                if let Some(film) = films.get(&film_id) {
                    user_films.push(film.clone());
                    continue;
                }
                match self.storage.get_film(film_id).await {
                    Ok(film) => {
                        films.insert(film_id, film.clone());
                        user_films.push(film);
                    }
                    Err(AppError::NotFound(_)) => {
                        tracing::warn!(film_id = %film_id, user_id = %user.id, "Liked film vanished, skipping");
                    }
                    Err(e) => return Err(e),
                }
            }
            entries.push((user.id, user_films));
        }

        tracing::debug!(
            users = entries.len(),
            likes = like_count,
            distinct_films = films.len(),
            "Affinity snapshot built"
        );

        Ok(AffinitySnapshot::from_entries(entries))
    }
}

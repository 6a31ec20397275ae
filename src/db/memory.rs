use std::collections::BTreeMap;

use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{
        Film, FilmId, FriendshipRecord, FriendshipStatus, Genre, Mpa, NewFilm, NewUser, PairKey,
        User, UserId,
    },
};

use super::{Storage, GENRES, MPA_RATINGS};

/// In-process store used when no database is configured, and by tests
pub struct MemoryStorage {
    inner: RwLock<Tables>,
}

struct Tables {
    users: BTreeMap<UserId, User>,
    films: BTreeMap<FilmId, Film>,
    /// (user, film) in insertion order, unique
    likes: Vec<(UserId, FilmId)>,
    mpa: BTreeMap<i64, Mpa>,
    genres: BTreeMap<i64, Genre>,
    friendships: BTreeMap<PairKey, FriendshipRecord>,
    next_user_id: i64,
    next_film_id: i64,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Creates an empty store seeded with MPA ratings and genres
    pub fn new() -> Self {
        let mpa = MPA_RATINGS
            .iter()
            .map(|(id, name)| {
                (
                    *id,
                    Mpa {
                        id: *id,
                        name: name.to_string(),
                    },
                )
            })
            .collect();
        let genres = GENRES
            .iter()
            .map(|(id, name)| {
                (
                    *id,
                    Genre {
                        id: *id,
                        name: name.to_string(),
                    },
                )
            })
            .collect();

        Self {
            inner: RwLock::new(Tables {
                users: BTreeMap::new(),
                films: BTreeMap::new(),
                likes: Vec::new(),
                mpa,
                genres,
                friendships: BTreeMap::new(),
                next_user_id: 1,
                next_film_id: 1,
            }),
        }
    }

    /// Number of ledger rows currently stored
    pub async fn friendship_count(&self) -> usize {
        self.inner.read().await.friendships.len()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn get_user(&self, id: UserId) -> AppResult<User> {
        let tables = self.inner.read().await;
        tables
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::user_not_found(id))
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let tables = self.inner.read().await;
        Ok(tables.users.values().cloned().collect())
    }

    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let mut tables = self.inner.write().await;
        let id = UserId(tables.next_user_id);
        tables.next_user_id += 1;

        let user = user.into_user(id);
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: UserId, user: NewUser) -> AppResult<User> {
        let mut tables = self.inner.write().await;
        let slot = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::user_not_found(id))?;

        *slot = user.into_user(id);
        Ok(slot.clone())
    }

    async fn get_film(&self, id: FilmId) -> AppResult<Film> {
        let tables = self.inner.read().await;
        tables
            .films
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::film_not_found(id))
    }

    async fn list_films(&self) -> AppResult<Vec<Film>> {
        let tables = self.inner.read().await;
        Ok(tables.films.values().cloned().collect())
    }

    async fn insert_film(&self, film: NewFilm) -> AppResult<Film> {
        let mut tables = self.inner.write().await;

        let mpa = tables
            .mpa
            .get(&film.mpa.id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("MPA rating {} not found", film.mpa.id)))?;
        let genres = film
            .genre_ids()
            .into_iter()
            .map(|id| {
                tables
                    .genres
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))
            })
            .collect::<AppResult<Vec<Genre>>>()?;

        let id = FilmId(tables.next_film_id);
        tables.next_film_id += 1;

        let film = Film {
            id,
            name: film.name,
            description: film.description,
            release_date: film.release_date,
            duration: film.duration,
            mpa,
            genres,
        };
        tables.films.insert(id, film.clone());
        Ok(film)
    }

    async fn add_like(&self, film: FilmId, user: UserId) -> AppResult<()> {
        let mut tables = self.inner.write().await;
        if !tables.films.contains_key(&film) {
            return Err(AppError::film_not_found(film));
        }
        if !tables.users.contains_key(&user) {
            return Err(AppError::user_not_found(user));
        }
        if !tables.likes.contains(&(user, film)) {
            tables.likes.push((user, film));
        }
        Ok(())
    }

    async fn remove_like(&self, film: FilmId, user: UserId) -> AppResult<()> {
        let mut tables = self.inner.write().await;
        tables.likes.retain(|like| *like != (user, film));
        Ok(())
    }

    async fn list_likes_for_user(&self, user: UserId) -> AppResult<Vec<FilmId>> {
        let tables = self.inner.read().await;
        Ok(tables
            .likes
            .iter()
            .filter(|(liker, _)| *liker == user)
            .map(|(_, film)| *film)
            .collect())
    }

    async fn list_mpa(&self) -> AppResult<Vec<Mpa>> {
        let tables = self.inner.read().await;
        Ok(tables.mpa.values().cloned().collect())
    }

    async fn get_mpa(&self, id: i64) -> AppResult<Mpa> {
        let tables = self.inner.read().await;
        tables
            .mpa
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("MPA rating {} not found", id)))
    }

    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        let tables = self.inner.read().await;
        Ok(tables.genres.values().cloned().collect())
    }

    async fn get_genre(&self, id: i64) -> AppResult<Genre> {
        let tables = self.inner.read().await;
        tables
            .genres
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))
    }

    async fn get_friendship(&self, pair: PairKey) -> AppResult<Option<FriendshipRecord>> {
        let tables = self.inner.read().await;
        Ok(tables.friendships.get(&pair).copied())
    }

    async fn insert_friendship(&self, record: FriendshipRecord) -> AppResult<()> {
        let mut tables = self.inner.write().await;
        if tables.friendships.contains_key(&record.pair) {
            return Err(AppError::Conflict(format!(
                "Friendship {} already exists",
                record.pair
            )));
        }
        tables.friendships.insert(record.pair, record);
        Ok(())
    }

    async fn confirm_friendship(&self, pair: PairKey, confirmer: UserId) -> AppResult<bool> {
        let mut tables = self.inner.write().await;
        match tables.friendships.get_mut(&pair) {
            Some(record)
                if record.status == FriendshipStatus::Pending && record.initiator != confirmer =>
            {
                record.status = FriendshipStatus::Confirmed;
                record.initiator = confirmer;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_friendship(&self, pair: PairKey) -> AppResult<bool> {
        let mut tables = self.inner.write().await;
        Ok(tables.friendships.remove(&pair).is_some())
    }

    async fn list_friendships_touching(
        &self,
        user: UserId,
    ) -> AppResult<Vec<(UserId, FriendshipStatus)>> {
        let tables = self.inner.read().await;
        let mut touching: Vec<(UserId, FriendshipStatus)> = tables
            .friendships
            .values()
            .filter_map(|record| record.pair.other(user).map(|other| (other, record.status)))
            .collect();
        touching.sort_by_key(|(other, _)| *other);
        Ok(touching)
    }
}

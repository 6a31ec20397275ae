use crate::{
    error::AppResult,
    models::{
        Film, FilmId, FriendshipRecord, FriendshipStatus, Genre, Mpa, NewFilm, NewUser, PairKey,
        User, UserId,
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStorage;
pub use postgres::{create_pool, run_migrations, PgStorage};

/// MPA ratings seeded into every store
pub const MPA_RATINGS: [(i64, &str); 5] =
    [(1, "G"), (2, "PG"), (3, "PG-13"), (4, "R"), (5, "NC-17")];

/// Genres seeded into every store
pub const GENRES: [(i64, &str); 6] = [
    (1, "Comedy"),
    (2, "Drama"),
    (3, "Cartoon"),
    (4, "Thriller"),
    (5, "Documentary"),
    (6, "Action"),
];

/// Record store backing the ledger, the affinity index and the catalog.
///
/// Lookups of a single record fail with `AppError::NotFound` when the record
/// is absent. `insert_friendship` fails with `AppError::Conflict` when a row
/// already exists for the pair.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    async fn get_user(&self, id: UserId) -> AppResult<User>;

    /// All users in ascending ID order
    async fn list_users(&self) -> AppResult<Vec<User>>;

    async fn insert_user(&self, user: NewUser) -> AppResult<User>;

    async fn update_user(&self, id: UserId, user: NewUser) -> AppResult<User>;

    async fn get_film(&self, id: FilmId) -> AppResult<Film>;

    async fn list_films(&self) -> AppResult<Vec<Film>>;

    /// Inserts a film. MPA and genre references must already exist.
    async fn insert_film(&self, film: NewFilm) -> AppResult<Film>;

    /// Records a like. Liking twice keeps a single record.
    async fn add_like(&self, film: FilmId, user: UserId) -> AppResult<()>;

    async fn remove_like(&self, film: FilmId, user: UserId) -> AppResult<()>;

    /// Films liked by `user`, in the order the likes were recorded
    async fn list_likes_for_user(&self, user: UserId) -> AppResult<Vec<FilmId>>;

    async fn list_mpa(&self) -> AppResult<Vec<Mpa>>;

    async fn get_mpa(&self, id: i64) -> AppResult<Mpa>;

    async fn list_genres(&self) -> AppResult<Vec<Genre>>;

    async fn get_genre(&self, id: i64) -> AppResult<Genre>;

    async fn get_friendship(&self, pair: PairKey) -> AppResult<Option<FriendshipRecord>>;

    async fn insert_friendship(&self, record: FriendshipRecord) -> AppResult<()>;

    /// Moves a pending row to confirmed when `confirmer` is not its initiator.
    /// Returns whether a row changed.
    async fn confirm_friendship(&self, pair: PairKey, confirmer: UserId) -> AppResult<bool>;

    /// Returns whether a row was removed
    async fn delete_friendship(&self, pair: PairKey) -> AppResult<bool>;

    /// The other member and status of every row touching `user`, by ascending other ID
    async fn list_friendships_touching(
        &self,
        user: UserId,
    ) -> AppResult<Vec<(UserId, FriendshipStatus)>>;
}

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    error::{AppError, AppResult},
    models::{
        Film, FilmId, FriendshipRecord, FriendshipStatus, Genre, Mpa, NewFilm, NewUser, PairKey,
        User, UserId,
    },
};

use super::Storage;

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the migrations bundled under `migrations/`
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

const SQL_SELECT_USER: &str = r#"
SELECT id, email, login, name, birthday
FROM users
WHERE id = $1
"#;

const SQL_SELECT_USERS: &str = r#"
SELECT id, email, login, name, birthday
FROM users
ORDER BY id
"#;

const SQL_INSERT_USER: &str = r#"
INSERT INTO users (email, login, name, birthday)
VALUES ($1, $2, $3, $4)
RETURNING id, email, login, name, birthday
"#;

const SQL_UPDATE_USER: &str = r#"
UPDATE users
SET email = $2, login = $3, name = $4, birthday = $5
WHERE id = $1
RETURNING id, email, login, name, birthday
"#;

const SQL_SELECT_FILMS: &str = r#"
SELECT f.id, f.name, f.description, f.release_date, f.duration, m.id AS mpa_id, m.name AS mpa_name
FROM films f
JOIN mpa m ON m.id = f.mpa_id
ORDER BY f.id
"#;

const SQL_SELECT_FILM: &str = r#"
SELECT f.id, f.name, f.description, f.release_date, f.duration, m.id AS mpa_id, m.name AS mpa_name
FROM films f
JOIN mpa m ON m.id = f.mpa_id
WHERE f.id = $1
"#;

const SQL_SELECT_FILM_GENRES: &str = r#"
SELECT fg.film_id, g.id, g.name
FROM film_genres fg
JOIN genres g ON g.id = fg.genre_id
WHERE fg.film_id = ANY($1)
ORDER BY fg.film_id, fg.position
"#;

const SQL_INSERT_FILM: &str = r#"
INSERT INTO films (name, description, release_date, duration, mpa_id)
VALUES ($1, $2, $3, $4, $5)
RETURNING id
"#;

const SQL_INSERT_FILM_GENRE: &str = r#"
INSERT INTO film_genres (film_id, genre_id, position)
VALUES ($1, $2, $3)
"#;

const SQL_INSERT_LIKE: &str = r#"
INSERT INTO likes (user_id, film_id)
VALUES ($1, $2)
ON CONFLICT (user_id, film_id) DO NOTHING
"#;

const SQL_DELETE_LIKE: &str = "DELETE FROM likes WHERE user_id = $1 AND film_id = $2";

const SQL_SELECT_LIKES_FOR_USER: &str = r#"
SELECT film_id
FROM likes
WHERE user_id = $1
ORDER BY seq
"#;

const SQL_SELECT_FRIENDSHIP: &str = r#"
SELECT initiator_id, status
FROM friendships
WHERE user_low = $1 AND user_high = $2
"#;

const SQL_INSERT_FRIENDSHIP: &str = r#"
INSERT INTO friendships (user_low, user_high, initiator_id, status)
VALUES ($1, $2, $3, $4)
"#;

// Compare-and-set: only a pending row initiated by the other party moves.
const SQL_CONFIRM_FRIENDSHIP: &str = r#"
UPDATE friendships
SET status = 'confirmed', initiator_id = $3
WHERE user_low = $1 AND user_high = $2 AND status = 'pending' AND initiator_id <> $3
"#;

const SQL_DELETE_FRIENDSHIP: &str =
    "DELETE FROM friendships WHERE user_low = $1 AND user_high = $2";

const SQL_SELECT_FRIENDSHIPS_TOUCHING: &str = r#"
SELECT CASE WHEN user_low = $1 THEN user_high ELSE user_low END AS other_id, status
FROM friendships
WHERE user_low = $1 OR user_high = $1
ORDER BY other_id
"#;

#[derive(sqlx::FromRow)]
struct FilmRow {
    id: FilmId,
    name: String,
    description: String,
    release_date: NaiveDate,
    duration: i32,
    mpa_id: i64,
    mpa_name: String,
}

#[derive(sqlx::FromRow)]
struct FilmGenreRow {
    film_id: FilmId,
    id: i64,
    name: String,
}

impl FilmRow {
    fn into_film(self, genres: Vec<Genre>) -> Film {
        Film {
            id: self.id,
            name: self.name,
            description: self.description,
            release_date: self.release_date,
            duration: self.duration,
            mpa: Mpa {
                id: self.mpa_id,
                name: self.mpa_name,
            },
            genres,
        }
    }
}

fn parse_status(raw: &str) -> AppResult<FriendshipStatus> {
    raw.parse().map_err(AppError::Internal)
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Genres for each of `ids`, keyed by film
    async fn genres_for(&self, ids: &[i64]) -> AppResult<HashMap<FilmId, Vec<Genre>>> {
        let rows: Vec<FilmGenreRow> = sqlx::query_as(SQL_SELECT_FILM_GENRES)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        let mut by_film: HashMap<FilmId, Vec<Genre>> = HashMap::new();
        for row in rows {
            by_film.entry(row.film_id).or_default().push(Genre {
                id: row.id,
                name: row.name,
            });
        }
        Ok(by_film)
    }
}

#[async_trait::async_trait]
impl Storage for PgStorage {
    async fn get_user(&self, id: UserId) -> AppResult<User> {
        sqlx::query_as::<_, User>(SQL_SELECT_USER)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::user_not_found(id))
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(SQL_SELECT_USERS)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let name = user.display_name();
        let user = sqlx::query_as::<_, User>(SQL_INSERT_USER)
            .bind(&user.email)
            .bind(&user.login)
            .bind(name)
            .bind(user.birthday)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_user(&self, id: UserId, user: NewUser) -> AppResult<User> {
        let name = user.display_name();
        sqlx::query_as::<_, User>(SQL_UPDATE_USER)
            .bind(id)
            .bind(&user.email)
            .bind(&user.login)
            .bind(name)
            .bind(user.birthday)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::user_not_found(id))
    }

    async fn get_film(&self, id: FilmId) -> AppResult<Film> {
        let row: FilmRow = sqlx::query_as(SQL_SELECT_FILM)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::film_not_found(id))?;

        let mut genres = self.genres_for(&[id.0]).await?;
        Ok(row.into_film(genres.remove(&id).unwrap_or_default()))
    }

    async fn list_films(&self) -> AppResult<Vec<Film>> {
        let rows: Vec<FilmRow> = sqlx::query_as(SQL_SELECT_FILMS)
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<i64> = rows.iter().map(|row| row.id.0).collect();
        let mut genres = self.genres_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let film_genres = genres.remove(&row.id).unwrap_or_default();
                row.into_film(film_genres)
            })
            .collect())
    }

    async fn insert_film(&self, film: NewFilm) -> AppResult<Film> {
        let mut tx = self.pool.begin().await?;

        let id: FilmId = sqlx::query_scalar(SQL_INSERT_FILM)
            .bind(&film.name)
            .bind(&film.description)
            .bind(film.release_date)
            .bind(film.duration)
            .bind(film.mpa.id)
            .fetch_one(&mut *tx)
            .await?;

        for (position, genre_id) in film.genre_ids().into_iter().enumerate() {
            sqlx::query(SQL_INSERT_FILM_GENRE)
                .bind(id)
                .bind(genre_id)
                .bind(position as i32)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        self.get_film(id).await
    }

    async fn add_like(&self, film: FilmId, user: UserId) -> AppResult<()> {
        sqlx::query(SQL_INSERT_LIKE)
            .bind(user)
            .bind(film)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove_like(&self, film: FilmId, user: UserId) -> AppResult<()> {
        sqlx::query(SQL_DELETE_LIKE)
            .bind(user)
            .bind(film)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_likes_for_user(&self, user: UserId) -> AppResult<Vec<FilmId>> {
        let films = sqlx::query_scalar::<_, FilmId>(SQL_SELECT_LIKES_FOR_USER)
            .bind(user)
            .fetch_all(&self.pool)
            .await?;
        Ok(films)
    }

    async fn list_mpa(&self) -> AppResult<Vec<Mpa>> {
        let mpa = sqlx::query_as::<_, Mpa>("SELECT id, name FROM mpa ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(mpa)
    }

    async fn get_mpa(&self, id: i64) -> AppResult<Mpa> {
        sqlx::query_as::<_, Mpa>("SELECT id, name FROM mpa WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("MPA rating {} not found", id)))
    }

    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(genres)
    }

    async fn get_genre(&self, id: i64) -> AppResult<Genre> {
        sqlx::query_as::<_, Genre>("SELECT id, name FROM genres WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))
    }

    async fn get_friendship(&self, pair: PairKey) -> AppResult<Option<FriendshipRecord>> {
        let row: Option<(UserId, String)> = sqlx::query_as(SQL_SELECT_FRIENDSHIP)
            .bind(pair.low())
            .bind(pair.high())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|(initiator, status)| {
            Ok(FriendshipRecord {
                pair,
                initiator,
                status: parse_status(&status)?,
            })
        })
        .transpose()
    }

    async fn insert_friendship(&self, record: FriendshipRecord) -> AppResult<()> {
        sqlx::query(SQL_INSERT_FRIENDSHIP)
            .bind(record.pair.low())
            .bind(record.pair.high())
            .bind(record.initiator)
            .bind(record.status.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    AppError::Conflict(format!("Friendship {} already exists", record.pair))
                }
                other => AppError::Database(other),
            })?;
        Ok(())
    }

    async fn confirm_friendship(&self, pair: PairKey, confirmer: UserId) -> AppResult<bool> {
        let result = sqlx::query(SQL_CONFIRM_FRIENDSHIP)
            .bind(pair.low())
            .bind(pair.high())
            .bind(confirmer)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_friendship(&self, pair: PairKey) -> AppResult<bool> {
        let result = sqlx::query(SQL_DELETE_FRIENDSHIP)
            .bind(pair.low())
            .bind(pair.high())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_friendships_touching(
        &self,
        user: UserId,
    ) -> AppResult<Vec<(UserId, FriendshipStatus)>> {
        let rows: Vec<(UserId, String)> = sqlx::query_as(SQL_SELECT_FRIENDSHIPS_TOUCHING)
            .bind(user)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|(other, status)| Ok((other, parse_status(&status)?)))
            .collect()
    }
}

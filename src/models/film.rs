use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::FilmId;

/// MPA rating (G, PG, PG-13, R, NC-17)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::FromRow)]
pub struct Mpa {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::FromRow)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// A catalog film as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Film {
    pub id: FilmId,
    pub name: String,
    pub description: String,
    pub release_date: NaiveDate,
    /// Duration in minutes
    pub duration: i32,
    pub mpa: Mpa,
    pub genres: Vec<Genre>,
}

/// Reference to reference data by ID, e.g. `{"id": 1}`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct IdRef {
    pub id: i64,
}

/// Payload for creating a film
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NewFilm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub release_date: NaiveDate,
    pub duration: i32,
    pub mpa: IdRef,
    #[serde(default)]
    pub genres: Vec<IdRef>,
}

impl NewFilm {
    /// Genre IDs with repeats removed, first occurrence kept
    pub fn genre_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = Vec::with_capacity(self.genres.len());
        for genre in &self.genres {
            if !ids.contains(&genre.id) {
                ids.push(genre.id);
            }
        }
        ids
    }
}

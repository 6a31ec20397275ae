use chrono::NaiveDate;

use crate::{
    db::Storage,
    error::{AppError, AppResult},
    models::{Film, FilmId, NewFilm, UserId},
};

const MAX_DESCRIPTION_CHARS: usize = 200;

/// Earliest accepted release date (first public film screening)
pub fn earliest_release_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1895, 12, 28).unwrap_or(NaiveDate::MIN)
}

/// Checks a film payload's own fields
pub fn validate_film(film: &NewFilm) -> AppResult<()> {
    if film.name.trim().is_empty() {
        return Err(AppError::InvalidInput("Film name is required".to_string()));
    }
    if film.description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(AppError::InvalidInput(format!(
            "Description must be at most {} characters",
            MAX_DESCRIPTION_CHARS
        )));
    }
    if film.release_date < earliest_release_date() {
        return Err(AppError::InvalidInput(format!(
            "Release date cannot be before {}",
            earliest_release_date()
        )));
    }
    if film.duration <= 0 {
        return Err(AppError::InvalidInput(
            "Duration must be positive".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_film(storage: &dyn Storage, film: NewFilm) -> AppResult<Film> {
    validate_film(&film)?;

    // Reference data must exist before anything is written
    storage.get_mpa(film.mpa.id).await?;
    for genre_id in film.genre_ids() {
        storage.get_genre(genre_id).await?;
    }

    let film = storage.insert_film(film).await?;

    tracing::info!(film_id = %film.id, name = %film.name, "Film created");

    Ok(film)
}

pub async fn add_like(storage: &dyn Storage, film: FilmId, user: UserId) -> AppResult<()> {
    storage.get_film(film).await?;
    storage.get_user(user).await?;
    storage.add_like(film, user).await?;

    tracing::info!(film_id = %film, user_id = %user, "Like recorded");

    Ok(())
}

pub async fn remove_like(storage: &dyn Storage, film: FilmId, user: UserId) -> AppResult<()> {
    storage.get_film(film).await?;
    storage.get_user(user).await?;
    storage.remove_like(film, user).await?;

    tracing::info!(film_id = %film, user_id = %user, "Like removed");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStorage, MockStorage};
    use crate::models::{IdRef, NewUser};

    fn valid() -> NewFilm {
        NewFilm {
            name: "Nosferatu".to_string(),
            description: "A symphony of horror".to_string(),
            release_date: NaiveDate::from_ymd_opt(1922, 3, 4).unwrap(),
            duration: 94,
            mpa: IdRef { id: 3 },
            genres: vec![IdRef { id: 4 }],
        }
    }

    #[test]
    fn test_valid_film_passes() {
        assert!(validate_film(&valid()).is_ok());
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let film = NewFilm {
            name: "  ".to_string(),
            ..valid()
        };
        assert!(matches!(validate_film(&film), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_description_limit() {
        let film = NewFilm {
            description: "x".repeat(200),
            ..valid()
        };
        assert!(validate_film(&film).is_ok());

        let film = NewFilm {
            description: "x".repeat(201),
            ..valid()
        };
        assert!(validate_film(&film).is_err());
    }

    #[test]
    fn test_release_date_boundary() {
        let film = NewFilm {
            release_date: earliest_release_date(),
            ..valid()
        };
        assert!(validate_film(&film).is_ok());

        let film = NewFilm {
            release_date: NaiveDate::from_ymd_opt(1895, 12, 27).unwrap(),
            ..valid()
        };
        assert!(validate_film(&film).is_err());
    }

    #[test]
    fn test_non_positive_duration_is_rejected() {
        let film = NewFilm {
            duration: 0,
            ..valid()
        };
        assert!(validate_film(&film).is_err());
    }

    #[tokio::test]
    async fn test_unknown_genre_writes_nothing() {
        let mut storage = MockStorage::new();
        storage.expect_get_mpa().returning(|id| {
            Ok(crate::models::Mpa {
                id,
                name: "PG-13".to_string(),
            })
        });
        storage
            .expect_get_genre()
            .returning(|id| Err(AppError::NotFound(format!("Genre {} not found", id))));
        storage.expect_insert_film().never();

        let result = create_film(&storage, valid()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_like_requires_existing_user() {
        let storage = MemoryStorage::new();
        let film = create_film(&storage, valid()).await.unwrap();

        let result = add_like(&storage, film.id, UserId(1)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let user = storage
            .insert_user(NewUser {
                email: "max@example.com".to_string(),
                login: "max".to_string(),
                name: None,
                birthday: NaiveDate::from_ymd_opt(1980, 2, 2).unwrap(),
            })
            .await
            .unwrap();
        add_like(&storage, film.id, user.id).await.unwrap();
        assert_eq!(
            storage.list_likes_for_user(user.id).await.unwrap(),
            vec![film.id]
        );

        remove_like(&storage, film.id, user.id).await.unwrap();
        assert!(storage.list_likes_for_user(user.id).await.unwrap().is_empty());
    }
}

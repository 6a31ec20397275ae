use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{Film, FilmId, FriendshipState, Genre, Mpa, NewFilm, NewUser, User, UserId},
    services::{films, users},
};

use super::AppState;

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

// Users

pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.storage.list_users().await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> AppResult<Json<User>> {
    Ok(Json(state.storage.get_user(id).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<NewUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = users::create_user(state.storage.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(request): Json<NewUser>,
) -> AppResult<Json<User>> {
    let user = users::update_user(state.storage.as_ref(), id, request).await?;
    Ok(Json(user))
}

// Friends

/// Sends (or answers) a friend request from `id` to `friend_id`
pub async fn add_friend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path((id, friend_id)): Path<(UserId, UserId)>,
) -> AppResult<StatusCode> {
    tracing::info!(
        request_id = %request_id,
        user_id = %id,
        friend_id = %friend_id,
        "Processing friend request"
    );

    state.ledger.add_friend(id, friend_id).await?;
    Ok(StatusCode::OK)
}

pub async fn delete_friend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path((id, friend_id)): Path<(UserId, UserId)>,
) -> AppResult<StatusCode> {
    tracing::info!(
        request_id = %request_id,
        user_id = %id,
        friend_id = %friend_id,
        "Processing unfriend request"
    );

    state.ledger.delete_friend(id, friend_id).await?;
    Ok(StatusCode::OK)
}

pub async fn friendship_status(
    State(state): State<AppState>,
    Path((id, friend_id)): Path<(UserId, UserId)>,
) -> AppResult<Json<FriendshipState>> {
    Ok(Json(state.ledger.friendship_status(id, friend_id).await?))
}

pub async fn list_friends(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> AppResult<Json<Vec<User>>> {
    state.storage.get_user(id).await?;
    Ok(Json(state.ledger.list_friends(id).await?))
}

pub async fn common_friends(
    State(state): State<AppState>,
    Path((id, other_id)): Path<(UserId, UserId)>,
) -> AppResult<Json<Vec<User>>> {
    state.storage.get_user(id).await?;
    state.storage.get_user(other_id).await?;
    Ok(Json(state.ledger.common_friends(id, other_id).await?))
}

// Recommendations

pub async fn recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<UserId>,
) -> AppResult<Json<Vec<Film>>> {
    tracing::info!(request_id = %request_id, user_id = %id, "Processing recommendation request");

    state.storage.get_user(id).await?;
    Ok(Json(state.recommender.recommend(id).await?))
}

// Films

pub async fn list_films(State(state): State<AppState>) -> AppResult<Json<Vec<Film>>> {
    Ok(Json(state.storage.list_films().await?))
}

pub async fn get_film(
    State(state): State<AppState>,
    Path(id): Path<FilmId>,
) -> AppResult<Json<Film>> {
    Ok(Json(state.storage.get_film(id).await?))
}

pub async fn create_film(
    State(state): State<AppState>,
    Json(request): Json<NewFilm>,
) -> AppResult<(StatusCode, Json<Film>)> {
    let film = films::create_film(state.storage.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(film)))
}

pub async fn add_like(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(FilmId, UserId)>,
) -> AppResult<StatusCode> {
    films::add_like(state.storage.as_ref(), id, user_id).await?;
    Ok(StatusCode::OK)
}

pub async fn remove_like(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(FilmId, UserId)>,
) -> AppResult<StatusCode> {
    films::remove_like(state.storage.as_ref(), id, user_id).await?;
    Ok(StatusCode::OK)
}

// Reference data

pub async fn list_mpa(State(state): State<AppState>) -> AppResult<Json<Vec<Mpa>>> {
    Ok(Json(state.storage.list_mpa().await?))
}

pub async fn get_mpa(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Mpa>> {
    Ok(Json(state.storage.get_mpa(id).await?))
}

pub async fn list_genres(State(state): State<AppState>) -> AppResult<Json<Vec<Genre>>> {
    Ok(Json(state.storage.list_genres().await?))
}

pub async fn get_genre(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Genre>> {
    Ok(Json(state.storage.get_genre(id).await?))
}

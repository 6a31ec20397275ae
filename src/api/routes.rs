use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Users
        .route("/users", get(handlers::list_users).post(handlers::create_user))
        .route("/users/:id", get(handlers::get_user).put(handlers::update_user))
        // Friendship ledger
        .route("/users/:id/friends", get(handlers::list_friends))
        .route(
            "/users/:id/friends/:friend_id",
            get(handlers::friendship_status)
                .put(handlers::add_friend)
                .delete(handlers::delete_friend),
        )
        .route(
            "/users/:id/friends/common/:other_id",
            get(handlers::common_friends),
        )
        // Recommendations
        .route("/users/:id/recommendations", get(handlers::recommendations))
        // Films and likes
        .route("/films", get(handlers::list_films).post(handlers::create_film))
        .route("/films/:id", get(handlers::get_film))
        .route(
            "/films/:id/like/:user_id",
            put(handlers::add_like).delete(handlers::remove_like),
        )
        // Reference data
        .route("/mpa", get(handlers::list_mpa))
        .route("/mpa/:id", get(handlers::get_mpa))
        .route("/genres", get(handlers::list_genres))
        .route("/genres/:id", get(handlers::get_genre))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use reelmates_api::api::{create_router, AppState};

fn create_test_server() -> TestServer {
    let state = AppState::in_memory();
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

async fn create_user(server: &TestServer, login: &str) -> i64 {
    let response = server
        .post("/users")
        .json(&json!({
            "email": format!("{}@example.com", login),
            "login": login,
            "name": "",
            "birthday": "1990-04-12"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    created["id"].as_i64().unwrap()
}

async fn create_film(server: &TestServer, name: &str) -> i64 {
    let response = server
        .post("/films")
        .json(&json!({
            "name": name,
            "description": "",
            "release_date": "2004-07-01",
            "duration": 120,
            "mpa": {"id": 2},
            "genres": [{"id": 1}]
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    created["id"].as_i64().unwrap()
}

fn ids(values: &Value) -> Vec<i64> {
    values
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server();
    let id = "5f0c7d3e-2b1a-4c55-9d7e-0a1b2c3d4e5f";

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static(id),
        )
        .await;

    assert_eq!(response.header("x-request-id"), id);
}

#[tokio::test]
async fn test_create_and_get_user() {
    let server = create_test_server();
    let id = create_user(&server, "ann").await;

    let response = server.get(&format!("/users/{}", id)).await;
    response.assert_status_ok();
    let user: Value = response.json();
    assert_eq!(user["login"], "ann");
    // Blank name falls back to login
    assert_eq!(user["name"], "ann");

    let response = server.get("/users").await;
    let users: Value = response.json();
    assert_eq!(ids(&users), vec![id]);
}

#[tokio::test]
async fn test_invalid_user_is_rejected() {
    let server = create_test_server();
    let response = server
        .post("/users")
        .json(&json!({
            "email": "no-at-sign",
            "login": "ann",
            "birthday": "1990-04-12"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("Email"));
}

#[tokio::test]
async fn test_update_unknown_user_is_not_found() {
    let server = create_test_server();
    let response = server
        .put("/users/42")
        .json(&json!({
            "email": "ghost@example.com",
            "login": "ghost",
            "birthday": "1990-04-12"
        }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_friend_request_confirmation_flow() {
    let server = create_test_server();
    let ann = create_user(&server, "ann").await;
    let bob = create_user(&server, "bob").await;

    server
        .put(&format!("/users/{}/friends/{}", ann, bob))
        .await
        .assert_status_ok();

    let status: Value = server
        .get(&format!("/users/{}/friends/{}", bob, ann))
        .await
        .json();
    assert_eq!(status, json!({"status": "pending", "initiator": ann}));

    server
        .put(&format!("/users/{}/friends/{}", bob, ann))
        .await
        .assert_status_ok();

    let status: Value = server
        .get(&format!("/users/{}/friends/{}", ann, bob))
        .await
        .json();
    assert_eq!(status, json!({"status": "confirmed"}));
}

#[tokio::test]
async fn test_add_and_delete_friend() {
    let server = create_test_server();
    let ann = create_user(&server, "ann").await;
    let bob = create_user(&server, "bob").await;

    server
        .put(&format!("/users/{}/friends/{}", ann, bob))
        .await
        .assert_status_ok();

    let friends: Value = server.get(&format!("/users/{}/friends", ann)).await.json();
    assert_eq!(ids(&friends), vec![bob]);

    // Pending rows are listed from both sides
    let friends: Value = server.get(&format!("/users/{}/friends", bob)).await.json();
    assert_eq!(ids(&friends), vec![ann]);

    server
        .delete(&format!("/users/{}/friends/{}", ann, bob))
        .await
        .assert_status_ok();

    let friends: Value = server.get(&format!("/users/{}/friends", ann)).await.json();
    assert!(ids(&friends).is_empty());

    // Removing again is not an error
    server
        .delete(&format!("/users/{}/friends/{}", ann, bob))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_friend_request_to_unknown_user() {
    let server = create_test_server();
    let ann = create_user(&server, "ann").await;

    let response = server.put(&format!("/users/{}/friends/999", ann)).await;
    response.assert_status(StatusCode::NOT_FOUND);

    let friends: Value = server.get(&format!("/users/{}/friends", ann)).await.json();
    assert!(ids(&friends).is_empty());
}

#[tokio::test]
async fn test_self_friend_request_is_rejected() {
    let server = create_test_server();
    let ann = create_user(&server, "ann").await;

    let response = server.put(&format!("/users/{}/friends/{}", ann, ann)).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_common_friends() {
    let server = create_test_server();
    let ann = create_user(&server, "ann").await;
    let bob = create_user(&server, "bob").await;
    let cat = create_user(&server, "cat").await;
    let dan = create_user(&server, "dan").await;

    for (from, to) in [(ann, cat), (bob, cat), (ann, dan)] {
        server
            .put(&format!("/users/{}/friends/{}", from, to))
            .await
            .assert_status_ok();
    }

    let common: Value = server
        .get(&format!("/users/{}/friends/common/{}", ann, bob))
        .await
        .json();
    assert_eq!(ids(&common), vec![cat]);

    let response = server
        .get(&format!("/users/{}/friends/common/999", ann))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recommendations_follow_nearest_neighbor() {
    let server = create_test_server();
    let u1 = create_user(&server, "u1").await;
    let u2 = create_user(&server, "u2").await;
    let u3 = create_user(&server, "u3").await;

    let mut films = Vec::new();
    for n in 1..=5 {
        films.push(create_film(&server, &format!("F{}", n)).await);
    }
    let likes = [
        (u1, vec![films[0], films[1], films[2]]),
        (u2, vec![films[1], films[2], films[3]]),
        (u3, vec![films[4]]),
    ];
    for (user, liked) in &likes {
        for film in liked {
            server
                .put(&format!("/films/{}/like/{}", film, user))
                .await
                .assert_status_ok();
        }
    }

    let response = server.get(&format!("/users/{}/recommendations", u1)).await;
    response.assert_status_ok();
    let recommended: Value = response.json();
    assert_eq!(ids(&recommended), vec![films[3]]);
    assert_eq!(recommended[0]["name"], "F4");
    assert_eq!(recommended[0]["mpa"]["name"], "PG");
}

#[tokio::test]
async fn test_recommendations_empty_without_likes() {
    let server = create_test_server();
    let u1 = create_user(&server, "u1").await;
    let u2 = create_user(&server, "u2").await;
    let film = create_film(&server, "Solo").await;

    server
        .put(&format!("/films/{}/like/{}", film, u2))
        .await
        .assert_status_ok();

    let recommended: Value = server
        .get(&format!("/users/{}/recommendations", u1))
        .await
        .json();
    assert!(ids(&recommended).is_empty());
}

#[tokio::test]
async fn test_recommendations_for_unknown_user() {
    let server = create_test_server();
    let response = server.get("/users/77/recommendations").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unlike_changes_recommendations() {
    let server = create_test_server();
    let u1 = create_user(&server, "u1").await;
    let u2 = create_user(&server, "u2").await;
    let shared = create_film(&server, "Shared").await;
    let extra = create_film(&server, "Extra").await;

    for (film, user) in [(shared, u1), (shared, u2), (extra, u2)] {
        server
            .put(&format!("/films/{}/like/{}", film, user))
            .await
            .assert_status_ok();
    }

    let recommended: Value = server
        .get(&format!("/users/{}/recommendations", u1))
        .await
        .json();
    assert_eq!(ids(&recommended), vec![extra]);

    server
        .delete(&format!("/films/{}/like/{}", shared, u1))
        .await
        .assert_status_ok();

    let recommended: Value = server
        .get(&format!("/users/{}/recommendations", u1))
        .await
        .json();
    assert!(ids(&recommended).is_empty());
}

#[tokio::test]
async fn test_film_validation_and_reference_data() {
    let server = create_test_server();

    let response = server
        .post("/films")
        .json(&json!({
            "name": "Too early",
            "release_date": "1890-01-01",
            "duration": 10,
            "mpa": {"id": 1}
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/films")
        .json(&json!({
            "name": "Unrated",
            "release_date": "2000-01-01",
            "duration": 10,
            "mpa": {"id": 99}
        }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let mpa: Value = server.get("/mpa").await.json();
    assert_eq!(mpa.as_array().unwrap().len(), 5);

    let genre: Value = server.get("/genres/2").await.json();
    assert_eq!(genre["name"], "Drama");

    server.get("/genres/99").await.assert_status(StatusCode::NOT_FOUND);
    server.get("/films/1").await.assert_status(StatusCode::NOT_FOUND);
}

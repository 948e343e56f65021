//! End-to-end HTTP scenarios (§8) exercised against the axum `Router`
//! directly via `tower::ServiceExt::oneshot` -- no real server is bound.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use dogloot_server::game::Game;
use dogloot_server::geometry::Point;
use dogloot_server::map::{Map, Road};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower::ServiceExt;

fn two_map_game() -> Game {
    let mut game = Game::new();

    let mut m1 = Map::new("m1", "Map One", 1.0, 3);
    m1.add_road(Road::horizontal(Point::new(0, 0), 10));
    m1.build_road_index();
    game.add_map(m1).unwrap();

    let mut m2 = Map::new("m2", "Map Two", 1.0, 3);
    m2.add_road(Road::horizontal(Point::new(0, 0), 5));
    m2.build_road_index();
    game.add_map(m2).unwrap();

    game
}

fn make_router(game: Game) -> axum::Router {
    dogloot_server::http::router(Arc::new(Mutex::new(game)))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn join_and_query_maps() {
    let app = make_router(two_map_game());

    let response = app
        .oneshot(Request::builder().uri("/api/v1/maps").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let maps = body.as_array().unwrap();
    assert_eq!(maps.len(), 2);
    assert_eq!(maps[0]["id"], "m1");
    assert_eq!(maps[1]["id"], "m2");
}

#[tokio::test]
async fn join_then_state_shows_start_spawn() {
    let app = make_router(two_map_game());

    let join_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/game/join")
                .header("content-type", "application/json")
                .body(Body::from(json!({"userName": "alice", "mapId": "m1"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(join_response.status(), StatusCode::OK);
    let join_body = body_json(join_response).await;
    let token = join_body["authToken"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 32);
    let player_id = join_body["playerId"].as_u64().unwrap();

    let state_response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/game/state")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(state_response.status(), StatusCode::OK);
    let state_body = body_json(state_response).await;
    let pos = &state_body["players"][player_id.to_string()]["pos"];
    assert_eq!(pos[0], 0.0);
    assert_eq!(pos[1], 0.0);
}

#[tokio::test]
async fn state_without_token_is_unauthorized() {
    let app = make_router(two_map_game());
    let response = app
        .oneshot(Request::builder().uri("/api/v1/game/state").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "invalidToken");
}

#[tokio::test]
async fn state_with_unknown_token_is_rejected() {
    let app = make_router(two_map_game());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/game/state")
                .header("authorization", format!("Bearer {}", "0".repeat(32)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "unknownToken");
}

async fn join(app: &axum::Router, map_id: &str) -> (String, u64) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/game/join")
                .header("content-type", "application/json")
                .body(Body::from(json!({"userName": "alice", "mapId": map_id}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    (body["authToken"].as_str().unwrap().to_string(), body["playerId"].as_u64().unwrap())
}

#[tokio::test]
async fn move_and_manual_tick_advances_position() {
    let app = make_router(two_map_game());
    let (token, player_id) = join(&app, "m1").await;

    let action_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/game/player/action")
                .header("authorization", format!("Bearer {token}"))
                .header("content-type", "application/json")
                .body(Body::from(json!({"move": "R"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(action_response.status(), StatusCode::OK);

    let tick_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/game/tick")
                .header("authorization", format!("Bearer {token}"))
                .header("content-type", "application/json")
                .body(Body::from(json!({"timeDelta": 500}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(tick_response.status(), StatusCode::OK);

    let state_response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/game/state")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(state_response).await;
    let player = &body["players"][player_id.to_string()];
    assert_eq!(player["pos"][0], 0.5);
    assert_eq!(player["pos"][1], 0.0);
    assert_eq!(player["speed"][0], 1.0);
}

#[tokio::test]
async fn manual_tick_forbidden_once_auto_tick_is_enabled() {
    let mut game = two_map_game();
    game.auto_tick_enabled = true;
    let app = make_router(game);
    let (token, _) = join(&app, "m1").await;

    let tick_response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/game/tick")
                .header("authorization", format!("Bearer {token}"))
                .header("content-type", "application/json")
                .body(Body::from(json!({"timeDelta": 500}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(tick_response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(tick_response).await;
    assert_eq!(body["code"], "badRequest");
}

#[tokio::test]
async fn unknown_map_returns_404() {
    let app = make_router(two_map_game());
    let response = app
        .oneshot(Request::builder().uri("/api/v1/maps/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], "mapNotFound");
}

//! HTTP API layer (§4.K, §6).
//!
//! Thin axum routing/extraction glue over the [`Game`] registry: no game logic
//! lives here, only request parsing, auth, and error-to-response mapping. The
//! whole registry is guarded by one `tokio::sync::Mutex` -- the "api strand"
//! (§5) -- so every handler takes the lock for the duration of one request.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::{Method, StatusCode};
use axum::routing::{get, post};
use axum::{async_trait, Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::errors::{ApiError, ApiResult, GameError};
use crate::game::Game;
use crate::map::{Building, LootType, Map, Office, Road, RoadOrientation};
use crate::token::is_well_formed;

pub type SharedGame = Arc<Mutex<Game>>;

/// Builds the full router: the seven `/api/v1` routes plus CORS, with the
/// remainder (static file serving) layered on by the caller (`main.rs`) since
/// it depends on a CLI flag this module has no business knowing about.
pub fn router(game: SharedGame) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::POST])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/api/v1/maps", get(list_maps))
        .route("/api/v1/maps/{id}", get(get_map))
        .route("/api/v1/game/join", post(join))
        .route("/api/v1/game/players", get(list_players))
        .route("/api/v1/game/state", get(get_state))
        .route("/api/v1/game/player/action", post(player_action))
        .route("/api/v1/game/tick", post(manual_tick))
        .with_state(game)
        .layer(cors)
}

// ---- auth extractor -------------------------------------------------------

/// A validated caller: the bearer token and the player it resolves to.
pub struct AuthenticatedPlayer {
    pub player_id: u64,
}

#[async_trait]
impl FromRequestParts<SharedGame> for AuthenticatedPlayer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedGame) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .ok_or_else(|| ApiError::from(GameError::MissingAuth))?;

        let header = header.to_str().map_err(|_| ApiError::from(GameError::InvalidToken))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::from(GameError::InvalidToken))?;

        if !is_well_formed(token) {
            return Err(ApiError::from(GameError::InvalidToken));
        }

        let game = state.lock().await;
        let player = game.find_player_by_token(token).ok_or_else(|| ApiError::from(GameError::UnknownToken))?;
        Ok(AuthenticatedPlayer { player_id: player.id })
    }
}

// ---- DTOs ------------------------------------------------------------------

#[derive(Serialize)]
struct MapSummaryDto {
    id: String,
    name: String,
}

#[derive(Serialize)]
struct RoadDto {
    x0: i32,
    y0: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    x1: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    y1: Option<i32>,
}

impl From<&Road> for RoadDto {
    fn from(road: &Road) -> Self {
        match road.orientation() {
            RoadOrientation::Horizontal => RoadDto { x0: road.start.x, y0: road.start.y, x1: Some(road.end.x), y1: None },
            RoadOrientation::Vertical => RoadDto { x0: road.start.x, y0: road.start.y, x1: None, y1: Some(road.end.y) },
        }
    }
}

#[derive(Serialize)]
struct OfficeDto {
    id: String,
    x: i32,
    y: i32,
    #[serde(rename = "offsetX")]
    offset_x: i32,
    #[serde(rename = "offsetY")]
    offset_y: i32,
}

impl From<&Office> for OfficeDto {
    fn from(office: &Office) -> Self {
        OfficeDto {
            id: office.id.clone(),
            x: office.position.x,
            y: office.position.y,
            offset_x: office.offset_x,
            offset_y: office.offset_y,
        }
    }
}

#[derive(Serialize)]
struct MapDto {
    id: String,
    name: String,
    roads: Vec<RoadDto>,
    buildings: Vec<Building>,
    offices: Vec<OfficeDto>,
    #[serde(rename = "lootTypes")]
    loot_types: Vec<LootType>,
}

impl From<&Map> for MapDto {
    fn from(map: &Map) -> Self {
        MapDto {
            id: map.id.clone(),
            name: map.name.clone(),
            roads: map.roads().iter().map(RoadDto::from).collect(),
            buildings: map.buildings().to_vec(),
            offices: map.offices().iter().map(OfficeDto::from).collect(),
            loot_types: map.loot_types().to_vec(),
        }
    }
}

#[derive(Deserialize)]
struct JoinRequest {
    #[serde(rename = "userName")]
    user_name: String,
    #[serde(rename = "mapId")]
    map_id: String,
}

#[derive(Serialize)]
struct JoinResponseDto {
    #[serde(rename = "authToken")]
    auth_token: String,
    #[serde(rename = "playerId")]
    player_id: u64,
}

#[derive(Serialize)]
struct PlayerNameDto {
    name: String,
}

#[derive(Serialize)]
struct BagItemDto {
    id: u64,
    #[serde(rename = "type")]
    loot_type: usize,
}

#[derive(Serialize)]
struct PlayerStateDto {
    pos: [f64; 2],
    speed: [f64; 2],
    dir: &'static str,
    bag: Vec<BagItemDto>,
    score: i32,
}

#[derive(Serialize)]
struct LootObjectDto {
    #[serde(rename = "type")]
    loot_type: usize,
    pos: [f64; 2],
}

#[derive(Serialize)]
struct StateResponseDto {
    players: HashMap<String, PlayerStateDto>,
    #[serde(rename = "lostObjects")]
    lost_objects: HashMap<String, LootObjectDto>,
}

#[derive(Deserialize)]
struct PlayerActionRequest {
    #[serde(rename = "move")]
    direction: String,
}

#[derive(Deserialize)]
struct TickRequest {
    #[serde(rename = "timeDelta")]
    time_delta: f64,
}

// ---- handlers --------------------------------------------------------------

async fn list_maps(State(game): State<SharedGame>) -> Json<Vec<MapSummaryDto>> {
    let game = game.lock().await;
    let maps = game.maps().iter().map(|m| MapSummaryDto { id: m.id.clone(), name: m.name.clone() }).collect();
    Json(maps)
}

async fn get_map(State(game): State<SharedGame>, Path(id): Path<String>) -> ApiResult<Json<MapDto>> {
    let game = game.lock().await;
    let map = game.find_map(&id).ok_or_else(|| ApiError::from(GameError::MapNotFound(id.clone())))?;
    Ok(Json(MapDto::from(map.as_ref())))
}

async fn join(
    State(game): State<SharedGame>,
    Json(body): Json<JoinRequest>,
) -> ApiResult<Json<JoinResponseDto>> {
    let mut game = game.lock().await;
    let (player, token) = game.join(&body.map_id, body.user_name)?;
    Ok(Json(JoinResponseDto { auth_token: token, player_id: player.id }))
}

async fn list_players(
    State(game): State<SharedGame>,
    auth: AuthenticatedPlayer,
) -> ApiResult<Json<HashMap<String, PlayerNameDto>>> {
    let game = game.lock().await;
    let player = game.find_player_by_id(auth.player_id).expect("token resolved to this player");
    let tokens = game.tokens_of(&player.map_id);

    let mut players = HashMap::new();
    for player_id in tokens.values() {
        if let Some(p) = game.find_player_by_id(*player_id) {
            players.insert(p.id.to_string(), PlayerNameDto { name: p.name.clone() });
        }
    }
    Ok(Json(players))
}

async fn get_state(
    State(game): State<SharedGame>,
    auth: AuthenticatedPlayer,
) -> ApiResult<Json<StateResponseDto>> {
    let game = game.lock().await;
    let player = game.find_player_by_id(auth.player_id).expect("token resolved to this player");
    let session = game.session(&player.map_id).expect("joined player always has a session");
    let tokens = game.tokens_of(&player.map_id);

    let mut players = HashMap::new();
    for player_id in tokens.values() {
        let Some(p) = game.find_player_by_id(*player_id) else { continue };
        let Some(dog) = session.dog(p.dog_id) else { continue };
        players.insert(
            p.id.to_string(),
            PlayerStateDto {
                pos: [dog.position.x, dog.position.y],
                speed: [dog.velocity.x, dog.velocity.y],
                dir: dog.direction.as_token(),
                bag: dog.bag.items.iter().map(|i| BagItemDto { id: i.id, loot_type: i.loot_type }).collect(),
                score: dog.score,
            },
        );
    }

    let lost_objects = session
        .loot_objects()
        .map(|loot| (loot.id.to_string(), LootObjectDto { loot_type: loot.loot_type, pos: [loot.position.x, loot.position.y] }))
        .collect();

    Ok(Json(StateResponseDto { players, lost_objects }))
}

async fn player_action(
    State(game): State<SharedGame>,
    auth: AuthenticatedPlayer,
    Json(body): Json<PlayerActionRequest>,
) -> ApiResult<StatusCode> {
    let mut game = game.lock().await;
    let player = game.find_player_by_id(auth.player_id).expect("token resolved to this player").clone();
    let session = game.session_for(&player.map_id)?;
    let dog = session.dog_mut(player.dog_id).expect("joined player always has a dog");
    dog.set_direction(&body.direction)?;
    Ok(StatusCode::OK)
}

async fn manual_tick(
    State(game): State<SharedGame>,
    Json(body): Json<TickRequest>,
) -> ApiResult<StatusCode> {
    let mut game = game.lock().await;
    if game.auto_tick_enabled {
        return Err(ApiError::from(GameError::TickForbidden));
    }
    game.tick(body.time_delta);
    Ok(StatusCode::OK)
}

//! Core game simulation and HTTP server for a "dog collects loot" multiplayer
//! game.
//!
//! Module layout goes leaves first (`geometry`, `errors`), then the static
//! world (`map`), the tick-driven collaborators (`loot_generator`,
//! `collision`), the mutable entities (`dog`, `loot`, `session`), the
//! registry root (`game`, `token`), persistence (`serialization`), and the
//! ambient stack (`config`, `http`).

pub mod collision;
pub mod config;
pub mod dog;
pub mod errors;
pub mod game;
pub mod geometry;
pub mod http;
pub mod loot;
pub mod loot_generator;
pub mod map;
pub mod serialization;
pub mod session;
pub mod token;

pub use crate::errors::{ApiError, ApiResult, GameError, GameResult};
pub use crate::game::{Game, IdAllocator, Player, SpawnPolicy};
pub use crate::geometry::{Point, PointDouble};
pub use crate::loot::LootObject;
pub use crate::map::Map;
pub use crate::session::Session;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! JSON configuration loader (§4.J, §6).
//!
//! Parses the on-disk config into owned [`Map`]s and the registry-wide
//! defaults (`Game::loot_defaults`, `Game::spawn_policy` is set by the CLI,
//! not this loader). Malformed input is a fail-fast, process-exiting error --
//! there is no partial/recoverable load.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::errors::GameError;
use crate::game::{Game, LootGeneratorDefaults};
use crate::geometry::Point;
use crate::map::{Building, LootType, Map, Office, Road};

fn default_dog_speed() -> f64 {
    1.0
}

fn default_bag_capacity() -> usize {
    3
}

#[derive(Debug, Deserialize)]
struct RawRoad {
    x0: i32,
    y0: i32,
    x1: Option<i32>,
    y1: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct RawBuilding {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

#[derive(Debug, Deserialize)]
struct RawOffice {
    id: String,
    x: i32,
    y: i32,
    #[serde(rename = "offsetX")]
    offset_x: i32,
    #[serde(rename = "offsetY")]
    offset_y: i32,
}

#[derive(Debug, Deserialize)]
struct RawLootType {
    name: String,
    file: String,
    #[serde(rename = "type")]
    asset_type: String,
    rotation: Option<i32>,
    color: String,
    scale: Option<f64>,
    value: i32,
}

#[derive(Debug, Deserialize)]
struct RawMap {
    id: String,
    name: String,
    #[serde(rename = "dogSpeed")]
    dog_speed: Option<f64>,
    #[serde(rename = "bagCapacity")]
    bag_capacity: Option<usize>,
    #[serde(default)]
    roads: Vec<RawRoad>,
    #[serde(default)]
    buildings: Vec<RawBuilding>,
    #[serde(default)]
    offices: Vec<RawOffice>,
    #[serde(rename = "lootTypes", default)]
    loot_types: Vec<RawLootType>,
}

#[derive(Debug, Deserialize)]
struct RawLootGeneratorConfig {
    /// Seconds, per §6 -- converted to milliseconds on load (the core works
    /// exclusively in milliseconds, §4.C).
    period: f64,
    probability: f64,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(rename = "defaultDogSpeed", default = "default_dog_speed")]
    default_dog_speed: f64,
    #[serde(rename = "defaultBagCapacity", default = "default_bag_capacity")]
    default_bag_capacity: usize,
    #[serde(rename = "lootGeneratorConfig")]
    loot_generator_config: Option<RawLootGeneratorConfig>,
    maps: Vec<RawMap>,
}

/// Everything that can go wrong loading `--config-file`: I/O, malformed JSON,
/// or a domain-level load error (duplicate map/office). All are fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to open config file {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },

    #[error("failed to parse config file {path}: {source}")]
    Parse { path: String, #[source] source: serde_json::Error },

    #[error(transparent)]
    Game(#[from] GameError),
}

/// Loads `path`, builds every declared map, and registers them on a fresh
/// [`Game`] together with the loot-generator defaults. Fails fast.
pub fn load_game(path: &Path) -> Result<Game, ConfigError> {
    let file = File::open(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let reader = BufReader::new(file);
    let raw: RawConfig = serde_json::from_reader(reader).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    let mut game = Game::new();
    game.loot_defaults = match &raw.loot_generator_config {
        Some(cfg) => LootGeneratorDefaults { period_ms: cfg.period * 1000.0, probability: cfg.probability },
        None => LootGeneratorDefaults::default(),
    };

    for raw_map in raw.maps {
        let map = build_map(&raw_map, raw.default_dog_speed, raw.default_bag_capacity)?;
        game.add_map(map)?;
    }

    Ok(game)
}

fn build_map(raw: &RawMap, default_dog_speed: f64, default_bag_capacity: usize) -> Result<Map, ConfigError> {
    let mut map = Map::new(
        raw.id.clone(),
        raw.name.clone(),
        raw.dog_speed.unwrap_or(default_dog_speed),
        raw.bag_capacity.unwrap_or(default_bag_capacity),
    );

    for road in &raw.roads {
        match (road.x1, road.y1) {
            (Some(x1), None) => map.add_road(Road::horizontal(Point::new(road.x0, road.y0), x1)),
            (None, Some(y1)) => map.add_road(Road::vertical(Point::new(road.x0, road.y0), y1)),
            _ => {
                return Err(ConfigError::Parse {
                    path: raw.id.clone(),
                    source: serde::de::Error::custom(
                        "road must set exactly one of x1 (horizontal) or y1 (vertical)",
                    ),
                })
            }
        }
    }

    for building in &raw.buildings {
        map.add_building(Building { x: building.x, y: building.y, w: building.w, h: building.h });
    }

    for office in &raw.offices {
        map.add_office(Office {
            id: office.id.clone(),
            position: Point::new(office.x, office.y),
            offset_x: office.offset_x,
            offset_y: office.offset_y,
        })?;
    }

    for loot_type in &raw.loot_types {
        map.add_loot_type(LootType {
            name: loot_type.name.clone(),
            file: loot_type.file.clone(),
            asset_type: loot_type.asset_type.clone(),
            rotation: loot_type.rotation,
            color: loot_type.color.clone(),
            scale: loot_type.scale,
            value: loot_type.value,
        });
    }

    map.build_road_index();
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_config(body: &str) -> tempfile::TempPath {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file.into_temp_path()
    }

    #[test]
    fn loads_maps_with_roads_and_office() {
        let path = write_temp_config(
            r#"{
                "maps": [
                    {
                        "id": "m1",
                        "name": "Map 1",
                        "dogSpeed": 2.0,
                        "roads": [{"x0": 0, "y0": 0, "x1": 10}],
                        "offices": [{"id": "o1", "x": 4, "y": 0, "offsetX": 0, "offsetY": 0}],
                        "lootTypes": [{"name": "coin", "file": "coin.obj", "type": "obj", "color": "#fff", "value": 5}]
                    }
                ]
            }"#,
        );

        let game = load_game(&path).unwrap();
        let map = game.find_map("m1").unwrap();
        assert_eq!(map.dog_speed, 2.0);
        assert_eq!(map.roads().len(), 1);
        assert_eq!(map.offices().len(), 1);
        assert_eq!(map.loot_types().len(), 1);
    }

    #[test]
    fn defaults_apply_when_omitted() {
        let path = write_temp_config(r#"{"maps": [{"id": "m1", "name": "Map 1", "roads": []}]}"#);
        let game = load_game(&path).unwrap();
        let map = game.find_map("m1").unwrap();
        assert_eq!(map.dog_speed, 1.0);
        assert_eq!(map.bag_capacity, 3);
    }

    #[test]
    fn loot_generator_disabled_without_config_section() {
        let path = write_temp_config(r#"{"maps": [{"id": "m1", "name": "Map 1", "roads": []}]}"#);
        let game = load_game(&path).unwrap();
        assert_eq!(game.loot_defaults.period_ms, 0.0);
        assert_eq!(game.loot_defaults.probability, 0.0);
    }

    #[test]
    fn duplicate_map_id_is_fatal() {
        let path = write_temp_config(
            r#"{"maps": [
                {"id": "m1", "name": "a", "roads": []},
                {"id": "m1", "name": "b", "roads": []}
            ]}"#,
        );
        let err = load_game(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Game(GameError::DuplicateMap(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_game(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

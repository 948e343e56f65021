//! Snapshot serializer (§4.I).
//!
//! Converts the entire [`Game`] registry to/from a self-describing byte
//! stream (bincode) and restores identity and id counters. `save` is
//! best-effort and silent on I/O failure -- the next autosave tick will
//! retry. `restore` treats a missing or unreadable file as a cold start.
//! The format is opaque and owned by this crate; schema evolution resets
//! state rather than attempting forward/backward compatibility.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dog::{Bag, Dog, Direction, TickSegment};
use crate::game::{Game, Player};
use crate::geometry::PointDouble;
use crate::loot::LootObject;

#[derive(Serialize, Deserialize)]
struct LootObjectRepr {
    id: u64,
    loot_id_counter: u64,
    #[serde(rename = "type")]
    loot_type: usize,
    value: i32,
    position: PointDouble,
    width: f64,
}

#[derive(Serialize, Deserialize)]
struct BagRepr {
    capacity: usize,
    items: Vec<LootObjectRepr>,
}

#[derive(Serialize, Deserialize)]
struct DogRepr {
    dog_id: u64,
    dog_id_counter: u64,
    position: PointDouble,
    velocity: PointDouble,
    direction: Direction,
    speed_value: f64,
    bag: BagRepr,
    score: i32,
    last_tick_segment: TickSegment,
}

#[derive(Serialize, Deserialize)]
struct PlayerRepr {
    name: String,
    player_id: u64,
    player_id_counter: u64,
    token: String,
    dog: DogRepr,
}

#[derive(Serialize, Deserialize)]
struct SessionRepr {
    map_id: String,
    players: Vec<PlayerRepr>,
    loot: Vec<LootObjectRepr>,
}

#[derive(Serialize, Deserialize)]
struct GameSnapshot {
    sessions: Vec<SessionRepr>,
}

fn carried_loot_to_repr(item: &LootObject, loot_id_counter: u64) -> LootObjectRepr {
    LootObjectRepr {
        id: item.id,
        loot_id_counter,
        loot_type: item.loot_type,
        value: item.value,
        position: item.position,
        width: crate::map::LOOT_WIDTH,
    }
}

fn repr_to_carried_loot(repr: &LootObjectRepr) -> LootObject {
    LootObject {
        id: repr.id,
        loot_type: repr.loot_type,
        value: repr.value,
        position: repr.position,
    }
}

/// Serializes `game` to `path`. Any I/O failure is swallowed -- the caller
/// (the autosave scheduler) simply retries on the next period.
pub fn save(game: &Game, path: &Path) {
    let snapshot = build_snapshot(game);
    let bytes = match bincode::serialize(&snapshot) {
        Ok(b) => b,
        Err(_) => return,
    };

    let tmp_path = path.with_extension("tmp");
    let result = (|| -> std::io::Result<()> {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
}

fn build_snapshot(game: &Game) -> GameSnapshot {
    let mut sessions = Vec::new();

    for map in game.maps() {
        let Some(session) = game.session(&map.id) else { continue };

        let loot = session
            .loot_objects()
            .map(|l| LootObjectRepr {
                id: l.id,
                loot_id_counter: game.loot_ids.peek_next(),
                loot_type: l.loot_type,
                value: l.value,
                position: l.position,
                width: crate::map::LOOT_WIDTH,
            })
            .collect();

        let mut players = Vec::new();
        for (token, player_id) in game.tokens_of(&map.id) {
            let Some(player) = game.find_player_by_id(player_id) else { continue };
            let Some(dog) = session.dog(player.dog_id) else { continue };

            players.push(PlayerRepr {
                name: player.name.clone(),
                player_id: player.id,
                player_id_counter: game.player_ids.peek_next(),
                token,
                dog: DogRepr {
                    dog_id: dog.id,
                    dog_id_counter: game.dog_ids.peek_next(),
                    position: dog.position,
                    velocity: dog.velocity,
                    direction: dog.direction,
                    speed_value: dog.speed_value,
                    bag: BagRepr {
                        capacity: dog.bag.capacity,
                        items: dog
                            .bag
                            .items
                            .iter()
                            .map(|item| carried_loot_to_repr(item, game.loot_ids.peek_next()))
                            .collect(),
                    },
                    score: dog.score,
                    last_tick_segment: dog.last_tick_segment,
                },
            });
        }

        sessions.push(SessionRepr { map_id: map.id.clone(), players, loot });
    }

    GameSnapshot { sessions }
}

/// Restores `game` from `path`. A missing or unreadable file is a silent
/// cold start: `game` is left untouched.
pub fn restore(game: &mut Game, path: &Path) {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(_) => return,
    };
    let snapshot: GameSnapshot = match bincode::deserialize(&bytes) {
        Ok(s) => s,
        Err(_) => return,
    };

    for session_repr in snapshot.sessions {
        for loot_repr in &session_repr.loot {
            let loot = LootObject {
                id: loot_repr.id,
                loot_type: loot_repr.loot_type,
                value: loot_repr.value,
                position: loot_repr.position,
            };
            let _ = game.restore_loot(&session_repr.map_id, loot);
        }

        for player_repr in session_repr.players {
            game.dog_ids.restore_at_least(player_repr.dog.dog_id_counter.saturating_sub(1));
            game.player_ids.restore_at_least(player_repr.player_id_counter.saturating_sub(1));
            game.loot_ids.restore_at_least(
                player_repr
                    .dog
                    .bag
                    .items
                    .iter()
                    .map(|i| i.loot_id_counter)
                    .max()
                    .unwrap_or(0)
                    .saturating_sub(1),
            );

            let bag_items: Vec<LootObject> = player_repr.dog.bag.items.iter().map(repr_to_carried_loot).collect();
            let mut bag = Bag::new(player_repr.dog.bag.capacity);
            bag.items = bag_items;

            let dog = Dog {
                id: player_repr.dog.dog_id,
                position: player_repr.dog.position,
                velocity: player_repr.dog.velocity,
                direction: player_repr.dog.direction,
                speed_value: player_repr.dog.speed_value,
                bag,
                score: player_repr.dog.score,
                last_tick_segment: player_repr.dog.last_tick_segment,
            };

            let player = Player {
                id: player_repr.player_id,
                name: player_repr.name,
                map_id: session_repr.map_id.clone(),
                dog_id: player_repr.dog.dog_id,
            };

            let _ = game.restore_player(&session_repr.map_id, player, player_repr.token, dog);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::map::{Map, Road};

    fn sample_map(id: &str) -> Map {
        let mut map = Map::new(id, id, 1.0, 3);
        map.add_road(Road::horizontal(Point::new(0, 0), 10));
        map.build_road_index();
        map
    }

    #[test]
    fn round_trip_preserves_players_and_loot() {
        let mut game = Game::new();
        game.add_map(sample_map("m1")).unwrap();
        let (player, token) = game.join("m1", "alice".into()).unwrap();
        game.session_for("m1")
            .unwrap()
            .insert_loot(LootObject { id: 999, loot_type: 0, value: 7, position: PointDouble::new(3.0, 0.0) });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.bin");
        save(&game, &path);

        let mut restored = Game::new();
        restored.add_map(sample_map("m1")).unwrap();
        restore(&mut restored, &path);

        let restored_player = restored.find_player_by_token(&token).unwrap();
        assert_eq!(restored_player.name, "alice");
        assert_eq!(restored_player.id, player.id);

        let session = restored.session("m1").unwrap();
        assert!(session.dog(restored_player.dog_id).is_some());
        assert_eq!(session.loot_objects().count(), 1);
        assert_eq!(session.loot_objects().next().unwrap().id, 999);
    }

    #[test]
    fn restore_missing_file_is_a_cold_start_noop() {
        let mut game = Game::new();
        game.add_map(sample_map("m1")).unwrap();
        restore(&mut game, Path::new("/nonexistent/path/state.bin"));
        assert!(game.session("m1").is_none());
    }

    #[test]
    fn restored_counters_do_not_collide_with_new_allocations() {
        let mut game = Game::new();
        game.add_map(sample_map("m1")).unwrap();
        let (player, _) = game.join("m1", "alice".into()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.bin");
        save(&game, &path);

        let mut restored = Game::new();
        restored.add_map(sample_map("m1")).unwrap();
        restore(&mut restored, &path);

        let (new_player, _) = restored.join("m1", "bob".into()).unwrap();
        assert_ne!(new_player.id, player.id);
        assert_ne!(new_player.dog_id, player.dog_id);
    }
}

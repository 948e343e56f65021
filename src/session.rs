//! Session: per-map live world (§3, §4.F).
//!
//! Strongly owns the map's live avatars and loot objects; drives the per-tick
//! movement update and gather resolution. No cross-session avatar ever exists.

use std::collections::HashMap;
use std::sync::Arc;

use crate::collision::{find_gather_events, Gatherer, Item, ItemKind};
use crate::dog::{Dog, TickSegment};
use crate::geometry::{Point, PointDouble};
use crate::loot::LootObject;
use crate::loot_generator::LootGenerator;
use crate::map::{Map, LOOT_WIDTH, OFFICE_WIDTH};

/// The live world of a single map.
pub struct Session {
    pub map: Arc<Map>,
    dogs: HashMap<u64, Dog>,
    loot: HashMap<u64, LootObject>,
    loot_generator: LootGenerator,
}

impl Session {
    pub fn new(map: Arc<Map>, loot_period_ms: f64, loot_probability: f64) -> Self {
        Self {
            map,
            dogs: HashMap::new(),
            loot: HashMap::new(),
            loot_generator: LootGenerator::new(loot_period_ms, loot_probability),
        }
    }

    pub fn dogs(&self) -> impl Iterator<Item = &Dog> {
        self.dogs.values()
    }

    pub fn dog(&self, id: u64) -> Option<&Dog> {
        self.dogs.get(&id)
    }

    pub fn dog_mut(&mut self, id: u64) -> Option<&mut Dog> {
        self.dogs.get_mut(&id)
    }

    pub fn loot_objects(&self) -> impl Iterator<Item = &LootObject> {
        self.loot.values()
    }

    /// Attaches a freshly-created dog to this session (bag capacity is taken
    /// from the owning map per §3's lifecycle rule).
    pub fn add_dog(&mut self, dog: Dog) {
        self.dogs.insert(dog.id, dog);
    }

    /// Materializes a loot object with an already-allocated id (used both by
    /// `generate_loot` and by snapshot restore, which must preserve ids).
    pub fn insert_loot(&mut self, loot: LootObject) {
        self.loot.insert(loot.id, loot);
    }

    /// Asks the loot generator for a new-loot count and materializes that many
    /// items at random map positions, each allocating a fresh id via `next_id`.
    pub fn generate_loot(&mut self, delta_ms: f64, mut next_id: impl FnMut() -> u64) {
        let n = self
            .loot_generator
            .generate(delta_ms, self.loot.len(), self.dogs.len());
        for _ in 0..n {
            let (type_index, value) = match self.map.random_loot_type() {
                Ok(t) => t,
                Err(_) => break,
            };
            let position = match self.map.random_position() {
                Ok(p) => p,
                Err(_) => break,
            };
            let id = next_id();
            self.loot.insert(
                id,
                LootObject {
                    id,
                    loot_type: type_index,
                    value,
                    position,
                },
            );
        }
    }

    /// Advances every avatar along the road graph (§4.F), then runs gather
    /// resolution. `delta_s` is elapsed time in seconds.
    pub fn update_dogs_positions(&mut self, delta_s: f64) {
        let mut ids: Vec<u64> = self.dogs.keys().copied().collect();
        ids.sort_unstable();

        for id in ids {
            let dog = self.dogs.get_mut(&id).expect("dog id came from this session's own map");
            let prev_pos = dog.position;
            let p_int: Point = prev_pos.round();
            let candidate_roads = self.map.roads_at(p_int);
            let ideal_next = prev_pos + dog.velocity.scale(delta_s);

            let new_pos;
            let should_stop;

            if candidate_roads.is_empty() {
                new_pos = prev_pos;
                should_stop = true;
            } else if candidate_roads.iter().any(|r| r.is_on_area(ideal_next)) {
                new_pos = ideal_next;
                should_stop = false;
            } else {
                let mut best = prev_pos;
                let mut best_dist = 0.0_f64;
                for road in &candidate_roads {
                    let clamped = road.clamp(ideal_next);
                    let dist = prev_pos.distance(clamped);
                    if dist > best_dist {
                        best_dist = dist;
                        best = clamped;
                    }
                }
                new_pos = best;
                should_stop = true;
            }

            dog.position = new_pos;
            if should_stop {
                dog.stop();
            }
            dog.last_tick_segment = TickSegment { start: prev_pos, end: new_pos };
        }

        self.resolve_gathers();
    }

    fn resolve_gathers(&mut self) {
        let mut dog_ids: Vec<u64> = self.dogs.keys().copied().collect();
        dog_ids.sort_unstable();

        let gatherers: Vec<Gatherer> = dog_ids
            .iter()
            .map(|id| {
                let dog = &self.dogs[id];
                Gatherer {
                    start: dog.last_tick_segment.start,
                    end: dog.last_tick_segment.end,
                    width: dog.width(),
                }
            })
            .collect();

        // Items: live loot objects first, then offices -- order doesn't affect
        // correctness (events are sorted by parameter/indices), but keeping it
        // stable makes item_index deterministic for a fixed loot/office set.
        let mut loot_ids: Vec<u64> = self.loot.keys().copied().collect();
        loot_ids.sort_unstable();

        let mut items: Vec<Item> = Vec::with_capacity(loot_ids.len() + self.map.offices().len());
        for id in &loot_ids {
            let loot = &self.loot[id];
            items.push(Item {
                kind: ItemKind::Loot,
                position: loot.position,
                width: LOOT_WIDTH,
            });
        }
        for office in self.map.offices() {
            items.push(Item {
                kind: ItemKind::Office,
                position: office.position.into(),
                width: OFFICE_WIDTH,
            });
        }

        let events = find_gather_events(&gatherers, &items);
        let loot_item_count = loot_ids.len();

        for event in events {
            let dog_id = dog_ids[event.gatherer_index];

            if event.item_index < loot_item_count {
                let loot_id = loot_ids[event.item_index];
                let Some(loot) = self.loot.get(&loot_id).copied() else {
                    continue; // already picked up earlier this tick
                };
                let dog = self.dogs.get_mut(&dog_id).expect("gatherer index maps to a live dog");
                if dog.bag.is_full() {
                    continue; // dropped: item stays on the ground
                }
                self.loot.remove(&loot_id);
                let dog = self.dogs.get_mut(&dog_id).expect("gatherer index maps to a live dog");
                dog.bag.push(loot);
                dog.score += loot.value;
            } else {
                let dog = self.dogs.get_mut(&dog_id).expect("gatherer index maps to a live dog");
                dog.bag.empty();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Map, Office, Road};

    fn map_with_road() -> Arc<Map> {
        let mut map = Map::new("m1", "Map 1", 1.0, 3);
        map.add_road(Road::horizontal(Point::new(0, 0), 10));
        map.build_road_index();
        Arc::new(map)
    }

    #[test]
    fn tick_zero_is_a_no_op() {
        let map = map_with_road();
        let mut session = Session::new(map, 1000.0, 0.5);
        let dog = Dog::new(1, PointDouble::new(1.0, 0.0), 3, 1.0);
        session.add_dog(dog);
        session.dog_mut(1).unwrap().set_direction("R").unwrap();

        session.update_dogs_positions(0.0);
        assert_eq!(session.dog(1).unwrap().position, PointDouble::new(1.0, 0.0));
    }

    #[test]
    fn move_and_stop_at_wall() {
        let map = map_with_road();
        let mut session = Session::new(map, 1000.0, 0.5);
        let dog = Dog::new(1, PointDouble::new(0.0, 0.0), 3, 1.0);
        session.add_dog(dog);
        session.dog_mut(1).unwrap().set_direction("R").unwrap();

        session.update_dogs_positions(0.5);
        assert_eq!(session.dog(1).unwrap().position, PointDouble::new(0.5, 0.0));
        assert_eq!(session.dog(1).unwrap().velocity, PointDouble::new(1.0, 0.0));

        for _ in 0..20 {
            session.update_dogs_positions(1.0);
        }
        let dog = session.dog(1).unwrap();
        assert!((dog.position.x - 10.4).abs() < 1e-9);
        assert_eq!(dog.velocity, PointDouble::new(0.0, 0.0));
        assert_eq!(dog.direction, crate::dog::Direction::West);
    }

    #[test]
    fn pickup_then_bank_in_separate_ticks() {
        let mut map = Map::new("m1", "Map 1", 1.0, 3);
        map.add_road(Road::horizontal(Point::new(0, 0), 10));
        map.add_office(Office {
            id: "o1".into(),
            position: Point::new(4, 0),
            offset_x: 0,
            offset_y: 0,
        })
        .unwrap();
        map.build_road_index();
        let map = Arc::new(map);

        let mut session = Session::new(map, 1000.0, 0.5);
        session.insert_loot(LootObject {
            id: 100,
            loot_type: 0,
            value: 5,
            position: PointDouble::new(2.0, 0.0),
        });
        let dog = Dog::new(1, PointDouble::new(1.0, 0.0), 3, 1.0);
        session.add_dog(dog);
        session.dog_mut(1).unwrap().set_direction("R").unwrap();

        session.update_dogs_positions(2.0); // 1.0 -> 3.0, passes through (2,0)
        assert_eq!(session.loot_objects().count(), 0);
        let dog = session.dog(1).unwrap();
        assert_eq!(dog.score, 5);
        assert_eq!(dog.bag.items.len(), 1);

        session.update_dogs_positions(2.0); // 3.0 -> 5.0, passes through office at (4,0)
        let dog = session.dog(1).unwrap();
        assert_eq!(dog.score, 5);
        assert!(dog.bag.items.is_empty());
    }

    #[test]
    fn full_bag_drops_subsequent_loot_same_tick() {
        let mut map = Map::new("m1", "Map 1", 1.0, 1);
        map.add_road(Road::horizontal(Point::new(0, 0), 10));
        map.build_road_index();
        let map = Arc::new(map);

        let mut session = Session::new(map, 1000.0, 0.5);
        session.insert_loot(LootObject { id: 1, loot_type: 0, value: 1, position: PointDouble::new(2.0, 0.0) });
        session.insert_loot(LootObject { id: 2, loot_type: 0, value: 1, position: PointDouble::new(4.0, 0.0) });
        let dog = Dog::new(1, PointDouble::new(0.0, 0.0), 1, 1.0);
        session.add_dog(dog);
        session.dog_mut(1).unwrap().set_direction("R").unwrap();

        session.update_dogs_positions(5.0);
        let dog = session.dog(1).unwrap();
        assert_eq!(dog.bag.items.len(), 1);
        assert_eq!(session.loot_objects().count(), 1);
    }
}

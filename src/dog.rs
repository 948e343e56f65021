//! Avatar ("dog") entity (§3, §4.E).

use serde::{Deserialize, Serialize};

use crate::errors::{GameError, GameResult};
use crate::geometry::PointDouble;
use crate::loot::LootObject;
use crate::map::DOG_WIDTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// The wire token this direction is reported back as (§4.E `GetDirection`).
    pub fn as_token(self) -> &'static str {
        match self {
            Direction::North => "U",
            Direction::South => "D",
            Direction::West => "R",
            Direction::East => "L",
        }
    }
}

/// Bounded, ordered carry of loot objects. A carried item is the same
/// `LootObject` record that lived on the map, just relocated into the bag --
/// its value and position are preserved for snapshotting (§4.I).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bag {
    pub capacity: usize,
    pub items: Vec<LootObject>,
}

impl Bag {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            items: Vec::new(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn push(&mut self, item: LootObject) {
        debug_assert!(!self.is_full(), "pushed into a full bag");
        self.items.push(item);
    }

    pub fn empty(&mut self) {
        self.items.clear();
    }
}

/// The continuous-motion record the gather detector consumes: where the dog
/// was and where it ended up during the tick just completed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TickSegment {
    pub start: PointDouble,
    pub end: PointDouble,
}

/// A player's in-world entity: position, velocity, facing, bag, and score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dog {
    pub id: u64,
    pub position: PointDouble,
    pub velocity: PointDouble,
    pub direction: Direction,
    pub speed_value: f64,
    pub bag: Bag,
    pub score: i32,
    pub last_tick_segment: TickSegment,
}

impl Dog {
    pub fn new(id: u64, position: PointDouble, bag_capacity: usize, speed_value: f64) -> Self {
        Self {
            id,
            position,
            velocity: PointDouble::new(0.0, 0.0),
            direction: Direction::North,
            speed_value,
            bag: Bag::new(bag_capacity),
            score: 0,
            last_tick_segment: TickSegment { start: position, end: position },
        }
    }

    pub fn width(&self) -> f64 {
        DOG_WIDTH
    }

    /// Sets facing/velocity from a direction token (§4.E). `""` stops the dog
    /// without changing its facing. Any other token is `BadAction`.
    pub fn set_direction(&mut self, token: &str) -> GameResult<()> {
        match token {
            "U" => {
                self.direction = Direction::North;
                self.velocity = PointDouble::new(0.0, -self.speed_value);
            }
            "D" => {
                self.direction = Direction::South;
                self.velocity = PointDouble::new(0.0, self.speed_value);
            }
            // Note the non-obvious mapping: "L" steers EAST, "R" steers WEST.
            // This is the contract clients rely on; preserved verbatim.
            "L" => {
                self.direction = Direction::East;
                self.velocity = PointDouble::new(-self.speed_value, 0.0);
            }
            "R" => {
                self.direction = Direction::West;
                self.velocity = PointDouble::new(self.speed_value, 0.0);
            }
            "" => {
                self.velocity = PointDouble::new(0.0, 0.0);
            }
            other => return Err(GameError::BadAction(other.to_string())),
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        self.velocity = PointDouble::new(0.0, 0.0);
    }
}

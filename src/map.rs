//! Road graph and per-map static world (§4.B).
//!
//! A [`Map`] is built once at load time via the `add_*` builders and
//! [`Map::build_road_index`], then treated as immutable for the remainder of the
//! process -- the only interior mutability left is the spawn-position PRNG, which
//! is a separate stream per map (§4.H/§9) and doesn't change what a `Map` *means*.

use std::collections::HashMap;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::errors::{GameError, GameResult};
use crate::geometry::{Point, PointDouble};

/// Half the width of a road, extended on each side of its centerline.
pub const ROAD_HALF_WIDTH: f64 = 0.4;
/// Width used for an office as a gather-detector item.
pub const OFFICE_WIDTH: f64 = 0.5;
/// Width used for a loot object as a gather-detector item -- a point target.
pub const LOOT_WIDTH: f64 = 0.0;
/// Width used for a dog as a gather-detector gatherer.
pub const DOG_WIDTH: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoadOrientation {
    Horizontal,
    Vertical,
}

/// A closed axis-aligned segment between two lattice points, widened by
/// [`ROAD_HALF_WIDTH`] on every side to form the legal travel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Road {
    pub start: Point,
    pub end: Point,
}

impl Road {
    pub fn horizontal(start: Point, end_x: i32) -> Self {
        Self {
            start,
            end: Point::new(end_x, start.y),
        }
    }

    pub fn vertical(start: Point, end_y: i32) -> Self {
        Self {
            start,
            end: Point::new(start.x, end_y),
        }
    }

    pub fn orientation(&self) -> RoadOrientation {
        if self.start.y == self.end.y {
            RoadOrientation::Horizontal
        } else {
            RoadOrientation::Vertical
        }
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self.orientation(), RoadOrientation::Horizontal)
    }

    pub fn is_vertical(&self) -> bool {
        matches!(self.orientation(), RoadOrientation::Vertical)
    }

    /// The rectangle this road occupies, as (min_x, max_x, min_y, max_y), already
    /// widened by `ROAD_HALF_WIDTH` and normalized regardless of start/end order.
    fn rect(&self) -> (f64, f64, f64, f64) {
        let w = ROAD_HALF_WIDTH;
        match self.orientation() {
            RoadOrientation::Horizontal => {
                let (x0, x1) = (self.start.x.min(self.end.x), self.start.x.max(self.end.x));
                let y = self.start.y;
                (x0 as f64 - w, x1 as f64 + w, y as f64 - w, y as f64 + w)
            }
            RoadOrientation::Vertical => {
                let (y0, y1) = (self.start.y.min(self.end.y), self.start.y.max(self.end.y));
                let x = self.start.x;
                (x as f64 - w, x as f64 + w, y0 as f64 - w, y1 as f64 + w)
            }
        }
    }

    /// Closed-interval inclusion test against the widened rectangle.
    pub fn is_on_area(&self, p: PointDouble) -> bool {
        let (min_x, max_x, min_y, max_y) = self.rect();
        (min_x..=max_x).contains(&p.x) && (min_y..=max_y).contains(&p.y)
    }

    /// Projects `p` into the widened rectangle by clamping each coordinate.
    pub fn clamp(&self, p: PointDouble) -> PointDouble {
        let (min_x, max_x, min_y, max_y) = self.rect();
        PointDouble::new(p.x.clamp(min_x, max_x), p.y.clamp(min_y, max_y))
    }

    /// A uniformly-random point on the road's centerline (lattice-aligned on the
    /// perpendicular axis), used by `random_spawn`.
    fn random_point_on_line(&self, rng: &mut StdRng) -> PointDouble {
        match self.orientation() {
            RoadOrientation::Horizontal => {
                let (x0, x1) = (self.start.x.min(self.end.x), self.start.x.max(self.end.x));
                let x = rng.gen_range(x0 as f64..=x1 as f64);
                PointDouble::new(x, self.start.y as f64)
            }
            RoadOrientation::Vertical => {
                let (y0, y1) = (self.start.y.min(self.end.y), self.start.y.max(self.end.y));
                let y = rng.gen_range(y0 as f64..=y1 as f64);
                PointDouble::new(self.start.x as f64, y)
            }
        }
    }

    /// A uniformly-random point inside the road's full widened rectangle, used
    /// by `random_position` (loot spawning).
    fn random_point_in_rect(&self, rng: &mut StdRng) -> PointDouble {
        let (min_x, max_x, min_y, max_y) = self.rect();
        PointDouble::new(rng.gen_range(min_x..=max_x), rng.gen_range(min_y..=max_y))
    }
}

/// Axis-aligned rectangle. Advisory only -- never consulted by the simulation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Building {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// A base: a drop-off point where a dog's bag is emptied and its value banked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Office {
    pub id: String,
    pub position: Point,
    pub offset_x: i32,
    pub offset_y: i32,
}

/// A row in the per-map loot presentation/value table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LootType {
    pub name: String,
    pub file: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<i32>,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    pub value: i32,
}

/// Memoized coarse lookup from a lattice point's coordinate to the road that
/// covers it -- at most one horizontal and one vertical match (§3). Later
/// insertion wins; it is a filter only, still validated against the road
/// rectangle by callers.
#[derive(Debug, Default)]
struct RoadIndex {
    horizontal: HashMap<i32, usize>,
    vertical: HashMap<i32, usize>,
}

impl RoadIndex {
    fn build(roads: &[Road]) -> Self {
        let mut index = RoadIndex::default();
        for (i, road) in roads.iter().enumerate() {
            match road.orientation() {
                RoadOrientation::Horizontal => {
                    index.horizontal.insert(road.start.y, i);
                }
                RoadOrientation::Vertical => {
                    index.vertical.insert(road.start.x, i);
                }
            }
        }
        index
    }

    /// Horizontal candidate first, then vertical (§4.B ordering contract).
    fn lookup(&self, p: Point) -> Vec<usize> {
        let mut out = Vec::with_capacity(2);
        if let Some(&idx) = self.horizontal.get(&p.y) {
            out.push(idx);
        }
        if let Some(&idx) = self.vertical.get(&p.x) {
            out.push(idx);
        }
        out
    }
}

/// The static, per-map world: roads, buildings, offices, and the loot-type table.
pub struct Map {
    pub id: String,
    pub name: String,
    roads: Vec<Road>,
    buildings: Vec<Building>,
    offices: Vec<Office>,
    office_ids: std::collections::HashSet<String>,
    loot_types: Vec<LootType>,
    pub dog_speed: f64,
    pub bag_capacity: usize,
    road_index: RoadIndex,
    spawn_rng: Mutex<StdRng>,
}

impl Map {
    pub fn new(id: impl Into<String>, name: impl Into<String>, dog_speed: f64, bag_capacity: usize) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            roads: Vec::new(),
            buildings: Vec::new(),
            offices: Vec::new(),
            office_ids: std::collections::HashSet::new(),
            loot_types: Vec::new(),
            dog_speed,
            bag_capacity,
            road_index: RoadIndex::default(),
            spawn_rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn add_road(&mut self, road: Road) {
        self.roads.push(road);
    }

    pub fn add_building(&mut self, building: Building) {
        self.buildings.push(building);
    }

    /// Fails with `DuplicateOffice` on a repeated id. Atomic: either both the
    /// vector push and the id-set insertion happen, or neither does.
    pub fn add_office(&mut self, office: Office) -> GameResult<()> {
        if self.office_ids.contains(&office.id) {
            return Err(GameError::DuplicateOffice(office.id));
        }
        self.office_ids.insert(office.id.clone());
        self.offices.push(office);
        Ok(())
    }

    pub fn add_loot_type(&mut self, loot_type: LootType) {
        self.loot_types.push(loot_type);
    }

    /// Must be called once after all roads have been added; memoizes the
    /// lattice-coordinate lookup maps.
    pub fn build_road_index(&mut self) {
        self.road_index = RoadIndex::build(&self.roads);
    }

    pub fn roads(&self) -> &[Road] {
        &self.roads
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn offices(&self) -> &[Office] {
        &self.offices
    }

    pub fn loot_types(&self) -> &[LootType] {
        &self.loot_types
    }

    pub fn loot_type(&self, index: usize) -> Option<&LootType> {
        self.loot_types.get(index)
    }

    /// Returns at most two candidate roads (horizontal first, then vertical).
    pub fn roads_at(&self, p: Point) -> Vec<Road> {
        self.road_index.lookup(p).into_iter().map(|i| self.roads[i]).collect()
    }

    /// Picks a uniform-random road, then a uniform-random point on its centerline.
    pub fn random_spawn(&self) -> GameResult<PointDouble> {
        if self.roads.is_empty() {
            return Err(GameError::NoRoads);
        }
        let mut rng = self.spawn_rng.lock().expect("spawn rng mutex poisoned");
        let idx = rng.gen_range(0..self.roads.len());
        Ok(self.roads[idx].random_point_on_line(&mut rng))
    }

    /// The start of road index 0.
    pub fn start_spawn(&self) -> GameResult<PointDouble> {
        self.roads.first().map(|r| r.start.into()).ok_or(GameError::NoRoads)
    }

    /// Picks a uniform-random road, then a uniform-random point in its full
    /// widened rectangle (used to scatter loot across the travel surface).
    pub fn random_position(&self) -> GameResult<PointDouble> {
        if self.roads.is_empty() {
            return Err(GameError::NoRoads);
        }
        let mut rng = self.spawn_rng.lock().expect("spawn rng mutex poisoned");
        let idx = rng.gen_range(0..self.roads.len());
        Ok(self.roads[idx].random_point_in_rect(&mut rng))
    }

    /// Uniform over the loot-type table; returns (type index, value).
    pub fn random_loot_type(&self) -> GameResult<(usize, i32)> {
        if self.loot_types.is_empty() {
            return Err(GameError::NoLootTypes);
        }
        let mut rng = self.spawn_rng.lock().expect("spawn rng mutex poisoned");
        let idx = rng.gen_range(0..self.loot_types.len());
        Ok((idx, self.loot_types[idx].value))
    }
}

impl std::fmt::Debug for Map {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Map")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("roads", &self.roads.len())
            .field("offices", &self.offices.len())
            .finish()
    }
}

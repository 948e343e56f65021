//! Loot object representation, shared between a session's ground-loot table
//! (§3 `LootObject`) and a dog's bag -- a carried item is the same record,
//! just relocated from the map into the bag.

use serde::{Deserialize, Serialize};

use crate::geometry::PointDouble;

/// A stable-id, point-width item: either lying on the map or carried in a bag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LootObject {
    pub id: u64,
    #[serde(rename = "type")]
    pub loot_type: usize,
    pub value: i32,
    pub position: PointDouble,
}

//! Collision / gather detector (§4.D).
//!
//! Couples moving gatherers (avatars' last-tick line segments) with stationary
//! items (loot objects and offices) via closest-approach-point geometry, and
//! returns the ordered list of pickup/base-touch events for one tick.

use crate::geometry::PointDouble;

/// One gatherer's motion during a single tick.
#[derive(Debug, Clone, Copy)]
pub struct Gatherer {
    pub start: PointDouble,
    pub end: PointDouble,
    pub width: f64,
}

/// Discriminates what kind of stationary item a gather event touched, so
/// callers can apply bank-vs-pickup semantics without a runtime type check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Loot,
    Office,
}

/// A stationary target for the gather detector.
#[derive(Debug, Clone, Copy)]
pub struct Item {
    pub kind: ItemKind,
    pub position: PointDouble,
    pub width: f64,
}

/// One (gatherer, item) pair within collision range during this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatherEvent {
    pub gatherer_index: usize,
    pub item_index: usize,
    pub squared_distance: f64,
    /// Position along the gatherer's segment (`[0, 1]`) where closest approach occurred.
    pub parameter: f64,
}

/// Runs the detector over every (gatherer, item) pair and returns events sorted
/// by `parameter` ascending, ties broken by `(gatherer_index, item_index)`.
/// Gatherers with a zero-length segment contribute no events.
pub fn find_gather_events(gatherers: &[Gatherer], items: &[Item]) -> Vec<GatherEvent> {
    let mut events = Vec::new();

    for (gi, gatherer) in gatherers.iter().enumerate() {
        let u = gatherer.end - gatherer.start;
        if u.x == 0.0 && u.y == 0.0 {
            continue;
        }
        let uu = u.dot(u);

        for (ii, item) in items.iter().enumerate() {
            let w = item.position - gatherer.start;
            let t = (u.dot(w) / uu).clamp(0.0, 1.0);
            let q = gatherer.start + u.scale(t);
            let d2 = q.squared_distance(item.position);
            let threshold = gatherer.width + item.width;
            if d2 <= threshold * threshold {
                events.push(GatherEvent {
                    gatherer_index: gi,
                    item_index: ii,
                    squared_distance: d2,
                    parameter: t,
                });
            }
        }
    }

    events.sort_by(|a, b| {
        a.parameter
            .partial_cmp(&b.parameter)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.gatherer_index.cmp(&b.gatherer_index))
            .then(a.item_index.cmp(&b.item_index))
    });

    events
}

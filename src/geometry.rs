//! Geometry primitives shared by the road graph, avatars, and the gather detector.

use serde::{Deserialize, Serialize};

/// A point on the integer lattice the road network is defined over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A continuous-valued point used for avatar and loot positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointDouble {
    pub x: f64,
    pub y: f64,
}

impl PointDouble {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Nearest-integer rounding, ties away from zero (matches `f64::round`).
    pub fn round(self) -> Point {
        Point::new(self.x.round() as i32, self.y.round() as i32)
    }

    pub fn distance(self, other: PointDouble) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn squared_distance(self, other: PointDouble) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn scale(self, k: f64) -> PointDouble {
        PointDouble::new(self.x * k, self.y * k)
    }

    pub fn dot(self, other: PointDouble) -> f64 {
        self.x * other.x + self.y * other.y
    }
}

impl std::ops::Add for PointDouble {
    type Output = PointDouble;
    fn add(self, other: PointDouble) -> PointDouble {
        PointDouble::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for PointDouble {
    type Output = PointDouble;
    fn sub(self, other: PointDouble) -> PointDouble {
        PointDouble::new(self.x - other.x, self.y - other.y)
    }
}

impl From<Point> for PointDouble {
    fn from(p: Point) -> Self {
        PointDouble::new(p.x as f64, p.y as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_ties_away_from_zero() {
        assert_eq!(PointDouble::new(2.5, -2.5).round(), Point::new(3, -3));
        assert_eq!(PointDouble::new(0.4, 0.0).round(), Point::new(0, 0));
    }

    #[test]
    fn distance_is_euclidean() {
        let a = PointDouble::new(0.0, 0.0);
        let b = PointDouble::new(3.0, 4.0);
        assert_eq!(a.distance(b), 5.0);
    }
}

//! Capacity-bounded curve point buffer

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::geometry::GeometryMapping;
use crate::consts::POINT_THRESHOLD;

/// A sampled curve point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Surface position (logical px)
    pub pos: DVec2,
    /// Multiplier this point represents
    pub multiplier: f64,
    /// Time since round start when sampled (ms)
    pub elapsed_ms: f64,
}

impl Point {
    pub fn new(pos: DVec2, multiplier: f64, elapsed_ms: f64) -> Self {
        Self {
            pos,
            multiplier,
            elapsed_ms,
        }
    }
}

/// What a sample did to the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    Appended,
    Amended,
}

/// Chronological curve points, oldest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointBuffer {
    points: Vec<Point>,
    capacity: usize,
}

impl PointBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: Vec::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Record a new sample.
    ///
    /// The first point of a round is an anchor and is never moved. After
    /// it, the newest point slides with each sample until the multiplier has
    /// risen more than `POINT_THRESHOLD` past the last committed point
    /// (the one before the head); then the sample is appended as a new head.
    pub fn sample(&mut self, point: Point) -> SampleOutcome {
        let len = self.points.len();
        let outcome = if len < 2 {
            self.points.push(point);
            SampleOutcome::Appended
        } else if point.multiplier - self.points[len - 2].multiplier <= POINT_THRESHOLD {
            self.points[len - 1] = point;
            SampleOutcome::Amended
        } else {
            self.points.push(point);
            SampleOutcome::Appended
        };

        if self.points.len() > self.capacity {
            let excess = self.points.len() - self.capacity;
            self.points.drain(..excess);
        }
        outcome
    }

    /// Unconditionally append (used for the round's anchor point)
    pub fn push(&mut self, point: Point) {
        self.points.push(point);
        if self.points.len() > self.capacity {
            self.points.remove(0);
        }
    }

    /// Carry every point from `from` into `to`
    pub fn rescale(&mut self, from: &GeometryMapping, to: &GeometryMapping) {
        for point in &mut self.points {
            point.pos = to.rescale_from(point.pos, from);
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn head(&self) -> Option<&Point> {
        self.points.last()
    }

    pub fn as_slice(&self) -> &[Point] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }

    /// Positions only, oldest first
    pub fn positions(&self) -> Vec<DVec2> {
        self.points.iter().map(|p| p.pos).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Padding;
    use crate::sim::geometry::Viewport;
    use proptest::prelude::*;

    fn point(m: f64) -> Point {
        Point::new(DVec2::new(m * 10.0, 100.0 - m), m, 0.0)
    }

    #[test]
    fn test_first_sample_appends() {
        let mut buffer = PointBuffer::new(10);
        assert_eq!(buffer.sample(point(1.0)), SampleOutcome::Appended);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_anchor_is_never_amended() {
        let mut buffer = PointBuffer::new(10);
        buffer.sample(point(1.0));
        assert_eq!(buffer.sample(point(1.001)), SampleOutcome::Appended);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.as_slice()[0].multiplier, 1.0);
    }

    #[test]
    fn test_head_slides_until_past_committed_point() {
        let mut buffer = PointBuffer::new(10);
        buffer.sample(point(1.0));
        buffer.sample(point(1.002));

        // Gains are measured from the anchor, not the moving head
        assert_eq!(buffer.sample(point(1.004)), SampleOutcome::Amended);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.head().unwrap().multiplier, 1.004);

        assert_eq!(buffer.sample(point(1.006)), SampleOutcome::Appended);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.as_slice()[1].multiplier, 1.004);
    }

    #[test]
    fn test_tiny_steps_still_commit_points() {
        // 0.001 per sample never beats the threshold frame to frame
        let mut buffer = PointBuffer::new(100);
        for i in 0..=100 {
            buffer.sample(point(1.0 + i as f64 * 0.001));
        }
        assert!(buffer.len() > 10);
        assert_eq!(buffer.as_slice()[0].multiplier, 1.0);
        let ms: Vec<f64> = buffer.iter().map(|p| p.multiplier).collect();
        assert!(ms.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_cap_drops_oldest() {
        let mut buffer = PointBuffer::new(3);
        for i in 0..6 {
            buffer.sample(point(1.0 + i as f64 * 0.1));
        }
        assert_eq!(buffer.len(), 3);
        let ms: Vec<f64> = buffer.iter().map(|p| p.multiplier).collect();
        assert!((ms[0] - 1.3).abs() < 1e-9);
        assert!((ms[2] - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_rescale_all_points() {
        let padding = Padding::uniform(20.0);
        let old = GeometryMapping::new(Viewport::new(240.0, 240.0, 1.0), padding);
        let new = GeometryMapping::new(Viewport::new(440.0, 440.0, 1.0), padding);

        let mut buffer = PointBuffer::new(10);
        buffer.push(Point::new(DVec2::new(100.0, 60.0), 1.5, 10.0));
        buffer.rescale(&old, &new);

        let p = buffer.head().unwrap();
        assert!((p.pos.x - 180.0).abs() < 1e-9);
        assert!((p.pos.y - 100.0).abs() < 1e-9);
        assert_eq!(p.multiplier, 1.5);
    }

    proptest! {
        #[test]
        fn prop_len_never_exceeds_capacity(
            capacity in 1usize..50,
            gains in proptest::collection::vec(0.0f64..0.05, 0..300),
        ) {
            let mut buffer = PointBuffer::new(capacity);
            let mut m = 1.0;
            for gain in gains {
                m += gain;
                buffer.sample(point(m));
                prop_assert!(buffer.len() <= capacity);
            }
        }
    }
}

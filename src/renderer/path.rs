//! Curve path construction
//!
//! Smoothing uses midpoint quadratic interpolation: every interior point
//! becomes a control point and each segment ends halfway to the next point,
//! so consecutive segments share a tangent and the curve has no corners.

use glam::DVec2;

use super::surface::Surface;
use crate::consts::COLLAPSE_DEPTH;
use crate::ease_out_cubic;

/// One path command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(DVec2),
    LineTo(DVec2),
    QuadTo { control: DVec2, end: DVec2 },
}

impl PathSegment {
    /// Where the pen sits after this segment
    pub fn end(&self) -> DVec2 {
        match *self {
            PathSegment::MoveTo(p) | PathSegment::LineTo(p) => p,
            PathSegment::QuadTo { end, .. } => end,
        }
    }
}

/// Smooth path through `points` (starts on the first, ends on the last)
pub fn smooth_path(points: &[DVec2]) -> Vec<PathSegment> {
    let Some(&first) = points.first() else {
        return Vec::new();
    };

    let mut segments = Vec::with_capacity(points.len() + 1);
    segments.push(PathSegment::MoveTo(first));

    for pair in points[1..].windows(2) {
        segments.push(PathSegment::QuadTo {
            control: pair[0],
            end: (pair[0] + pair[1]) * 0.5,
        });
    }
    if points.len() > 1 {
        segments.push(PathSegment::LineTo(points[points.len() - 1]));
    }
    segments
}

/// Replay path segments onto a surface (does not begin or close the path)
pub fn trace<S: Surface + ?Sized>(surface: &mut S, segments: &[PathSegment]) {
    for segment in segments {
        match *segment {
            PathSegment::MoveTo(p) => surface.move_to(p),
            PathSegment::LineTo(p) => surface.line_to(p),
            PathSegment::QuadTo { control, end } => surface.quadratic_to(control, end),
        }
    }
}

/// Post-crash collapse of the curve.
///
/// `progress` is the linear collapse time in [0, 1]. Each point drops by
/// `age * depth * ease_out_cubic(progress)`, where age runs from 1 for the
/// oldest point to 0 for the head, and never passes `floor_y`.
pub fn collapse(points: &[DVec2], floor_y: f64, graph_height: f64, progress: f64) -> Vec<DVec2> {
    let eased = ease_out_cubic(progress);
    let depth = graph_height * COLLAPSE_DEPTH * eased;
    let last = points.len().saturating_sub(1).max(1) as f64;

    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let age = if points.len() > 1 {
                1.0 - i as f64 / last
            } else {
                0.0
            };
            DVec2::new(p.x, (p.y + age * depth).min(floor_y.max(p.y)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<DVec2> {
        coords.iter().map(|&(x, y)| DVec2::new(x, y)).collect()
    }

    #[test]
    fn test_smooth_path_degenerate_inputs() {
        assert!(smooth_path(&[]).is_empty());

        let single = smooth_path(&pts(&[(1.0, 2.0)]));
        assert_eq!(single, vec![PathSegment::MoveTo(DVec2::new(1.0, 2.0))]);

        let pair = smooth_path(&pts(&[(0.0, 0.0), (10.0, 0.0)]));
        assert_eq!(
            pair,
            vec![
                PathSegment::MoveTo(DVec2::ZERO),
                PathSegment::LineTo(DVec2::new(10.0, 0.0)),
            ]
        );
    }

    #[test]
    fn test_smooth_path_uses_midpoints() {
        let points = pts(&[(0.0, 0.0), (10.0, 0.0), (20.0, 10.0), (30.0, 10.0)]);
        let path = smooth_path(&points);
        assert_eq!(
            path,
            vec![
                PathSegment::MoveTo(points[0]),
                PathSegment::QuadTo {
                    control: points[1],
                    end: DVec2::new(15.0, 5.0),
                },
                PathSegment::QuadTo {
                    control: points[2],
                    end: DVec2::new(25.0, 10.0),
                },
                PathSegment::LineTo(points[3]),
            ]
        );
        assert_eq!(path.last().unwrap().end(), points[3]);
    }

    #[test]
    fn test_collapse_at_start_is_identity() {
        let points = pts(&[(0.0, 100.0), (10.0, 80.0), (20.0, 50.0)]);
        assert_eq!(collapse(&points, 120.0, 100.0, 0.0), points);
    }

    #[test]
    fn test_collapse_older_points_fall_further() {
        let points = pts(&[(0.0, 10.0), (10.0, 10.0), (20.0, 10.0)]);
        let fallen = collapse(&points, 1000.0, 100.0, 1.0);
        // Oldest drops the full depth, head stays put
        assert!((fallen[0].y - 70.0).abs() < 1e-9);
        assert!((fallen[1].y - 40.0).abs() < 1e-9);
        assert_eq!(fallen[2].y, 10.0);
        assert!(fallen.iter().zip(&points).all(|(a, b)| a.x == b.x));
    }

    #[test]
    fn test_collapse_clamps_to_floor() {
        let points = pts(&[(0.0, 90.0), (10.0, 50.0)]);
        let fallen = collapse(&points, 100.0, 100.0, 1.0);
        assert_eq!(fallen[0].y, 100.0);
    }

    #[test]
    fn test_collapse_holds_after_duration() {
        let points = pts(&[(0.0, 10.0), (10.0, 10.0)]);
        assert_eq!(
            collapse(&points, 500.0, 100.0, 1.0),
            collapse(&points, 500.0, 100.0, 7.0)
        );
    }
}

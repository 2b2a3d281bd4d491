//! Region-of-interest polygon.

use crate::error::RoiError;
use crate::tracker::Point;

/// Tolerance for treating a point as lying on an ROI edge.
const EDGE_EPSILON: f64 = 1e-9;

/// Closed polygon in image coordinates, immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Roi {
    vertices: Vec<Point>,
}

impl Roi {
    pub fn new(vertices: Vec<Point>) -> Result<Self, RoiError> {
        if vertices.len() < 3 {
            return Err(RoiError::TooFewPoints(vertices.len()));
        }
        if let Some(index) = vertices.iter().position(|p| !p.is_finite()) {
            return Err(RoiError::NonFinite(index));
        }
        let roi = Self { vertices };
        if roi.area() == 0.0 {
            return Err(RoiError::ZeroArea);
        }
        Ok(roi)
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Unsigned shoelace area.
    pub fn area(&self) -> f64 {
        let twice: f64 = self
            .edges()
            .map(|(a, b)| a.0 * b.1 - b.0 * a.1)
            .sum();
        twice.abs() / 2.0
    }

    /// Strict containment: points on the boundary are outside.
    pub fn contains(&self, point: &Point) -> bool {
        if !point.is_finite() {
            return false;
        }
        let (x, y) = (point.x as f64, point.y as f64);

        let mut inside = false;
        for (a, b) in self.edges() {
            if on_segment((x, y), a, b) {
                return false;
            }
            if (a.1 > y) != (b.1 > y) && x < (b.0 - a.0) * (y - a.1) / (b.1 - a.1) + a.0 {
                inside = !inside;
            }
        }
        inside
    }

    fn edges(&self) -> impl Iterator<Item = ((f64, f64), (f64, f64))> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            ((a.x as f64, a.y as f64), (b.x as f64, b.y as f64))
        })
    }
}

fn on_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> bool {
    let cross = (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0);
    let scale = (b.0 - a.0).abs().max((b.1 - a.1).abs()).max(1.0);
    if cross.abs() > EDGE_EPSILON * scale {
        return false;
    }
    p.0 >= a.0.min(b.0) && p.0 <= a.0.max(b.0) && p.1 >= a.1.min(b.1) && p.1 <= a.1.max(b.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Roi {
        Roi::new(vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_contains() {
        let roi = square();
        assert!(roi.contains(&Point::new(50.0, 50.0)));
        assert!(!roi.contains(&Point::new(50.0, -10.0)));
        assert!(!roi.contains(&Point::new(50.0, 120.0)));
        assert!(!roi.contains(&Point::new(150.0, 50.0)));
    }

    #[test]
    fn test_boundary_is_outside() {
        let roi = square();
        assert!(!roi.contains(&Point::new(0.0, 50.0)));
        assert!(!roi.contains(&Point::new(100.0, 100.0)));
        assert!(!roi.contains(&Point::new(50.0, 0.0)));
    }

    #[test]
    fn test_concave_polygon() {
        // U shape opening upward.
        let roi = Roi::new(vec![
            Point::new(0.0, 0.0),
            Point::new(30.0, 0.0),
            Point::new(30.0, 20.0),
            Point::new(70.0, 20.0),
            Point::new(70.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ])
        .unwrap();
        assert!(!roi.contains(&Point::new(50.0, 10.0)));
        assert!(roi.contains(&Point::new(15.0, 10.0)));
        assert!(roi.contains(&Point::new(50.0, 60.0)));
    }

    #[test]
    fn test_invalid_polygons() {
        assert_eq!(
            Roi::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]),
            Err(RoiError::TooFewPoints(2))
        );
        assert_eq!(
            Roi::new(vec![
                Point::new(0.0, 0.0),
                Point::new(f32::NAN, 0.0),
                Point::new(0.0, 1.0)
            ]),
            Err(RoiError::NonFinite(1))
        );
        assert_eq!(
            Roi::new(vec![
                Point::new(0.0, 0.0),
                Point::new(1.0, 1.0),
                Point::new(2.0, 2.0)
            ]),
            Err(RoiError::ZeroArea)
        );
    }

    #[test]
    fn test_area() {
        assert_eq!(square().area(), 10_000.0);
    }
}

use nalgebra::{Point2, Rotation2, Vector2};

/// Axis-aligned rectangular bounds in model space.
///
/// Used both for shape-segment geometry and for the externally supplied motion
/// bounds that wandering molecules must stay inside. A `Rect` with zero height
/// is valid and represents a flat segment's footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl Rect {
    pub fn new(min: Point2<f64>, max: Point2<f64>) -> Self {
        Self { min, max }
    }

    /// A degenerate rectangle collapsed onto a single point.
    pub fn at_point(p: Point2<f64>) -> Self {
        Self { min: p, max: p }
    }

    pub fn from_center(center: Point2<f64>, width: f64, height: f64) -> Self {
        let half = Vector2::new(width / 2.0, height / 2.0);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point2<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Containment is inclusive on all edges, so a zero-area rectangle
    /// contains exactly its own point.
    pub fn contains(&self, p: &Point2<f64>) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            min: Point2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    pub fn translated(&self, offset: &Vector2<f64>) -> Rect {
        Rect {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}

pub fn rotate_vector(v: &Vector2<f64>, angle_radians: f64) -> Vector2<f64> {
    Rotation2::new(angle_radians) * v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_inclusive_on_edges() {
        let rect = Rect::new(Point2::new(0.0, 0.0), Point2::new(10.0, 5.0));
        assert!(rect.contains(&Point2::new(0.0, 0.0)));
        assert!(rect.contains(&Point2::new(10.0, 5.0)));
        assert!(rect.contains(&Point2::new(5.0, 2.5)));
        assert!(!rect.contains(&Point2::new(10.1, 2.5)));
        assert!(!rect.contains(&Point2::new(5.0, -0.1)));
    }

    #[test]
    fn zero_area_rect_contains_its_own_point() {
        let rect = Rect::at_point(Point2::new(3.0, 4.0));
        assert!(rect.contains(&Point2::new(3.0, 4.0)));
        assert!(!rect.contains(&Point2::new(3.0, 4.1)));
        assert_eq!(rect.width(), 0.0);
        assert_eq!(rect.height(), 0.0);
    }

    #[test]
    fn union_covers_both_inputs() {
        let a = Rect::new(Point2::new(0.0, 0.0), Point2::new(2.0, 2.0));
        let b = Rect::new(Point2::new(-1.0, 1.0), Point2::new(1.0, 5.0));
        let u = a.union(&b);
        assert_eq!(u.min, Point2::new(-1.0, 0.0));
        assert_eq!(u.max, Point2::new(2.0, 5.0));
    }

    #[test]
    fn from_center_round_trips_center_and_size() {
        let rect = Rect::from_center(Point2::new(1.0, -2.0), 4.0, 6.0);
        assert_eq!(rect.center(), Point2::new(1.0, -2.0));
        assert_eq!(rect.width(), 4.0);
        assert_eq!(rect.height(), 6.0);
    }

    #[test]
    fn rotate_vector_by_quarter_turn() {
        let v = Vector2::new(1.0, 0.0);
        let r = rotate_vector(&v, std::f64::consts::FRAC_PI_2);
        assert!((r.x - 0.0).abs() < 1e-12);
        assert!((r.y - 1.0).abs() < 1e-12);
    }
}

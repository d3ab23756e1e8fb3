use nalgebra::Point2;

/// A shape-defining point strung along a messenger-RNA strand.
///
/// Each point carries the distance it is meant to keep to its predecessor;
/// the sum of those target distances over the whole strand is the strand's
/// total length. Points are stored in order (index 0 = first/leading) in a
/// `Vec` owned by the strand, with the winding algorithm responsible for
/// placing their actual positions along the current segment geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapePoint {
    /// Current position, assigned by the winding algorithm.
    pub position: Point2<f64>,
    /// Target distance to the previous point; `0.0` for the first point.
    pub target_distance_to_previous: f64,
}

impl ShapePoint {
    pub fn new(position: Point2<f64>, target_distance_to_previous: f64) -> Self {
        Self {
            position,
            target_distance_to_previous,
        }
    }

    /// The leading point of a strand, which has no predecessor.
    pub fn first(position: Point2<f64>) -> Self {
        Self::new(position, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_point_has_zero_target_distance() {
        let p = ShapePoint::first(Point2::new(2.0, 3.0));
        assert_eq!(p.position, Point2::new(2.0, 3.0));
        assert_eq!(p.target_distance_to_previous, 0.0);
    }

    #[test]
    fn target_distances_sum_to_strand_length() {
        let points = vec![
            ShapePoint::first(Point2::origin()),
            ShapePoint::new(Point2::new(50.0, 0.0), 50.0),
            ShapePoint::new(Point2::new(100.0, 0.0), 50.0),
            ShapePoint::new(Point2::new(125.0, 0.0), 25.0),
        ];
        let total: f64 = points.iter().map(|p| p.target_distance_to_previous).sum();
        assert_eq!(total, 125.0);
    }
}

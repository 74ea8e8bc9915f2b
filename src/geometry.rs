//! Image-space geometry: points, committed polygons and hit testing.

use serde::{Deserialize, Serialize};

use crate::error::{AnnotateError, Result};

/// A position in image-pixel space. Serialized as `[x, y]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<[f32; 2]> for Point {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// A closed polygon with at least three vertices. The closing edge from the
/// last vertex back to the first is implicit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    pub const MIN_POINTS: usize = 3;

    pub fn new(points: Vec<Point>) -> Result<Self> {
        if points.len() < Self::MIN_POINTS {
            return Err(AnnotateError::TooFewPoints {
                count: points.len(),
            });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn contains(&self, point: Point) -> bool {
        point_in_polygon(point, &self.points)
    }

    /// Inclusive pixel bounds `(min, max)` of the vertices.
    pub fn bounds(&self) -> (Point, Point) {
        let mut min = Point::new(f32::INFINITY, f32::INFINITY);
        let mut max = Point::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for p in &self.points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        (min, max)
    }
}

impl TryFrom<Vec<Point>> for Polygon {
    type Error = AnnotateError;

    fn try_from(points: Vec<Point>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<Polygon> for Vec<Point> {
    fn from(polygon: Polygon) -> Self {
        polygon.points
    }
}

/// Test whether `point` lies inside the closed ring `vertices` (ray casting).
///
/// A horizontal ray is cast from the point towards +X and crossings are
/// counted; the point is inside iff the count is odd. An edge only counts
/// when exactly one of its endpoints lies strictly above the ray
/// (`yi > y != yj > y`), so a ray through a shared vertex is counted once.
/// Points on a left edge therefore test inside, points on a right edge outside.
pub fn point_in_polygon(point: Point, vertices: &[Point]) -> bool {
    let n = vertices.len();
    if n < Polygon::MIN_POINTS {
        return false;
    }

    let Point { x, y } = point;
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (vertices[i].x, vertices[i].y);
        let (xj, yj) = (vertices[j].x, vertices[j].y);

        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Index of the first polygon (in input order) that contains `point`.
pub fn containing_polygon(point: Point, polygons: &[Polygon]) -> Option<usize> {
    polygons.iter().position(|polygon| polygon.contains(point))
}

/// Twice the signed area (shoelace sum) of the ring.
fn doubled_area(vertices: &[Point]) -> f32 {
    let n = vertices.len();
    (0..n)
        .map(|i| {
            let (a, b) = (vertices[i], vertices[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum()
}

fn cross(a: Point, b: Point, c: Point) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Ear-clipping triangulation of a simple polygon, as vertex index triples.
///
/// Self-intersecting rings cannot always be fully clipped; whatever remains
/// is fanned from its first vertex.
pub fn triangulate(vertices: &[Point]) -> Vec<[usize; 3]> {
    let n = vertices.len();
    if n < Polygon::MIN_POINTS {
        return Vec::new();
    }

    let mut ring: Vec<usize> = (0..n).collect();
    if doubled_area(vertices) < 0.0 {
        ring.reverse();
    }

    let mut triangles = Vec::with_capacity(n - 2);
    while ring.len() > 3 {
        let m = ring.len();
        let ear = (0..m).find(|&k| {
            let (a, b, c) = (ring[(k + m - 1) % m], ring[k], ring[(k + 1) % m]);
            let (pa, pb, pc) = (vertices[a], vertices[b], vertices[c]);
            cross(pa, pb, pc) >= 0.0
                && ring.iter().all(|&o| {
                    o == a || o == b || o == c || {
                        let p = vertices[o];
                        !(cross(pa, pb, p) >= 0.0 && cross(pb, pc, p) >= 0.0 && cross(pc, pa, p) >= 0.0)
                    }
                })
        });
        let Some(k) = ear else {
            break;
        };
        triangles.push([ring[(k + m - 1) % m], ring[k], ring[(k + 1) % m]]);
        ring.remove(k);
    }

    for k in 1..ring.len() - 1 {
        triangles.push([ring[0], ring[k], ring[k + 1]]);
    }
    triangles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poly(points: &[(f32, f32)]) -> Polygon {
        Polygon::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect()).unwrap()
    }

    fn square() -> Polygon {
        poly(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)])
    }

    #[test]
    fn test_polygon_requires_three_points() {
        let err = Polygon::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]).unwrap_err();
        assert!(matches!(err, AnnotateError::TooFewPoints { count: 2 }));
        assert!(Polygon::new(vec![Point::new(0.0, 0.0); 3]).is_ok());
    }

    #[test]
    fn test_square_inside_and_outside() {
        let sq = square();
        assert!(sq.contains(Point::new(5.0, 5.0)));
        assert!(!sq.contains(Point::new(15.0, 15.0)));
        assert!(!sq.contains(Point::new(-1.0, 5.0)));
    }

    #[test]
    fn test_edge_tie_break_is_half_open() {
        let sq = square();
        // right edge: the crossing x equals the point's x, so no crossing counts
        assert!(!sq.contains(Point::new(10.0, 5.0)));
        // left edge: one crossing (the right edge) remains
        assert!(sq.contains(Point::new(0.0, 5.0)));
        // bottom edge lies on the ray and never counts; top edge is excluded
        assert!(sq.contains(Point::new(5.0, 0.0)));
        assert!(!sq.contains(Point::new(5.0, 10.0)));
    }

    #[test]
    fn test_ray_through_vertex_counts_once() {
        // diamond with vertices level with the test point
        let diamond = poly(&[(5.0, 0.0), (10.0, 5.0), (5.0, 10.0), (0.0, 5.0)]);
        assert!(diamond.contains(Point::new(5.0, 5.0)));
        assert!(!diamond.contains(Point::new(-2.0, 5.0)));
        assert!(!diamond.contains(Point::new(12.0, 5.0)));
    }

    #[test]
    fn test_concave_polygon() {
        // U shape opening upwards
        let u = poly(&[
            (0.0, 0.0),
            (3.0, 0.0),
            (3.0, 8.0),
            (7.0, 8.0),
            (7.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
        ]);
        assert!(u.contains(Point::new(1.5, 4.0)));
        assert!(u.contains(Point::new(8.5, 4.0)));
        assert!(!u.contains(Point::new(5.0, 4.0)));
        assert!(u.contains(Point::new(5.0, 9.0)));
    }

    #[test]
    fn test_membership_invariant_under_rotation() {
        let base = vec![
            Point::new(0.0, 0.0),
            Point::new(3.0, 0.0),
            Point::new(3.0, 8.0),
            Point::new(7.0, 8.0),
            Point::new(7.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        let samples = [
            Point::new(1.5, 4.0),
            Point::new(5.0, 4.0),
            Point::new(5.0, 9.0),
            Point::new(10.0, 5.0),
            Point::new(0.0, 5.0),
            Point::new(3.0, 8.0),
            Point::new(11.0, 1.0),
        ];
        for shift in 0..base.len() {
            let mut rotated = base.clone();
            rotated.rotate_left(shift);
            for &p in &samples {
                assert_eq!(
                    point_in_polygon(p, &base),
                    point_in_polygon(p, &rotated),
                    "sample {:?} with rotation {}",
                    p,
                    shift
                );
            }
        }
    }

    #[test]
    fn test_containing_polygon_first_match_wins() {
        let big = poly(&[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)]);
        let small = square();
        let polygons = vec![big.clone(), small.clone()];
        assert_eq!(containing_polygon(Point::new(5.0, 5.0), &polygons), Some(0));

        let polygons = vec![small, big];
        assert_eq!(containing_polygon(Point::new(5.0, 5.0), &polygons), Some(0));
        assert_eq!(containing_polygon(Point::new(50.0, 50.0), &polygons), Some(1));
        assert_eq!(containing_polygon(Point::new(500.0, 5.0), &polygons), None);
        assert_eq!(containing_polygon(Point::new(5.0, 5.0), &[]), None);
    }

    #[test]
    fn test_polygon_json_layout() {
        let json = serde_json::to_string(&square()).unwrap();
        assert_eq!(json, "[[0.0,0.0],[10.0,0.0],[10.0,10.0],[0.0,10.0]]");
        assert!(serde_json::from_str::<Polygon>("[[0.0,0.0],[1.0,1.0]]").is_err());
    }

    fn triangulated_area(points: &[Point]) -> f32 {
        triangulate(points)
            .iter()
            .map(|&[a, b, c]| cross(points[a], points[b], points[c]).abs() / 2.0)
            .sum()
    }

    #[test]
    fn test_triangulate_convex() {
        let sq = square();
        let triangles = triangulate(sq.points());
        assert_eq!(triangles.len(), 2);
        assert_eq!(triangulated_area(sq.points()), 100.0);
    }

    #[test]
    fn test_triangulate_concave_covers_exact_area() {
        let u = poly(&[
            (0.0, 0.0),
            (3.0, 0.0),
            (3.0, 8.0),
            (7.0, 8.0),
            (7.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
        ]);
        assert_eq!(triangulate(u.points()).len(), 6);
        assert_eq!(triangulated_area(u.points()), 68.0);

        // same region wound the other way
        let mut reversed = u.points().to_vec();
        reversed.reverse();
        assert_eq!(triangulated_area(&reversed), 68.0);
    }

    #[test]
    fn test_triangulate_self_intersecting_still_produces_triangles() {
        let bowtie = poly(&[(0.0, 0.0), (10.0, 10.0), (10.0, 0.0), (0.0, 10.0)]);
        assert_eq!(triangulate(bowtie.points()).len(), 2);
    }

    #[test]
    fn test_bounds() {
        let tri = poly(&[(4.0, 2.0), (9.0, 7.0), (1.0, 5.0)]);
        assert_eq!(tri.bounds(), (Point::new(1.0, 2.0), Point::new(9.0, 7.0)));
    }
}

//! Narrowphase overlap tests between collision shapes.
//!
//! Every shape is split into convex parts in world space: circles, polygons,
//! and segments (edges and individual chain links). Part pairs are tested with
//! the separating axis theorem or closest-point distance.

use glam::Vec2;

use crate::math::Transform2d;

use super::shape::CollisionShape;

/// A convex piece of a shape in world space.
#[derive(Debug, Clone)]
pub enum ConvexPart {
    Circle { center: Vec2, radius: f32 },
    /// Counter-clockwise polygon, or a two-point segment.
    Hull(Vec<Vec2>),
}

/// Split a shape into world-space convex parts.
pub fn convex_parts(shape: &CollisionShape, xf: &Transform2d) -> Vec<ConvexPart> {
    match shape {
        CollisionShape::Circle { radius, center } => vec![ConvexPart::Circle {
            center: xf.world_point(*center),
            radius: *radius,
        }],
        CollisionShape::Polygon { vertices } => vec![ConvexPart::Hull(
            vertices.iter().map(|v| xf.world_point(*v)).collect(),
        )],
        CollisionShape::Edge { start, end, .. } => vec![ConvexPart::Hull(vec![
            xf.world_point(*start),
            xf.world_point(*end),
        ])],
        CollisionShape::Chain { vertices, .. } => vertices
            .windows(2)
            .map(|w| ConvexPart::Hull(vec![xf.world_point(w[0]), xf.world_point(w[1])]))
            .collect(),
    }
}

/// Whether two shapes overlap (touching counts).
pub fn shapes_overlap(
    shape_a: &CollisionShape,
    xf_a: &Transform2d,
    shape_b: &CollisionShape,
    xf_b: &Transform2d,
) -> bool {
    let parts_a = convex_parts(shape_a, xf_a);
    let parts_b = convex_parts(shape_b, xf_b);
    parts_a
        .iter()
        .any(|a| parts_b.iter().any(|b| parts_overlap(a, b)))
}

pub fn parts_overlap(a: &ConvexPart, b: &ConvexPart) -> bool {
    match (a, b) {
        (
            ConvexPart::Circle {
                center: ca,
                radius: ra,
            },
            ConvexPart::Circle {
                center: cb,
                radius: rb,
            },
        ) => ca.distance_squared(*cb) <= (ra + rb) * (ra + rb),
        (ConvexPart::Circle { center, radius }, ConvexPart::Hull(hull))
        | (ConvexPart::Hull(hull), ConvexPart::Circle { center, radius }) => {
            circle_hull(*center, *radius, hull)
        }
        (ConvexPart::Hull(a), ConvexPart::Hull(b)) => sat_hull_hull(a, b),
    }
}

/// Closest point on segment `a`-`b` to `p`.
#[inline]
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

fn circle_hull(center: Vec2, radius: f32, hull: &[Vec2]) -> bool {
    if hull.len() >= 3 && point_in_hull(center, hull) {
        return true;
    }
    let n = hull.len();
    let edges = if n == 2 { 1 } else { n };
    (0..edges).any(|i| {
        let closest = closest_point_on_segment(center, hull[i], hull[(i + 1) % n]);
        closest.distance_squared(center) <= radius * radius
    })
}

fn point_in_hull(p: Vec2, hull: &[Vec2]) -> bool {
    let n = hull.len();
    (0..n).all(|i| (hull[(i + 1) % n] - hull[i]).perp_dot(p - hull[i]) >= 0.0)
}

fn separating_axes(hull: &[Vec2], axes: &mut Vec<Vec2>) {
    let n = hull.len();
    if n == 2 {
        let d = hull[1] - hull[0];
        axes.push(d.perp());
        axes.push(d);
        return;
    }
    for i in 0..n {
        axes.push((hull[(i + 1) % n] - hull[i]).perp());
    }
}

fn project(hull: &[Vec2], axis: Vec2) -> (f32, f32) {
    hull.iter()
        .map(|p| p.dot(axis))
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), d| (lo.min(d), hi.max(d)))
}

/// Separating axis test between two convex hulls (segments included).
pub fn sat_hull_hull(a: &[Vec2], b: &[Vec2]) -> bool {
    let mut axes = Vec::with_capacity(a.len() + b.len() + 2);
    separating_axes(a, &mut axes);
    separating_axes(b, &mut axes);
    axes.iter().all(|axis| {
        let (min_a, max_a) = project(a, *axis);
        let (min_b, max_b) = project(b, *axis);
        min_a <= max_b && min_b <= max_a
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box(center: Vec2) -> CollisionShape {
        CollisionShape::polygon_box(1.0, 1.0, center, 0.0).unwrap()
    }

    #[test]
    fn test_circle_circle() {
        let a = CollisionShape::circle(1.0, Vec2::ZERO).unwrap();
        let b = CollisionShape::circle(1.0, Vec2::ZERO).unwrap();
        let near = Transform2d::new(Vec2::new(1.9, 0.0), 0.0);
        let far = Transform2d::new(Vec2::new(1.5, 1.5), 0.0);
        assert!(shapes_overlap(&a, &Transform2d::IDENTITY, &b, &near));
        assert!(!shapes_overlap(&a, &Transform2d::IDENTITY, &b, &far));
    }

    #[test]
    fn test_box_box_rotated() {
        let a = unit_box(Vec2::ZERO);
        let b = unit_box(Vec2::ZERO);
        // Diagonal neighbour: AABBs overlap but the rotated box does not touch.
        let xf = Transform2d::new(Vec2::new(0.95, 0.95), std::f32::consts::FRAC_PI_4);
        assert!(!shapes_overlap(&a, &Transform2d::IDENTITY, &b, &xf));
        let xf = Transform2d::new(Vec2::new(1.1, 0.0), 0.0);
        assert!(!shapes_overlap(&a, &Transform2d::IDENTITY, &b, &xf));
        let xf = Transform2d::new(Vec2::new(0.9, 0.0), 0.0);
        assert!(shapes_overlap(&a, &Transform2d::IDENTITY, &b, &xf));
    }

    #[test]
    fn test_circle_box_corner() {
        let boxed = unit_box(Vec2::ZERO);
        let circle = CollisionShape::circle(0.3, Vec2::ZERO).unwrap();
        let diag = Transform2d::new(Vec2::new(0.75, 0.75), 0.0);
        assert!(!shapes_overlap(&boxed, &Transform2d::IDENTITY, &circle, &diag));
        let inside = Transform2d::new(Vec2::new(0.1, 0.0), 0.0);
        assert!(shapes_overlap(&boxed, &Transform2d::IDENTITY, &circle, &inside));
    }

    #[test]
    fn test_chain_link_against_circle() {
        let chain = CollisionShape::chain(
            &[Vec2::new(-5.0, 0.0), Vec2::new(0.0, 0.0), Vec2::new(0.0, 5.0)],
            None,
            None,
        )
        .unwrap();
        let circle = CollisionShape::circle(0.5, Vec2::ZERO).unwrap();
        let touching = Transform2d::new(Vec2::new(0.4, 2.0), 0.0);
        let clear = Transform2d::new(Vec2::new(2.0, 2.0), 0.0);
        assert!(shapes_overlap(&chain, &Transform2d::IDENTITY, &circle, &touching));
        assert!(!shapes_overlap(&chain, &Transform2d::IDENTITY, &circle, &clear));
    }

    #[test]
    fn test_collinear_segments_apart() {
        assert!(!sat_hull_hull(
            &[Vec2::ZERO, Vec2::X],
            &[Vec2::new(2.0, 0.0), Vec2::new(3.0, 0.0)]
        ));
        assert!(sat_hull_hull(
            &[Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0)],
            &[Vec2::new(-1.0, 1.0), Vec2::new(1.0, -1.0)]
        ));
    }
}

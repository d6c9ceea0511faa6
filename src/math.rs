//! 2D spatial value types: transforms, bounding boxes and oriented box helpers.

use std::f32::consts::{PI, TAU};

use glam::Vec2;

/// Smallest extent a scene object may have along either axis.
pub const MIN_OBJECT_SIZE: f32 = 0.001;

/// Four corners of an oriented bounding box, counter-clockwise.
pub type Oobb = [Vec2; 4];

/// Position and angle (radians) of a body origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform2d {
    pub position: Vec2,
    pub angle: f32,
}

impl Transform2d {
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        angle: 0.0,
    };

    pub fn new(position: Vec2, angle: f32) -> Self {
        Self { position, angle }
    }

    /// Unit rotation vector `(cos, sin)`.
    #[inline]
    pub fn rotation(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }

    /// Local point to world space.
    #[inline]
    pub fn world_point(&self, local: Vec2) -> Vec2 {
        self.position + self.rotation().rotate(local)
    }

    /// World point to local space.
    #[inline]
    pub fn local_point(&self, world: Vec2) -> Vec2 {
        inverse_rotation(self.rotation()).rotate(world - self.position)
    }

    #[inline]
    pub fn world_vector(&self, local: Vec2) -> Vec2 {
        self.rotation().rotate(local)
    }

    #[inline]
    pub fn local_vector(&self, world: Vec2) -> Vec2 {
        inverse_rotation(self.rotation()).rotate(world)
    }
}

#[inline]
fn inverse_rotation(rotation: Vec2) -> Vec2 {
    Vec2::new(rotation.x, -rotation.y)
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb2d {
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for Aabb2d {
    fn default() -> Self {
        Self {
            min: Vec2::ZERO,
            max: Vec2::ZERO,
        }
    }
}

impl Aabb2d {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point. Returns a zero box at the origin for no points.
    pub fn from_points(points: &[Vec2]) -> Self {
        let Some((first, rest)) = points.split_first() else {
            return Self::default();
        };
        rest.iter().fold(Self::new(*first, *first), |aabb, p| Self {
            min: aabb.min.min(*p),
            max: aabb.max.max(*p),
        })
    }

    #[inline]
    pub fn union(&self, other: &Aabb2d) -> Aabb2d {
        Aabb2d {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Test whether two AABBs overlap.
    #[inline]
    pub fn overlaps(&self, other: &Aabb2d) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    #[inline]
    pub fn contains(&self, other: &Aabb2d) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    #[inline]
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Grow uniformly by `margin` on every side.
    pub fn expanded(&self, margin: f32) -> Aabb2d {
        Aabb2d {
            min: self.min - Vec2::splat(margin),
            max: self.max + Vec2::splat(margin),
        }
    }

    /// Extend in the direction of `displacement` only.
    pub fn swept(&self, displacement: Vec2) -> Aabb2d {
        Aabb2d {
            min: self.min + displacement.min(Vec2::ZERO),
            max: self.max + displacement.max(Vec2::ZERO),
        }
    }
}

/// Corners of an origin-centred box of `size`, counter-clockwise from bottom-left.
pub fn local_sized_oobb(size: Vec2) -> Oobb {
    let half = size * 0.5;
    [
        Vec2::new(-half.x, -half.y),
        Vec2::new(half.x, -half.y),
        Vec2::new(half.x, half.y),
        Vec2::new(-half.x, half.y),
    ]
}

pub fn transform_oobb(local: &Oobb, xf: &Transform2d) -> Oobb {
    local.map(|p| xf.world_point(p))
}

pub fn aabb_of_oobb(oobb: &Oobb) -> Aabb2d {
    Aabb2d::from_points(oobb)
}

/// AABB of the local box under `xf`.
pub fn compute_aabb(local: &Oobb, xf: &Transform2d) -> Aabb2d {
    aabb_of_oobb(&transform_oobb(local, xf))
}

/// Whether `point` lies inside (or on) a counter-clockwise convex quad.
pub fn is_point_in_oobb(oobb: &Oobb, point: Vec2) -> bool {
    (0..4).all(|i| {
        let a = oobb[i];
        let b = oobb[(i + 1) % 4];
        (b - a).perp_dot(point - a) >= 0.0
    })
}

/// Wrap an angle into `(-PI, PI]`.
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle % TAU;
    if wrapped > PI {
        wrapped - TAU
    } else if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Size and position from two arbitrary corners. Collapsed axes are widened to
/// [`MIN_OBJECT_SIZE`].
pub fn area_from_corners(corner1: Vec2, corner2: Vec2) -> (Vec2, Vec2) {
    let min = corner1.min(corner2);
    let max = corner1.max(corner2);
    let mut size = max - min;
    if size.x < MIN_OBJECT_SIZE || size.y < MIN_OBJECT_SIZE {
        tracing::warn!(
            "area ({}, {}) - ({}, {}) is degenerate; widening to minimum size",
            corner1.x,
            corner1.y,
            corner2.x,
            corner2.y
        );
        size = size.max(Vec2::splat(MIN_OBJECT_SIZE));
    }
    ((min + max) * 0.5, size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_transform_round_trip() {
        let xf = Transform2d::new(Vec2::new(3.0, -2.0), 0.7);
        let local = Vec2::new(1.5, 4.0);
        let world = xf.world_point(local);
        let back = xf.local_point(world);
        assert!((back - local).length() < 1e-5);

        let v = Vec2::new(-2.0, 0.5);
        assert!((xf.local_vector(xf.world_vector(v)) - v).length() < 1e-5);
    }

    #[test]
    fn test_transform_quarter_turn() {
        let xf = Transform2d::new(Vec2::new(1.0, 0.0), FRAC_PI_2);
        let p = xf.world_point(Vec2::new(1.0, 0.0));
        assert!((p - Vec2::new(1.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_aabb_overlap_and_union() {
        let a = Aabb2d::new(Vec2::ZERO, Vec2::ONE);
        let b = Aabb2d::new(Vec2::splat(0.5), Vec2::splat(2.0));
        let c = Aabb2d::new(Vec2::splat(3.0), Vec2::splat(4.0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));

        let u = a.union(&c);
        assert_eq!(u.min, Vec2::ZERO);
        assert_eq!(u.max, Vec2::splat(4.0));
        assert!(u.contains(&b));
    }

    #[test]
    fn test_aabb_swept() {
        let a = Aabb2d::new(Vec2::ZERO, Vec2::ONE);
        let s = a.swept(Vec2::new(2.0, -1.0));
        assert_eq!(s.min, Vec2::new(0.0, -1.0));
        assert_eq!(s.max, Vec2::new(3.0, 1.0));
    }

    #[test]
    fn test_rotated_oobb_aabb() {
        let local = local_sized_oobb(Vec2::new(2.0, 2.0));
        let xf = Transform2d::new(Vec2::ZERO, std::f32::consts::FRAC_PI_4);
        let aabb = compute_aabb(&local, &xf);
        let eps = 1e-5;
        assert!((aabb.max.x - 2.0f32.sqrt()).abs() < eps);
        assert!((aabb.min.y + 2.0f32.sqrt()).abs() < eps);
    }

    #[test]
    fn test_point_in_oobb() {
        let oobb = transform_oobb(
            &local_sized_oobb(Vec2::new(4.0, 2.0)),
            &Transform2d::new(Vec2::new(10.0, 0.0), FRAC_PI_2),
        );
        assert!(is_point_in_oobb(&oobb, Vec2::new(10.0, 1.5)));
        assert!(!is_point_in_oobb(&oobb, Vec2::new(11.5, 0.0)));
    }

    #[test]
    fn test_wrap_angle() {
        let eps = 1e-5;
        assert!((wrap_angle(3.0 * PI / 2.0) + FRAC_PI_2).abs() < eps);
        assert!((wrap_angle(-3.0 * PI / 2.0) - FRAC_PI_2).abs() < eps);
        assert!(wrap_angle(PI) > 0.0);
        assert!((wrap_angle(0.25) - 0.25).abs() < eps);
    }

    #[test]
    fn test_area_from_corners_degenerate() {
        let (pos, size) = area_from_corners(Vec2::new(4.0, 1.0), Vec2::new(0.0, 1.0));
        assert_eq!(pos, Vec2::new(2.0, 1.0));
        assert_eq!(size.x, 4.0);
        assert_eq!(size.y, MIN_OBJECT_SIZE);
    }
}

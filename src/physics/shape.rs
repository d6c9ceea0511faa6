//! Collision geometry: validated shape variants, material and mass properties.

use std::f32::consts::PI;

use glam::Vec2;

use crate::error::ShapeError;
use crate::math::{local_sized_oobb, Aabb2d, Transform2d};

/// Largest vertex count a polygon shape may have.
pub const MAX_POLYGON_VERTICES: usize = 8;

/// Distance below which two vertices are considered the same point.
pub const LINEAR_SLOP: f32 = 0.005;

/// Shape variant tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShapeKind {
    Circle,
    Polygon,
    Chain,
    Edge,
}

impl ShapeKind {
    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Circle => "circle",
            ShapeKind::Polygon => "polygon",
            ShapeKind::Chain => "chain",
            ShapeKind::Edge => "edge",
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Local-space collision geometry.
///
/// Construct through the validating constructors ([`CollisionShape::circle`],
/// [`CollisionShape::polygon`], ...). Polygons are stored counter-clockwise.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "lowercase"))]
pub enum CollisionShape {
    Circle {
        radius: f32,
        center: Vec2,
    },
    Polygon {
        vertices: Vec<Vec2>,
    },
    /// Open chain. Adjacent vertices extend the ends for smooth collision.
    Chain {
        vertices: Vec<Vec2>,
        adjacent_start: Option<Vec2>,
        adjacent_end: Option<Vec2>,
    },
    Edge {
        start: Vec2,
        end: Vec2,
        adjacent_start: Option<Vec2>,
        adjacent_end: Option<Vec2>,
    },
}

/// Mass, centroid and rotational inertia about the body origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MassData {
    pub mass: f32,
    pub center: Vec2,
    pub inertia: f32,
}

fn all_finite(points: &[Vec2]) -> bool {
    points.iter().all(|p| p.is_finite())
}

impl CollisionShape {
    pub fn circle(radius: f32, center: Vec2) -> Result<Self, ShapeError> {
        if !radius.is_finite() || !center.is_finite() {
            return Err(ShapeError::NonFinite);
        }
        if radius <= 0.0 {
            return Err(ShapeError::InvalidRadius(radius));
        }
        Ok(CollisionShape::Circle { radius, center })
    }

    /// Convex polygon from 3 to [`MAX_POLYGON_VERTICES`] points in either winding.
    pub fn polygon(points: &[Vec2]) -> Result<Self, ShapeError> {
        let count = points.len();
        if !(3..=MAX_POLYGON_VERTICES).contains(&count) {
            return Err(ShapeError::PolygonVertexCount { count });
        }
        if !all_finite(points) {
            return Err(ShapeError::NonFinite);
        }
        for i in 0..count {
            for j in (i + 1)..count {
                if points[i].distance_squared(points[j]) < LINEAR_SLOP * LINEAR_SLOP {
                    return Err(ShapeError::DegeneratePolygon);
                }
            }
        }

        let mut vertices = points.to_vec();
        let twice_area: f32 = (0..count)
            .map(|i| vertices[i].perp_dot(vertices[(i + 1) % count]))
            .sum();
        if twice_area.abs() <= f32::EPSILON {
            return Err(ShapeError::DegeneratePolygon);
        }
        if twice_area < 0.0 {
            vertices.reverse();
        }

        // Every other vertex must lie strictly left of each edge.
        for i in 0..count {
            let a = vertices[i];
            let edge = vertices[(i + 1) % count] - a;
            for (j, p) in vertices.iter().enumerate() {
                if j == i || j == (i + 1) % count {
                    continue;
                }
                let side = edge.perp_dot(*p - a);
                if side < -f32::EPSILON {
                    return Err(ShapeError::NonConvexPolygon);
                }
                if side <= f32::EPSILON {
                    return Err(ShapeError::DegeneratePolygon);
                }
            }
        }

        Ok(CollisionShape::Polygon { vertices })
    }

    /// Rectangle of `width` x `height` centred on `center` and rotated by `angle`.
    pub fn polygon_box(width: f32, height: f32, center: Vec2, angle: f32) -> Result<Self, ShapeError> {
        if !width.is_finite() || !height.is_finite() || !center.is_finite() || !angle.is_finite() {
            return Err(ShapeError::NonFinite);
        }
        if width <= 0.0 || height <= 0.0 {
            return Err(ShapeError::InvalidBoxSize { width, height });
        }
        let xf = Transform2d::new(center, angle);
        let vertices = local_sized_oobb(Vec2::new(width, height))
            .map(|p| xf.world_point(p))
            .to_vec();
        Ok(CollisionShape::Polygon { vertices })
    }

    pub fn chain(
        points: &[Vec2],
        adjacent_start: Option<Vec2>,
        adjacent_end: Option<Vec2>,
    ) -> Result<Self, ShapeError> {
        if points.len() < 2 {
            return Err(ShapeError::ChainVertexCount(points.len()));
        }
        let adjacent_finite = adjacent_start.map_or(true, |p| p.is_finite())
            && adjacent_end.map_or(true, |p| p.is_finite());
        if !all_finite(points) || !adjacent_finite {
            return Err(ShapeError::NonFinite);
        }
        if let Some(i) = points
            .windows(2)
            .position(|w| w[0].distance_squared(w[1]) < LINEAR_SLOP * LINEAR_SLOP)
        {
            return Err(ShapeError::CoincidentChainVertices { index: i, next: i + 1 });
        }
        Ok(CollisionShape::Chain {
            vertices: points.to_vec(),
            adjacent_start,
            adjacent_end,
        })
    }

    pub fn edge(
        start: Vec2,
        end: Vec2,
        adjacent_start: Option<Vec2>,
        adjacent_end: Option<Vec2>,
    ) -> Result<Self, ShapeError> {
        let adjacent_finite = adjacent_start.map_or(true, |p| p.is_finite())
            && adjacent_end.map_or(true, |p| p.is_finite());
        if !start.is_finite() || !end.is_finite() || !adjacent_finite {
            return Err(ShapeError::NonFinite);
        }
        if start.distance_squared(end) < LINEAR_SLOP * LINEAR_SLOP {
            return Err(ShapeError::DegenerateEdge);
        }
        Ok(CollisionShape::Edge {
            start,
            end,
            adjacent_start,
            adjacent_end,
        })
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            CollisionShape::Circle { .. } => ShapeKind::Circle,
            CollisionShape::Polygon { .. } => ShapeKind::Polygon,
            CollisionShape::Chain { .. } => ShapeKind::Chain,
            CollisionShape::Edge { .. } => ShapeKind::Edge,
        }
    }

    /// World-space AABB under the body transform.
    pub fn compute_aabb(&self, xf: &Transform2d) -> Aabb2d {
        match self {
            CollisionShape::Circle { radius, center } => {
                let p = xf.world_point(*center);
                Aabb2d::new(p - Vec2::splat(*radius), p + Vec2::splat(*radius))
            }
            CollisionShape::Polygon { vertices } | CollisionShape::Chain { vertices, .. } => {
                let world: Vec<Vec2> = vertices.iter().map(|v| xf.world_point(*v)).collect();
                Aabb2d::from_points(&world)
            }
            CollisionShape::Edge { start, end, .. } => {
                Aabb2d::from_points(&[xf.world_point(*start), xf.world_point(*end)])
            }
        }
    }

    /// Mass properties at `density`. Chains and edges are massless.
    pub fn compute_mass(&self, density: f32) -> MassData {
        match self {
            CollisionShape::Circle { radius, center } => {
                let mass = density * PI * radius * radius;
                MassData {
                    mass,
                    center: *center,
                    inertia: mass * (0.5 * radius * radius + center.length_squared()),
                }
            }
            CollisionShape::Polygon { vertices } => polygon_mass(vertices, density),
            CollisionShape::Edge { start, end, .. } => MassData {
                mass: 0.0,
                center: (*start + *end) * 0.5,
                inertia: 0.0,
            },
            CollisionShape::Chain { .. } => MassData::default(),
        }
    }

    /// Whether a world point lies inside the shape. Always false for chains and edges.
    pub fn test_point(&self, xf: &Transform2d, point: Vec2) -> bool {
        match self {
            CollisionShape::Circle { radius, center } => {
                xf.world_point(*center).distance_squared(point) <= radius * radius
            }
            CollisionShape::Polygon { vertices } => {
                let local = xf.local_point(point);
                let n = vertices.len();
                (0..n).all(|i| {
                    let a = vertices[i];
                    (vertices[(i + 1) % n] - a).perp_dot(local - a) >= 0.0
                })
            }
            CollisionShape::Chain { .. } | CollisionShape::Edge { .. } => false,
        }
    }
}

/// Triangle-fan integration about the first vertex.
fn polygon_mass(vertices: &[Vec2], density: f32) -> MassData {
    let Some(&origin) = vertices.first() else {
        return MassData::default();
    };
    const INV3: f32 = 1.0 / 3.0;

    let mut area = 0.0;
    let mut center = Vec2::ZERO;
    let mut inertia = 0.0;
    for i in 1..vertices.len().saturating_sub(1) {
        let e1 = vertices[i] - origin;
        let e2 = vertices[i + 1] - origin;
        let d = e1.perp_dot(e2);
        let triangle_area = 0.5 * d;
        area += triangle_area;
        center += triangle_area * INV3 * (e1 + e2);

        let int_x2 = e1.x * e1.x + e2.x * e1.x + e2.x * e2.x;
        let int_y2 = e1.y * e1.y + e2.y * e1.y + e2.y * e2.y;
        inertia += (0.25 * INV3 * d) * (int_x2 + int_y2);
    }

    if area <= f32::EPSILON {
        return MassData::default();
    }
    let mass = density * area;
    let local_center = center / area;
    let centroid = local_center + origin;
    // Shift inertia from the fan origin to the centroid, then to the body origin.
    let inertia_centroid = density * inertia - mass * local_center.length_squared();
    MassData {
        mass,
        center: centroid,
        inertia: inertia_centroid + mass * centroid.length_squared(),
    }
}

/// Per-shape material properties.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixtureMaterial {
    /// Default: 1.0.
    pub density: f32,
    /// Default: 0.2.
    pub friction: f32,
    /// Default: 0.0.
    pub restitution: f32,
    /// Default: false.
    pub is_sensor: bool,
}

impl FixtureMaterial {
    /// Reject negative or non-finite density, friction and restitution.
    pub fn validated(self) -> Result<Self, ShapeError> {
        check_material_value("density", self.density)?;
        check_material_value("friction", self.friction)?;
        check_material_value("restitution", self.restitution)?;
        Ok(self)
    }
}

pub(crate) fn check_material_value(property: &'static str, value: f32) -> Result<(), ShapeError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ShapeError::InvalidMaterial { property, value })
    }
}

impl Default for FixtureMaterial {
    fn default() -> Self {
        Self {
            density: 1.0,
            friction: 0.2,
            restitution: 0.0,
            is_sensor: false,
        }
    }
}

/// Detached shape entry: geometry plus material.
///
/// This is also the persistence record for a collision shape.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixtureDef {
    pub shape: CollisionShape,
    pub material: FixtureMaterial,
}

impl FixtureDef {
    pub fn new(shape: CollisionShape, material: FixtureMaterial) -> Self {
        Self { shape, material }
    }

    /// Re-run geometry validation, e.g. for records read from storage.
    pub fn validated(self) -> Result<Self, ShapeError> {
        let shape = match &self.shape {
            CollisionShape::Circle { radius, center } => CollisionShape::circle(*radius, *center)?,
            CollisionShape::Polygon { vertices } => CollisionShape::polygon(vertices)?,
            CollisionShape::Chain {
                vertices,
                adjacent_start,
                adjacent_end,
            } => CollisionShape::chain(vertices, *adjacent_start, *adjacent_end)?,
            CollisionShape::Edge {
                start,
                end,
                adjacent_start,
                adjacent_end,
            } => CollisionShape::edge(*start, *end, *adjacent_start, *adjacent_end)?,
        };
        Ok(Self {
            shape,
            material: self.material.validated()?,
        })
    }
}

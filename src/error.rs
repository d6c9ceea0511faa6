//! Error types for shape validation, motion commands and scene membership.

use thiserror::Error;

use crate::physics::shape::MAX_POLYGON_VERTICES;

/// Rejected collision-shape input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("circle radius must be positive, got {0}")]
    InvalidRadius(f32),
    #[error("polygon needs 3 to {} vertices, got {count}", MAX_POLYGON_VERTICES)]
    PolygonVertexCount { count: usize },
    #[error("polygon vertices are coincident or collinear")]
    DegeneratePolygon,
    #[error("polygon is not convex")]
    NonConvexPolygon,
    #[error("box needs a positive width and height, got {width} x {height}")]
    InvalidBoxSize { width: f32, height: f32 },
    #[error("chain needs at least 2 vertices, got {0}")]
    ChainVertexCount(usize),
    #[error("chain vertices {index} and {next} are coincident")]
    CoincidentChainVertices { index: usize, next: usize },
    #[error("edge start and end are coincident")]
    DegenerateEdge,
    #[error("shape geometry contains a non-finite value")]
    NonFinite,
    #[error("shape index {index} is out of range, shape count is {count}")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("no collision shapes to copy")]
    NothingToCopy,
    #[error("{property} must be finite and non-negative, got {value}")]
    InvalidMaterial { property: &'static str, value: f32 },
    #[error("fixture could not be created: {0}")]
    Physics(#[from] PhysicsError),
}

/// Rejected move-to / rotate-to command.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MotionError {
    #[error("object is not in a scene")]
    NotInScene,
    #[error("static bodies cannot be moved or rotated")]
    StaticBody,
    #[error("speed must be positive, got {0}")]
    InvalidSpeed(f32),
}

/// Scene membership and object lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("object is already attached to a scene")]
    AlreadyAttached,
    #[error("object is not attached to a scene")]
    NotAttached,
    #[error("object not found in scene")]
    ObjectNotFound,
    #[error("source and target object are the same")]
    SameObject,
}

/// Stale or foreign handle passed to the physics world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PhysicsError {
    #[error("body handle does not refer to a live body")]
    InvalidBody,
    #[error("fixture handle does not refer to a live fixture")]
    InvalidFixture,
}

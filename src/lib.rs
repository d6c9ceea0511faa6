//! Rein 2D Scene
//!
//! Spatial and physics integration layer for 2D scene objects.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! 1. **math** - 2D transforms, AABB/OOBB helpers, angle wrapping
//! 2. **physics** - Rigid bodies and fixtures stored in hecs, fixed-step integration, contact events
//! 3. **object** - `SceneObject`: body, collision shapes, tick interpolation, motion commands
//! 4. **scene** - `Scene` container, spatial index, deferred event scheduler, event queue
//! 5. **error** - Typed errors behind the `try_` variants
//!
//! # Example
//!
//! ```
//! use rein_scene2d::{glam::Vec2, Scene, SceneEvent, SceneObject};
//!
//! let mut scene = Scene::default();
//! let mut ball = SceneObject::new();
//! ball.shapes_mut().create_circle(0.5, Vec2::ZERO);
//! let id = scene.add_object(ball);
//!
//! scene.object_mut(id).unwrap().move_to(Vec2::new(1.0, 0.0), 2.0, true, true);
//! for _ in 0..40 {
//!     scene.process_tick();
//! }
//! assert!(scene.drain_events().contains(&SceneEvent::MoveToComplete(id)));
//! ```

pub mod error;
pub mod math;
pub mod object;
pub mod physics;
pub mod scene;

// Re-export commonly used types
pub use error::{MotionError, PhysicsError, SceneError, ShapeError};

pub use math::{Aabb2d, Oobb, Transform2d, MIN_OBJECT_SIZE};

pub use physics::rigid_body::{BodyDef, BodyType};
pub use physics::shape::{CollisionShape, FixtureDef, FixtureMaterial, ShapeKind};
pub use physics::{PhysicsConfig, PhysicsWorld};

pub use object::body::RigidBodyState;
pub use object::shapes::CollisionShapeSet;
pub use object::{CallbackFlags, SceneObject};

pub use scene::world_query::WorldQueryConfig;
pub use scene::{ObjectId, Scene, SceneConfig, SceneEvent, TickContact};

// Re-export glam for convenience
pub use glam;

//! Scene setup helpers shared by the benchmarks.

use glam::Vec2;
use rein_scene2d::{BodyDef, ObjectId, Scene, SceneObject};

/// Deterministic pseudo-random points in `[-extent, extent]^2`.
pub fn scatter(n: usize, extent: f32) -> Vec<Vec2> {
    let mut state = 0x2545_f491_u32;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        (state as f32 / u32::MAX as f32) * 2.0 - 1.0
    };
    (0..n)
        .map(|_| Vec2::new(next() * extent, next() * extent))
        .collect()
}

/// Dynamic object with one shape: circles on even indices, boxes on odd ones.
pub fn shaped_object(index: usize, position: Vec2, velocity: Vec2) -> SceneObject {
    let mut object = SceneObject::with_body(BodyDef {
        position,
        linear_velocity: velocity,
        ..Default::default()
    });
    if index % 2 == 0 {
        object.shapes_mut().create_circle(0.5, Vec2::ZERO);
    } else {
        object.shapes_mut().create_polygon_box(1.0, 1.0);
    }
    object
}

/// `n` moving objects packed so that neighbours overlap now and then.
pub fn setup_moving_scene(n: usize) -> (Scene, Vec<ObjectId>) {
    let extent = (n as f32).sqrt() * 1.5;
    let positions = scatter(n, extent);
    let velocities = scatter(n, 2.0);
    let mut scene = Scene::default();
    let ids = positions
        .into_iter()
        .zip(velocities)
        .enumerate()
        .map(|(i, (p, v))| scene.add_object(shaped_object(i, p, v)))
        .collect();
    (scene, ids)
}

/// `n` objects that never move, spread far apart.
pub fn setup_resting_scene(n: usize) -> Scene {
    let mut scene = Scene::default();
    for (i, p) in scatter(n, n as f32 * 4.0).into_iter().enumerate() {
        scene.add_object(shaped_object(i, p, Vec2::ZERO));
    }
    scene
}

//! Broadphase pair finding over fixture AABBs.

use crate::math::{Aabb2d, Transform2d};

use super::rigid_body::{Body, BodyType};
use super::Fixture;

/// A fixture entry prepared for pair finding.
#[derive(Debug, Clone)]
pub struct BroadphaseEntry {
    pub fixture: hecs::Entity,
    pub body: hecs::Entity,
    pub aabb: Aabb2d,
    pub transform: Transform2d,
    pub body_type: BodyType,
    pub awake: bool,
}

/// Candidate fixture pair from the broadphase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidatePair {
    pub a: usize,
    pub b: usize,
}

/// Sweep-and-prune along the x axis.
#[derive(Default)]
pub struct SweepAndPrune {
    entries: Vec<BroadphaseEntry>,
}

impl SweepAndPrune {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries gathered by the last call to [`find_pairs`](Self::find_pairs),
    /// indexed by [`CandidatePair`].
    pub fn entries(&self) -> &[BroadphaseEntry] {
        &self.entries
    }

    /// Find all fixture pairs on different active bodies whose AABBs overlap.
    ///
    /// Only returns pairs where at least one body is dynamic.
    pub fn find_pairs(&mut self, world: &hecs::World) -> Vec<CandidatePair> {
        self.entries.clear();
        for (entity, fixture) in world.query::<&Fixture>().iter() {
            let Ok(body) = world.get::<&Body>(fixture.body) else {
                continue;
            };
            if !body.active {
                continue;
            }
            let transform = body.transform;
            self.entries.push(BroadphaseEntry {
                fixture: entity,
                body: fixture.body,
                aabb: fixture.shape.compute_aabb(&transform),
                transform,
                body_type: body.body_type,
                awake: body.awake,
            });
        }

        self.entries
            .sort_by(|a, b| a.aabb.min.x.total_cmp(&b.aabb.min.x));

        let mut pairs = Vec::new();
        for i in 0..self.entries.len() {
            let a = &self.entries[i];
            for j in (i + 1)..self.entries.len() {
                let b = &self.entries[j];
                if b.aabb.min.x > a.aabb.max.x {
                    break;
                }
                if a.body == b.body {
                    continue;
                }
                if a.body_type != BodyType::Dynamic && b.body_type != BodyType::Dynamic {
                    continue;
                }
                if a.aabb.overlaps(&b.aabb) {
                    pairs.push(CandidatePair { a: i, b: j });
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::rigid_body::BodyDef;
    use crate::physics::shape::{CollisionShape, FixtureMaterial};
    use glam::Vec2;

    fn spawn(world: &mut hecs::World, body_type: BodyType, position: Vec2, radius: f32) {
        let body = world.spawn((Body::from_def(&BodyDef {
            body_type,
            position,
            ..Default::default()
        }),));
        world.spawn((Fixture {
            body,
            shape: CollisionShape::circle(radius, Vec2::ZERO).unwrap(),
            material: FixtureMaterial::default(),
        },));
    }

    #[test]
    fn test_broadphase_overlapping() {
        let mut world = hecs::World::new();
        spawn(&mut world, BodyType::Dynamic, Vec2::ZERO, 1.0);
        spawn(&mut world, BodyType::Dynamic, Vec2::new(1.0, 0.0), 1.0);

        let mut broadphase = SweepAndPrune::new();
        assert_eq!(broadphase.find_pairs(&world).len(), 1);
    }

    #[test]
    fn test_broadphase_no_overlap() {
        let mut world = hecs::World::new();
        spawn(&mut world, BodyType::Dynamic, Vec2::ZERO, 0.5);
        spawn(&mut world, BodyType::Dynamic, Vec2::new(10.0, 0.0), 0.5);

        let mut broadphase = SweepAndPrune::new();
        assert!(broadphase.find_pairs(&world).is_empty());
    }

    #[test]
    fn test_broadphase_non_dynamic_pairs_skipped() {
        let mut world = hecs::World::new();
        spawn(&mut world, BodyType::Static, Vec2::ZERO, 1.0);
        spawn(&mut world, BodyType::Kinematic, Vec2::ZERO, 1.0);

        let mut broadphase = SweepAndPrune::new();
        assert!(broadphase.find_pairs(&world).is_empty());
    }
}

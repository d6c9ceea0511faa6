//! Touching fixture pairs and contact begin/end events.

use std::collections::HashSet;

/// Canonical (ordered) fixture pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixturePair {
    pub a: hecs::Entity,
    pub b: hecs::Entity,
}

impl FixturePair {
    pub fn new(x: hecs::Entity, y: hecs::Entity) -> Self {
        if x <= y {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }

    pub fn contains(&self, fixture: hecs::Entity) -> bool {
        self.a == fixture || self.b == fixture
    }
}

/// Whether a pair started or stopped touching this step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPhase {
    Begin,
    End,
}

/// Contact transition between two fixtures, reported by [`PhysicsWorld::step`](super::PhysicsWorld::step).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub phase: ContactPhase,
    pub fixture_a: super::FixtureHandle,
    pub fixture_b: super::FixtureHandle,
    /// Body user data of `fixture_a`.
    pub user_data_a: u64,
    /// Body user data of `fixture_b`.
    pub user_data_b: u64,
    /// Position of `fixture_a` in its body's fixture list.
    pub index_a: usize,
    /// Position of `fixture_b` in its body's fixture list.
    pub index_b: usize,
}

/// Set of currently touching fixture pairs.
#[derive(Debug, Default)]
pub struct ContactCache {
    touching: HashSet<FixturePair>,
}

impl ContactCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.touching.len()
    }

    pub fn is_empty(&self) -> bool {
        self.touching.is_empty()
    }

    pub fn is_touching(&self, pair: &FixturePair) -> bool {
        self.touching.contains(pair)
    }

    pub fn pairs(&self) -> impl Iterator<Item = &FixturePair> {
        self.touching.iter()
    }

    /// Replace the touching set, returning pairs that began and ended touching.
    pub fn update(&mut self, touching: HashSet<FixturePair>) -> (Vec<FixturePair>, Vec<FixturePair>) {
        let began = touching.difference(&self.touching).copied().collect();
        let ended = self.touching.difference(&touching).copied().collect();
        self.touching = touching;
        (began, ended)
    }

    /// Drop every pair involving `fixture`, returning the pairs that were touching.
    pub fn remove_fixture(&mut self, fixture: hecs::Entity) -> Vec<FixturePair> {
        let removed: Vec<FixturePair> = self
            .touching
            .iter()
            .filter(|pair| pair.contains(fixture))
            .copied()
            .collect();
        for pair in &removed {
            self.touching.remove(pair);
        }
        removed
    }
}

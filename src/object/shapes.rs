//! Ordered collision shapes that are either detached definitions or live fixtures.

use glam::Vec2;

use crate::error::{PhysicsError, ShapeError};
use crate::math::Transform2d;
use crate::physics::shape::{
    check_material_value, CollisionShape, FixtureDef, FixtureMaterial, ShapeKind,
};
use crate::physics::{BodyHandle, FixtureHandle, PhysicsWorld, SharedPhysics};

use super::fail_closed;

enum ShapeStore {
    Detached(Vec<FixtureDef>),
    Attached {
        physics: SharedPhysics,
        body: BodyHandle,
        fixtures: Vec<FixtureHandle>,
    },
}

/// An object's collision shapes.
///
/// Index `n` refers to the same shape before and after attach/detach. Creation
/// methods return the new index, or `None` after logging why the input was
/// rejected; the `try_` variants return the error instead.
pub struct CollisionShapeSet {
    store: ShapeStore,
    default_material: FixtureMaterial,
}

impl Default for CollisionShapeSet {
    fn default() -> Self {
        Self::new()
    }
}

fn rejected<T>(what: &str, result: Result<T, ShapeError>) -> Option<T> {
    result
        .map_err(|err| tracing::warn!("{} rejected: {}", what, err))
        .ok()
}

impl CollisionShapeSet {
    pub fn new() -> Self {
        Self {
            store: ShapeStore::Detached(Vec::new()),
            default_material: FixtureMaterial::default(),
        }
    }

    pub fn count(&self) -> usize {
        match &self.store {
            ShapeStore::Detached(defs) => defs.len(),
            ShapeStore::Attached { fixtures, .. } => fixtures.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.store, ShapeStore::Attached { .. })
    }

    /// Materialize every definition as a live fixture on `body`, in order.
    pub(crate) fn attach(&mut self, physics: &SharedPhysics, body: BodyHandle) {
        let defs = match &mut self.store {
            ShapeStore::Detached(defs) => std::mem::take(defs),
            ShapeStore::Attached { .. } => {
                fail_closed(format_args!("collision shapes are already attached"));
                return;
            }
        };
        let mut fixtures = Vec::with_capacity(defs.len());
        {
            let mut world = physics.borrow_mut();
            for def in &defs {
                match world.create_fixture(body, def) {
                    Ok(fixture) => fixtures.push(fixture),
                    Err(err) => fail_closed(format_args!("creating fixture failed: {}", err)),
                }
            }
        }
        self.store = ShapeStore::Attached {
            physics: physics.clone(),
            body,
            fixtures,
        };
    }

    /// Copy every live fixture out into a definition. The fixtures themselves
    /// are destroyed with their body.
    pub(crate) fn detach(&mut self) {
        let defs: Vec<FixtureDef> = match &self.store {
            ShapeStore::Attached {
                physics, fixtures, ..
            } => {
                let world = physics.borrow();
                let defs = fixtures
                    .iter()
                    .filter_map(|handle| world.fixture(*handle).map(|f| f.to_def()))
                    .collect();
                defs
            }
            ShapeStore::Detached(_) => {
                fail_closed(format_args!("collision shapes are not attached"));
                return;
            }
        };
        self.store = ShapeStore::Detached(defs);
    }

    /// Live fixture handle to shape index.
    pub(crate) fn index_of_fixture(&self, fixture: FixtureHandle) -> Option<usize> {
        match &self.store {
            ShapeStore::Attached { fixtures, .. } => fixtures.iter().position(|f| *f == fixture),
            ShapeStore::Detached(_) => None,
        }
    }

    fn check_index(&self, index: usize) -> Result<(), ShapeError> {
        let count = self.count();
        if index < count {
            Ok(())
        } else {
            Err(ShapeError::IndexOutOfRange { index, count })
        }
    }

    /// Append an already validated definition.
    fn push(&mut self, def: FixtureDef) -> Result<usize, ShapeError> {
        match &mut self.store {
            ShapeStore::Detached(defs) => {
                defs.push(def);
                Ok(defs.len() - 1)
            }
            ShapeStore::Attached {
                physics,
                body,
                fixtures,
            } => {
                let created = physics.borrow_mut().create_fixture(*body, &def);
                match created {
                    Ok(fixture) => {
                        fixtures.push(fixture);
                        Ok(fixtures.len() - 1)
                    }
                    Err(err) => {
                        fail_closed(format_args!("creating fixture failed: {}", err));
                        Err(err.into())
                    }
                }
            }
        }
    }

    fn add_shape(&mut self, shape: CollisionShape) -> Result<usize, ShapeError> {
        let material = self.default_material;
        self.push(FixtureDef::new(shape, material))
    }

    pub fn try_create_circle(&mut self, radius: f32, center: Vec2) -> Result<usize, ShapeError> {
        self.add_shape(CollisionShape::circle(radius, center)?)
    }

    pub fn create_circle(&mut self, radius: f32, center: Vec2) -> Option<usize> {
        rejected("circle", self.try_create_circle(radius, center))
    }

    pub fn try_create_polygon(&mut self, points: &[Vec2]) -> Result<usize, ShapeError> {
        self.add_shape(CollisionShape::polygon(points)?)
    }

    pub fn create_polygon(&mut self, points: &[Vec2]) -> Option<usize> {
        rejected("polygon", self.try_create_polygon(points))
    }

    pub fn try_create_polygon_box(
        &mut self,
        width: f32,
        height: f32,
        center: Vec2,
        angle: f32,
    ) -> Result<usize, ShapeError> {
        self.add_shape(CollisionShape::polygon_box(width, height, center, angle)?)
    }

    /// Origin-centred box.
    pub fn create_polygon_box(&mut self, width: f32, height: f32) -> Option<usize> {
        self.create_polygon_box_at(width, height, Vec2::ZERO, 0.0)
    }

    pub fn create_polygon_box_at(
        &mut self,
        width: f32,
        height: f32,
        center: Vec2,
        angle: f32,
    ) -> Option<usize> {
        rejected("polygon box", self.try_create_polygon_box(width, height, center, angle))
    }

    pub fn try_create_chain(
        &mut self,
        points: &[Vec2],
        adjacent_start: Option<Vec2>,
        adjacent_end: Option<Vec2>,
    ) -> Result<usize, ShapeError> {
        self.add_shape(CollisionShape::chain(points, adjacent_start, adjacent_end)?)
    }

    pub fn create_chain(
        &mut self,
        points: &[Vec2],
        adjacent_start: Option<Vec2>,
        adjacent_end: Option<Vec2>,
    ) -> Option<usize> {
        rejected("chain", self.try_create_chain(points, adjacent_start, adjacent_end))
    }

    pub fn try_create_edge(
        &mut self,
        start: Vec2,
        end: Vec2,
        adjacent_start: Option<Vec2>,
        adjacent_end: Option<Vec2>,
    ) -> Result<usize, ShapeError> {
        self.add_shape(CollisionShape::edge(start, end, adjacent_start, adjacent_end)?)
    }

    pub fn create_edge(
        &mut self,
        start: Vec2,
        end: Vec2,
        adjacent_start: Option<Vec2>,
        adjacent_end: Option<Vec2>,
    ) -> Option<usize> {
        rejected("edge", self.try_create_edge(start, end, adjacent_start, adjacent_end))
    }

    /// Validate and append a stored record.
    pub fn try_add_fixture_def(&mut self, def: FixtureDef) -> Result<usize, ShapeError> {
        self.push(def.validated()?)
    }

    /// Remove shape `index`; later shapes move down by one.
    pub fn try_delete_shape(&mut self, index: usize) -> Result<(), ShapeError> {
        self.check_index(index)?;
        match &mut self.store {
            ShapeStore::Detached(defs) => {
                defs.remove(index);
            }
            ShapeStore::Attached {
                physics, fixtures, ..
            } => {
                let fixture = fixtures.remove(index);
                if let Err(err) = physics.borrow_mut().destroy_fixture(fixture) {
                    fail_closed(format_args!("destroying fixture failed: {}", err));
                }
            }
        }
        Ok(())
    }

    pub fn delete_shape(&mut self, index: usize) -> bool {
        rejected("delete shape", self.try_delete_shape(index)).is_some()
    }

    pub fn clear(&mut self) {
        while !self.is_empty() {
            let last = self.count() - 1;
            if self.try_delete_shape(last).is_err() {
                break;
            }
        }
    }

    /// Read a shape entry. Out-of-range indices are reported and yield `None`.
    fn with_entry<R>(&self, index: usize, f: impl FnOnce(&CollisionShape, FixtureMaterial) -> R) -> Option<R> {
        if let Err(err) = self.check_index(index) {
            tracing::warn!("{}", err);
            return None;
        }
        match &self.store {
            ShapeStore::Detached(defs) => defs.get(index).map(|d| f(&d.shape, d.material)),
            ShapeStore::Attached {
                physics, fixtures, ..
            } => {
                let world = physics.borrow();
                let fixture = world.fixture(fixtures[index]);
                match fixture {
                    Some(fixture) => Some(f(&fixture.shape, fixture.material)),
                    None => {
                        fail_closed(format_args!("fixture for shape {} is missing", index));
                        None
                    }
                }
            }
        }
    }

    /// Mutate a shape's material on whichever side is authoritative.
    fn update_material(
        &mut self,
        index: usize,
        detached: impl FnOnce(&mut FixtureMaterial),
        live: impl FnOnce(&mut PhysicsWorld, FixtureHandle) -> Result<(), PhysicsError>,
    ) -> bool {
        if let Err(err) = self.check_index(index) {
            tracing::warn!("{}", err);
            return false;
        }
        match &mut self.store {
            ShapeStore::Detached(defs) => detached(&mut defs[index].material),
            ShapeStore::Attached {
                physics, fixtures, ..
            } => {
                if let Err(err) = live(&mut physics.borrow_mut(), fixtures[index]) {
                    fail_closed(format_args!("shape {}: {}", index, err));
                    return false;
                }
            }
        }
        true
    }

    /// Snapshot of one shape entry.
    pub fn fixture_def(&self, index: usize) -> Option<FixtureDef> {
        self.with_entry(index, |shape, material| FixtureDef::new(shape.clone(), material))
    }

    /// Snapshot of every shape entry, in index order.
    pub fn fixture_defs(&self) -> Vec<FixtureDef> {
        (0..self.count()).filter_map(|i| self.fixture_def(i)).collect()
    }

    pub fn shape_kind(&self, index: usize) -> Option<ShapeKind> {
        self.with_entry(index, |shape, _| shape.kind())
    }

    pub fn material(&self, index: usize) -> Option<FixtureMaterial> {
        self.with_entry(index, |_, material| material)
    }

    pub fn density(&self, index: usize) -> f32 {
        self.material(index).map_or(0.0, |m| m.density)
    }

    pub fn friction(&self, index: usize) -> f32 {
        self.material(index).map_or(0.0, |m| m.friction)
    }

    pub fn restitution(&self, index: usize) -> f32 {
        self.material(index).map_or(0.0, |m| m.restitution)
    }

    pub fn is_sensor(&self, index: usize) -> bool {
        self.material(index).is_some_and(|m| m.is_sensor)
    }

    /// Density change on a live fixture recomputes the body's mass.
    pub fn set_density(&mut self, index: usize, density: f32) -> bool {
        if let Err(err) = check_material_value("density", density) {
            tracing::warn!("{}", err);
            return false;
        }
        self.update_material(
            index,
            |m| m.density = density,
            |world, fixture| world.set_fixture_density(fixture, density),
        )
    }

    pub fn set_friction(&mut self, index: usize, friction: f32) -> bool {
        if let Err(err) = check_material_value("friction", friction) {
            tracing::warn!("{}", err);
            return false;
        }
        self.update_material(
            index,
            |m| m.friction = friction,
            |world, fixture| world.set_fixture_friction(fixture, friction),
        )
    }

    pub fn set_restitution(&mut self, index: usize, restitution: f32) -> bool {
        if let Err(err) = check_material_value("restitution", restitution) {
            tracing::warn!("{}", err);
            return false;
        }
        self.update_material(
            index,
            |m| m.restitution = restitution,
            |world, fixture| world.set_fixture_restitution(fixture, restitution),
        )
    }

    pub fn set_sensor(&mut self, index: usize, is_sensor: bool) -> bool {
        self.update_material(
            index,
            |m| m.is_sensor = is_sensor,
            |world, fixture| world.set_fixture_sensor(fixture, is_sensor),
        )
    }

    /// Set all material properties of one shape.
    pub fn set_fixture_material(&mut self, index: usize, material: FixtureMaterial) -> bool {
        if let Err(err) = material.validated() {
            tracing::warn!("{}", err);
            return false;
        }
        self.update_material(
            index,
            |m| *m = material,
            |world, fixture| {
                world.set_fixture_density(fixture, material.density)?;
                world.set_fixture_friction(fixture, material.friction)?;
                world.set_fixture_restitution(fixture, material.restitution)?;
                world.set_fixture_sensor(fixture, material.is_sensor)
            },
        )
    }

    /// Material applied to newly created shapes.
    pub fn default_material(&self) -> FixtureMaterial {
        self.default_material
    }

    pub fn set_default_density(&mut self, density: f32, update_shapes: bool) -> bool {
        if let Err(err) = check_material_value("density", density) {
            tracing::warn!("default {}", err);
            return false;
        }
        self.default_material.density = density;
        if update_shapes {
            for i in 0..self.count() {
                self.set_density(i, density);
            }
        }
        true
    }

    pub fn set_default_friction(&mut self, friction: f32, update_shapes: bool) -> bool {
        if let Err(err) = check_material_value("friction", friction) {
            tracing::warn!("default {}", err);
            return false;
        }
        self.default_material.friction = friction;
        if update_shapes {
            for i in 0..self.count() {
                self.set_friction(i, friction);
            }
        }
        true
    }

    pub fn set_default_restitution(&mut self, restitution: f32, update_shapes: bool) -> bool {
        if let Err(err) = check_material_value("restitution", restitution) {
            tracing::warn!("default {}", err);
            return false;
        }
        self.default_material.restitution = restitution;
        if update_shapes {
            for i in 0..self.count() {
                self.set_restitution(i, restitution);
            }
        }
        true
    }

    /// Read a kind-specific field. A kind mismatch is a caller bug.
    fn kind_field<R: Default>(
        &self,
        index: usize,
        expected: ShapeKind,
        field: impl FnOnce(&CollisionShape) -> Option<R>,
    ) -> R {
        self.with_entry(index, |shape, _| {
            let found = shape.kind();
            field(shape).unwrap_or_else(|| {
                fail_closed(format_args!(
                    "shape {} is a {}, not a {}",
                    index, found, expected
                ));
                R::default()
            })
        })
        .unwrap_or_default()
    }

    pub fn circle_radius(&self, index: usize) -> f32 {
        self.kind_field(index, ShapeKind::Circle, |shape| match shape {
            CollisionShape::Circle { radius, .. } => Some(*radius),
            _ => None,
        })
    }

    pub fn circle_center(&self, index: usize) -> Vec2 {
        self.kind_field(index, ShapeKind::Circle, |shape| match shape {
            CollisionShape::Circle { center, .. } => Some(*center),
            _ => None,
        })
    }

    pub fn polygon_point_count(&self, index: usize) -> usize {
        self.kind_field(index, ShapeKind::Polygon, |shape| match shape {
            CollisionShape::Polygon { vertices } => Some(vertices.len()),
            _ => None,
        })
    }

    pub fn polygon_points(&self, index: usize) -> Vec<Vec2> {
        self.kind_field(index, ShapeKind::Polygon, |shape| match shape {
            CollisionShape::Polygon { vertices } => Some(vertices.clone()),
            _ => None,
        })
    }

    pub fn polygon_point(&self, index: usize, point: usize) -> Vec2 {
        point_at(self.polygon_points(index), point)
    }

    pub fn chain_point_count(&self, index: usize) -> usize {
        self.kind_field(index, ShapeKind::Chain, |shape| match shape {
            CollisionShape::Chain { vertices, .. } => Some(vertices.len()),
            _ => None,
        })
    }

    pub fn chain_points(&self, index: usize) -> Vec<Vec2> {
        self.kind_field(index, ShapeKind::Chain, |shape| match shape {
            CollisionShape::Chain { vertices, .. } => Some(vertices.clone()),
            _ => None,
        })
    }

    pub fn chain_point(&self, index: usize, point: usize) -> Vec2 {
        point_at(self.chain_points(index), point)
    }

    fn chain_adjacent(&self, index: usize, end: bool) -> Option<Vec2> {
        self.kind_field(index, ShapeKind::Chain, |shape| match shape {
            CollisionShape::Chain {
                adjacent_start,
                adjacent_end,
                ..
            } => Some(if end { *adjacent_end } else { *adjacent_start }),
            _ => None,
        })
    }

    pub fn chain_has_adjacent_start(&self, index: usize) -> bool {
        self.chain_adjacent(index, false).is_some()
    }

    pub fn chain_has_adjacent_end(&self, index: usize) -> bool {
        self.chain_adjacent(index, true).is_some()
    }

    /// Zero when the chain has no adjacent start vertex.
    pub fn chain_adjacent_start(&self, index: usize) -> Vec2 {
        self.chain_adjacent(index, false).unwrap_or(Vec2::ZERO)
    }

    pub fn chain_adjacent_end(&self, index: usize) -> Vec2 {
        self.chain_adjacent(index, true).unwrap_or(Vec2::ZERO)
    }

    pub fn edge_start(&self, index: usize) -> Vec2 {
        self.kind_field(index, ShapeKind::Edge, |shape| match shape {
            CollisionShape::Edge { start, .. } => Some(*start),
            _ => None,
        })
    }

    pub fn edge_end(&self, index: usize) -> Vec2 {
        self.kind_field(index, ShapeKind::Edge, |shape| match shape {
            CollisionShape::Edge { end, .. } => Some(*end),
            _ => None,
        })
    }

    fn edge_adjacent(&self, index: usize, end: bool) -> Option<Vec2> {
        self.kind_field(index, ShapeKind::Edge, |shape| match shape {
            CollisionShape::Edge {
                adjacent_start,
                adjacent_end,
                ..
            } => Some(if end { *adjacent_end } else { *adjacent_start }),
            _ => None,
        })
    }

    pub fn edge_has_adjacent_start(&self, index: usize) -> bool {
        self.edge_adjacent(index, false).is_some()
    }

    pub fn edge_has_adjacent_end(&self, index: usize) -> bool {
        self.edge_adjacent(index, true).is_some()
    }

    /// Zero when the edge has no adjacent start vertex.
    pub fn edge_adjacent_start(&self, index: usize) -> Vec2 {
        self.edge_adjacent(index, false).unwrap_or(Vec2::ZERO)
    }

    pub fn edge_adjacent_end(&self, index: usize) -> Vec2 {
        self.edge_adjacent(index, true).unwrap_or(Vec2::ZERO)
    }

    /// Whether `world_point` lies inside shape `index` placed at `xf`.
    pub fn test_point(&self, index: usize, xf: &Transform2d, world_point: Vec2) -> bool {
        self.with_entry(index, |shape, _| shape.test_point(xf, world_point))
            .unwrap_or(false)
    }

    /// Deep-copy one shape (`Some(index)`) or all shapes onto `target`.
    ///
    /// Returns the target index of the copied shape, or of the first copied
    /// shape when copying all. Nothing is modified on failure.
    pub fn try_copy_shapes(
        &self,
        target: &mut CollisionShapeSet,
        clear_target_first: bool,
        index: Option<usize>,
    ) -> Result<usize, ShapeError> {
        let defs = match index {
            Some(index) => {
                self.check_index(index)?;
                self.fixture_def(index).into_iter().collect::<Vec<_>>()
            }
            None => self.fixture_defs(),
        };
        if defs.is_empty() {
            return Err(ShapeError::NothingToCopy);
        }
        if clear_target_first {
            target.clear();
        }
        let first = target.count();
        for def in defs {
            target.push(def)?;
        }
        Ok(first)
    }

    pub fn copy_shapes(
        &self,
        target: &mut CollisionShapeSet,
        clear_target_first: bool,
        index: Option<usize>,
    ) -> Option<usize> {
        rejected("copy shapes", self.try_copy_shapes(target, clear_target_first, index))
    }
}

fn point_at(points: Vec<Vec2>, point: usize) -> Vec2 {
    match points.get(point) {
        Some(p) => *p,
        None => {
            tracing::warn!("point index {} out of range ({} points)", point, points.len());
            Vec2::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::rigid_body::BodyDef;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn populated() -> CollisionShapeSet {
        let mut set = CollisionShapeSet::new();
        set.create_circle(0.5, Vec2::new(1.0, 0.0)).unwrap();
        set.create_polygon_box(2.0, 1.0).unwrap();
        set.create_chain(
            &[Vec2::ZERO, Vec2::X, Vec2::new(2.0, 1.0)],
            Some(Vec2::NEG_X),
            None,
        )
        .unwrap();
        set.create_edge(Vec2::ZERO, Vec2::Y, None, Some(Vec2::new(0.0, 2.0)))
            .unwrap();
        set.set_density(0, 3.0);
        set.set_friction(1, 0.7);
        set.set_restitution(2, 0.4);
        set.set_sensor(3, true);
        set
    }

    fn attached_to_new_body(set: &mut CollisionShapeSet) -> SharedPhysics {
        let physics = Rc::new(RefCell::new(PhysicsWorld::default()));
        let body = physics.borrow_mut().create_body(&BodyDef::default());
        set.attach(&physics, body);
        physics
    }

    #[test]
    fn test_create_returns_sequential_indices() {
        let mut set = CollisionShapeSet::new();
        assert_eq!(set.create_circle(1.0, Vec2::ZERO), Some(0));
        assert_eq!(set.create_polygon_box(1.0, 1.0), Some(1));
        assert_eq!(set.count(), 2);
    }

    #[test]
    fn test_invalid_input_leaves_set_unchanged() {
        let mut set = CollisionShapeSet::new();
        assert_eq!(set.create_circle(0.0, Vec2::ZERO), None);
        assert_eq!(set.create_polygon(&[Vec2::ZERO, Vec2::X]), None);
        assert_eq!(set.create_chain(&[Vec2::ZERO], None, None), None);
        assert_eq!(set.create_polygon_box(-1.0, 1.0), None);
        assert!(set.is_empty());
        assert_eq!(
            set.try_create_circle(-2.0, Vec2::ZERO),
            Err(ShapeError::InvalidRadius(-2.0))
        );
    }

    #[test]
    fn test_attach_detach_round_trip() {
        let mut set = populated();
        let before = set.fixture_defs();

        let physics = attached_to_new_body(&mut set);
        assert!(set.is_attached());
        assert_eq!(physics.borrow().fixture_count(), 4);
        assert_eq!(set.fixture_defs(), before);

        set.detach();
        assert!(!set.is_attached());
        assert_eq!(set.fixture_defs(), before);
    }

    #[test]
    fn test_accessors_match_across_states() {
        let mut set = populated();
        let _physics = attached_to_new_body(&mut set);

        assert!((set.circle_radius(0) - 0.5).abs() < 1e-6);
        assert_eq!(set.circle_center(0), Vec2::new(1.0, 0.0));
        assert_eq!(set.polygon_point_count(1), 4);
        assert_eq!(set.chain_point_count(2), 3);
        assert_eq!(set.chain_point(2, 2), Vec2::new(2.0, 1.0));
        assert!(set.chain_has_adjacent_start(2));
        assert!(!set.chain_has_adjacent_end(2));
        assert_eq!(set.chain_adjacent_start(2), Vec2::NEG_X);
        assert_eq!(set.chain_adjacent_end(2), Vec2::ZERO);
        assert_eq!(set.edge_end(3), Vec2::Y);
        assert!(set.edge_has_adjacent_end(3));
        assert_eq!(set.edge_adjacent_end(3), Vec2::new(0.0, 2.0));
        assert!(set.is_sensor(3));
        assert!((set.density(0) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_live_density_updates_mass() {
        let mut set = CollisionShapeSet::new();
        set.create_polygon_box(1.0, 1.0).unwrap();
        let physics = Rc::new(RefCell::new(PhysicsWorld::default()));
        let body = physics.borrow_mut().create_body(&BodyDef::default());
        set.attach(&physics, body);
        assert!((physics.borrow().body(body).unwrap().mass() - 1.0).abs() < 1e-5);

        assert!(set.set_density(0, 4.0));
        assert!((physics.borrow().body(body).unwrap().mass() - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_delete_shifts_later_indices() {
        for attached in [false, true] {
            let mut set = populated();
            let _physics = attached.then(|| attached_to_new_body(&mut set));
            let before = set.fixture_defs();

            assert!(set.delete_shape(1));
            let after = set.fixture_defs();
            assert_eq!(after.len(), before.len() - 1);
            assert_eq!(after[0], before[0]);
            assert_eq!(after[1], before[2]);
            assert_eq!(after[2], before[3]);

            assert!(!set.delete_shape(10));
            assert_eq!(set.count(), 3);
        }
    }

    #[test]
    fn test_copy_all_and_single() {
        let source = populated();
        let mut target = CollisionShapeSet::new();
        target.create_circle(9.0, Vec2::ZERO).unwrap();

        assert_eq!(source.copy_shapes(&mut target, false, None), Some(1));
        assert_eq!(target.count(), 5);
        assert_eq!(&target.fixture_defs()[1..], &source.fixture_defs()[..]);

        assert_eq!(source.copy_shapes(&mut target, true, Some(2)), Some(0));
        assert_eq!(target.fixture_defs(), vec![source.fixture_def(2).unwrap()]);
    }

    #[test]
    fn test_copy_between_attach_states() {
        let mut source = populated();
        let _physics = attached_to_new_body(&mut source);
        let mut target = CollisionShapeSet::new();
        let _target_physics = attached_to_new_body(&mut target);

        assert_eq!(source.copy_shapes(&mut target, true, None), Some(0));
        assert_eq!(target.fixture_defs(), source.fixture_defs());
    }

    #[test]
    fn test_copy_failures_do_not_modify_target() {
        let empty = CollisionShapeSet::new();
        let source = populated();
        let mut target = populated();

        assert_eq!(empty.copy_shapes(&mut target, true, None), None);
        assert_eq!(source.copy_shapes(&mut target, true, Some(7)), None);
        assert_eq!(target.count(), 4);
    }

    #[test]
    fn test_default_material_applies_to_new_and_existing() {
        let mut set = CollisionShapeSet::new();
        set.create_circle(1.0, Vec2::ZERO).unwrap();
        set.set_default_friction(0.9, false);
        set.create_circle(1.0, Vec2::ZERO).unwrap();
        assert!((set.friction(0) - 0.2).abs() < 1e-6);
        assert!((set.friction(1) - 0.9).abs() < 1e-6);

        set.set_default_restitution(0.5, true);
        assert!((set.restitution(0) - 0.5).abs() < 1e-6);
        assert!((set.restitution(1) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_default_material_is_rejected() {
        let mut set = CollisionShapeSet::new();
        set.create_circle(1.0, Vec2::ZERO).unwrap();
        assert!(!set.set_default_density(-5.0, false));
        assert!(!set.set_default_friction(f32::NAN, true));
        assert!(!set.set_default_restitution(f32::INFINITY, true));
        assert_eq!(set.default_material(), FixtureMaterial::default());

        set.create_circle(1.0, Vec2::ZERO).unwrap();
        assert_eq!(set.material(1), Some(FixtureMaterial::default()));
        assert!((set.friction(0) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_rejected_fixture_material_writes_nothing() {
        for attach in [false, true] {
            let mut set = CollisionShapeSet::new();
            set.create_circle(1.0, Vec2::ZERO).unwrap();
            let _physics = attach.then(|| attached_to_new_body(&mut set));
            let bad = FixtureMaterial {
                density: 7.0,
                friction: -1.0,
                restitution: 0.3,
                is_sensor: true,
            };
            assert!(!set.set_fixture_material(0, bad));
            assert_eq!(set.material(0), Some(FixtureMaterial::default()));

            let good = FixtureMaterial {
                friction: 0.6,
                ..bad
            };
            assert!(set.set_fixture_material(0, good));
            assert_eq!(set.material(0), Some(good));
        }
    }

    #[test]
    fn test_loaded_record_with_bad_material_is_rejected() {
        let mut set = CollisionShapeSet::new();
        let def = FixtureDef::new(
            CollisionShape::circle(1.0, Vec2::ZERO).unwrap(),
            FixtureMaterial {
                restitution: -0.1,
                ..Default::default()
            },
        );
        assert!(matches!(
            set.try_add_fixture_def(def),
            Err(ShapeError::InvalidMaterial { property: "restitution", .. })
        ));
        assert!(set.is_empty());
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_failed_fixture_creation_returns_error() {
        let mut set = CollisionShapeSet::new();
        set.create_circle(1.0, Vec2::ZERO).unwrap();
        let physics = Rc::new(RefCell::new(PhysicsWorld::default()));
        let body = physics.borrow_mut().create_body(&BodyDef::default());
        set.attach(&physics, body);
        physics.borrow_mut().destroy_body(body).unwrap();

        assert_eq!(
            set.try_create_circle(1.0, Vec2::ZERO),
            Err(ShapeError::Physics(PhysicsError::InvalidBody))
        );
        assert_eq!(set.create_circle(1.0, Vec2::ZERO), None);
        assert_eq!(set.count(), 1);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "creating fixture failed")]
    fn test_failed_fixture_creation_is_fatal() {
        let mut set = CollisionShapeSet::new();
        let physics = Rc::new(RefCell::new(PhysicsWorld::default()));
        let body = physics.borrow_mut().create_body(&BodyDef::default());
        set.attach(&physics, body);
        physics.borrow_mut().destroy_body(body).unwrap();
        let _ = set.try_create_circle(1.0, Vec2::ZERO);
    }

    #[test]
    fn test_out_of_range_accessor_returns_default() {
        let set = populated();
        assert_eq!(set.shape_kind(9), None);
        assert_eq!(set.density(9), 0.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "not a circle")]
    fn test_wrong_kind_accessor_is_fatal() {
        let set = populated();
        set.circle_radius(1);
    }
}

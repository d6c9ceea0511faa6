//! Scene objects: the entity-facing façade over body, shapes and tick state.
//!
//! A [`SceneObject`] is usable on its own (detached) and becomes live when
//! added to a [`Scene`](crate::scene::Scene). Both states expose the same API.

pub mod body;
pub mod motion;
pub mod proxy;
pub mod shapes;
pub mod tick;

use std::fmt;

use glam::Vec2;
use slotmap::{Key, KeyData};

use crate::error::{MotionError, SceneError, ShapeError};
use crate::math::{
    area_from_corners, is_point_in_oobb, local_sized_oobb, Aabb2d, Oobb, Transform2d, MIN_OBJECT_SIZE,
};
use crate::physics::contact::ContactPhase;
use crate::physics::rigid_body::{BodyDef, BodyType};
use crate::physics::shape::FixtureDef;
use crate::physics::{FixtureHandle, SharedPhysics};
use crate::scene::scheduler::EventId;
use crate::scene::world_query::SharedWorldQuery;
use crate::scene::{ObjectId, SceneEvent, SharedScheduler, TickContact};

use self::body::RigidBodyState;
use self::motion::{plan_move, plan_rotate, MotionCommand, MotionEvent, MotionKind, MotionState};
use self::proxy::WorldQueryProxy;
use self::shapes::CollisionShapeSet;
use self::tick::TickSpatials;

/// Report a broken internal invariant.
///
/// Debug builds stop here; release builds log and let the caller fail closed.
#[track_caller]
pub(crate) fn fail_closed(args: fmt::Arguments<'_>) {
    tracing::error!("{}", args);
    if cfg!(debug_assertions) {
        panic!("{}", args);
    }
}

/// Body user data carrying an object id.
pub(crate) fn object_user_data(id: ObjectId) -> u64 {
    id.data().as_ffi()
}

pub(crate) fn object_from_user_data(user_data: u64) -> ObjectId {
    ObjectId::from(KeyData::from_ffi(user_data))
}

/// A gathered contact, keyed by the fixture pair that produced it.
#[derive(Debug, Clone, Copy)]
struct GatheredContact {
    fixture: FixtureHandle,
    other_fixture: FixtureHandle,
    contact: TickContact,
}

/// Shared scene services an attached object talks to.
pub(crate) struct SceneLink {
    pub(crate) id: ObjectId,
    pub(crate) physics: SharedPhysics,
    pub(crate) world_query: SharedWorldQuery,
    pub(crate) scheduler: SharedScheduler,
}

/// Which queued events an object reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallbackFlags {
    /// [`SceneEvent::Updated`] after every tick.
    pub update: bool,
    /// [`SceneEvent::CollisionBegan`] / [`SceneEvent::CollisionEnded`].
    pub collision: bool,
    /// [`SceneEvent::Woke`] / [`SceneEvent::Slept`] on awake-state changes.
    pub sleeping: bool,
}

/// A spatial, physical entity of a scene.
pub struct SceneObject {
    link: Option<SceneLink>,
    enabled: bool,
    size: Vec2,
    local_oobb: Oobb,
    body: RigidBodyState,
    shapes: CollisionShapeSet,
    tick: TickSpatials,
    proxy: WorldQueryProxy,
    motion: MotionState,
    lifetime: f32,
    callbacks: CallbackFlags,
    gather_contacts: bool,
    contacts: Vec<GatheredContact>,
    last_awake: bool,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneObject {
    /// Detached 1x1 dynamic object at the origin with no shapes.
    pub fn new() -> Self {
        Self::with_body(BodyDef::default())
    }

    pub fn with_body(def: BodyDef) -> Self {
        let size = Vec2::ONE;
        let local_oobb = local_sized_oobb(size);
        let body = RigidBodyState::new(def);
        let tick = TickSpatials::new(body.transform(), &local_oobb);
        let last_awake = body.is_awake();
        Self {
            link: None,
            enabled: true,
            size,
            local_oobb,
            body,
            shapes: CollisionShapeSet::new(),
            tick,
            proxy: WorldQueryProxy::new(),
            motion: MotionState::default(),
            lifetime: 0.0,
            callbacks: CallbackFlags::default(),
            gather_contacts: false,
            contacts: Vec::new(),
            last_awake,
        }
    }

    /// Id in the owning scene, if any.
    pub fn id(&self) -> Option<ObjectId> {
        self.link.as_ref().map(|link| link.id)
    }

    pub fn is_in_scene(&self) -> bool {
        self.link.is_some()
    }

    pub fn body(&self) -> &RigidBodyState {
        &self.body
    }

    /// Mutable body access. Teleports should go through [`SceneObject::set_position`]
    /// and friends so the render state does not interpolate across them.
    pub fn body_mut(&mut self) -> &mut RigidBodyState {
        &mut self.body
    }

    pub fn shapes(&self) -> &CollisionShapeSet {
        &self.shapes
    }

    pub fn shapes_mut(&mut self) -> &mut CollisionShapeSet {
        &mut self.shapes
    }

    pub fn motion(&self) -> &MotionState {
        &self.motion
    }

    pub fn tick_spatials(&self) -> &TickSpatials {
        &self.tick
    }

    pub fn proxy(&self) -> &WorldQueryProxy {
        &self.proxy
    }

    // --- lifecycle -------------------------------------------------------

    /// Go live in a scene: body, then fixtures, then the spatial index.
    pub(crate) fn attach(&mut self, link: SceneLink) -> Result<(), SceneError> {
        if self.link.is_some() {
            fail_closed(format_args!("scene object is already in a scene"));
            return Err(SceneError::AlreadyAttached);
        }
        let handle = self
            .body
            .attach(&link.physics, self.enabled, object_user_data(link.id))?;
        self.shapes.attach(&link.physics, handle);
        self.last_awake = self.body.is_awake();

        self.tick.reset(self.body.transform(), &self.local_oobb);
        self.proxy
            .register(link.world_query.clone(), link.id, self.tick.current_aabb());
        tracing::debug!(
            "object {:?} attached with {} shapes",
            link.id,
            self.shapes.count()
        );
        self.link = Some(link);
        Ok(())
    }

    /// Leave the scene. Shapes are captured before the body goes away.
    pub(crate) fn detach(&mut self) -> Result<(), SceneError> {
        let Some(link) = self.link.take() else {
            fail_closed(format_args!("scene object is not in a scene"));
            return Err(SceneError::NotAttached);
        };
        {
            let mut scheduler = link.scheduler.borrow_mut();
            if let Some(command) = self.motion.move_to.take() {
                scheduler.cancel(command.event);
            }
            if let Some(command) = self.motion.rotate_to.take() {
                scheduler.cancel(command.event);
            }
        }
        self.shapes.detach();
        self.contacts.clear();
        self.body.detach()?;
        self.proxy.unregister();
        tracing::debug!("object {:?} detached", link.id);
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabled objects are skipped by ticks and their live body is inactive.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if self.body.is_attached() {
            self.body.set_active(enabled);
        }
    }

    // --- spatial -----------------------------------------------------------

    pub fn position(&self) -> Vec2 {
        self.body.position()
    }

    pub fn angle(&self) -> f32 {
        self.body.angle()
    }

    pub fn transform(&self) -> Transform2d {
        self.body.transform()
    }

    /// Teleport. The render state snaps to the new transform.
    pub fn set_transform(&mut self, position: Vec2, angle: f32) {
        self.body.set_transform(position, angle);
        self.reset_tick_spatials(false);
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.body.set_position(position);
        self.reset_tick_spatials(false);
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.body.set_angle(angle);
        self.reset_tick_spatials(false);
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn half_size(&self) -> Vec2 {
        self.size * 0.5
    }

    /// Each axis is clamped to [`MIN_OBJECT_SIZE`].
    pub fn set_size(&mut self, size: Vec2) {
        let clamped = size.max(Vec2::splat(MIN_OBJECT_SIZE));
        if clamped != size {
            tracing::warn!("object size {} clamped to {}", size, clamped);
        }
        self.size = clamped;
        self.local_oobb = local_sized_oobb(clamped);
        self.reset_tick_spatials(true);
    }

    /// Fit the object to the axis-aligned area spanned by two corners.
    pub fn set_area(&mut self, corner1: Vec2, corner2: Vec2) {
        let (center, size) = area_from_corners(corner1, corner2);
        self.set_transform(center, 0.0);
        self.set_size(size);
    }

    pub fn local_oobb(&self) -> &Oobb {
        &self.local_oobb
    }

    pub fn current_aabb(&self) -> Aabb2d {
        self.tick.current_aabb()
    }

    pub fn render_position(&self) -> Vec2 {
        self.tick.render().position
    }

    pub fn render_angle(&self) -> f32 {
        self.tick.render().angle
    }

    pub fn render_oobb(&self) -> &Oobb {
        self.tick.render_oobb()
    }

    pub fn is_spatially_dirty(&self) -> bool {
        self.tick.is_dirty()
    }

    pub fn is_point_in_oobb(&self, world_point: Vec2) -> bool {
        is_point_in_oobb(self.tick.render_oobb(), world_point)
    }

    /// Whether `world_point` lies inside collision shape `index` at the current transform.
    pub fn is_point_in_collision_shape(&self, index: usize, world_point: Vec2) -> bool {
        self.shapes.test_point(index, &self.body.transform(), world_point)
    }

    fn reset_tick_spatials(&mut self, reinsert: bool) {
        self.tick.reset(self.body.transform(), &self.local_oobb);
        if !self.proxy.is_registered() {
            return;
        }
        let aabb = self.tick.current_aabb();
        if reinsert {
            self.proxy.reinsert(aabb);
        } else {
            self.proxy.update(aabb, Vec2::ZERO);
        }
    }

    // --- tick ----------------------------------------------------------------

    pub(crate) fn pre_integrate(&mut self) {
        self.tick.pre_integrate(self.body.transform(), &self.local_oobb);
    }

    /// Returns true when the lifetime ran out during this step.
    pub(crate) fn integrate(&mut self, dt: f32) -> bool {
        if let Some(update) = self.tick.integrate(self.body.transform(), &self.local_oobb) {
            self.proxy.update(update.aabb, update.displacement);
        }
        if self.lifetime > 0.0 {
            self.lifetime -= dt;
            if self.lifetime <= 0.0 {
                self.lifetime = 0.0;
                return true;
            }
        }
        false
    }

    pub(crate) fn post_integrate(&mut self, events: &mut Vec<SceneEvent>) {
        let Some(id) = self.id() else {
            return;
        };
        if self.callbacks.update {
            events.push(SceneEvent::Updated(id));
        }
        if self.callbacks.sleeping {
            let awake = self.body.is_awake();
            if awake != self.last_awake {
                self.last_awake = awake;
                events.push(if awake {
                    SceneEvent::Woke(id)
                } else {
                    SceneEvent::Slept(id)
                });
            }
        }
    }

    pub(crate) fn interpolate(&mut self, factor: f32) {
        self.tick
            .interpolate(self.body.transform(), factor, &self.local_oobb);
    }

    /// Fold a physics contact transition seen from this object.
    /// `fixture` is this object's side of the pair, `other_fixture` the partner's.
    pub(crate) fn record_contact(
        &mut self,
        contact: TickContact,
        fixture: FixtureHandle,
        other_fixture: FixtureHandle,
        phase: ContactPhase,
    ) -> Option<SceneEvent> {
        match phase {
            ContactPhase::Begin => {
                if self.gather_contacts {
                    self.contacts.push(GatheredContact {
                        fixture,
                        other_fixture,
                        contact,
                    });
                }
                self.callbacks
                    .collision
                    .then_some(SceneEvent::CollisionBegan(contact))
            }
            ContactPhase::End => {
                self.contacts
                    .retain(|c| c.fixture != fixture || c.other_fixture != other_fixture);
                self.callbacks
                    .collision
                    .then_some(SceneEvent::CollisionEnded(contact))
            }
        }
    }

    // --- lifetime, callbacks, contacts -----------------------------------------

    /// Remaining lifetime in seconds; zero when no countdown is running.
    pub fn lifetime(&self) -> f32 {
        self.lifetime
    }

    /// Start a countdown after which the scene removes the object. Zero or
    /// less disables it.
    pub fn set_lifetime(&mut self, seconds: f32) {
        self.lifetime = seconds.max(0.0);
    }

    pub fn callbacks(&self) -> CallbackFlags {
        self.callbacks
    }

    pub fn set_callbacks(&mut self, callbacks: CallbackFlags) {
        if callbacks.sleeping && !self.callbacks.sleeping {
            self.last_awake = self.body.is_awake();
        }
        self.callbacks = callbacks;
    }

    pub fn set_update_callback(&mut self, enabled: bool) {
        self.set_callbacks(CallbackFlags {
            update: enabled,
            ..self.callbacks
        });
    }

    pub fn set_collision_callback(&mut self, enabled: bool) {
        self.set_callbacks(CallbackFlags {
            collision: enabled,
            ..self.callbacks
        });
    }

    pub fn set_sleeping_callback(&mut self, enabled: bool) {
        self.set_callbacks(CallbackFlags {
            sleeping: enabled,
            ..self.callbacks
        });
    }

    pub fn is_gathering_contacts(&self) -> bool {
        self.gather_contacts
    }

    /// Keep a list of current contacts. Turning it off drops the list.
    pub fn set_gather_contacts(&mut self, gather: bool) {
        self.gather_contacts = gather;
        if !gather {
            self.contacts.clear();
        }
    }

    /// Contacts that began and have not ended yet. `shape` follows later
    /// deletions on this object; `other_shape` is the index the partner
    /// reported when the contact began.
    pub fn current_contacts(&self) -> Vec<TickContact> {
        self.contacts
            .iter()
            .map(|gathered| TickContact {
                shape: self
                    .shapes
                    .index_of_fixture(gathered.fixture)
                    .unwrap_or(gathered.contact.shape),
                ..gathered.contact
            })
            .collect()
    }

    // --- motion --------------------------------------------------------------

    fn motion_link(&self) -> Result<(ObjectId, SharedScheduler), MotionError> {
        let link = self.link.as_ref().ok_or(MotionError::NotInScene)?;
        if self.body.body_type() == BodyType::Static {
            return Err(MotionError::StaticBody);
        }
        Ok((link.id, link.scheduler.clone()))
    }

    /// Drive the object to `target` at `speed` units per second.
    pub fn try_move_to(
        &mut self,
        target: Vec2,
        speed: f32,
        auto_stop: bool,
        warp_to_target: bool,
    ) -> Result<(), MotionError> {
        let (id, scheduler) = self.motion_link()?;
        if speed.is_nan() || speed <= 0.0 {
            return Err(MotionError::InvalidSpeed(speed));
        }
        self.cancel_move_to(false);

        let plan = plan_move(self.body.position(), target, speed);
        self.body.set_linear_velocity(plan.linear_velocity);
        let event = scheduler.borrow_mut().post(
            plan.duration,
            MotionEvent {
                object: id,
                kind: MotionKind::Move,
            },
        );
        self.motion.move_to = Some(MotionCommand {
            event,
            target,
            auto_stop,
            warp_to_target,
        });
        tracing::trace!("object {:?} moving to {} over {:.3}s", id, target, plan.duration);
        Ok(())
    }

    /// Returns false, leaving the velocity untouched, if the command was rejected.
    pub fn move_to(&mut self, target: Vec2, speed: f32, auto_stop: bool, warp_to_target: bool) -> bool {
        match self.try_move_to(target, speed, auto_stop, warp_to_target) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("move_to rejected: {}", err);
                false
            }
        }
    }

    /// Rotate along the shortest arc to `target` at `speed` radians per second.
    pub fn try_rotate_to(
        &mut self,
        target: f32,
        speed: f32,
        auto_stop: bool,
        warp_to_target: bool,
    ) -> Result<(), MotionError> {
        let (id, scheduler) = self.motion_link()?;
        if speed.is_nan() || speed <= 0.0 {
            return Err(MotionError::InvalidSpeed(speed));
        }
        self.cancel_rotate_to(false);

        let plan = plan_rotate(self.body.angle(), target, speed);
        self.body.set_angular_velocity(plan.angular_velocity);
        let event = scheduler.borrow_mut().post(
            plan.duration,
            MotionEvent {
                object: id,
                kind: MotionKind::Rotate,
            },
        );
        self.motion.rotate_to = Some(MotionCommand {
            event,
            target,
            auto_stop,
            warp_to_target,
        });
        Ok(())
    }

    pub fn rotate_to(&mut self, target: f32, speed: f32, auto_stop: bool, warp_to_target: bool) -> bool {
        match self.try_rotate_to(target, speed, auto_stop, warp_to_target) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("rotate_to rejected: {}", err);
                false
            }
        }
    }

    fn cancel_event(&self, event: EventId) {
        if let Some(link) = &self.link {
            link.scheduler.borrow_mut().cancel(event);
        }
    }

    /// Drop an outstanding move command, optionally stopping linear motion.
    pub fn cancel_move_to(&mut self, auto_stop: bool) {
        if let Some(command) = self.motion.move_to.take() {
            self.cancel_event(command.event);
            if auto_stop {
                self.body.set_linear_velocity(Vec2::ZERO);
            }
        }
    }

    pub fn cancel_rotate_to(&mut self, auto_stop: bool) {
        if let Some(command) = self.motion.rotate_to.take() {
            self.cancel_event(command.event);
            if auto_stop {
                self.body.set_angular_velocity(0.0);
            }
        }
    }

    pub fn is_move_to_complete(&self) -> bool {
        self.motion.is_move_to_complete()
    }

    pub fn is_rotate_to_complete(&self) -> bool {
        self.motion.is_rotate_to_complete()
    }

    /// Finish the command a fired scheduler event belongs to. Stale events are ignored.
    pub(crate) fn complete_motion(&mut self, event: EventId, kind: MotionKind, events: &mut Vec<SceneEvent>) {
        let Some(id) = self.id() else {
            return;
        };
        match kind {
            MotionKind::Move => {
                let Some(command) = self.motion.take_move(event) else {
                    return;
                };
                if command.auto_stop {
                    self.body.set_linear_velocity(Vec2::ZERO);
                }
                if command.warp_to_target {
                    self.set_position(command.target);
                }
                events.push(SceneEvent::MoveToComplete(id));
            }
            MotionKind::Rotate => {
                let Some(command) = self.motion.take_rotate(event) else {
                    return;
                };
                if command.auto_stop {
                    self.body.set_angular_velocity(0.0);
                }
                if command.warp_to_target {
                    self.set_angle(command.target);
                }
                events.push(SceneEvent::RotateToComplete(id));
            }
        }
    }

    // --- copying and persistence ----------------------------------------------

    /// Copy spatial, body, material, shape and callback state onto `target`.
    pub fn copy_to(&self, target: &mut SceneObject) {
        let def = self.body.to_def();
        target.set_enabled(self.enabled);
        target.body.copy_from_def(&def);
        target.set_transform(def.position, def.angle);
        target.set_size(self.size);

        let material = self.shapes.default_material();
        target.shapes.set_default_density(material.density, false);
        target.shapes.set_default_friction(material.friction, false);
        target.shapes.set_default_restitution(material.restitution, false);
        target.shapes.clear();
        if !self.shapes.is_empty() {
            self.shapes.copy_shapes(&mut target.shapes, true, None);
        }

        target.set_lifetime(self.lifetime);
        target.set_callbacks(self.callbacks);
        target.set_gather_contacts(self.gather_contacts);
    }

    /// Copy one (`Some(index)`) or all collision shapes onto `target`.
    pub fn copy_collision_shapes(
        &self,
        target: &mut SceneObject,
        clear_target_first: bool,
        index: Option<usize>,
    ) -> Option<usize> {
        self.shapes
            .copy_shapes(&mut target.shapes, clear_target_first, index)
    }

    /// Persistence records for every collision shape, in index order.
    pub fn collision_shape_records(&self) -> Vec<FixtureDef> {
        self.shapes.fixture_defs()
    }

    /// Re-create shapes from stored records through the validating path.
    ///
    /// Invalid records are reported and skipped. Returns how many were loaded.
    pub fn load_collision_shape_records(&mut self, records: impl IntoIterator<Item = FixtureDef>) -> usize {
        let mut loaded = 0;
        for record in records {
            match self.shapes.try_add_fixture_def(record) {
                Ok(_) => loaded += 1,
                Err(err) => tracing::warn!("skipping collision shape record: {}", err),
            }
        }
        loaded
    }

    /// Validate records without touching the object.
    pub fn check_collision_shape_records(records: &[FixtureDef]) -> Result<(), ShapeError> {
        records
            .iter()
            .try_for_each(|record| record.clone().validated().map(|_| ()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::shape::CollisionShape;

    #[test]
    fn test_detached_defaults() {
        let object = SceneObject::new();
        assert!(!object.is_in_scene());
        assert!(object.is_enabled());
        assert_eq!(object.size(), Vec2::ONE);
        assert_eq!(object.position(), Vec2::ZERO);
        assert_eq!(object.body().body_type(), BodyType::Dynamic);
        assert!(object.shapes().is_empty());
        assert!(object.is_move_to_complete());
        assert!(object.is_rotate_to_complete());
    }

    #[test]
    fn test_motion_requires_scene() {
        let mut object = SceneObject::new();
        assert_eq!(
            object.try_move_to(Vec2::X, 1.0, true, true),
            Err(MotionError::NotInScene)
        );
        assert!(!object.rotate_to(1.0, 1.0, true, true));
        assert_eq!(object.body().linear_velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_set_area_normalizes_corners() {
        let eps = 1e-6;
        let mut object = SceneObject::new();
        object.set_angle(1.0);
        object.set_area(Vec2::new(4.0, 3.0), Vec2::new(0.0, 1.0));
        assert!((object.position() - Vec2::new(2.0, 2.0)).length() < eps);
        assert!((object.size() - Vec2::new(4.0, 2.0)).length() < eps);
        assert_eq!(object.angle(), 0.0);
    }

    #[test]
    fn test_set_size_clamps_degenerate() {
        let mut object = SceneObject::new();
        object.set_size(Vec2::new(0.0, 2.0));
        assert_eq!(object.size(), Vec2::new(MIN_OBJECT_SIZE, 2.0));
    }

    #[test]
    fn test_point_in_oobb_follows_transform() {
        let mut object = SceneObject::new();
        object.set_size(Vec2::new(4.0, 1.0));
        object.set_transform(Vec2::new(10.0, 0.0), std::f32::consts::FRAC_PI_2);
        assert!(object.is_point_in_oobb(Vec2::new(10.0, 1.8)));
        assert!(!object.is_point_in_oobb(Vec2::new(11.8, 0.0)));
    }

    #[test]
    fn test_point_in_collision_shape() {
        let mut object = SceneObject::new();
        object.shapes_mut().create_circle(1.0, Vec2::ZERO).unwrap();
        object.set_position(Vec2::new(5.0, 5.0));
        assert!(object.is_point_in_collision_shape(0, Vec2::new(5.5, 5.5)));
        assert!(!object.is_point_in_collision_shape(0, Vec2::ZERO));
        assert!(!object.is_point_in_collision_shape(3, Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn test_copy_to_duplicates_state() {
        let mut source = SceneObject::new();
        source.set_size(Vec2::new(2.0, 3.0));
        source.set_transform(Vec2::new(1.0, -2.0), 0.5);
        source.body_mut().set_body_type(BodyType::Kinematic);
        source.body_mut().set_linear_velocity(Vec2::new(0.5, 0.0));
        source.body_mut().set_gravity_scale(0.0);
        source.shapes_mut().set_default_friction(0.6, false);
        source.shapes_mut().create_polygon_box(2.0, 3.0).unwrap();
        source
            .shapes_mut()
            .create_edge(Vec2::ZERO, Vec2::X, Some(Vec2::NEG_X), None)
            .unwrap();
        source.set_lifetime(3.0);
        source.set_update_callback(true);

        let mut target = SceneObject::new();
        target.shapes_mut().create_circle(1.0, Vec2::ZERO).unwrap();
        source.copy_to(&mut target);

        assert_eq!(target.size(), source.size());
        assert_eq!(target.transform(), source.transform());
        assert_eq!(target.body().to_def(), source.body().to_def());
        assert_eq!(target.collision_shape_records(), source.collision_shape_records());
        assert_eq!(target.shapes().default_material(), source.shapes().default_material());
        assert_eq!(target.lifetime(), 3.0);
        assert!(target.callbacks().update);
    }

    #[test]
    fn test_load_records_skips_invalid() {
        let mut source = SceneObject::new();
        source.shapes_mut().create_circle(0.5, Vec2::ONE).unwrap();
        source
            .shapes_mut()
            .create_chain(&[Vec2::ZERO, Vec2::X, Vec2::ONE], None, Some(Vec2::Y))
            .unwrap();
        let mut records = source.collision_shape_records();
        records.push(FixtureDef::new(
            CollisionShape::Circle {
                radius: -1.0,
                center: Vec2::ZERO,
            },
            Default::default(),
        ));
        assert!(SceneObject::check_collision_shape_records(&records).is_err());

        let mut loaded = SceneObject::new();
        assert_eq!(loaded.load_collision_shape_records(records), 2);
        assert_eq!(loaded.collision_shape_records(), source.collision_shape_records());
    }

    #[test]
    fn test_lifetime_countdown() {
        let mut object = SceneObject::new();
        object.set_lifetime(0.05);
        assert!(!object.integrate(0.02));
        assert!(!object.integrate(0.02));
        assert!(object.integrate(0.02));
        assert_eq!(object.lifetime(), 0.0);
        assert!(!object.integrate(0.02));
    }
}

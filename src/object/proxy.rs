//! An object's registration in the scene spatial index.

use glam::Vec2;

use crate::math::Aabb2d;
use crate::scene::world_query::{ProxyId, SharedWorldQuery};
use crate::scene::ObjectId;

/// Proxy handle plus the AABB it was last registered with.
#[derive(Default)]
pub struct WorldQueryProxy {
    registration: Option<Registration>,
}

struct Registration {
    query: SharedWorldQuery,
    object: ObjectId,
    id: ProxyId,
    aabb: Aabb2d,
}

impl WorldQueryProxy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self) -> bool {
        self.registration.is_some()
    }

    pub fn proxy_id(&self) -> Option<ProxyId> {
        self.registration.as_ref().map(|r| r.id)
    }

    /// AABB last pushed to the index, if registered.
    pub fn registered_aabb(&self) -> Option<Aabb2d> {
        self.registration.as_ref().map(|r| r.aabb)
    }

    /// Insert into `query`, replacing any previous registration.
    pub fn register(&mut self, query: SharedWorldQuery, object: ObjectId, aabb: Aabb2d) -> ProxyId {
        self.unregister();
        let id = query.borrow_mut().create_proxy(object, aabb);
        tracing::trace!("registered proxy {:?} for object {:?}", id, object);
        self.registration = Some(Registration {
            query,
            object,
            id,
            aabb,
        });
        id
    }

    /// Move the proxy in place.
    pub fn update(&mut self, aabb: Aabb2d, displacement: Vec2) {
        let Some(registration) = self.registration.as_mut() else {
            return;
        };
        registration
            .query
            .borrow_mut()
            .move_proxy(registration.id, aabb, displacement);
        registration.aabb = aabb;
    }

    /// Remove and re-insert, for changes the in-place update cannot absorb (e.g. a resize).
    pub fn reinsert(&mut self, aabb: Aabb2d) {
        let Some(registration) = self.registration.take() else {
            return;
        };
        registration.query.borrow_mut().destroy_proxy(registration.id);
        self.register(registration.query, registration.object, aabb);
    }

    /// Remove from the index. Safe to call when not registered.
    pub fn unregister(&mut self) {
        if let Some(registration) = self.registration.take() {
            registration.query.borrow_mut().destroy_proxy(registration.id);
            tracing::trace!("unregistered proxy {:?}", registration.id);
        }
    }
}

impl Drop for WorldQueryProxy {
    fn drop(&mut self) {
        // A dropped object leaves the index too; ignore a scene that is mid-borrow.
        if let Some(registration) = self.registration.take() {
            if let Ok(mut query) = registration.query.try_borrow_mut() {
                query.destroy_proxy(registration.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::world_query::WorldQuery;
    use slotmap::SlotMap;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn setup() -> (SharedWorldQuery, ObjectId) {
        let mut keys: SlotMap<ObjectId, ()> = SlotMap::with_key();
        (Rc::new(RefCell::new(WorldQuery::default())), keys.insert(()))
    }

    #[test]
    fn test_register_update_unregister() {
        let (query, object) = setup();
        let mut proxy = WorldQueryProxy::new();
        proxy.unregister();

        let aabb = Aabb2d::new(Vec2::ZERO, Vec2::ONE);
        proxy.register(query.clone(), object, aabb);
        assert_eq!(query.borrow().len(), 1);
        assert_eq!(proxy.registered_aabb(), Some(aabb));

        let moved = Aabb2d::new(Vec2::ONE, Vec2::splat(2.0));
        proxy.update(moved, Vec2::ONE);
        assert_eq!(proxy.registered_aabb(), Some(moved));
        assert_eq!(query.borrow().aabb(proxy.proxy_id().unwrap()), Some(moved));

        proxy.unregister();
        assert!(query.borrow().is_empty());
        assert!(!proxy.is_registered());
    }

    #[test]
    fn test_reinsert_replaces_proxy() {
        let (query, object) = setup();
        let mut proxy = WorldQueryProxy::new();
        let first = proxy.register(query.clone(), object, Aabb2d::default());
        proxy.reinsert(Aabb2d::new(Vec2::ZERO, Vec2::splat(4.0)));
        assert_ne!(proxy.proxy_id(), Some(first));
        assert_eq!(query.borrow().len(), 1);
        assert_eq!(query.borrow().object(proxy.proxy_id().unwrap()), Some(object));
    }

    #[test]
    fn test_drop_unregisters() {
        let (query, object) = setup();
        {
            let mut proxy = WorldQueryProxy::new();
            proxy.register(query.clone(), object, Aabb2d::default());
        }
        assert!(query.borrow().is_empty());
    }
}

//! Scene spatial index of object bounding boxes.
//!
//! Each proxy stores the exact AABB it was last given plus a fattened AABB.
//! Small moves that stay inside the fat box are absorbed without re-fattening.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use slotmap::SlotMap;

use crate::math::Aabb2d;

use super::ObjectId;

slotmap::new_key_type! {
    /// Handle to a proxy in a [`WorldQuery`].
    pub struct ProxyId;
}

/// Spatial index shared by every object in a scene.
pub type SharedWorldQuery = Rc<RefCell<WorldQuery>>;

/// Configuration for proxy fattening.
#[derive(Debug, Clone)]
pub struct WorldQueryConfig {
    /// Margin added on every side of a fat AABB. Default: 0.1.
    pub aabb_margin: f32,
    /// Scale applied to the displacement when predicting motion. Default: 2.0.
    pub displacement_multiplier: f32,
}

impl Default for WorldQueryConfig {
    fn default() -> Self {
        Self {
            aabb_margin: 0.1,
            displacement_multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone)]
struct ProxyEntry {
    object: ObjectId,
    aabb: Aabb2d,
    fat_aabb: Aabb2d,
}

/// Flat proxy list with fat-AABB rejection.
#[derive(Debug, Default)]
pub struct WorldQuery {
    config: WorldQueryConfig,
    proxies: SlotMap<ProxyId, ProxyEntry>,
}

impl WorldQuery {
    pub fn new(config: WorldQueryConfig) -> Self {
        Self {
            config,
            proxies: SlotMap::with_key(),
        }
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    fn fatten(&self, aabb: &Aabb2d, displacement: Vec2) -> Aabb2d {
        aabb.expanded(self.config.aabb_margin)
            .swept(displacement * self.config.displacement_multiplier)
    }

    pub fn create_proxy(&mut self, object: ObjectId, aabb: Aabb2d) -> ProxyId {
        let fat_aabb = self.fatten(&aabb, Vec2::ZERO);
        self.proxies.insert(ProxyEntry {
            object,
            aabb,
            fat_aabb,
        })
    }

    /// Update a proxy. Returns true if its fat AABB had to be rebuilt.
    pub fn move_proxy(&mut self, id: ProxyId, aabb: Aabb2d, displacement: Vec2) -> bool {
        let Some(fat) = self.proxies.get(id).map(|p| p.fat_aabb) else {
            tracing::error!("move_proxy on unknown proxy {:?}", id);
            return false;
        };
        let rebuilt = !fat.contains(&aabb);
        let new_fat = rebuilt.then(|| self.fatten(&aabb, displacement));
        if let Some(entry) = self.proxies.get_mut(id) {
            entry.aabb = aabb;
            if let Some(new_fat) = new_fat {
                entry.fat_aabb = new_fat;
            }
        }
        rebuilt
    }

    pub fn destroy_proxy(&mut self, id: ProxyId) -> bool {
        self.proxies.remove(id).is_some()
    }

    pub fn aabb(&self, id: ProxyId) -> Option<Aabb2d> {
        self.proxies.get(id).map(|p| p.aabb)
    }

    pub fn fat_aabb(&self, id: ProxyId) -> Option<Aabb2d> {
        self.proxies.get(id).map(|p| p.fat_aabb)
    }

    pub fn object(&self, id: ProxyId) -> Option<ObjectId> {
        self.proxies.get(id).map(|p| p.object)
    }

    /// Objects whose AABB overlaps `area`.
    pub fn query_area(&self, area: &Aabb2d) -> Vec<ObjectId> {
        self.proxies
            .values()
            .filter(|p| p.fat_aabb.overlaps(area) && p.aabb.overlaps(area))
            .map(|p| p.object)
            .collect()
    }

    /// Objects whose AABB contains `point`.
    pub fn query_point(&self, point: Vec2) -> Vec<ObjectId> {
        self.proxies
            .values()
            .filter(|p| p.aabb.contains_point(point))
            .map(|p| p.object)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object_ids(n: usize) -> Vec<ObjectId> {
        let mut keys: SlotMap<ObjectId, ()> = SlotMap::with_key();
        (0..n).map(|_| keys.insert(())).collect()
    }

    #[test]
    fn test_small_move_stays_in_fat_aabb() {
        let ids = object_ids(1);
        let mut query = WorldQuery::new(WorldQueryConfig::default());
        let aabb = Aabb2d::new(Vec2::ZERO, Vec2::ONE);
        let proxy = query.create_proxy(ids[0], aabb);

        let nudged = Aabb2d::new(Vec2::splat(0.05), Vec2::splat(1.05));
        assert!(!query.move_proxy(proxy, nudged, Vec2::splat(0.05)));
        assert_eq!(query.aabb(proxy), Some(nudged));

        let moved = Aabb2d::new(Vec2::splat(2.0), Vec2::splat(3.0));
        assert!(query.move_proxy(proxy, moved, Vec2::splat(2.0)));
        let fat = query.fat_aabb(proxy).unwrap();
        assert!(fat.contains(&moved));
        // Predicted along the displacement.
        assert!(fat.max.x > 3.0 + 0.1);
    }

    #[test]
    fn test_query_area_and_point() {
        let ids = object_ids(2);
        let mut query = WorldQuery::new(WorldQueryConfig::default());
        query.create_proxy(ids[0], Aabb2d::new(Vec2::ZERO, Vec2::ONE));
        query.create_proxy(ids[1], Aabb2d::new(Vec2::splat(5.0), Vec2::splat(6.0)));

        let hits = query.query_area(&Aabb2d::new(Vec2::splat(0.5), Vec2::splat(2.0)));
        assert_eq!(hits, vec![ids[0]]);
        assert_eq!(query.query_point(Vec2::splat(5.5)), vec![ids[1]]);
        assert!(query.query_point(Vec2::splat(3.0)).is_empty());
    }

    #[test]
    fn test_destroy_proxy() {
        let ids = object_ids(1);
        let mut query = WorldQuery::default();
        let proxy = query.create_proxy(ids[0], Aabb2d::default());
        assert!(query.destroy_proxy(proxy));
        assert!(!query.destroy_proxy(proxy));
        assert!(query.is_empty());
    }
}

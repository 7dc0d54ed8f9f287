use std::{
    any::Any,
    collections::HashMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::models::domain::Principal;

/// Cached remote query results.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum QueryKey {
    CallerRole(Principal),
    AdminExists,
    Questions,
    MySubmissions,
    CallerProfile,
}

type Entries = HashMap<QueryKey, Box<dyn Any + Send + Sync>>;

/// Shared handle to the client's query cache. Clones see the same entries.
/// Mutation sites call [`QueryCache::invalidate`] for every key they affect.
#[derive(Clone, Default)]
pub struct QueryCache {
    entries: Arc<RwLock<Entries>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    // a panic while holding the lock leaves the map itself intact
    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached value for `key`, if one of type `T` is present.
    pub fn get<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        self.read()
            .get(key)
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    pub fn insert<T: Send + Sync + 'static>(&self, key: QueryKey, value: T) {
        self.write().insert(key, Box::new(value));
    }

    pub fn invalidate(&self, key: &QueryKey) {
        if self.write().remove(key).is_some() {
            log::debug!("Invalidated cached query {:?}", key);
        }
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.read().contains_key(key)
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::UserRole;

    #[test]
    fn test_typed_round_trip() {
        let cache = QueryCache::new();
        let key = QueryKey::CallerRole(Principal::new("p"));

        cache.insert(key.clone(), UserRole::Admin);

        assert_eq!(cache.get::<UserRole>(&key), Some(UserRole::Admin));
        assert_eq!(cache.get::<bool>(&key), None, "wrong type reads as a miss");
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = QueryCache::new();
        let other = cache.clone();

        cache.insert(QueryKey::AdminExists, true);
        assert_eq!(other.get::<bool>(&QueryKey::AdminExists), Some(true));

        other.invalidate(&QueryKey::AdminExists);
        assert!(!cache.contains(&QueryKey::AdminExists));
    }

    #[test]
    fn test_clear() {
        let cache = QueryCache::new();
        cache.insert(QueryKey::Questions, Vec::<u64>::new());
        cache.insert(QueryKey::AdminExists, false);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}

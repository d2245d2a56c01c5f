// ── Generic reactive entity collection ──
//
// Concurrent keyed storage with an alias index and push-based change
// notification via `watch` channels.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

/// A reactive collection for a single entity type.
///
/// Uses `DashMap` for O(1) concurrent lookups and `watch` channels for
/// push-based change notification. Every mutation bumps a version counter
/// and rebuilds the snapshot that subscribers receive, sorted by the order
/// given at construction.
pub(crate) struct EntityCollection<T: Send + Sync + 'static> {
    /// Primary storage: key string -> entity.
    /// Devices are keyed `"id:{id}"`, or `"addr:{address}"` until the
    /// backend numbers them.
    by_key: DashMap<String, Arc<T>>,

    /// Secondary index: alias (network address) -> key string.
    alias_to_key: DashMap<String, String>,

    /// Reverse of `alias_to_key` for efficient removal.
    key_to_alias: DashMap<String, String>,

    order: fn(&T, &T) -> Ordering,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// Full snapshot, rebuilt on mutation for efficient subscription.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new(order: fn(&T, &T) -> Ordering) -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_key: DashMap::new(),
            alias_to_key: DashMap::new(),
            key_to_alias: DashMap::new(),
            order,
            version,
            snapshot,
        }
    }

    /// Insert or update an entity. Returns `true` if the key was new.
    pub(crate) fn upsert(&self, key: String, alias: Option<String>, entity: T) -> bool {
        let is_new = self.store(key, alias, entity);
        self.rebuild_snapshot();
        self.bump_version();
        is_new
    }

    /// Store `entity` under `key`, dropping `old_key` in the same step.
    ///
    /// Subscribers see a single change with the entity under its new key.
    pub(crate) fn rekey(&self, old_key: &str, key: String, alias: Option<String>, entity: T) {
        if old_key != key {
            self.forget(old_key);
        }
        self.store(key, alias, entity);
        self.rebuild_snapshot();
        self.bump_version();
    }

    /// Remove an entity by key. Returns the removed entity if it existed.
    pub(crate) fn remove(&self, key: &str) -> Option<Arc<T>> {
        let removed = self.forget(key);
        if removed.is_some() {
            self.rebuild_snapshot();
            self.bump_version();
        }
        removed
    }

    /// Remove every entity whose key is not in `keep`. Returns the removed
    /// entities.
    pub(crate) fn retain_keys(&self, keep: &HashSet<String>) -> Vec<Arc<T>> {
        let removed: Vec<Arc<T>> = self
            .keys()
            .into_iter()
            .filter(|key| !keep.contains(key))
            .filter_map(|key| self.forget(&key))
            .collect();
        if !removed.is_empty() {
            self.rebuild_snapshot();
            self.bump_version();
        }
        removed
    }

    /// Look up an entity by its primary key string.
    pub(crate) fn get_by_key(&self, key: &str) -> Option<Arc<T>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Resolve an alias to the key it currently points at.
    pub(crate) fn key_for_alias(&self, alias: &str) -> Option<String> {
        self.alias_to_key.get(alias).map(|r| r.value().clone())
    }

    /// Look up an entity by alias (secondary index).
    pub(crate) fn get_by_alias(&self, alias: &str) -> Option<Arc<T>> {
        let key = self.key_for_alias(alias)?;
        self.get_by_key(&key)
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Return all current primary keys in the collection.
    pub(crate) fn keys(&self) -> Vec<String> {
        self.by_key.iter().map(|r| r.key().clone()).collect()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn store(&self, key: String, alias: Option<String>, entity: T) -> bool {
        if let Some((_, old_alias)) = self.key_to_alias.remove(&key) {
            if alias.as_deref() != Some(old_alias.as_str()) {
                self.release_alias(&old_alias, &key);
            }
        }

        let is_new = self.by_key.insert(key.clone(), Arc::new(entity)).is_none();
        if let Some(alias) = alias {
            self.alias_to_key.insert(alias.clone(), key.clone());
            self.key_to_alias.insert(key, alias);
        }
        is_new
    }

    fn forget(&self, key: &str) -> Option<Arc<T>> {
        let removed = self.by_key.remove(key).map(|(_, v)| v)?;
        if let Some((_, alias)) = self.key_to_alias.remove(key) {
            self.release_alias(&alias, key);
        }
        Some(removed)
    }

    /// Detach `alias` from `key`. If `key` owned the alias and another key
    /// still carries it, that key takes it over; the lowest key wins so
    /// the choice is stable.
    fn release_alias(&self, alias: &str, key: &str) {
        if self.alias_to_key.remove_if(alias, |_, owner| owner == key).is_none() {
            return;
        }
        let heir = self
            .key_to_alias
            .iter()
            .filter(|entry| entry.value() == alias)
            .map(|entry| entry.key().clone())
            .min();
        if let Some(heir) = heir {
            self.alias_to_key.insert(alias.to_owned(), heir);
        }
    }

    /// Collect all values into a sorted snapshot vec and broadcast to
    /// subscribers.
    fn rebuild_snapshot(&self) {
        let mut values: Vec<Arc<T>> = self.by_key.iter().map(|r| Arc::clone(r.value())).collect();
        values.sort_by(|a, b| (self.order)(a, b));
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn collection() -> EntityCollection<String> {
        EntityCollection::new(|a: &String, b: &String| a.cmp(b))
    }

    #[test]
    fn upsert_reports_new_keys() {
        let col = collection();
        assert!(col.upsert("key1".into(), None, "hello".into()));
        assert!(!col.upsert("key1".into(), None, "world".into()));
        assert_eq!(*col.get_by_key("key1").unwrap(), "world");
    }

    #[test]
    fn alias_lookup_and_removal() {
        let col = collection();
        col.upsert("id:1".into(), Some("10.0.0.1".into()), "one".into());

        assert_eq!(*col.get_by_alias("10.0.0.1").unwrap(), "one");
        col.remove("id:1");
        assert!(col.get_by_alias("10.0.0.1").is_none());
        assert_eq!(col.len(), 0);
    }

    #[test]
    fn changed_alias_drops_old_mapping() {
        let col = collection();
        col.upsert("id:1".into(), Some("10.0.0.1".into()), "one".into());
        col.upsert("id:1".into(), Some("10.0.0.9".into()), "one".into());

        assert!(col.get_by_alias("10.0.0.1").is_none());
        assert!(col.get_by_alias("10.0.0.9").is_some());
    }

    #[test]
    fn removal_keeps_alias_claimed_by_another_key() {
        let col = collection();
        col.upsert("id:1".into(), Some("10.0.0.1".into()), "one".into());
        col.upsert("id:2".into(), Some("10.0.0.1".into()), "two".into());

        col.remove("id:1");
        assert_eq!(*col.get_by_alias("10.0.0.1").unwrap(), "two");
    }

    #[test]
    fn removing_alias_owner_hands_alias_to_remaining_key() {
        let col = collection();
        col.upsert("id:1".into(), Some("10.0.0.1".into()), "one".into());
        col.upsert("id:2".into(), Some("10.0.0.1".into()), "two".into());

        col.remove("id:2");
        assert_eq!(*col.get_by_alias("10.0.0.1").unwrap(), "one");

        col.remove("id:1");
        assert!(col.get_by_alias("10.0.0.1").is_none());
    }

    #[test]
    fn moving_alias_owner_hands_alias_to_remaining_key() {
        let col = collection();
        col.upsert("id:1".into(), Some("10.0.0.1".into()), "one".into());
        col.upsert("id:2".into(), Some("10.0.0.1".into()), "two".into());

        col.upsert("id:2".into(), Some("10.0.0.2".into()), "two".into());
        assert_eq!(*col.get_by_alias("10.0.0.1").unwrap(), "one");
        assert_eq!(*col.get_by_alias("10.0.0.2").unwrap(), "two");
    }

    #[test]
    fn rekey_is_a_single_change() {
        let col = collection();
        col.upsert("addr:10.0.0.1".into(), Some("10.0.0.1".into()), "x".into());
        let before = col.version();

        col.rekey("addr:10.0.0.1", "id:7".into(), Some("10.0.0.1".into()), "x".into());

        assert_eq!(col.version(), before + 1);
        assert_eq!(col.keys(), vec!["id:7".to_owned()]);
        assert_eq!(col.key_for_alias("10.0.0.1").as_deref(), Some("id:7"));
    }

    #[test]
    fn retain_prunes_and_sorts() {
        let col = collection();
        col.upsert("c".into(), None, "c".into());
        col.upsert("a".into(), None, "a".into());
        col.upsert("b".into(), None, "b".into());

        let keep: HashSet<String> = ["a".to_owned(), "c".to_owned()].into();
        let removed = col.retain_keys(&keep);

        assert_eq!(removed.len(), 1);
        let snap = col.snapshot();
        let names: Vec<&str> = snap.iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }
}

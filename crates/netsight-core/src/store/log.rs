// ── Bounded newest-first log ──

use std::sync::Arc;

use tokio::sync::watch;

/// A capped, newest-first list of immutable entries published through a
/// `watch` channel. Eviction always drops from the oldest end.
pub(crate) struct BoundedLog<T: Send + Sync + 'static> {
    capacity: usize,
    entries: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Send + Sync + 'static> BoundedLog<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        let (entries, _) = watch::channel(Arc::new(Vec::new()));
        Self { capacity, entries }
    }

    /// Prepend `batch` (already newest-first) ahead of the existing
    /// entries, then truncate.
    pub(crate) fn prepend(&self, batch: Vec<T>) {
        if batch.is_empty() {
            return;
        }
        self.entries.send_modify(|log| {
            let mut next: Vec<Arc<T>> = batch.into_iter().map(Arc::new).collect();
            next.extend(log.iter().cloned());
            next.truncate(self.capacity);
            *log = Arc::new(next);
        });
    }

    /// Replace the whole log (newest-first), keeping at most `capacity`.
    pub(crate) fn replace(&self, entries: Vec<T>) {
        let next: Vec<Arc<T>> = entries.into_iter().take(self.capacity).map(Arc::new).collect();
        self.entries.send_modify(|log| *log = Arc::new(next));
    }

    /// Replace the first entry matching `pred` with `f(entry)`, keeping its
    /// position. Returns the new entry, or `None` if nothing matched.
    pub(crate) fn modify_first(
        &self,
        pred: impl Fn(&T) -> bool,
        f: impl FnOnce(&T) -> T,
    ) -> Option<Arc<T>> {
        let mut updated = None;
        self.entries.send_if_modified(|log| {
            let Some(pos) = log.iter().position(|e| pred(e)) else {
                return false;
            };
            let entry = Arc::new(f(&log[pos]));
            let mut next = (**log).clone();
            next[pos] = Arc::clone(&entry);
            *log = Arc::new(next);
            updated = Some(entry);
            true
        });
        updated
    }

    pub(crate) fn find(&self, pred: impl Fn(&T) -> bool) -> Option<Arc<T>> {
        self.entries.borrow().iter().find(|e| pred(e)).cloned()
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.entries.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.entries.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn values(log: &BoundedLog<u32>) -> Vec<u32> {
        log.snapshot().iter().map(|v| **v).collect()
    }

    #[test]
    fn bound_holds_after_every_append() {
        let log = BoundedLog::new(100);
        for n in 0..150 {
            log.prepend(vec![n]);
            assert!(log.snapshot().len() <= 100);
        }
        let snap = values(&log);
        assert_eq!(snap.len(), 100);
        // Newest first, oldest 50 evicted.
        assert_eq!(snap[0], 149);
        assert_eq!(snap[99], 50);
    }

    #[test]
    fn batch_keeps_its_order_ahead_of_existing() {
        let log = BoundedLog::new(4);
        log.prepend(vec![2, 1]);
        log.prepend(vec![5, 4, 3]);
        assert_eq!(values(&log), vec![5, 4, 3, 2]);
    }

    #[test]
    fn modify_keeps_position() {
        let log = BoundedLog::new(10);
        log.replace(vec![3, 2, 1]);
        let updated = log.modify_first(|v| *v == 2, |v| v * 10).unwrap();
        assert_eq!(*updated, 20);
        assert_eq!(values(&log), vec![3, 20, 1]);
        assert!(log.modify_first(|v| *v == 99, |v| *v).is_none());
    }
}

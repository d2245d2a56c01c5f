// Snapshot subscriptions over the store's devices, events, and alerts.
//
// Consumers (the CLI `watch` loop, tests) hold an `EntityStream` and wake
// once per store mutation with the whole new list.

mod filter;

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

pub use filter::{DeviceFilter, EventFilter};

/// Live view of one store collection: the last seen snapshot plus a
/// receiver that wakes on every merge.
pub struct EntityStream<T: Send + Sync + 'static> {
    current: Arc<Vec<Arc<T>>>,
    receiver: watch::Receiver<Arc<Vec<Arc<T>>>>,
}

impl<T: Send + Sync + 'static> EntityStream<T> {
    pub(crate) fn new(receiver: watch::Receiver<Arc<Vec<Arc<T>>>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Snapshot as of subscription, or as of the last `changed()`.
    pub fn current(&self) -> &Arc<Vec<Arc<T>>> {
        &self.current
    }

    /// Snapshot as of now, without marking it seen.
    pub fn latest(&self) -> Arc<Vec<Arc<T>>> {
        self.receiver.borrow().clone()
    }

    /// Resolve with the next published snapshot, or `None` once the store
    /// is gone.
    pub async fn changed(&mut self) -> Option<Arc<Vec<Arc<T>>>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    pub fn into_stream(self) -> EntityWatchStream<T> {
        EntityWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` form of [`EntityStream`]: the current snapshot, then one item
/// per merge.
pub struct EntityWatchStream<T: Send + Sync + 'static> {
    inner: WatchStream<Arc<Vec<Arc<T>>>>,
}

impl<T: Send + Sync + 'static> Stream for EntityWatchStream<T> {
    type Item = Arc<Vec<Arc<T>>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn changed_tracks_latest_snapshot() {
        let (tx, rx) = watch::channel(Arc::new(vec![Arc::new(1)]));
        let mut stream = EntityStream::new(rx);
        assert_eq!(stream.current().len(), 1);

        tx.send_modify(|snap| *snap = Arc::new(vec![Arc::new(1), Arc::new(2)]));
        let snap = stream.changed().await.unwrap();
        assert_eq!(snap.len(), 2);
        assert_eq!(stream.current().len(), 2);

        drop(tx);
        assert!(stream.changed().await.is_none());
    }

    #[tokio::test]
    async fn into_stream_yields_current_first() {
        let (tx, rx) = watch::channel(Arc::new(vec![Arc::new("a")]));
        let mut stream = EntityStream::new(rx).into_stream();

        assert_eq!(stream.next().await.unwrap().len(), 1);
        tx.send_modify(|snap| *snap = Arc::new(Vec::new()));
        assert!(stream.next().await.unwrap().is_empty());
    }
}

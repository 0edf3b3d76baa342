//! Single-resolution bridge from a completion callback to an awaiting caller
//!
//! [`channel`] returns a cloneable [`Resolver`] and a [`Pending`] future. The first
//! `resolve` wins; every later attempt is rejected and reported as such. Resolvers
//! may run on any thread.
//!
//! # Example
//!
//! ```
//! # tokio_test::block_on(async {
//! let (resolver, pending) = apistore::bridge::channel::<u32>();
//! let late = resolver.clone();
//!
//! assert!(resolver.resolve(1));
//! assert!(!late.resolve(2));
//! assert_eq!(pending.await, Ok(1));
//! # });
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::oneshot;

type Slot<T> = Mutex<Option<oneshot::Sender<T>>>;

/// Every resolver was dropped without resolving
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("All resolvers were dropped before a value was delivered")]
pub struct Abandoned;

/// Create a connected resolver/pending pair
pub fn channel<T>() -> (Resolver<T>, Pending<T>) {
    let (sender, receiver) = oneshot::channel();
    let resolver = Resolver {
        slot: Arc::new(Mutex::new(Some(sender))),
    };
    (resolver, Pending { receiver })
}

fn lock<T>(slot: &Slot<T>) -> MutexGuard<'_, Option<oneshot::Sender<T>>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Write side of the bridge
pub struct Resolver<T> {
    slot: Arc<Slot<T>>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Resolver<T> {
    /// Deliver `value` if nothing was delivered yet
    ///
    /// Returns `true` when this call performed the resolution. The value is discarded
    /// when the pending side was already dropped, but the bridge still counts as resolved.
    pub fn resolve(&self, value: T) -> bool {
        let sender = lock(&self.slot).take();
        match sender {
            Some(sender) => {
                let _ = sender.send(value);
                true
            }
            None => false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        lock(&self.slot).is_none()
    }

    /// Resolver that does not keep the pending side from observing abandonment
    pub fn downgrade(&self) -> WeakResolver<T> {
        WeakResolver {
            slot: Arc::downgrade(&self.slot),
        }
    }
}

/// Resolver that resolves only while a strong [`Resolver`] is still alive
pub struct WeakResolver<T> {
    slot: Weak<Slot<T>>,
}

impl<T> Clone for WeakResolver<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Weak::clone(&self.slot),
        }
    }
}

impl<T> WeakResolver<T> {
    pub fn resolve(&self, value: T) -> bool {
        match self.slot.upgrade() {
            Some(slot) => Resolver { slot }.resolve(value),
            None => false,
        }
    }
}

/// Read side of the bridge, completes once with the delivered value
#[must_use = "futures do nothing unless polled"]
pub struct Pending<T> {
    receiver: oneshot::Receiver<T>,
}

impl<T> Future for Pending<T> {
    type Output = Result<T, Abandoned>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map_err(|_| Abandoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::task;
    use tokio_test::{assert_pending, assert_ready_eq};

    #[test]
    fn test_first_resolution_wins() {
        let (resolver, pending) = channel();
        let mut pending = task::spawn(pending);
        assert_pending!(pending.poll());

        assert!(resolver.resolve("no-content"));
        assert!(!resolver.clone().resolve("decoded"));
        assert!(resolver.is_resolved());

        assert!(pending.is_woken());
        assert_ready_eq!(pending.poll(), Ok("no-content"));
    }

    #[test]
    fn test_dropping_all_resolvers_abandons() {
        let (resolver, pending) = channel::<u8>();
        let weak = resolver.downgrade();
        let mut pending = task::spawn(pending);
        assert_pending!(pending.poll());

        drop(resolver);

        assert_ready_eq!(pending.poll(), Err(Abandoned));
        assert!(!weak.resolve(1));
    }

    #[test]
    fn test_weak_resolver_resolves_while_strong_alive() {
        let (resolver, pending) = channel::<u8>();
        let weak = resolver.downgrade();

        assert!(weak.resolve(3));
        assert!(!resolver.resolve(4));
        drop(resolver);

        let mut pending = task::spawn(pending);
        assert_ready_eq!(pending.poll(), Ok(3));
    }

    #[test]
    fn test_resolve_after_pending_dropped_still_counts() {
        let (resolver, pending) = channel::<u8>();
        drop(pending);

        assert!(resolver.resolve(9));
        assert!(resolver.is_resolved());
        assert!(!resolver.resolve(10));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_resolvers_deliver_once() {
        let (resolver, pending) = channel::<usize>();

        let winners: Vec<_> = (0..16)
            .map(|i| {
                let resolver = resolver.clone();
                std::thread::spawn(move || resolver.resolve(i))
            })
            .collect();
        drop(resolver);

        let won = winners
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(won, 1);
        assert!(pending.await.is_ok());
    }
}

//! Connectivity gates
//!
//! The executor only reads a boolean. Whatever monitors the network (a platform
//! reachability callback, a periodic probe) writes it through [`ReachabilityFlag::set`].

use apistore_interface::ConnectivityGate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Shared reachability flag, cheap to clone
///
/// All clones observe the same value.
#[derive(Debug, Clone)]
pub struct ReachabilityFlag {
    reachable: Arc<AtomicBool>,
}

impl ReachabilityFlag {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable: Arc::new(AtomicBool::new(reachable)),
        }
    }

    /// Record a new reachability state, returning the previous one
    pub fn set(&self, reachable: bool) -> bool {
        let previous = self.reachable.swap(reachable, Ordering::AcqRel);
        if previous != reachable {
            debug!("Network reachability changed: {} -> {}", previous, reachable);
        }
        previous
    }

    pub fn get(&self) -> bool {
        self.reachable.load(Ordering::Acquire)
    }
}

impl Default for ReachabilityFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityGate for ReachabilityFlag {
    fn is_reachable(&self) -> bool {
        self.get()
    }
}

/// Gate that never blocks a call
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReachable;

impl ConnectivityGate for AlwaysReachable {
    fn is_reachable(&self) -> bool {
        true
    }
}

/// Gate backed by a closure
pub struct FnGate<F>(pub F);

impl<F> ConnectivityGate for FnGate<F>
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    fn is_reachable(&self) -> bool {
        (self.0)()
    }
}

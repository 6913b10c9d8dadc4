//! Balancers build immutable pickers from an instance snapshot; pickers
//! select one instance per call.

pub mod random;
pub mod round_robin;
pub mod weighted_round_robin;

use std::fmt;
use std::sync::Arc;

use crate::instance::Instance;

pub use random::RandomBalancer;
pub use round_robin::RoundRobinBalancer;
pub use weighted_round_robin::WeightedRoundRobinBalancer;

/// Failure to pick: the picker's instance sequence was empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no instance available")]
pub struct NoInstance;

/// A balancer factory: builds a [`Picker`] from a snapshot of instances.
///
/// Object-safe so the pool can hold one as `Box<dyn Balancer>`.
pub trait Balancer: Send + Sync + 'static {
    /// A short, stable name for diagnostics (`"RandomBalancer"`, etc).
    fn name(&self) -> &'static str;

    /// Builds an immutable picker over the given instances. The picker type
    /// is opaque to the pool: refreshes replace the `Arc` pointer, they
    /// never mutate a picker in place.
    fn new_picker(&self, instances: Vec<Instance>) -> Arc<dyn Picker>;
}

impl fmt::Debug for dyn Balancer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stateful selector over a fixed instance set, built by a [`Balancer`].
///
/// `pick` is synchronous and expected to be fast (an index computation, not
/// I/O); the pool calls it outside its own lock, after snapshotting the
/// current picker pointer under that lock.
pub trait Picker: Send + Sync + 'static {
    /// Returns one instance, or fails with [`NoInstance`] iff the picker was
    /// built from an empty instance sequence.
    fn pick(&self) -> Result<Instance, NoInstance>;
}

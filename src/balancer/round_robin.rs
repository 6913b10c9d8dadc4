use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::{Balancer, NoInstance, Picker};
use crate::instance::Instance;

/// Picks `instances[(counter++) mod size]` on every call; the counter is
/// atomic so concurrent picks on the same picker are data-race-free and
/// approximately fair.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoundRobinBalancer;

impl RoundRobinBalancer {
    /// Creates a new round-robin balancer.
    pub fn new() -> Self {
        Self
    }
}

impl Balancer for RoundRobinBalancer {
    fn name(&self) -> &'static str {
        "RRBalancer"
    }

    fn new_picker(&self, instances: Vec<Instance>) -> Arc<dyn Picker> {
        Arc::new(RoundRobinPicker {
            instances,
            next: AtomicU64::new(0),
        })
    }
}

struct RoundRobinPicker {
    instances: Vec<Instance>,
    next: AtomicU64,
}

impl Picker for RoundRobinPicker {
    fn pick(&self) -> Result<Instance, NoInstance> {
        let size = self.instances.len() as u64;
        if size == 0 {
            return Err(NoInstance);
        }
        let i = self.next.fetch_add(1, Ordering::Relaxed) % size;
        Ok(self.instances[i as usize].clone())
    }
}

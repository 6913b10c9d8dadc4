use std::sync::{Arc, Mutex};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::{Balancer, NoInstance, Picker};
use crate::instance::Instance;

/// Picks uniformly at random from the instance sequence on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomBalancer;

impl RandomBalancer {
    /// Creates a new random balancer.
    pub fn new() -> Self {
        Self
    }
}

impl Balancer for RandomBalancer {
    fn name(&self) -> &'static str {
        "RandomBalancer"
    }

    fn new_picker(&self, instances: Vec<Instance>) -> Arc<dyn Picker> {
        let seed: u64 = rand::rng().random();
        Arc::new(RandomPicker {
            instances,
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
        })
    }
}

struct RandomPicker {
    instances: Vec<Instance>,
    // `rand::rng()`'s thread-local handle isn't `Send`, so it can't be
    // stored in a struct shared across pool callers; seed a small
    // non-cryptographic RNG from it once instead, behind a lock, the way
    // `linkerd2-proxy`'s p2c balancer seeds its own per-picker `SmallRng`.
    rng: Mutex<SmallRng>,
}

impl Picker for RandomPicker {
    fn pick(&self) -> Result<Instance, NoInstance> {
        if self.instances.is_empty() {
            return Err(NoInstance);
        }
        let i = self.rng.lock().unwrap().random_range(0..self.instances.len());
        Ok(self.instances[i].clone())
    }
}

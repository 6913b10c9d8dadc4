use std::sync::{Arc, Mutex};

use super::{Balancer, NoInstance, Picker};
use crate::instance::Instance;

/// Smooth weighted round-robin: over any `total`-call window, instance `i`
/// is chosen exactly `weight_i` times, interleaved rather than batched.
#[derive(Debug, Default, Clone, Copy)]
pub struct WeightedRoundRobinBalancer;

impl WeightedRoundRobinBalancer {
    /// Creates a new weighted round-robin balancer.
    pub fn new() -> Self {
        Self
    }
}

impl Balancer for WeightedRoundRobinBalancer {
    fn name(&self) -> &'static str {
        "WRRBalancer"
    }

    fn new_picker(&self, instances: Vec<Instance>) -> Arc<dyn Picker> {
        let total: i64 = instances.iter().map(|i| i.weight() as i64).sum();
        let len = instances.len();
        Arc::new(WeightedRoundRobinPicker {
            state: Mutex::new(WrrState {
                weights: vec![0i64; len],
            }),
            instances,
            total,
        })
    }
}

struct WrrState {
    weights: Vec<i64>,
}

struct WeightedRoundRobinPicker {
    instances: Vec<Instance>,
    total: i64,
    state: Mutex<WrrState>,
}

impl Picker for WeightedRoundRobinPicker {
    fn pick(&self) -> Result<Instance, NoInstance> {
        if self.instances.is_empty() {
            return Err(NoInstance);
        }

        let mut state = self.state.lock().unwrap();
        let mut max = 0usize;
        for (i, ins) in self.instances.iter().enumerate() {
            state.weights[i] += ins.weight() as i64;
            if state.weights[i] > state.weights[max] {
                max = i;
            }
        }
        state.weights[max] -= self.total;
        Ok(self.instances[max].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weighted(addrs_and_weights: &[(&str, u32)]) -> Vec<Instance> {
        addrs_and_weights
            .iter()
            .map(|(addr, w)| Instance::builder(*addr).weight(*w).build())
            .collect()
    }

    #[test]
    fn empty_instances_fails() {
        let picker = WeightedRoundRobinBalancer::new().new_picker(vec![]);
        assert_eq!(picker.pick(), Err(NoInstance));
    }

    #[test]
    fn canonical_smooth_schedule() {
        // a(weight=5), b(weight=1), c(weight=1) -> a,a,b,a,c,a,a
        let instances = weighted(&[("a", 5), ("b", 1), ("c", 1)]);
        let picker = WeightedRoundRobinBalancer::new().new_picker(instances);

        let got: Vec<String> = (0..7).map(|_| picker.pick().unwrap().addr().to_string()).collect();
        assert_eq!(
            got,
            vec!["a", "a", "b", "a", "c", "a", "a"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn over_total_calls_each_instance_is_picked_its_weight_times() {
        let instances = weighted(&[("a", 5), ("b", 3), ("c", 2)]);
        let total: u32 = instances.iter().map(|i| i.weight()).sum();
        let picker = WeightedRoundRobinBalancer::new().new_picker(instances.clone());

        let mut counts = std::collections::HashMap::new();
        for _ in 0..total {
            let picked = picker.pick().unwrap();
            *counts.entry(picked.addr().to_string()).or_insert(0u32) += 1;
        }

        for ins in &instances {
            assert_eq!(counts[ins.addr()], ins.weight());
        }
    }
}

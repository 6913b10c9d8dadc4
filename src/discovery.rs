use std::error::Error as StdError;

use async_trait::async_trait;

use crate::instance::Instance;

/// A discovery failure, wrapping whatever error the backing source produced.
pub type DiscoveryError = Box<dyn StdError + Send + Sync>;

/// Produces the current set of instances on demand.
///
/// Object-safe so the pool can hold one as `Box<dyn Discovery>` without a
/// generic parameter for it, the same "polymorphic over a small capability
/// set" treatment spec.md §9 calls for. A `Discovery` failure never
/// invalidates ongoing traffic: the pool treats it as "keep the previous
/// picker" (see [`crate::pool::Pool`]'s refresh loop).
#[async_trait]
pub trait Discovery: Send + Sync + 'static {
    /// Returns a snapshot of currently-known instances.
    async fn discover(&self) -> Result<Vec<Instance>, DiscoveryError>;
}

/// A [`Discovery`] that always returns the same fixed list, used by
/// `Addrs`/`Instances`/the default empty discovery.
#[derive(Clone, Debug, Default)]
pub struct StaticDiscovery {
    instances: Vec<Instance>,
}

impl StaticDiscovery {
    /// Builds a static discovery source from a fixed instance list.
    pub fn new(instances: Vec<Instance>) -> Self {
        Self { instances }
    }
}

#[async_trait]
impl Discovery for StaticDiscovery {
    async fn discover(&self) -> Result<Vec<Instance>, DiscoveryError> {
        Ok(self.instances.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_discovery_returns_fixed_list() {
        let d = StaticDiscovery::new(vec![Instance::new("a:1"), Instance::new("b:2")]);
        let instances = d.discover().await.unwrap();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].addr(), "a:1");
    }

    #[tokio::test]
    async fn default_static_discovery_is_empty() {
        let d = StaticDiscovery::default();
        assert!(d.discover().await.unwrap().is_empty());
    }
}

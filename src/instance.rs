use std::fmt;
use std::sync::Arc;

/// An endpoint descriptor: an address plus the metadata a [`Balancer`] may
/// use to weight or filter it.
///
/// [`Balancer`]: crate::balancer::Balancer
///
/// Immutable after construction. The pool core only ever reads `addr()` and
/// `weight()`; `idc()` and `cluster()` exist for custom [`Discovery`] and
/// [`Balancer`] implementations to make routing decisions on.
///
/// [`Discovery`]: crate::discovery::Discovery
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instance(Arc<Inner>);

#[derive(Debug, PartialEq, Eq)]
struct Inner {
    addr: String,
    weight: u32,
    idc: String,
    cluster: String,
}

impl Instance {
    /// Builds an instance from just an address; weight, IDC, and cluster are
    /// left at their zero values.
    pub fn new(addr: impl Into<String>) -> Self {
        Self::builder(addr).build()
    }

    /// Starts a builder for an instance with non-default metadata.
    pub fn builder(addr: impl Into<String>) -> InstanceBuilder {
        InstanceBuilder {
            addr: addr.into(),
            weight: 0,
            idc: String::new(),
            cluster: String::new(),
        }
    }

    /// The endpoint's dial address, e.g. `"10.0.0.1:9090"`.
    pub fn addr(&self) -> &str {
        &self.0.addr
    }

    /// The weight a weighted balancer should give this instance.
    pub fn weight(&self) -> u32 {
        self.0.weight
    }

    /// The IDC (data center) tag, if the discovery source set one.
    pub fn idc(&self) -> &str {
        &self.0.idc
    }

    /// The cluster tag, if the discovery source set one.
    pub fn cluster(&self) -> &str {
        &self.0.cluster
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.addr)
    }
}

/// Builder for an [`Instance`] with non-default weight/IDC/cluster metadata.
pub struct InstanceBuilder {
    addr: String,
    weight: u32,
    idc: String,
    cluster: String,
}

impl InstanceBuilder {
    /// Sets the balancer weight. Defaults to 0.
    pub fn weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    /// Sets the IDC tag.
    pub fn idc(mut self, idc: impl Into<String>) -> Self {
        self.idc = idc.into();
        self
    }

    /// Sets the cluster tag.
    pub fn cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = cluster.into();
        self
    }

    /// Consumes the builder, producing an immutable [`Instance`].
    pub fn build(self) -> Instance {
        Instance(Arc::new(Inner {
            addr: self.addr,
            weight: self.weight,
            idc: self.idc,
            cluster: self.cluster,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_has_zero_weight_and_empty_tags() {
        let i = Instance::new("127.0.0.1:9090");
        assert_eq!(i.addr(), "127.0.0.1:9090");
        assert_eq!(i.weight(), 0);
        assert_eq!(i.idc(), "");
        assert_eq!(i.cluster(), "");
    }

    #[test]
    fn builder_sets_all_fields() {
        let i = Instance::builder("10.0.0.1:80")
            .weight(5)
            .idc("lf")
            .cluster("prod")
            .build();
        assert_eq!(i.addr(), "10.0.0.1:80");
        assert_eq!(i.weight(), 5);
        assert_eq!(i.idc(), "lf");
        assert_eq!(i.cluster(), "prod");
    }

    #[test]
    fn clone_is_cheap_and_equal() {
        let i = Instance::new("a:1");
        let j = i.clone();
        assert_eq!(i, j);
    }
}

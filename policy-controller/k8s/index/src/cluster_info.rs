use linkerd_ingress_policy_core::{
    inbound::{ClusterWeights, WeightedCluster},
    ServiceRef,
};

/// Holds cluster metadata.
#[derive(Clone, Debug)]
pub struct ClusterInfo {
    /// E.g. "cluster.local"
    pub dns_domain: String,
}

impl ClusterInfo {
    pub(crate) fn service_dns_name(&self, ns: &str, svc: &str) -> String {
        format!("{}.{}.svc.{}", svc, ns, self.dns_domain)
    }
}

/// Ingress traffic is never split: the service's cluster receives all of it.
impl ClusterWeights for ClusterInfo {
    fn default_weighted_cluster(&self, service: &ServiceRef) -> WeightedCluster {
        WeightedCluster::full(self.service_dns_name(&service.namespace, &service.name))
    }
}

use crate::{
    ingress::{self, DiscoverIngresses},
    ClusterInfo,
};
use ahash::AHashMap as HashMap;
use anyhow::Result;
use linkerd_ingress_policy_core::{inbound::InboundPolicySet, ServiceRef};
use linkerd_ingress_policy_k8s_api::{self as k8s, Ingress, ResourceExt, Time};
use parking_lot::RwLock;
use std::{cmp::Ordering, sync::Arc};
use tokio::sync::watch;

pub mod metrics;

#[cfg(test)]
mod tests;

pub type SharedIndex = Arc<RwLock<Index>>;

/// Holds all `Ingress` resources by namespace, and publishes the inbound policies of each service
/// that has been looked up.
#[derive(Debug)]
pub struct Index {
    cluster_info: Arc<ClusterInfo>,
    namespaces: HashMap<String, Namespace>,
}

#[derive(Debug, Default)]
struct Namespace {
    ingresses: HashMap<String, Ingress>,

    /// Policy watches by service name.
    services: HashMap<String, watch::Sender<InboundPolicySet>>,
}

impl kubert::index::IndexNamespacedResource<Ingress> for Index {
    fn apply(&mut self, ingress: Ingress) {
        let ns = ingress.namespace().expect("Ingress must have a namespace");
        let name = ingress.name_unchecked();
        tracing::debug!(%ns, %name, "indexing ingress");
        self.namespaces
            .entry(ns.clone())
            .or_default()
            .ingresses
            .insert(name, ingress);
        self.reindex(&ns);
    }

    fn delete(&mut self, namespace: String, name: String) {
        tracing::debug!(%namespace, %name, "deleting ingress");
        let Some(ns) = self.namespaces.get_mut(&namespace) else {
            return;
        };
        if ns.ingresses.remove(&name).is_none() {
            return;
        }
        self.reindex(&namespace);
    }
}

impl DiscoverIngresses for Index {
    fn get_ingress_resources(&self, service: &ServiceRef) -> Result<Vec<Ingress>> {
        match self.namespaces.get(&service.namespace) {
            Some(ns) => ns.get_ingress_resources(service),
            None => Ok(Vec::new()),
        }
    }
}

// === impl Index ===

impl Index {
    pub fn shared(cluster_info: Arc<ClusterInfo>) -> SharedIndex {
        Arc::new(RwLock::new(Self {
            cluster_info,
            namespaces: HashMap::default(),
        }))
    }

    /// Builds the service's inbound policies from the currently indexed ingresses.
    pub fn inbound_policies(
        &self,
        service: &ServiceRef,
    ) -> Result<InboundPolicySet, ingress::Error> {
        ingress::inbound_policies(self, &*self.cluster_info, service)
    }

    /// Returns a watch that is updated whenever the service's inbound policies change.
    pub fn policy_rx(&mut self, service: ServiceRef) -> watch::Receiver<InboundPolicySet> {
        let cluster_info = &self.cluster_info;
        let ns = self
            .namespaces
            .entry(service.namespace.clone())
            .or_default();
        if let Some(tx) = ns.services.get(&service.name) {
            return tx.subscribe();
        }

        tracing::debug!(%service, "subscribing to service ingress policies");
        let (tx, rx) = watch::channel(ns.policies(&service, cluster_info));
        ns.services.insert(service.name, tx);
        rx
    }

    /// Updates the policy watches of all services in a namespace, dropping the namespace once it
    /// has neither ingresses nor watches.
    fn reindex(&mut self, namespace: &str) {
        let cluster_info = &self.cluster_info;
        let Some(ns) = self.namespaces.get_mut(namespace) else {
            return;
        };

        ns.services.retain(|name, tx| {
            let closed = tx.is_closed();
            if closed {
                tracing::debug!(%namespace, service = %name, "dropping unobserved service watch");
            }
            !closed
        });

        if ns.ingresses.is_empty() && ns.services.is_empty() {
            tracing::trace!(%namespace, "dropping empty namespace");
            self.namespaces.remove(namespace);
            return;
        }

        for (name, tx) in &ns.services {
            let service = ServiceRef::new(namespace, name);
            let policies = ns.policies(&service, cluster_info);
            let updated = tx.send_if_modified(|current| {
                if *current == policies {
                    return false;
                }
                *current = policies;
                true
            });
            if updated {
                tracing::debug!(%service, "updated ingress policies");
            } else {
                tracing::trace!(%service, "no changes");
            }
        }
    }
}

// === impl Namespace ===

impl Namespace {
    fn policies(&self, service: &ServiceRef, cluster_info: &ClusterInfo) -> InboundPolicySet {
        ingress::inbound_policies(self, cluster_info, service).unwrap_or_else(|error| {
            tracing::error!(%error, %service, "failed to build ingress policies");
            InboundPolicySet::default()
        })
    }
}

/// Ingresses are returned oldest first (and by name when created at the same time) so that older
/// ingresses take precedence over newer ones.
impl DiscoverIngresses for Namespace {
    fn get_ingress_resources(&self, service: &ServiceRef) -> Result<Vec<Ingress>> {
        let mut ingresses = self
            .ingresses
            .values()
            .filter(|ingress| k8s::ingress::references_service(ingress, &service.name))
            .cloned()
            .collect::<Vec<_>>();
        ingresses.sort_by(creation_order);
        Ok(ingresses)
    }
}

fn creation_order(a: &Ingress, b: &Ingress) -> Ordering {
    let created = |ingress: &Ingress| {
        ingress
            .metadata
            .creation_timestamp
            .as_ref()
            .map(|Time(t)| *t)
    };
    created(a)
        .cmp(&created(b))
        .then_with(|| a.metadata.name.cmp(&b.metadata.name))
}

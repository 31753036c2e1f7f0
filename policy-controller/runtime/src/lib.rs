#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use linkerd_ingress_policy_core as core;
pub use linkerd_ingress_policy_k8s_api as k8s;
pub use linkerd_ingress_policy_k8s_index as index;

mod args;

pub use self::args::Args;

use futures::prelude::*;
use std::pin::Pin;

pub type InboundPolicyStream =
    Pin<Box<dyn Stream<Item = core::inbound::InboundPolicySet> + Send + Sync + 'static>>;

/// Looks up ingress policies against the shared index.
#[derive(Clone, Debug)]
pub struct IngressPolicyDiscover(index::SharedIndex);

impl IngressPolicyDiscover {
    pub fn new(index: index::SharedIndex) -> Self {
        Self(index)
    }

    /// Builds the service's current policies.
    pub fn get_policies(
        &self,
        service: &core::ServiceRef,
    ) -> anyhow::Result<core::inbound::InboundPolicySet> {
        let policies = self.0.read().inbound_policies(service)?;
        Ok(policies)
    }

    /// Streams the service's policies, starting with the current state and then each time they
    /// change.
    pub fn watch_policies(&self, service: core::ServiceRef) -> InboundPolicyStream {
        let rx = self.0.write().policy_rx(service);
        Box::pin(tokio_stream::wrappers::WatchStream::new(rx))
    }
}

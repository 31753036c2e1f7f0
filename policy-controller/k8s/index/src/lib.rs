//! Ingress policy indexing
//!
//! Ingress resources are not part of the mesh: their traffic arrives from outside the cluster and
//! carries no mesh identity. This crate translates the `networking.k8s.io/v1` Ingress resources
//! that route to a service into the inbound policies that describe, for each routing domain
//! (host), which requests the service's proxies admit and where they are sent.
//!
//! ```text
//! [ Ingress ] -> [ Index ] -> DiscoverIngresses -> inbound_policies -> [ InboundPolicySet ]
//! ```
//!
//! Each ingress contributes at most one policy for its default backend (matching any host) and
//! one policy per rule block (host). Policies are folded into the service's set so that each
//! routing domain appears once and each route match appears once per domain.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod cluster_info;
pub mod index;
pub mod ingress;

pub use self::{
    cluster_info::ClusterInfo,
    index::{Index, SharedIndex},
    ingress::{inbound_policies, DiscoverIngresses},
};

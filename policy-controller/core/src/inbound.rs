use crate::{routes::HttpRouteMatch, IdentityMatch, WILDCARD};
use anyhow::{bail, Result};
use serde::Serialize;
use std::{collections::BTreeSet, fmt, str::FromStr};


/// Identifies a service that ingress resources route to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceRef {
    pub namespace: String,
    pub name: String,
}

/// Computes the destination that traffic for a service is sent to when no
/// explicit traffic split applies.
pub trait ClusterWeights {
    fn default_weighted_cluster(&self, service: &ServiceRef) -> WeightedCluster;
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct WeightedCluster {
    pub cluster: String,
    pub weight: u32,
}

/// The set of hostnames that a policy's rules apply to.
///
/// Equality does not depend on the order in which hostnames were added.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RoutingDomain(BTreeSet<String>);

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RouteRule {
    pub route: HttpRouteMatch,
    pub backends: Vec<WeightedCluster>,
    pub identities: Vec<IdentityMatch>,
}

/// Describes how requests for a routing domain are routed to a local service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InboundPolicy {
    pub name: String,
    pub domain: RoutingDomain,
    pub rules: Vec<RouteRule>,
}

/// An insertion-ordered collection of policies with at most one policy per
/// routing domain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InboundPolicySet(Vec<InboundPolicy>);

// === impl ServiceRef ===

impl ServiceRef {
    pub fn new(namespace: impl ToString, name: impl ToString) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for ServiceRef {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((ns, name)) if !ns.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self::new(ns, name))
            }
            _ => bail!("invalid service reference {s:?}; expected `namespace/name`"),
        }
    }
}

// === impl WeightedCluster ===

impl WeightedCluster {
    pub const FULL_WEIGHT: u32 = 100;

    /// A cluster that receives all of a route's traffic.
    pub fn full(cluster: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            weight: Self::FULL_WEIGHT,
        }
    }
}

// === impl RoutingDomain ===

impl RoutingDomain {
    /// Matches any host.
    pub fn wildcard() -> Self {
        Self(Some(WILDCARD.to_string()).into_iter().collect())
    }

    /// A single-host domain. An empty host is treated as any host.
    pub fn host(host: &str) -> Self {
        if host.is_empty() {
            return Self::wildcard();
        }
        Self(Some(host.to_string()).into_iter().collect())
    }

    pub fn is_wildcard(&self) -> bool {
        self.0.contains(WILDCARD)
    }

    pub fn hostnames(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }
}

impl FromIterator<String> for RoutingDomain {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        let hosts = iter
            .into_iter()
            .filter(|h| !h.is_empty())
            .collect::<BTreeSet<_>>();
        if hosts.is_empty() {
            return Self::wildcard();
        }
        Self(hosts)
    }
}

impl fmt::Display for RoutingDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut hosts = self.hostnames();
        if let Some(host) = hosts.next() {
            host.fmt(f)?;
        }
        for host in hosts {
            write!(f, ",{}", host)?;
        }
        Ok(())
    }
}

// === impl RouteRule ===

impl RouteRule {
    /// A rule that admits any caller, since ingress traffic carries no mesh
    /// identity.
    pub fn ingress(route: HttpRouteMatch, backend: WeightedCluster) -> Self {
        Self {
            route,
            backends: vec![backend],
            identities: vec![IdentityMatch::Any],
        }
    }
}

// === impl InboundPolicy ===

impl InboundPolicy {
    pub fn new(name: impl Into<String>, domain: RoutingDomain) -> Self {
        Self {
            name: name.into(),
            domain,
            rules: Vec::new(),
        }
    }

    /// Adds a rule unless a rule with the same route match is already
    /// present, in which case the existing rule is left unchanged.
    ///
    /// Returns true if the rule was added.
    pub fn add_rule(&mut self, rule: RouteRule) -> bool {
        if self.rules.iter().any(|r| r.route == rule.route) {
            return false;
        }
        self.rules.push(rule);
        true
    }

    pub fn with_rules(mut self, rules: impl IntoIterator<Item = RouteRule>) -> Self {
        for rule in rules {
            self.add_rule(rule);
        }
        self
    }
}

// === impl InboundPolicySet ===

impl InboundPolicySet {
    /// Folds a policy into the set.
    ///
    /// A policy without rules is dropped. If a policy for the same routing
    /// domain exists, rules with new route matches are appended to it and
    /// rules whose match is already present are discarded; otherwise the
    /// policy is appended.
    #[must_use]
    pub fn merge(mut self, candidate: InboundPolicy) -> Self {
        if candidate.rules.is_empty() {
            return self;
        }

        match self.0.iter_mut().find(|p| p.domain == candidate.domain) {
            Some(existing) => {
                for rule in candidate.rules {
                    existing.add_rule(rule);
                }
            }
            None => self.0.push(candidate),
        }
        self
    }

    pub fn get(&self, domain: &RoutingDomain) -> Option<&InboundPolicy> {
        self.0.iter().find(|p| p.domain == *domain)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InboundPolicy> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<InboundPolicy> for InboundPolicySet {
    fn from_iter<T: IntoIterator<Item = InboundPolicy>>(iter: T) -> Self {
        iter.into_iter().fold(Self::default(), Self::merge)
    }
}

impl Extend<InboundPolicy> for InboundPolicySet {
    fn extend<T: IntoIterator<Item = InboundPolicy>>(&mut self, iter: T) {
        let set = std::mem::take(self);
        *self = iter.into_iter().fold(set, Self::merge);
    }
}

impl IntoIterator for InboundPolicySet {
    type Item = InboundPolicy;
    type IntoIter = std::vec::IntoIter<InboundPolicy>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a InboundPolicySet {
    type Item = &'a InboundPolicy;
    type IntoIter = std::slice::Iter<'a, InboundPolicy>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

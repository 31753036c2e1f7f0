use linkerd_ingress_policy_core::{
    inbound::{
        ClusterWeights, InboundPolicy, InboundPolicySet, RouteRule, RoutingDomain, WeightedCluster,
    },
    routes::{HttpRouteMatch, MethodMatch, PathMatch},
    ServiceRef, WILDCARD,
};
use linkerd_ingress_policy_k8s_api::{self as k8s, Ingress, IngressRule, ResourceExt};

mod path;

pub use self::path::{
    classify, looks_like_regex, PathError, COMMON_REGEX_CHARS, PREFIX_PATH_ELEMENTS_REGEX,
};


/// Models discovery of the Ingress resources that route to a service.
pub trait DiscoverIngresses {
    /// Returns the ingresses that route to `service`, in the order in which they should take
    /// precedence. Returns an empty list when no ingress routes to the service.
    fn get_ingress_resources(&self, service: &ServiceRef) -> anyhow::Result<Vec<Ingress>>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to get ingress resources for service {service}")]
    Provider {
        service: ServiceRef,
        #[source]
        source: anyhow::Error,
    },
}

/// Builds the inbound policies for the Ingress resources that route to `service`.
///
/// Ingresses are processed in the order in which they are discovered. When several ingresses (or
/// rule blocks) produce the same route match for the same routing domain, the first one wins.
/// Paths with unsupported path types are skipped; only a discovery failure fails the whole set.
pub fn inbound_policies<D, W>(
    discover: &D,
    weights: &W,
    service: &ServiceRef,
) -> Result<InboundPolicySet, Error>
where
    D: DiscoverIngresses + ?Sized,
    W: ClusterWeights + ?Sized,
{
    let ingresses = discover.get_ingress_resources(service).map_err(|source| {
        tracing::error!(error = %source, %service, "failed to get ingress resources");
        Error::Provider {
            service: service.clone(),
            source,
        }
    })?;
    if ingresses.is_empty() {
        tracing::trace!(%service, "no ingress resources found");
        return Ok(InboundPolicySet::default());
    }

    let backend = weights.default_weighted_cluster(service);
    let policies = ingresses
        .iter()
        .flat_map(|ingress| ingress_policies(ingress, service, &backend))
        .collect::<InboundPolicySet>();
    tracing::debug!(%service, policies = policies.len(), "built ingress policies");
    Ok(policies)
}

/// Returns a wildcard policy routing all requests to `backend` if the ingress's default backend
/// is `service`.
pub fn default_backend_policy(
    ingress: &Ingress,
    service: &ServiceRef,
    backend: &WeightedCluster,
) -> Option<InboundPolicy> {
    if k8s::ingress::default_backend_service(ingress) != Some(service.name.as_str()) {
        return None;
    }

    let rule = RouteRule::ingress(HttpRouteMatch::wildcard(), backend.clone());
    let policy = InboundPolicy::new(policy_name(ingress, WILDCARD), RoutingDomain::wildcard())
        .with_rules(Some(rule));
    Some(policy)
}

/// Returns the routing domain of an ingress rule block along with a route rule for each of its
/// paths that routes to `service`.
pub fn route_rules(
    ingress: &Ingress,
    rule: &IngressRule,
    service: &ServiceRef,
    backend: &WeightedCluster,
) -> (RoutingDomain, Vec<RouteRule>) {
    let domain = RoutingDomain::host(rule.host.as_deref().unwrap_or_default());

    let rules = k8s::ingress::http_paths(rule)
        .filter(|p| k8s::ingress::backend_service(&p.backend) == Some(service.name.as_str()))
        .filter_map(|p| {
            let path = p.path.as_deref().unwrap_or_default();
            match classify(Some(p.path_type.as_str()), path) {
                Ok(path) => {
                    if let PathMatch::Regex(re) = &path {
                        if !re.is_valid() {
                            tracing::warn!(
                                ingress = %ingress.name_any(),
                                namespace = %ingress.namespace().unwrap_or_default(),
                                path = %re,
                                "ingress path expression does not compile and matches no requests",
                            );
                        }
                    }
                    let route = HttpRouteMatch {
                        path,
                        methods: vec![MethodMatch::Any],
                    };
                    Some(RouteRule::ingress(route, backend.clone()))
                }
                Err(error) => {
                    tracing::warn!(
                        %error,
                        ingress = %ingress.name_any(),
                        namespace = %ingress.namespace().unwrap_or_default(),
                        path,
                        path_type = %p.path_type,
                        "ignoring ingress path",
                    );
                    None
                }
            }
        })
        .collect();

    (domain, rules)
}

/// Policies are named `{ingress}.{namespace}|{domain}` so that rebuilding from the same
/// resources produces the same names.
pub fn policy_name(ingress: &Ingress, domain: &str) -> String {
    format!(
        "{}.{}|{}",
        ingress.name_any(),
        ingress.namespace().unwrap_or_default(),
        domain
    )
}

fn ingress_policies<'i>(
    ingress: &'i Ingress,
    service: &'i ServiceRef,
    backend: &'i WeightedCluster,
) -> impl Iterator<Item = InboundPolicy> + 'i {
    let rule_policies = k8s::ingress::rules(ingress).filter_map(move |rule| {
        let (domain, rules) = route_rules(ingress, rule, service, backend);
        if rules.is_empty() {
            return None;
        }
        let name = policy_name(ingress, &domain.to_string());
        Some(InboundPolicy::new(name, domain).with_rules(rules))
    });

    default_backend_policy(ingress, service, backend)
        .into_iter()
        .chain(rule_policies)
}

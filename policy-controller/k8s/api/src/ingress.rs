use crate::{HTTPIngressPath, Ingress, IngressBackend, IngressRule};
use std::{fmt, str::FromStr};

/// How an Ingress path is matched against request paths.
///
/// See <https://kubernetes.io/docs/concepts/services-networking/ingress/#path-types>.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathType {
    /// Matches the URL path exactly.
    Exact,

    /// Matches based on a URL path prefix split by `/`, element by element.
    Prefix,

    /// Matching is up to the controller.
    ImplementationSpecific,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unsupported path type {0:?}")]
pub struct ParsePathTypeError(pub String);

// === impl PathType ===

impl PathType {
    /// Parses an Ingress path's `pathType`. An unset (or empty) path type is
    /// treated as `ImplementationSpecific`.
    pub fn from_tag(tag: Option<&str>) -> Result<Self, ParsePathTypeError> {
        match tag {
            None | Some("") => Ok(Self::ImplementationSpecific),
            Some(tag) => tag.parse(),
        }
    }
}

impl FromStr for PathType {
    type Err = ParsePathTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Exact" => Ok(Self::Exact),
            "Prefix" => Ok(Self::Prefix),
            "ImplementationSpecific" => Ok(Self::ImplementationSpecific),
            _ => Err(ParsePathTypeError(s.to_string())),
        }
    }
}

impl fmt::Display for PathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => "Exact".fmt(f),
            Self::Prefix => "Prefix".fmt(f),
            Self::ImplementationSpecific => "ImplementationSpecific".fmt(f),
        }
    }
}

/// Returns the name of the service a backend points at. Resource backends
/// have no service name.
pub fn backend_service(backend: &IngressBackend) -> Option<&str> {
    backend.service.as_ref().map(|svc| svc.name.as_str())
}

pub fn default_backend_service(ingress: &Ingress) -> Option<&str> {
    ingress
        .spec
        .as_ref()
        .and_then(|spec| spec.default_backend.as_ref())
        .and_then(backend_service)
}

pub fn rules(ingress: &Ingress) -> impl Iterator<Item = &IngressRule> {
    ingress
        .spec
        .iter()
        .flat_map(|spec| spec.rules.iter().flatten())
}

pub fn http_paths(rule: &IngressRule) -> impl Iterator<Item = &HTTPIngressPath> {
    rule.http.iter().flat_map(|http| http.paths.iter())
}

/// Indicates whether the ingress routes any traffic to the named service,
/// either through its default backend or through a rule's path.
pub fn references_service(ingress: &Ingress, service: &str) -> bool {
    default_backend_service(ingress) == Some(service)
        || rules(ingress)
            .flat_map(http_paths)
            .any(|path| backend_service(&path.backend) == Some(service))
}

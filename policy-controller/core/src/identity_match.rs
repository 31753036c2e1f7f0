use serde::{Serialize, Serializer};
use std::fmt;

/// Matches a client's identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IdentityMatch {
    /// Admits clients regardless of identity. Ingress traffic carries no mesh
    /// identity, so ingress policies are always built with this value.
    Any,

    /// A Kubernetes service account identity.
    ServiceAccount { namespace: String, name: String },
}

// === impl IdentityMatch ===

impl fmt::Display for IdentityMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => crate::WILDCARD.fmt(f),
            Self::ServiceAccount { namespace, name } => write!(f, "{}/{}", namespace, name),
        }
    }
}

impl Serialize for IdentityMatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

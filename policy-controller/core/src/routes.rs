pub use http::Method;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::{
    fmt,
    hash::{Hash, Hasher},
};

/// Describes the requests a route rule applies to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct HttpRouteMatch {
    pub path: PathMatch,
    pub methods: Vec<MethodMatch>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PathMatch {
    /// Matches a request path that is equal to the value.
    Exact(String),

    /// Matches a request path that starts with the value. This is a plain
    /// string prefix: `/foo` matches `/foobar`.
    Prefix(String),

    /// Matches a request path that the expression matches in its entirety.
    Regex(PathRegex),
}

/// A path expression that is always evaluated against the whole request path.
///
/// The declared pattern is kept even when it does not compile; such an
/// expression matches no request. Two expressions are equal when their
/// declared patterns are equal.
#[derive(Clone, Debug)]
pub struct PathRegex {
    pattern: String,
    anchored: Option<Regex>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MethodMatch {
    Any,
    Exact(Method),
}

// === impl HttpRouteMatch ===

impl HttpRouteMatch {
    /// Matches all requests, regardless of method or path.
    pub fn wildcard() -> Self {
        Self {
            path: PathMatch::Regex(PathRegex::any()),
            methods: vec![MethodMatch::Any],
        }
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.methods.iter().any(|m| m.matches(method)) && self.path.matches(path)
    }
}

// === impl PathMatch ===

impl PathMatch {
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::Regex(PathRegex::new(pattern))
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(p) => path == p,
            Self::Prefix(p) => path.starts_with(p.as_str()),
            Self::Regex(re) => re.is_match(path),
        }
    }
}

impl fmt::Display for PathMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(p) => write!(f, "exact:{}", p),
            Self::Prefix(p) => write!(f, "prefix:{}", p),
            Self::Regex(re) => write!(f, "regex:{}", re),
        }
    }
}

// === impl PathRegex ===

impl PathRegex {
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let anchored = Self::compile(&pattern).ok();
        Self { pattern, anchored }
    }

    /// Matches any path.
    pub fn any() -> Self {
        Self::new(".*")
    }

    /// Compiles a pattern so that it must match the whole path.
    pub fn compile(pattern: &str) -> Result<Regex, regex::Error> {
        // The pattern must stand on its own; otherwise a stray `)` could
        // escape the anchoring group.
        Regex::new(pattern)?;
        Regex::new(&format!("^(?:{})$", pattern))
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Indicates whether the pattern compiled. An invalid expression never
    /// matches.
    pub fn is_valid(&self) -> bool {
        self.anchored.is_some()
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.anchored.as_ref().is_some_and(|re| re.is_match(path))
    }
}

impl PartialEq for PathRegex {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for PathRegex {}

impl Hash for PathRegex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pattern.hash(state);
    }
}

impl fmt::Display for PathRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.pattern.fmt(f)
    }
}

impl Serialize for PathRegex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.pattern)
    }
}

// === impl MethodMatch ===

impl MethodMatch {
    pub fn matches(&self, method: &Method) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(m) => m == method,
        }
    }
}

impl fmt::Display for MethodMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => crate::WILDCARD.fmt(f),
            Self::Exact(m) => m.as_str().fmt(f),
        }
    }
}

impl Serialize for MethodMatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

use linkerd_ingress_policy_core::routes::PathMatch;
use linkerd_ingress_policy_k8s_api::{ParsePathTypeError, PathType};

/// Matches nothing, or a `/` followed by anything, through the end of the path.
///
/// Appended to an element-wise prefix so that `/foo` matches `/foo` and `/foo/bar` but not
/// `/foobar`. The prefix is regex-escaped before the suffix is appended, so it always matches
/// literally.
pub const PREFIX_PATH_ELEMENTS_REGEX: &str = "(/.*)?$";

/// Characters that are common in regular expressions but rare in literal paths. An
/// implementation-specific path containing any of them is matched as a regular expression.
pub const COMMON_REGEX_CHARS: &[char] = &['^', '$', '*', '+', '[', ']', '%', '|'];

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error(transparent)]
    UnsupportedPathType(#[from] ParsePathTypeError),
}

/// Converts an Ingress path and its `pathType` into a path match.
///
/// - `Exact` paths match the request path exactly.
/// - `Prefix` paths match element-wise: the request path must equal the prefix or continue it
///   at a `/` boundary. A trailing `/` on the prefix is ignored.
/// - `ImplementationSpecific` (or unset) paths are matched as a regular expression when they
///   [look like one](looks_like_regex) and as a plain string prefix otherwise. Unlike `Prefix`,
///   `/foo` matches `/foobar`. The expression is kept as declared, even if it does not compile.
pub fn classify(path_type: Option<&str>, path: &str) -> Result<PathMatch, PathError> {
    match PathType::from_tag(path_type)? {
        PathType::Exact => Ok(PathMatch::Exact(path.to_string())),
        PathType::Prefix => {
            let prefix = path.strip_suffix('/').unwrap_or(path);
            let pattern = format!("{}{}", regex::escape(prefix), PREFIX_PATH_ELEMENTS_REGEX);
            Ok(PathMatch::regex(pattern))
        }
        PathType::ImplementationSpecific if looks_like_regex(path) => Ok(PathMatch::regex(path)),
        PathType::ImplementationSpecific => Ok(PathMatch::Prefix(path.to_string())),
    }
}

/// Guesses whether an implementation-specific path is a regular expression.
pub fn looks_like_regex(path: &str) -> bool {
    path.contains(COMMON_REGEX_CHARS)
}

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod identity_match;
pub mod inbound;
pub mod routes;

pub use self::{identity_match::IdentityMatch, inbound::ServiceRef};

/// The reserved value matching any host or any method.
pub const WILDCARD: &str = "*";

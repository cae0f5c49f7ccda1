//! Authentication module
//!
//! GitHub accepts a personal access token in the `Authorization` header.
//! Without a token requests go out anonymously and are subject to the much
//! lower unauthenticated rate limit.

mod credentials;

pub use credentials::{AuthScheme, Credentials};

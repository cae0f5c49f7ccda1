//! Request specifications

use crate::pagination::PageLayout;
use crate::types::{Method, StringMap};

/// One logical API request, before authentication and retries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestSpec {
    /// HTTP method
    pub method: Method,
    /// Path relative to the base URL, or an absolute URL
    pub path: String,
    /// Query parameters
    pub query: StringMap,
    /// Extra request headers
    pub headers: StringMap,
    /// How to read records and cursors out of the response
    pub layout: PageLayout,
}

impl RequestSpec {
    /// A GET request for `path`
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// A GET request for a path built from raw segments, each percent-encoded
    pub fn get_segments(segments: &[&str]) -> Self {
        let path = segments
            .iter()
            .map(|s| urlencoding::encode(s))
            .collect::<Vec<_>>()
            .join("/");
        Self::get(format!("/{path}"))
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.insert(key.into(), value.to_string());
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the response layout
    #[must_use]
    pub fn layout(mut self, layout: PageLayout) -> Self {
        self.layout = layout;
        self
    }
}

#[cfg(test)]
mod request_tests {
    use super::*;

    #[test]
    fn test_builder() {
        let spec = RequestSpec::get("/users/octocat/repos")
            .query("per_page", 100)
            .query("sort", "updated")
            .header("X-Trace", "abc");

        assert_eq!(spec.method, Method::GET);
        assert_eq!(spec.query.get("per_page"), Some(&"100".to_string()));
        assert_eq!(spec.query.get("sort"), Some(&"updated".to_string()));
        assert_eq!(spec.headers.get("X-Trace"), Some(&"abc".to_string()));
    }

    #[test]
    fn test_segments_are_encoded() {
        let spec = RequestSpec::get_segments(&["repos", "owner", "my repo/../x"]);
        assert_eq!(spec.path, "/repos/owner/my%20repo%2F..%2Fx");

        let spec = RequestSpec::get_segments(&["users", "octo-cat_1.x"]);
        assert_eq!(spec.path, "/users/octo-cat_1.x");
    }
}

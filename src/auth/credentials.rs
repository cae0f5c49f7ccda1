//! Token credentials

use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the token is presented in the `Authorization` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
    /// `Authorization: Bearer <token>`
    #[default]
    Bearer,
    /// `Authorization: token <token>` (classic personal access tokens)
    Token,
}

/// Credentials applied to every request
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Credentials {
    /// No authentication
    #[default]
    Anonymous,
    /// Personal access token
    Token {
        /// The token value
        token: String,
        /// Header scheme
        scheme: AuthScheme,
    },
}

impl Credentials {
    /// Bearer credentials from an optional token; blank tokens mean anonymous
    pub fn from_token(token: Option<impl Into<String>>) -> Self {
        match token.map(Into::into) {
            Some(token) if !token.trim().is_empty() => Self::Token {
                token: token.trim().to_string(),
                scheme: AuthScheme::Bearer,
            },
            _ => Self::Anonymous,
        }
    }

    /// Switch the header scheme (no-op for anonymous credentials)
    #[must_use]
    pub fn with_scheme(self, scheme: AuthScheme) -> Self {
        match self {
            Self::Token { token, .. } => Self::Token { token, scheme },
            Self::Anonymous => Self::Anonymous,
        }
    }

    /// Whether a token is configured
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Token { .. })
    }

    /// Apply authentication to a request builder
    pub fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Anonymous => req,
            Self::Token {
                token,
                scheme: AuthScheme::Bearer,
            } => req.bearer_auth(token),
            Self::Token {
                token,
                scheme: AuthScheme::Token,
            } => req.header(reqwest::header::AUTHORIZATION, format!("token {token}")),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::Token { scheme, .. } => f
                .debug_struct("Token")
                .field("token", &"<redacted>")
                .field("scheme", scheme)
                .finish(),
        }
    }
}

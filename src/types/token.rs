use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Store key of the long-lived JWT used by the single token strategy.
pub const JWT_TOKEN_KEY: &str = "jwt-token";

/// Store key of the refresh token used by the token pair strategy.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// How the authentication backend hands out tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStrategy {
    /// One durable JWT, no refresh.
    #[serde(rename = "single")]
    Single,
    /// Short-lived access token plus a rotating refresh token.
    #[serde(rename = "pair")]
    Pair,
}

impl TokenStrategy {
    /// The key under which the long-lived part of the token is persisted.
    pub fn store_key(self) -> &'static str {
        match self {
            TokenStrategy::Single => JWT_TOKEN_KEY,
            TokenStrategy::Pair => REFRESH_TOKEN_KEY,
        }
    }

    pub fn default_identifier_kind(self) -> IdentifierKind {
        match self {
            TokenStrategy::Single => IdentifierKind::Email,
            TokenStrategy::Pair => IdentifierKind::Username,
        }
    }
}

impl fmt::Display for TokenStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenStrategy::Single => write!(f, "single"),
            TokenStrategy::Pair => write!(f, "pair"),
        }
    }
}

/// The JSON field the login endpoint expects the identifier under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentifierKind {
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "username")]
    Username,
}

impl IdentifierKind {
    pub fn field_name(self) -> &'static str {
        match self {
            IdentifierKind::Email => "email",
            IdentifierKind::Username => "username",
        }
    }
}

/// User credentials for one login attempt. They are never persisted.
#[derive(Clone)]
pub struct Credentials {
    pub identifier: String,
    pub password: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: password.into(),
        }
    }

    /// Build the login request body. Values are sent as-is, the server is responsible for
    /// rejecting empty or malformed ones.
    pub fn login_body(&self, kind: IdentifierKind) -> Value {
        let mut body = json!({ "password": self.password });
        body[kind.field_name()] = Value::String(self.identifier.clone());
        body
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("password", &"<hidden>")
            .finish()
    }
}

/// Login response of the single token strategy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SingleToken {
    #[serde(rename = "jwt-token")]
    pub jwt_token: String,
}

/// Login and refresh response of the token pair strategy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Tokens issued by a successful login.
#[derive(Debug, Clone, PartialEq)]
pub enum IssuedTokens {
    Single(SingleToken),
    Pair(TokenPair),
}

impl IssuedTokens {
    /// The long-lived component and the key it is persisted under.
    pub fn persisted(&self) -> (&'static str, &str) {
        match self {
            IssuedTokens::Single(token) => (JWT_TOKEN_KEY, &token.jwt_token),
            IssuedTokens::Pair(pair) => (REFRESH_TOKEN_KEY, &pair.refresh_token),
        }
    }

    /// The token to present as bearer for the current connection.
    pub fn into_bearer(self) -> String {
        match self {
            IssuedTokens::Single(token) => token.jwt_token,
            IssuedTokens::Pair(pair) => pair.access_token,
        }
    }
}

/// The subset of JWT claims the client reports on. Tokens are opaque to the client, this
/// is informational only and never used to decide whether a token is usable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: Option<String>,
    pub exp: Option<u64>,
    pub iat: Option<u64>,
}

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::prompt::CredentialProvider;
use crate::types::token::{Credentials, IssuedTokens, TokenPair};

use super::{AuthApi, RequestError};

/// Ordered record of the calls made against fakes, shared between them so tests can check
/// the relative order of logins, refreshes and connects.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn push(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

/// Scripted authentication service. Failures are expressed as HTTP status codes.
pub struct FakeAuthApi {
    pub log: CallLog,
    pub login: Result<IssuedTokens, u16>,
    pub refresh: Result<TokenPair, u16>,
}

impl FakeAuthApi {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            login: Err(500),
            refresh: Err(500),
        }
    }

    pub fn with_login(mut self, tokens: IssuedTokens) -> Self {
        self.login = Ok(tokens);
        self
    }

    pub fn with_login_error(mut self, code: u16) -> Self {
        self.login = Err(code);
        self
    }

    pub fn with_refresh(mut self, access: &str, refresh: &str) -> Self {
        self.refresh = Ok(pair(access, refresh));
        self
    }

    pub fn with_refresh_error(mut self, code: u16) -> Self {
        self.refresh = Err(code);
        self
    }
}

pub fn pair(access: &str, refresh: &str) -> TokenPair {
    TokenPair {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
    }
}

fn server_error(code: u16) -> RequestError {
    RequestError::Server {
        code,
        message: format!("{{\"code\":{code}}}"),
    }
}

#[async_trait]
impl AuthApi for FakeAuthApi {
    async fn login(&self, credentials: &Credentials) -> Result<IssuedTokens, RequestError> {
        self.log.push(format!("login:{}", credentials.identifier));
        self.login.clone().map_err(server_error)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, RequestError> {
        self.log.push(format!("refresh:{refresh_token}"));
        self.refresh.clone().map_err(server_error)
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), RequestError> {
        self.log.push(format!("logout:{refresh_token}"));
        Ok(())
    }
}

/// Credential provider that records each time it is asked.
pub struct FakeCredentials {
    pub log: CallLog,
}

impl CredentialProvider for FakeCredentials {
    fn credentials(&self) -> anyhow::Result<Credentials> {
        self.log.push("prompt");
        Ok(Credentials::new("alice", "pw"))
    }
}

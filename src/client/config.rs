use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::config::{expandenv, CommonConfig, PathSet};
use crate::logs;
use crate::transport::TransportKind;
use crate::types::token::{Credentials, IdentifierKind, TokenStrategy};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClientConfig {
    #[serde(default = "ClientConfig::default_server")]
    pub server: String,

    #[serde(default = "ClientConfig::default_login_path")]
    pub login_path: String,

    #[serde(default = "ClientConfig::default_refresh_path")]
    pub refresh_path: String,

    #[serde(default = "ClientConfig::default_logout_path")]
    pub logout_path: String,

    #[serde(default = "ClientConfig::default_ws_path")]
    pub ws_path: String,

    #[serde(default = "ClientConfig::default_transport")]
    pub transport: TransportKind,

    #[serde(default = "ClientConfig::default_strategy")]
    pub strategy: TokenStrategy,

    /// When empty, follows the strategy: `email` for single, `username` for pair.
    #[serde(default)]
    pub identifier_kind: Option<IdentifierKind>,

    /// Login without prompting when both identifier and password are set.
    #[serde(default)]
    pub identifier: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "ClientConfig::default_token_path")]
    pub token_path: String,

    #[serde(default = "ClientConfig::default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "ClientConfig::default_log_level")]
    pub log_level: String,
}

impl CommonConfig for ClientConfig {
    fn default() -> Self {
        Self {
            server: Self::default_server(),
            login_path: Self::default_login_path(),
            refresh_path: Self::default_refresh_path(),
            logout_path: Self::default_logout_path(),
            ws_path: Self::default_ws_path(),
            transport: Self::default_transport(),
            strategy: Self::default_strategy(),
            identifier_kind: None,
            identifier: String::new(),
            password: String::new(),
            token_path: Self::default_token_path(),
            connect_timeout_secs: Self::default_connect_timeout_secs(),
            log_level: Self::default_log_level(),
        }
    }

    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        self.server = expandenv("server", &self.server)?;
        let server = self.server.trim_end_matches('/').to_string();
        if server.is_empty() {
            bail!("server cannot be empty");
        }
        let parsed = match Url::parse(&server) {
            Ok(url) => url,
            Err(_) => bail!("invalid server url '{server}'"),
        };
        match parsed.scheme() {
            "http" | "https" => {}
            scheme => bail!("invalid url scheme, expect 'http' or 'https', not '{scheme}'"),
        }
        self.server = server;

        self.login_path = Self::complete_path("login_path", &self.login_path)?;
        self.refresh_path = Self::complete_path("refresh_path", &self.refresh_path)?;
        self.logout_path = Self::complete_path("logout_path", &self.logout_path)?;
        self.ws_path = Self::complete_path("ws_path", &self.ws_path)?;

        if self.identifier_kind.is_none() {
            self.identifier_kind = Some(self.strategy.default_identifier_kind());
        }
        self.identifier = expandenv("identifier", &self.identifier)?;
        self.password = expandenv("password", &self.password)?;

        self.token_path = expandenv("token_path", &self.token_path)?;
        if self.token_path.is_empty() {
            let path = ps.data_path.join("tokens.json");
            self.token_path = format!("{}", path.display());
        }

        if self.connect_timeout_secs < Self::MIN_CONNECT_TIMEOUT_SECS
            || self.connect_timeout_secs > Self::MAX_CONNECT_TIMEOUT_SECS
        {
            bail!(
                "connect_timeout_secs should be in range [{},{}], found {}",
                Self::MIN_CONNECT_TIMEOUT_SECS,
                Self::MAX_CONNECT_TIMEOUT_SECS,
                self.connect_timeout_secs
            );
        }

        logs::parse_level(&self.log_level).context("log_level")?;

        Ok(())
    }
}

impl ClientConfig {
    const MIN_CONNECT_TIMEOUT_SECS: u64 = 1;
    const MAX_CONNECT_TIMEOUT_SECS: u64 = 300;

    pub fn default_server() -> String {
        String::from("http://localhost:8080")
    }

    pub fn default_login_path() -> String {
        String::from("auth/login")
    }

    pub fn default_refresh_path() -> String {
        String::from("auth/refresh-token")
    }

    pub fn default_logout_path() -> String {
        String::from("auth/logout")
    }

    pub fn default_ws_path() -> String {
        String::from("ws")
    }

    pub fn default_transport() -> TransportKind {
        TransportKind::SockJs
    }

    pub fn default_strategy() -> TokenStrategy {
        TokenStrategy::Pair
    }

    pub fn default_token_path() -> String {
        String::new()
    }

    pub fn default_connect_timeout_secs() -> u64 {
        10
    }

    pub fn default_log_level() -> String {
        String::from("info")
    }

    pub fn identifier_kind(&self) -> IdentifierKind {
        self.identifier_kind
            .unwrap_or_else(|| self.strategy.default_identifier_kind())
    }

    /// Credentials configured for unattended login, if any.
    pub fn static_credentials(&self) -> Option<Credentials> {
        if self.identifier.is_empty() || self.password.is_empty() {
            return None;
        }
        Some(Credentials::new(&self.identifier, &self.password))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// The WebSocket endpoint URL, with the scheme switched to `ws` or `wss`.
    pub fn ws_url(&self) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.server, self.ws_path))
            .with_context(|| format!("invalid websocket url for server '{}'", self.server))?;
        let scheme = match url.scheme() {
            "https" => "wss",
            _ => "ws",
        };
        if url.set_scheme(scheme).is_err() {
            bail!("cannot switch url '{url}' to scheme '{scheme}'");
        }
        Ok(url)
    }

    fn complete_path(name: &str, path: &str) -> Result<String> {
        let path = expandenv(name, path)?;
        let path = path.trim_matches('/').to_string();
        if path.is_empty() {
            bail!("{name} cannot be empty");
        }
        Ok(path)
    }
}

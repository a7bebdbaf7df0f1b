use anyhow::Result;

use crate::chat::ChatConnector;
use crate::config::{CommonConfig, PathSet};
use crate::prompt::{CredentialProvider, StaticCredentials, TerminalPrompt};
use crate::store::file::FileTokenStore;
use crate::transport::WsConnector;

use super::config::ClientConfig;
use super::token::TokenManager;
use super::AuthClient;

pub type Tokens = TokenManager<AuthClient, FileTokenStore, Box<dyn CredentialProvider>>;

pub type Chats =
    ChatConnector<AuthClient, FileTokenStore, Box<dyn CredentialProvider>, WsConnector>;

pub struct ClientFactory {
    cfg: ClientConfig,
}

impl ClientFactory {
    pub fn new(cfg: ClientConfig) -> Self {
        Self { cfg }
    }

    pub fn load(ps: &PathSet) -> Result<Self> {
        let cfg = ps.load_config("client", ClientConfig::default)?;
        Ok(Self { cfg })
    }

    pub fn build_token_manager(&self) -> Tokens {
        let api = AuthClient::new(&self.cfg);
        let store = FileTokenStore::new(&self.cfg.token_path);
        TokenManager::new(api, store, self.build_credentials(), self.cfg.strategy)
    }

    pub fn build_chat_connector(&self) -> Result<Chats> {
        let connector = WsConnector::new(self.cfg.ws_url()?, self.cfg.transport);
        let host = connector.host();
        Ok(ChatConnector::new(
            self.build_token_manager(),
            connector,
            host,
            self.cfg.connect_timeout(),
        ))
    }

    /// Configured credentials win over prompting.
    pub fn build_credentials(&self) -> Box<dyn CredentialProvider> {
        match self.cfg.static_credentials() {
            Some(credentials) => Box::new(StaticCredentials::new(credentials)),
            None => Box::new(TerminalPrompt::new(self.cfg.identifier_kind())),
        }
    }

    pub fn build_prompt(&self) -> TerminalPrompt {
        TerminalPrompt::new(self.cfg.identifier_kind())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.cfg
    }
}

use std::time::Duration;

use anyhow::{bail, Result};
use log::info;
use tokio::time::timeout;

use crate::client::token::TokenManager;
use crate::client::AuthApi;
use crate::prompt::CredentialProvider;
use crate::stomp::StompSession;
use crate::store::TokenStore;
use crate::transport::{Connector, Transport};
use crate::types::chat::{ChatEvent, ChatTarget};

/// Opens authenticated STOMP sessions subscribed to chat topics.
pub struct ChatConnector<A, S, P, C> {
    tokens: TokenManager<A, S, P>,
    connector: C,
    host: String,
    timeout: Duration,
}

impl<A, S, P, C> ChatConnector<A, S, P, C>
where
    A: AuthApi,
    S: TokenStore,
    P: CredentialProvider,
    C: Connector,
{
    pub fn new(
        tokens: TokenManager<A, S, P>,
        connector: C,
        host: String,
        timeout: Duration,
    ) -> Self {
        Self {
            tokens,
            connector,
            host,
            timeout,
        }
    }

    pub fn tokens(&self) -> &TokenManager<A, S, P> {
        &self.tokens
    }

    /// Acquire a token, then open the socket and subscribe to the target's topic. The
    /// socket is never opened without a token: login or refresh always completes first.
    pub async fn connect(&self, target: ChatTarget) -> Result<ChatSession> {
        let token = self.tokens.acquire_token().await?;
        self.open_session(&token, target).await
    }

    /// Open the socket with a token from [`TokenManager::acquire_token`] and subscribe to
    /// the target's topic.
    pub async fn open_session(&self, token: &str, target: ChatTarget) -> Result<ChatSession> {
        info!("Connecting to '{}'", self.connector.endpoint());
        let transport = match timeout(self.timeout, self.connector.open()).await {
            Ok(transport) => transport?,
            Err(_) => bail!(
                "connect to '{}' timed out after {}",
                self.connector.endpoint(),
                humantime::format_duration(self.timeout)
            ),
        };

        let headers = vec![("Authorization".to_string(), format!("Bearer {token}"))];
        let wait = self.timeout;
        let mut session = StompSession::connect(transport, &self.host, headers, wait).await?;
        info!("Connected, STOMP version {}", session.version());

        let destination = target.destination();
        let subscription = session.subscribe(&destination).await?;
        info!("Subscribed to '{destination}' as {subscription}");

        Ok(ChatSession {
            session,
            destination,
        })
    }
}

/// A message delivered on a chat topic.
#[derive(Debug, Clone)]
pub struct ChatDelivery {
    pub destination: String,
    pub message_id: Option<String>,
    pub body: String,
    /// The decoded body, `None` when it is not a known chat event.
    pub event: Option<ChatEvent>,
}

pub struct ChatSession {
    session: StompSession<Box<dyn Transport>>,
    destination: String,
}

impl ChatSession {
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Wait for the next delivery. `None` means the server closed the connection.
    pub async fn next_delivery(&mut self) -> Result<Option<ChatDelivery>> {
        let frame = match self.session.next_message().await? {
            Some(frame) => frame,
            None => return Ok(None),
        };
        let event = ChatEvent::decode(&frame.body);
        Ok(Some(ChatDelivery {
            destination: frame
                .get_header("destination")
                .unwrap_or(&self.destination)
                .to_string(),
            message_id: frame.get_header("message-id").map(String::from),
            body: frame.body,
            event,
        }))
    }

    pub async fn disconnect(self) -> Result<()> {
        info!("Disconnecting from '{}'", self.destination);
        self.session.disconnect().await
    }
}

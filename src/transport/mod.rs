pub mod sockjs;
pub mod websocket;

#[cfg(test)]
pub(crate) mod fake;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use sockjs::SockJsTransport;
use websocket::WebSocketTransport;

/// A bidirectional text channel carrying STOMP data.
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, data: String) -> Result<()>;

    /// Receive the next chunk of text. A chunk may hold any part of one or more STOMP
    /// frames. Returns `None` once the peer has closed the channel.
    async fn recv(&mut self) -> Result<Option<String>>;

    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&mut self, data: String) -> Result<()> {
        (**self).send(data).await
    }

    async fn recv(&mut self) -> Result<Option<String>> {
        (**self).recv().await
    }

    async fn close(&mut self) -> Result<()> {
        (**self).close().await
    }
}

/// Opens transports to a fixed endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    fn endpoint(&self) -> String;

    async fn open(&self) -> Result<Box<dyn Transport>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportKind {
    /// SockJS framing over its WebSocket transport, what a SockJS server endpoint serves.
    #[serde(rename = "sockjs")]
    SockJs,
    /// STOMP directly over a WebSocket.
    #[serde(rename = "websocket")]
    WebSocket,
}

pub struct WsConnector {
    url: Url,
    kind: TransportKind,
}

impl WsConnector {
    pub fn new(url: Url, kind: TransportKind) -> Self {
        Self { url, kind }
    }

    /// The value for the STOMP `host` header.
    pub fn host(&self) -> String {
        self.url.host_str().unwrap_or("localhost").to_string()
    }
}

#[async_trait]
impl Connector for WsConnector {
    fn endpoint(&self) -> String {
        self.url.to_string()
    }

    async fn open(&self) -> Result<Box<dyn Transport>> {
        Ok(match self.kind {
            TransportKind::SockJs => Box::new(SockJsTransport::connect(&self.url).await?),
            TransportKind::WebSocket => Box::new(WebSocketTransport::connect(&self.url).await?),
        })
    }
}

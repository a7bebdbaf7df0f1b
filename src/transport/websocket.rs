use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use log::debug;
use reqwest::Url;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::Transport;

/// STOMP text carried directly in WebSocket text messages.
pub struct WebSocketTransport<S> {
    ws: WebSocketStream<S>,
}

impl WebSocketTransport<MaybeTlsStream<TcpStream>> {
    pub async fn connect(url: &Url) -> Result<Self> {
        debug!("Open websocket '{url}'");
        let (ws, resp) = connect_async(url.as_str())
            .await
            .with_context(|| format!("connect to websocket '{url}'"))?;
        debug!("Websocket handshake done, status {}", resp.status());
        Ok(Self { ws })
    }
}

#[async_trait]
impl<S> Transport for WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, data: String) -> Result<()> {
        self.ws
            .send(Message::Text(data))
            .await
            .context("write websocket message")
    }

    async fn recv(&mut self) -> Result<Option<String>> {
        loop {
            let msg = match self.ws.next().await {
                Some(Ok(msg)) => msg,
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                    return Ok(None)
                }
                Some(Err(err)) => return Err(err).context("read websocket message"),
            };

            match msg {
                Message::Text(text) => return Ok(Some(text)),
                Message::Binary(data) => {
                    let text = String::from_utf8(data).context("decode binary message as utf-8")?;
                    return Ok(Some(text));
                }
                Message::Close(frame) => {
                    debug!("Websocket closed by peer: {frame:?}");
                    return Ok(None);
                }
                // Pings are answered by tungstenite itself.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self.ws.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(err) => Err(err).context("close websocket"),
        }
    }
}

use std::collections::VecDeque;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::Url;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::MaybeTlsStream;

use super::websocket::WebSocketTransport;
use super::Transport;

const SESSION_ID_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum SockJsError {
    #[error("empty sockjs frame")]
    Empty,

    #[error("unknown sockjs frame type '{0}'")]
    UnknownType(char),

    #[error("invalid sockjs payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// One frame sent by a SockJS server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SockJsFrame {
    Open,
    Heartbeat,
    Messages(Vec<String>),
    Close { code: u16, reason: String },
}

impl SockJsFrame {
    pub fn parse(data: &str) -> Result<Self, SockJsError> {
        let mut chars = data.chars();
        let kind = chars.next().ok_or(SockJsError::Empty)?;
        let payload = chars.as_str();
        match kind {
            'o' => Ok(Self::Open),
            'h' => Ok(Self::Heartbeat),
            'a' => Ok(Self::Messages(serde_json::from_str(payload)?)),
            'm' => Ok(Self::Messages(vec![serde_json::from_str(payload)?])),
            'c' => {
                let (code, reason): (u16, String) = serde_json::from_str(payload)?;
                Ok(Self::Close { code, reason })
            }
            other => Err(SockJsError::UnknownType(other)),
        }
    }
}

/// Client messages go out as a JSON array of strings.
pub fn encode_messages(messages: &[String]) -> String {
    serde_json::Value::from(messages.to_vec()).to_string()
}

/// Build the websocket URL of a fresh SockJS session under `base`:
/// `<base>/<server>/<session>/websocket`.
pub fn session_url(base: &Url) -> Result<Url> {
    let mut rng = rand::thread_rng();
    let server = format!("{:03}", rng.gen_range(0..1000));
    let session: String = (&mut rng)
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();

    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("url '{base}' cannot be a base"))?
        .pop_if_empty()
        .extend([server.as_str(), session.as_str(), "websocket"]);
    Ok(url)
}

pub struct SockJsTransport<S> {
    inner: WebSocketTransport<S>,
    pending: VecDeque<String>,
    closed: bool,
}

impl SockJsTransport<MaybeTlsStream<TcpStream>> {
    pub async fn connect(base: &Url) -> Result<Self> {
        let url = session_url(base)?;
        let inner = WebSocketTransport::connect(&url).await?;
        Self::handshake(inner).await
    }
}

impl<S> SockJsTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wait for the open frame that starts every SockJS session.
    pub async fn handshake(mut inner: WebSocketTransport<S>) -> Result<Self> {
        let data = match inner.recv().await? {
            Some(data) => data,
            None => bail!("sockjs session closed before open frame"),
        };
        match SockJsFrame::parse(&data).context("parse sockjs open frame")? {
            SockJsFrame::Open => {}
            SockJsFrame::Close { code, reason } => {
                bail!("sockjs session rejected: {code} {reason}")
            }
            frame => bail!("expect sockjs open frame, found {frame:?}"),
        }
        debug!("SockJS session opened");

        Ok(Self {
            inner,
            pending: VecDeque::new(),
            closed: false,
        })
    }
}

#[async_trait]
impl<S> Transport for SockJsTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, data: String) -> Result<()> {
        self.inner.send(encode_messages(&[data])).await
    }

    async fn recv(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(message) = self.pending.pop_front() {
                return Ok(Some(message));
            }
            if self.closed {
                return Ok(None);
            }

            let data = match self.inner.recv().await? {
                Some(data) => data,
                None => return Ok(None),
            };
            match SockJsFrame::parse(&data).context("parse sockjs frame")? {
                SockJsFrame::Messages(messages) => self.pending.extend(messages),
                SockJsFrame::Heartbeat => debug!("SockJS heartbeat"),
                SockJsFrame::Open => debug!("Ignore repeated sockjs open frame"),
                SockJsFrame::Close { code, reason } => {
                    info!("SockJS session closed by server: {code} {reason}");
                    self.closed = true;
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.inner.close().await
    }
}

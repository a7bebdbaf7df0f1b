use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::{debug, warn};
use tokio::time::timeout;

use crate::transport::Transport;

use super::{Command, Frame, FrameDecoder};

const ACCEPT_VERSION: &str = "1.2,1.1,1.0";

/// A STOMP client session on top of a [`Transport`].
pub struct StompSession<T> {
    transport: T,
    decoder: FrameDecoder,
    version: String,
    next_subscription: u64,
}

impl<T: Transport> StompSession<T> {
    /// Send CONNECT and wait for the broker's CONNECTED. `headers` are added to the
    /// CONNECT frame as they are, this is how the bearer token reaches the broker.
    pub async fn connect(
        transport: T,
        host: &str,
        headers: Vec<(String, String)>,
        wait: Duration,
    ) -> Result<Self> {
        let mut session = Self {
            transport,
            decoder: FrameDecoder::new(),
            version: String::new(),
            next_subscription: 0,
        };

        let mut frame = Frame::new(Command::Connect)
            .header("accept-version", ACCEPT_VERSION)
            .header("host", host)
            .header("heart-beat", "0,0");
        frame.headers.extend(headers);
        session.send_frame(frame).await?;

        let reply = match timeout(wait, session.read_frame()).await {
            Ok(reply) => reply?,
            Err(_) => bail!(
                "no CONNECTED frame within {}",
                humantime::format_duration(wait)
            ),
        };
        let reply = match reply {
            Some(reply) => reply,
            None => bail!("connection closed before CONNECTED frame"),
        };
        match reply.command {
            Command::Connected => {}
            Command::Error => bail!("broker rejected connection: {}", error_message(&reply)),
            command => bail!("expect CONNECTED frame, found {command}"),
        }

        session.version = reply.get_header("version").unwrap_or("1.0").to_string();
        debug!("STOMP session established, version {}", session.version);
        Ok(session)
    }

    /// The protocol version the broker chose.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Subscribe with automatic acknowledgement, returning the subscription id.
    pub async fn subscribe(&mut self, destination: &str) -> Result<String> {
        let id = format!("sub-{}", self.next_subscription);
        self.next_subscription += 1;
        let frame = Frame::new(Command::Subscribe)
            .header("id", id.as_str())
            .header("destination", destination)
            .header("ack", "auto");
        self.send_frame(frame).await?;
        Ok(id)
    }

    /// Wait for the next MESSAGE frame. Returns `None` when the connection is closed; an
    /// ERROR frame from the broker ends the session with an error.
    pub async fn next_message(&mut self) -> Result<Option<Frame>> {
        loop {
            let frame = match self.read_frame().await? {
                Some(frame) => frame,
                None => return Ok(None),
            };
            match frame.command {
                Command::Message => return Ok(Some(frame)),
                Command::Error => bail!("broker error: {}", error_message(&frame)),
                Command::Receipt => debug!("Receipt {:?}", frame.get_header("receipt-id")),
                command => warn!("Ignore unexpected {command} frame from broker"),
            }
        }
    }

    /// Send DISCONNECT and close the transport.
    pub async fn disconnect(mut self) -> Result<()> {
        let sent = self.send_frame(Frame::new(Command::Disconnect)).await;
        let closed = self.transport.close().await;
        sent.context("send DISCONNECT")?;
        closed
    }

    async fn send_frame(&mut self, frame: Frame) -> Result<()> {
        debug!("Send frame: {frame}");
        self.transport.send(frame.encode()).await
    }

    async fn read_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some(frame) = self.decoder.next_frame().context("decode STOMP frame")? {
                debug!("Receive frame: {frame}");
                return Ok(Some(frame));
            }
            match self.transport.recv().await? {
                Some(chunk) => self.decoder.push(&chunk),
                None => return Ok(None),
            }
        }
    }
}

fn error_message(frame: &Frame) -> String {
    let message = frame.get_header("message").unwrap_or_default();
    match (message.is_empty(), frame.body.trim()) {
        (true, "") => "no details".to_string(),
        (true, body) => body.to_string(),
        (false, "") => message.to_string(),
        (false, body) => format!("{message}: {body}"),
    }
}

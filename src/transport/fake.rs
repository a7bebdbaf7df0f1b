use std::collections::VecDeque;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::client::fake::CallLog;
use crate::stomp::{Command, Frame};

use super::{Connector, Transport};

/// In-memory STOMP broker answering a single client.
pub struct FakeBroker {
    log: CallLog,
    /// Reply to CONNECT with an ERROR frame carrying this message.
    reject: Option<String>,
    /// Bodies published on every subscription.
    messages: Vec<String>,
    outbox: VecDeque<String>,
}

impl FakeBroker {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            reject: None,
            messages: Vec::new(),
            outbox: VecDeque::new(),
        }
    }

    pub fn rejecting(mut self, message: &str) -> Self {
        self.reject = Some(message.to_string());
        self
    }

    pub fn publishing(mut self, body: &str) -> Self {
        self.messages.push(body.to_string());
        self
    }
}

#[async_trait]
impl Transport for FakeBroker {
    async fn send(&mut self, data: String) -> Result<()> {
        let (frame, _) = Frame::parse(&data)?;
        match frame.command {
            Command::Connect => {
                let auth = frame.get_header("Authorization").unwrap_or_default();
                self.log.push(format!("connect:{auth}"));
                let reply = match &self.reject {
                    Some(message) => Frame::new(Command::Error)
                        .header("message", message.as_str())
                        .body("rejected"),
                    None => Frame::new(Command::Connected).header("version", "1.2"),
                };
                // Heart-beat EOLs and the frame arrive split across chunks.
                let encoded = reply.encode();
                let (head, tail) = encoded.split_at(encoded.len() / 2);
                self.outbox.push_back(format!("\n{head}"));
                self.outbox.push_back(tail.to_string());
            }
            Command::Subscribe => {
                let destination = frame.get_header("destination").unwrap_or_default();
                let id = frame.get_header("id").unwrap_or_default();
                self.log.push(format!("subscribe:{destination}"));
                for (idx, body) in self.messages.iter().enumerate() {
                    let message = Frame::new(Command::Message)
                        .header("destination", destination)
                        .header("subscription", id)
                        .header("message-id", format!("m-{idx}"))
                        .header("content-type", "application/json")
                        .body(body.as_str());
                    self.outbox.push_back(message.encode());
                }
            }
            Command::Disconnect => self.log.push("disconnect"),
            command => bail!("unexpected client frame {command}"),
        }
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<String>> {
        Ok(self.outbox.pop_front())
    }

    async fn close(&mut self) -> Result<()> {
        self.log.push("close");
        Ok(())
    }
}

/// Hands out one prepared broker per `open`.
pub struct FakeConnector {
    log: CallLog,
    make: Box<dyn Fn(CallLog) -> FakeBroker + Send + Sync>,
}

impl FakeConnector {
    pub fn new(log: CallLog, make: impl Fn(CallLog) -> FakeBroker + Send + Sync + 'static) -> Self {
        Self {
            log,
            make: Box::new(make),
        }
    }
}

#[async_trait]
impl Connector for FakeConnector {
    fn endpoint(&self) -> String {
        "memory://broker".to_string()
    }

    async fn open(&self) -> Result<Box<dyn Transport>> {
        self.log.push("open");
        Ok(Box::new((self.make)(self.log.clone())))
    }
}

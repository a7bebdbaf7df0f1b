use std::fmt;

use anyhow::{bail, Result};
use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The family of topics a client can follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ChatKind {
    /// A conversation between two users: `/topic/chat/<id>`.
    #[default]
    Chat,
    /// A support conversation: `/topic/support/<id>`.
    Support,
    /// The personal notification topic of a user: `/topic/user/<id>/main`.
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatTarget {
    pub kind: ChatKind,
    pub id: i64,
}

impl ChatTarget {
    pub fn new(kind: ChatKind, id: i64) -> Self {
        Self { kind, id }
    }

    pub fn chat(id: i64) -> Self {
        Self::new(ChatKind::Chat, id)
    }

    /// The STOMP destination to subscribe to.
    pub fn destination(&self) -> String {
        match self.kind {
            ChatKind::Chat => format!("/topic/chat/{}", self.id),
            ChatKind::Support => format!("/topic/support/{}", self.id),
            ChatKind::User => format!("/topic/user/{}/main", self.id),
        }
    }
}

/// Parse a chat id typed by the user. Ids are positive integers, anything else is rejected
/// instead of producing a bogus destination.
pub fn parse_chat_id(input: &str) -> Result<i64> {
    let input = input.trim();
    let id: i64 = match input.parse() {
        Ok(id) => id,
        Err(_) => bail!("invalid chat id '{input}', expect a number"),
    };
    if id <= 0 {
        bail!("invalid chat id {id}, expect a positive number");
    }
    Ok(id)
}

/// A chat message as published by the chat service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: i64,

    #[serde(default)]
    pub content_type: Option<String>,

    #[serde(default)]
    pub text: Option<String>,

    pub sender_id: i64,

    #[serde(default)]
    pub sent_time: Option<NaiveDateTime>,
}

/// Everything the chat service publishes on chat topics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ChatEvent {
    Message(ChatMessage),
    Updated {
        updated_message: i64,
        text: String,
    },
    Deleted {
        deleted_message: i64,
    },
    ChatCreated {
        created_chat: i64,
    },
    ChatDeleted {
        deleted_chat: i64,
    },
    StatusUpdated {
        updated_status: String,
        updater_id: i64,
    },
}

impl ChatEvent {
    /// Try to decode a message body. Bodies with an unknown shape yield `None` and should
    /// be shown verbatim.
    pub fn decode(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }
}

impl fmt::Display for ChatEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatEvent::Message(msg) => {
                if let Some(time) = msg.sent_time {
                    write!(f, "[{}] ", time.format("%Y-%m-%d %H:%M:%S"))?;
                }
                write!(f, "#{} (message {})", msg.sender_id, msg.id)?;
                match (&msg.text, &msg.content_type) {
                    (Some(text), _) => write!(f, ": {text}"),
                    (None, Some(content_type)) => write!(f, ": <{content_type}>"),
                    (None, None) => Ok(()),
                }
            }
            ChatEvent::Updated {
                updated_message,
                text,
            } => write!(f, "message {updated_message} edited: {text}"),
            ChatEvent::Deleted { deleted_message } => {
                write!(f, "message {deleted_message} deleted")
            }
            ChatEvent::ChatCreated { created_chat } => write!(f, "chat {created_chat} created"),
            ChatEvent::ChatDeleted { deleted_chat } => write!(f, "chat {deleted_chat} deleted"),
            ChatEvent::StatusUpdated {
                updated_status,
                updater_id,
            } => write!(f, "status changed to {updated_status} by #{updater_id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination() {
        assert_eq!(ChatTarget::chat(7).destination(), "/topic/chat/7");
        assert_eq!(
            ChatTarget::new(ChatKind::Support, 3).destination(),
            "/topic/support/3"
        );
        assert_eq!(
            ChatTarget::new(ChatKind::User, 12).destination(),
            "/topic/user/12/main"
        );
    }

    #[test]
    fn test_parse_chat_id() {
        assert_eq!(parse_chat_id(" 42\n").unwrap(), 42);
        assert!(parse_chat_id("abc").is_err());
        assert!(parse_chat_id("").is_err());
        assert!(parse_chat_id("0").is_err());
        assert!(parse_chat_id("-5").is_err());
        assert!(parse_chat_id("1.5").is_err());
    }

    #[test]
    fn test_decode_message() {
        let body = concat!(
            r#"{"id":5,"content_type":"TEXT","text":"hello","sender_id":2,"#,
            r#""sent_time":"2024-03-01T12:30:15.123"}"#
        );
        let event = ChatEvent::decode(body).unwrap();
        match &event {
            ChatEvent::Message(msg) => {
                assert_eq!(msg.id, 5);
                assert_eq!(msg.sender_id, 2);
                assert_eq!(msg.text.as_deref(), Some("hello"));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(
            event.to_string(),
            "[2024-03-01 12:30:15] #2 (message 5): hello"
        );
    }

    #[test]
    fn test_decode_notifications() {
        assert_eq!(
            ChatEvent::decode(r#"{"updated_message":3,"text":"fixed"}"#),
            Some(ChatEvent::Updated {
                updated_message: 3,
                text: String::from("fixed"),
            })
        );
        assert_eq!(
            ChatEvent::decode(r#"{"deleted_message":9}"#),
            Some(ChatEvent::Deleted { deleted_message: 9 })
        );
        assert_eq!(
            ChatEvent::decode(r#"{"deleted_chat":1}"#)
                .unwrap()
                .to_string(),
            "chat 1 deleted"
        );
    }

    #[test]
    fn test_decode_unknown() {
        assert_eq!(ChatEvent::decode("plain text"), None);
        assert_eq!(ChatEvent::decode(r#"{"something":"else"}"#), None);
    }
}

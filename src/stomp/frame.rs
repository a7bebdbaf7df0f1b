use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    // Client frames
    Connect,
    Stomp,
    Send,
    Subscribe,
    Unsubscribe,
    Ack,
    Nack,
    Begin,
    Commit,
    Abort,
    Disconnect,

    // Server frames
    Connected,
    Message,
    Receipt,
    Error,
}

impl Command {
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Connect => "CONNECT",
            Command::Stomp => "STOMP",
            Command::Send => "SEND",
            Command::Subscribe => "SUBSCRIBE",
            Command::Unsubscribe => "UNSUBSCRIBE",
            Command::Ack => "ACK",
            Command::Nack => "NACK",
            Command::Begin => "BEGIN",
            Command::Commit => "COMMIT",
            Command::Abort => "ABORT",
            Command::Disconnect => "DISCONNECT",
            Command::Connected => "CONNECTED",
            Command::Message => "MESSAGE",
            Command::Receipt => "RECEIPT",
            Command::Error => "ERROR",
        }
    }

    /// CONNECT and CONNECTED headers are sent verbatim, for compatibility with STOMP 1.0
    /// peers.
    fn escapes_headers(self) -> bool {
        !matches!(self, Command::Connect | Command::Connected)
    }
}

impl FromStr for Command {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "CONNECT" => Command::Connect,
            "STOMP" => Command::Stomp,
            "SEND" => Command::Send,
            "SUBSCRIBE" => Command::Subscribe,
            "UNSUBSCRIBE" => Command::Unsubscribe,
            "ACK" => Command::Ack,
            "NACK" => Command::Nack,
            "BEGIN" => Command::Begin,
            "COMMIT" => Command::Commit,
            "ABORT" => Command::Abort,
            "DISCONNECT" => Command::Disconnect,
            "CONNECTED" => Command::Connected,
            "MESSAGE" => Command::Message,
            "RECEIPT" => Command::Receipt,
            "ERROR" => Command::Error,
            _ => return Err(FrameError::UnknownCommand(s.to_string())),
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("not enough data is available to parse a frame")]
    Incomplete,

    #[error("unknown frame command '{0}'")]
    UnknownCommand(String),

    #[error("invalid frame protocol: {0}")]
    Protocol(&'static str),
}

/// A STOMP frame. Bodies are text, which is all a WebSocket text transport can carry.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub command: Command,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Look up a header. When a header is repeated, the first occurrence wins.
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn encode(&self) -> String {
        let escape = self.command.escapes_headers();
        let mut out = String::with_capacity(64 + self.body.len());
        out.push_str(self.command.as_str());
        out.push('\n');
        for (name, value) in &self.headers {
            if escape {
                out.push_str(&escape_header(name));
                out.push(':');
                out.push_str(&escape_header(value));
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Parse one frame from the start of `src`, returning it with the number of bytes it
    /// occupied. Leading heart-beat end-of-lines must already be stripped.
    pub fn parse(src: &str) -> Result<(Frame, usize), FrameError> {
        let mut pos = 0;

        let command_line = next_line(src, &mut pos)?;
        let command: Command = command_line.parse()?;
        let escape = command.escapes_headers();

        let mut headers = Vec::new();
        loop {
            let line = next_line(src, &mut pos)?;
            if line.is_empty() {
                break;
            }
            let (name, value) = match line.split_once(':') {
                Some(pair) => pair,
                None => return Err(FrameError::Protocol("header without ':' separator")),
            };
            if escape {
                headers.push((unescape_header(name)?, unescape_header(value)?));
            } else {
                headers.push((name.to_string(), value.to_string()));
            }
        }

        let content_length = headers
            .iter()
            .find(|(name, _)| name == "content-length")
            .map(|(_, value)| value.trim().parse::<usize>())
            .transpose()
            .map_err(|_| FrameError::Protocol("invalid content-length header"))?;

        let rest = &src[pos..];
        let body_len = match content_length {
            Some(len) => {
                let Some(total) = len.checked_add(1) else {
                    return Err(FrameError::Protocol("content-length out of range"));
                };
                if rest.len() < total {
                    return Err(FrameError::Incomplete);
                }
                match rest.as_bytes().get(len) {
                    Some(0) => len,
                    Some(_) => {
                        return Err(FrameError::Protocol("frame body is not NULL terminated"))
                    }
                    None => return Err(FrameError::Incomplete),
                }
            }
            None => match rest.find('\0') {
                Some(len) => len,
                None => return Err(FrameError::Incomplete),
            },
        };

        let body = match rest.get(..body_len) {
            Some(body) => body.to_string(),
            None => return Err(FrameError::Protocol("content-length splits a character")),
        };

        let frame = Frame {
            command,
            headers,
            body,
        };
        Ok((frame, pos + body_len + 1))
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command)?;
        for (name, value) in &self.headers {
            if name.eq_ignore_ascii_case("authorization") || name == "passcode" {
                write!(f, " {name}=<hidden>")?;
            } else {
                write!(f, " {name}={value}")?;
            }
        }
        Ok(())
    }
}

/// Read a line terminated by LF or CRLF, advancing `pos` past the terminator.
fn next_line<'a>(src: &'a str, pos: &mut usize) -> Result<&'a str, FrameError> {
    let rest = &src[*pos..];
    let end = match rest.find('\n') {
        Some(end) => end,
        None => return Err(FrameError::Incomplete),
    };
    *pos += end + 1;
    let line = &rest[..end];
    Ok(line.strip_suffix('\r').unwrap_or(line))
}

fn escape_header(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            ':' => out.push_str("\\c"),
            c => out.push(c),
        }
    }
    out
}

fn unescape_header(s: &str) -> Result<String, FrameError> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('c') => out.push(':'),
            _ => return Err(FrameError::Protocol("undefined escape sequence in header")),
        }
    }
    Ok(out)
}

/// Reassembles frames from text chunks as they arrive from the transport. A chunk may hold
/// several frames, a partial frame, or heart-beat end-of-lines.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, data: &str) {
        self.buffer.push_str(data);
    }

    pub fn next_frame(&mut self) -> Result<Option<Frame>, FrameError> {
        let remaining = self.buffer.trim_start_matches(&['\r', '\n'][..]).len();
        let heartbeats = self.buffer.len() - remaining;
        if heartbeats > 0 {
            self.buffer.drain(..heartbeats);
        }
        if self.buffer.is_empty() {
            return Ok(None);
        }

        match Frame::parse(&self.buffer) {
            Ok((frame, len)) => {
                // Discard the parsed frame from the buffer.
                self.buffer.drain(..len);
                Ok(Some(frame))
            }
            Err(FrameError::Incomplete) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

use anyhow::{Context, Result};
use console::Term;

use crate::types::chat::parse_chat_id;
use crate::types::token::{Credentials, IdentifierKind};

/// Supplies credentials whenever a full login is needed.
pub trait CredentialProvider: Send + Sync {
    fn credentials(&self) -> Result<Credentials>;
}

/// Asks the user on the terminal. The password is read without echo.
pub struct TerminalPrompt {
    term: Term,
    identifier_label: &'static str,
}

impl TerminalPrompt {
    pub fn new(kind: IdentifierKind) -> Self {
        let identifier_label = match kind {
            IdentifierKind::Email => "Email",
            IdentifierKind::Username => "Username",
        };
        Self {
            term: Term::stderr(),
            identifier_label,
        }
    }

    /// Ask for the id of the chat to follow.
    pub fn chat_id(&self) -> Result<i64> {
        self.term.write_str("Chat id: ")?;
        let line = self.term.read_line().context("read chat id")?;
        parse_chat_id(&line)
    }
}

impl CredentialProvider for TerminalPrompt {
    fn credentials(&self) -> Result<Credentials> {
        self.term
            .write_str(&format!("{}: ", self.identifier_label))?;
        let identifier = self.term.read_line().context("read identifier")?;

        self.term.write_str("Password: ")?;
        let password = self.term.read_secure_line().context("read password")?;

        Ok(Credentials::new(identifier.trim(), password))
    }
}

/// Credentials taken from the configuration, for unattended use.
pub struct StaticCredentials {
    credentials: Credentials,
}

impl StaticCredentials {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

impl CredentialProvider for StaticCredentials {
    fn credentials(&self) -> Result<Credentials> {
        Ok(self.credentials.clone())
    }
}

impl<P: CredentialProvider + ?Sized> CredentialProvider for Box<P> {
    fn credentials(&self) -> Result<Credentials> {
        (**self).credentials()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_credentials() {
        let provider: Box<dyn CredentialProvider> =
            Box::new(StaticCredentials::new(Credentials::new("bob", "pw")));
        let creds = provider.credentials().unwrap();
        assert_eq!(creds.identifier, "bob");
        assert_eq!(creds.password, "pw");
    }
}

use anyhow::Result;
use async_trait::async_trait;
use chatwatch::client::token::inspect_token;
use chatwatch::display::display_json;
use chrono::{DateTime, Local, Utc};
use clap::Args;
use serde::Serialize;

use super::{ConfigArgs, RunCommand};

/// Show the saved token and, when it is a JWT, its subject and expiry. The token itself
/// is never printed.
#[derive(Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Debug, Serialize)]
struct TokenStatus {
    strategy: String,
    server: String,
    token_path: String,
    token_key: &'static str,
    saved: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    issued_at: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    expired: Option<bool>,
}

#[async_trait]
impl RunCommand for StatusArgs {
    async fn run(&self) -> Result<()> {
        let factory = self.config.load_factory()?;
        let cfg = factory.config();
        let tokens = factory.build_token_manager();

        let token = tokens.stored_token()?;
        let claims = token.as_deref().and_then(inspect_token);

        let mut status = TokenStatus {
            strategy: tokens.strategy().to_string(),
            server: cfg.server.clone(),
            token_path: cfg.token_path.clone(),
            token_key: tokens.strategy().store_key(),
            saved: token.is_some(),
            subject: None,
            issued_at: None,
            expires_at: None,
            expired: None,
        };

        if let Some(claims) = claims {
            status.subject = claims.sub;
            status.issued_at = claims.iat.and_then(format_timestamp);
            status.expires_at = claims.exp.and_then(format_timestamp);
            let now = Utc::now().timestamp() as u64;
            status.expired = claims.exp.map(|exp| exp <= now);
        }

        display_json(status)
    }
}

fn format_timestamp(secs: u64) -> Option<String> {
    let time = DateTime::<Utc>::from_timestamp(i64::try_from(secs).ok()?, 0)?;
    Some(time.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
}

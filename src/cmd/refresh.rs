use anyhow::{bail, Result};
use async_trait::async_trait;
use chatwatch::types::token::TokenStrategy;
use clap::Args;

use super::{ConfigArgs, RunCommand};

/// Exchange the saved refresh token for a new access token. The refresh token is rotated.
/// Only available with the `pair` token strategy.
#[derive(Args)]
pub struct RefreshArgs {
    /// Print the new access token to stdout.
    #[arg(long)]
    pub show: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[async_trait]
impl RunCommand for RefreshArgs {
    async fn run(&self) -> Result<()> {
        let factory = self.config.load_factory()?;
        let tokens = factory.build_token_manager();
        if tokens.strategy() != TokenStrategy::Pair {
            bail!("refresh is only supported with the 'pair' token strategy");
        }

        let refresh_token = match tokens.stored_token()? {
            Some(token) => token,
            None => bail!("no refresh token saved, please login first"),
        };

        let access_token = match tokens.refresh_access_token(&refresh_token).await? {
            Some(token) => token,
            None => bail!("refresh failed and login failed"),
        };

        if self.show {
            println!("{access_token}");
        } else {
            println!("Access token refreshed");
        }
        Ok(())
    }
}

use anyhow::Result;
use async_trait::async_trait;
use clap::Args;

use super::{ConfigArgs, RunCommand};

/// Revoke and forget the saved token.
#[derive(Args)]
pub struct LogoutArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[async_trait]
impl RunCommand for LogoutArgs {
    async fn run(&self) -> Result<()> {
        let factory = self.config.load_factory()?;
        let tokens = factory.build_token_manager();

        if tokens.logout().await? {
            println!("Logged out");
        } else {
            println!("Not logged in");
        }
        Ok(())
    }
}

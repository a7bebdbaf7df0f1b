use anyhow::{bail, Result};
use async_trait::async_trait;
use clap::Args;

use super::{ConfigArgs, RunCommand};

/// Log in with fresh credentials and save the issued token, replacing any saved one.
#[derive(Args)]
pub struct LoginArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[async_trait]
impl RunCommand for LoginArgs {
    async fn run(&self) -> Result<()> {
        let factory = self.config.load_factory()?;
        let tokens = factory.build_token_manager();

        match tokens.login().await? {
            Some(_) => {
                println!("Login success");
                Ok(())
            }
            None => bail!("login failed"),
        }
    }
}

use anyhow::Result;
use async_trait::async_trait;
use chatwatch::client::config::ClientConfig;
use chatwatch::config::CommonConfig;
use chatwatch::display::display_json;
use clap::Args;

use super::{ConfigArgs, RunCommand};

/// Display the client configuration in use, with defaults filled in, as JSON.
#[derive(Args)]
pub struct ShowConfigArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[async_trait]
impl RunCommand for ShowConfigArgs {
    async fn run(&self) -> Result<()> {
        let ps = self.config.build_path_set()?;
        let mut cfg = ps.load_config("client", ClientConfig::default)?;
        if !cfg.password.is_empty() {
            cfg.password = String::from("******");
        }
        display_json(cfg)
    }
}

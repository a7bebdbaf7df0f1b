mod config;
mod connect;
mod login;
mod logout;
mod refresh;
mod status;

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use chatwatch::client::factory::ClientFactory;
use chatwatch::config::PathSet;
use chatwatch::logs;
use clap::{Args, Parser, Subcommand};
use log::warn;

#[async_trait]
pub trait RunCommand {
    async fn run(&self) -> Result<()>;
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// The directory holding `client.toml`. Defaults to `$CHATWATCH_CONFIG`, then
    /// `~/.config/chatwatch`.
    #[arg(long)]
    pub config_path: Option<PathBuf>,

    /// The directory for the token file. Defaults to `$CHATWATCH_DATA`, then
    /// `~/.local/share/chatwatch`.
    #[arg(long)]
    pub data_path: Option<PathBuf>,

    /// Override the log level of the config: error, warn, info or debug.
    #[arg(long)]
    pub log_level: Option<String>,
}

impl ConfigArgs {
    pub fn build_path_set(&self) -> Result<PathSet> {
        PathSet::new(self.config_path.clone(), self.data_path.clone())
    }

    /// Load the client config and install the logger at the configured level.
    pub fn load_factory(&self) -> Result<ClientFactory> {
        let ps = self.build_path_set()?;
        let config_exists = ps.config_file("client").exists();
        let factory = ClientFactory::load(&ps)?;

        let level = match self.log_level {
            Some(ref level) => level.as_str(),
            None => factory.config().log_level.as_str(),
        };
        logs::init(level)?;
        if !config_exists {
            // The loader warned before the logger was installed.
            warn!("Config file for client not found, using defaults");
        }

        Ok(factory)
    }
}

#[derive(Parser)]
#[command(author, about, version)]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Config(config::ShowConfigArgs),
    Connect(connect::ConnectArgs),
    Login(login::LoginArgs),
    Logout(logout::LogoutArgs),
    Refresh(refresh::RefreshArgs),
    Status(status::StatusArgs),
}

#[async_trait]
impl RunCommand for App {
    async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Config(args) => args.run().await,
            Commands::Connect(args) => args.run().await,
            Commands::Login(args) => args.run().await,
            Commands::Logout(args) => args.run().await,
            Commands::Refresh(args) => args.run().await,
            Commands::Status(args) => args.run().await,
        }
    }
}

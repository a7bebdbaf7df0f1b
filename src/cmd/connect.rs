use anyhow::Result;
use async_trait::async_trait;
use chatwatch::display::display_delivery;
use chatwatch::types::chat::{parse_chat_id, ChatKind, ChatTarget};
use clap::Args;
use log::{info, warn};
use tokio::signal;

use super::{ConfigArgs, RunCommand};

/// Follow a chat topic and print what is published on it. A token is obtained first,
/// by refreshing or logging in as the token strategy requires, then the socket is opened.
#[derive(Args)]
pub struct ConnectArgs {
    /// The chat to follow. Asked on the terminal when omitted.
    pub chat_id: Option<String>,

    /// The kind of topic to follow.
    #[arg(short, long, value_enum, default_value_t = ChatKind::Chat)]
    pub kind: ChatKind,

    /// Disconnect after receiving this many messages.
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u64).range(1..))]
    pub count: Option<u64>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[async_trait]
impl RunCommand for ConnectArgs {
    async fn run(&self) -> Result<()> {
        let factory = self.config.load_factory()?;

        let chat_id = self.chat_id.as_deref().map(parse_chat_id).transpose()?;

        let chats = factory.build_chat_connector()?;
        let token = chats.tokens().acquire_token().await?;

        let id = match chat_id {
            Some(id) => id,
            None => factory.build_prompt().chat_id()?,
        };
        let target = ChatTarget::new(self.kind, id);
        let mut session = chats.open_session(&token, target).await?;
        info!("Waiting for messages, press Ctrl-C to stop");

        let mut received: u64 = 0;
        loop {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("Interrupted");
                    break;
                }
                delivery = session.next_delivery() => {
                    let delivery = match delivery? {
                        Some(delivery) => delivery,
                        None => {
                            warn!("Connection closed by server");
                            return Ok(());
                        }
                    };
                    display_delivery(&delivery);

                    received += 1;
                    if self.count.is_some_and(|count| received >= count) {
                        break;
                    }
                }
            }
        }

        session.disconnect().await
    }
}

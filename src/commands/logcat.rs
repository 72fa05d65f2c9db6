use crate::commands::{CommandContext, SubCommand};
use adbwire::Result;
use async_trait::async_trait;
use log::*;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

pub struct LogcatCommand;

#[derive(Debug, Clone, clap::Args)]
pub struct LogcatArgs {
    /// Append to this file instead of printing
    #[clap(short = 'f', long = "file")]
    pub file: Option<PathBuf>,

    /// Clear the log buffer and exit
    #[clap(short = 'c', long = "clear")]
    pub clear: bool,
}

impl LogcatCommand {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SubCommand for LogcatCommand {
    type Args = LogcatArgs;

    async fn run(&self, ctx: &CommandContext, args: Self::Args) -> Result<()> {
        let device = ctx.require_device().await?;
        if args.clear {
            return device.logcat_clear().await;
        }

        let token = CancellationToken::new();
        let on_interrupt = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("interrupted, stopping logcat");
                on_interrupt.cancel();
            }
        });

        let copied = match &args.file {
            Some(path) => device.logcat_to_file(path, token).await?,
            None => device.logcat(&mut tokio::io::stdout(), token).await?,
        };
        debug!("logcat copied {} bytes", copied);
        Ok(())
    }
}

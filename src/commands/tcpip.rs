use crate::commands::{CommandContext, SubCommand};
use crate::output::OutputFormatter;
use adbwire::device::ADB_DAEMON_PORT;
use adbwire::Result;
use async_trait::async_trait;

pub struct TcpipCommand;

#[derive(Debug, Clone, clap::Args)]
pub struct TcpipArgs {
    /// Port for adbd to listen on
    #[clap(default_value_t = ADB_DAEMON_PORT)]
    pub port: u16,
}

impl TcpipCommand {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SubCommand for TcpipCommand {
    type Args = TcpipArgs;

    async fn run(&self, ctx: &CommandContext, args: Self::Args) -> Result<()> {
        let device = ctx.require_device().await?;
        device.enable_adb_over_tcp(args.port).await?;
        OutputFormatter::new()
            .with_quiet(ctx.quiet)
            .success(&format!("restarting {} in TCP mode port: {}", device.serial(), args.port));
        Ok(())
    }
}

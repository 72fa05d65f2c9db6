use crate::commands::{CommandContext, SubCommand};
use crate::output::OutputFormatter;
use adbwire::Result;
use async_trait::async_trait;

pub struct DevicesCommand;

#[derive(Debug, Clone, Default, clap::Args)]
pub struct DevicesArgs {
    /// Only print serials
    #[clap(long, short = 'b')]
    pub brief: bool,
}

impl DevicesCommand {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SubCommand for DevicesCommand {
    type Args = DevicesArgs;

    async fn run(&self, ctx: &CommandContext, args: Self::Args) -> Result<()> {
        if args.brief {
            for serial in ctx.client.device_serials().await? {
                println!("{}", serial);
            }
            return Ok(());
        }

        let devices = ctx.client.device_list().await?;
        OutputFormatter::new()
            .with_quiet(ctx.quiet)
            .list(ctx.output, &devices)
    }
}

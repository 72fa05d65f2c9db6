use crate::commands::{CommandContext, SubCommand};
use crate::output::OutputFormatter;
use adbwire::{AdbError, ForwardOptions, Port, Result};
use async_trait::async_trait;

pub struct ForwardCommand;

#[derive(Debug, Clone, clap::Args)]
pub struct ForwardArgs {
    /// Local endpoint, e.g. tcp:8080
    pub local: Option<String>,

    /// Device endpoint, e.g. tcp:80 or localabstract:name
    pub remote: Option<String>,

    /// List forwards for every device
    #[clap(long, short = 'l', conflicts_with_all = ["local", "remote"])]
    pub list: bool,

    /// Fail if the local endpoint is already forwarded
    #[clap(long)]
    pub no_rebind: bool,

    /// Remove the forward on LOCAL
    #[clap(long, requires = "local", conflicts_with = "remote")]
    pub remove: bool,

    /// Remove every forward
    #[clap(long, conflicts_with_all = ["local", "remote"])]
    pub remove_all: bool,

    /// Work on reverse forwards (device to host) instead
    #[clap(long)]
    pub reverse: bool,
}

impl ForwardCommand {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SubCommand for ForwardCommand {
    type Args = ForwardArgs;

    async fn run(&self, ctx: &CommandContext, args: Self::Args) -> Result<()> {
        let formatter = OutputFormatter::new().with_quiet(ctx.quiet);
        let opts = ForwardOptions {
            no_rebind: args.no_rebind,
        };

        if args.list {
            let forwards = if args.reverse {
                ctx.require_device().await?.reverse_list().await?
            } else {
                ctx.client.forward_list().await?
            };
            return formatter.list(ctx.output, &forwards);
        }

        if args.remove_all {
            return if args.reverse {
                ctx.require_device().await?.reverse_kill_all().await
            } else {
                ctx.client.forward_kill_all().await
            };
        }

        let local = args
            .local
            .map(Port::from)
            .ok_or_else(|| AdbError::InvalidArgument("missing LOCAL endpoint".to_string()))?;
        let device = ctx.require_device().await?;

        if args.remove {
            return if args.reverse {
                device.reverse_kill(&local).await
            } else {
                device.forward_kill(&local).await
            };
        }

        let remote = args
            .remote
            .map(Port::from)
            .ok_or_else(|| AdbError::InvalidArgument("missing REMOTE endpoint".to_string()))?;
        if args.reverse {
            // for reverse the first endpoint lives on the device
            device.reverse(&local, &remote, opts).await?;
        } else {
            device.forward(&local, &remote, opts).await?;
        }
        formatter.success(&format!("{} -> {}", local, remote));
        Ok(())
    }
}

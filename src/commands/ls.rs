use crate::commands::{CommandContext, SubCommand};
use crate::output::OutputFormatter;
use adbwire::{DirectoryEntry, Result};
use async_trait::async_trait;

pub struct LsCommand;

#[derive(Debug, Clone, clap::Args)]
pub struct LsArgs {
    /// Remote directory
    #[clap(default_value = "/sdcard")]
    pub path: String,

    /// Include `.` and `..`
    #[clap(long, short = 'a')]
    pub all: bool,
}

impl LsCommand {
    pub fn new() -> Self {
        Self
    }
}

/// Drop the self/parent entries unless asked for, directories first.
pub(crate) fn arrange(mut entries: Vec<DirectoryEntry>, all: bool) -> Vec<DirectoryEntry> {
    if !all {
        entries.retain(|e| e.name != "." && e.name != "..");
    }
    entries.sort_by(|a, b| b.is_dir().cmp(&a.is_dir()).then_with(|| a.name.cmp(&b.name)));
    entries
}

#[async_trait]
impl SubCommand for LsCommand {
    type Args = LsArgs;

    async fn run(&self, ctx: &CommandContext, args: Self::Args) -> Result<()> {
        let device = ctx.require_device().await?;
        let entries = arrange(device.list(&args.path).await?, args.all);

        OutputFormatter::new()
            .with_quiet(ctx.quiet)
            .list(ctx.output, &entries)
    }
}

use crate::commands::{CommandContext, SubCommand};
use adbwire::{AdbError, Result};
use async_trait::async_trait;
use log::*;
use tokio::io::AsyncWriteExt;

pub struct ShellCommand;

#[derive(Debug, Clone, clap::Args)]
pub struct ShellArgs {
    /// Command to execute
    #[clap(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,

    /// Collect the whole output before printing instead of streaming it
    #[clap(long)]
    pub buffered: bool,
}

impl ShellCommand {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SubCommand for ShellCommand {
    type Args = ShellArgs;

    async fn run(&self, ctx: &CommandContext, args: Self::Args) -> Result<()> {
        let (cmd, rest) = args
            .command
            .split_first()
            .ok_or_else(|| AdbError::InvalidArgument("missing command".to_string()))?;
        let rest: Vec<&str> = rest.iter().map(String::as_str).collect();
        let device = ctx.require_device().await?;

        if args.buffered {
            let output = device.run_shell_command(cmd, &rest).await?;
            print!("{}", output);
            return Ok(());
        }

        let mut shell = device.run_shell_command_async(cmd, &rest).await?;
        let mut stdout = tokio::io::stdout();

        tokio::select! {
            copied = tokio::io::copy(&mut shell, &mut stdout) => {
                copied?;
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted, stopping remote command");
            }
        }
        shell.close().await?;
        stdout.flush().await?;

        match shell.exit_status() {
            Some(0) | None => Ok(()),
            Some(code) => {
                debug!("remote command exited with {}", code);
                std::process::exit(i32::from(code));
            }
        }
    }
}

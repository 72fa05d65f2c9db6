use crate::cli::OutputType;
use crate::commands::{CommandContext, SubCommand};
use crate::output::OutputFormatter;
use adbwire::Result;
use async_trait::async_trait;

pub struct VersionCommand;

impl VersionCommand {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SubCommand for VersionCommand {
    type Args = ();

    async fn run(&self, ctx: &CommandContext, _args: ()) -> Result<()> {
        let version = ctx.client.server_version().await?;
        match ctx.output {
            OutputType::Json => OutputFormatter::new().json(&serde_json::json!({ "version": version })),
            _ => {
                println!("Android Debug Bridge version 1.0.{}", version);
                Ok(())
            }
        }
    }
}

use crate::commands::{CommandContext, SubCommand};
use crate::output::OutputFormatter;
use crate::progress::ProgressFactory;
use adbwire::{AdbError, PushOptions, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::File;

pub struct PushCommand;

#[derive(Debug, Clone, clap::Args)]
pub struct PushArgs {
    /// Local file to push
    pub src: PathBuf,

    /// Remote destination; a trailing `/` keeps the local file name
    #[clap(default_value = "/sdcard/")]
    pub dst: String,

    /// Permission bits for the remote file, in octal
    #[clap(long, short = 'm', default_value = "664", value_parser = parse_mode)]
    pub mode: u32,
}

impl PushCommand {
    pub fn new() -> Self {
        Self
    }
}

fn parse_mode(s: &str) -> std::result::Result<u32, String> {
    u32::from_str_radix(s.trim_start_matches("0o"), 8)
        .map_err(|_| format!("invalid octal mode: {}", s))
}

/// Remote path for `src`: a directory destination keeps the local name.
pub(crate) fn remote_target(src: &Path, dst: &str) -> Result<String> {
    if !dst.ends_with('/') {
        return Ok(dst.to_string());
    }
    let name = src
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AdbError::InvalidArgument(format!("no file name in {}", src.display())))?;
    Ok(format!("{}{}", dst, name))
}

#[async_trait]
impl SubCommand for PushCommand {
    type Args = PushArgs;

    async fn run(&self, ctx: &CommandContext, args: Self::Args) -> Result<()> {
        let device = ctx.require_device().await?;
        let remote = remote_target(&args.src, &args.dst)?;

        let file = File::open(&args.src).await?;
        let metadata = file.metadata().await?;
        if metadata.is_dir() {
            return Err(AdbError::InvalidArgument(format!(
                "{} is a directory",
                args.src.display()
            )));
        }

        let mut opts = PushOptions::default().with_mode(args.mode);
        if let Ok(modified) = metadata.modified() {
            opts = opts.with_mtime(modified);
        }

        let progress = ProgressFactory::new(ctx.should_show_progress())
            .file_transfer(&remote, Some(metadata.len()));
        let mut source = progress.bar().clone().wrap_async_read(file);

        let sent = device.push(&mut source, &remote, &opts).await?;
        progress.finish("done");

        OutputFormatter::new()
            .with_quiet(!ctx.should_show_progress())
            .success(&format!("{}: 1 file pushed, {} bytes", args.src.display(), sent));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_mode, remote_target};
    use std::path::Path;

    #[test]
    fn test_remote_target() {
        let src = Path::new("/tmp/build/app.apk");
        assert_eq!(remote_target(src, "/data/local/tmp/").unwrap(), "/data/local/tmp/app.apk");
        assert_eq!(remote_target(src, "/sdcard/x.apk").unwrap(), "/sdcard/x.apk");
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("664"), Ok(0o664));
        assert_eq!(parse_mode("0o755"), Ok(0o755));
        assert!(parse_mode("9").is_err());
    }
}

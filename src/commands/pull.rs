use crate::commands::{CommandContext, SubCommand};
use crate::output::OutputFormatter;
use crate::progress::ProgressFactory;
use adbwire::{AdbError, Result};
use async_trait::async_trait;
use log::*;
use std::path::{Path, PathBuf};
use tokio::fs::File;

pub struct PullCommand;

#[derive(Debug, Clone, clap::Args)]
pub struct PullArgs {
    /// Remote file on device to pull
    pub src: String,

    /// Local destination path
    #[clap(default_value = ".")]
    pub dst: PathBuf,
}

impl PullCommand {
    pub fn new() -> Self {
        Self
    }
}

/// Local path for `src`: a directory destination keeps the remote name.
pub(crate) fn local_target(src: &str, dst: &Path) -> Result<PathBuf> {
    if !dst.is_dir() {
        return Ok(dst.to_path_buf());
    }
    let name = src
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AdbError::InvalidArgument(format!("no file name in {}", src)))?;
    Ok(dst.join(name))
}

#[async_trait]
impl SubCommand for PullCommand {
    type Args = PullArgs;

    async fn run(&self, ctx: &CommandContext, args: Self::Args) -> Result<()> {
        let device = ctx.require_device().await?;
        let local = local_target(&args.src, &args.dst)?;

        let size = match device.stat(&args.src).await {
            Ok(entry) => Some(u64::from(entry.size)),
            Err(e) if e.is_remote_rejection() => return Err(e),
            Err(e) => {
                debug!("stat {} failed, pulling without size: {}", args.src, e);
                None
            }
        };

        let progress = ProgressFactory::new(ctx.should_show_progress()).file_transfer(&args.src, size);
        let file = File::create(&local).await?;
        let mut dest = progress.bar().clone().wrap_async_write(file);

        let result = device.pull(&args.src, &mut dest).await;
        progress.finish("done");
        let received = match result {
            Ok(n) => n,
            Err(e) => {
                drop(dest);
                if let Err(rm) = tokio::fs::remove_file(&local).await {
                    debug!("could not remove partial {}: {}", local.display(), rm);
                }
                return Err(e);
            }
        };

        OutputFormatter::new()
            .with_quiet(!ctx.should_show_progress())
            .success(&format!("{}: 1 file pulled, {} bytes", args.src, received));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::local_target;

    #[test]
    fn test_local_target() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            local_target("/sdcard/DCIM/a.jpg", dir.path()).unwrap(),
            dir.path().join("a.jpg")
        );

        let explicit = dir.path().join("b.jpg");
        assert_eq!(local_target("/sdcard/DCIM/a.jpg", &explicit).unwrap(), explicit);

        assert!(local_target("/", dir.path()).is_err());
    }
}

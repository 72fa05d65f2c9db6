use crate::cli::OutputType;
use adbwire::{AdbError, Client, Device, DeviceState, Result};
use async_trait::async_trait;

pub mod devices;
pub mod forward;
pub mod logcat;
pub mod ls;
pub mod pull;
pub mod push;
pub mod shell;
pub mod tcpip;
pub mod version;


/// Base trait for all subcommands
#[async_trait]
pub trait SubCommand {
    type Args: Send;

    async fn run(&self, ctx: &CommandContext, args: Self::Args) -> Result<()>;
}

/// Shared context for all commands
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub client: Client,
    pub serial: Option<String>,
    pub output: OutputType,
    pub quiet: bool,
}

impl CommandContext {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            serial: None,
            output: OutputType::Table,
            quiet: false,
        }
    }

    pub fn with_serial(mut self, serial: Option<String>) -> Self {
        self.serial = serial;
        self
    }

    pub fn with_output(mut self, output: OutputType) -> Self {
        self.output = output;
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Progress bars and status lines are noise in quiet or JSON mode.
    pub fn should_show_progress(&self) -> bool {
        !self.quiet && self.output != OutputType::Json
    }

    /// The device named by `--serial`, or the only online device.
    pub async fn require_device(&self) -> Result<Device> {
        if let Some(serial) = &self.serial {
            return Ok(match self.client.find_device(serial).await {
                Ok(device) => device,
                // not listed (e.g. a TCP device mid-reconnect); let the transport decide
                Err(AdbError::DeviceNotFound(_)) => self.client.device(serial.as_str()),
                Err(e) => return Err(e),
            });
        }

        let online: Vec<_> = self
            .client
            .device_list()
            .await?
            .into_iter()
            .filter(|d| d.state == DeviceState::Online)
            .collect();

        select_single(online.iter().map(|d| d.serial.as_str()).collect())
            .map(|serial| self.client.device(serial))
    }
}

/// Pick the only candidate, or explain why that is not possible.
pub(crate) fn select_single(serials: Vec<&str>) -> Result<&str> {
    match serials.as_slice() {
        [] => Err(AdbError::DeviceNotFound("any online device".to_string())),
        [serial] => Ok(*serial),
        many => Err(AdbError::InvalidArgument(format!(
            "{} devices connected ({}); pass --serial",
            many.len(),
            many.join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::select_single;
    use adbwire::AdbError;

    #[test]
    fn test_select_single() {
        assert_eq!(select_single(vec!["emulator-5554"]).unwrap(), "emulator-5554");
        assert!(matches!(
            select_single(vec![]),
            Err(AdbError::DeviceNotFound(_))
        ));
        match select_single(vec!["a", "b"]) {
            Err(AdbError::InvalidArgument(msg)) => assert!(msg.contains("a, b")),
            other => panic!("expected InvalidArgument, got {:?}", other),
        }
    }
}

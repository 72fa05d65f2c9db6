use crate::adb::protocol::{self, DirectoryEntry, SyncCommand};
use crate::adb::{Shell, SyncTransport, Transport, TransportTarget};
use crate::client::Client;
use crate::error::{AdbError, Result};
use crate::types::{
    self, DeviceForward, DeviceInfo, DeviceState, ForwardOptions, Port, PushOptions,
};
use log::*;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// Port adbd listens on after `adb tcpip`.
pub const ADB_DAEMON_PORT: u16 = 5555;

/// Per-device operations. Each call opens its own transport and releases
/// it before returning, on success and on error.
#[derive(Debug, Clone)]
pub struct Device {
    client: Client,
    serial: String,
    attrs: BTreeMap<String, String>,
}

impl Device {
    pub fn new(client: Client, serial: impl Into<String>) -> Self {
        Self {
            client,
            serial: serial.into(),
            attrs: BTreeMap::new(),
        }
    }

    pub(crate) fn from_info(client: Client, info: DeviceInfo) -> Self {
        Self {
            client,
            serial: info.serial,
            attrs: info.attrs,
        }
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Attributes from `host:devices-l` (model, product, usb, ...).
    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    pub fn model(&self) -> Option<&str> {
        self.attrs.get("model").map(String::as_str)
    }

    pub fn product(&self) -> Option<&str> {
        self.attrs.get("product").map(String::as_str)
    }

    pub fn is_usb(&self) -> bool {
        self.attrs.get("usb").map_or(false, |usb| !usb.is_empty())
    }

    fn host_serial(&self, command: &str) -> String {
        format!("host-serial:{}:{}", self.serial, command)
    }

    pub async fn state(&self) -> Result<DeviceState> {
        let reply = self.client.execute_command(&self.host_serial("get-state")).await?;
        Ok(DeviceState::from_str(&reply))
    }

    pub async fn device_path(&self) -> Result<String> {
        self.client.execute_command(&self.host_serial("get-devpath")).await
    }

    pub async fn serial_no(&self) -> Result<String> {
        self.client.execute_command(&self.host_serial("get-serialno")).await
    }

    pub async fn forward(&self, local: &Port, remote: &Port, opts: ForwardOptions) -> Result<()> {
        let command = if opts.no_rebind {
            format!("forward:norebind:{};{}", local, remote)
        } else {
            format!("forward:{};{}", local, remote)
        };
        self.client
            .execute_command_no_reply(&self.host_serial(&command))
            .await
    }

    pub async fn forward_list(&self) -> Result<Vec<DeviceForward>> {
        Ok(self
            .client
            .forward_list()
            .await?
            .into_iter()
            .filter(|f| f.serial == self.serial)
            .collect())
    }

    pub async fn forward_kill(&self, local: &Port) -> Result<()> {
        self.client
            .execute_command_no_reply(&self.host_serial(&format!("killforward:{}", local)))
            .await
    }

    pub async fn reverse(&self, remote: &Port, local: &Port, opts: ForwardOptions) -> Result<()> {
        let command = if opts.no_rebind {
            format!("reverse:forward:norebind:{};{}", remote, local)
        } else {
            format!("reverse:forward:{};{}", remote, local)
        };
        self.execute_command_no_reply(&command).await
    }

    pub async fn reverse_list(&self) -> Result<Vec<DeviceForward>> {
        let raw = self.execute_command("reverse:list-forward").await?;
        Ok(types::parse_reverse_list(&String::from_utf8_lossy(&raw)))
    }

    pub async fn reverse_kill(&self, remote: &Port) -> Result<()> {
        self.execute_command_no_reply(&format!("reverse:killforward:{}", remote))
            .await
    }

    pub async fn reverse_kill_all(&self) -> Result<()> {
        self.execute_command_no_reply("reverse:killforward-all").await
    }

    async fn transport(&self) -> Result<Transport> {
        self.client
            .transport(&TransportTarget::Serial(self.serial.clone()))
            .await
    }

    async fn sync_transport(&self) -> Result<SyncTransport> {
        self.transport().await?.create_sync_transport().await
    }

    /// Run a device service and collect everything it writes until EOF.
    async fn execute_command(&self, command: &str) -> Result<Vec<u8>> {
        let mut tp = self.transport().await?;
        let result = async {
            tp.send(command).await?;
            tp.verify_response().await?;
            tp.read_bytes_all().await
        }
        .await;
        let _ = tp.close().await;
        result
    }

    async fn execute_command_no_reply(&self, command: &str) -> Result<()> {
        let mut tp = self.transport().await?;
        let result = async {
            tp.send(command).await?;
            tp.verify_response().await
        }
        .await;
        let _ = tp.close().await;
        result
    }

    pub async fn run_shell_command(&self, cmd: &str, args: &[&str]) -> Result<String> {
        let raw = self.run_shell_command_bytes(cmd, args).await?;
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    pub async fn run_shell_command_bytes(&self, cmd: &str, args: &[&str]) -> Result<Vec<u8>> {
        let cmd = shell_line(cmd, args)?;
        self.execute_command(&format!("shell:{}", cmd)).await
    }

    /// Start a long-running command over shell v2. Read the returned
    /// [`Shell`] for combined stdout/stderr; close it to stop the command.
    pub async fn run_shell_command_async(&self, cmd: &str, args: &[&str]) -> Result<Shell> {
        let cmd = shell_line(cmd, args)?;
        let mut tp = self.transport().await?;
        let started = async {
            tp.send(&format!("shell,v2,raw:{}", cmd)).await?;
            tp.verify_response().await
        }
        .await;
        if let Err(e) = started {
            let _ = tp.close().await;
            return Err(e);
        }

        let shell_tp = tp.create_shell_transport()?;
        debug!("shell session started: {}", cmd);
        Ok(Shell::spawn(shell_tp, self.client.config().shell_buffer))
    }

    /// Restart adbd listening on TCP `port`.
    pub async fn enable_adb_over_tcp(&self, port: u16) -> Result<()> {
        self.execute_command_no_reply(&format!("tcpip:{}", port)).await
    }

    /// Entries of `remote_path`, without the end-of-listing sentinel.
    pub async fn list(&self, remote_path: &str) -> Result<Vec<DirectoryEntry>> {
        let mut sync = self.sync_transport().await?;
        let result: Result<Vec<DirectoryEntry>> = async {
            sync.send(SyncCommand::List, remote_path).await?;
            let mut entries = Vec::new();
            loop {
                let entry = sync.read_directory_entry().await?;
                if entry.is_end() {
                    break;
                }
                entries.push(entry);
            }
            Ok(entries)
        }
        .await;
        let _ = sync.close().await;
        result
    }

    pub async fn stat(&self, remote_path: &str) -> Result<DirectoryEntry> {
        let mut sync = self.sync_transport().await?;
        let result = async {
            sync.send(SyncCommand::Stat, remote_path).await?;
            sync.read_stat(remote_path).await
        }
        .await;
        let _ = sync.close().await;
        result
    }

    /// Upload `source` to `remote_path`. Returns the number of bytes sent.
    pub async fn push<R>(&self, source: &mut R, remote_path: &str, opts: &PushOptions) -> Result<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut sync = self.sync_transport().await?;
        let result: Result<u64> = async {
            sync.send(
                SyncCommand::Send,
                &protocol::send_argument(remote_path, opts.mode),
            )
            .await?;
            let sent = sync.send_stream(source).await?;
            sync.send_status(SyncCommand::Done, opts.mtime_unix()).await?;
            sync.verify_status().await?;
            Ok(sent)
        }
        .await;
        let _ = sync.close().await;

        if let Ok(sent) = &result {
            info!("Pushed {} bytes to {}:{}", sent, self.serial, remote_path);
        }
        result
    }

    /// Upload a local file. Without an explicit mtime the file's own
    /// modification time is kept.
    pub async fn push_file(&self, local: &Path, remote_path: &str, opts: &PushOptions) -> Result<u64> {
        let mut file = File::open(local).await?;
        let mut opts = opts.clone();
        if opts.mtime.is_none() {
            opts.mtime = file.metadata().await?.modified().ok();
        }
        self.push(&mut file, remote_path, &opts).await
    }

    /// Download `remote_path` into `dest`. Returns the number of bytes written.
    pub async fn pull<W>(&self, remote_path: &str, dest: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut sync = self.sync_transport().await?;
        let result = async {
            sync.send(SyncCommand::Recv, remote_path).await?;
            sync.write_stream(dest).await
        }
        .await;
        let _ = sync.close().await;
        result
    }

    /// Stream `logcat` into `dest` until `token` is cancelled or the device
    /// closes the stream.
    pub async fn logcat<W>(&self, dest: &mut W, token: CancellationToken) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        if token.is_cancelled() {
            return Err(AdbError::Cancelled);
        }

        let mut tp = self.transport().await?;
        let started = async {
            tp.send("shell:logcat").await?;
            tp.verify_response().await
        }
        .await;
        if let Err(e) = started {
            let _ = tp.close().await;
            return Err(e);
        }

        let mut reader = tp.into_stream_reader(token)?;
        let copied = tokio::io::copy(&mut reader, dest).await?;
        dest.flush().await?;
        debug!("logcat stopped after {} bytes", copied);
        Ok(copied)
    }

    pub async fn logcat_to_file(&self, path: &Path, token: CancellationToken) -> Result<u64> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        self.logcat(&mut file, token).await
    }

    pub async fn logcat_clear(&self) -> Result<()> {
        self.execute_command("shell:logcat -c").await.map(|_| ())
    }
}

fn shell_line(cmd: &str, args: &[&str]) -> Result<String> {
    let line = if args.is_empty() {
        cmd.to_string()
    } else {
        format!("{} {}", cmd, args.join(" "))
    };
    if line.trim().is_empty() {
        return Err(AdbError::InvalidArgument(
            "shell command cannot be empty".to_string(),
        ));
    }
    Ok(line)
}

use crate::adb::{Connection, Transport, TransportTarget};
use crate::config::ClientConfig;
use crate::device::Device;
use crate::error::{AdbError, Result};
use crate::types::{self, DeviceForward, DeviceInfo};
use log::*;

/// Host-level commands against the ADB server: version, device lists,
/// forward bookkeeping and TCP device management.
#[derive(Debug, Clone, Default)]
pub struct Client {
    config: ClientConfig,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn connect(&self) -> Result<Connection> {
        Connection::connect(&self.config).await
    }

    /// Open a fresh socket and switch it to `target`.
    pub async fn transport(&self, target: &TransportTarget) -> Result<Transport> {
        self.connect().await?.into_transport(target).await
    }

    /// Send `command`, check the status and return the length-prefixed reply.
    pub(crate) async fn execute_command(&self, command: &str) -> Result<String> {
        let mut conn = self.connect().await?;
        let result = async {
            conn.send(command).await?;
            conn.verify_response().await?;
            conn.read_length_prefixed().await
        }
        .await;
        let _ = conn.close().await;

        let reply = result?;
        Ok(String::from_utf8_lossy(&reply).into_owned())
    }

    /// Send `command` and only check the status.
    pub(crate) async fn execute_command_no_reply(&self, command: &str) -> Result<()> {
        let mut conn = self.connect().await?;
        let result = async {
            conn.send(command).await?;
            conn.verify_response().await
        }
        .await;
        let _ = conn.close().await;
        result
    }

    /// Protocol version of the running server.
    pub async fn server_version(&self) -> Result<u32> {
        let reply = self.execute_command("host:version").await?;
        u32::from_str_radix(reply.trim(), 16)
            .map_err(|_| AdbError::protocol(format!("invalid server version: {:?}", reply)))
    }

    pub async fn device_serials(&self) -> Result<Vec<String>> {
        let reply = self.execute_command("host:devices").await?;
        Ok(reply
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .map(str::to_string)
            .collect())
    }

    pub async fn device_list(&self) -> Result<Vec<DeviceInfo>> {
        let reply = self.execute_command("host:devices-l").await?;
        let devices = types::parse_device_list(&reply);
        debug!("Found {} devices", devices.len());
        Ok(devices)
    }

    /// Façades for every device the server knows about.
    pub async fn devices(&self) -> Result<Vec<Device>> {
        Ok(self
            .device_list()
            .await?
            .into_iter()
            .map(|info| Device::from_info(self.clone(), info))
            .collect())
    }

    /// Façade for a device by serial, without asking the server first.
    pub fn device(&self, serial: impl Into<String>) -> Device {
        Device::new(self.clone(), serial)
    }

    /// Find a listed device by serial.
    pub async fn find_device(&self, serial: &str) -> Result<Device> {
        self.devices()
            .await?
            .into_iter()
            .find(|d| d.serial() == serial)
            .ok_or_else(|| AdbError::DeviceNotFound(serial.to_string()))
    }

    pub async fn forward_list(&self) -> Result<Vec<DeviceForward>> {
        let reply = self.execute_command("host:list-forward").await?;
        Ok(types::parse_forward_list(&reply))
    }

    pub async fn forward_kill_all(&self) -> Result<()> {
        self.execute_command_no_reply("host:killforward-all").await
    }

    /// Attach a device over TCP/IP (`adb connect`).
    pub async fn connect_device(&self, address: &str) -> Result<String> {
        let reply = self
            .execute_command(&format!("host:connect:{}", address))
            .await?;
        if reply.starts_with("failed") || reply.starts_with("unable") {
            return Err(AdbError::RemoteRejected(reply));
        }
        info!("{}", reply);
        Ok(reply)
    }

    pub async fn disconnect_device(&self, address: &str) -> Result<String> {
        let reply = self
            .execute_command(&format!("host:disconnect:{}", address))
            .await?;
        if reply.starts_with("error") {
            return Err(AdbError::RemoteRejected(reply));
        }
        Ok(reply)
    }

    /// Ask the server to exit. It may drop the socket before replying.
    pub async fn kill_server(&self) -> Result<()> {
        let mut conn = self.connect().await?;
        conn.send("host:kill").await?;
        match conn.verify_response().await {
            Ok(()) => {}
            Err(e) if e.is_disconnect() => debug!("server closed before replying"),
            Err(e) => return Err(e),
        }
        conn.close().await
    }
}

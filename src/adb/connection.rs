use crate::adb::cancel::CancelableStreamReader;
use crate::adb::protocol::{self, STATUS_FAIL, STATUS_OKAY};
use crate::adb::shell::ShellTransport;
use crate::adb::sync::SyncTransport;
use crate::config::ClientConfig;
use crate::error::{AdbError, Result};
use log::*;
use std::fmt;
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

/// Socket plus the request/status primitives every protocol layer shares.
///
/// Closing drops the socket; any later call fails with `NotConnected`
/// instead of touching the wire again.
pub(crate) struct AdbStream {
    stream: Option<TcpStream>,
    debug: bool,
}

impl AdbStream {
    pub(crate) fn new(stream: TcpStream, debug: bool) -> Self {
        Self {
            stream: Some(stream),
            debug,
        }
    }

    pub(crate) fn debug(&self) -> bool {
        self.debug
    }

    fn socket(&mut self) -> Result<&mut TcpStream> {
        self.stream.as_mut().ok_or_else(closed)
    }

    pub(crate) async fn send(&mut self, request: &str) -> Result<()> {
        let framed = protocol::encode_request(request)?;
        if self.debug {
            debug!("--> {:?}", String::from_utf8_lossy(&framed));
        }
        self.write_all(&framed).await
    }

    pub(crate) async fn verify_response(&mut self) -> Result<()> {
        let mut status = [0u8; 4];
        self.read_exact(&mut status).await?;
        if self.debug {
            debug!("<-- {:?}", String::from_utf8_lossy(&status));
        }

        if &status == STATUS_OKAY {
            return Ok(());
        }
        if &status == STATUS_FAIL {
            let message = self.read_length_prefixed().await?;
            return Err(AdbError::RemoteRejected(
                String::from_utf8_lossy(&message).into_owned(),
            ));
        }
        Err(AdbError::protocol(format!(
            "unexpected status token {:?}",
            String::from_utf8_lossy(&status)
        )))
    }

    pub(crate) async fn read_length_prefixed(&mut self) -> Result<Vec<u8>> {
        let mut prefix = [0u8; 4];
        self.read_exact(&mut prefix).await?;
        let len = protocol::parse_hex_length(&prefix)?;

        let mut payload = vec![0u8; len];
        self.read_exact(&mut payload).await?;
        if self.debug {
            debug!("<-- {} byte payload", len);
        }
        Ok(payload)
    }

    pub(crate) async fn read_bytes_all(&mut self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.socket()?.read_to_end(&mut data).await?;
        if self.debug {
            debug!("<-- {} bytes until EOF", data.len());
        }
        Ok(data)
    }

    pub(crate) async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.socket()?.write_all(buf).await?;
        Ok(())
    }

    pub(crate) async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.socket()?.read_exact(buf).await?;
        Ok(())
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    pub(crate) fn take_socket(&mut self) -> Result<TcpStream> {
        self.stream.take().ok_or_else(closed)
    }

    pub(crate) async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!("shutdown on close failed: {}", e);
            }
        }
        Ok(())
    }
}

fn closed() -> AdbError {
    AdbError::Io(io::Error::new(
        io::ErrorKind::NotConnected,
        "transport already closed",
    ))
}

/// Which device a transport handshake selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportTarget {
    Serial(String),
    Any,
    Usb,
    Local,
}

impl TransportTarget {
    pub fn request(&self) -> String {
        match self {
            TransportTarget::Serial(serial) => format!("host:transport:{}", serial),
            TransportTarget::Any => "host:transport-any".to_string(),
            TransportTarget::Usb => "host:transport-usb".to_string(),
            TransportTarget::Local => "host:transport-local".to_string(),
        }
    }
}

impl fmt::Display for TransportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportTarget::Serial(serial) => write!(f, "{}", serial),
            TransportTarget::Any => write!(f, "any"),
            TransportTarget::Usb => write!(f, "usb"),
            TransportTarget::Local => write!(f, "local"),
        }
    }
}

/// Connection to the ADB host server, before any device is selected.
pub struct Connection {
    stream: AdbStream,
}

impl Connection {
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let address = config.server_address();
        debug!("Connecting to ADB server at {}", address);

        let stream = TcpStream::connect(&address).await?;
        stream.set_nodelay(true)?;
        debug!("Connection established");

        Ok(Self {
            stream: AdbStream::new(stream, config.debug),
        })
    }

    /// Write a length-prefixed service request.
    pub async fn send(&mut self, request: &str) -> Result<()> {
        self.stream.send(request).await
    }

    /// Consume the `OKAY`/`FAIL` token that answers every request.
    pub async fn verify_response(&mut self) -> Result<()> {
        self.stream.verify_response().await
    }

    /// Read a hex-length-prefixed payload, the shape of most host replies.
    pub async fn read_length_prefixed(&mut self) -> Result<Vec<u8>> {
        self.stream.read_length_prefixed().await
    }

    pub async fn read_bytes_all(&mut self) -> Result<Vec<u8>> {
        self.stream.read_bytes_all().await
    }

    /// Switch this socket over to a device. The host-level API is gone
    /// afterwards, which is why this consumes the connection.
    pub async fn into_transport(mut self, target: &TransportTarget) -> Result<Transport> {
        self.stream.send(&target.request()).await?;
        self.stream.verify_response().await?;
        debug!("Transport to {} established", target);
        Ok(Transport {
            stream: self.stream,
        })
    }

    pub async fn close(&mut self) -> Result<()> {
        self.stream.close().await
    }
}

/// A socket that now talks to the device daemon.
pub struct Transport {
    stream: AdbStream,
}

impl Transport {
    pub async fn send(&mut self, request: &str) -> Result<()> {
        self.stream.send(request).await
    }

    pub async fn verify_response(&mut self) -> Result<()> {
        self.stream.verify_response().await
    }

    /// Read until the daemon closes the stream.
    pub async fn read_bytes_all(&mut self) -> Result<Vec<u8>> {
        self.stream.read_bytes_all().await
    }

    /// Request `sync:` and hand the socket to the file-transfer protocol.
    pub async fn create_sync_transport(mut self) -> Result<SyncTransport> {
        self.stream.send("sync:").await?;
        self.stream.verify_response().await?;
        Ok(SyncTransport::new(self.stream))
    }

    /// Wrap the socket for shell v2 framing. The `shell,v2:` request must
    /// already have been sent and verified.
    pub fn create_shell_transport(self) -> Result<ShellTransport> {
        if self.stream.is_closed() {
            return Err(closed());
        }
        Ok(ShellTransport::new(self.stream))
    }

    /// Treat the rest of the socket as raw output that stops when `token`
    /// is cancelled.
    pub fn into_stream_reader(mut self, token: CancellationToken) -> Result<CancelableStreamReader> {
        let socket = self.stream.take_socket()?;
        Ok(CancelableStreamReader::new(socket, token))
    }

    pub async fn close(&mut self) -> Result<()> {
        self.stream.close().await
    }
}

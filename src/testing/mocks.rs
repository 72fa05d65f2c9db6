use super::fixtures::{DEVICES_L, FORWARD_LIST, MODE_DIR, REVERSE_LIST, TEST_SERIAL};
use crate::adb::protocol::SYNC_DATA_MAX;
use crate::client::Client;
use crate::config::ClientConfig;
use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Local TCP endpoint that hands every accepted socket to `handler`.
pub struct FakeAdbServer {
    port: u16,
    accept: JoinHandle<()>,
}

impl FakeAdbServer {
    pub async fn start<F, Fut>(handler: F) -> Self
    where
        F: Fn(TcpStream) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = io::Result<()>> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake adb server");
        let port = listener.local_addr().expect("local addr").port();
        let handler = Arc::new(handler);

        let accept = tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    if let Err(e) = handler(socket).await {
                        log::debug!("fake adb handler ended: {}", e);
                    }
                });
            }
        });

        Self { port, accept }
    }

    /// Server whose only device is `device`.
    pub async fn with_device(device: Arc<FakeDevice>) -> Self {
        Self::start(move |socket| {
            let device = Arc::clone(&device);
            async move { device.serve(socket).await }
        })
        .await
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new("127.0.0.1", self.port)
    }

    pub fn client(&self) -> Client {
        Client::new(self.config())
    }
}

impl Drop for FakeAdbServer {
    fn drop(&mut self) {
        self.accept.abort();
    }
}

fn invalid<E: std::fmt::Display>(e: E) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e.to_string())
}

pub async fn read_request(socket: &mut TcpStream) -> io::Result<String> {
    let mut prefix = [0u8; 4];
    socket.read_exact(&mut prefix).await?;
    let text = std::str::from_utf8(&prefix).map_err(invalid)?;
    let len = usize::from_str_radix(text, 16).map_err(invalid)?;
    let mut body = vec![0u8; len];
    socket.read_exact(&mut body).await?;
    String::from_utf8(body).map_err(invalid)
}

pub async fn write_okay(socket: &mut TcpStream) -> io::Result<()> {
    socket.write_all(b"OKAY").await
}

pub async fn write_fail(socket: &mut TcpStream, message: &str) -> io::Result<()> {
    socket
        .write_all(format!("FAIL{:04x}{}", message.len(), message).as_bytes())
        .await
}

pub async fn write_hex_payload(socket: &mut TcpStream, payload: &str) -> io::Result<()> {
    socket
        .write_all(format!("{:04x}{}", payload.len(), payload).as_bytes())
        .await
}

pub async fn write_sync(socket: &mut TcpStream, id: &[u8; 4], payload: &[u8]) -> io::Result<()> {
    let mut frame = Vec::with_capacity(8 + payload.len());
    frame.extend_from_slice(id);
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(payload);
    socket.write_all(&frame).await
}

pub async fn write_shell(socket: &mut TcpStream, id: u8, payload: &[u8]) -> io::Result<()> {
    let mut frame = Vec::with_capacity(5 + payload.len());
    frame.push(id);
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(payload);
    socket.write_all(&frame).await
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeFile {
    pub mode: u32,
    pub mtime: u32,
    pub data: Vec<u8>,
}

/// In-memory stand-in for the host server plus one device daemon.
///
/// Shell v2 commands it knows:
/// - `echo-mixed`: stdout, stderr, a CloseStdin carrying bytes, stdout, exit 0
/// - `exit-3`: stderr then exit 3
/// - `stream`: stdout ticks until the socket goes away
/// - `vanish`: one stdout frame, then the socket closes without an exit
/// - `big`: 300 KiB of stdout in 4 KiB frames, then exit 0
#[derive(Default)]
pub struct FakeDevice {
    files: Mutex<BTreeMap<String, FakeFile>>,
    dirs: Mutex<BTreeSet<String>>,
    requests: Mutex<Vec<String>>,
    chunks: AtomicUsize,
    max_chunk: AtomicUsize,
}

pub const BIG_OUTPUT_LEN: usize = 300 * 1024;

impl FakeDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert_file(&self, path: &str, mode: u32, mtime: u32, data: Vec<u8>) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), FakeFile { mode, mtime, data });
    }

    pub fn mkdir(&self, path: &str) {
        self.dirs.lock().unwrap().insert(path.to_string());
    }

    pub fn file(&self, path: &str) -> Option<FakeFile> {
        self.files.lock().unwrap().get(path).cloned()
    }

    /// Every service request seen so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// DATA frames received by the last push.
    pub fn chunks(&self) -> usize {
        self.chunks.load(Ordering::SeqCst)
    }

    pub fn max_chunk(&self) -> usize {
        self.max_chunk.load(Ordering::SeqCst)
    }

    fn record(&self, request: &str) {
        self.requests.lock().unwrap().push(request.to_string());
    }

    /// (name, mode, size, mtime) of the direct children of `dir`.
    fn children(&self, dir: &str) -> Vec<(String, u32, u32, u32)> {
        let prefix = if dir.ends_with('/') {
            dir.to_string()
        } else {
            format!("{}/", dir)
        };

        let mut entries = BTreeMap::new();
        for (path, file) in self.files.lock().unwrap().iter() {
            if let Some(rest) = path.strip_prefix(&prefix) {
                match rest.split_once('/') {
                    Some((sub, _)) => {
                        entries.insert(sub.to_string(), (MODE_DIR, 4096, 0));
                    }
                    None => {
                        entries.insert(
                            rest.to_string(),
                            (file.mode, file.data.len() as u32, file.mtime),
                        );
                    }
                }
            }
        }
        for path in self.dirs.lock().unwrap().iter() {
            if let Some(rest) = path.strip_prefix(&prefix) {
                if let Some(sub) = rest.split('/').next().filter(|s| !s.is_empty()) {
                    entries.insert(sub.to_string(), (MODE_DIR, 4096, 0));
                }
            }
        }

        entries
            .into_iter()
            .map(|(name, (mode, size, mtime))| (name, mode, size, mtime))
            .collect()
    }

    pub async fn serve(&self, mut socket: TcpStream) -> io::Result<()> {
        let request = read_request(&mut socket).await?;
        self.record(&request);

        let own_transport = format!("host:transport:{}", TEST_SERIAL);
        let own_serial = format!("host-serial:{}:", TEST_SERIAL);

        match request.as_str() {
            "host:version" => {
                write_okay(&mut socket).await?;
                write_hex_payload(&mut socket, "0029").await
            }
            "host:devices" => {
                write_okay(&mut socket).await?;
                write_hex_payload(&mut socket, &format!("{}\tdevice\n", TEST_SERIAL)).await
            }
            "host:devices-l" => {
                write_okay(&mut socket).await?;
                write_hex_payload(&mut socket, DEVICES_L).await
            }
            "host:list-forward" => {
                write_okay(&mut socket).await?;
                write_hex_payload(&mut socket, FORWARD_LIST).await
            }
            "host:killforward-all" | "host:kill" => write_okay(&mut socket).await,
            r if r == own_transport || r == "host:transport-any" => {
                write_okay(&mut socket).await?;
                self.serve_device(socket).await
            }
            r if r.starts_with("host:transport:") => {
                let serial = &r["host:transport:".len()..];
                write_fail(&mut socket, &format!("device '{}' not found", serial)).await
            }
            r if r.starts_with("host:connect:") => {
                let address = &r["host:connect:".len()..];
                write_okay(&mut socket).await?;
                if address.starts_with("10.255.") {
                    write_hex_payload(&mut socket, &format!("failed to connect to {}", address)).await
                } else {
                    write_hex_payload(&mut socket, &format!("connected to {}", address)).await
                }
            }
            r if r.starts_with(&own_serial) => {
                let command = &r[own_serial.len()..];
                match command {
                    "get-state" => {
                        write_okay(&mut socket).await?;
                        write_hex_payload(&mut socket, "device").await
                    }
                    "get-serialno" => {
                        write_okay(&mut socket).await?;
                        write_hex_payload(&mut socket, TEST_SERIAL).await
                    }
                    "get-devpath" => {
                        write_okay(&mut socket).await?;
                        write_hex_payload(&mut socket, "usb:1-1").await
                    }
                    c if c.starts_with("forward:norebind:tcp:8080") => {
                        write_fail(&mut socket, "cannot rebind existing socket").await
                    }
                    c if c.starts_with("forward:") || c.starts_with("killforward:") => {
                        write_okay(&mut socket).await
                    }
                    _ => write_fail(&mut socket, "unknown host-serial command").await,
                }
            }
            _ => write_fail(&mut socket, "unknown host service").await,
        }
    }

    async fn serve_device(&self, mut socket: TcpStream) -> io::Result<()> {
        let request = read_request(&mut socket).await?;
        self.record(&request);

        if request == "sync:" {
            write_okay(&mut socket).await?;
            return self.serve_sync(socket).await;
        }
        if let Some(cmd) = request.strip_prefix("shell,v2,raw:") {
            write_okay(&mut socket).await?;
            return serve_shell_v2(cmd, socket).await;
        }
        if request == "shell:logcat" {
            write_okay(&mut socket).await?;
            loop {
                socket.write_all(b"I/ActivityManager: tick\n").await?;
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        }
        if let Some(cmd) = request.strip_prefix("shell:") {
            write_okay(&mut socket).await?;
            let output = match cmd {
                "echo hello" => "hello\n".to_string(),
                "logcat -c" => String::new(),
                other => format!("/system/bin/sh: {}: not found\n", other),
            };
            socket.write_all(output.as_bytes()).await?;
            return socket.shutdown().await;
        }

        match request.as_str() {
            "reverse:list-forward" => {
                write_okay(&mut socket).await?;
                socket.write_all(REVERSE_LIST.as_bytes()).await?;
                socket.shutdown().await
            }
            r if r.starts_with("reverse:") || r.starts_with("tcpip:") => {
                write_okay(&mut socket).await?;
                socket.shutdown().await
            }
            _ => write_fail(&mut socket, "closed").await,
        }
    }

    async fn serve_sync(&self, mut socket: TcpStream) -> io::Result<()> {
        loop {
            let mut header = [0u8; 8];
            if socket.read_exact(&mut header).await.is_err() {
                return Ok(());
            }
            let id = [header[0], header[1], header[2], header[3]];
            let len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;

            match &id {
                b"LIST" => {
                    let path = read_string(&mut socket, len).await?;
                    for (name, mode, size, mtime) in self.children(&path) {
                        let mut frame = Vec::new();
                        frame.extend_from_slice(b"DENT");
                        frame.extend_from_slice(&mode.to_le_bytes());
                        frame.extend_from_slice(&size.to_le_bytes());
                        frame.extend_from_slice(&mtime.to_le_bytes());
                        frame.extend_from_slice(&(name.len() as u32).to_le_bytes());
                        frame.extend_from_slice(name.as_bytes());
                        socket.write_all(&frame).await?;
                    }
                    socket.write_all(b"DONE").await?;
                    socket.write_all(&[0u8; 16]).await?;
                }
                b"STAT" => {
                    let path = read_string(&mut socket, len).await?;
                    let (mode, size, mtime) = match self.file(&path) {
                        Some(f) => (f.mode, f.data.len() as u32, f.mtime),
                        None => (0, 0, 0),
                    };
                    let mut frame = Vec::new();
                    frame.extend_from_slice(b"STAT");
                    frame.extend_from_slice(&mode.to_le_bytes());
                    frame.extend_from_slice(&size.to_le_bytes());
                    frame.extend_from_slice(&mtime.to_le_bytes());
                    socket.write_all(&frame).await?;
                }
                b"SEND" => {
                    let arg = read_string(&mut socket, len).await?;
                    let (path, mode) = match arg.rsplit_once(',') {
                        Some((path, mode)) => (path.to_string(), mode.parse().unwrap_or(0)),
                        None => (arg.clone(), 0),
                    };
                    self.chunks.store(0, Ordering::SeqCst);
                    let mut data = Vec::new();

                    loop {
                        let mut header = [0u8; 8];
                        socket.read_exact(&mut header).await?;
                        let value = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
                        match &header[0..4] {
                            b"DATA" => {
                                let n = value as usize;
                                if n > SYNC_DATA_MAX {
                                    write_sync(&mut socket, b"FAIL", b"data chunk too large").await?;
                                    return Ok(());
                                }
                                let mut chunk = vec![0u8; n];
                                socket.read_exact(&mut chunk).await?;
                                self.chunks.fetch_add(1, Ordering::SeqCst);
                                self.max_chunk.fetch_max(n, Ordering::SeqCst);
                                data.extend_from_slice(&chunk);
                            }
                            b"DONE" => {
                                if path.starts_with("/system/") {
                                    write_sync(&mut socket, b"FAIL", b"Read-only file system").await?;
                                } else {
                                    self.insert_file(&path, mode, value, data);
                                    write_sync(&mut socket, b"OKAY", &[]).await?;
                                }
                                break;
                            }
                            _ => return Ok(()),
                        }
                    }
                }
                b"RECV" => {
                    let path = read_string(&mut socket, len).await?;
                    match self.file(&path) {
                        Some(file) => {
                            for chunk in file.data.chunks(SYNC_DATA_MAX) {
                                write_sync(&mut socket, b"DATA", chunk).await?;
                            }
                            write_sync(&mut socket, b"DONE", &[]).await?;
                        }
                        None => {
                            write_sync(&mut socket, b"FAIL", b"No such file or directory").await?;
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }
}

async fn read_string(socket: &mut TcpStream, len: usize) -> io::Result<String> {
    let mut buf = vec![0u8; len];
    socket.read_exact(&mut buf).await?;
    String::from_utf8(buf).map_err(invalid)
}

async fn serve_shell_v2(cmd: &str, mut socket: TcpStream) -> io::Result<()> {
    match cmd {
        "echo-mixed" => {
            write_shell(&mut socket, 1, b"hello ").await?;
            write_shell(&mut socket, 2, b"oops ").await?;
            write_shell(&mut socket, 4, b"ignored").await?;
            write_shell(&mut socket, 1, b"world\n").await?;
            write_shell(&mut socket, 3, &[0]).await
        }
        "exit-3" => {
            write_shell(&mut socket, 2, b"failure\n").await?;
            write_shell(&mut socket, 3, &[3]).await
        }
        "stream" => loop {
            write_shell(&mut socket, 1, b"tick\n").await?;
            tokio::time::sleep(Duration::from_millis(2)).await;
        },
        "vanish" => write_shell(&mut socket, 1, b"partial").await,
        "big" => {
            let frame = vec![b'x'; 4096];
            for _ in 0..BIG_OUTPUT_LEN / frame.len() {
                write_shell(&mut socket, 1, &frame).await?;
            }
            write_shell(&mut socket, 3, &[0]).await
        }
        other => {
            write_shell(&mut socket, 2, format!("{}: not found\n", other).as_bytes()).await?;
            write_shell(&mut socket, 3, &[127]).await
        }
    }
}

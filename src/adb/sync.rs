use crate::adb::connection::AdbStream;
use crate::adb::protocol::{self, DirectoryEntry, SyncCommand, SYNC_DATA_MAX, SYNC_NAME_MAX};
use crate::error::{AdbError, Result};
use log::*;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// File-transfer sub-protocol (`LIST`, `SEND`, `RECV`, `STAT`) on a socket
/// that has accepted `sync:`.
///
/// A malformed frame leaves the stream in an unknown position, so every
/// error is final for this transport; callers open a new one to retry.
pub struct SyncTransport {
    stream: AdbStream,
}

impl SyncTransport {
    pub(crate) fn new(stream: AdbStream) -> Self {
        Self { stream }
    }

    /// Emit `<cmd><len><arg>`. For `SEND` the argument is
    /// `<path>,<decimal-mode>`, see [`protocol::send_argument`].
    pub async fn send(&mut self, cmd: SyncCommand, arg: &str) -> Result<()> {
        if self.stream.debug() {
            debug!("sync --> {} {}", cmd, arg);
        }
        let frame = protocol::encode_sync_frame(cmd, arg.as_bytes())?;
        self.stream.write_all(&frame).await
    }

    async fn read_header(&mut self) -> Result<([u8; 4], u32)> {
        let mut header = [0u8; 8];
        self.stream.read_exact(&mut header).await?;
        let id = [header[0], header[1], header[2], header[3]];
        let len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        if self.stream.debug() {
            debug!("sync <-- {} ({})", String::from_utf8_lossy(&id), len);
        }
        Ok((id, len))
    }

    async fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.stream.read_exact(&mut buf).await?;
        Ok(u32::from_le_bytes(buf))
    }

    async fn read_failure(&mut self, len: u32) -> Result<AdbError> {
        check_name_len("failure message", len as usize)?;
        let mut message = vec![0u8; len as usize];
        self.stream.read_exact(&mut message).await?;
        Ok(AdbError::RemoteRejected(
            String::from_utf8_lossy(&message).into_owned(),
        ))
    }

    /// Read one listing entry. The end of the listing comes back as the
    /// zero entry (see [`DirectoryEntry::is_end`]).
    pub async fn read_directory_entry(&mut self) -> Result<DirectoryEntry> {
        let mut id = [0u8; 4];
        self.stream.read_exact(&mut id).await?;

        match SyncCommand::from_code(&id) {
            Some(SyncCommand::Dent) | Some(SyncCommand::Done) => {
                let mode = self.read_u32().await?;
                let size = self.read_u32().await?;
                let mtime = self.read_u32().await?;
                let name_len = self.read_u32().await? as usize;
                check_name_len("entry name", name_len)?;
                let mut name = vec![0u8; name_len];
                self.stream.read_exact(&mut name).await?;

                if id == *SyncCommand::Done.code() {
                    trace!("listing finished");
                    return Ok(DirectoryEntry::default());
                }

                Ok(DirectoryEntry {
                    mode,
                    size,
                    mtime,
                    name: String::from_utf8_lossy(&name).into_owned(),
                })
            }
            Some(SyncCommand::Fail) => {
                let len = self.read_u32().await?;
                Err(self.read_failure(len).await?)
            }
            _ => Err(AdbError::protocol(format!(
                "expected DENT, got {:?}",
                String::from_utf8_lossy(&id)
            ))),
        }
    }

    /// Read the reply to a `STAT` request. A path that does not exist
    /// comes back all zero and is reported as a rejection.
    pub async fn read_stat(&mut self, path: &str) -> Result<DirectoryEntry> {
        let mut id = [0u8; 4];
        self.stream.read_exact(&mut id).await?;
        if id != *SyncCommand::Stat.code() {
            return Err(AdbError::protocol(format!(
                "expected STAT, got {:?}",
                String::from_utf8_lossy(&id)
            )));
        }

        let entry = DirectoryEntry {
            mode: self.read_u32().await?,
            size: self.read_u32().await?,
            mtime: self.read_u32().await?,
            name: path.to_string(),
        };
        if entry.mode == 0 && entry.size == 0 && entry.mtime == 0 {
            return Err(AdbError::RemoteRejected(format!("no such file: {}", path)));
        }
        Ok(entry)
    }

    /// Copy `source` to the daemon as `DATA` frames of at most 64 KiB.
    /// Returns the number of bytes sent.
    pub async fn send_stream<R>(&mut self, source: &mut R) -> Result<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut buffer = vec![0u8; SYNC_DATA_MAX];
        let mut total = 0u64;

        loop {
            let n = source.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            let frame = protocol::encode_sync_frame(SyncCommand::Data, &buffer[..n])?;
            self.stream.write_all(&frame).await?;
            total += n as u64;
        }

        debug!("sent {} bytes", total);
        Ok(total)
    }

    /// Emit `<cmd><u32 value>`, e.g. `DONE <mtime>` to finish a push.
    pub async fn send_status(&mut self, cmd: SyncCommand, value: u32) -> Result<()> {
        if self.stream.debug() {
            debug!("sync --> {} {}", cmd, value);
        }
        self.stream
            .write_all(&protocol::encode_sync_status(cmd, value))
            .await
    }

    /// Read the daemon's verdict after a push.
    pub async fn verify_status(&mut self) -> Result<()> {
        let (id, len) = self.read_header().await?;
        match SyncCommand::from_code(&id) {
            Some(SyncCommand::Okay) => Ok(()),
            Some(SyncCommand::Fail) => Err(self.read_failure(len).await?),
            _ => Err(AdbError::protocol(format!(
                "expected sync status, got {:?}",
                String::from_utf8_lossy(&id)
            ))),
        }
    }

    /// Drain a `RECV` reply into `dest` until `DONE`. Returns the number of
    /// bytes written.
    pub async fn write_stream<W>(&mut self, dest: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut buffer = vec![0u8; SYNC_DATA_MAX];
        let mut total = 0u64;

        loop {
            let (id, len) = self.read_header().await?;
            match SyncCommand::from_code(&id) {
                Some(SyncCommand::Data) => {
                    let len = len as usize;
                    if len > SYNC_DATA_MAX {
                        return Err(AdbError::protocol(format!(
                            "DATA frame of {} bytes exceeds {}",
                            len, SYNC_DATA_MAX
                        )));
                    }
                    self.stream.read_exact(&mut buffer[..len]).await?;
                    dest.write_all(&buffer[..len]).await?;
                    total += len as u64;
                }
                Some(SyncCommand::Done) => break,
                Some(SyncCommand::Fail) => return Err(self.read_failure(len).await?),
                _ => {
                    return Err(AdbError::protocol(format!(
                        "expected DATA or DONE, got {:?}",
                        String::from_utf8_lossy(&id)
                    )))
                }
            }
        }

        dest.flush().await?;
        debug!("received {} bytes", total);
        Ok(total)
    }

    pub async fn close(&mut self) -> Result<()> {
        self.stream.close().await
    }
}

fn check_name_len(what: &str, len: usize) -> Result<()> {
    if len > SYNC_NAME_MAX {
        return Err(AdbError::protocol(format!(
            "{} of {} bytes exceeds the {} byte limit",
            what, len, SYNC_NAME_MAX
        )));
    }
    Ok(())
}

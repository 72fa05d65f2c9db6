//! Byte-level framing shared by the host, sync and shell v2 protocols.
//!
//! Host requests are `<4 hex digits><utf-8 request>` and are answered with a
//! 4-byte status token. Sync frames are `<4-byte id><u32 LE length><payload>`.
//! Shell v2 frames are `<1-byte id><u32 LE length><payload>`.

use crate::error::{AdbError, Result};
use bytes::{BufMut, BytesMut};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

pub const STATUS_OKAY: &[u8; 4] = b"OKAY";
pub const STATUS_FAIL: &[u8; 4] = b"FAIL";

/// Largest request the 4-hex-digit prefix can describe.
pub const MAX_REQUEST_LEN: usize = 0xFFFF;

/// Hard ceiling for one `DATA` payload; the daemon rejects bigger chunks.
pub const SYNC_DATA_MAX: usize = 64 * 1024;

/// Longest path or name a sync frame may carry, and the cap for `FAIL` text.
pub const SYNC_NAME_MAX: usize = 1024;

/// Upper bound for one shell v2 payload; anything larger means the stream
/// is out of step.
pub const SHELL_PAYLOAD_MAX: usize = 1024 * 1024;

/// Default permissions for pushed files.
pub const DEFAULT_FILE_MODE: u32 = 0o664;

// File type bits (from stat.h)
const S_IFMT: u32 = 0o170000;
const S_IFSOCK: u32 = 0o140000;
const S_IFLNK: u32 = 0o120000;
const S_IFREG: u32 = 0o100000;
const S_IFBLK: u32 = 0o060000;
const S_IFDIR: u32 = 0o040000;
const S_IFCHR: u32 = 0o020000;
const S_IFIFO: u32 = 0o010000;

/// Frame a service request with its hex length prefix.
pub fn encode_request(request: &str) -> Result<BytesMut> {
    let len = request.len();
    if len > MAX_REQUEST_LEN {
        return Err(AdbError::protocol(format!(
            "request of {} bytes exceeds the {} byte limit",
            len, MAX_REQUEST_LEN
        )));
    }

    let mut buf = BytesMut::with_capacity(4 + len);
    buf.put_slice(format!("{:04x}", len).as_bytes());
    buf.put_slice(request.as_bytes());
    Ok(buf)
}

/// Parse a 4-digit hex length prefix, accepting either case.
pub fn parse_hex_length(bytes: &[u8; 4]) -> Result<usize> {
    if !bytes.iter().all(u8::is_ascii_hexdigit) {
        return Err(AdbError::protocol(format!(
            "invalid length prefix: {:?}",
            String::from_utf8_lossy(bytes)
        )));
    }
    let text = std::str::from_utf8(bytes)
        .map_err(|_| AdbError::protocol(format!("invalid length prefix: {:?}", bytes)))?;
    usize::from_str_radix(text, 16)
        .map_err(|_| AdbError::protocol(format!("invalid length prefix: {:?}", text)))
}

/// Sync sub-protocol command ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncCommand {
    List,
    Dent,
    Send,
    Recv,
    Data,
    Done,
    Okay,
    Fail,
    Stat,
    Quit,
}

impl SyncCommand {
    pub fn code(&self) -> &'static [u8; 4] {
        match self {
            SyncCommand::List => b"LIST",
            SyncCommand::Dent => b"DENT",
            SyncCommand::Send => b"SEND",
            SyncCommand::Recv => b"RECV",
            SyncCommand::Data => b"DATA",
            SyncCommand::Done => b"DONE",
            SyncCommand::Okay => b"OKAY",
            SyncCommand::Fail => b"FAIL",
            SyncCommand::Stat => b"STAT",
            SyncCommand::Quit => b"QUIT",
        }
    }

    pub fn from_code(code: &[u8; 4]) -> Option<Self> {
        match code {
            b"LIST" => Some(SyncCommand::List),
            b"DENT" => Some(SyncCommand::Dent),
            b"SEND" => Some(SyncCommand::Send),
            b"RECV" => Some(SyncCommand::Recv),
            b"DATA" => Some(SyncCommand::Data),
            b"DONE" => Some(SyncCommand::Done),
            b"OKAY" => Some(SyncCommand::Okay),
            b"FAIL" => Some(SyncCommand::Fail),
            b"STAT" => Some(SyncCommand::Stat),
            b"QUIT" => Some(SyncCommand::Quit),
            _ => None,
        }
    }
}

impl fmt::Display for SyncCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.code()))
    }
}

/// Encode `<id><u32 LE len><payload>`.
pub fn encode_sync_frame(cmd: SyncCommand, payload: &[u8]) -> Result<BytesMut> {
    let len = u32::try_from(payload.len())
        .map_err(|_| AdbError::protocol(format!("{} payload too large", cmd)))?;
    let mut buf = BytesMut::with_capacity(8 + payload.len());
    buf.put_slice(cmd.code());
    buf.put_u32_le(len);
    buf.put_slice(payload);
    Ok(buf)
}

/// Encode `<id><u32 LE value>`, the shape of `DONE <mtime>` and bare status frames.
pub fn encode_sync_status(cmd: SyncCommand, value: u32) -> BytesMut {
    let mut buf = BytesMut::with_capacity(8);
    buf.put_slice(cmd.code());
    buf.put_u32_le(value);
    buf
}

/// Argument of a `SEND` request: `<remote-path>,<decimal-mode>`.
pub fn send_argument(remote_path: &str, mode: u32) -> String {
    format!("{},{}", remote_path, mode)
}

/// Shell v2 message ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellMessageId {
    Stdin,
    Stdout,
    Stderr,
    Exit,
    CloseStdin,
    WindowSizeChange,
    Invalid(u8),
}

impl ShellMessageId {
    pub fn from_byte(b: u8) -> Self {
        match b {
            0 => ShellMessageId::Stdin,
            1 => ShellMessageId::Stdout,
            2 => ShellMessageId::Stderr,
            3 => ShellMessageId::Exit,
            4 => ShellMessageId::CloseStdin,
            5 => ShellMessageId::WindowSizeChange,
            other => ShellMessageId::Invalid(other),
        }
    }

    pub fn as_byte(&self) -> u8 {
        match self {
            ShellMessageId::Stdin => 0,
            ShellMessageId::Stdout => 1,
            ShellMessageId::Stderr => 2,
            ShellMessageId::Exit => 3,
            ShellMessageId::CloseStdin => 4,
            ShellMessageId::WindowSizeChange => 5,
            ShellMessageId::Invalid(b) => *b,
        }
    }
}

pub fn encode_shell_frame(id: ShellMessageId, payload: &[u8]) -> Result<BytesMut> {
    let len = u32::try_from(payload.len())
        .map_err(|_| AdbError::protocol("shell payload too large"))?;
    let mut buf = BytesMut::with_capacity(5 + payload.len());
    buf.put_u8(id.as_byte());
    buf.put_u32_le(len);
    buf.put_slice(payload);
    Ok(buf)
}

/// One entry of a `LIST` reply, or the result of a `STAT`.
///
/// The all-zero value marks the end of a listing and never reaches callers
/// of [`crate::Device::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub mode: u32,
    pub size: u32,
    pub mtime: u32,
    pub name: String,
}

impl DirectoryEntry {
    pub fn is_end(&self) -> bool {
        self.mode == 0 && self.size == 0 && self.mtime == 0 && self.name.is_empty()
    }

    pub fn is_dir(&self) -> bool {
        (self.mode & S_IFMT) == S_IFDIR
    }

    pub fn is_file(&self) -> bool {
        (self.mode & S_IFMT) == S_IFREG
    }

    pub fn is_symlink(&self) -> bool {
        (self.mode & S_IFMT) == S_IFLNK
    }

    pub fn modified(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::from(self.mtime), 0)
    }

    pub fn file_type(&self) -> &'static str {
        match self.mode & S_IFMT {
            S_IFIFO => "fifo",
            S_IFCHR => "char",
            S_IFDIR => "directory",
            S_IFBLK => "block",
            S_IFREG => "file",
            S_IFLNK => "symlink",
            S_IFSOCK => "socket",
            _ => "unknown",
        }
    }

    /// `ls -l` style mode string, e.g. `drwxr-x--x`.
    pub fn permissions_string(&self) -> String {
        let mode = self.mode;
        let file_type = match mode & S_IFMT {
            S_IFIFO => 'p',
            S_IFCHR => 'c',
            S_IFDIR => 'd',
            S_IFBLK => 'b',
            S_IFREG => '-',
            S_IFLNK => 'l',
            S_IFSOCK => 's',
            _ => '?',
        };

        let mut out = String::with_capacity(10);
        out.push(file_type);
        out.push_str(&permission_triplet(mode >> 6, mode & 0o4000 != 0, 's'));
        out.push_str(&permission_triplet(mode >> 3, mode & 0o2000 != 0, 's'));
        out.push_str(&permission_triplet(mode, mode & 0o1000 != 0, 't'));
        out
    }
}

fn permission_triplet(bits: u32, special: bool, special_char: char) -> String {
    let mut triplet = String::with_capacity(3);
    triplet.push(if bits & 4 != 0 { 'r' } else { '-' });
    triplet.push(if bits & 2 != 0 { 'w' } else { '-' });
    triplet.push(match (bits & 1 != 0, special) {
        (false, false) => '-',
        (true, false) => 'x',
        (false, true) => special_char.to_ascii_uppercase(),
        (true, true) => special_char,
    });
    triplet
}

//! Client for the Android Debug Bridge wire protocol.
//!
//! Talks to the local ADB server over TCP and, through a transport
//! handshake, to the daemon on a device: host commands, the sync file
//! transfer protocol, shell v2 sessions and cancellable raw streams.

pub mod adb;
pub mod client;
pub mod config;
pub mod device;
pub mod error;
pub mod types;

pub use adb::{
    CancelableStreamReader, Connection, DirectoryEntry, Shell, ShellMessageId, ShellTransport,
    SyncCommand, SyncTransport, Transport, TransportTarget,
};
pub use client::Client;
pub use config::ClientConfig;
pub use device::Device;
pub use error::{AdbError, Result};
pub use types::{DeviceForward, DeviceInfo, DeviceState, ForwardOptions, Port, PushOptions};

#[cfg(test)]
pub mod testing;

pub mod cancel;
pub mod connection;
pub mod protocol;
pub mod shell;
pub mod sync;

pub use cancel::CancelableStreamReader;
pub use connection::{Connection, Transport, TransportTarget};
pub use protocol::{DirectoryEntry, ShellMessageId, SyncCommand};
pub use shell::{Shell, ShellTransport};
pub use sync::SyncTransport;

#[cfg(test)]
mod protocol_test;

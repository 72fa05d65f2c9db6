use crate::adb::connection::AdbStream;
use crate::adb::protocol::{self, ShellMessageId, SHELL_PAYLOAD_MAX};
use crate::error::{AdbError, Result};
use bytes::Bytes;
use log::*;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWriteExt, DuplexStream, ReadBuf};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Shell v2 framing on a socket whose `shell,v2:` request was accepted.
pub struct ShellTransport {
    stream: AdbStream,
}

impl ShellTransport {
    pub(crate) fn new(stream: AdbStream) -> Self {
        Self { stream }
    }

    /// Read one `<id><u32 LE len><payload>` message. A closed or reset
    /// socket surfaces as an I/O error; both mean the session is over.
    pub async fn read(&mut self) -> Result<(ShellMessageId, Bytes)> {
        let mut header = [0u8; 5];
        self.stream.read_exact(&mut header).await?;
        let id = ShellMessageId::from_byte(header[0]);
        let len = u32::from_le_bytes([header[1], header[2], header[3], header[4]]) as usize;
        if len > SHELL_PAYLOAD_MAX {
            return Err(AdbError::protocol(format!(
                "shell {:?} frame of {} bytes exceeds {}",
                id, len, SHELL_PAYLOAD_MAX
            )));
        }

        let mut payload = vec![0u8; len];
        self.stream.read_exact(&mut payload).await?;
        if self.stream.debug() {
            debug!("shell <-- {:?} ({} bytes)", id, len);
        }
        Ok((id, Bytes::from(payload)))
    }

    /// Send one message, e.g. stdin data or `CloseStdin`.
    pub async fn write(&mut self, id: ShellMessageId, payload: &[u8]) -> Result<()> {
        let frame = protocol::encode_shell_frame(id, payload)?;
        self.stream.write_all(&frame).await
    }

    /// Tear down the socket. The daemon kills the running command when its
    /// end of the socket goes away; there is no separate kill message.
    pub async fn close(&mut self) -> Result<()> {
        self.stream.close().await
    }
}

/// A running remote command.
///
/// Reading yields stdout and stderr combined in arrival order and ends when
/// the command exits, the socket fails, or [`Shell::close`] is called.
/// Dropping the `Shell` also stops the command.
pub struct Shell {
    output: DuplexStream,
    stop: Option<oneshot::Sender<()>>,
    exit: Option<oneshot::Receiver<u8>>,
    exit_status: Option<u8>,
    pump: Option<JoinHandle<()>>,
}

impl Shell {
    /// Start the demultiplexer task for `transport`. `capacity` bounds how
    /// many output bytes may wait for the reader before the task blocks.
    pub fn spawn(transport: ShellTransport, capacity: usize) -> Self {
        let (output, sink) = tokio::io::duplex(capacity.max(1));
        let (stop_tx, stop_rx) = oneshot::channel();
        let (exit_tx, exit_rx) = oneshot::channel();

        let pump = tokio::spawn(demultiplex(transport, sink, stop_rx, exit_tx));

        Self {
            output,
            stop: Some(stop_tx),
            exit: Some(exit_rx),
            exit_status: None,
            pump: Some(pump),
        }
    }

    /// Stop the remote command by closing its socket, then wait for the
    /// demultiplexer to finish. Calling it again does nothing.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(pump) = self.pump.take() {
            if let Err(e) = pump.await {
                warn!("shell demultiplexer ended abnormally: {}", e);
            }
        }
        Ok(())
    }

    /// Exit status reported by the daemon, once the output has ended.
    /// `None` when the session ended any other way.
    pub fn exit_status(&mut self) -> Option<u8> {
        if self.exit_status.is_none() {
            if let Some(rx) = self.exit.as_mut() {
                match rx.try_recv() {
                    Ok(code) => {
                        self.exit_status = Some(code);
                        self.exit = None;
                    }
                    Err(oneshot::error::TryRecvError::Closed) => self.exit = None,
                    Err(oneshot::error::TryRecvError::Empty) => {}
                }
            }
        }
        self.exit_status
    }
}

impl AsyncRead for Shell {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().output).poll_read(cx, buf)
    }
}

enum Step {
    Continue,
    Exited(u8),
    Finished,
}

async fn forward_one(transport: &mut ShellTransport, sink: &mut DuplexStream) -> Step {
    let (id, data) = match transport.read().await {
        Ok(message) => message,
        Err(e) => {
            if e.is_disconnect() {
                debug!("shell stream closed: {}", e);
            } else {
                warn!("shell stream failed: {}", e);
            }
            return Step::Finished;
        }
    };

    match id {
        ShellMessageId::Stdout | ShellMessageId::Stderr => {
            if !data.is_empty() && sink.write_all(&data).await.is_err() {
                debug!("shell reader went away");
                return Step::Finished;
            }
            Step::Continue
        }
        ShellMessageId::Exit => match data.first() {
            Some(&code) => Step::Exited(code),
            None => {
                warn!("exit message without a status byte");
                Step::Finished
            }
        },
        ShellMessageId::CloseStdin => Step::Continue,
        other => {
            trace!("ignoring shell message {:?}", other);
            Step::Continue
        }
    }
}

/// Sole reader of the transport and sole writer of the output pipe. Ends
/// the pipe exactly once, whatever stopped the session.
async fn demultiplex(
    mut transport: ShellTransport,
    mut sink: DuplexStream,
    mut stop: oneshot::Receiver<()>,
    exit: oneshot::Sender<u8>,
) {
    loop {
        let step = tokio::select! {
            _ = &mut stop => {
                debug!("shell closed by caller");
                Step::Finished
            }
            step = forward_one(&mut transport, &mut sink) => step,
        };

        match step {
            Step::Continue => {}
            Step::Exited(code) => {
                debug!("remote command exited with {}", code);
                let _ = exit.send(code);
                break;
            }
            Step::Finished => break,
        }
    }

    let _ = transport.close().await;
    let _ = sink.shutdown().await;
}

use log::*;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWriteExt, ReadBuf};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

/// Raw device output (e.g. `shell:logcat`) that ends as soon as a
/// cancellation token fires.
///
/// The write half of the socket lives in a watcher task that shuts it down
/// the moment the token fires, whether or not anyone is reading, so the
/// daemon sees the close right away. Reads race the socket against the
/// token; once the token wins the read half is dropped as well and all
/// later reads report end-of-stream.
pub struct CancelableStreamReader {
    socket: Option<OwnedReadHalf>,
    token: CancellationToken,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
    _release: oneshot::Sender<()>,
}

impl CancelableStreamReader {
    /// Must be called inside a tokio runtime.
    pub fn new(socket: TcpStream, token: CancellationToken) -> Self {
        let (reader, mut writer) = socket.into_split();
        let (release, released) = oneshot::channel::<()>();

        let watched = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = watched.cancelled() => {
                    debug!("stream cancelled, closing socket");
                    if let Err(e) = writer.shutdown().await {
                        trace!("shutdown after cancel failed: {}", e);
                    }
                }
                // reader dropped; the write half closes with this task
                _ = released => {}
            }
        });

        let cancelled = Box::pin(token.clone().cancelled_owned());
        Self {
            socket: Some(reader),
            token,
            cancelled,
            _release: release,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// True once the socket has been released because of cancellation.
    pub fn is_closed(&self) -> bool {
        self.socket.is_none()
    }
}

impl AsyncRead for CancelableStreamReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        if this.socket.is_none() {
            return Poll::Ready(Ok(()));
        }

        if this.cancelled.as_mut().poll(cx).is_ready() {
            this.socket = None;
            return Poll::Ready(Ok(()));
        }

        match this.socket.as_mut() {
            Some(socket) => Pin::new(socket).poll_read(cx, buf),
            None => Poll::Ready(Ok(())),
        }
    }
}

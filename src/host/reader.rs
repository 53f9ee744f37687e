use anyhow::Result;
use tokio::{io::AsyncRead, sync::mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{codec::read_frame, protocol::HostMessage};

/// Turns the browser's byte stream into [HostMessage]s for the dispatcher.
pub struct MessageReader<R> {
    input: R,
    next: mpsc::Sender<HostMessage>,
    shutdown: CancellationToken,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(input: R, next: mpsc::Sender<HostMessage>, shutdown: CancellationToken) -> Self {
        Self {
            input,
            next,
            shutdown,
        }
    }

    /// Executes the reader loop. Ends when the browser disconnects, the stream breaks or a
    /// shutdown is requested. Returning drops the sender, which lets the dispatcher drain what
    /// was already queued and stop.
    pub async fn run(mut self) -> Result<()> {
        loop {
            let frame = tokio::select! {
                _ = self.shutdown.cancelled() => return Ok(()),
                frame = read_frame(&mut self.input) => frame,
            };

            let payload = match frame {
                Ok(Some(payload)) => payload,
                Ok(None) => {
                    info!("Browser closed the connection");
                    self.shutdown.cancel();
                    return Ok(());
                }
                Err(e) => {
                    error!("Unreadable input from browser {e:?}");
                    self.shutdown.cancel();
                    return Err(e);
                }
            };

            match serde_json::from_slice::<HostMessage>(&payload) {
                Ok(message) => {
                    debug!("Received {:?}", message);
                    self.next
                        .send(message)
                        .await
                        .inspect_err(|e| error!("Dispatcher is gone {e:?}"))?;
                }
                Err(e) => {
                    warn!(
                        "Ignoring malformed message {}: {e}",
                        String::from_utf8_lossy(&payload)
                    )
                }
            }
        }
    }
}

use std::time::Duration;

use anyhow::Result;
use tokio::{io::AsyncWrite, sync::mpsc::Receiver};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::{
    storage::stats_storage::StatsStore,
    tracker::{tabs::WINDOW_ID_NONE, SessionTracker},
    utils::clock::Clock,
};

use super::{
    codec::write_message,
    protocol::{HostMessage, HostResponse, TabStatus},
    registry::TabRegistry,
};

/// Applies messages to the tracker strictly one after another. Nothing else touches the tracker,
/// which is what makes every handler atomic with respect to the others.
pub struct EventDispatcher<S, W> {
    receiver: Receiver<HostMessage>,
    tracker: SessionTracker<TabRegistry, S>,
    output: W,
    shutdown: CancellationToken,
    save_interval: Duration,
    time_provider: Box<dyn Clock>,
    initialized: bool,
}

impl<S: StatsStore, W: AsyncWrite + Unpin> EventDispatcher<S, W> {
    pub fn new(
        receiver: Receiver<HostMessage>,
        tracker: SessionTracker<TabRegistry, S>,
        output: W,
        shutdown: CancellationToken,
        save_interval: Duration,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            receiver,
            tracker,
            output,
            shutdown,
            save_interval,
            time_provider,
            initialized: false,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        let mut save_point = self.time_provider.instant() + self.save_interval;
        loop {
            tokio::select! {
                // Queued messages go first so a disconnect never loses the tail of the stream.
                biased;
                message = self.receiver.recv() => {
                    let Some(message) = message else {
                        break;
                    };
                    if let Err(e) = self.handle(message).await {
                        error!("Failed to handle message {e:?}");
                    }
                }
                _ = self.shutdown.cancelled() => break,
                _ = self.time_provider.sleep_until(save_point) => {
                    save_point += self.save_interval;
                    self.tracker.persist_snapshot().await;
                }
            }
        }

        info!("Stopping, flushing totals");
        self.ensure_initialized().await;
        self.tracker.suspend().await;
        self.receiver.close();
        Ok(())
    }

    /// Totals are loaded before the first message is applied, even if the extension skipped the
    /// `started` handshake.
    async fn ensure_initialized(&mut self) {
        if !self.initialized {
            self.initialized = true;
            self.tracker.init().await;
        }
    }

    #[instrument(skip(self))]
    async fn handle(&mut self, message: HostMessage) -> Result<()> {
        match message {
            HostMessage::Started {
                tabs,
                focused_window_id,
            } => {
                self.tracker.tabs_mut().replace_all(tabs, focused_window_id);
                if self.initialized {
                    self.tracker.start_tracking_active_tab().await;
                } else {
                    self.ensure_initialized().await;
                }
            }
            HostMessage::TabActivated { tab_id, window_id } => {
                self.ensure_initialized().await;
                self.tracker.tabs_mut().activate(tab_id, window_id);
                self.tracker.switch_to_tab(tab_id).await;
            }
            HostMessage::TabUpdated {
                tab_id,
                status,
                tab,
            } => {
                self.ensure_initialized().await;
                let active = tab.active;
                self.tracker.tabs_mut().upsert(tab);
                if status == Some(TabStatus::Complete) && active {
                    self.tracker.switch_to_tab(tab_id).await;
                } else {
                    debug!("Ignoring update of tab {tab_id}");
                }
            }
            HostMessage::TabRemoved { tab_id } => {
                self.ensure_initialized().await;
                self.tracker.tabs_mut().remove(tab_id);
                self.tracker.tab_removed(tab_id);
            }
            HostMessage::FocusChanged { window_id } => {
                self.ensure_initialized().await;
                let focused = (window_id != WINDOW_ID_NONE).then_some(window_id);
                self.tracker.tabs_mut().focus(focused);
                self.tracker.focus_changed(focused).await;
            }
            HostMessage::Suspend => {
                self.ensure_initialized().await;
                self.tracker.suspend().await;
            }
            HostMessage::GetStats { request_id } => {
                self.ensure_initialized().await;
                let stats = self.tracker.current_stats().await;
                debug!("Sending stats {:?}", stats);
                write_message(
                    &mut self.output,
                    &HostResponse::Stats { request_id, stats },
                )
                .await?;
            }
            HostMessage::ResetStats { request_id } => {
                self.ensure_initialized().await;
                self.tracker.reset_stats().await;
                write_message(
                    &mut self.output,
                    &HostResponse::Reset {
                        request_id,
                        success: true,
                    },
                )
                .await?;
            }
        }
        Ok(())
    }
}

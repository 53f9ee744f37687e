use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use dispatcher::EventDispatcher;
use protocol::HostMessage;
use reader::MessageReader;
use registry::TabRegistry;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::{
    storage::stats_storage::{JsonStatsStore, StatsStore},
    tracker::{SessionTracker, TrackerConfig},
    utils::clock::{Clock, DefaultClock},
};

pub mod args;
pub mod codec;
pub mod dispatcher;
pub mod protocol;
pub mod reader;
pub mod registry;
pub mod shutdown;

pub const DEFAULT_SAVE_INTERVAL: Duration = Duration::from_secs(30);

const MESSAGE_BUFFER: usize = 32;

/// Directory under the application path that holds [JsonStatsStore] files.
pub const STATS_DIR: &str = "stats";

#[derive(Debug, Clone, Copy)]
pub struct HostSettings {
    pub save_interval: Duration,
    pub tracker: TrackerConfig,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            save_interval: DEFAULT_SAVE_INTERVAL,
            tracker: TrackerConfig::default(),
        }
    }
}

/// Represents the starting point for the host. Talks to the browser over stdin/stdout until
/// either side goes away.
pub async fn start_host(dir: PathBuf, settings: HostSettings) -> Result<()> {
    let store = JsonStatsStore::new(dir.join(STATS_DIR))?;
    let (sender, receiver) = mpsc::channel::<HostMessage>(MESSAGE_BUFFER);

    let shutdown_token = CancellationToken::new();

    let reader = create_reader(tokio::io::stdin(), sender, &shutdown_token);

    let dispatcher = create_dispatcher(
        receiver,
        store,
        tokio::io::stdout(),
        &shutdown_token,
        settings,
        DefaultClock,
    );

    let (_, reader_result, dispatcher_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        reader.run(),
        dispatcher.run(),
    );

    if let Err(reader_result) = reader_result {
        error!("Reader got an error {:?}", reader_result);
    }

    if let Err(dispatcher_result) = dispatcher_result {
        error!("Dispatcher got an error {:?}", dispatcher_result);
    }

    Ok(())
}

fn create_reader<R: AsyncRead + Unpin>(
    input: R,
    sender: mpsc::Sender<HostMessage>,
    shutdown_token: &CancellationToken,
) -> MessageReader<R> {
    MessageReader::new(input, sender, shutdown_token.clone())
}

fn create_dispatcher<S: StatsStore, W: AsyncWrite + Unpin>(
    receiver: mpsc::Receiver<HostMessage>,
    store: S,
    output: W,
    shutdown_token: &CancellationToken,
    settings: HostSettings,
    clock: impl Clock + Clone,
) -> EventDispatcher<S, W> {
    let tracker = SessionTracker::new(
        TabRegistry::default(),
        store,
        Box::new(clock.clone()),
        settings.tracker,
    );
    EventDispatcher::new(
        receiver,
        tracker,
        output,
        shutdown_token.clone(),
        settings.save_interval,
        Box::new(clock),
    )
}

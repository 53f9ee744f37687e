use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use fs4::tokio::AsyncFileExt;
#[cfg(test)]
use mockall::automock;
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::debug;

use crate::{
    tracker::totals::{DailyTotals, HostSeconds},
    utils::time::date_to_record_name,
};

use super::entities::{HistoryDayEntity, StoredStatsEntity};

const STATE_FILE: &str = "stats.json";
const HISTORY_DIR: &str = "history";

/// Interface for abstracting durable storage of daily totals.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Reads the live totals. Missing storage reads as empty.
    async fn load(&self) -> Result<StoredStatsEntity>;

    /// Replaces the live totals with `totals`, including the day they belong to.
    async fn save(&self, totals: DailyTotals) -> Result<()>;

    /// Keeps a finished day around after the live totals moved on.
    async fn archive(&self, totals: DailyTotals) -> Result<()>;

    /// Totals recorded for `day`, whether it is the live day or an archived one.
    async fn load_day(&self, day: NaiveDate) -> Result<Option<HostSeconds>>;

    /// Forgets the live totals. History is kept.
    async fn clear(&self) -> Result<()>;
}

/// The main realization of [StatsStore].
pub struct JsonStatsStore {
    dir: PathBuf,
}

impl JsonStatsStore {
    pub fn new(dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(dir.join(HISTORY_DIR))?;

        Ok(Self { dir })
    }

    fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    fn history_path(&self, day: NaiveDate) -> PathBuf {
        self.dir
            .join(HISTORY_DIR)
            .join(format!("{}.json", date_to_record_name(day)))
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        async fn extract(path: &Path) -> std::result::Result<String, std::io::Error> {
            debug!("Reading {path:?}");
            let mut file = File::open(path).await?;
            file.lock_shared()?;
            let mut contents = String::new();
            let result = file.read_to_string(&mut contents).await;
            file.unlock_async().await?;
            result?;
            Ok(contents)
        }

        let contents = match extract(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {path:?}"))?,
        };

        // A file that was created but never written to.
        if contents.trim().is_empty() {
            return Ok(None);
        }

        let value = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {path:?}"))?;
        Ok(Some(value))
    }

    async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
        let buffer = serde_json::to_vec_pretty(value)?;

        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .await
            .with_context(|| format!("Failed to open {path:?}"))?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = Self::overwrite(&mut file, &buffer).await;
        file.unlock_async().await?;
        result.with_context(|| format!("Failed to write {path:?}"))
    }

    /// Truncation happens under the lock so readers never see a half replaced file.
    async fn overwrite(file: &mut File, buffer: &[u8]) -> Result<()> {
        file.set_len(0).await?;
        file.rewind().await?;
        file.write_all(buffer).await?;
        file.flush().await?;
        file.sync_data().await?;
        Ok(())
    }
}

#[async_trait]
impl StatsStore for JsonStatsStore {
    async fn load(&self) -> Result<StoredStatsEntity> {
        Ok(Self::read_json(&self.state_path())
            .await?
            .unwrap_or_default())
    }

    async fn save(&self, totals: DailyTotals) -> Result<()> {
        Self::write_json(&self.state_path(), &StoredStatsEntity::from(totals)).await
    }

    async fn archive(&self, totals: DailyTotals) -> Result<()> {
        let path = self.history_path(totals.day);
        Self::write_json(&path, &HistoryDayEntity::from(totals)).await
    }

    async fn load_day(&self, day: NaiveDate) -> Result<Option<HostSeconds>> {
        let live = self.load().await?;
        if live.last_active_date == Some(day) {
            return Ok(Some(live.daily_totals));
        }
        let archived: Option<HistoryDayEntity> = Self::read_json(&self.history_path(day)).await?;
        Ok(archived.map(|v| v.daily_totals))
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(self.state_path()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::tracker::totals::HostSeconds;

pub const INSIGHTS_FALLBACK: &str = "Unable to generate insights. Please check your API key.";

/// What the user wrote about their day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflection {
    pub highlight: String,
    pub trade: String,
}

impl Reflection {
    pub fn is_blank(&self) -> bool {
        self.highlight.trim().is_empty() && self.trade.trim().is_empty()
    }
}

/// Produces a short markdown commentary with `**Story**`, `**Insights**` and `**Tomorrow**`
/// sections for a day of totals.
#[async_trait]
pub trait InsightsProvider: Send + Sync {
    async fn generate(
        &self,
        stats: &HostSeconds,
        reflection: Option<&Reflection>,
    ) -> Result<String>;
}

pub async fn insights_or_fallback(
    provider: &dyn InsightsProvider,
    stats: &HostSeconds,
    reflection: Option<&Reflection>,
) -> String {
    match provider.generate(stats, reflection).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            warn!("Insights provider returned nothing");
            INSIGHTS_FALLBACK.to_string()
        }
        Err(e) => {
            warn!("Failed to generate insights {e:?}");
            INSIGHTS_FALLBACK.to_string()
        }
    }
}

/// Fixed commentary used when no remote provider is configured.
pub struct OfflineInsights;

const REFLECTIVE_TEXT: &str = "**Story**
Your reflection shows a thoughtful approach to your digital day. You've identified what worked well and what didn't, which is the first step to building better habits.

**Insights**
➜ Your awareness of time trade-offs shows growing digital mindfulness
➜ Highlighting positive moments helps reinforce productive patterns

**Tomorrow**
Try: Start your day by reviewing yesterday's reflection before opening any apps.";

const DEFAULT_TEXT: &str = "**Story**
You spent most of your digital day in productivity mode, with occasional creative breaks. A balanced approach to screen time that shows intention behind your clicks.

**Insights**
➜ Peak focus happened during morning hours
➜ Social apps used strategically, not compulsively

**Tomorrow**
Try: Block the first hour for deep work without any notifications.";

#[async_trait]
impl InsightsProvider for OfflineInsights {
    async fn generate(
        &self,
        _stats: &HostSeconds,
        reflection: Option<&Reflection>,
    ) -> Result<String> {
        let reflective = reflection.is_some_and(|r| !r.is_blank());
        Ok(if reflective { REFLECTIVE_TEXT } else { DEFAULT_TEXT }.to_string())
    }
}

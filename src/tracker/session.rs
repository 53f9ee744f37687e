use chrono::{DateTime, Utc};

use super::tabs::TabId;

/// The single interval currently being attributed to a site.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Idle,
    Tracking {
        tab_id: TabId,
        /// Host at the moment tracking started. The credited host is always re-derived from the
        /// tab when the session closes.
        host: String,
        started_at: DateTime<Utc>,
    },
}

impl Session {
    pub fn is_idle(&self) -> bool {
        matches!(self, Session::Idle)
    }

    pub fn tab_id(&self) -> Option<TabId> {
        match self {
            Session::Idle => None,
            Session::Tracking { tab_id, .. } => Some(*tab_id),
        }
    }

    pub fn host(&self) -> Option<&str> {
        match self {
            Session::Idle => None,
            Session::Tracking { host, .. } => Some(host),
        }
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Session::Idle => None,
            Session::Tracking { started_at, .. } => Some(*started_at),
        }
    }

    /// Leaves `Idle` behind and returns what was tracked.
    pub fn take(&mut self) -> Session {
        std::mem::take(self)
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Watch status of a title inside one playlist
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    #[default]
    ToWatch,
    Watching,
    Watched,
}

impl WatchStatus {
    pub const ALL: [WatchStatus; 3] = [WatchStatus::ToWatch, WatchStatus::Watching, WatchStatus::Watched];

    pub fn as_str(&self) -> &'static str {
        match self {
            WatchStatus::ToWatch => "to_watch",
            WatchStatus::Watching => "watching",
            WatchStatus::Watched => "watched",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WatchStatus::ToWatch => "To Watch",
            WatchStatus::Watching => "Watching",
            WatchStatus::Watched => "Watched",
        }
    }

    pub fn is_watched(&self) -> bool {
        matches!(self, WatchStatus::Watched)
    }
}

impl fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status string outside the three known values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidStatus(pub String);

impl fmt::Display for InvalidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid watch status '{}': expected to_watch, watching or watched", self.0)
    }
}

impl std::error::Error for InvalidStatus {}

impl FromStr for WatchStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "to_watch" => Ok(WatchStatus::ToWatch),
            "watching" => Ok(WatchStatus::Watching),
            "watched" => Ok(WatchStatus::Watched),
            _ => Err(InvalidStatus(s.to_string())),
        }
    }
}

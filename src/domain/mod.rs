//! Domain primitives for the favorites list.
//!
//! Newtype ids keep internal row ids and catalog ids from being mixed up, and
//! [`WatchStatus`] is the one place that knows every spelling of a list status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Internal identifier of a favorite row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FavoriteId(i32);

impl FavoriteId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for FavoriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for FavoriteId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl From<FavoriteId> for i32 {
    fn from(id: FavoriteId) -> Self {
        id.0
    }
}

/// MyAnimeList id of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MalId(i32);

impl MalId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for MalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for MalId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl Serialize for MalId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.0)
    }
}

/// Where an anime sits in a user's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WatchStatus {
    #[default]
    ToWatch,
    Watching,
    Completed,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown watch status '{0}', expected one of: to_watch, watching, completed")]
pub struct ParseWatchStatusError(pub String);

impl WatchStatus {
    /// Canonical wire and storage form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ToWatch => "to_watch",
            Self::Watching => "watching",
            Self::Completed => "completed",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ToWatch => "To watch",
            Self::Watching => "Watching",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatchStatus {
    type Err = ParseWatchStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();

        // French spellings are what the original web client stored.
        match normalized.as_str() {
            "to_watch" | "to-watch" | "towatch" | "watchlist" | "à regarder" | "a regarder" => {
                Ok(Self::ToWatch)
            }
            "watching" | "en cours" => Ok(Self::Watching),
            "completed" | "terminé" | "termine" => Ok(Self::Completed),
            _ => Err(ParseWatchStatusError(s.to_string())),
        }
    }
}

impl Serialize for WatchStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for WatchStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

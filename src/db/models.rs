// Data models
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Watch-progress label for a playlist. A user-chosen tag, never derived
/// from the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaylistStatus {
    Planned,
    Watching,
    Completed,
}

impl PlaylistStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaylistStatus::Planned => "Planned",
            PlaylistStatus::Watching => "Watching",
            PlaylistStatus::Completed => "Completed",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "Planned" => Some(PlaylistStatus::Planned),
            "Watching" => Some(PlaylistStatus::Watching),
            "Completed" => Some(PlaylistStatus::Completed),
            _ => None,
        }
    }
}

impl ToSql for PlaylistStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PlaylistStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let label = value.as_str()?;
        PlaylistStatus::parse(label)
            .ok_or_else(|| FromSqlError::Other(format!("unknown playlist status: {label}").into()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub playlist_id: i64,
    pub title: String,
    /// Filesystem root the playlist was scanned from. Not re-validated
    /// after creation.
    pub path: String,
    pub status: PlaylistStatus,
    /// Snapshot taken at import time, not re-derived from row counts.
    pub total_video_count: i64,
    pub watched_count: i64,
    /// User-entered estimate.
    pub total_time_hour: i64,
    pub creation_date_time: String,
    pub updating_date_time: Option<String>,
    pub last_watched_date_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub video_id: i64,
    pub playlist_id: i64,
    pub path: String,
    pub is_watched: bool,
    /// Reserved playback offset; no consumer yet.
    pub resume_time: Option<i64>,
}

impl Video {
    /// File name component of the path, for display.
    pub fn file_name(&self) -> &str {
        Path::new(&self.path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.path)
    }
}

/// Singleton settings row (id fixed to 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    pub os: String,
    /// Resolved filesystem path of the default player, empty when unset.
    pub default_media_player: String,
    pub last_watched_playlist_id: Option<i64>,
    pub last_watched_video_id: Option<i64>,
}

/// One known media player whose executable exists on this machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaPlayerEntry {
    pub name: String,
    pub path: String,
}

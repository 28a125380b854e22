// Settings management and persistence
use log::info;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::db::connection::DatabaseConnection;
use crate::db::error::DbError;
use crate::db::models::MediaPlayerEntry;
use crate::db::operations::DbOperations;

/// Built-in media player candidates with their usual install locations.
/// Only the ones whose path exists on this machine end up in the
/// MediaPlayerPath table.
#[cfg(target_os = "windows")]
pub const PLAYER_CANDIDATES: &[(&str, &str)] = &[
    ("VLC", "C:\\Program Files\\VideoLAN\\VLC\\vlc.exe"),
    ("MPV", "C:\\Program Files\\mpv\\mpv.exe"),
    (
        "Windows Media Player (WMP)",
        "C:\\Program Files\\Windows Media Player\\wmplayer.exe",
    ),
    ("PotPlayer", "C:\\Program Files\\DAUM\\PotPlayer\\PotPlayer.exe"),
    ("KMPlayer", "C:\\Program Files\\KMPlayer\\KMPlayer.exe"),
    ("MPlayer", "C:\\Program Files\\MPlayer\\mplayer.exe"),
    ("SM Player", "C:\\Program Files\\SMPlayer\\smplayer.exe"),
    ("Media Player Classic", "C:\\Program Files\\MPC-HC\\mpc-hc64.exe"),
    ("GOM Player", "C:\\Program Files\\GRETECH\\GOM Player\\GOM.exe"),
];

#[cfg(not(target_os = "windows"))]
pub const PLAYER_CANDIDATES: &[(&str, &str)] = &[
    ("VLC", "/usr/bin/vlc"),
    ("MPV", "/usr/bin/mpv"),
    ("MPlayer", "/usr/bin/mplayer"),
    ("SM Player", "/usr/bin/smplayer"),
    ("GNOME Videos", "/usr/bin/totem"),
];

#[derive(Debug, Error)]
pub enum SettingsError {
    /// The requested player name is not in the known-player table.
    #[error("unknown media player: {0}")]
    UnknownPlayer(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Facade over the settings surface: default player selection, the
/// known-player table, and database backup/restore.
pub struct SettingsManager {
    db: DatabaseConnection,
}

impl SettingsManager {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Resolved default player path, `None` while unset.
    pub fn default_player_path(&self) -> Result<Option<String>, SettingsError> {
        let settings = DbOperations::get_general(&self.db)?;
        Ok(Some(settings.default_media_player).filter(|path| !path.is_empty()))
    }

    /// Resolve a player name against the known-player table and persist
    /// its path as the default.
    pub fn set_default_player(&self, name: &str) -> Result<(), SettingsError> {
        let path = DbOperations::get_player_path(&self.db, name)?
            .ok_or_else(|| SettingsError::UnknownPlayer(name.to_string()))?;
        DbOperations::set_default_player_path(&self.db, &path)?;
        info!("default media player set to {name} ({path})");
        Ok(())
    }

    /// Rebuild the known-player table from the built-in candidates.
    pub fn refresh_known_players(&self) -> Result<Vec<MediaPlayerEntry>, SettingsError> {
        self.refresh_players_from(PLAYER_CANDIDATES)
    }

    /// Filter `candidates` to those whose path exists on the local
    /// filesystem and replace the known-player table with the result. A
    /// full replace, not a diff: the table always reflects the filesystem
    /// as it is right now.
    pub fn refresh_players_from(
        &self,
        candidates: &[(&str, &str)],
    ) -> Result<Vec<MediaPlayerEntry>, SettingsError> {
        let present: Vec<MediaPlayerEntry> = candidates
            .iter()
            .filter(|(_, path)| Path::new(path).exists())
            .map(|(name, path)| MediaPlayerEntry {
                name: (*name).to_string(),
                path: (*path).to_string(),
            })
            .collect();

        DbOperations::replace_media_players(&self.db, &present)?;
        info!(
            "known media players refreshed: {} of {} candidates present",
            present.len(),
            candidates.len()
        );
        Ok(present)
    }

    pub fn known_players(&self) -> Result<Vec<MediaPlayerEntry>, SettingsError> {
        Ok(DbOperations::get_media_players(&self.db)?)
    }

    /// Copy the live database to a timestamped backup file beside it.
    pub fn create_backup(&self) -> Result<PathBuf, SettingsError> {
        Ok(self.db.backup()?)
    }

    /// Overwrite the live database with a previously created backup. The
    /// current state is backed up first.
    pub fn restore_backup(&self, archive: &Path) -> Result<(), SettingsError> {
        Ok(self.db.restore(archive)?)
    }
}

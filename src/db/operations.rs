use chrono::Local;
use log::{debug, info};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::connection::DatabaseConnection;
use crate::db::error::DbError;
use crate::db::models::{GeneralSettings, MediaPlayerEntry, Playlist, PlaylistStatus, Video};

/// Database operations for playlist and watched-state management
pub struct DbOperations;

fn map_playlist_row(row: &Row) -> rusqlite::Result<Playlist> {
    Ok(Playlist {
        playlist_id: row.get(0)?,
        title: row.get(1)?,
        path: row.get(2)?,
        status: row.get(3)?,
        total_video_count: row.get(4)?,
        watched_count: row.get(5)?,
        total_time_hour: row.get(6)?,
        creation_date_time: row.get(7)?,
        updating_date_time: row.get(8)?,
        last_watched_date_time: row.get(9)?,
    })
}

fn map_video_row(row: &Row) -> rusqlite::Result<Video> {
    Ok(Video {
        video_id: row.get(0)?,
        playlist_id: row.get(1)?,
        path: row.get(2)?,
        is_watched: row.get(3)?,
        resume_time: row.get(4)?,
    })
}

/// Host label for the `General.OS` column.
fn host_os_label() -> &'static str {
    if cfg!(target_os = "windows") {
        "Windows"
    } else if cfg!(target_os = "macos") {
        "Mac"
    } else {
        "Linux"
    }
}

impl DbOperations {
    // ===== Playlists =====

    /// Insert a playlist and its scanned videos as one unit. Either every
    /// row is written or none is.
    pub fn create_playlist(
        db: &DatabaseConnection,
        title: &str,
        path: &str,
        status: PlaylistStatus,
        total_time_hour: i64,
        video_paths: &[String],
    ) -> Result<i64, DbError> {
        const INSERT_PLAYLIST: &str = "INSERT INTO Playlist \
             (playlistTitle, playlistPath, status, totalVideoCount, watchedCount, totalTimeHour) \
             VALUES (?1, ?2, ?3, ?4, 0, ?5)";
        const INSERT_VIDEO: &str =
            "INSERT INTO Video (playlistID, videoPath) VALUES (?1, ?2)";

        let conn = db.get_connection();
        let mut conn = conn.lock().unwrap();

        let tx = conn
            .transaction()
            .map_err(|e| DbError::query("BEGIN", e))?;

        tx.execute(
            INSERT_PLAYLIST,
            params![
                title,
                path,
                status,
                video_paths.len() as i64,
                total_time_hour
            ],
        )
        .map_err(|e| DbError::query(INSERT_PLAYLIST, e))?;
        let playlist_id = tx.last_insert_rowid();

        for video_path in video_paths {
            tx.execute(INSERT_VIDEO, params![playlist_id, video_path])
                .map_err(|e| DbError::query(INSERT_VIDEO, e))?;
        }

        tx.commit().map_err(|e| DbError::query("COMMIT", e))?;

        debug!(
            "created playlist {playlist_id} ({title}) with {} videos",
            video_paths.len()
        );
        Ok(playlist_id)
    }

    /// Update the mutable playlist fields and stamp `updatingDateTime`.
    pub fn update_playlist(
        db: &DatabaseConnection,
        playlist_id: i64,
        title: &str,
        status: PlaylistStatus,
        total_video_count: i64,
        watched_count: i64,
        total_time_hour: i64,
    ) -> Result<(), DbError> {
        const UPDATE_PLAYLIST: &str = "UPDATE Playlist SET \
             playlistTitle = ?1, status = ?2, totalVideoCount = ?3, watchedCount = ?4, \
             totalTimeHour = ?5, updatingDateTime = CURRENT_TIMESTAMP \
             WHERE playlistId = ?6";

        // watchedCount stays within 0..=totalVideoCount no matter what the
        // edit dialog sends
        let total_video_count = total_video_count.max(0);
        let watched_count = watched_count.clamp(0, total_video_count);

        let conn = db.get_connection();
        let conn = conn.lock().unwrap();

        let rows_affected = conn
            .execute(
                UPDATE_PLAYLIST,
                params![
                    title,
                    status,
                    total_video_count,
                    watched_count,
                    total_time_hour,
                    playlist_id
                ],
            )
            .map_err(|e| DbError::query(UPDATE_PLAYLIST, e))?;

        if rows_affected == 0 {
            return Err(DbError::NotFound(format!("playlist {playlist_id}")));
        }
        Ok(())
    }

    /// Delete a playlist's videos, then the playlist itself, atomically.
    pub fn delete_playlist(db: &DatabaseConnection, playlist_id: i64) -> Result<(), DbError> {
        const DELETE_VIDEOS: &str = "DELETE FROM Video WHERE playlistID = ?1";
        const DELETE_PLAYLIST: &str = "DELETE FROM Playlist WHERE playlistId = ?1";

        let conn = db.get_connection();
        let mut conn = conn.lock().unwrap();

        let tx = conn
            .transaction()
            .map_err(|e| DbError::query("BEGIN", e))?;

        tx.execute(DELETE_VIDEOS, params![playlist_id])
            .map_err(|e| DbError::query(DELETE_VIDEOS, e))?;
        let rows_affected = tx
            .execute(DELETE_PLAYLIST, params![playlist_id])
            .map_err(|e| DbError::query(DELETE_PLAYLIST, e))?;

        if rows_affected == 0 {
            // Dropping the transaction rolls the video deletes back
            return Err(DbError::NotFound(format!("playlist {playlist_id}")));
        }

        tx.commit().map_err(|e| DbError::query("COMMIT", e))?;
        debug!("deleted playlist {playlist_id}");
        Ok(())
    }

    /// All playlists, identity ascending.
    pub fn get_all_playlists(db: &DatabaseConnection) -> Result<Vec<Playlist>, DbError> {
        const SELECT_PLAYLISTS: &str = "SELECT playlistId, playlistTitle, playlistPath, status, \
             totalVideoCount, watchedCount, totalTimeHour, \
             creationDateTime, updatingDateTime, lastWatchedDateTime \
             FROM Playlist ORDER BY playlistId ASC";

        let conn = db.get_connection();
        let conn = conn.lock().unwrap();

        let mut stmt = conn
            .prepare(SELECT_PLAYLISTS)
            .map_err(|e| DbError::query(SELECT_PLAYLISTS, e))?;
        let playlists = stmt
            .query_map([], map_playlist_row)
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .map_err(|e| DbError::query(SELECT_PLAYLISTS, e))?;

        Ok(playlists)
    }

    pub fn get_playlist(db: &DatabaseConnection, playlist_id: i64) -> Result<Playlist, DbError> {
        const SELECT_PLAYLIST: &str = "SELECT playlistId, playlistTitle, playlistPath, status, \
             totalVideoCount, watchedCount, totalTimeHour, \
             creationDateTime, updatingDateTime, lastWatchedDateTime \
             FROM Playlist WHERE playlistId = ?1";

        let conn = db.get_connection();
        let conn = conn.lock().unwrap();

        conn.query_row(SELECT_PLAYLIST, params![playlist_id], map_playlist_row)
            .optional()
            .map_err(|e| DbError::query(SELECT_PLAYLIST, e))?
            .ok_or_else(|| DbError::NotFound(format!("playlist {playlist_id}")))
    }

    // ===== Videos =====

    /// A playlist's videos, identity ascending.
    pub fn get_playlist_videos(
        db: &DatabaseConnection,
        playlist_id: i64,
    ) -> Result<Vec<Video>, DbError> {
        const SELECT_VIDEOS: &str = "SELECT videoID, playlistID, videoPath, isWatched, resumeTime \
             FROM Video WHERE playlistID = ?1 ORDER BY videoID ASC";

        let conn = db.get_connection();
        let conn = conn.lock().unwrap();

        let mut stmt = conn
            .prepare(SELECT_VIDEOS)
            .map_err(|e| DbError::query(SELECT_VIDEOS, e))?;
        let videos = stmt
            .query_map(params![playlist_id], map_video_row)
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .map_err(|e| DbError::query(SELECT_VIDEOS, e))?;

        Ok(videos)
    }

    /// Flip a video's watched flag and synchronize the owning playlist's
    /// aggregate in the same transaction. The aggregate is always written
    /// from the re-derived row count, so repeated calls cannot drift it and
    /// it can never leave `0 <= watchedCount <= totalVideoCount`.
    ///
    /// Returns `Ok(false)` when the flag already had the requested value;
    /// counters are untouched in that case.
    pub fn set_video_watched(
        db: &DatabaseConnection,
        video_id: i64,
        watched: bool,
    ) -> Result<bool, DbError> {
        const SELECT_VIDEO: &str = "SELECT playlistID, isWatched FROM Video WHERE videoID = ?1";
        const UPDATE_VIDEO: &str = "UPDATE Video SET isWatched = ?2 WHERE videoID = ?1";
        const RECOUNT: &str = "UPDATE Playlist SET watchedCount = \
             (SELECT COUNT(*) FROM Video WHERE playlistID = ?1 AND isWatched = 1) \
             WHERE playlistId = ?1";
        const STAMP_WATCHED: &str =
            "UPDATE Playlist SET lastWatchedDateTime = ?2 WHERE playlistId = ?1";

        let conn = db.get_connection();
        let mut conn = conn.lock().unwrap();

        let row: Option<(i64, bool)> = conn
            .query_row(SELECT_VIDEO, params![video_id], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()
            .map_err(|e| DbError::query(SELECT_VIDEO, e))?;
        let (playlist_id, is_watched) =
            row.ok_or_else(|| DbError::NotFound(format!("video {video_id}")))?;

        if is_watched == watched {
            return Ok(false);
        }

        let tx = conn
            .transaction()
            .map_err(|e| DbError::query("BEGIN", e))?;

        tx.execute(UPDATE_VIDEO, params![video_id, watched])
            .map_err(|e| DbError::query(UPDATE_VIDEO, e))?;
        tx.execute(RECOUNT, params![playlist_id])
            .map_err(|e| DbError::query(RECOUNT, e))?;
        if watched {
            let stamp = Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
            tx.execute(STAMP_WATCHED, params![playlist_id, stamp])
                .map_err(|e| DbError::query(STAMP_WATCHED, e))?;
        }

        tx.commit().map_err(|e| DbError::query("COMMIT", e))?;
        Ok(true)
    }

    // ===== General settings =====

    /// Load the singleton settings row, inserting the default one on first
    /// access. The second element is true exactly when the row was just
    /// created, signalling that first-run configuration is needed.
    pub fn ensure_general(db: &DatabaseConnection) -> Result<(GeneralSettings, bool), DbError> {
        const SELECT_GENERAL: &str = "SELECT OS, defaultMediaPlayer, lastWatchedPlId, lastWatchedVdoId \
             FROM General WHERE id = 1";
        const INSERT_GENERAL: &str =
            "INSERT INTO General (id, OS, defaultMediaPlayer) VALUES (1, ?1, '')";

        let conn = db.get_connection();
        let conn = conn.lock().unwrap();

        let existing = conn
            .query_row(SELECT_GENERAL, [], |row| {
                Ok(GeneralSettings {
                    os: row.get(0)?,
                    default_media_player: row.get(1)?,
                    last_watched_playlist_id: row.get(2)?,
                    last_watched_video_id: row.get(3)?,
                })
            })
            .optional()
            .map_err(|e| DbError::query(SELECT_GENERAL, e))?;

        if let Some(settings) = existing {
            return Ok((settings, false));
        }

        let os = host_os_label();
        conn.execute(INSERT_GENERAL, params![os])
            .map_err(|e| DbError::query(INSERT_GENERAL, e))?;
        info!("general settings were empty, initialized defaults for OS {os}");

        Ok((
            GeneralSettings {
                os: os.to_string(),
                default_media_player: String::new(),
                last_watched_playlist_id: None,
                last_watched_video_id: None,
            },
            true,
        ))
    }

    pub fn get_general(db: &DatabaseConnection) -> Result<GeneralSettings, DbError> {
        Self::ensure_general(db).map(|(settings, _)| settings)
    }

    pub fn set_last_watched_playlist(
        db: &DatabaseConnection,
        playlist_id: Option<i64>,
    ) -> Result<(), DbError> {
        const UPDATE_LAST_PLAYLIST: &str =
            "UPDATE General SET lastWatchedPlId = ?1 WHERE id = 1";

        let conn = db.get_connection();
        let conn = conn.lock().unwrap();

        let rows_affected = conn
            .execute(UPDATE_LAST_PLAYLIST, params![playlist_id])
            .map_err(|e| DbError::query(UPDATE_LAST_PLAYLIST, e))?;
        if rows_affected == 0 {
            return Err(DbError::NotFound("general settings row".to_string()));
        }
        Ok(())
    }

    pub fn set_last_watched_video(
        db: &DatabaseConnection,
        video_id: Option<i64>,
    ) -> Result<(), DbError> {
        const UPDATE_LAST_VIDEO: &str =
            "UPDATE General SET lastWatchedVdoId = ?1 WHERE id = 1";

        let conn = db.get_connection();
        let conn = conn.lock().unwrap();

        let rows_affected = conn
            .execute(UPDATE_LAST_VIDEO, params![video_id])
            .map_err(|e| DbError::query(UPDATE_LAST_VIDEO, e))?;
        if rows_affected == 0 {
            return Err(DbError::NotFound("general settings row".to_string()));
        }
        Ok(())
    }

    /// Persist the resolved default player path.
    pub fn set_default_player_path(db: &DatabaseConnection, path: &str) -> Result<(), DbError> {
        const UPDATE_PLAYER: &str =
            "UPDATE General SET defaultMediaPlayer = ?1 WHERE id = 1";

        let conn = db.get_connection();
        let conn = conn.lock().unwrap();

        let rows_affected = conn
            .execute(UPDATE_PLAYER, params![path])
            .map_err(|e| DbError::query(UPDATE_PLAYER, e))?;
        if rows_affected == 0 {
            return Err(DbError::NotFound("general settings row".to_string()));
        }
        Ok(())
    }

    // ===== Media players =====

    /// Replace the MediaPlayerPath table wholesale so it always reflects
    /// the players present on this machine right now.
    pub fn replace_media_players(
        db: &DatabaseConnection,
        players: &[MediaPlayerEntry],
    ) -> Result<(), DbError> {
        const DELETE_PLAYERS: &str = "DELETE FROM MediaPlayerPath";
        const INSERT_PLAYER: &str =
            "INSERT INTO MediaPlayerPath (playerName, playerPath) VALUES (?1, ?2)";

        let conn = db.get_connection();
        let mut conn = conn.lock().unwrap();

        let tx = conn
            .transaction()
            .map_err(|e| DbError::query("BEGIN", e))?;

        tx.execute(DELETE_PLAYERS, [])
            .map_err(|e| DbError::query(DELETE_PLAYERS, e))?;
        for player in players {
            tx.execute(INSERT_PLAYER, params![player.name, player.path])
                .map_err(|e| DbError::query(INSERT_PLAYER, e))?;
        }

        tx.commit().map_err(|e| DbError::query("COMMIT", e))?;
        Ok(())
    }

    pub fn get_media_players(db: &DatabaseConnection) -> Result<Vec<MediaPlayerEntry>, DbError> {
        const SELECT_PLAYERS: &str =
            "SELECT playerName, playerPath FROM MediaPlayerPath ORDER BY playerName";

        let conn = db.get_connection();
        let conn = conn.lock().unwrap();

        let mut stmt = conn
            .prepare(SELECT_PLAYERS)
            .map_err(|e| DbError::query(SELECT_PLAYERS, e))?;
        let players = stmt
            .query_map([], |row| {
                Ok(MediaPlayerEntry {
                    name: row.get(0)?,
                    path: row.get(1)?,
                })
            })
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .map_err(|e| DbError::query(SELECT_PLAYERS, e))?;

        Ok(players)
    }

    pub fn get_player_path(
        db: &DatabaseConnection,
        name: &str,
    ) -> Result<Option<String>, DbError> {
        const SELECT_PLAYER: &str =
            "SELECT playerPath FROM MediaPlayerPath WHERE playerName = ?1";

        let conn = db.get_connection();
        let conn = conn.lock().unwrap();

        conn.query_row(SELECT_PLAYER, params![name], |row| row.get(0))
            .optional()
            .map_err(|e| DbError::query(SELECT_PLAYER, e))
    }
}

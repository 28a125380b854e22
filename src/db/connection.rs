// Database connection management
use chrono::Local;
use log::info;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::error::DbError;
use super::migrations::run_migrations;

/// The sole gateway to the database. Every statement runs under the one
/// mutex, so concurrent callers queue rather than race. Constructed once by
/// the composition root and injected; `Clone` shares the same handle.
pub struct DatabaseConnection {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl DatabaseConnection {
    pub fn new(db_path: PathBuf) -> Result<Self, DbError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent).map_err(|e| DbError::Open {
                path: db_path.clone(),
                source: Box::new(e),
            })?;
        }

        info!("opening database at {}", db_path.display());
        let conn = Connection::open(&db_path).map_err(|e| DbError::Open {
            path: db_path.clone(),
            source: Box::new(e),
        })?;

        // Run migrations
        run_migrations(&conn).map_err(|e| DbError::query("schema migrations", e))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(db_path),
        })
    }

    /// Database without a backing file; used by tests. File-level backup
    /// and restore are unavailable on it.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory().map_err(|e| DbError::Open {
            path: PathBuf::from(":memory:"),
            source: Box::new(e),
        })?;
        run_migrations(&conn).map_err(|e| DbError::query("schema migrations", e))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Default database location under the platform data directory.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("PlaylistCompanion")
            .join("db_PL.sqlite")
    }

    pub(crate) fn get_connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Copy the live database file to a timestamped sibling. The lock is
    /// held for the duration of the copy, so no statement is in flight and
    /// the source is never touched.
    pub fn backup(&self) -> Result<PathBuf, DbError> {
        let db_path = self
            .path
            .as_ref()
            .ok_or_else(|| DbError::Backup("in-memory database has no backing file".to_string()))?;

        let _guard = self.conn.lock().unwrap();
        Self::copy_backup(db_path)
    }

    /// Overwrite the live database file with `archive`. A fresh backup is
    /// taken first, unconditionally, so the pre-restore state stays
    /// recoverable; on any failure the live file is left unchanged.
    pub fn restore(&self, archive: &Path) -> Result<(), DbError> {
        let db_path = self
            .path
            .clone()
            .ok_or_else(|| DbError::Restore("in-memory database has no backing file".to_string()))?;

        let mut guard = self.conn.lock().unwrap();
        Self::copy_backup(&db_path)?;

        if !archive.is_file() {
            return Err(DbError::Restore(format!(
                "archive {} does not exist",
                archive.display()
            )));
        }
        fs::File::open(archive).map_err(|e| {
            DbError::Restore(format!("archive {} is not readable: {e}", archive.display()))
        })?;

        // Stage beside the live file, then rename over it, so a failed copy
        // never leaves a half-written database.
        let staged = db_path.with_extension("restore-tmp");
        fs::copy(archive, &staged).map_err(|e| {
            DbError::Restore(format!("could not stage {}: {e}", archive.display()))
        })?;
        if let Err(e) = fs::rename(&staged, &db_path) {
            let _ = fs::remove_file(&staged);
            return Err(DbError::Restore(format!(
                "could not replace {}: {e}",
                db_path.display()
            )));
        }

        // Point the guarded handle at the restored file
        let conn = Connection::open(&db_path).map_err(|e| DbError::Open {
            path: db_path.clone(),
            source: Box::new(e),
        })?;
        run_migrations(&conn).map_err(|e| DbError::query("schema migrations", e))?;
        *guard = conn;

        info!("database restored from {}", archive.display());
        Ok(())
    }

    fn copy_backup(db_path: &Path) -> Result<PathBuf, DbError> {
        if !db_path.is_file() {
            return Err(DbError::Backup(format!(
                "source database {} does not exist",
                db_path.display()
            )));
        }

        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let ext = db_path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("sqlite");

        // Backups taken within the same second must not clobber an earlier
        // one (restore itself backs up first and may then read that file)
        let mut dest = db_path.with_file_name(format!("backup_{stamp}.{ext}"));
        let mut n = 1;
        while dest.exists() {
            dest = db_path.with_file_name(format!("backup_{stamp}-{n}.{ext}"));
            n += 1;
        }

        fs::copy(db_path, &dest)
            .map_err(|e| DbError::Backup(format!("could not write {}: {e}", dest.display())))?;

        info!("db backup created at {}", dest.display());
        Ok(dest)
    }
}

impl Clone for DatabaseConnection {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            path: self.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::PlaylistStatus;
    use crate::db::operations::DbOperations;
    use tempfile::TempDir;

    fn open_tmp_db() -> (DatabaseConnection, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseConnection::new(temp_dir.path().join("test.sqlite")).unwrap();
        (db, temp_dir)
    }

    fn backup_files(dir: &Path) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with("backup_"))
            })
            .collect();
        found.sort();
        found
    }

    #[test]
    fn backup_creates_timestamped_sibling() {
        let (db, temp_dir) = open_tmp_db();

        let archive = db.backup().unwrap();
        assert!(archive.is_file());
        assert_eq!(archive.parent(), Some(temp_dir.path()));

        let name = archive.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("backup_"));
        assert!(name.ends_with(".sqlite"));
    }

    #[test]
    fn restore_reflects_archive_content() -> anyhow::Result<()> {
        let (db, _temp_dir) = open_tmp_db();

        DbOperations::create_playlist(&db, "first", "/videos/first", PlaylistStatus::Planned, 0, &[])?;
        let archive = db.backup()?;
        DbOperations::create_playlist(&db, "second", "/videos/second", PlaylistStatus::Planned, 0, &[])?;
        assert_eq!(DbOperations::get_all_playlists(&db)?.len(), 2);

        db.restore(&archive)?;

        let playlists = DbOperations::get_all_playlists(&db)?;
        assert_eq!(playlists.len(), 1);
        assert_eq!(playlists[0].title, "first");
        Ok(())
    }

    #[test]
    fn failed_restore_leaves_live_file_and_a_backup() -> anyhow::Result<()> {
        let (db, temp_dir) = open_tmp_db();
        DbOperations::create_playlist(&db, "keep me", "/videos/keep", PlaylistStatus::Watching, 0, &[])?;

        let missing = temp_dir.path().join("no-such-archive.sqlite");
        let result = db.restore(&missing);
        assert!(matches!(result, Err(DbError::Restore(_))));

        // Pre-restore backup was still taken
        assert!(!backup_files(temp_dir.path()).is_empty());

        let playlists = DbOperations::get_all_playlists(&db)?;
        assert_eq!(playlists.len(), 1);
        assert_eq!(playlists[0].title, "keep me");
        Ok(())
    }

    #[test]
    fn backup_of_in_memory_database_fails() {
        let db = DatabaseConnection::open_in_memory().unwrap();
        assert!(matches!(db.backup(), Err(DbError::Backup(_))));
    }
}

// Database migrations
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<(), rusqlite::Error> {
    // Enable foreign keys
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    // Create Playlist table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS Playlist (
            playlistId INTEGER PRIMARY KEY AUTOINCREMENT,
            playlistTitle TEXT NOT NULL,
            playlistPath TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'Planned'
                CHECK (status IN ('Planned', 'Watching', 'Completed')),
            totalVideoCount INTEGER NOT NULL DEFAULT 0,
            watchedCount INTEGER NOT NULL DEFAULT 0,
            totalTimeHour INTEGER NOT NULL DEFAULT 0,
            creationDateTime TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updatingDateTime TEXT,
            lastWatchedDateTime TEXT
        )",
        [],
    )?;

    // Create Video table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS Video (
            videoID INTEGER PRIMARY KEY AUTOINCREMENT,
            playlistID INTEGER NOT NULL,
            videoPath TEXT NOT NULL,
            isWatched INTEGER NOT NULL DEFAULT 0,
            resumeTime INTEGER,
            FOREIGN KEY (playlistID) REFERENCES Playlist(playlistId)
        )",
        [],
    )?;

    // Create General table (single row, id pinned to 1)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS General (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            OS TEXT NOT NULL CHECK (OS IN ('Windows', 'Linux', 'Mac')),
            defaultMediaPlayer TEXT NOT NULL DEFAULT '',
            lastWatchedPlId INTEGER,
            lastWatchedVdoId INTEGER
        )",
        [],
    )?;

    // Create MediaPlayerPath reference table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS MediaPlayerPath (
            playerName TEXT PRIMARY KEY,
            playerPath TEXT NOT NULL
        )",
        [],
    )?;

    // Create indexes for better query performance
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_video_playlist ON Video(playlistID)",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('Playlist', 'Video', 'General', 'MediaPlayerPath')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 4);
    }

    #[test]
    fn general_rejects_second_row() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        conn.execute("INSERT INTO General (id, OS) VALUES (1, 'Linux')", [])
            .unwrap();
        let second = conn.execute("INSERT INTO General (id, OS) VALUES (2, 'Linux')", []);
        assert!(second.is_err());
    }

    #[test]
    fn status_constraint_rejects_unknown_label() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let bad = conn.execute(
            "INSERT INTO Playlist (playlistTitle, playlistPath, status)
             VALUES ('t', '/tmp', 'Paused')",
            [],
        );
        assert!(bad.is_err());
    }
}

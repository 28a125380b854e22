use log::debug;

use crate::db::connection::DatabaseConnection;
use crate::db::error::DbError;
use crate::db::models::Video;
use crate::db::operations::DbOperations;

/// Outcome of a navigation step. These are expected steady-state signals
/// the GUI maps to user-facing messages, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The selection moved to this video.
    Moved(i64),
    EndOfPlaylist,
    StartOfPlaylist,
    EmptyPlaylist,
}

/// In-memory tracker of the active playlist's ordered videos and current
/// selection. One instance per process; switching playlists replaces the
/// working set. Playlist-level counters are never cached here — callers
/// re-read them through the repository after every watched mutation.
pub struct Navigator {
    db: DatabaseConnection,
    playlist_id: Option<i64>,
    videos: Vec<Video>,
    current: Option<i64>,
}

impl Navigator {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            playlist_id: None,
            videos: Vec::new(),
            current: None,
        }
    }

    /// Load a playlist's videos and make it the active working set. The
    /// persisted last-watched video becomes the current selection only
    /// when it still belongs to this playlist.
    pub fn load_playlist(&mut self, playlist_id: i64) -> Result<&[Video], DbError> {
        let videos = DbOperations::get_playlist_videos(&self.db, playlist_id)?;
        let settings = DbOperations::get_general(&self.db)?;

        self.current = settings
            .last_watched_video_id
            .filter(|id| videos.iter().any(|v| v.video_id == *id));
        self.playlist_id = Some(playlist_id);
        self.videos = videos;

        DbOperations::set_last_watched_playlist(&self.db, Some(playlist_id))?;
        debug!(
            "loaded playlist {playlist_id}: {} videos, current {:?}",
            self.videos.len(),
            self.current
        );
        Ok(&self.videos)
    }

    pub fn playlist_id(&self) -> Option<i64> {
        self.playlist_id
    }

    pub fn videos(&self) -> &[Video] {
        &self.videos
    }

    pub fn current_video(&self) -> Option<&Video> {
        self.current
            .and_then(|id| self.videos.iter().find(|v| v.video_id == id))
    }

    /// One-based position of the current selection within the list, for
    /// the "n/m" readout.
    pub fn current_position(&self) -> Option<(usize, usize)> {
        self.current_index().map(|i| (i + 1, self.videos.len()))
    }

    fn current_index(&self) -> Option<usize> {
        let current = self.current?;
        self.videos.iter().position(|v| v.video_id == current)
    }

    /// Make a video of the loaded playlist the current selection and
    /// remember it across playlist switches.
    pub fn select_video(&mut self, video_id: i64) -> Result<(), DbError> {
        if !self.videos.iter().any(|v| v.video_id == video_id) {
            return Err(DbError::NotFound(format!(
                "video {video_id} in active playlist"
            )));
        }
        self.current = Some(video_id);
        DbOperations::set_last_watched_video(&self.db, Some(video_id))
    }

    /// Mark a video watched and synchronize the owning playlist's counter.
    /// Already-watched videos are a no-op returning `Ok(false)`; callers
    /// that want to keep going advance instead.
    pub fn mark_watched(&mut self, video_id: i64) -> Result<bool, DbError> {
        let index = self.index_of(video_id)?;
        if self.videos[index].is_watched {
            return Ok(false);
        }

        DbOperations::set_video_watched(&self.db, video_id, true)?;
        self.videos[index].is_watched = true;
        Ok(true)
    }

    /// Clear a video's watched flag. The counter only moves when the flag
    /// actually was set.
    pub fn mark_unwatched(&mut self, video_id: i64) -> Result<bool, DbError> {
        let index = self.index_of(video_id)?;
        if !self.videos[index].is_watched {
            return Ok(false);
        }

        DbOperations::set_video_watched(&self.db, video_id, false)?;
        self.videos[index].is_watched = false;
        Ok(true)
    }

    /// Move the selection to the next video. At the last entry the
    /// selection stays put; with no selection the first video is chosen.
    pub fn advance_next(&mut self) -> Step {
        if self.videos.is_empty() {
            return Step::EmptyPlaylist;
        }
        match self.current_index() {
            None => {
                let id = self.videos[0].video_id;
                self.current = Some(id);
                Step::Moved(id)
            }
            Some(i) if i + 1 < self.videos.len() => {
                let id = self.videos[i + 1].video_id;
                self.current = Some(id);
                Step::Moved(id)
            }
            Some(_) => Step::EndOfPlaylist,
        }
    }

    /// Move the selection to the previous video. At the first entry the
    /// selection stays put; with no selection the last video is chosen.
    pub fn advance_previous(&mut self) -> Step {
        if self.videos.is_empty() {
            return Step::EmptyPlaylist;
        }
        match self.current_index() {
            None => {
                let id = self.videos[self.videos.len() - 1].video_id;
                self.current = Some(id);
                Step::Moved(id)
            }
            Some(0) => Step::StartOfPlaylist,
            Some(i) => {
                let id = self.videos[i - 1].video_id;
                self.current = Some(id);
                Step::Moved(id)
            }
        }
    }

    fn index_of(&self, video_id: i64) -> Result<usize, DbError> {
        self.videos
            .iter()
            .position(|v| v.video_id == video_id)
            .ok_or_else(|| DbError::NotFound(format!("video {video_id} in active playlist")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::PlaylistStatus;

    fn navigator_with_videos(paths: &[String]) -> (Navigator, i64) {
        let db = DatabaseConnection::open_in_memory().unwrap();
        DbOperations::ensure_general(&db).unwrap();
        let playlist_id = DbOperations::create_playlist(
            &db,
            "course",
            "/videos/course",
            PlaylistStatus::Watching,
            0,
            paths,
        )
        .unwrap();

        let mut navigator = Navigator::new(db);
        navigator.load_playlist(playlist_id).unwrap();
        (navigator, playlist_id)
    }

    fn three_videos() -> Vec<String> {
        vec![
            "/videos/course/01_intro.mp4".to_string(),
            "/videos/course/02_setup.mkv".to_string(),
            "/videos/course/03_basics.mp4".to_string(),
        ]
    }

    #[test]
    fn walks_the_playlist_and_stops_at_the_end() {
        let (mut navigator, _) = navigator_with_videos(&three_videos());
        let ids: Vec<i64> = navigator.videos().iter().map(|v| v.video_id).collect();

        // No selection yet: next picks the first entry
        assert_eq!(navigator.advance_next(), Step::Moved(ids[0]));
        assert_eq!(navigator.current_position(), Some((1, 3)));

        assert_eq!(navigator.advance_next(), Step::Moved(ids[1]));
        assert_eq!(navigator.advance_next(), Step::Moved(ids[2]));

        // At the last entry the selection stays put
        assert_eq!(navigator.advance_next(), Step::EndOfPlaylist);
        assert_eq!(navigator.current_video().map(|v| v.video_id), Some(ids[2]));
    }

    #[test]
    fn walks_backwards_and_stops_at_the_start() {
        let (mut navigator, _) = navigator_with_videos(&three_videos());
        let ids: Vec<i64> = navigator.videos().iter().map(|v| v.video_id).collect();

        // No selection yet: previous picks the last entry
        assert_eq!(navigator.advance_previous(), Step::Moved(ids[2]));
        assert_eq!(navigator.advance_previous(), Step::Moved(ids[1]));
        assert_eq!(navigator.advance_previous(), Step::Moved(ids[0]));

        assert_eq!(navigator.advance_previous(), Step::StartOfPlaylist);
        assert_eq!(navigator.current_video().map(|v| v.video_id), Some(ids[0]));
    }

    #[test]
    fn empty_playlist_reports_empty_in_both_directions() {
        let (mut navigator, _) = navigator_with_videos(&[]);

        assert_eq!(navigator.advance_next(), Step::EmptyPlaylist);
        assert_eq!(navigator.advance_previous(), Step::EmptyPlaylist);
        assert!(navigator.current_video().is_none());
    }

    #[test]
    fn watching_updates_flag_and_counter() -> anyhow::Result<()> {
        let (mut navigator, playlist_id) = navigator_with_videos(&three_videos());
        let first = navigator.videos()[0].video_id;

        assert!(navigator.mark_watched(first)?);
        assert!(navigator.videos()[0].is_watched);

        // The GUI re-reads fresh totals through the repository
        let playlist = DbOperations::get_playlist(&navigator.db, playlist_id)?;
        assert_eq!(playlist.watched_count, 1);

        // Second watch of the same video is a no-op
        assert!(!navigator.mark_watched(first)?);

        // Unwatch restores the prior counter exactly
        assert!(navigator.mark_unwatched(first)?);
        assert!(!navigator.mark_unwatched(first)?);
        let playlist = DbOperations::get_playlist(&navigator.db, playlist_id)?;
        assert_eq!(playlist.watched_count, 0);
        Ok(())
    }

    #[test]
    fn selection_survives_reload_only_within_its_playlist() -> anyhow::Result<()> {
        let (mut navigator, playlist_id) = navigator_with_videos(&three_videos());
        let second = navigator.videos()[1].video_id;

        navigator.select_video(second)?;
        navigator.load_playlist(playlist_id)?;
        assert_eq!(navigator.current_video().map(|v| v.video_id), Some(second));
        assert_eq!(navigator.current_position(), Some((2, 3)));

        // A different playlist does not inherit the selection
        let other = DbOperations::create_playlist(
            &navigator.db,
            "other",
            "/videos/other",
            PlaylistStatus::Planned,
            0,
            &["/videos/other/clip.mp4".to_string()],
        )?;
        navigator.load_playlist(other)?;
        assert!(navigator.current_video().is_none());

        // Switching back restores it
        navigator.load_playlist(playlist_id)?;
        assert_eq!(navigator.current_video().map(|v| v.video_id), Some(second));
        Ok(())
    }

    #[test]
    fn watch_then_advance_through_a_short_playlist() -> anyhow::Result<()> {
        let (mut navigator, playlist_id) = navigator_with_videos(&three_videos());
        let ids: Vec<i64> = navigator.videos().iter().map(|v| v.video_id).collect();

        let playlist = DbOperations::get_playlist(&navigator.db, playlist_id)?;
        assert_eq!(playlist.total_video_count, 3);
        assert_eq!(playlist.watched_count, 0);

        navigator.select_video(ids[0])?;
        assert!(navigator.mark_watched(ids[0])?);
        let playlist = DbOperations::get_playlist(&navigator.db, playlist_id)?;
        assert_eq!(playlist.watched_count, 1);
        assert!(navigator.videos()[0].is_watched);

        assert_eq!(navigator.advance_next(), Step::Moved(ids[1]));
        assert_eq!(navigator.advance_next(), Step::Moved(ids[2]));
        assert_eq!(navigator.advance_next(), Step::EndOfPlaylist);
        assert_eq!(navigator.current_video().map(|v| v.video_id), Some(ids[2]));
        Ok(())
    }

    #[test]
    fn selecting_a_foreign_video_is_rejected() {
        let (mut navigator, _) = navigator_with_videos(&three_videos());
        assert!(matches!(
            navigator.select_video(9999),
            Err(DbError::NotFound(_))
        ));
    }
}

// Playlist Companion - video playlist tracking core
// Module declarations
pub mod db;
pub mod playback;
pub mod settings;
pub mod state;

pub use db::connection::DatabaseConnection;
pub use db::error::DbError;
pub use db::models::{GeneralSettings, MediaPlayerEntry, Playlist, PlaylistStatus, Video};
pub use db::operations::DbOperations;
pub use playback::{Navigator, Step};
pub use settings::{SettingsError, SettingsManager, PLAYER_CANDIDATES};
pub use state::AppState;

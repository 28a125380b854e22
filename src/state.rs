// Application state management
use std::sync::{Arc, Mutex};

use crate::db::connection::DatabaseConnection;
use crate::db::error::DbError;
use crate::db::operations::DbOperations;
use crate::playback::Navigator;
use crate::settings::SettingsManager;

/// Everything the GUI shell needs, wired to one shared database gateway.
/// The gateway is constructed once by the embedding process and injected
/// here; there is no hidden global instance.
pub struct AppState {
    pub db: DatabaseConnection,
    /// The one Navigator of this process.
    pub navigator: Arc<Mutex<Navigator>>,
    pub settings: SettingsManager,
    /// True when the settings row was created just now; the shell is
    /// expected to open its configuration surface in response.
    pub first_run: bool,
}

impl AppState {
    pub fn new(db: DatabaseConnection) -> Result<Self, DbError> {
        let (_, first_run) = DbOperations::ensure_general(&db)?;

        Ok(Self {
            navigator: Arc::new(Mutex::new(Navigator::new(db.clone()))),
            settings: SettingsManager::new(db.clone()),
            db,
            first_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_run_is_signalled_only_on_a_fresh_database() {
        let db = DatabaseConnection::open_in_memory().unwrap();

        let state = AppState::new(db.clone()).unwrap();
        assert!(state.first_run);

        let state = AppState::new(db).unwrap();
        assert!(!state.first_run);
    }
}

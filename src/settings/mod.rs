// Settings module
// This module handles the known-player table, the default player and
// database backup/restore

pub mod settings;

pub use settings::{SettingsError, SettingsManager, PLAYER_CANDIDATES};

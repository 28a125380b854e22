// Playback navigation module
// This module tracks the active playlist and its current selection

pub mod navigator;

pub use navigator::{Navigator, Step};

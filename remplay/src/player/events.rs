//! Player state notifications
//!
//! Broadcast after every session transition. Nothing depends on them for
//! correctness; they exist for logging and for observers that need to know
//! when a session has settled.

use serde::Serialize;

/// Session lifecycle event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// A session was recorded and its player process is being launched
    Started { position: usize, short_path: String },

    /// The player exited on its own at the end of the track
    Finished { position: usize },

    /// `stop()` ended the current session
    Stopped { position: usize },

    /// A session ended after a newer `play`/`stop` replaced it
    Superseded { position: usize },

    /// The player process failed; no retry, no advance
    Failed { position: usize, error: String },

    /// Playback reached the end of the library
    Idle,
}

//! Playback session management
//!
//! [`PlayerController`] owns the single playback session and decides what
//! happens when a player process ends: advance, stay idle, or nothing at
//! all because a newer request already took over.

pub mod controller;
pub mod events;

pub use controller::PlayerController;
pub use events::PlayerEvent;

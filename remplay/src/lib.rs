//! # remplay
//!
//! Remote control for a machine-local music player.
//!
//! **Purpose:** Index the audio files under a root folder, serve a
//! password-gated page listing them, and drive an external player process
//! for the chosen track, advancing through the listing as tracks finish.
//!
//! **Architecture:** axum HTTP gateway in front of a [`player::PlayerController`]
//! state machine; every external tool runs through
//! [`remplay_common::ProcessRunner`].

pub mod api;
pub mod config;
pub mod error;
pub mod library;
pub mod player;
pub mod tunnel;
pub mod volume;

pub use error::{Error, Result};

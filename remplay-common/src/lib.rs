//! # remplay common library
//!
//! Shared code for the remplay server:
//! - Error types
//! - External process execution with cancellation
//! - Command templates for the player, mixer, listing and tunnel tools
//! - Shared-secret authentication primitives
//! - TOML configuration file loading

pub mod api;
pub mod config;
pub mod error;
pub mod process;

pub use error::{Error, Result};
pub use process::{CommandTemplate, Invocation, ProcessError, ProcessRunner, SystemRunner};

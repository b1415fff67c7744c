//! Volume control
//!
//! Fire-and-forget mixer commands. Nothing is stored: the mixer itself is
//! the only record of the current level.

use std::sync::Arc;

use remplay_common::{CommandTemplate, ProcessError, ProcessRunner};
use thiserror::Error;
use tracing::info;

/// Highest accepted level (percent)
pub const MAX_VOLUME: u8 = 100;

/// Volume errors
#[derive(Debug, Error)]
pub enum VolumeError {
    /// Level above [`MAX_VOLUME`]
    #[error("Volume {0} is outside 0-100")]
    OutOfRange(u8),

    /// The mixer command failed
    #[error("Mixer command failed: {0}")]
    Process(#[from] ProcessError),
}

/// Issues mixer commands
pub struct VolumeController {
    runner: Arc<dyn ProcessRunner>,
    command: CommandTemplate,
}

impl VolumeController {
    /// `command` is rendered with `{volume}` set to the level in percent
    pub fn new(runner: Arc<dyn ProcessRunner>, command: CommandTemplate) -> Self {
        Self { runner, command }
    }

    /// Set the mixer level and wait for the command to finish
    pub async fn set_volume(&self, level: u8) -> Result<(), VolumeError> {
        if level > MAX_VOLUME {
            return Err(VolumeError::OutOfRange(level));
        }

        info!(level, "Setting volume");
        let level_arg = level.to_string();
        let invocation = self.command.render(&[("volume", level_arg.as_str())]);
        self.runner.run(&invocation, None).await?;
        Ok(())
    }
}

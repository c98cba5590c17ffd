//! Process-control restart adapter.
//!
//! Runs the configured command synchronously and treats a non-zero exit as
//! a failure.  The daemon relies on the service manager to relaunch it.

use std::process::Command;

use log::{info, warn};

use crate::app::ports::RestartPort;
use crate::error::RestartError;

/// [`RestartPort`] that runs an external command, e.g.
/// `sudo systemctl restart sensor.service`.
pub struct CommandRestart {
    argv: Vec<String>,
}

impl CommandRestart {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl RestartPort for CommandRestart {
    fn request_restart(&mut self) -> Result<(), RestartError> {
        let Some((program, args)) = self.argv.split_first() else {
            return Err(RestartError::Spawn("empty restart command".into()));
        };
        info!("running restart command: {}", self.argv.join(" "));
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|e| RestartError::Spawn(format!("{}: {}", program, e)))?;
        if status.success() {
            Ok(())
        } else {
            warn!("restart command exited with {}", status);
            Err(RestartError::Status(status.code()))
        }
    }
}

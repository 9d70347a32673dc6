//! Reload by running an external command (`nginx -s reload` by default).

use async_trait::async_trait;
use tokio::process::Command;

use crate::proxy::{ReloadError, Reloader};

/// Runs a fixed command line; a non-zero exit is a failed reload.
#[derive(Debug, Clone)]
pub struct CommandReloader {
    command: Vec<String>,
}

impl CommandReloader {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    fn display(&self) -> String {
        self.command.join(" ")
    }
}

#[async_trait]
impl Reloader for CommandReloader {
    async fn reload(&self) -> Result<(), ReloadError> {
        let (program, args) = self.command.split_first().ok_or(ReloadError::NoCommand)?;

        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|source| ReloadError::Spawn {
                command: self.display(),
                source,
            })?;

        if !output.status.success() {
            return Err(ReloadError::Exit {
                command: self.display(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        tracing::debug!(command = %self.display(), "Proxy reloaded");
        Ok(())
    }
}

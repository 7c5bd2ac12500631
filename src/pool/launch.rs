//! Sidecar process launching.

use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::config::LaunchConfig;
use crate::pool::sidecar::Sidecar;

/// Spawns the configured program for a slot.
#[derive(Debug, Clone)]
pub struct Launcher {
    config: LaunchConfig,
}

impl Launcher {
    pub fn new(config: LaunchConfig) -> Self {
        Self { config }
    }

    fn substitute(value: &str, sidecar: &Sidecar) -> String {
        let port = sidecar.endpoint().port_u16().map(|p| p.to_string()).unwrap_or_default();
        value
            .replace("{id}", sidecar.id().as_str())
            .replace("{slot}", &sidecar.slot().to_string())
            .replace("{port}", &port)
    }

    /// Build the command for `sidecar` without running it.
    pub fn command(&self, sidecar: &Sidecar) -> Command {
        let mut command = Command::new(&self.config.program);
        command
            .args(self.config.args.iter().map(|a| Self::substitute(a, sidecar)))
            .envs(
                self.config
                    .env
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::substitute(v, sidecar))),
            )
            .stdin(Stdio::null())
            .kill_on_drop(true);
        command
    }

    pub fn spawn(&self, sidecar: &Sidecar) -> std::io::Result<Child> {
        let child = self.command(sidecar).spawn()?;
        tracing::info!(
            sidecar = %sidecar.id(),
            program = %self.config.program,
            pid = ?child.id(),
            "Sidecar process spawned"
        );
        Ok(child)
    }
}

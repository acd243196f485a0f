/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Child-process command execution adapter

use crate::domain::CommandError;
use crate::ports::{CommandExecutor, CommandOutput, SystemCommand};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Runs executables as child processes with fully buffered output
pub struct ProcessCommandExecutor {
    /// Timeout for commands that don't set their own
    default_timeout: Duration,
}

impl ProcessCommandExecutor {
    /// Create a new process command executor
    ///
    /// # Arguments
    /// * `default_timeout` - Timeout for commands that don't set their own
    pub fn new(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }

    /// Create a process command executor with default settings
    pub fn with_defaults() -> Self {
        Self::new(Duration::from_secs(120))
    }
}

#[async_trait]
impl CommandExecutor for ProcessCommandExecutor {
    async fn execute(&self, command: &SystemCommand) -> Result<CommandOutput, CommandError> {
        let command_timeout = command.timeout.unwrap_or(self.default_timeout);

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        log::debug!("Executing: {}", command.display());

        match timeout(command_timeout, cmd.output()).await {
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();
                let success = output.status.success();
                let exit_code = output.status.code();

                if !success {
                    log::debug!(
                        "'{}' exited with {:?}: {}",
                        command.program,
                        exit_code,
                        stderr.trim()
                    );
                }

                Ok(CommandOutput {
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr,
                    exit_code,
                    success,
                })
            }
            Ok(Err(e)) => Err(CommandError::SpawnFailed {
                program: command.program.clone(),
                message: e.to_string(),
            }),
            Err(_) => Err(CommandError::TimedOut {
                program: command.program.clone(),
                seconds: command_timeout.as_secs(),
            }),
        }
    }
}

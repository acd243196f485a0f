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

//! Error types shared by the domain, ports and adapters.
//!
//! Collectors never let these escape: every capability error is converted
//! into empty data at the collector boundary and logged there.

use thiserror::Error;

/// Domain-level errors that don't expose infrastructure details
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DomainError {
    /// Data parsing failed
    #[error("Data parsing failed: {0}")]
    ParsingFailed(String),
    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Errors produced while running an external executable
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CommandError {
    /// The process could not be started (missing executable, permissions)
    #[error("Failed to start '{program}': {message}")]
    SpawnFailed { program: String, message: String },
    /// The process did not finish within its timeout
    #[error("Command '{program}' timed out after {seconds}s")]
    TimedOut { program: String, seconds: u64 },
    /// The process ran but reported failure (non-zero exit or stderr output)
    #[error("Command '{program}' failed (exit code {exit_code:?}): {stderr}")]
    Failed {
        program: String,
        exit_code: Option<i32>,
        stderr: String,
    },
}

/// Errors raised by the instrumentation capability
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InstrumentationError {
    /// The query could not be executed
    #[error("Instrumentation query failed: {0}")]
    QueryFailed(String),
    /// The query ran but its output could not be decoded
    #[error("Instrumentation output could not be decoded: {0}")]
    InvalidOutput(String),
}

impl From<CommandError> for InstrumentationError {
    fn from(err: CommandError) -> Self {
        InstrumentationError::QueryFailed(err.to_string())
    }
}

/// Errors raised by the registry capability
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    /// The key does not exist or could not be opened
    #[error("Registry key not accessible: {0}")]
    KeyNotFound(String),
    /// The named value does not exist under the key
    #[error("Registry value '{name}' not found under {key}")]
    ValueNotFound { key: String, name: String },
    /// The underlying access mechanism failed
    #[error("Registry access failed: {0}")]
    AccessFailed(String),
}

impl From<CommandError> for RegistryError {
    fn from(err: CommandError) -> Self {
        RegistryError::AccessFailed(err.to_string())
    }
}

/// Errors specific to building a report
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReportError {
    /// Domain operation failed
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// Report serialization failed
    #[error("Report serialization failed: {0}")]
    SerializationFailed(String),
}

/// Errors specific to publishing reports
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PublishError {
    /// The publish target is unusable (empty URL, bad path)
    #[error("Invalid publish target: {0}")]
    InvalidTarget(String),
    /// Network/HTTP transport failed before a response arrived
    #[error("Network operation failed: {0}")]
    Transport(String),
    /// The server answered with a non-success status
    #[error("Server rejected report with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    /// Writing the payload locally failed
    #[error("I/O error: {0}")]
    Io(String),
}

impl PublishError {
    /// Server-supplied response body, if the failure carried one
    pub fn server_body(&self) -> Option<&str> {
        match self {
            PublishError::Rejected { body, .. } if !body.is_empty() => Some(body),
            _ => None,
        }
    }
}

/// Errors raised while loading the agent configuration
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read configuration file {path}: {message}")]
    Read { path: String, message: String },
    /// The configuration file is not valid TOML for the expected schema
    #[error("Failed to parse configuration file {path}: {message}")]
    Parse { path: String, message: String },
    /// The configuration parsed but is semantically invalid
    #[error(transparent)]
    Invalid(#[from] DomainError),
}

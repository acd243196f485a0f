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

//! In-memory capability fakes shared by the unit tests

use crate::domain::{
    CommandError, InstrumentationError, PublishError, PublishTarget, RegistryError,
};
use crate::ports::{
    AssociatorQuery, CommandExecutor, CommandOutput, DataPublisher, InstrumentationQuery,
    InstrumentationRow, InstrumentationSource, RegistryReader, RegistryRoot, SystemCommand,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Build a row from `(field, value)` text pairs
pub fn row(fields: &[(&str, &str)]) -> InstrumentationRow {
    fields
        .iter()
        .fold(InstrumentationRow::new(), |row, (name, value)| row.with(name, *value))
}

/// Canned instrumentation answers keyed by class, filter fragment or
/// associator source key
#[derive(Default)]
pub struct FakeInstrumentation {
    rows: HashMap<String, Vec<InstrumentationRow>>,
    filtered: Vec<(String, String, Vec<InstrumentationRow>)>,
    associators: HashMap<(String, String), Vec<InstrumentationRow>>,
    failing: HashSet<String>,
    log: Mutex<Vec<String>>,
}

impl FakeInstrumentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows returned for any query against `class`
    pub fn with_rows(mut self, class: &str, rows: Vec<InstrumentationRow>) -> Self {
        self.rows.insert(class.to_string(), rows);
        self
    }

    /// Rows returned when the query filter contains `fragment`
    pub fn with_filtered_rows(
        mut self,
        class: &str,
        fragment: &str,
        rows: Vec<InstrumentationRow>,
    ) -> Self {
        self.filtered
            .push((class.to_string(), fragment.to_string(), rows));
        self
    }

    /// Objects associated with `key_value` through `assoc_class`
    pub fn with_associators(
        mut self,
        key_value: &str,
        assoc_class: &str,
        rows: Vec<InstrumentationRow>,
    ) -> Self {
        self.associators
            .insert((key_value.to_string(), assoc_class.to_string()), rows);
        self
    }

    /// Every query against `class` fails
    pub fn failing(mut self, class: &str) -> Self {
        self.failing.insert(class.to_string());
        self
    }

    /// WQL statements executed so far
    pub fn queries(&self) -> Vec<String> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    fn record(&self, wql: String) {
        if let Ok(mut log) = self.log.lock() {
            log.push(wql);
        }
    }

    fn check_class(&self, class: &str) -> Result<(), InstrumentationError> {
        if self.failing.contains(class) {
            Err(InstrumentationError::QueryFailed(format!(
                "{} is unavailable",
                class
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl InstrumentationSource for FakeInstrumentation {
    async fn select(
        &self,
        query: &InstrumentationQuery,
    ) -> Result<Vec<InstrumentationRow>, InstrumentationError> {
        self.record(query.to_wql());
        self.check_class(&query.class)?;

        if let Some(filter) = &query.filter {
            let matched = self
                .filtered
                .iter()
                .find(|(class, fragment, _)| *class == query.class && filter.contains(fragment));
            if let Some((_, _, rows)) = matched {
                return Ok(rows.clone());
            }
            if self.filtered.iter().any(|(class, _, _)| *class == query.class) {
                return Ok(Vec::new());
            }
        }

        Ok(self.rows.get(&query.class).cloned().unwrap_or_default())
    }

    async fn associators(
        &self,
        query: &AssociatorQuery,
    ) -> Result<Vec<InstrumentationRow>, InstrumentationError> {
        self.record(query.to_wql());
        self.check_class(&query.assoc_class)?;
        Ok(self
            .associators
            .get(&(query.key_value.clone(), query.assoc_class.clone()))
            .cloned()
            .unwrap_or_default())
    }

    async fn instances(
        &self,
        class: &str,
        _fields: &[&str],
    ) -> Result<Vec<InstrumentationRow>, InstrumentationError> {
        self.record(format!("INSTANCES {}", class));
        self.check_class(class)?;
        Ok(self.rows.get(class).cloned().unwrap_or_default())
    }
}

/// Registry tree held in maps; unknown keys and values are errors
#[derive(Default)]
pub struct FakeRegistry {
    subkeys: HashMap<String, Vec<String>>,
    values: HashMap<(String, String), String>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subkeys(mut self, path: &str, names: &[&str]) -> Self {
        self.subkeys.insert(
            path.to_string(),
            names.iter().map(|name| name.to_string()).collect(),
        );
        self
    }

    pub fn with_value(mut self, path: &str, name: &str, value: &str) -> Self {
        self.values
            .insert((path.to_string(), name.to_string()), value.to_string());
        self
    }
}

#[async_trait]
impl RegistryReader for FakeRegistry {
    async fn subkeys(&self, _root: RegistryRoot, path: &str) -> Result<Vec<String>, RegistryError> {
        self.subkeys
            .get(path)
            .cloned()
            .ok_or_else(|| RegistryError::KeyNotFound(path.to_string()))
    }

    async fn read_value(
        &self,
        _root: RegistryRoot,
        path: &str,
        name: &str,
    ) -> Result<String, RegistryError> {
        self.values
            .get(&(path.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| RegistryError::ValueNotFound {
                key: path.to_string(),
                name: name.to_string(),
            })
    }
}

/// Scripted command results keyed by the command's display line
#[derive(Default)]
pub struct FakeCommandExecutor {
    results: HashMap<String, Result<CommandOutput, CommandError>>,
    calls: Mutex<Vec<SystemCommand>>,
}

impl FakeCommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successful run printing `stdout`
    pub fn with_stdout(mut self, line: &str, stdout: &str) -> Self {
        self.results.insert(
            line.to_string(),
            Ok(CommandOutput {
                stdout: stdout.to_string(),
                stderr: String::new(),
                exit_code: Some(0),
                success: true,
            }),
        );
        self
    }

    /// Failed run with the given exit code and stderr
    pub fn with_failure(mut self, line: &str, exit_code: i32, stderr: &str) -> Self {
        self.results.insert(
            line.to_string(),
            Ok(CommandOutput {
                stdout: String::new(),
                stderr: stderr.to_string(),
                exit_code: Some(exit_code),
                success: exit_code == 0,
            }),
        );
        self
    }

    /// Commands executed so far
    pub fn calls(&self) -> Vec<SystemCommand> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CommandExecutor for FakeCommandExecutor {
    async fn execute(&self, command: &SystemCommand) -> Result<CommandOutput, CommandError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(command.clone());
        }
        self.results
            .get(&command.display())
            .cloned()
            .unwrap_or_else(|| {
                Err(CommandError::SpawnFailed {
                    program: command.program.clone(),
                    message: "program not found".to_string(),
                })
            })
    }
}

/// Publisher that rejects the first `failures` attempts
#[derive(Default)]
pub struct RecordingPublisher {
    failures: u32,
    attempts: AtomicU32,
    payloads: Mutex<Vec<String>>,
}

impl RecordingPublisher {
    pub fn failing_first(failures: u32) -> Self {
        Self {
            failures,
            ..Default::default()
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn payloads(&self) -> Vec<String> {
        self.payloads
            .lock()
            .map(|payloads| payloads.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DataPublisher for RecordingPublisher {
    async fn publish(&self, payload: &str, _target: &PublishTarget) -> Result<(), PublishError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut payloads) = self.payloads.lock() {
            payloads.push(payload.to_string());
        }
        if attempt <= self.failures {
            Err(PublishError::Rejected {
                status: 503,
                body: format!("attempt {} refused", attempt),
            })
        } else {
            Ok(())
        }
    }
}

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

//! Registry adapter backed by `reg.exe query`

use crate::domain::RegistryError;
use crate::ports::{CommandExecutor, RegistryReader, RegistryRoot, SystemCommand};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

lazy_static! {
    static ref VALUE_LINE_RE: Regex =
        Regex::new(r"^\s+(.+?)\s{4}(REG_[A-Z_]+)(?:\s{4}(.*))?$").unwrap();
}

/// Reads registry keys by running `reg query` and parsing its listing
pub struct RegExeRegistryReader {
    executor: Arc<dyn CommandExecutor>,
    program: String,
    timeout: Duration,
}

impl RegExeRegistryReader {
    pub fn new(executor: Arc<dyn CommandExecutor>, program: &str, timeout: Duration) -> Self {
        Self {
            executor,
            program: program.to_string(),
            timeout,
        }
    }

    async fn query(&self, key: &str, value: Option<&str>) -> Result<Option<String>, RegistryError> {
        let mut args = vec!["query", key];
        if let Some(name) = value {
            args.extend(["/v", name]);
        }
        let command = SystemCommand::new(&self.program)
            .args(&args)
            .timeout(self.timeout);

        let output = self.executor.execute(&command).await?;
        if output.success {
            Ok(Some(output.stdout))
        } else {
            Ok(None)
        }
    }
}

/// Full hive name as printed by `reg query`
fn long_root_name(root: RegistryRoot) -> &'static str {
    match root {
        RegistryRoot::LocalMachine => "HKEY_LOCAL_MACHINE",
        RegistryRoot::CurrentUser => "HKEY_CURRENT_USER",
    }
}

/// Immediate subkey names from a `reg query <key>` listing
pub fn parse_subkeys(output: &str, full_key: &str) -> Vec<String> {
    let prefix = format!("{}\\", full_key.trim_end_matches('\\').to_lowercase());

    output
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("HKEY_"))
        .filter_map(|line| {
            let lower = line.to_lowercase();
            if lower.starts_with(&prefix) && line.len() > prefix.len() {
                line.get(prefix.len()..).map(str::to_string)
            } else {
                None
            }
        })
        .filter(|name| !name.contains('\\'))
        .collect()
}

/// Data of the named value from a `reg query <key> /v <name>` listing
pub fn parse_value(output: &str, name: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let caps = VALUE_LINE_RE.captures(line)?;
        if caps[1].eq_ignore_ascii_case(name) {
            Some(
                caps.get(3)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default(),
            )
        } else {
            None
        }
    })
}

#[async_trait]
impl RegistryReader for RegExeRegistryReader {
    async fn subkeys(&self, root: RegistryRoot, path: &str) -> Result<Vec<String>, RegistryError> {
        let key = format!(r"{}\{}", root.as_str(), path);
        let output = self
            .query(&key, None)
            .await?
            .ok_or_else(|| RegistryError::KeyNotFound(key.clone()))?;

        let full_key = format!(r"{}\{}", long_root_name(root), path);
        Ok(parse_subkeys(&output, &full_key))
    }

    async fn read_value(
        &self,
        root: RegistryRoot,
        path: &str,
        name: &str,
    ) -> Result<String, RegistryError> {
        let key = format!(r"{}\{}", root.as_str(), path);
        let not_found = || RegistryError::ValueNotFound {
            key: key.clone(),
            name: name.to_string(),
        };

        let output = self.query(&key, Some(name)).await?.ok_or_else(not_found)?;
        parse_value(&output, name).ok_or_else(not_found)
    }
}

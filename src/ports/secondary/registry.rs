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

use crate::domain::RegistryError;
use async_trait::async_trait;

/// Registry hive a key path is resolved against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryRoot {
    LocalMachine,
    CurrentUser,
}

impl RegistryRoot {
    /// Short hive name accepted by the registry tooling
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryRoot::LocalMachine => "HKLM",
            RegistryRoot::CurrentUser => "HKCU",
        }
    }
}

/// Secondary port - Registry capability
///
/// Read-only access to the hierarchical key/value store. Callers treat
/// every error as "skip this key".
#[async_trait]
pub trait RegistryReader: Send + Sync {
    /// List the immediate subkey names under a key
    ///
    /// # Arguments
    /// * `root` - Hive the path is resolved against
    /// * `path` - Key path below the hive, backslash separated
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - Subkey names (last path component only)
    /// * `Err(RegistryError)` - The key could not be opened
    async fn subkeys(&self, root: RegistryRoot, path: &str) -> Result<Vec<String>, RegistryError>;

    /// Read one named string value
    ///
    /// # Arguments
    /// * `root` - Hive the path is resolved against
    /// * `path` - Key path below the hive
    /// * `name` - Value name
    ///
    /// # Returns
    /// * `Ok(String)` - The value data
    /// * `Err(RegistryError)` - Key or value missing, or access failed
    async fn read_value(
        &self,
        root: RegistryRoot,
        path: &str,
        name: &str,
    ) -> Result<String, RegistryError>;
}

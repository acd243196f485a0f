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

//! TOML file configuration provider

use crate::domain::{AgentConfig, ConfigError};
use crate::ports::ConfigurationProvider;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Loads [`AgentConfig`] from a TOML file; omitted keys keep their defaults
pub struct TomlConfigurationProvider {
    path: PathBuf,
}

impl TomlConfigurationProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse and validate configuration text
pub fn parse_config(content: &str, origin: &str) -> Result<AgentConfig, ConfigError> {
    let config: AgentConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
        path: origin.to_string(),
        message: e.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}

#[async_trait]
impl ConfigurationProvider for TomlConfigurationProvider {
    async fn load_config(&self) -> Result<AgentConfig, ConfigError> {
        let origin = self.path.display().to_string();
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ConfigError::Read {
                path: origin.clone(),
                message: e.to_string(),
            })?;

        let config = parse_config(&content, &origin)?;
        log::debug!("Loaded configuration from {origin}");
        Ok(config)
    }
}

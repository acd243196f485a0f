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

use crate::domain::{AgentConfig, ConfigError};
use async_trait::async_trait;

/// Secondary port - Configuration provider abstraction
///
/// Configuration is loaded once at service start and never re-read.
#[async_trait]
pub trait ConfigurationProvider: Send + Sync {
    /// Load and validate the agent configuration
    ///
    /// # Returns
    /// * `Ok(AgentConfig)` - Validated configuration
    /// * `Err(ConfigError)` - The source could not be read, parsed or validated
    async fn load_config(&self) -> Result<AgentConfig, ConfigError>;
}

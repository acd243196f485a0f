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

//! Agent configuration, loaded once at service start

use super::errors::DomainError;
use serde::Deserialize;
use std::time::Duration;

/// Complete agent configuration
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    /// Inventory server connection
    pub server: ServerConfig,
    /// Recurring job and retry policy
    pub job: JobConfig,
    /// Collector tooling
    pub collectors: CollectorConfig,
}

impl AgentConfig {
    /// Check values that would make the agent unusable
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.server.base_url.trim().is_empty() {
            return Err(DomainError::InvalidConfiguration(
                "server.base_url must not be empty".to_string(),
            ));
        }
        if self.job.interval_secs == 0 {
            return Err(DomainError::InvalidConfiguration(
                "job.interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Where reports are posted
    pub fn publish_target(&self) -> PublishTarget {
        PublishTarget {
            base_url: self.server.base_url.clone(),
            path: self.server.path.clone(),
            username: self.server.username.clone(),
            api_key: self.server.api_key.clone(),
        }
    }

    /// Retry behaviour for one reporting cycle
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_tries: self.job.max_tries.max(1),
            retry_interval: Duration::from_secs(self.job.retry_interval_secs),
        }
    }
}

/// Inventory server connection settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    /// Path suffix appended to `base_url`
    pub path: String,
    pub username: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub skip_tls_verify: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            path: "/api/v0.9/windowsdevice".to_string(),
            username: String::new(),
            api_key: String::new(),
            timeout_secs: 30,
            skip_tls_verify: false,
        }
    }
}

/// Recurring job settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct JobConfig {
    pub interval_secs: u64,
    pub max_tries: u32,
    pub retry_interval_secs: u64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            max_tries: 3,
            retry_interval_secs: 60,
        }
    }
}

/// External tools used by the collectors
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CollectorConfig {
    pub fcinfo_path: String,
    pub powershell_path: String,
    pub reg_path: String,
    pub command_timeout_secs: u64,
    pub include_results_priority: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            fcinfo_path: "fcinfo".to_string(),
            powershell_path: "powershell".to_string(),
            reg_path: "reg".to_string(),
            command_timeout_secs: 120,
            include_results_priority: true,
        }
    }
}

/// Destination of the report POST
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishTarget {
    pub base_url: String,
    pub path: String,
    pub username: String,
    pub api_key: String,
}

impl PublishTarget {
    /// Endpoint URL without credentials, safe to log
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = self.path.trim_matches('/');
        if path.is_empty() {
            format!("{base}/")
        } else {
            format!("{base}/{path}/")
        }
    }

    /// Credentials carried as query parameters
    pub fn query(&self) -> [(&'static str, &str); 2] {
        [("username", &self.username), ("api_key", &self.api_key)]
    }
}

/// Fixed-delay retry policy for report delivery
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_tries: u32,
    pub retry_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_tries: 3,
            retry_interval: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: AgentConfig = toml::from_str(
            r#"
            [server]
            base_url = "https://ralph.example.com"
            api_key = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.base_url, "https://ralph.example.com");
        assert_eq!(config.server.path, "/api/v0.9/windowsdevice");
        assert_eq!(config.job, JobConfig::default());
        assert_eq!(config.collectors.fcinfo_path, "fcinfo");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_tries_becomes_single_attempt() {
        let mut config = AgentConfig::default();
        config.job.max_tries = 0;
        config.job.retry_interval_secs = 5;
        let policy = config.retry_policy();
        assert_eq!(policy.max_tries, 1);
        assert_eq!(policy.retry_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_validate_rejects_empty_url_and_zero_interval() {
        let mut config = AgentConfig::default();
        config.server.base_url = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = AgentConfig::default();
        config.job.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_endpoint_joins_base_and_path() {
        let target = PublishTarget {
            base_url: "http://ralph.local/".to_string(),
            path: "/api/v0.9/windowsdevice".to_string(),
            username: "agent".to_string(),
            api_key: "k".to_string(),
        };
        assert_eq!(target.endpoint(), "http://ralph.local/api/v0.9/windowsdevice/");

        let bare = PublishTarget {
            base_url: "http://ralph.local".to_string(),
            path: String::new(),
            ..Default::default()
        };
        assert_eq!(bare.endpoint(), "http://ralph.local/");
        assert_eq!(target.query()[0], ("username", "agent"));
    }
}

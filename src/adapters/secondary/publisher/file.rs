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

//! File-based data publisher for dry runs

use crate::domain::{PublishError, PublishTarget};
use crate::ports::DataPublisher;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Writes each payload to a local file instead of posting it
pub struct FileDataPublisher {
    path: PathBuf,
}

impl FileDataPublisher {
    /// Create a new file data publisher
    ///
    /// # Arguments
    /// * `path` - Destination file, replaced on every publish
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DataPublisher for FileDataPublisher {
    async fn publish(&self, payload: &str, target: &PublishTarget) -> Result<(), PublishError> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PublishError::Io(format!("Failed to create directory: {}", e)))?;
        }

        fs::write(&self.path, payload)
            .await
            .map_err(|e| PublishError::Io(format!("Failed to write {}: {}", self.path.display(), e)))?;

        log::info!(
            "Report for {} written to {}",
            target.endpoint(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use predicates::prelude::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_writes_payload_creating_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("report.json");
        let publisher = FileDataPublisher::new(&path);

        publisher
            .publish(r#"{"data":{}}"#, &PublishTarget::default())
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"{"data":{}}"#);
    }

    #[tokio::test]
    async fn test_existing_file_is_replaced() {
        let temp = assert_fs::TempDir::new().unwrap();
        let report = temp.child("report.json");
        report.write_str("stale content that is longer").unwrap();

        FileDataPublisher::new(report.path())
            .publish(r#"{"fresh":true}"#, &PublishTarget::default())
            .await
            .unwrap();

        report.assert(predicate::str::contains("fresh").and(predicate::str::contains("stale").not()));
    }
}

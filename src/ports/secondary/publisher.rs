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

use crate::domain::{PublishError, PublishTarget};
use async_trait::async_trait;

/// Secondary port - Report delivery abstraction
///
/// Delivers one serialized report payload, normally to the inventory server.
#[async_trait]
pub trait DataPublisher: Send + Sync {
    /// Publish a serialized report
    ///
    /// # Arguments
    /// * `payload` - The JSON document to send
    /// * `target` - Endpoint and credentials
    ///
    /// # Returns
    /// * `Ok(())` - The server accepted the report (2xx)
    /// * `Err(PublishError)` - Transport failure or non-success status
    async fn publish(&self, payload: &str, target: &PublishTarget) -> Result<(), PublishError>;
}

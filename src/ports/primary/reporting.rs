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

use crate::domain::{CycleOutcome, InventoryReport, PublishError, ReportError};
use async_trait::async_trait;

/// Primary port - Main interface offered by the inventory domain
///
/// This is what the service host (scheduler, CLI) uses to drive
/// collection and delivery.
#[async_trait]
pub trait InventoryReportingService: Send + Sync {
    /// Collect every category for the current host
    ///
    /// Collection never fails as a whole; unavailable categories are empty.
    async fn collect_report(&self) -> InventoryReport;

    /// Collect and serialize a complete report envelope
    ///
    /// # Returns
    /// * `Ok(String)` - JSON payload ready to send
    /// * `Err(ReportError)` - Serialization failed
    async fn build_payload(&self) -> Result<String, ReportError>;

    /// Send one payload to the configured server, without retrying
    ///
    /// # Arguments
    /// * `payload` - Serialized report
    ///
    /// # Returns
    /// * `Ok(())` - Server accepted the report
    /// * `Err(PublishError)` - Delivery failed
    async fn publish_payload(&self, payload: &str) -> Result<(), PublishError>;

    /// Run one complete build-and-send cycle with retries
    ///
    /// Never returns an error; the outcome says whether delivery succeeded
    /// and how many attempts were made.
    async fn run_cycle(&self) -> CycleOutcome;
}

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

//! Windows hardware inventory agent
//!
//! Collects the host's hardware and installed software through the management
//! instrumentation, the registry and the fibre-channel diagnostic tool, and
//! posts the result as JSON to a remote inventory server on a fixed interval.
//!
//! # Architecture
//!
//! - **Domain**: records, blacklists, collectors, serializer and the reporting job
//! - **Ports**: interfaces for external interactions
//! - **Adapters**: PowerShell, `reg.exe`, process, HTTP and file implementations
//!
//! # Usage
//!
//! ```rust,no_run
//! use donpedro::{AgentConfig, InventoryReportingService};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = donpedro::create_service(AgentConfig::default()).await?;
//!
//!     let payload = service.build_payload().await?;
//!     println!("{payload}");
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod container;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod testing;

pub use adapters::{
    CimInstrumentationSource, FileDataPublisher, HttpDataPublisher, ProcessCommandExecutor,
    RegExeRegistryReader, TomlConfigurationProvider,
};
pub use container::ServiceContainer;
pub use domain::{
    AgentConfig, CycleOutcome, Detector, InventoryCollectionService, InventoryReport,
    PublishError, ReportError, ReportScheduler,
};
pub use ports::{
    CommandExecutor, ConfigurationProvider, DataPublisher, InstrumentationSource,
    InventoryReportingService, RegistryReader,
};

use std::error::Error;
use std::sync::Arc;

/// Create an inventory reporting service that posts to the configured server
///
/// Probes the host once (OS generation, vendor) before returning.
pub async fn create_service(
    config: AgentConfig,
) -> Result<Arc<dyn InventoryReportingService>, Box<dyn Error>> {
    ServiceContainer::new(config)?
        .create_reporting_service()
        .await
}

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

//! Dependency injection container for the inventory agent

use crate::adapters::{
    CimInstrumentationSource, FileDataPublisher, HttpDataPublisher, ProcessCommandExecutor,
    RegExeRegistryReader,
};
use crate::domain::collectors::FibreChannelProbe;
use crate::domain::{
    AgentConfig, Detector, DomainError, InventoryCollectionService, ReportScheduler,
};
use crate::ports::{
    CommandExecutor, DataPublisher, InstrumentationSource, InventoryReportingService,
    RegistryReader,
};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Wires adapters to the domain services from one loaded configuration
pub struct ServiceContainer {
    config: AgentConfig,
    output: Option<PathBuf>,
}

impl ServiceContainer {
    /// Container that posts reports to the configured server
    ///
    /// Rejects configurations the scheduler cannot run with.
    pub fn new(config: AgentConfig) -> Result<Self, DomainError> {
        config.validate()?;
        Ok(Self {
            config,
            output: None,
        })
    }

    /// Write reports to `path` instead of posting them
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.config.collectors.command_timeout_secs)
    }

    /// Create the command executor
    pub fn create_command_executor(&self) -> Arc<dyn CommandExecutor> {
        Arc::new(ProcessCommandExecutor::new(self.command_timeout()))
    }

    /// Create the management instrumentation source
    pub fn create_instrumentation_source(
        &self,
        executor: Arc<dyn CommandExecutor>,
    ) -> Arc<dyn InstrumentationSource> {
        Arc::new(CimInstrumentationSource::new(
            executor,
            &self.config.collectors.powershell_path,
            self.command_timeout(),
        ))
    }

    /// Create the registry reader
    pub fn create_registry_reader(
        &self,
        executor: Arc<dyn CommandExecutor>,
    ) -> Arc<dyn RegistryReader> {
        Arc::new(RegExeRegistryReader::new(
            executor,
            &self.config.collectors.reg_path,
            self.command_timeout(),
        ))
    }

    /// Create the fibre channel tool probe
    pub fn create_fibre_channel_probe(
        &self,
        executor: Arc<dyn CommandExecutor>,
    ) -> FibreChannelProbe {
        FibreChannelProbe::new(
            executor,
            &self.config.collectors.fcinfo_path,
            self.command_timeout(),
        )
    }

    /// Create the detector; probes the host once to pick collection strategies
    pub async fn create_detector(&self) -> Arc<Detector> {
        let executor = self.create_command_executor();
        let detector = Detector::detect(
            self.create_instrumentation_source(executor.clone()),
            self.create_registry_reader(executor.clone()),
            self.create_fibre_channel_probe(executor),
        )
        .await;
        Arc::new(detector)
    }

    /// Create the report publisher: file output if requested, HTTP otherwise
    pub fn create_data_publisher(&self) -> Result<Arc<dyn DataPublisher>, Box<dyn Error>> {
        if let Some(path) = &self.output {
            return Ok(Arc::new(FileDataPublisher::new(path.clone())));
        }

        let http_publisher = HttpDataPublisher::new(
            Duration::from_secs(self.config.server.timeout_secs),
            self.config.server.skip_tls_verify,
        )?;
        Ok(Arc::new(http_publisher))
    }

    /// Create the complete inventory reporting service
    pub async fn create_reporting_service(
        &self,
    ) -> Result<Arc<dyn InventoryReportingService>, Box<dyn Error>> {
        let publisher = self.create_data_publisher()?;
        let detector = self.create_detector().await;

        let service = InventoryCollectionService::new(
            detector,
            publisher,
            self.config.publish_target(),
            self.config.retry_policy(),
            self.config.collectors.include_results_priority,
        );
        Ok(Arc::new(service))
    }

    /// Create the recurring job around a reporting service
    pub fn create_scheduler(&self, service: Arc<dyn InventoryReportingService>) -> ReportScheduler {
        ReportScheduler::new(service, Duration::from_secs(self.config.job.interval_secs))
    }
}

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

//! Fibre-channel adapters, from the `fcinfo` tool or from instrumentation

use super::{field_or_default, rows_or_empty};
use crate::domain::entities::FibreChannelRecord;
use crate::domain::parsers::fcinfo::{find_wwn_for_serial, parse_adapter_details};
use crate::ports::{CommandExecutor, InstrumentationQuery, InstrumentationSource, SystemCommand};
use std::sync::Arc;
use std::time::Duration;

/// Runs the fibre-channel diagnostic tool and parses its reports
pub struct FibreChannelProbe {
    executor: Arc<dyn CommandExecutor>,
    program: String,
    timeout: Duration,
}

impl FibreChannelProbe {
    pub fn new(executor: Arc<dyn CommandExecutor>, program: &str, timeout: Duration) -> Self {
        Self {
            executor,
            program: program.to_string(),
            timeout,
        }
    }

    /// Adapters reported by the tool; empty if the tool is missing or fails
    pub async fn collect(&self) -> Vec<FibreChannelRecord> {
        let Some(details) = self.run("/details").await else {
            return Vec::new();
        };

        let mut adapters = parse_adapter_details(&details);
        if adapters.iter().all(|a| a.serial_number.is_empty()) {
            return adapters;
        }

        if let Some(ports) = self.run("/ports").await {
            for adapter in adapters.iter_mut().filter(|a| !a.serial_number.is_empty()) {
                adapter.wwn = find_wwn_for_serial(&ports, &adapter.serial_number).unwrap_or_default();
            }
        }

        adapters
    }

    async fn run(&self, argument: &str) -> Option<String> {
        let command = SystemCommand::new(&self.program)
            .args(&[argument])
            .timeout(self.timeout);

        let result = self
            .executor
            .execute(&command)
            .await
            .and_then(|output| output.into_result(&self.program));

        match result {
            Ok(output) => Some(output.stdout),
            Err(e) => {
                log::warn!("Fibre-channel probe '{}' unavailable: {}", command.display(), e);
                None
            }
        }
    }
}

/// Fibre-channel controllers as seen by instrumentation
pub async fn collect_instrumentation_fibre_channel(
    source: &dyn InstrumentationSource,
) -> Vec<FibreChannelRecord> {
    let query = InstrumentationQuery::new("Win32_SCSIController")
        .fields(&["Caption", "DeviceID"])
        .filter("Caption LIKE '%Fibre Channel Adapter%' OR Caption LIKE '%HBA%'");

    rows_or_empty("fibre channel controllers", source.select(&query).await)
        .iter()
        .map(|row| {
            let caption = field_or_default(row, "Caption");
            let device_id = field_or_default(row, "DeviceID");
            FibreChannelRecord {
                physical_id: device_id.rsplit('&').next().unwrap_or_default().to_string(),
                label: caption.clone(),
                model_name: caption,
                ..Default::default()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{row, FakeCommandExecutor, FakeInstrumentation};

    const DETAILS: &str = "\
Adapter: com.qlogic-QLE2462-0
Descrp: QLogic Fibre Channel Adapter
Model: QLE2462
Manfac: QLogic Corporation
SerNum: RFC0812K12345

";

    const PORTS: &str = "\
com.qlogic-QLE2462-0: PortWWN: 21:00:00:1b:32:0a:bc:de \\Device\\ScsiPort2 RFC0812K12345
";

    fn probe(executor: FakeCommandExecutor) -> FibreChannelProbe {
        FibreChannelProbe::new(Arc::new(executor), "fcinfo", Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_probe_parses_details_and_fills_wwn() {
        let executor = FakeCommandExecutor::new()
            .with_stdout("fcinfo /details", DETAILS)
            .with_stdout("fcinfo /ports", PORTS);

        let adapters = probe(executor).collect().await;
        assert_eq!(adapters.len(), 1);
        assert_eq!(adapters[0].physical_id, "0");
        assert_eq!(adapters[0].model_name, "QLogic Corporation QLE2462");
        assert_eq!(adapters[0].serial_number, "RFC0812K12345");
        assert_eq!(adapters[0].wwn, "2100001B320ABCDE");
    }

    #[tokio::test]
    async fn test_probe_failure_yields_empty() {
        let executor = FakeCommandExecutor::new().with_failure("fcinfo /details", 1, "no HBA driver");
        assert!(probe(executor).collect().await.is_empty());

        // tool missing entirely
        assert!(probe(FakeCommandExecutor::new()).collect().await.is_empty());
    }

    #[tokio::test]
    async fn test_probe_without_ports_report_leaves_wwn_empty() {
        let executor = FakeCommandExecutor::new().with_stdout("fcinfo /details", DETAILS);
        let adapters = probe(executor).collect().await;
        assert_eq!(adapters.len(), 1);
        assert_eq!(adapters[0].wwn, "");
    }

    #[tokio::test]
    async fn test_instrumentation_controllers() {
        let source = FakeInstrumentation::new().with_rows(
            "Win32_SCSIController",
            vec![row(&[
                ("Caption", "Emulex LightPulse HBA - Storport Miniport Driver"),
                ("DeviceID", r"PCI\VEN_10DF&DEV_FE00&SUBSYS_FE0010DF&REV_02\4&2A0B2C8&0&0020"),
            ])],
        );

        let cards = collect_instrumentation_fibre_channel(&source).await;
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].physical_id, "0020");
        assert_eq!(cards[0].label, cards[0].model_name);
    }
}

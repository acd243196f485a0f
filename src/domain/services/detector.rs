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

use crate::domain::collectors::{
    collect_device, collect_disk_shares, collect_ethernets, collect_instrumentation_fibre_channel,
    collect_memory, collect_operating_system, collect_product_software,
    collect_registry_software, collect_storage, detect_host_profile, ip_addresses, mac_addresses,
    select_disk_serial_source, select_processor_collector, DiskSerialSource, FibreChannelProbe,
    HostProfile, ProcessorCollector,
};
use crate::domain::entities::{
    DeviceRecord, DiskShareRecord, EthernetRecord, FibreChannelRecord, InventoryReport,
    MemoryRecord, OperatingSystemRecord, ProcessorRecord, SoftwareRecord, StorageRecord,
};
use crate::ports::{InstrumentationSource, RegistryReader};
use log::{debug, info};
use std::sync::Arc;

/// Facade over every collector
///
/// The host profile is detected once at construction and selects the
/// processor and disk-serial strategies for the lifetime of the detector.
pub struct Detector {
    instrumentation: Arc<dyn InstrumentationSource>,
    registry: Arc<dyn RegistryReader>,
    fibre_channel_probe: FibreChannelProbe,
    profile: HostProfile,
    processor_collector: Box<dyn ProcessorCollector>,
    disk_serials: Box<dyn DiskSerialSource>,
}

impl Detector {
    /// Detect the host profile and build a detector for it
    pub async fn detect(
        instrumentation: Arc<dyn InstrumentationSource>,
        registry: Arc<dyn RegistryReader>,
        fibre_channel_probe: FibreChannelProbe,
    ) -> Self {
        let profile = detect_host_profile(instrumentation.as_ref()).await;
        info!(
            "Detected OS major version {} ({:?}), vendor '{}'{}",
            profile.os_major_version,
            profile.generation(),
            profile.vendor,
            if profile.is_virtual() { ", virtual host" } else { "" }
        );
        Self::with_profile(instrumentation, registry, fibre_channel_probe, profile)
    }

    /// Build a detector for an already known host profile
    pub fn with_profile(
        instrumentation: Arc<dyn InstrumentationSource>,
        registry: Arc<dyn RegistryReader>,
        fibre_channel_probe: FibreChannelProbe,
        profile: HostProfile,
    ) -> Self {
        let generation = profile.generation();
        Self {
            instrumentation,
            registry,
            fibre_channel_probe,
            processor_collector: select_processor_collector(generation),
            disk_serials: select_disk_serial_source(generation),
            profile,
        }
    }

    pub fn profile(&self) -> &HostProfile {
        &self.profile
    }

    pub async fn processors(&self) -> Vec<ProcessorRecord> {
        self.processor_collector
            .collect(self.instrumentation.as_ref(), &self.profile)
            .await
    }

    pub async fn memory(&self) -> Vec<MemoryRecord> {
        collect_memory(self.instrumentation.as_ref()).await
    }

    pub async fn storage(&self) -> Vec<StorageRecord> {
        collect_storage(self.instrumentation.as_ref(), self.disk_serials.as_ref()).await
    }

    pub async fn ethernets(&self) -> Vec<EthernetRecord> {
        collect_ethernets(self.instrumentation.as_ref()).await
    }

    /// Adapters from the diagnostic tool, or from instrumentation when the
    /// tool reports nothing
    pub async fn fibre_channel(&self) -> Vec<FibreChannelRecord> {
        let cards = self.fibre_channel_probe.collect().await;
        if !cards.is_empty() {
            return cards;
        }
        debug!("Fibre-channel tool reported no adapters, querying instrumentation");
        collect_instrumentation_fibre_channel(self.instrumentation.as_ref()).await
    }

    pub async fn disk_shares(&self) -> Vec<DiskShareRecord> {
        collect_disk_shares(self.instrumentation.as_ref()).await
    }

    /// Registry software, or `Win32_Product` when the registry lists nothing
    pub async fn software(&self) -> Vec<SoftwareRecord> {
        let software = collect_registry_software(self.registry.as_ref()).await;
        if !software.is_empty() {
            return software;
        }
        debug!("Registry lists no software, querying installed products");
        collect_product_software(self.instrumentation.as_ref()).await
    }

    pub async fn device(&self) -> DeviceRecord {
        collect_device(self.instrumentation.as_ref()).await
    }

    pub async fn operating_system(
        &self,
        processors: &[ProcessorRecord],
        storage: &[StorageRecord],
    ) -> OperatingSystemRecord {
        collect_operating_system(self.instrumentation.as_ref(), processors, storage).await
    }

    /// Collect every category, one after another, in a fixed order
    pub async fn collect_all(&self) -> InventoryReport {
        let device = self.device().await;
        let ethernets = self.ethernets().await;
        let storage = self.storage().await;
        let fibre_channel = self.fibre_channel().await;
        let disk_shares = self.disk_shares().await;
        let memory = self.memory().await;
        let processors = self.processors().await;
        let software = self.software().await;
        let operating_system = self.operating_system(&processors, &storage).await;

        debug!(
            "Collected {} processors, {} memory modules, {} volumes, {} adapters, {} packages",
            processors.len(),
            memory.len(),
            storage.len(),
            ethernets.len(),
            software.len()
        );

        InventoryReport {
            device,
            mac_addresses: mac_addresses(&ethernets),
            ip_addresses: ip_addresses(&ethernets),
            ethernets,
            storage,
            fibre_channel,
            disk_shares,
            memory,
            processors,
            software,
            operating_system,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::collectors::UNINSTALL_KEY;
    use crate::testing::{row, FakeCommandExecutor, FakeInstrumentation, FakeRegistry};
    use std::time::Duration;

    fn detector(
        source: FakeInstrumentation,
        registry: FakeRegistry,
        executor: FakeCommandExecutor,
    ) -> Detector {
        Detector::with_profile(
            Arc::new(source),
            Arc::new(registry),
            FibreChannelProbe::new(Arc::new(executor), "fcinfo", Duration::from_secs(5)),
            HostProfile::default(),
        )
    }

    /// One partition holding one volume of `size_mib` on drive `index`
    fn with_volume(source: FakeInstrumentation, index: u32, size_mib: u64) -> FakeInstrumentation {
        let device_id = format!(r"\\.\PHYSICALDRIVE{}", index);
        let partition = format!("Disk #{}, Partition #0", index);
        let size = (size_mib * 1024 * 1024).to_string();
        source
            .with_associators(
                &device_id,
                "Win32_DiskDriveToDiskPartition",
                vec![row(&[("DeviceID", partition.as_str())])],
            )
            .with_associators(
                &partition,
                "Win32_LogicalDiskToPartition",
                vec![row(&[("Caption", "C:"), ("Size", size.as_str())])],
            )
    }

    fn disk_row(index: u32, caption: &str) -> crate::ports::InstrumentationRow {
        let device_id = format!(r"\\.\PHYSICALDRIVE{}", index);
        let serial = format!("SN{}", index);
        row(&[
            ("Caption", caption),
            ("DeviceID", device_id.as_str()),
            ("SerialNumber", serial.as_str()),
            ("Model", caption),
        ])
    }

    #[tokio::test]
    async fn test_collect_all_derives_os_totals() {
        let source = FakeInstrumentation::new()
            .with_rows(
                "Win32_Processor",
                vec![
                    row(&[("Name", "CPU A"), ("NumberOfCores", "4")]),
                    row(&[("Name", "CPU B"), ("NumberOfCores", "8")]),
                ],
            )
            .with_rows(
                "Win32_DiskDrive",
                vec![
                    disk_row(0, "ST3500418AS ATA Device"),
                    disk_row(1, "WDC WD2002FAEX ATA Device"),
                    disk_row(2, "VMware Virtual disk SCSI Disk Device"),
                ],
            )
            .with_rows(
                "Win32_OperatingSystem",
                vec![row(&[("Caption", "Windows Server 2008 R2")])],
            );
        let source = with_volume(source, 0, 100);
        let source = with_volume(source, 1, 200);
        let source = with_volume(source, 2, 300);

        let report = detector(source, FakeRegistry::new(), FakeCommandExecutor::new())
            .collect_all()
            .await;

        assert_eq!(report.processors.len(), 2);
        assert_eq!(report.storage.len(), 2);
        assert_eq!(report.operating_system.cores_count, "12");
        assert_eq!(report.operating_system.storage, "300");
        assert_eq!(report.operating_system.label, "Windows Server 2008 R2");
    }

    #[tokio::test]
    async fn test_fibre_channel_falls_back_to_instrumentation() {
        let source = FakeInstrumentation::new().with_rows(
            "Win32_SCSIController",
            vec![row(&[("Caption", "QLogic Fibre Channel Adapter"), ("DeviceID", "PCI&0&00E0")])],
        );
        let executor = FakeCommandExecutor::new().with_failure("fcinfo /details", 1, "not found");

        let cards = detector(source, FakeRegistry::new(), executor)
            .fibre_channel()
            .await;
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].physical_id, "00E0");
        assert_eq!(cards[0].model_name, "QLogic Fibre Channel Adapter");
    }

    #[tokio::test]
    async fn test_probe_results_suppress_instrumentation() {
        let source = FakeInstrumentation::new().with_rows(
            "Win32_SCSIController",
            vec![row(&[("Caption", "Some HBA"), ("DeviceID", "PCI&1")])],
        );
        let executor = Arc::new(
            FakeCommandExecutor::new()
                .with_stdout("fcinfo /details", "Adapter: HBA-7\nDescrp: From tool\n"),
        );
        let detector = Detector::with_profile(
            Arc::new(source),
            Arc::new(FakeRegistry::new()),
            FibreChannelProbe::new(executor.clone(), "fcinfo", Duration::from_secs(5)),
            HostProfile::default(),
        );

        let cards = detector.fibre_channel().await;
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].label, "From tool");

        // no serial reported, so the ports listing is never requested
        let calls: Vec<String> = executor.calls().iter().map(|c| c.display()).collect();
        assert_eq!(calls, vec!["fcinfo /details"]);
    }

    #[tokio::test]
    async fn test_registry_software_is_preferred() {
        let source = FakeInstrumentation::new().with_rows(
            "Win32_Product",
            vec![row(&[("Name", "From WMI"), ("Version", "1")])],
        );
        let path = format!(r"{}\{}", UNINSTALL_KEY, "app");
        let registry = FakeRegistry::new()
            .with_subkeys(UNINSTALL_KEY, &["app"])
            .with_value(&path, "DisplayName", "From registry")
            .with_value(&path, "Publisher", "Vendor")
            .with_value(&path, "DisplayVersion", "2");

        let detector = detector(source, registry, FakeCommandExecutor::new());
        let software = detector.software().await;
        assert_eq!(software.len(), 1);
        assert_eq!(software[0].label, "From registry");
    }

    #[tokio::test]
    async fn test_software_falls_back_to_products() {
        let source = FakeInstrumentation::new().with_rows(
            "Win32_Product",
            vec![row(&[("Name", "From WMI"), ("Version", "1")])],
        );
        let software = detector(source, FakeRegistry::new(), FakeCommandExecutor::new())
            .software()
            .await;
        assert_eq!(software.len(), 1);
        assert_eq!(software[0].label, "From WMI");
        assert_eq!(software[0].model_name, "From WMI");
        assert_eq!(software[0].path, " - From WMI - 1");
    }

    #[tokio::test]
    async fn test_detect_reads_profile_once() {
        let source = FakeInstrumentation::new()
            .with_rows("Win32_OperatingSystem", vec![row(&[("Version", "5.2.3790")])])
            .with_rows("Win32_ComputerSystemProduct", vec![row(&[("Vendor", "Xen")])]);

        let detector = Detector::detect(
            Arc::new(source),
            Arc::new(FakeRegistry::new()),
            FibreChannelProbe::new(
                Arc::new(FakeCommandExecutor::new()),
                "fcinfo",
                Duration::from_secs(5),
            ),
        )
        .await;

        assert_eq!(detector.profile().os_major_version, 5);
        assert!(detector.profile().is_virtual());
    }

    #[tokio::test]
    async fn test_everything_failing_still_produces_a_report() {
        let source = FakeInstrumentation::new()
            .failing("Win32_Processor")
            .failing("Win32_DiskDrive")
            .failing("Win32_OperatingSystem")
            .failing("Win32_ComputerSystemProduct");

        let report = detector(source, FakeRegistry::new(), FakeCommandExecutor::new())
            .collect_all()
            .await;
        assert!(report.processors.is_empty());
        assert_eq!(report.operating_system.cores_count, "0");
        assert_eq!(report.device, DeviceRecord::default());
    }
}

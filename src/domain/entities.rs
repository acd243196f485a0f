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

//! Inventory records gathered in one report cycle.
//!
//! Every record is a flat, ordered set of text fields. Values stay text even
//! where the underlying quantity is numeric, so partially-read rows can be
//! represented without per-type special cases. Field names returned by
//! [`Record::fields`] use the internal `PascalCase` convention; the serializer
//! rewrites them for the wire.

/// A flat inventory record with a fixed, ordered field set
pub trait Record {
    /// Ordered `(internal field name, value)` pairs
    fn fields(&self) -> Vec<(&'static str, &str)>;
}

/// Physical processor (socket)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessorRecord {
    pub label: String,
    /// Maximum clock speed in MHz
    pub speed: String,
    pub cores: String,
    pub logical_processors: String,
    /// Device id, e.g. `CPU0`
    pub index: String,
    pub description: String,
    pub manufacturer: String,
    pub caption: String,
    /// `"true"` for 64-bit processors
    pub x64: String,
    pub model_name: String,
}

impl Record for ProcessorRecord {
    fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Label", &self.label),
            ("Speed", &self.speed),
            ("Cores", &self.cores),
            ("NumberOfLogicalProcessors", &self.logical_processors),
            ("Index", &self.index),
            ("Description", &self.description),
            ("Manufacturer", &self.manufacturer),
            ("Caption", &self.caption),
            ("X64", &self.x64),
            ("ModelName", &self.model_name),
        ]
    }
}

/// Memory module, or the synthetic whole-system entry on virtual hosts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryRecord {
    pub label: String,
    /// Size in MiB
    pub size: String,
    pub speed: String,
    /// Slot designation
    pub index: String,
    pub serial_number: String,
    pub caption: String,
}

impl Record for MemoryRecord {
    fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Label", &self.label),
            ("Size", &self.size),
            ("Speed", &self.speed),
            ("Index", &self.index),
            ("SerialNumber", &self.serial_number),
            ("Caption", &self.caption),
        ]
    }
}

/// Logical volume on a physical disk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageRecord {
    pub label: String,
    pub serial_number: String,
    pub mount_point: String,
    /// Size in MiB
    pub size: String,
}

impl Record for StorageRecord {
    fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Label", &self.label),
            ("SerialNumber", &self.serial_number),
            ("MountPoint", &self.mount_point),
            ("Size", &self.size),
        ]
    }
}

/// Ethernet adapter with its primary address configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EthernetRecord {
    pub label: String,
    /// Canonical MAC (no separators, upper case)
    pub mac: String,
    pub speed: String,
    pub ip_address: String,
    pub subnet_mask: String,
}

impl Record for EthernetRecord {
    fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Label", &self.label),
            ("Mac", &self.mac),
            ("Speed", &self.speed),
            ("IPAddress", &self.ip_address),
            ("SubnetMask", &self.subnet_mask),
        ]
    }
}

/// Compact MAC entry used in the `mac_addresses` list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacAddressRecord {
    pub mac: String,
}

impl Record for MacAddressRecord {
    fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![("Mac", &self.mac)]
    }
}

/// Compact address entry used in the `system_ip_addresses` list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpAddressRecord {
    pub address: String,
}

impl Record for IpAddressRecord {
    fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![("IPAddress", &self.address)]
    }
}

/// Fibre-channel host bus adapter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FibreChannelRecord {
    pub physical_id: String,
    pub label: String,
    pub model_name: String,
    pub manufacturer: String,
    pub serial_number: String,
    pub wwn: String,
}

impl Record for FibreChannelRecord {
    fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("PhysicalId", &self.physical_id),
            ("Label", &self.label),
            ("ModelName", &self.model_name),
            ("Manufacturer", &self.manufacturer),
            ("SerialNumber", &self.serial_number),
            ("Wwn", &self.wwn),
        ]
    }
}

/// SAN volume mounted on this host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiskShareRecord {
    pub label: String,
    pub volume: String,
    /// Normalized WWN of the exported volume
    pub serial_number: String,
}

impl Record for DiskShareRecord {
    fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Label", &self.label),
            ("Volume", &self.volume),
            ("SerialNumber", &self.serial_number),
        ]
    }
}

/// Installed application
///
/// `path` (`"<vendor> - <label> - <version>"`) is the key the inventory
/// server uses to tell packages apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoftwareRecord {
    pub label: String,
    pub vendor: String,
    pub version: String,
    pub path: String,
    pub model_name: String,
}

impl SoftwareRecord {
    pub fn new(label: &str, vendor: &str, version: &str) -> Self {
        Self {
            label: label.to_string(),
            vendor: vendor.to_string(),
            version: version.to_string(),
            path: format!("{vendor} - {label} - {version}"),
            model_name: label.to_string(),
        }
    }
}

impl Record for SoftwareRecord {
    fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Label", &self.label),
            ("Vendor", &self.vendor),
            ("Version", &self.version),
            ("Path", &self.path),
            ("ModelName", &self.model_name),
        ]
    }
}

/// Host identity from the system product class
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceRecord {
    pub label: String,
    pub serial_number: String,
    pub caption: String,
    pub vendor: String,
    pub version: String,
}

impl DeviceRecord {
    /// `"<vendor> <name> <version>"`, skipping blank parts
    pub fn model_name(&self) -> String {
        [&self.vendor, &self.label, &self.version]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Record for DeviceRecord {
    fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Label", &self.label),
            ("SerialNumber", &self.serial_number),
            ("Caption", &self.caption),
            ("Vendor", &self.vendor),
            ("Version", &self.version),
        ]
    }
}

/// Operating system summary with totals derived from other categories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatingSystemRecord {
    pub label: String,
    /// Visible memory in MiB
    pub memory: String,
    /// Sum of storage volume sizes in MiB
    pub storage: String,
    /// Sum of processor core counts
    pub cores_count: String,
}

impl Record for OperatingSystemRecord {
    fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Label", &self.label),
            ("Memory", &self.memory),
            ("Storage", &self.storage),
            ("CoresCount", &self.cores_count),
        ]
    }
}

/// The unified report graph for one cycle (root aggregate)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryReport {
    pub device: DeviceRecord,
    pub ethernets: Vec<EthernetRecord>,
    pub mac_addresses: Vec<MacAddressRecord>,
    pub ip_addresses: Vec<IpAddressRecord>,
    pub storage: Vec<StorageRecord>,
    pub fibre_channel: Vec<FibreChannelRecord>,
    pub disk_shares: Vec<DiskShareRecord>,
    pub memory: Vec<MemoryRecord>,
    pub processors: Vec<ProcessorRecord>,
    pub software: Vec<SoftwareRecord>,
    pub operating_system: OperatingSystemRecord,
}

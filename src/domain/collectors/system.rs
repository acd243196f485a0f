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

//! Host profile, device identity and operating-system summary

use super::{field_or_default, rows_or_empty};
use crate::domain::blacklists::is_virtual_vendor;
use crate::domain::entities::{DeviceRecord, OperatingSystemRecord, ProcessorRecord, StorageRecord};
use crate::domain::parsers::common::{size_field, sum_numeric_fields, SizeUnit};
use crate::ports::InstrumentationSource;

/// Major version assumed when the OS version cannot be read
pub const DEFAULT_OS_MAJOR_VERSION: u32 = 6;

/// Query-shape family of the host OS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsGeneration {
    /// Before NT 6: one processor row per core, serials only via physical media
    Legacy,
    /// NT 6 and later
    Modern,
}

impl OsGeneration {
    pub fn from_major_version(major: u32) -> Self {
        if major < 6 {
            OsGeneration::Legacy
        } else {
            OsGeneration::Modern
        }
    }
}

/// Facts detected once when the detector starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostProfile {
    pub os_major_version: u32,
    /// Lower-cased system product vendor
    pub vendor: String,
}

impl Default for HostProfile {
    fn default() -> Self {
        Self {
            os_major_version: DEFAULT_OS_MAJOR_VERSION,
            vendor: String::new(),
        }
    }
}

impl HostProfile {
    pub fn generation(&self) -> OsGeneration {
        OsGeneration::from_major_version(self.os_major_version)
    }

    /// True when running under a known hypervisor
    pub fn is_virtual(&self) -> bool {
        is_virtual_vendor(&self.vendor)
    }
}

/// Parse the major component of a dotted version string
pub fn parse_major_version(version: &str) -> Option<u32> {
    version.trim().split('.').next()?.trim().parse().ok()
}

/// Detect OS major version and system vendor
pub async fn detect_host_profile(source: &dyn InstrumentationSource) -> HostProfile {
    let os_rows = rows_or_empty(
        "operating system version",
        source.instances("Win32_OperatingSystem", &["Version"]).await,
    );
    let os_major_version = os_rows
        .first()
        .and_then(|row| parse_major_version(&field_or_default(row, "Version")))
        .unwrap_or(DEFAULT_OS_MAJOR_VERSION);

    let product_rows = rows_or_empty(
        "system vendor",
        source
            .instances("Win32_ComputerSystemProduct", &["Vendor"])
            .await,
    );
    let vendor = product_rows
        .first()
        .map(|row| field_or_default(row, "Vendor").to_lowercase())
        .unwrap_or_default();

    HostProfile {
        os_major_version,
        vendor,
    }
}

/// Host identity; the first product instance wins when several are reported
pub async fn collect_device(source: &dyn InstrumentationSource) -> DeviceRecord {
    let rows = rows_or_empty(
        "device",
        source
            .instances(
                "Win32_ComputerSystemProduct",
                &["Name", "IdentifyingNumber", "Caption", "Vendor", "Version"],
            )
            .await,
    );

    rows.first()
        .map(|row| DeviceRecord {
            label: field_or_default(row, "Name"),
            serial_number: field_or_default(row, "IdentifyingNumber"),
            caption: field_or_default(row, "Caption"),
            vendor: field_or_default(row, "Vendor"),
            version: field_or_default(row, "Version"),
        })
        .unwrap_or_default()
}

/// OS summary; totals come from the already-collected processor and storage lists
pub async fn collect_operating_system(
    source: &dyn InstrumentationSource,
    processors: &[ProcessorRecord],
    storage: &[StorageRecord],
) -> OperatingSystemRecord {
    let rows = rows_or_empty(
        "operating system",
        source
            .instances("Win32_OperatingSystem", &["Caption", "TotalVisibleMemorySize"])
            .await,
    );

    let mut record = rows
        .first()
        .map(|row| OperatingSystemRecord {
            label: field_or_default(row, "Caption"),
            memory: size_field(
                &field_or_default(row, "TotalVisibleMemorySize"),
                SizeUnit::Kilobytes,
            ),
            ..Default::default()
        })
        .unwrap_or_default();

    record.cores_count =
        sum_numeric_fields(processors.iter().map(|p| p.cores.as_str())).to_string();
    record.storage = sum_numeric_fields(storage.iter().map(|s| s.size.as_str())).to_string();
    record
}

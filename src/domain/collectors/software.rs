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

//! Installed software, from the uninstall registry keys or `Win32_Product`

use super::{field_or_default, rows_or_empty};
use crate::domain::entities::SoftwareRecord;
use crate::domain::parsers::software::merge_software;
use crate::domain::RegistryError;
use crate::ports::{InstrumentationQuery, InstrumentationSource, RegistryReader, RegistryRoot};

/// Native-view uninstall key
pub const UNINSTALL_KEY: &str = r"SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall";

/// 32-bit-on-64-bit view of the uninstall key
pub const WOW64_UNINSTALL_KEY: &str =
    r"SOFTWARE\Wow6432Node\Microsoft\Windows\CurrentVersion\Uninstall";

/// Software listed under both uninstall keys, merged without duplicates
///
/// An unreadable native key is logged as an error. The WOW64 key only
/// exists on 64-bit hosts, so its absence is logged at debug level.
pub async fn collect_registry_software(registry: &dyn RegistryReader) -> Vec<SoftwareRecord> {
    let base = list_uninstall_key(registry, UNINSTALL_KEY)
        .await
        .unwrap_or_else(|e| {
            log::error!("Failed to read uninstall key {}: {}", UNINSTALL_KEY, e);
            Vec::new()
        });
    let additional = list_uninstall_key(registry, WOW64_UNINSTALL_KEY)
        .await
        .unwrap_or_else(|e| {
            log::debug!("Skipping uninstall key {}: {}", WOW64_UNINSTALL_KEY, e);
            Vec::new()
        });
    merge_software(base, additional)
}

/// Entries under one uninstall key; entries missing a value are skipped
pub async fn list_uninstall_key(
    registry: &dyn RegistryReader,
    key: &str,
) -> Result<Vec<SoftwareRecord>, RegistryError> {
    let subkeys = registry.subkeys(RegistryRoot::LocalMachine, key).await?;

    let mut software = Vec::new();
    for subkey in subkeys {
        let path = format!(r"{}\{}", key, subkey);
        if let Ok(record) = read_entry(registry, &path).await {
            software.push(record);
        }
    }
    Ok(software)
}

async fn read_entry(registry: &dyn RegistryReader, path: &str) -> Result<SoftwareRecord, RegistryError> {
    let root = RegistryRoot::LocalMachine;
    let label = registry.read_value(root, path, "DisplayName").await?;
    let vendor = registry.read_value(root, path, "Publisher").await?;
    let version = registry.read_value(root, path, "DisplayVersion").await?;
    Ok(SoftwareRecord::new(label.trim(), vendor.trim(), version.trim()))
}

/// Software registered with Windows Installer (slow full-system query)
pub async fn collect_product_software(source: &dyn InstrumentationSource) -> Vec<SoftwareRecord> {
    let query = InstrumentationQuery::new("Win32_Product").fields(&["Name", "Vendor", "Version"]);
    rows_or_empty("installed software", source.select(&query).await)
        .iter()
        .map(|row| {
            SoftwareRecord::new(
                &field_or_default(row, "Name"),
                &field_or_default(row, "Vendor"),
                &field_or_default(row, "Version"),
            )
        })
        .collect()
}

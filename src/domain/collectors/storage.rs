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

//! Storage volumes: disk drive -> partition -> logical disk.

use super::system::OsGeneration;
use super::{field_or_default, rows_or_empty};
use crate::domain::blacklists::{
    is_disk_product_blacklisted, is_disk_vendor_blacklisted, is_placeholder_disk_serial,
};
use crate::domain::entities::StorageRecord;
use crate::domain::parsers::common::{size_field, SizeUnit};
use crate::ports::{
    wql_escape, AssociatorQuery, InstrumentationQuery, InstrumentationRow, InstrumentationSource,
};
use async_trait::async_trait;

/// Where a disk's serial number comes from
#[async_trait]
pub trait DiskSerialSource: Send + Sync {
    /// Fields selected from `Win32_DiskDrive`
    fn disk_fields(&self) -> &'static [&'static str];

    /// Serial number of one disk drive row, empty when unknown
    async fn serial_for(&self, source: &dyn InstrumentationSource, disk: &InstrumentationRow)
        -> String;
}

/// Pick the serial lookup matching the host OS generation
pub fn select_disk_serial_source(generation: OsGeneration) -> Box<dyn DiskSerialSource> {
    match generation {
        OsGeneration::Legacy => Box::new(PhysicalMediaSerials),
        OsGeneration::Modern => Box::new(DiskDriveSerials),
    }
}

/// NT6+: `Win32_DiskDrive` carries `SerialNumber` directly
pub struct DiskDriveSerials;

#[async_trait]
impl DiskSerialSource for DiskDriveSerials {
    fn disk_fields(&self) -> &'static [&'static str] {
        &["Caption", "DeviceID", "SerialNumber", "Model"]
    }

    async fn serial_for(
        &self,
        _source: &dyn InstrumentationSource,
        disk: &InstrumentationRow,
    ) -> String {
        field_or_default(disk, "SerialNumber")
    }
}

/// Pre-NT6: serials live in `Win32_PhysicalMedia`, keyed by device tag
pub struct PhysicalMediaSerials;

#[async_trait]
impl DiskSerialSource for PhysicalMediaSerials {
    fn disk_fields(&self) -> &'static [&'static str] {
        &["Caption", "DeviceID", "Model"]
    }

    async fn serial_for(
        &self,
        source: &dyn InstrumentationSource,
        disk: &InstrumentationRow,
    ) -> String {
        physical_media_serial(source, &field_or_default(disk, "DeviceID")).await
    }
}

/// Serial of the physical media tagged with `device_id`
pub async fn physical_media_serial(source: &dyn InstrumentationSource, device_id: &str) -> String {
    let query = InstrumentationQuery::new("Win32_PhysicalMedia")
        .fields(&["SerialNumber"])
        .filter(&format!("Tag='{}'", wql_escape(device_id)));

    rows_or_empty("physical media serial", source.select(&query).await)
        .first()
        .map(|row| field_or_default(row, "SerialNumber"))
        .unwrap_or_default()
}

/// Logical volumes on real local disks
///
/// Disks with a blacklisted caption or model, or with a blank/placeholder
/// serial, are skipped before any partition lookup.
pub async fn collect_storage(
    source: &dyn InstrumentationSource,
    serials: &dyn DiskSerialSource,
) -> Vec<StorageRecord> {
    let query = InstrumentationQuery::new("Win32_DiskDrive").fields(serials.disk_fields());
    let disks = rows_or_empty("storage", source.select(&query).await);
    let mut storage = Vec::new();

    for disk in &disks {
        let caption = field_or_default(disk, "Caption");
        let model = field_or_default(disk, "Model");
        if is_disk_vendor_blacklisted(&caption) || is_disk_product_blacklisted(&model) {
            log::debug!("Skipping blacklisted disk {}", caption);
            continue;
        }

        let serial = serials.serial_for(source, disk).await;
        if is_placeholder_disk_serial(&serial) {
            log::debug!("Skipping disk {} without a usable serial", caption);
            continue;
        }

        let device_id = field_or_default(disk, "DeviceID");
        let partitions_query = AssociatorQuery::new(
            "Win32_DiskDrive",
            "DeviceID",
            &device_id,
            "Win32_DiskDriveToDiskPartition",
        )
        .fields(&["DeviceID"]);
        let partitions = rows_or_empty("disk partitions", source.associators(&partitions_query).await);

        for partition in &partitions {
            let logical_query = AssociatorQuery::new(
                "Win32_DiskPartition",
                "DeviceID",
                &field_or_default(partition, "DeviceID"),
                "Win32_LogicalDiskToPartition",
            )
            .fields(&["Caption", "Size"]);
            let volumes = rows_or_empty("logical disks", source.associators(&logical_query).await);

            storage.extend(volumes.iter().map(|volume| StorageRecord {
                label: caption.clone(),
                serial_number: serial.clone(),
                mount_point: field_or_default(volume, "Caption"),
                size: size_field(&field_or_default(volume, "Size"), SizeUnit::Bytes),
            }));
        }
    }

    storage
}

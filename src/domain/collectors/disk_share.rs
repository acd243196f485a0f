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

use super::storage::physical_media_serial;
use super::{field_or_default, rows_or_empty};
use crate::domain::entities::DiskShareRecord;
use crate::domain::parsers::identifiers::normalize_wwn;
use crate::ports::{InstrumentationQuery, InstrumentationSource};

/// SAN volumes presented by 3PAR arrays, identified by normalized WWN
///
/// A volume whose physical media serial cannot be read is left out.
pub async fn collect_disk_shares(source: &dyn InstrumentationSource) -> Vec<DiskShareRecord> {
    let query = InstrumentationQuery::new("Win32_DiskDrive")
        .fields(&["Model", "DeviceID"])
        .filter("Model LIKE '3PARdata%'");
    let drives = rows_or_empty("disk shares", source.select(&query).await);
    let mut shares = Vec::new();

    for drive in &drives {
        let serial = physical_media_serial(source, &field_or_default(drive, "DeviceID")).await;
        if serial.is_empty() {
            continue;
        }

        let model = field_or_default(drive, "Model");
        shares.push(DiskShareRecord {
            label: model.clone(),
            volume: model,
            serial_number: normalize_wwn(&serial),
        });
    }

    shares
}

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

use super::{field_or_default, rows_or_empty};
use crate::domain::entities::MemoryRecord;
use crate::domain::parsers::common::{size_field, SizeUnit};
use crate::ports::{InstrumentationQuery, InstrumentationSource};

/// Label of the synthetic whole-system entry
pub const VIRTUAL_RAM_LABEL: &str = "Virtual RAM";

/// Memory modules, or one whole-system entry when no modules are reported
pub async fn collect_memory(source: &dyn InstrumentationSource) -> Vec<MemoryRecord> {
    let query = InstrumentationQuery::new("Win32_PhysicalMemory").fields(&[
        "Name",
        "DeviceLocator",
        "Speed",
        "SerialNumber",
        "Caption",
        "Capacity",
    ]);

    let modules: Vec<MemoryRecord> = rows_or_empty("memory", source.select(&query).await)
        .iter()
        .map(|row| MemoryRecord {
            label: field_or_default(row, "Name"),
            size: size_field(&field_or_default(row, "Capacity"), SizeUnit::Bytes),
            speed: field_or_default(row, "Speed"),
            index: field_or_default(row, "DeviceLocator"),
            serial_number: field_or_default(row, "SerialNumber"),
            caption: field_or_default(row, "Caption"),
        })
        .collect();

    if !modules.is_empty() {
        return modules;
    }

    log::debug!("No memory modules reported, using total physical memory");
    let query = InstrumentationQuery::new("Win32_ComputerSystem").fields(&["TotalPhysicalMemory"]);
    rows_or_empty("total memory", source.select(&query).await)
        .iter()
        .map(|row| MemoryRecord {
            label: VIRTUAL_RAM_LABEL.to_string(),
            size: size_field(&field_or_default(row, "TotalPhysicalMemory"), SizeUnit::Bytes),
            ..Default::default()
        })
        .collect()
}

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

//! Processor collection strategies.
//!
//! Pre-NT6 systems report one `Win32_Processor` row per core, so the legacy
//! strategy folds rows by socket and derives the per-socket core count.

use super::system::{HostProfile, OsGeneration};
use super::{field_or_default, rows_or_empty};
use crate::domain::entities::ProcessorRecord;
use crate::ports::{InstrumentationQuery, InstrumentationRow, InstrumentationSource};
use async_trait::async_trait;
use std::collections::HashSet;

const PROCESSOR_CLASS: &str = "Win32_Processor";

const MODERN_FIELDS: &[&str] = &[
    "Name",
    "DeviceID",
    "MaxClockSpeed",
    "NumberOfCores",
    "NumberOfLogicalProcessors",
    "Caption",
    "Description",
    "Manufacturer",
    "DataWidth",
];

const LEGACY_FIELDS: &[&str] = &[
    "Name",
    "DeviceID",
    "MaxClockSpeed",
    "Caption",
    "Description",
    "Manufacturer",
    "DataWidth",
    "SocketDesignation",
];

/// Strategy for enumerating physical processors
#[async_trait]
pub trait ProcessorCollector: Send + Sync {
    async fn collect(
        &self,
        source: &dyn InstrumentationSource,
        profile: &HostProfile,
    ) -> Vec<ProcessorRecord>;
}

/// Pick the strategy matching the host OS generation
pub fn select_processor_collector(generation: OsGeneration) -> Box<dyn ProcessorCollector> {
    match generation {
        OsGeneration::Legacy => Box::new(LegacyProcessorCollector),
        OsGeneration::Modern => Box::new(ModernProcessorCollector),
    }
}

/// NT6+: one row per physical processor with correct core counts
pub struct ModernProcessorCollector;

#[async_trait]
impl ProcessorCollector for ModernProcessorCollector {
    async fn collect(
        &self,
        source: &dyn InstrumentationSource,
        profile: &HostProfile,
    ) -> Vec<ProcessorRecord> {
        let query = InstrumentationQuery::new(PROCESSOR_CLASS).fields(MODERN_FIELDS);
        rows_or_empty("processors", source.select(&query).await)
            .iter()
            .map(|row| {
                let mut record = processor_from_row(row, profile.is_virtual());
                record.cores = field_or_default(row, "NumberOfCores");
                record.logical_processors = field_or_default(row, "NumberOfLogicalProcessors");
                record
            })
            .collect()
    }
}

/// Pre-NT6: rows are cores, deduplicated by socket designation
pub struct LegacyProcessorCollector;

#[async_trait]
impl ProcessorCollector for LegacyProcessorCollector {
    async fn collect(
        &self,
        source: &dyn InstrumentationSource,
        profile: &HostProfile,
    ) -> Vec<ProcessorRecord> {
        let query = InstrumentationQuery::new(PROCESSOR_CLASS).fields(LEGACY_FIELDS);
        let rows = rows_or_empty("processors", source.select(&query).await);

        let mut sockets = HashSet::new();
        let mut processors: Vec<ProcessorRecord> = rows
            .iter()
            .filter(|row| sockets.insert(field_or_default(row, "SocketDesignation")))
            .map(|row| processor_from_row(row, profile.is_virtual()))
            .collect();

        if !processors.is_empty() {
            let cores = (rows.len() / processors.len()).to_string();
            for processor in &mut processors {
                processor.cores = cores.clone();
            }
        }

        processors
    }
}

fn processor_from_row(row: &InstrumentationRow, is_virtual: bool) -> ProcessorRecord {
    let prefix = if is_virtual { "Virtual " } else { "" };
    let label = format!("{}{}", prefix, field_or_default(row, "Name"));
    let caption = format!("{}{}", prefix, field_or_default(row, "Caption"));
    let speed = field_or_default(row, "MaxClockSpeed");

    ProcessorRecord {
        model_name: format!("{} {}Mhz", label, speed),
        label,
        speed,
        index: field_or_default(row, "DeviceID"),
        description: field_or_default(row, "Description"),
        manufacturer: field_or_default(row, "Manufacturer"),
        caption,
        x64: x64_flag(&field_or_default(row, "DataWidth")),
        ..Default::default()
    }
}

/// `"true"` for a 64-bit data width, `"false"` for any other width
fn x64_flag(data_width: &str) -> String {
    match data_width.trim().parse::<u32>() {
        Ok(64) => "true".to_string(),
        Ok(_) => "false".to_string(),
        Err(_) => String::new(),
    }
}

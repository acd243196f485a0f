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

//! Fibre-channel diagnostic tool output parsing
//!
//! The adapter report is a flat list of `Key: Value` lines. An `Adapter:`
//! line opens a record, a blank line (or the next `Adapter:` line) closes it.

use super::common::{join_non_empty, parse_key_value};
use super::identifiers::normalize_wwn;
use crate::domain::FibreChannelRecord;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WWN_RE: Regex =
        Regex::new(r"\b((?:[0-9A-Fa-f]{2}:){7}[0-9A-Fa-f]{2}|[0-9A-Fa-f]{16})\b").unwrap();
}

/// Record under construction
#[derive(Default)]
struct AdapterBuilder {
    record: FibreChannelRecord,
    model: String,
    manufacturer: String,
}

impl AdapterBuilder {
    fn new(name: &str) -> Self {
        let physical_id = name.rsplit('-').next().unwrap_or(name).trim().to_string();
        Self {
            record: FibreChannelRecord {
                physical_id,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn set(&mut self, key: &str, value: String) {
        match key.to_lowercase().as_str() {
            "descrp" => self.record.label = value,
            "model" => self.model = value,
            "manfac" => self.manufacturer = value,
            "sernum" => self.record.serial_number = value,
            _ => {}
        }
    }

    fn finish(mut self) -> FibreChannelRecord {
        self.record.model_name = join_non_empty(&[&self.manufacturer, &self.model]);
        self.record.manufacturer = self.manufacturer;
        self.record
    }
}

/// Parse the adapter details report into adapter records
///
/// # Arguments
/// * `output` - Standard output of the adapter details invocation
///
/// # Returns
/// * One record per `Adapter:` section, in report order
pub fn parse_adapter_details(output: &str) -> Vec<FibreChannelRecord> {
    let mut adapters = Vec::new();
    let mut current: Option<AdapterBuilder> = None;

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            if let Some(adapter) = current.take() {
                adapters.push(adapter.finish());
            }
            continue;
        }

        let Ok((key, value)) = parse_key_value(line, ':') else {
            continue;
        };

        if key.eq_ignore_ascii_case("adapter") {
            if let Some(adapter) = current.take() {
                adapters.push(adapter.finish());
            }
            current = Some(AdapterBuilder::new(&value));
        } else if let Some(adapter) = current.as_mut() {
            adapter.set(&key, value);
        }
    }

    if let Some(adapter) = current.take() {
        adapters.push(adapter.finish());
    }

    adapters
}

/// Find the WWN reported on a line mentioning the given serial number
///
/// # Arguments
/// * `output` - Standard output of the port listing invocation
/// * `serial` - Adapter serial number
///
/// # Returns
/// * The first 16-hex-digit run on a matching line, normalized
pub fn find_wwn_for_serial(output: &str, serial: &str) -> Option<String> {
    let serial = serial.trim();
    if serial.is_empty() {
        return None;
    }

    output
        .lines()
        .filter(|line| line.contains(serial))
        .flat_map(|line| WWN_RE.find_iter(line))
        .map(|m| normalize_wwn(m.as_str()))
        .find(|wwn| !wwn.eq_ignore_ascii_case(serial))
}

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

//! JSON encoding of inventory records and the report envelope.
//!
//! Every record goes through the same routine: fields are taken in their
//! declared order, names are rewritten to `snake_case`, blank values are left
//! out entirely. Record types with a single field encode as a bare string.

use super::entities::{InventoryReport, Record};
use super::errors::ReportError;
use serde_json::{Map, Value};

/// Plugin name reported in every envelope
pub const PLUGIN_NAME: &str = "donpedro";

/// Timestamp layout of the envelope `date` field
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fixed per-field weights the server uses to arbitrate between reports
pub const RESULTS_PRIORITY: &[(&str, u64)] = &[
    ("model_name", 25),
    ("serial_number", 20),
    ("system_ip_addresses", 60),
    ("mac_addresses", 50),
    ("ethernets", 50),
    ("disks", 30),
    ("fibrechannel_cards", 60),
    ("disk_shares", 30),
    ("memory", 60),
    ("processors", 60),
    ("installed_software", 60),
    ("operating_system", 60),
    ("system_memory", 60),
    ("system_storage", 30),
    ("system_cores_count", 60),
];

/// Rewrite an internal `PascalCase` field name to its wire form
///
/// An upper-case run counts as one word, so `IPAddress` becomes `ip_address`.
pub fn to_external_key(name: &str) -> String {
    let chars: Vec<char> = name.trim().chars().collect();
    let mut key = String::with_capacity(chars.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                key.push('_');
            }
        }
        key.extend(c.to_lowercase());
    }

    key
}

/// Encode one record
pub fn record_to_json(record: &dyn Record) -> Value {
    let fields = record.fields();

    if let [(_, value)] = fields.as_slice() {
        return Value::String(value.to_string());
    }

    let object: Map<String, Value> = fields
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(name, value)| (to_external_key(name), Value::String(value.to_string())))
        .collect();

    Value::Object(object)
}

/// Encode a list of records
pub fn records_to_json<R: Record>(records: &[R]) -> Value {
    Value::Array(
        records
            .iter()
            .map(|record| record_to_json(record))
            .collect(),
    )
}

/// Build the complete envelope for a report
///
/// # Arguments
/// * `report` - Report graph for this cycle
/// * `date` - Local timestamp, already formatted with [`DATE_FORMAT`]
/// * `include_priority` - Whether to append the `results_priority` table
pub fn build_envelope(report: &InventoryReport, date: &str, include_priority: bool) -> Value {
    let os = &report.operating_system;

    let mut device = Map::new();
    device.insert("model_name".into(), Value::String(report.device.model_name()));
    device.insert(
        "serial_number".into(),
        Value::String(report.device.serial_number.clone()),
    );
    device.insert(
        "system_ip_addresses".into(),
        records_to_json(&report.ip_addresses),
    );
    device.insert("mac_addresses".into(), records_to_json(&report.mac_addresses));
    device.insert("ethernets".into(), records_to_json(&report.ethernets));
    device.insert("disks".into(), records_to_json(&report.storage));
    device.insert(
        "fibrechannel_cards".into(),
        records_to_json(&report.fibre_channel),
    );
    device.insert("disk_shares".into(), records_to_json(&report.disk_shares));
    device.insert("memory".into(), records_to_json(&report.memory));
    device.insert("processors".into(), records_to_json(&report.processors));
    device.insert(
        "installed_software".into(),
        records_to_json(&report.software),
    );
    device.insert("operating_system".into(), record_to_json(os));
    device.insert("system_memory".into(), Value::String(os.memory.clone()));
    device.insert("system_storage".into(), Value::String(os.storage.clone()));
    device.insert(
        "system_cores_count".into(),
        Value::String(os.cores_count.clone()),
    );

    let mut data = Map::new();
    data.insert("status".into(), Value::String("success".into()));
    data.insert("date".into(), Value::String(date.to_string()));
    data.insert("plugin".into(), Value::String(PLUGIN_NAME.into()));
    data.insert("messages".into(), Value::Array(Vec::new()));
    data.insert("device".into(), Value::Object(device));

    if include_priority {
        let priority: Map<String, Value> = RESULTS_PRIORITY
            .iter()
            .map(|(key, weight)| (key.to_string(), Value::from(*weight)))
            .collect();
        data.insert("results_priority".into(), Value::Object(priority));
    }

    let mut envelope = Map::new();
    envelope.insert("data".into(), Value::Object(data));
    Value::Object(envelope)
}

/// Serialize a report stamped with the current local time
pub fn serialize_report(
    report: &InventoryReport,
    include_priority: bool,
) -> Result<String, ReportError> {
    let date = chrono::Local::now().format(DATE_FORMAT).to_string();
    let envelope = build_envelope(report, &date, include_priority);
    serde_json::to_string(&envelope).map_err(|e| ReportError::SerializationFailed(e.to_string()))
}

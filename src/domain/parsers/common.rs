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

//! Common parsing utilities and helper functions

use crate::domain::DomainError;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

/// Unit of a raw size reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    Bytes,
    Kilobytes,
    Megabytes,
    Gigabytes,
    Terabytes,
}

/// Convert a size to mebibytes
///
/// Smaller units are rounded up, larger units are scaled by exact
/// multiplication.
///
/// # Arguments
/// * `count` - Size expressed in `unit`
/// * `unit` - Unit of `count`
///
/// # Returns
/// * Size in MiB
pub fn to_mib(count: u64, unit: SizeUnit) -> u64 {
    match unit {
        SizeUnit::Bytes => count.div_ceil(MIB),
        SizeUnit::Kilobytes => count.div_ceil(KIB),
        SizeUnit::Megabytes => count,
        SizeUnit::Gigabytes => count.saturating_mul(KIB),
        SizeUnit::Terabytes => count.saturating_mul(MIB),
    }
}

/// Parse a raw integer reading and convert it to mebibytes
///
/// # Arguments
/// * `raw` - Text holding a non-negative integer
/// * `unit` - Unit of the reading
///
/// # Returns
/// * `Ok(u64)` - Size in MiB
/// * `Err(DomainError)` - The text is not a non-negative integer
pub fn parse_size_to_mib(raw: &str, unit: SizeUnit) -> Result<u64, DomainError> {
    let count: u64 = raw
        .trim()
        .parse()
        .map_err(|_| DomainError::ParsingFailed(format!("Invalid size value: '{raw}'")))?;
    Ok(to_mib(count, unit))
}

/// Same as [`parse_size_to_mib`] but yields an empty field on failure
pub fn size_field(raw: &str, unit: SizeUnit) -> String {
    match parse_size_to_mib(raw, unit) {
        Ok(mib) => mib.to_string(),
        Err(e) => {
            if !raw.trim().is_empty() {
                log::debug!("{e}");
            }
            String::new()
        }
    }
}

/// Sum the fields that parse as integers, ignoring the rest
pub fn sum_numeric_fields<'a>(values: impl IntoIterator<Item = &'a str>) -> u64 {
    values
        .into_iter()
        .filter_map(|value| value.trim().parse::<u64>().ok())
        .fold(0u64, u64::saturating_add)
}

/// Parse a key-value pair from system output
///
/// # Arguments
/// * `line` - Line to parse (e.g., "Model: QLE2462")
/// * `separator` - Separator character (usually ':')
///
/// # Returns
/// * `Ok((String, String))` - Key-value pair, both trimmed
/// * `Err(String)` - Parse error
pub fn parse_key_value(line: &str, separator: char) -> Result<(String, String), String> {
    if let Some(pos) = line.find(separator) {
        let key = line[..pos].trim().to_string();
        let value = line[pos + 1..].trim().to_string();
        Ok((key, value))
    } else {
        Err(format!("No separator '{separator}' found in line: {line}"))
    }
}

/// Join the non-blank parts with single spaces
pub fn join_non_empty(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

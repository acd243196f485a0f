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

//! MAC address and World-Wide-Name canonicalization

/// Canonical MAC form: separators removed, upper case
pub fn canonicalize_mac(mac: &str) -> String {
    mac.trim()
        .chars()
        .filter(|c| *c != ':' && *c != '-')
        .collect::<String>()
        .to_uppercase()
}

/// Strip separators and upper-case a WWN without applying vendor rules
fn strip_wwn(wwn: &str) -> String {
    wwn.chars()
        .filter(|c| !matches!(c, ':' | ' ' | '.'))
        .collect::<String>()
        .trim()
        .to_uppercase()
}

/// Prefixes of 32-digit WWNs that are already in their final form
const PASSTHROUGH_PREFIXES: &[&str] = &[
    "600A0B80", // IBM
];

/// Prefixes of 33-digit multipath WWNs that only need the leading digit dropped
const MULTIPATH_PREFIXES: &[&str] = &[
    "3600A0B80", // IBM
    "3600508B1", // HP logical volume
    "3600144F0", // SUN
];

/// Recover the array-side WWN from a disk serial or multipath identifier
///
/// Separators are stripped and the result upper-cased, then the first
/// matching vendor rule is applied. Strings no rule recognizes are returned
/// stripped but otherwise unchanged.
pub fn normalize_wwn(wwn: &str) -> String {
    let wwn = strip_wwn(wwn);
    if !wwn.is_ascii() {
        return wwn;
    }

    match wwn.len() {
        // 3PAR
        16 => wwn,
        // 3PAR multipath
        17 => wwn[1..].to_string(),
        // HP MSA multipath
        33 if wwn.ends_with("000000") && &wwn[8..11] == "000" => wwn[11..27].to_string(),
        // HP MSA
        32 if wwn.ends_with("000000") && &wwn[12..16] == "0000" => {
            format!("{}{}", &wwn[6..12], &wwn[16..26])
        }
        32 if PASSTHROUGH_PREFIXES.iter().any(|p| wwn.starts_with(p)) => wwn,
        33 if MULTIPATH_PREFIXES.iter().any(|p| wwn.starts_with(p)) => wwn[1..].to_string(),
        _ => wwn,
    }
}

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

//! Known-bogus hardware tables
//!
//! Virtual NICs, RAID controllers presenting logical drives and SAN LUNs all
//! show up as "hardware" in the instrumentation data. These predicates let the
//! collectors drop them before they reach the report.

use super::parsers::identifiers::canonicalize_mac;

/// MAC prefixes (first six hex digits of the canonical form) of virtual or
/// placeholder adapters
pub const MAC_PREFIX_BLACKLIST: &[&str] = &[
    "505054", "33506F", "009876", "000000", "00000C", "204153", "149120", "020054", "FEFFFF",
    "1AF920", "020820", "DEAD2C", "FEAD4D",
];

/// Lower-case vendor tokens of controllers and SAN arrays
pub const DISK_VENDOR_BLACKLIST: &[&str] = &["lsi", "lsilogic", "vmware", "3pardata"];

/// Lower-case product tokens of logical drives and SAN volumes
pub const DISK_PRODUCT_BLACKLIST: &[&str] = &[
    "mr9261-8i",
    "9750-4i",
    "msa2324fc",
    "logical volume",
    "virtualdisk",
    "virtual-disk",
    "multi-flex",
    "1815      fastt",
    "comstar",
];

/// Lower-case system vendor tokens of hypervisors
pub const HYPERVISOR_VENDORS: &[&str] = &["xen", "vmware", "bochs", "qemu"];

/// Serial prefix reported by placeholder disks
pub const PLACEHOLDER_DISK_SERIAL_PREFIX: &str = "QM000";

/// True when the MAC belongs to a virtual or placeholder adapter
pub fn is_mac_blacklisted(mac: &str) -> bool {
    let canonical = canonicalize_mac(mac);
    MAC_PREFIX_BLACKLIST
        .iter()
        .any(|prefix| canonical.starts_with(prefix))
}

/// True when the disk vendor/caption names a controller or SAN vendor
pub fn is_disk_vendor_blacklisted(vendor: &str) -> bool {
    contains_any(vendor, DISK_VENDOR_BLACKLIST)
}

/// True when the disk model names a logical drive or SAN volume
pub fn is_disk_product_blacklisted(product: &str) -> bool {
    contains_any(product, DISK_PRODUCT_BLACKLIST)
}

/// True when the system vendor string identifies a hypervisor
pub fn is_virtual_vendor(vendor: &str) -> bool {
    contains_any(vendor, HYPERVISOR_VENDORS)
}

/// True for blank serials and the known placeholder serial
pub fn is_placeholder_disk_serial(serial: &str) -> bool {
    let serial = serial.trim();
    serial.is_empty() || serial.starts_with(PLACEHOLDER_DISK_SERIAL_PREFIX)
}

fn contains_any(value: &str, tokens: &[&str]) -> bool {
    let value = value.to_lowercase();
    tokens.iter().any(|token| value.contains(token))
}

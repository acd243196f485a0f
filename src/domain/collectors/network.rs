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
use crate::domain::blacklists::is_mac_blacklisted;
use crate::domain::entities::{EthernetRecord, IpAddressRecord, MacAddressRecord};
use crate::domain::parsers::identifiers::canonicalize_mac;
use crate::ports::{InstrumentationQuery, InstrumentationSource};

/// Physical network adapters with their primary IP configuration
///
/// Adapters with a blacklisted MAC are dropped. The address and mask come
/// from the first IP-enabled configuration sharing the adapter index.
pub async fn collect_ethernets(source: &dyn InstrumentationSource) -> Vec<EthernetRecord> {
    let query = InstrumentationQuery::new("Win32_NetworkAdapter")
        .fields(&["Name", "MACAddress", "Speed", "Index"])
        .filter("MACAddress <> null");
    let adapters = rows_or_empty("network adapters", source.select(&query).await);
    let mut ethernets = Vec::new();

    for adapter in &adapters {
        let mac = field_or_default(adapter, "MACAddress");
        if mac.is_empty() || is_mac_blacklisted(&mac) {
            continue;
        }

        let mut record = EthernetRecord {
            label: field_or_default(adapter, "Name"),
            mac: canonicalize_mac(&mac),
            speed: field_or_default(adapter, "Speed"),
            ..Default::default()
        };

        let index = field_or_default(adapter, "Index");
        if !index.is_empty() {
            let config_query = InstrumentationQuery::new("Win32_NetworkAdapterConfiguration")
                .fields(&["IPAddress", "IPSubnet"])
                .filter(&format!("Index = {} AND IPEnabled = True", index));
            let configs = rows_or_empty("adapter configuration", source.select(&config_query).await);
            if let Some(config) = configs.first() {
                record.ip_address = config.list("IPAddress").into_iter().next().unwrap_or_default();
                record.subnet_mask = config.list("IPSubnet").into_iter().next().unwrap_or_default();
            }
        }

        ethernets.push(record);
    }

    ethernets
}

/// Compact MAC list derived from the collected adapters
pub fn mac_addresses(ethernets: &[EthernetRecord]) -> Vec<MacAddressRecord> {
    ethernets
        .iter()
        .map(|eth| MacAddressRecord {
            mac: eth.mac.clone(),
        })
        .collect()
}

/// Compact address list derived from adapters that have an address
pub fn ip_addresses(ethernets: &[EthernetRecord]) -> Vec<IpAddressRecord> {
    ethernets
        .iter()
        .filter(|eth| !eth.ip_address.is_empty())
        .map(|eth| IpAddressRecord {
            address: eth.ip_address.clone(),
        })
        .collect()
}

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

//! Per-category collectors.
//!
//! A collector never fails. Query errors are logged at the category boundary
//! and become an empty list; unreadable fields become empty strings.

pub mod disk_share;
pub mod fibre_channel;
pub mod memory;
pub mod network;
pub mod processor;
pub mod software;
pub mod storage;
pub mod system;

pub use disk_share::*;
pub use fibre_channel::*;
pub use memory::*;
pub use network::*;
pub use processor::*;
pub use software::*;
pub use storage::*;
pub use system::*;

use crate::domain::InstrumentationError;
use crate::ports::InstrumentationRow;

/// Read a field as text, empty when missing or unreadable
pub fn field_or_default(row: &InstrumentationRow, name: &str) -> String {
    row.text(name).unwrap_or_default()
}

/// Unwrap a query result at the category boundary
pub(crate) fn rows_or_empty(
    category: &str,
    result: Result<Vec<InstrumentationRow>, InstrumentationError>,
) -> Vec<InstrumentationRow> {
    match result {
        Ok(rows) => rows,
        Err(e) => {
            log::error!("Failed to collect {}: {}", category, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::row;

    #[test]
    fn test_field_or_default() {
        let r = row(&[("Name", "Disk 0")]);
        assert_eq!(field_or_default(&r, "Name"), "Disk 0");
        assert_eq!(field_or_default(&r, "Size"), "");
    }

    #[test]
    fn test_rows_or_empty_swallows_errors() {
        let failed = Err(InstrumentationError::QueryFailed("RPC unavailable".to_string()));
        assert!(rows_or_empty("memory", failed).is_empty());
        assert_eq!(rows_or_empty("memory", Ok(vec![row(&[])])).len(), 1);
    }
}

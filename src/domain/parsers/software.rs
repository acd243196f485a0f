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

//! Installed-software list merging

use crate::domain::SoftwareRecord;
use std::collections::HashSet;

/// Append `additional` to `base`, skipping entries whose (label, version)
/// pair is already present
///
/// Order of `base` is preserved and new entries keep their source order.
pub fn merge_software(
    mut base: Vec<SoftwareRecord>,
    additional: Vec<SoftwareRecord>,
) -> Vec<SoftwareRecord> {
    let mut seen: HashSet<(String, String)> = base
        .iter()
        .map(|soft| (soft.label.clone(), soft.version.clone()))
        .collect();

    for soft in additional {
        if seen.insert((soft.label.clone(), soft.version.clone())) {
            base.push(soft);
        }
    }

    base
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soft(label: &str, version: &str) -> SoftwareRecord {
        SoftwareRecord::new(label, "", version)
    }

    #[test]
    fn test_merge_skips_duplicates_and_keeps_order() {
        let merged = merge_software(
            vec![soft("A", "1.0")],
            vec![soft("A", "1.0"), soft("B", "2.0")],
        );
        assert_eq!(merged, vec![soft("A", "1.0"), soft("B", "2.0")]);
    }

    #[test]
    fn test_same_name_different_version_is_kept() {
        let merged = merge_software(
            vec![soft("Runtime", "8.0"), soft("Tool", "1")],
            vec![soft("Runtime", "9.0"), soft("Tool", "1"), soft("Runtime", "9.0")],
        );
        let labels: Vec<(&str, &str)> = merged
            .iter()
            .map(|s| (s.label.as_str(), s.version.as_str()))
            .collect();
        assert_eq!(labels, vec![("Runtime", "8.0"), ("Tool", "1"), ("Runtime", "9.0")]);
    }

    #[test]
    fn test_merge_into_empty_base() {
        let merged = merge_software(Vec::new(), vec![soft("A", "1")]);
        assert_eq!(merged.len(), 1);
    }
}

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

use crate::domain::InstrumentationError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A structured read against one instrumentation class
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentationQuery {
    /// Target class, e.g. `Win32_Processor`
    pub class: String,
    /// Fields to return
    pub fields: Vec<String>,
    /// Optional WHERE predicate
    pub filter: Option<String>,
}

impl InstrumentationQuery {
    /// Create a query for all rows of a class
    pub fn new(class: &str) -> Self {
        Self {
            class: class.to_string(),
            fields: Vec::new(),
            filter: None,
        }
    }

    /// Set the returned fields
    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Restrict rows with a WHERE predicate
    pub fn filter(mut self, predicate: &str) -> Self {
        self.filter = Some(predicate.to_string());
        self
    }

    /// Render as a WQL statement
    pub fn to_wql(&self) -> String {
        let fields = if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields.join(", ")
        };
        match &self.filter {
            Some(predicate) => format!("SELECT {} FROM {} WHERE {}", fields, self.class, predicate),
            None => format!("SELECT {} FROM {}", fields, self.class),
        }
    }
}

/// A relationship traversal from one object to its associated objects
#[derive(Debug, Clone, PartialEq)]
pub struct AssociatorQuery {
    /// Class of the source object
    pub source_class: String,
    /// Key property identifying the source object
    pub key_field: String,
    /// Key value of the source object
    pub key_value: String,
    /// Association class to traverse
    pub assoc_class: String,
    /// Fields to return from the associated objects
    pub fields: Vec<String>,
}

impl AssociatorQuery {
    pub fn new(source_class: &str, key_field: &str, key_value: &str, assoc_class: &str) -> Self {
        Self {
            source_class: source_class.to_string(),
            key_field: key_field.to_string(),
            key_value: key_value.to_string(),
            assoc_class: assoc_class.to_string(),
            fields: Vec::new(),
        }
    }

    /// Set the returned fields
    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Render as a WQL statement
    pub fn to_wql(&self) -> String {
        format!(
            "ASSOCIATORS OF {{{}.{}='{}'}} WHERE AssocClass = {}",
            self.source_class,
            self.key_field,
            wql_escape(&self.key_value),
            self.assoc_class
        )
    }
}

/// Escape a value for use inside a single-quoted WQL string literal
pub fn wql_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// One result row; field names are matched case-insensitively
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstrumentationRow {
    values: HashMap<String, Value>,
}

impl InstrumentationRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from a decoded JSON object
    pub fn from_object(object: Map<String, Value>) -> Self {
        let values = object
            .into_iter()
            .map(|(name, value)| (name.to_lowercase(), value))
            .collect();
        Self { values }
    }

    /// Add a field value
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.values.insert(name.to_lowercase(), value.into());
        self
    }

    /// Raw field value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(&name.to_lowercase())
    }

    /// Scalar field rendered as trimmed text; `None` for null, missing or
    /// structured values
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name).and_then(scalar_text)
    }

    /// Array field rendered as text items; a scalar yields one item
    pub fn list(&self, name: &str) -> Vec<String> {
        match self.get(name) {
            Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
            Some(value) => scalar_text(value).into_iter().collect(),
            None => Vec::new(),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Secondary port - Instrumentation capability
///
/// Read-only structured queries against the management/instrumentation
/// API. Every failure is reported as an [`InstrumentationError`] so the
/// collectors can degrade to empty data.
#[async_trait]
pub trait InstrumentationSource: Send + Sync {
    /// Execute a structured query
    ///
    /// # Arguments
    /// * `query` - Class, fields and optional predicate
    ///
    /// # Returns
    /// * `Ok(Vec<InstrumentationRow>)` - Zero or more rows
    /// * `Err(InstrumentationError)` - The query failed
    async fn select(
        &self,
        query: &InstrumentationQuery,
    ) -> Result<Vec<InstrumentationRow>, InstrumentationError>;

    /// Traverse an association from one object to its related objects
    ///
    /// # Arguments
    /// * `query` - Source object, association class and fields
    ///
    /// # Returns
    /// * `Ok(Vec<InstrumentationRow>)` - Associated objects
    /// * `Err(InstrumentationError)` - The query failed
    async fn associators(
        &self,
        query: &AssociatorQuery,
    ) -> Result<Vec<InstrumentationRow>, InstrumentationError>;

    /// Fetch the instances of a root system class (usually zero or one)
    ///
    /// # Arguments
    /// * `class` - Class name, e.g. `Win32_ComputerSystemProduct`
    /// * `fields` - Fields to return
    ///
    /// # Returns
    /// * `Ok(Vec<InstrumentationRow>)` - Instances
    /// * `Err(InstrumentationError)` - The query failed
    async fn instances(
        &self,
        class: &str,
        fields: &[&str],
    ) -> Result<Vec<InstrumentationRow>, InstrumentationError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_select_wql() {
        let query = InstrumentationQuery::new("Win32_NetworkAdapter")
            .fields(&["Name", "MACAddress"])
            .filter("MACAddress <> null");
        assert_eq!(
            query.to_wql(),
            "SELECT Name, MACAddress FROM Win32_NetworkAdapter WHERE MACAddress <> null"
        );
        assert_eq!(
            InstrumentationQuery::new("Win32_Product").to_wql(),
            "SELECT * FROM Win32_Product"
        );
    }

    #[test]
    fn test_wql_escape() {
        assert_eq!(wql_escape(r"\\.\PHYSICALDRIVE0"), r"\\\\.\\PHYSICALDRIVE0");
        assert_eq!(wql_escape("O'Brien"), r"O\'Brien");
    }

    #[test]
    fn test_associators_wql() {
        let query = AssociatorQuery::new(
            "Win32_DiskDrive",
            "DeviceID",
            r"\\.\PHYSICALDRIVE0",
            "Win32_DiskDriveToDiskPartition",
        );
        assert_eq!(
            query.to_wql(),
            r"ASSOCIATORS OF {Win32_DiskDrive.DeviceID='\\\\.\\PHYSICALDRIVE0'} WHERE AssocClass = Win32_DiskDriveToDiskPartition"
        );

        let quoted = AssociatorQuery::new(
            "Win32_DiskPartition",
            "DeviceID",
            "Disk #0, Partition 'A'",
            "Win32_LogicalDiskToPartition",
        );
        assert!(quoted
            .to_wql()
            .contains(r"{Win32_DiskPartition.DeviceID='Disk #0, Partition \'A\''}"));
    }

    #[test]
    fn test_row_field_reads() {
        let object = json!({
            "Name": "  Intel(R) Xeon(R)  ",
            "MaxClockSpeed": 2667,
            "IPEnabled": true,
            "IPAddress": ["10.0.0.5", "fe80::1"],
            "SerialNumber": null
        });
        let row = InstrumentationRow::from_object(object.as_object().unwrap().clone());

        assert_eq!(row.text("name").as_deref(), Some("Intel(R) Xeon(R)"));
        assert_eq!(row.text("MaxClockSpeed").as_deref(), Some("2667"));
        assert_eq!(row.text("IPEnabled").as_deref(), Some("true"));
        assert_eq!(row.text("SerialNumber"), None);
        assert_eq!(row.text("Missing"), None);
        assert_eq!(row.text("IPAddress"), None);
        assert_eq!(row.list("IPAddress"), vec!["10.0.0.5", "fe80::1"]);
        assert_eq!(row.list("Name"), vec!["Intel(R) Xeon(R)"]);
        assert!(row.list("Missing").is_empty());
    }
}

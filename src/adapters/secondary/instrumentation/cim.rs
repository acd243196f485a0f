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

//! Instrumentation adapter backed by PowerShell CIM cmdlets
//!
//! Every query becomes one `Get-CimInstance` invocation whose result is
//! piped through `ConvertTo-Json -Compress` and decoded here.

use crate::domain::InstrumentationError;
use crate::ports::{
    AssociatorQuery, CommandExecutor, InstrumentationQuery, InstrumentationRow,
    InstrumentationSource, SystemCommand,
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Runs instrumentation queries through PowerShell
pub struct CimInstrumentationSource {
    executor: Arc<dyn CommandExecutor>,
    powershell: String,
    timeout: Duration,
}

impl CimInstrumentationSource {
    /// Create a new CIM instrumentation source
    ///
    /// # Arguments
    /// * `executor` - Runs the PowerShell process
    /// * `powershell` - PowerShell executable name or path
    /// * `timeout` - Per-query timeout
    pub fn new(executor: Arc<dyn CommandExecutor>, powershell: &str, timeout: Duration) -> Self {
        Self {
            executor,
            powershell: powershell.to_string(),
            timeout,
        }
    }

    async fn run(&self, script: String) -> Result<Vec<InstrumentationRow>, InstrumentationError> {
        let command = SystemCommand::new(&self.powershell)
            .args(&["-NoProfile", "-NonInteractive", "-Command", &script])
            .timeout(self.timeout);

        let output = self
            .executor
            .execute(&command)
            .await?
            .into_result(&self.powershell)?;

        parse_rows(&output.stdout)
    }
}

#[async_trait]
impl InstrumentationSource for CimInstrumentationSource {
    async fn select(
        &self,
        query: &InstrumentationQuery,
    ) -> Result<Vec<InstrumentationRow>, InstrumentationError> {
        self.run(query_script(&query.to_wql(), &query.fields)).await
    }

    async fn associators(
        &self,
        query: &AssociatorQuery,
    ) -> Result<Vec<InstrumentationRow>, InstrumentationError> {
        self.run(query_script(&query.to_wql(), &query.fields)).await
    }

    async fn instances(
        &self,
        class: &str,
        fields: &[&str],
    ) -> Result<Vec<InstrumentationRow>, InstrumentationError> {
        let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        let script = format!(
            "Get-CimInstance -ClassName {}{} | ConvertTo-Json -Compress",
            class,
            select_clause(&fields)
        );
        self.run(script).await
    }
}

/// PowerShell pipeline running one WQL statement
pub fn query_script(wql: &str, fields: &[String]) -> String {
    format!(
        "Get-CimInstance -Query '{}'{} | ConvertTo-Json -Compress",
        wql.replace('\'', "''"),
        select_clause(fields)
    )
}

fn select_clause(fields: &[String]) -> String {
    if fields.is_empty() {
        String::new()
    } else {
        format!(" | Select-Object {}", fields.join(","))
    }
}

/// Decode `ConvertTo-Json` output into rows
///
/// Empty output means no rows; a single object is one row.
pub fn parse_rows(stdout: &str) -> Result<Vec<InstrumentationRow>, InstrumentationError> {
    let stdout = stdout.trim();
    if stdout.is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(stdout)
        .map_err(|e| InstrumentationError::InvalidOutput(e.to_string()))?;

    match value {
        Value::Object(object) => Ok(vec![InstrumentationRow::from_object(object)]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(object) => Ok(InstrumentationRow::from_object(object)),
                other => Err(InstrumentationError::InvalidOutput(format!(
                    "Expected an object, found {}",
                    other
                ))),
            })
            .collect(),
        other => Err(InstrumentationError::InvalidOutput(format!(
            "Expected an object or array, found {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCommandExecutor;

    #[test]
    fn test_parse_single_object() {
        let rows = parse_rows(r#"{"Name":"Intel(R) Xeon(R)","MaxClockSpeed":2667,"DataWidth":64}"#)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("MaxClockSpeed").as_deref(), Some("2667"));
    }

    #[test]
    fn test_parse_array_and_empty_output() {
        let rows = parse_rows(
            r#"[{"IPAddress":["10.0.0.1","fe80::1"],"IPSubnet":["255.0.0.0","64"]},{"IPAddress":null}]"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].list("IPSubnet"), vec!["255.0.0.0", "64"]);
        assert!(rows[1].list("IPAddress").is_empty());

        assert!(parse_rows("  \r\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_rows("Get-CimInstance : Invalid class"),
            Err(InstrumentationError::InvalidOutput(_))
        ));
        assert!(parse_rows("[1,2]").is_err());
    }

    #[test]
    fn test_query_script_quotes_wql() {
        let script = query_script(
            "SELECT SerialNumber FROM Win32_PhysicalMedia WHERE Tag='x'",
            &["SerialNumber".to_string()],
        );
        assert_eq!(
            script,
            "Get-CimInstance -Query 'SELECT SerialNumber FROM Win32_PhysicalMedia WHERE Tag=''x''' | Select-Object SerialNumber | ConvertTo-Json -Compress"
        );
    }

    #[tokio::test]
    async fn test_powershell_failure_is_query_failure() {
        let source = CimInstrumentationSource::new(
            Arc::new(FakeCommandExecutor::new()),
            "powershell",
            Duration::from_secs(5),
        );
        let result = source
            .select(&InstrumentationQuery::new("Win32_Processor").fields(&["Name"]))
            .await;
        assert!(matches!(result, Err(InstrumentationError::QueryFailed(_))));
    }
}

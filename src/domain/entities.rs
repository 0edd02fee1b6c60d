// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Domain Entities
//!
//! Entities are the "Nouns" of the exporter: table names, column
//! descriptors, exported values and records, and the per-table results the
//! Orchestrator collects.
//!
//! Nothing in here knows about a particular database driver. Drivers turn
//! their own rows into [`Record`]s through the row materializer.

use crate::domain::mapping::{self, ScanCategory};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Name of a relational table.
///
/// It is used both as a SQL identifier and as the object key of the exported
/// CSV, so it is kept exactly as the catalog reported it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableName(String);

impl TableName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TableName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for TableName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// `ColumnDescriptor` is what the driver tells us about one output column
/// before any row has been read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name as returned by the query.
    pub name: String,
    /// Type name after driver normalization (e.g. "VARCHAR", "INT4").
    pub reported_type: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, reported_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reported_type: reported_type.into(),
        }
    }

    /// The scan category used to receive this column's values.
    pub fn category(&self) -> ScanCategory {
        mapping::category(&self.reported_type)
    }
}

/// One exported cell.
///
/// This is a closed set on purpose: whatever the database type was, the
/// value has been read into one of these four shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Bool(bool),
    Int64(i64),
    Float64(f64),
}

impl Value {
    /// The value a NULL collapses to for a column of `category`.
    pub fn zero(category: ScanCategory) -> Self {
        match category {
            ScanCategory::String => Value::String(String::new()),
            ScanCategory::Bool => Value::Bool(false),
            ScanCategory::Int64 => Value::Int64(0),
            ScanCategory::Float64 => Value::Float64(0.0),
        }
    }
}

/// Text form used in CSV output. Floats use Rust's shortest round-trip
/// representation.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int64(i) => write!(f, "{}", i),
            Value::Float64(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

/// One exported row: column name to value, in column order.
///
/// Column names are shared between all records of a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Record {
    /// Builds a record from the shared column list and one value per column.
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Builds a standalone record from `(name, value)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let (columns, values): (Vec<String>, Vec<Value>) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self::new(columns.into(), values)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

/// Full content of a table: column metadata plus every record in scan order.
#[derive(Debug, Clone, Default)]
pub struct TableContent {
    pub columns: Vec<ColumnDescriptor>,
    pub records: Vec<Record>,
}

impl TableContent {
    pub fn header(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// A (rule, count) pair for the disabled-rules list export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisabledRuleInfo {
    pub rule: String,
    pub count: i64,
}

impl DisabledRuleInfo {
    pub fn new(rule: impl Into<String>, count: i64) -> Self {
        Self {
            rule: rule.into(),
            count,
        }
    }
}

/// Pipeline stage a table export failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportStage {
    Read,
    Serialize,
    Upload,
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportStage::Read => write!(f, "read"),
            ExportStage::Serialize => write!(f, "serialize"),
            ExportStage::Upload => write!(f, "upload"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportStatus {
    Success,
    Failed,
}

/// `TableExportResult` is the "Report Card" for one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableExportResult {
    pub table: String,
    /// How many rows were written to the CSV.
    pub rows: u64,
    /// Size of the uploaded object.
    pub bytes: u64,
    /// Wall-clock seconds for read, serialize and upload together.
    pub duration: f64,
    pub status: ExportStatus,
    /// Where the export stopped, if it failed.
    pub stage: Option<ExportStage>,
    pub error: Option<String>,
}

impl TableExportResult {
    pub fn success(table: &TableName, rows: u64, bytes: u64, duration: f64) -> Self {
        Self {
            table: table.to_string(),
            rows,
            bytes,
            duration,
            status: ExportStatus::Success,
            stage: None,
            error: None,
        }
    }

    pub fn failure(table: &TableName, stage: ExportStage, error: String, duration: f64) -> Self {
        Self {
            table: table.to_string(),
            rows: 0,
            bytes: 0,
            duration,
            status: ExportStatus::Failed,
            stage: Some(stage),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ExportStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::from("a,b").to_string(), "a,b");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Int64(-42).to_string(), "-42");
        assert_eq!(Value::Float64(0.1).to_string(), "0.1");
        assert_eq!(Value::Float64(2.0).to_string(), "2");
    }

    #[test]
    fn test_zero_values() {
        assert_eq!(Value::zero(ScanCategory::String), Value::from(""));
        assert_eq!(Value::zero(ScanCategory::Bool), Value::Bool(false));
        assert_eq!(Value::zero(ScanCategory::Int64), Value::Int64(0));
        assert_eq!(Value::zero(ScanCategory::Float64), Value::Float64(0.0));
    }

    #[test]
    fn test_record_keeps_column_order() {
        let record = Record::from_pairs([("id", Value::Int64(1)), ("name", Value::from("x"))]);
        let names: Vec<&str> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["id", "name"]);
        assert_eq!(record.get("name"), Some(&Value::from("x")));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_result_serializes_status() {
        let table = TableName::from("report");
        let ok = TableExportResult::success(&table, 3, 42, 0.5);
        let failed = TableExportResult::failure(&table, ExportStage::Upload, "403".into(), 0.1);
        let json = serde_json::to_value(&failed).unwrap();
        assert!(ok.is_success());
        assert_eq!(json["status"], "FAILED");
        assert_eq!(json["stage"], "UPLOAD");
        assert_eq!(json["table"], "report");
    }
}

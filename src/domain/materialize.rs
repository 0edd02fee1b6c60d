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

//! # Row Materialization
//!
//! Drivers read every cell into a [`ScannedValue`]: a holder of the column's
//! scan category that is either NULL or carries a typed payload. The
//! [`RowMaterializer`] turns one row of holders into a [`Record`].
//!
//! This is the only place where NULL is collapsed. A NULL becomes the zero
//! value of its category (`""`, `false`, `0`, `0.0`), so the exported CSV
//! cannot tell NULL and zero apart.

use crate::domain::entities::{ColumnDescriptor, Record, Value};
use crate::domain::mapping::ScanCategory;
use std::sync::Arc;

/// A scanned cell. `None` means SQL NULL.
#[derive(Debug, Clone, PartialEq)]
pub enum ScannedValue {
    String(Option<String>),
    Bool(Option<bool>),
    Int64(Option<i64>),
    Float64(Option<f64>),
}

impl ScannedValue {
    /// A NULL holder of the given category.
    pub fn null(category: ScanCategory) -> Self {
        match category {
            ScanCategory::String => ScannedValue::String(None),
            ScanCategory::Bool => ScannedValue::Bool(None),
            ScanCategory::Int64 => ScannedValue::Int64(None),
            ScanCategory::Float64 => ScannedValue::Float64(None),
        }
    }

    /// The payload, or `None` for NULL.
    fn into_payload(self) -> Option<Value> {
        match self {
            ScannedValue::String(v) => v.map(Value::String),
            ScannedValue::Bool(v) => v.map(Value::Bool),
            ScannedValue::Int64(v) => v.map(Value::Int64),
            ScannedValue::Float64(v) => v.map(Value::Float64),
        }
    }
}

/// Builds records for one scan. Created once the column metadata is known
/// and reused for every row of the result set.
#[derive(Debug, Clone)]
pub struct RowMaterializer {
    names: Arc<[String]>,
    categories: Vec<ScanCategory>,
}

impl RowMaterializer {
    pub fn new(columns: &[ColumnDescriptor]) -> Self {
        Self {
            names: columns.iter().map(|c| c.name.clone()).collect(),
            categories: columns.iter().map(ColumnDescriptor::category).collect(),
        }
    }

    /// Scan categories in column order; drivers use these to pick holders.
    pub fn categories(&self) -> &[ScanCategory] {
        &self.categories
    }

    /// Converts one row of holders into a record.
    ///
    /// `scanned` has one holder per column, in column order.
    pub fn materialize(&self, scanned: Vec<ScannedValue>) -> Record {
        debug_assert_eq!(scanned.len(), self.categories.len());
        let values = scanned
            .into_iter()
            .zip(self.categories.iter())
            .map(|(holder, category)| {
                holder
                    .into_payload()
                    .unwrap_or_else(|| Value::zero(*category))
            })
            .collect();
        Record::new(self.names.clone(), values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("id", "INT4"),
            ColumnDescriptor::new("name", "VARCHAR"),
            ColumnDescriptor::new("active", "BOOL"),
            ColumnDescriptor::new("score", "NUMERIC"),
        ]
    }

    #[test]
    fn test_categories_follow_reported_types() {
        let m = RowMaterializer::new(&columns());
        assert_eq!(
            m.categories(),
            &[
                ScanCategory::Int64,
                ScanCategory::String,
                ScanCategory::Bool,
                ScanCategory::String
            ]
        );
    }

    #[test]
    fn test_materialize_valid_row() {
        let m = RowMaterializer::new(&columns());
        let record = m.materialize(vec![
            ScannedValue::Int64(Some(7)),
            ScannedValue::String(Some("seven".into())),
            ScannedValue::Bool(Some(true)),
            ScannedValue::String(Some("7.50".into())),
        ]);
        assert_eq!(record.get("id"), Some(&Value::Int64(7)));
        assert_eq!(record.get("name"), Some(&Value::from("seven")));
        assert_eq!(record.get("active"), Some(&Value::Bool(true)));
        assert_eq!(record.get("score"), Some(&Value::from("7.50")));
    }

    #[test]
    fn test_nulls_collapse_to_zero_values() {
        let cols = columns();
        let m = RowMaterializer::new(&cols);
        let holders = m.categories().iter().map(|c| ScannedValue::null(*c)).collect();
        let record = m.materialize(holders);
        assert_eq!(record.get("id"), Some(&Value::Int64(0)));
        assert_eq!(record.get("name"), Some(&Value::from("")));
        assert_eq!(record.get("active"), Some(&Value::Bool(false)));
        assert_eq!(record.get("score"), Some(&Value::from("")));
    }

    #[test]
    fn test_float_null_collapses_to_zero() {
        let m = RowMaterializer {
            names: vec!["ratio".to_string()].into(),
            categories: vec![ScanCategory::Float64],
        };
        let record = m.materialize(vec![ScannedValue::Float64(None)]);
        assert_eq!(record.get("ratio"), Some(&Value::Float64(0.0)));
    }
}

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

//! # Type Mapping Logic
//!
//! This module is the "Translator". Every driver reports column types in its
//! own vocabulary; the exporter only needs to know which of four typed
//! holders can receive a column's value.
//!
//! Mapping happens in two steps:
//! 1. **Normalization**: a driver turns its native type name into the
//!    reported-type vocabulary (`VARCHAR`, `BOOL`, `INT4`, ...).
//! 2. **Categorization**: [`category`] picks the [`ScanCategory`] from a
//!    fixed table. Unknown names always fall back to `String`, because a
//!    printed representation can be produced for anything.

use std::fmt;

/// The typed holder a column's values are scanned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanCategory {
    String,
    Bool,
    Int64,
    /// Supported by the materializer, but no reported type maps to it.
    Float64,
}

impl fmt::Display for ScanCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanCategory::String => write!(f, "STRING"),
            ScanCategory::Bool => write!(f, "BOOL"),
            ScanCategory::Int64 => write!(f, "INT64"),
            ScanCategory::Float64 => write!(f, "FLOAT64"),
        }
    }
}

/// Reported type names with an explicit category. Matching is case-sensitive.
const CATEGORY_TABLE: &[(&str, ScanCategory)] = &[
    ("VARCHAR", ScanCategory::String),
    ("TEXT", ScanCategory::String),
    ("UUID", ScanCategory::String),
    ("TIMESTAMP", ScanCategory::String),
    ("BOOL", ScanCategory::Bool),
    ("INT4", ScanCategory::Int64),
];

/// Returns the scan category for a reported column type.
pub fn category(reported_type: &str) -> ScanCategory {
    CATEGORY_TABLE
        .iter()
        .find(|(name, _)| *name == reported_type)
        .map(|(_, category)| *category)
        .unwrap_or(ScanCategory::String)
}

/// Normalizes a PostgreSQL type name (`int4`, `varchar`, ...).
pub fn normalize_postgres_type(type_name: &str) -> String {
    type_name.to_uppercase()
}

/// Normalizes a SQLite declared column type.
///
/// SQLite accepts almost anything as a declared type, so the name is
/// upper-cased, stripped of its `(n[,m])` suffix and folded onto the
/// reported-type vocabulary where an obvious equivalent exists. Columns
/// without a declared type (expressions, untyped columns) report "".
pub fn normalize_sqlite_type(decl_type: Option<&str>) -> String {
    let Some(decl) = decl_type else {
        return String::new();
    };
    let upper = decl.to_uppercase();
    let base = upper.split('(').next().unwrap_or("").trim();

    match base {
        "BOOLEAN" | "BOOL" => "BOOL",
        "INTEGER" | "INT" | "INT4" | "BIGINT" | "SMALLINT" | "TINYINT" | "MEDIUMINT" => "INT4",
        "VARCHAR" | "CHARACTER" | "CHAR" | "NVARCHAR" | "NCHAR" | "VARYING CHARACTER" => {
            "VARCHAR"
        }
        "TEXT" | "CLOB" => "TEXT",
        "DATETIME" | "TIMESTAMP" => "TIMESTAMP",
        other => other,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_categories() {
        assert_eq!(category("VARCHAR"), ScanCategory::String);
        assert_eq!(category("TEXT"), ScanCategory::String);
        assert_eq!(category("UUID"), ScanCategory::String);
        assert_eq!(category("TIMESTAMP"), ScanCategory::String);
        assert_eq!(category("BOOL"), ScanCategory::Bool);
        assert_eq!(category("INT4"), ScanCategory::Int64);
    }

    #[test]
    fn test_unknown_types_fall_back_to_string() {
        for name in ["", "INT8", "FLOAT8", "NUMERIC", "JSONB", "bool", "int4", "BOOLEAN"] {
            assert_eq!(category(name), ScanCategory::String, "type {:?}", name);
        }
    }

    #[test]
    fn test_normalize_postgres() {
        assert_eq!(normalize_postgres_type("int4"), "INT4");
        assert_eq!(category(&normalize_postgres_type("bool")), ScanCategory::Bool);
        assert_eq!(category(&normalize_postgres_type("uuid")), ScanCategory::String);
    }

    #[test]
    fn test_normalize_sqlite() {
        assert_eq!(normalize_sqlite_type(Some("varchar(255)")), "VARCHAR");
        assert_eq!(normalize_sqlite_type(Some("BOOLEAN")), "BOOL");
        assert_eq!(normalize_sqlite_type(Some("integer")), "INT4");
        assert_eq!(normalize_sqlite_type(Some("DATETIME")), "TIMESTAMP");
        assert_eq!(normalize_sqlite_type(Some("REAL")), "REAL");
        assert_eq!(normalize_sqlite_type(None), "");
        assert_eq!(category(&normalize_sqlite_type(Some("REAL"))), ScanCategory::String);
    }
}

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

//! Infrastructure adapter reading tables from a SQLite file.
//!
//! SQLite only knows the declared type of a column, so the declaration is
//! normalized into the same names PostgreSQL reports before categorizing.

use crate::config::StorageConfig;
use crate::domain::entities::{ColumnDescriptor, DisabledRuleInfo, TableName};
use crate::domain::errors::{ExportError, Result};
use crate::domain::mapping::{normalize_sqlite_type, ScanCategory};
use crate::domain::materialize::{RowMaterializer, ScannedValue};
use crate::infrastructure::sql::sql_utils::{
    log_column_types, log_statement, select_all_from_table, SELECT_DISABLED_RULES,
    SELECT_LIST_OF_TABLES_SQLITE,
};
use crate::ports::storage_port::{RecordSink, StoragePort};
use log::info;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::ValueRef;
use std::sync::RwLock;
use std::time::Duration;

/// Concrete implementation of `StoragePort` for SQLite.
pub struct SqliteStorage {
    pool: RwLock<Option<Pool<SqliteConnectionManager>>>,
    log_sql_queries: bool,
}

impl SqliteStorage {
    pub fn connect(config: &StorageConfig, pool_size: u32) -> Result<Self> {
        if config.sqlite_datasource.is_empty() {
            return Err(ExportError::ConfigError(
                "storage.sqlite_datasource is empty".to_string(),
            ));
        }

        let manager = SqliteConnectionManager::file(&config.sqlite_datasource);
        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .connection_timeout(Duration::from_secs(config.connection_timeout_secs.max(1)))
            .build(manager)
            .map_err(|e| ExportError::ConnectionError(e.to_string()))?;

        Ok(Self {
            pool: RwLock::new(Some(pool)),
            log_sql_queries: config.log_sql_queries,
        })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        let guard = self
            .pool
            .read()
            .map_err(|_| ExportError::ConnectionError("storage lock poisoned".to_string()))?;
        let pool = guard
            .as_ref()
            .ok_or_else(|| ExportError::ConnectionError("storage is closed".to_string()))?;
        pool.get()
            .map_err(|e| ExportError::ConnectionError(e.to_string()))
    }
}

impl StoragePort for SqliteStorage {
    fn list_tables(&self) -> Result<Vec<TableName>> {
        let conn = self.conn()?;
        log_statement(self.log_sql_queries, SELECT_LIST_OF_TABLES_SQLITE);

        let mut stmt = conn
            .prepare(SELECT_LIST_OF_TABLES_SQLITE)
            .map_err(|e| ExportError::CatalogQueryError(e.to_string()))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| ExportError::CatalogQueryError(e.to_string()))?;

        names
            .map(|name| {
                name.map(TableName::from)
                    .map_err(|e| ExportError::CatalogQueryError(e.to_string()))
            })
            .collect()
    }

    fn scan_table(&self, table: &TableName, sink: &mut dyn RecordSink) -> Result<u64> {
        let sql = select_all_from_table(table);
        log_statement(self.log_sql_queries, &sql);

        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| ExportError::query(table.as_str(), e))?;

        let columns: Vec<ColumnDescriptor> = stmt
            .columns()
            .iter()
            .map(|c| ColumnDescriptor::new(c.name(), normalize_sqlite_type(c.decl_type())))
            .collect();
        log_column_types(table, &columns);

        let materializer = RowMaterializer::new(&columns);
        sink.begin(&columns)?;

        let mut rows = stmt
            .query([])
            .map_err(|e| ExportError::query(table.as_str(), e))?;

        let mut count = 0;
        while let Some(row) = rows
            .next()
            .map_err(|e| ExportError::row(table.as_str(), count + 1, e))?
        {
            count += 1;
            let mut scanned = Vec::with_capacity(materializer.categories().len());
            for (i, category) in materializer.categories().iter().enumerate() {
                let value = row
                    .get_ref(i)
                    .map_err(|e| ExportError::row(table.as_str(), count, e))?;
                let cell = scan_value(*category, value)
                    .map_err(|e| ExportError::row(table.as_str(), count, e))?;
                scanned.push(cell);
            }
            sink.record(materializer.materialize(scanned))?;
        }

        Ok(count)
    }

    fn read_disabled_rules(&self) -> Result<Vec<DisabledRuleInfo>> {
        let conn = self.conn()?;
        log_statement(self.log_sql_queries, SELECT_DISABLED_RULES);

        let mut stmt = conn
            .prepare(SELECT_DISABLED_RULES)
            .map_err(|e| ExportError::query("rule_disable", e))?;
        let mut rows = stmt
            .query([])
            .map_err(|e| ExportError::query("rule_disable", e))?;

        let mut rules = Vec::new();
        let mut n = 0;
        while let Some(row) = rows
            .next()
            .map_err(|e| ExportError::row("rule_disable", n + 1, e))?
        {
            n += 1;
            let rule = printed(row_value(row, 0, n)?).unwrap_or_default();
            let count: i64 = row
                .get(1)
                .map_err(|e| ExportError::row("rule_disable", n, e))?;
            rules.push(DisabledRuleInfo::new(rule, count));
        }
        Ok(rules)
    }

    fn close(&self) -> Result<()> {
        info!("Closing connection to data storage");
        let mut guard = self
            .pool
            .write()
            .map_err(|_| ExportError::ConnectionError("storage lock poisoned".to_string()))?;
        guard.take();
        Ok(())
    }
}

fn row_value<'a>(row: &'a rusqlite::Row<'_>, i: usize, n: u64) -> Result<ValueRef<'a>> {
    row.get_ref(i)
        .map_err(|e| ExportError::row("rule_disable", n, e))
}

/// Converts one SQLite cell into a holder of `category`.
///
/// SQLite does not enforce declared types, so a stored value that cannot be
/// read as its column's category is a scan error.
fn scan_value(
    category: ScanCategory,
    value: ValueRef<'_>,
) -> std::result::Result<ScannedValue, String> {
    if let ValueRef::Null = value {
        return Ok(ScannedValue::null(category));
    }

    let scanned = match category {
        ScanCategory::String => ScannedValue::String(printed(value)),
        ScanCategory::Bool => ScannedValue::Bool(Some(match value {
            ValueRef::Integer(i) => i != 0,
            ValueRef::Text(t) => parse_bool(&String::from_utf8_lossy(t))?,
            other => return Err(mismatch(other, category)),
        })),
        ScanCategory::Int64 => ScannedValue::Int64(Some(match value {
            ValueRef::Integer(i) => i,
            ValueRef::Real(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => f as i64,
            ValueRef::Text(t) => {
                let text = String::from_utf8_lossy(t);
                text.trim()
                    .parse::<i64>()
                    .map_err(|e| format!("converting {:?} to int64: {}", text, e))?
            }
            other => return Err(mismatch(other, category)),
        })),
        ScanCategory::Float64 => ScannedValue::Float64(Some(match value {
            ValueRef::Integer(i) => i as f64,
            ValueRef::Real(f) => f,
            ValueRef::Text(t) => {
                let text = String::from_utf8_lossy(t);
                text.trim()
                    .parse::<f64>()
                    .map_err(|e| format!("converting {:?} to float64: {}", text, e))?
            }
            other => return Err(mismatch(other, category)),
        })),
    };
    Ok(scanned)
}

/// Printed form of any cell, `None` for NULL.
fn printed(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) | ValueRef::Blob(t) => Some(String::from_utf8_lossy(t).into_owned()),
    }
}

fn parse_bool(text: &str) -> std::result::Result<bool, String> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(format!("converting {:?} to bool: invalid syntax", text)),
    }
}

fn mismatch(value: ValueRef<'_>, category: ScanCategory) -> String {
    format!(
        "unsupported conversion of {} value to {}",
        value.data_type(),
        category
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Value;
    use crate::domain::errors::ScanFailure;
    use rusqlite::Connection;
    use tempfile::TempDir;

    fn fixture(statements: &str) -> (TempDir, SqliteStorage) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(statements).unwrap();
        drop(conn);

        let config = StorageConfig {
            sqlite_datasource: path.to_string_lossy().into_owned(),
            ..StorageConfig::default()
        };
        let storage = SqliteStorage::connect(&config, 1).unwrap();
        (dir, storage)
    }

    #[test]
    fn test_list_tables_of_empty_database() {
        let (_dir, storage) = fixture("");
        assert!(storage.list_tables().unwrap().is_empty());
    }

    #[test]
    fn test_list_tables() {
        let (_dir, storage) = fixture(
            "CREATE TABLE report (id INTEGER);
             CREATE TABLE cluster (name TEXT);",
        );
        let mut tables = storage.list_tables().unwrap();
        tables.sort();
        assert_eq!(tables, vec![TableName::from("cluster"), TableName::from("report")]);
    }

    #[test]
    fn test_read_table_collapses_nulls() {
        let (_dir, storage) = fixture(
            "CREATE TABLE report (id INTEGER, name VARCHAR(20), active BOOLEAN, score REAL);
             INSERT INTO report VALUES (1, 'abc', 1, 0.5);
             INSERT INTO report VALUES (NULL, NULL, NULL, NULL);",
        );

        let content = storage.read_table(&TableName::from("report")).unwrap();
        assert_eq!(content.header(), vec!["id", "name", "active", "score"]);
        assert_eq!(content.columns[0].reported_type, "INT4");
        assert_eq!(content.columns[1].reported_type, "VARCHAR");
        assert_eq!(content.columns[2].reported_type, "BOOL");
        assert_eq!(content.records.len(), 2);

        let first = &content.records[0];
        assert_eq!(first.get("id"), Some(&Value::Int64(1)));
        assert_eq!(first.get("name"), Some(&Value::from("abc")));
        assert_eq!(first.get("active"), Some(&Value::Bool(true)));
        assert_eq!(first.get("score"), Some(&Value::from("0.5")));

        let second = &content.records[1];
        assert_eq!(second.get("id"), Some(&Value::Int64(0)));
        assert_eq!(second.get("name"), Some(&Value::from("")));
        assert_eq!(second.get("active"), Some(&Value::Bool(false)));
        assert_eq!(second.get("score"), Some(&Value::from("")));
    }

    #[test]
    fn test_missing_table_does_not_affect_others() {
        let (_dir, storage) = fixture(
            "CREATE TABLE report (id INTEGER);
             INSERT INTO report VALUES (7);",
        );

        match storage.read_table(&TableName::from("missing")) {
            Err(ExportError::TableScanError { table, failure, .. }) => {
                assert_eq!(table, "missing");
                assert_eq!(failure, ScanFailure::Query);
            }
            other => panic!("unexpected result: {:?}", other.map(|c| c.records.len())),
        }

        let content = storage.read_table(&TableName::from("report")).unwrap();
        assert_eq!(content.records[0].get("id"), Some(&Value::Int64(7)));
    }

    #[test]
    fn test_bad_cell_is_a_row_error() {
        let (_dir, storage) = fixture(
            "CREATE TABLE report (id INTEGER);
             INSERT INTO report VALUES (1);
             INSERT INTO report VALUES ('not a number');",
        );

        match storage.read_table(&TableName::from("report")) {
            Err(ExportError::TableScanError { failure, .. }) => {
                assert_eq!(failure, ScanFailure::Row(2));
            }
            other => panic!("unexpected result: {:?}", other.map(|c| c.records.len())),
        }
    }

    #[test]
    fn test_read_disabled_rules() {
        let (_dir, storage) = fixture(
            "CREATE TABLE rule_disable (org_id INTEGER, rule_id VARCHAR);
             INSERT INTO rule_disable VALUES (1, 'rule.b');
             INSERT INTO rule_disable VALUES (2, 'rule.a');
             INSERT INTO rule_disable VALUES (3, 'rule.b');",
        );

        let rules = storage.read_disabled_rules().unwrap();
        assert_eq!(
            rules,
            vec![
                DisabledRuleInfo::new("rule.a", 1),
                DisabledRuleInfo::new("rule.b", 2)
            ]
        );
    }

    #[test]
    fn test_null_rule_is_reported_as_empty() {
        let (_dir, storage) = fixture(
            "CREATE TABLE rule_disable (org_id INTEGER, rule_id VARCHAR);
             INSERT INTO rule_disable VALUES (1, NULL);
             INSERT INTO rule_disable VALUES (2, 'rule.a');",
        );

        let rules = storage.read_disabled_rules().unwrap();
        assert_eq!(
            rules,
            vec![DisabledRuleInfo::new("", 1), DisabledRuleInfo::new("rule.a", 1)]
        );
    }

    #[test]
    fn test_list_tables_keeps_names_resembling_internal_ones() {
        let (_dir, storage) = fixture(
            "CREATE TABLE sqlites (id INTEGER);
             CREATE TABLE sqlite1 (id INTEGER);
             CREATE TABLE counters (id INTEGER PRIMARY KEY AUTOINCREMENT);",
        );

        let mut tables = storage.list_tables().unwrap();
        tables.sort();
        assert_eq!(
            tables,
            vec![
                TableName::from("counters"),
                TableName::from("sqlite1"),
                TableName::from("sqlites")
            ]
        );
    }

    #[test]
    fn test_closed_storage_refuses_calls() {
        let (_dir, storage) = fixture("CREATE TABLE report (id INTEGER);");
        storage.close().unwrap();
        assert!(matches!(
            storage.list_tables(),
            Err(ExportError::ConnectionError(_))
        ));
    }

    #[test]
    fn test_scan_value_bool_text() {
        assert_eq!(
            scan_value(ScanCategory::Bool, ValueRef::Text(b"TRUE")).unwrap(),
            ScannedValue::Bool(Some(true))
        );
        assert_eq!(
            scan_value(ScanCategory::Bool, ValueRef::Text(b"f")).unwrap(),
            ScannedValue::Bool(Some(false))
        );
        assert!(scan_value(ScanCategory::Bool, ValueRef::Text(b"yes")).is_err());
        assert!(scan_value(ScanCategory::Bool, ValueRef::Real(1.0)).is_err());
    }

    #[test]
    fn test_scan_value_numbers() {
        assert_eq!(
            scan_value(ScanCategory::Int64, ValueRef::Real(3.0)).unwrap(),
            ScannedValue::Int64(Some(3))
        );
        assert!(scan_value(ScanCategory::Int64, ValueRef::Real(3.5)).is_err());
        assert_eq!(
            scan_value(ScanCategory::Float64, ValueRef::Integer(2)).unwrap(),
            ScannedValue::Float64(Some(2.0))
        );
        assert_eq!(
            scan_value(ScanCategory::String, ValueRef::Real(0.25)).unwrap(),
            ScannedValue::String(Some("0.25".to_string()))
        );
        assert_eq!(
            scan_value(ScanCategory::Int64, ValueRef::Null).unwrap(),
            ScannedValue::Int64(None)
        );
    }
}

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

//! SQL statements and logging helpers shared by both drivers.

use crate::domain::entities::{ColumnDescriptor, TableName};
use log::{debug, info};

/// All user tables, skipping the PostgreSQL system schemas.
pub const SELECT_LIST_OF_TABLES_PG: &str = "
    SELECT tablename
      FROM pg_catalog.pg_tables
     WHERE schemaname != 'information_schema'
       AND schemaname != 'pg_catalog'
";

/// All user tables, skipping SQLite's internal `sqlite_*` ones. `_` is a
/// LIKE wildcard, hence the escape.
pub const SELECT_LIST_OF_TABLES_SQLITE: &str = "
    SELECT name
      FROM sqlite_master
     WHERE type = 'table'
       AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'
";

pub const SELECT_DISABLED_RULES: &str = "
    SELECT rule_id, COUNT(*)
      FROM rule_disable
     GROUP BY rule_id
     ORDER BY rule_id
";

/// Full scan of `table` through an explicit column list.
pub fn select_columns_from_table(table: &TableName, columns: &[String]) -> String {
    format!("SELECT {} FROM {}", columns.join(", "), table.as_str())
}

/// Double-quoted SQL identifier.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Full scan of `table`.
///
/// Identifiers can't be bound as parameters, so the name is interpolated.
/// Table names only ever come from the catalog query.
pub fn select_all_from_table(table: &TableName) -> String {
    format!("SELECT * FROM {}", table.as_str())
}

/// Logs a statement at info level when SQL logging is enabled, debug otherwise.
pub fn log_statement(log_sql_queries: bool, sql: &str) {
    if log_sql_queries {
        info!("Performing SQL statement: {}", sql.trim());
    } else {
        debug!("Performing SQL statement: {}", sql.trim());
    }
}

/// Logs the column names and types discovered for `table`.
pub fn log_column_types(table: &TableName, columns: &[ColumnDescriptor]) {
    info!("Table {} metadata: {} columns", table, columns.len());
    for (i, column) in columns.iter().enumerate() {
        info!(
            "  column {}: name={} type={} category={}",
            i + 1,
            column.name,
            column.reported_type,
            column.category()
        );
    }
}

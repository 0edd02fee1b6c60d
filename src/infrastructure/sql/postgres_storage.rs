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

//! Infrastructure adapter reading tables from PostgreSQL.
//!
//! Column types come from the prepared statement, so they are known before
//! the first row is fetched. Columns of a type without a binary decoder are
//! re-selected as `::text`. Rows are streamed through a portal (`query_raw`)
//! and handed to the sink one at a time.

use crate::config::StorageConfig;
use crate::domain::entities::{ColumnDescriptor, DisabledRuleInfo, TableName};
use crate::domain::errors::{ExportError, Result};
use crate::domain::mapping::{normalize_postgres_type, ScanCategory};
use crate::domain::materialize::{RowMaterializer, ScannedValue};
use crate::infrastructure::sql::pg_text::{decodes_natively, DecodeResult, PgText};
use crate::infrastructure::sql::sql_utils::{
    log_column_types, log_statement, quote_identifier, select_all_from_table,
    select_columns_from_table, SELECT_DISABLED_RULES, SELECT_LIST_OF_TABLES_PG,
};
use crate::ports::storage_port::{RecordSink, StoragePort};
use log::info;
use postgres::fallible_iterator::FallibleIterator;
use postgres::types::{FromSql, Type};
use postgres::{NoTls, Row};
use r2d2::{Pool, PooledConnection};
use r2d2_postgres::PostgresConnectionManager;
use std::sync::RwLock;
use std::time::Duration;

type PgManager = PostgresConnectionManager<NoTls>;

/// Concrete implementation of `StoragePort` for PostgreSQL.
pub struct PostgresStorage {
    pool: RwLock<Option<Pool<PgManager>>>,
    log_sql_queries: bool,
}

impl PostgresStorage {
    /// Opens a pool of at most `pool_size` connections.
    ///
    /// The pool connects eagerly, so an unreachable server is reported here.
    pub fn connect(config: &StorageConfig, pool_size: u32) -> Result<Self> {
        let pg_config: postgres::Config = config
            .postgres_url()
            .parse()
            .map_err(|e: postgres::Error| ExportError::ConnectionError(e.to_string()))?;

        let manager = PostgresConnectionManager::new(pg_config, NoTls);
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

    fn conn(&self) -> Result<PooledConnection<PgManager>> {
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

impl StoragePort for PostgresStorage {
    fn list_tables(&self) -> Result<Vec<TableName>> {
        let mut client = self.conn()?;
        log_statement(self.log_sql_queries, SELECT_LIST_OF_TABLES_PG);

        let rows = client
            .query(SELECT_LIST_OF_TABLES_PG, &[])
            .map_err(|e| ExportError::CatalogQueryError(e.to_string()))?;

        rows.iter()
            .map(|row| {
                row.try_get::<_, String>(0)
                    .map(TableName::from)
                    .map_err(|e| ExportError::CatalogQueryError(e.to_string()))
            })
            .collect()
    }

    fn scan_table(&self, table: &TableName, sink: &mut dyn RecordSink) -> Result<u64> {
        let sql = select_all_from_table(table);
        log_statement(self.log_sql_queries, &sql);

        let mut client = self.conn()?;
        let mut statement = client
            .prepare(&sql)
            .map_err(|e| ExportError::query(table.as_str(), e))?;

        let columns: Vec<ColumnDescriptor> = statement
            .columns()
            .iter()
            .map(|c| ColumnDescriptor::new(c.name(), normalize_postgres_type(c.type_().name())))
            .collect();
        log_column_types(table, &columns);

        let types: Vec<(&str, &Type)> = statement
            .columns()
            .iter()
            .map(|c| (c.name(), c.type_()))
            .collect();
        if let Some(projection) = text_projection(&types) {
            let sql = select_columns_from_table(table, &projection);
            log_statement(self.log_sql_queries, &sql);
            statement = client
                .prepare(&sql)
                .map_err(|e| ExportError::query(table.as_str(), e))?;
        }

        let materializer = RowMaterializer::new(&columns);
        sink.begin(&columns)?;

        let params: Vec<String> = Vec::new();
        // The portal is closed when `rows` is dropped, on every return path.
        let mut rows = client
            .query_raw(&statement, params)
            .map_err(|e| ExportError::query(table.as_str(), e))?;

        let mut count = 0;
        while let Some(row) = rows
            .next()
            .map_err(|e| ExportError::row(table.as_str(), count + 1, e))?
        {
            count += 1;
            let scanned = scan_row(&row, materializer.categories())
                .map_err(|e| ExportError::row(table.as_str(), count, e))?;
            sink.record(materializer.materialize(scanned))?;
        }

        Ok(count)
    }

    fn read_disabled_rules(&self) -> Result<Vec<DisabledRuleInfo>> {
        let mut client = self.conn()?;
        log_statement(self.log_sql_queries, SELECT_DISABLED_RULES);

        let rows = client
            .query(SELECT_DISABLED_RULES, &[])
            .map_err(|e| ExportError::query("rule_disable", e))?;

        let mut rules = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let rule: Option<PgText> = row
                .try_get(0)
                .map_err(|e| ExportError::row("rule_disable", i as u64 + 1, e))?;
            let count: PgInt = row
                .try_get(1)
                .map_err(|e| ExportError::row("rule_disable", i as u64 + 1, e))?;
            rules.push(DisabledRuleInfo::new(rule.map(|r| r.0).unwrap_or_default(), count.0));
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

/// The column list with every type lacking a binary decoder cast to `text`,
/// or `None` when all columns decode as they are.
fn text_projection(columns: &[(&str, &Type)]) -> Option<Vec<String>> {
    if columns.iter().all(|(_, ty)| decodes_natively(ty)) {
        return None;
    }
    let projection = columns
        .iter()
        .map(|(column, ty)| {
            let name = quote_identifier(column);
            if decodes_natively(ty) {
                name
            } else {
                format!("{}::text AS {}", name, name)
            }
        })
        .collect();
    Some(projection)
}

/// Reads one row into holders of the given categories.
fn scan_row(
    row: &Row,
    categories: &[ScanCategory],
) -> std::result::Result<Vec<ScannedValue>, postgres::Error> {
    categories
        .iter()
        .enumerate()
        .map(|(i, category)| {
            Ok(match category {
                ScanCategory::String => {
                    ScannedValue::String(row.try_get::<_, Option<PgText>>(i)?.map(|v| v.0))
                }
                ScanCategory::Bool => ScannedValue::Bool(row.try_get::<_, Option<bool>>(i)?),
                ScanCategory::Int64 => {
                    ScannedValue::Int64(row.try_get::<_, Option<PgInt>>(i)?.map(|v| v.0))
                }
                ScanCategory::Float64 => {
                    ScannedValue::Float64(row.try_get::<_, Option<PgFloat>>(i)?.map(|v| v.0))
                }
            })
        })
        .collect()
}

/// Any PostgreSQL integer widened to 64 bits.
struct PgInt(i64);

impl<'a> FromSql<'a> for PgInt {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> DecodeResult<Self> {
        let value = if *ty == Type::INT2 {
            i16::from_sql(ty, raw)? as i64
        } else if *ty == Type::INT4 {
            i32::from_sql(ty, raw)? as i64
        } else {
            i64::from_sql(ty, raw)?
        };
        Ok(PgInt(value))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::INT2 || *ty == Type::INT4 || *ty == Type::INT8
    }
}

/// Any PostgreSQL float widened to 64 bits.
struct PgFloat(f64);

impl<'a> FromSql<'a> for PgFloat {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> DecodeResult<Self> {
        let value = if *ty == Type::FLOAT4 {
            f32::from_sql(ty, raw)? as f64
        } else {
            f64::from_sql(ty, raw)?
        };
        Ok(PgFloat(value))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::FLOAT4 || *ty == Type::FLOAT8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_projection_casts_only_unknown_types() {
        assert_eq!(text_projection(&[("id", &Type::INT4), ("note", &Type::TEXT)]), None);
        assert_eq!(
            text_projection(&[("id", &Type::INT4), ("Price", &Type::MONEY)]),
            Some(vec![
                "\"id\"".to_string(),
                "\"Price\"::text AS \"Price\"".to_string(),
            ])
        );
    }

    #[test]
    fn test_integer_widening() {
        assert_eq!(PgInt::from_sql(&Type::INT2, &(-3i16).to_be_bytes()).unwrap().0, -3);
        assert_eq!(PgInt::from_sql(&Type::INT4, &7i32.to_be_bytes()).unwrap().0, 7);
        assert_eq!(
            PgInt::from_sql(&Type::INT8, &i64::MAX.to_be_bytes()).unwrap().0,
            i64::MAX
        );
        assert!(!PgInt::accepts(&Type::TEXT));
    }
}

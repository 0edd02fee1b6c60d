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

//! # Storage Port
//!
//! This Port defines what it means to "read a database" for the exporter.
//! It doesn't care IF the database is SQLite, PostgreSQL, or a Mock for
//! testing. Any struct that implements `StoragePort` can be handed to the
//! Orchestrator.

use crate::domain::entities::{ColumnDescriptor, DisabledRuleInfo, Record, TableContent, TableName};
use crate::domain::errors::Result;

/// Receives the output of a table scan.
///
/// `begin` is called exactly once, before any record, with the column
/// metadata of the result set. Records follow in scan order. Returning an
/// error from either method aborts the scan and the error is propagated
/// unchanged.
pub trait RecordSink {
    fn begin(&mut self, columns: &[ColumnDescriptor]) -> Result<()>;
    fn record(&mut self, record: Record) -> Result<()>;
}

/// Sink that keeps everything in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub content: TableContent,
}

impl RecordSink for CollectingSink {
    fn begin(&mut self, columns: &[ColumnDescriptor]) -> Result<()> {
        self.content.columns = columns.to_vec();
        Ok(())
    }

    fn record(&mut self, record: Record) -> Result<()> {
        self.content.records.push(record);
        Ok(())
    }
}

/// `StoragePort` is shared across worker threads, hence `Send + Sync`.
pub trait StoragePort: Send + Sync {
    /// Names of all user tables, in whatever order the engine returns them.
    fn list_tables(&self) -> Result<Vec<TableName>>;

    /// Runs a full scan of `table`, feeding column metadata and then every
    /// row into `sink`. Returns the number of rows delivered.
    ///
    /// The result set is released before this returns, whatever the outcome.
    fn scan_table(&self, table: &TableName, sink: &mut dyn RecordSink) -> Result<u64>;

    /// Reads the whole content of `table` into memory.
    fn read_table(&self, table: &TableName) -> Result<TableContent> {
        let mut sink = CollectingSink::default();
        self.scan_table(table, &mut sink)?;
        Ok(sink.content)
    }

    /// Number of disablements per rule, from the `rule_disable` table.
    fn read_disabled_rules(&self) -> Result<Vec<DisabledRuleInfo>>;

    /// Releases the connection. Every later call fails with a connection error.
    fn close(&self) -> Result<()>;
}

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

//! The core application logic that orchestrates the overall export process.
//!
//! This module coordinates between the storage and the uploader: it lists
//! the tables, applies the include/exclude filters, and pushes every table
//! through scan, CSV serialization and upload. Results are aggregated into
//! one `TableExportResult` per table.

use crate::config::ExportConfig;
use crate::domain::cancellation::CancellationToken;
use crate::domain::entities::{ExportStage, TableExportResult, TableName};
use crate::domain::errors::{ExportError, Result};
use crate::infrastructure::serializer::csv_serializer::CsvSink;
use crate::ports::storage_port::StoragePort;
use crate::ports::upload_port::{UploadPort, CSV_CONTENT_TYPE};
use log::{error, info, warn};
use rayon::prelude::*;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// What happens to the remaining tables once one has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failure and return its error.
    FailFast,
    /// Export every table and report each outcome.
    Continue,
}

impl FailurePolicy {
    pub fn from_continue_flag(continue_on_error: bool) -> Self {
        if continue_on_error {
            FailurePolicy::Continue
        } else {
            FailurePolicy::FailFast
        }
    }
}

/// A failed table: where it stopped and why.
type TableFailure = (ExportStage, ExportError);

/// Orchestrates the export of every table of one storage.
pub struct ExportOrchestrator {
    storage: Arc<dyn StoragePort>,
    uploader: Arc<dyn UploadPort>,
    config: ExportConfig,
    policy: FailurePolicy,
    num_threads: usize,
}

impl ExportOrchestrator {
    /// The failure policy follows `config.continue_on_error`.
    pub fn new(
        storage: Arc<dyn StoragePort>,
        uploader: Arc<dyn UploadPort>,
        config: ExportConfig,
        num_threads: usize,
    ) -> Self {
        let policy = FailurePolicy::from_continue_flag(config.continue_on_error);
        Self {
            storage,
            uploader,
            config,
            policy,
            num_threads: num_threads.max(1),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Entry point for running the full export process.
    ///
    /// Under `FailFast` the first failed table's error is returned and tables
    /// not yet started are skipped. Under `Continue` every selected table
    /// gets a result, in catalog order.
    pub fn run(&self, cancel: &CancellationToken) -> Result<Vec<TableExportResult>> {
        let start_time = Instant::now();
        info!("Starting export ({:?}, {} workers)", self.policy, self.num_threads);

        let tables = self.select_tables(self.storage.list_tables()?);
        if tables.is_empty() {
            info!("No tables found to export.");
            return Ok(vec![]);
        }
        info!("{} tables to export", tables.len());

        let (results, first_error) = if self.num_threads == 1 {
            self.run_sequential(&tables, cancel)
        } else {
            self.run_parallel(&tables, cancel)?
        };

        let success = results.iter().filter(|r| r.is_success()).count();
        info!("{}/{} tables exported", success, tables.len());

        let report = if self.config.report_dir.is_some() {
            self.generate_report(&results, start_time.elapsed().as_secs_f64())
        } else {
            Ok(())
        };

        // A table failure outranks a failure to write the report.
        match (first_error, report) {
            (Some(e), Err(report_error)) => {
                error!("Unable to write run report: {}", report_error);
                Err(e)
            }
            (Some(e), Ok(())) => Err(e),
            (None, Err(report_error)) => Err(report_error),
            (None, Ok(())) => Ok(results),
        }
    }

    /// Applies the include and exclude lists, keeping catalog order.
    fn select_tables(&self, tables: Vec<TableName>) -> Vec<TableName> {
        tables
            .into_iter()
            .filter(|t| {
                if self.config.is_excluded(t.as_str()) {
                    info!("Skipping excluded table: {}", t);
                    return false;
                }
                self.config.is_selected(t.as_str())
            })
            .collect()
    }

    fn run_sequential(
        &self,
        tables: &[TableName],
        cancel: &CancellationToken,
    ) -> (Vec<TableExportResult>, Option<ExportError>) {
        let mut results = Vec::with_capacity(tables.len());
        for table in tables {
            let (result, failure) = self.process_table(table, cancel);
            results.push(result);
            if let Some(e) = failure {
                if self.policy == FailurePolicy::FailFast {
                    return (results, Some(e));
                }
            }
        }
        (results, None)
    }

    fn run_parallel(
        &self,
        tables: &[TableName],
        cancel: &CancellationToken,
    ) -> Result<(Vec<TableExportResult>, Option<ExportError>)> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .build()
            .map_err(|e| ExportError::ConfigError(format!("worker pool: {}", e)))?;

        let stop = AtomicBool::new(false);
        let first_error: Mutex<Option<ExportError>> = Mutex::new(None);

        let results: Vec<TableExportResult> = pool.install(|| {
            tables
                .par_iter()
                .filter_map(|table| {
                    if stop.load(Ordering::SeqCst) {
                        warn!("Skipping table {} after an earlier failure", table);
                        return None;
                    }
                    let (result, failure) = self.process_table(table, cancel);
                    if let Some(e) = failure {
                        if self.policy == FailurePolicy::FailFast {
                            stop.store(true, Ordering::SeqCst);
                            if let Ok(mut slot) = first_error.lock() {
                                slot.get_or_insert(e);
                            }
                        }
                    }
                    Some(result)
                })
                .collect()
        });

        let first_error = first_error.into_inner().unwrap_or_else(|p| p.into_inner());
        Ok((results, first_error))
    }

    /// Exports one table and turns the outcome into its result. The error is
    /// handed back as well so `FailFast` can return it.
    fn process_table(
        &self,
        table: &TableName,
        cancel: &CancellationToken,
    ) -> (TableExportResult, Option<ExportError>) {
        info!("Exporting table {}", table);
        let start = Instant::now();

        match self.export_table(table, cancel) {
            Ok((rows, bytes)) => {
                let duration = start.elapsed().as_secs_f64();
                info!(
                    "Table {} exported: {} rows, {} bytes in {:.2}s",
                    table, rows, bytes, duration
                );
                (TableExportResult::success(table, rows, bytes, duration), None)
            }
            Err((stage, e)) => {
                let duration = start.elapsed().as_secs_f64();
                error!("Table {} failed at {} stage: {}", table, stage, e);
                (
                    TableExportResult::failure(table, stage, e.to_string(), duration),
                    Some(e),
                )
            }
        }
    }

    /// Scan into the CSV buffer, then upload it under the table's name.
    fn export_table(
        &self,
        table: &TableName,
        cancel: &CancellationToken,
    ) -> std::result::Result<(u64, u64), TableFailure> {
        cancel
            .check(&format!("export of table {}", table))
            .map_err(|e| (ExportStage::Read, e))?;

        let mut sink = CsvSink::new(table, cancel);
        self.storage
            .scan_table(table, &mut sink)
            .map_err(|e| (e.stage(), e))?;

        let rows = sink.rows();
        let payload = sink.finish().map_err(|e| (ExportStage::Serialize, e))?;
        let bytes = payload.len() as u64;

        self.uploader
            .put(table.as_str(), CSV_CONTENT_TYPE, payload, Some(bytes), cancel)
            .map_err(|e| (ExportStage::Upload, e))?;

        Ok((rows, bytes))
    }

    fn generate_report(&self, results: &[TableExportResult], duration_secs: f64) -> Result<()> {
        let Some(report_dir) = self.config.report_dir.as_deref() else {
            return Ok(());
        };

        let success = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - success;
        let total_rows: u64 = results.iter().map(|r| r.rows).sum();
        let total_bytes: u64 = results.iter().map(|r| r.bytes).sum();

        let report = json!({
            "summary": {
                "total_tables": results.len(),
                "success": success,
                "failed": failed,
                "total_rows": total_rows,
                "total_bytes": total_bytes,
                "total_duration_seconds": duration_secs,
            },
            "details": results
        });

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let report_path = format!("{}/report_{}.json", report_dir, timestamp);

        std::fs::create_dir_all(report_dir)
            .map_err(|e| ExportError::serialization(report_dir, e))?;
        let file = std::fs::File::create(&report_path)
            .map_err(|e| ExportError::serialization(&report_path, e))?;
        serde_json::to_writer_pretty(file, &report)
            .map_err(|e| ExportError::serialization(&report_path, e))?;

        info!("Run report written into {}", report_path);
        Ok(())
    }
}

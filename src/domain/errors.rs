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

//! Core error definitions for the table exporter.
//!
//! This module provides a centralized `ExportError` enum and a `Result` type
//! used throughout the application. Every variant belongs to exactly one
//! [`ExportStage`], which is what ends up in the per-table result.

use crate::domain::entities::ExportStage;
use std::fmt;
use thiserror::Error;

/// Which part of a table scan went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanFailure {
    /// The statement could not be prepared or executed.
    Query,
    /// A single row could not be read; carries the 1-based row number.
    Row(u64),
}

impl fmt::Display for ScanFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanFailure::Query => write!(f, "query"),
            ScanFailure::Row(n) => write!(f, "row {}", n),
        }
    }
}

/// Error types encountered during the export process.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Driver {0} is not supported")]
    UnsupportedDriver(String),

    #[error("Storage connection error: {0}")]
    ConnectionError(String),

    #[error("Catalog query failed: {0}")]
    CatalogQueryError(String),

    #[error("Scan of table {table} failed ({failure}): {reason}")]
    TableScanError {
        table: String,
        failure: ScanFailure,
        reason: String,
    },

    #[error("CSV serialization to {target} failed: {reason}")]
    SerializationError { target: String, reason: String },

    #[error("Upload of {key} failed: {reason}")]
    UploadError { key: String, reason: String },

    #[error("Operation cancelled: {0}")]
    Cancelled(String),
}

impl ExportError {
    /// Shorthand for a failure while running the full-scan statement.
    pub fn query(table: &str, reason: impl ToString) -> Self {
        ExportError::TableScanError {
            table: table.to_string(),
            failure: ScanFailure::Query,
            reason: reason.to_string(),
        }
    }

    /// Shorthand for a failure while reading row `row` of `table`.
    pub fn row(table: &str, row: u64, reason: impl ToString) -> Self {
        ExportError::TableScanError {
            table: table.to_string(),
            failure: ScanFailure::Row(row),
            reason: reason.to_string(),
        }
    }

    pub fn serialization(target: &str, reason: impl ToString) -> Self {
        ExportError::SerializationError {
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn upload(key: &str, reason: impl ToString) -> Self {
        ExportError::UploadError {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    /// The pipeline stage this error is reported under when it escapes a
    /// table scan. Errors returned by the uploader are always `Upload`.
    pub fn stage(&self) -> ExportStage {
        match self {
            ExportError::SerializationError { .. } => ExportStage::Serialize,
            ExportError::UploadError { .. } => ExportStage::Upload,
            _ => ExportStage::Read,
        }
    }
}

/// A specialized Result type for the exporter.
pub type Result<T> = std::result::Result<T, ExportError>;

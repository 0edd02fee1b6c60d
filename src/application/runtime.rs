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

//! # Runtime Context
//!
//! This module acts as the "Engine Room" of the application. It sets up the
//! underlying resources that live for the whole run:
//! 1. **Logging**: `env_logger` at the configured level.
//! 2. **Worker count**: how many tables are exported at the same time.
//! 3. **Connection Pool**: an `r2d2` pool to the configured database.
//! 4. **Uploader**: the object store client.

use crate::config::{AppConfig, ExportConfig, LoggingConfig};
use crate::domain::errors::Result;
use crate::infrastructure::sql::new_storage;
use crate::infrastructure::upload::object_store_uploader::ObjectStoreUploader;
use crate::ports::storage_port::StoragePort;
use crate::ports::upload_port::UploadPort;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Share of the CPUs used when neither `parallel` nor `cpu_percent` is set.
const DEFAULT_CPU_PERCENT: u8 = 50;

/// `RuntimeContext` holds shared resources that exist for the entire life of the app.
pub struct RuntimeContext {
    pub storage: Arc<dyn StoragePort>,
    pub uploader: Arc<dyn UploadPort>,
    /// The number of tables exported at once.
    pub num_threads: usize,
}

impl RuntimeContext {
    /// Opens the storage and the uploader.
    ///
    /// The pool gets one connection per worker plus a spare for the catalog
    /// query, except in sequential mode where a single connection is enough.
    pub fn init(config: &AppConfig) -> Result<Self> {
        let num_threads = worker_count(&config.export);
        let pool_size = if num_threads == 1 {
            1
        } else {
            (num_threads + 1) as u32
        };

        let storage = new_storage(&config.storage, pool_size)?;

        let timeout = config.export.upload_timeout_secs.map(Duration::from_secs);
        let uploader = match ObjectStoreUploader::from_config(&config.s3, timeout) {
            Ok(u) => Arc::new(u),
            Err(e) => {
                close_quietly(storage.as_ref());
                return Err(e);
            }
        };

        Ok(Self {
            storage,
            uploader,
            num_threads,
        })
    }

    /// Closes the storage. Failures are only logged.
    pub fn close(&self) {
        close_quietly(self.storage.as_ref());
    }
}

pub fn close_quietly(storage: &dyn StoragePort) {
    if let Err(e) = storage.close() {
        warn!("Unable to close connection to data storage: {}", e);
    }
}

/// Initializes `env_logger`. `RUST_LOG`, when set, wins over the config.
pub fn init_logging(config: &LoggingConfig) {
    let mut builder = if std::env::var_os("RUST_LOG").is_some() {
        env_logger::Builder::from_default_env()
    } else {
        let mut b = env_logger::Builder::new();
        b.filter_level(config.level_filter());
        b
    };
    // A second init (tests, repeated calls) is harmless.
    let _ = builder.try_init();
}

/// Number of tables exported concurrently.
///
/// An explicit `parallel` wins; otherwise `cpu_percent` of the available
/// cores, rounded up. Always at least 1.
pub fn worker_count(config: &ExportConfig) -> usize {
    let cpu_percent = config.cpu_percent.unwrap_or(DEFAULT_CPU_PERCENT);
    let total_cpus = num_cpus::get();
    let num_threads = config
        .parallel
        .unwrap_or_else(|| (total_cpus as f64 * (cpu_percent as f64 / 100.0)).ceil() as usize);
    let num_threads = std::cmp::max(1, num_threads);

    info!(
        "Initializing worker pool with {} threads (Target CPU: {}%)",
        num_threads, cpu_percent
    );
    num_threads
}

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

//! Storage adapters for the supported SQL engines.

mod pg_text;
pub mod postgres_storage;
pub mod sql_utils;
pub mod sqlite_storage;

use crate::config::{DbDriver, StorageConfig};
use crate::domain::errors::{ExportError, Result};
use crate::ports::storage_port::StoragePort;
use log::{error, info};
use postgres_storage::PostgresStorage;
use sqlite_storage::SqliteStorage;
use std::sync::Arc;

/// Opens the storage selected by `storage.db_driver` with a pool of at most
/// `pool_size` connections.
pub fn new_storage(config: &StorageConfig, pool_size: u32) -> Result<Arc<dyn StoragePort>> {
    let driver = config.driver()?;
    info!(
        "Initializing connection to {} storage at {} (pool size {})",
        config.db_driver,
        config.display_target()?,
        pool_size
    );

    let storage: Result<Arc<dyn StoragePort>> = match driver {
        DbDriver::Sqlite3 => SqliteStorage::connect(config, pool_size).map(|s| Arc::new(s) as _),
        DbDriver::Postgres => {
            PostgresStorage::connect(config, pool_size).map(|s| Arc::new(s) as _)
        }
    };

    match storage {
        Ok(s) => Ok(s),
        Err(e) => {
            error!("Unable to connect to storage: {}", e);
            Err(match e {
                ExportError::ConnectionError(_) | ExportError::ConfigError(_) => e,
                other => ExportError::ConnectionError(other.to_string()),
            })
        }
    }
}

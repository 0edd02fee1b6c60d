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

//! # Object Store Uploader
//!
//! Implements `UploadPort` on top of the `object_store` crate. The rest of
//! the exporter is synchronous, so the uploader owns a small tokio runtime
//! and blocks on each put.
//!
//! Every put races a cancellation watcher. Whichever finishes first wins; a
//! losing put future is dropped, which aborts the HTTP request.

use crate::config::{S3Config, StoreKind};
use crate::domain::cancellation::CancellationToken;
use crate::domain::errors::{ExportError, Result};
use crate::ports::upload_port::UploadPort;
use log::{debug, info};
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{Attribute, AttributeValue, Attributes, ObjectStore, PutOptions, PutPayload};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

/// How often a running put looks at its cancellation token.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

pub struct ObjectStoreUploader {
    store: Arc<dyn ObjectStore>,
    runtime: Runtime,
    /// The local filesystem backend rejects object attributes.
    attach_content_type: bool,
    /// Upper bound for a single put, on top of the caller's token.
    timeout: Option<Duration>,
}

impl ObjectStoreUploader {
    /// Builds the backend selected by `config.type`.
    pub fn from_config(config: &S3Config, timeout: Option<Duration>) -> Result<Self> {
        let (store, attach_content_type): (Arc<dyn ObjectStore>, bool) = match config.store_kind()? {
            StoreKind::S3 => {
                let mut builder = AmazonS3Builder::new()
                    .with_bucket_name(&config.bucket)
                    .with_region(&config.region)
                    .with_allow_http(!config.use_ssl);
                if !config.endpoint_url.is_empty() {
                    builder = builder.with_endpoint(config.endpoint());
                }
                if !config.access_key_id.is_empty() {
                    builder = builder
                        .with_access_key_id(&config.access_key_id)
                        .with_secret_access_key(&config.secret_access_key);
                }
                let s3 = builder
                    .build()
                    .map_err(|e| ExportError::ConfigError(format!("object store: {}", e)))?;
                info!(
                    "Uploading into bucket {} at {}",
                    config.bucket,
                    config.endpoint()
                );
                (Arc::new(s3), true)
            }
            StoreKind::Local => {
                std::fs::create_dir_all(&config.local_path).map_err(|e| {
                    ExportError::ConfigError(format!("cannot create {}: {}", config.local_path, e))
                })?;
                let local = LocalFileSystem::new_with_prefix(&config.local_path)
                    .map_err(|e| ExportError::ConfigError(format!("object store: {}", e)))?;
                info!("Uploading into local directory {}", config.local_path);
                (Arc::new(local), false)
            }
            StoreKind::Memory => {
                info!("Uploading into in-memory store, nothing will be persisted");
                (Arc::new(InMemory::new()), true)
            }
        };
        Self::with_store(store, attach_content_type, timeout)
    }

    /// Wraps an already built store.
    pub fn with_store(
        store: Arc<dyn ObjectStore>,
        attach_content_type: bool,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|e| ExportError::ConfigError(format!("tokio runtime: {}", e)))?;
        Ok(Self {
            store,
            runtime,
            attach_content_type,
            timeout,
        })
    }

    fn put_options(&self, content_type: &str) -> PutOptions {
        let mut attributes = Attributes::new();
        if self.attach_content_type {
            attributes.insert(
                Attribute::ContentType,
                AttributeValue::from(content_type.to_string()),
            );
        }
        PutOptions {
            attributes,
            ..Default::default()
        }
    }
}

async fn cancelled(token: &CancellationToken) {
    while !token.is_cancelled() {
        tokio::time::sleep(CANCEL_POLL_INTERVAL).await;
    }
}

impl UploadPort for ObjectStoreUploader {
    fn put(
        &self,
        key: &str,
        content_type: &str,
        payload: Vec<u8>,
        size: Option<u64>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if let Some(declared) = size {
            if declared != payload.len() as u64 {
                return Err(ExportError::upload(
                    key,
                    format!(
                        "declared size {} does not match payload length {}",
                        declared,
                        payload.len()
                    ),
                ));
            }
        }

        let operation = format!("upload of {}", key);
        cancel.check(&operation)?;
        let token = match self.timeout {
            Some(timeout) => cancel.with_timeout(timeout),
            None => cancel.clone(),
        };

        debug!("Putting {} bytes into {} ({})", payload.len(), key, content_type);
        let location = Path::from(key);
        let options = self.put_options(content_type);
        let store = self.store.clone();

        self.runtime.block_on(async {
            tokio::select! {
                res = store.put_opts(&location, PutPayload::from(payload), options) => {
                    res.map(|_| ()).map_err(|e| ExportError::upload(key, e))
                }
                _ = cancelled(&token) => Err(ExportError::Cancelled(operation.clone())),
            }
        })
    }
}

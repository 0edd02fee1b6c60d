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

//! # Upload Port
//!
//! The contract for putting one finished CSV into the object store.

use crate::domain::cancellation::CancellationToken;
use crate::domain::errors::Result;

/// Media type of every exported table.
pub const CSV_CONTENT_TYPE: &str = "text/csv";

pub trait UploadPort: Send + Sync {
    /// Stores `payload` as a single object named `key`.
    ///
    /// `size` is the declared payload length, or `None` when unknown. The put
    /// is atomic and never retried. When `cancel` fires, the in-flight request
    /// is abandoned and `ExportError::Cancelled` is returned.
    fn put(
        &self,
        key: &str,
        content_type: &str,
        payload: Vec<u8>,
        size: Option<u64>,
        cancel: &CancellationToken,
    ) -> Result<()>;
}

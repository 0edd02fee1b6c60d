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

//! # SQL CSV Exporter
//!
//! Exports every table of a SQLite or PostgreSQL database into one CSV
//! object per table in an object store (S3, Minio, a local directory or
//! memory).
//!
//! The crate follows the **Hexagonal Architecture** (Ports and Adapters):
//! `domain` holds the data model and rules, `ports` the traits the
//! application talks to, `infrastructure` the drivers, serializer and
//! uploader behind them, and `application` wires a run together.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ports;

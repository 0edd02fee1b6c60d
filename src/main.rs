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

use clap::Parser;
use log::{error, info};
use sql_csv_exporter::application::orchestrator::ExportOrchestrator;
use sql_csv_exporter::application::runtime::{close_quietly, init_logging, RuntimeContext};
use sql_csv_exporter::config::{AppConfig, CliArgs, LoggingConfig};
use sql_csv_exporter::domain::cancellation::CancellationToken;
use sql_csv_exporter::domain::errors::Result;
use sql_csv_exporter::infrastructure::serializer::csv_serializer::{
    store_disabled_rules_into_file, store_table_names_into_file,
};
use sql_csv_exporter::infrastructure::sql::new_storage;
use sql_csv_exporter::ports::storage_port::StoragePort;
use std::process;
use std::time::Duration;

fn main() {
    // 1. Parse Arguments
    let args = CliArgs::parse();

    // 2. Load Config: file, then environment, then command line
    let config = match load_config(&args) {
        Ok(c) => c,
        Err(e) => {
            init_logging(&LoggingConfig::default());
            error!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    // 3. Initialize Logging
    init_logging(&config.logging);

    if args.show_configuration {
        match serde_yaml::to_string(&config.redacted()) {
            Ok(text) => {
                println!("{}", text);
                return;
            }
            Err(e) => {
                error!("Unable to print configuration: {}", e);
                process::exit(1);
            }
        }
    }

    // 4. Run the requested operation
    let outcome = if args.tables_file.is_some() || args.disabled_rules_file.is_some() {
        export_lists(&args, &config)
    } else {
        export_tables(&args, &config)
    };

    match outcome {
        Ok(true) => info!("Finished successfully"),
        Ok(false) => {
            error!("Finished with failed tables");
            process::exit(1);
        }
        Err(e) => {
            error!("Export failed: {}", e);
            process::exit(1);
        }
    }
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let mut config = AppConfig::load(args.config.as_deref())?;
    config.merge_cli(args);
    config.validate()?;
    Ok(config)
}

/// Writes the table list and/or the disabled rules statistic into local files.
fn export_lists(args: &CliArgs, config: &AppConfig) -> Result<bool> {
    let storage = new_storage(&config.storage, 1)?;
    let outcome = write_lists(args, storage.as_ref());
    close_quietly(storage.as_ref());
    outcome.map(|_| true)
}

fn write_lists(args: &CliArgs, storage: &dyn StoragePort) -> Result<()> {
    if let Some(path) = &args.tables_file {
        let tables = storage.list_tables()?;
        store_table_names_into_file(path, &tables)?;
    }
    if let Some(path) = &args.disabled_rules_file {
        let rules = storage.read_disabled_rules()?;
        store_disabled_rules_into_file(path, &rules)?;
    }
    Ok(())
}

/// Exports every selected table into the object store.
fn export_tables(args: &CliArgs, config: &AppConfig) -> Result<bool> {
    let ctx = RuntimeContext::init(config)?;

    let mut cancel = CancellationToken::new();
    if let Some(secs) = args.timeout {
        info!("Export deadline set to {}s", secs);
        cancel = cancel.with_timeout(Duration::from_secs(secs));
    }

    let orchestrator = ExportOrchestrator::new(
        ctx.storage.clone(),
        ctx.uploader.clone(),
        config.export.clone(),
        ctx.num_threads,
    );

    info!("Starting Export process...");
    let outcome = orchestrator.run(&cancel);
    ctx.close();

    let results = outcome?;
    let failed: Vec<&str> = results
        .iter()
        .filter(|r| !r.is_success())
        .map(|r| r.table.as_str())
        .collect();
    if !failed.is_empty() {
        error!("Failed tables: {}", failed.join(", "));
    }
    Ok(failed.is_empty())
}

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

//! # CSV Serializer
//!
//! Turns a header plus records into CSV text: comma delimited, LF
//! terminated, fields quoted only when they contain a delimiter, a quote or a
//! line break. The header is written even when there are no records.
//!
//! [`CsvEncoder`] is the incremental form used while a table is being
//! scanned; [`encode`] is the batch form used for the small auxiliary lists.

use crate::domain::cancellation::CancellationToken;
use crate::domain::entities::{ColumnDescriptor, DisabledRuleInfo, Record, TableName, Value};
use crate::domain::errors::{ExportError, Result};
use crate::ports::storage_port::RecordSink;
use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};
use log::info;
use std::io::Write;

pub const TABLE_NAMES_HEADER: &[&str] = &["Table name"];
pub const DISABLED_RULES_HEADER: &[&str] = &["Rule", "Count"];

/// Writes a header once, then one CSV line per record.
pub struct CsvEncoder<W: Write> {
    writer: Writer<W>,
    header: Vec<String>,
    target: String,
}

impl<W: Write> CsvEncoder<W> {
    /// Wraps `inner` and writes the header line immediately.
    ///
    /// `target` only names the destination in error messages.
    pub fn new(inner: W, header: Vec<String>, target: &str) -> Result<Self> {
        let mut writer = WriterBuilder::new()
            .delimiter(b',')
            .terminator(Terminator::Any(b'\n'))
            .quote_style(QuoteStyle::Necessary)
            .from_writer(inner);

        writer
            .write_record(&header)
            .map_err(|e| ExportError::serialization(target, e))?;

        Ok(Self {
            writer,
            header,
            target: target.to_string(),
        })
    }

    /// Renders `record` in header order. Columns the record lacks are empty.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        let same_order = record
            .iter()
            .map(|(column, _)| column)
            .eq(self.header.iter().map(String::as_str));

        let fields: Vec<String> = if same_order {
            record.iter().map(|(_, value)| value.to_string()).collect()
        } else {
            self.header
                .iter()
                .map(|column| {
                    record
                        .get(column)
                        .map(Value::to_string)
                        .unwrap_or_default()
                })
                .collect()
        };
        self.writer
            .write_record(&fields)
            .map_err(|e| ExportError::serialization(&self.target, e))
    }

    /// Flushes buffered output and hands back the underlying writer.
    pub fn finish(self) -> Result<W> {
        let target = self.target;
        self.writer
            .into_inner()
            .map_err(|e| ExportError::serialization(&target, e.error()))
    }
}

/// Batch form: the full CSV text for `header` and `records`.
pub fn encode(header: &[String], records: &[Record]) -> Result<Vec<u8>> {
    let mut encoder = CsvEncoder::new(Vec::new(), header.to_vec(), "buffer")?;
    for record in records {
        encoder.write_record(record)?;
    }
    encoder.finish()
}

/// Streams a table scan straight into an in-memory CSV buffer.
///
/// The cancellation token is checked before every record, so a fired token
/// stops the scan between rows.
pub struct CsvSink {
    table: TableName,
    cancel: CancellationToken,
    encoder: Option<CsvEncoder<Vec<u8>>>,
    rows: u64,
}

impl CsvSink {
    pub fn new(table: &TableName, cancel: &CancellationToken) -> Self {
        Self {
            table: table.clone(),
            cancel: cancel.clone(),
            encoder: None,
            rows: 0,
        }
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// The finished CSV payload.
    pub fn finish(self) -> Result<Vec<u8>> {
        match self.encoder {
            Some(encoder) => encoder.finish(),
            None => Err(ExportError::serialization(
                self.table.as_str(),
                "no column metadata was received",
            )),
        }
    }
}

impl RecordSink for CsvSink {
    fn begin(&mut self, columns: &[ColumnDescriptor]) -> Result<()> {
        let header = columns.iter().map(|c| c.name.clone()).collect();
        self.encoder = Some(CsvEncoder::new(Vec::new(), header, self.table.as_str())?);
        Ok(())
    }

    fn record(&mut self, record: Record) -> Result<()> {
        self.cancel
            .check(&format!("scan of table {}", self.table))?;
        let encoder = self.encoder.as_mut().ok_or_else(|| {
            ExportError::serialization(self.table.as_str(), "record received before header")
        })?;
        encoder.write_record(&record)?;
        self.rows += 1;
        Ok(())
    }
}

fn header_of(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn store_into_file(path: &str, header: &[&str], records: &[Record]) -> Result<()> {
    if path.trim().is_empty() {
        return Err(ExportError::serialization(path, "destination path is empty"));
    }
    let payload = encode(&header_of(header), records)?;
    std::fs::write(path, payload).map_err(|e| ExportError::serialization(path, e))
}

/// Writes the list of table names as a one-column CSV file.
pub fn store_table_names_into_file(path: &str, tables: &[TableName]) -> Result<()> {
    let records: Vec<Record> = tables
        .iter()
        .map(|t| Record::from_pairs([(TABLE_NAMES_HEADER[0], Value::from(t.as_str()))]))
        .collect();
    store_into_file(path, TABLE_NAMES_HEADER, &records)?;
    info!("Table list with {} names written into {}", tables.len(), path);
    Ok(())
}

/// Writes the (rule, count) list as a two-column CSV file.
pub fn store_disabled_rules_into_file(path: &str, rules: &[DisabledRuleInfo]) -> Result<()> {
    let records: Vec<Record> = rules
        .iter()
        .map(|r| {
            Record::from_pairs([
                (DISABLED_RULES_HEADER[0], Value::from(r.rule.as_str())),
                (DISABLED_RULES_HEADER[1], Value::Int64(r.count)),
            ])
        })
        .collect();
    store_into_file(path, DISABLED_RULES_HEADER, &records)?;
    info!("Disabled rules list with {} rules written into {}", rules.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_header_only() {
        let out = encode(&header_of(TABLE_NAMES_HEADER), &[]).unwrap();
        assert_eq!(as_text(out), "Table name\n");
    }

    #[test]
    fn test_table_names() {
        let records: Vec<Record> = ["first", "second"]
            .iter()
            .map(|n| Record::from_pairs([("Table name", *n)]))
            .collect();
        let out = encode(&header_of(TABLE_NAMES_HEADER), &records).unwrap();
        assert_eq!(as_text(out), "Table name\nfirst\nsecond\n");
    }

    #[test]
    fn test_disabled_rules_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.csv");
        let path = path.to_str().unwrap();
        let rules = vec![
            DisabledRuleInfo::new("first", 1),
            DisabledRuleInfo::new("second", 2),
            DisabledRuleInfo::new("third", 3),
        ];

        store_disabled_rules_into_file(path, &rules).unwrap();
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "Rule,Count\nfirst,1\nsecond,2\nthird,3\n"
        );
    }

    #[test]
    fn test_empty_table_list_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.csv");
        let path = path.to_str().unwrap();

        store_table_names_into_file(path, &[]).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "Table name\n");
    }

    #[test]
    fn test_empty_path_is_an_error() {
        let err = store_table_names_into_file("", &[TableName::from("t")]).unwrap_err();
        assert!(matches!(err, ExportError::SerializationError { .. }));

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no/such/dir/out.csv");
        let err = store_disabled_rules_into_file(missing.to_str().unwrap(), &[]).unwrap_err();
        assert!(matches!(err, ExportError::SerializationError { .. }));
    }

    #[test]
    fn test_values_render_in_header_order() {
        let header = header_of(&["id", "name", "active", "ratio"]);
        let record = Record::from_pairs([
            ("active", Value::Bool(true)),
            ("name", Value::from("a,\"b\"")),
            ("id", Value::Int64(-7)),
        ]);
        let out = encode(&header, &[record]).unwrap();
        assert_eq!(as_text(out), "id,name,active,ratio\n-7,\"a,\"\"b\"\"\",true,\n");
    }

    #[test]
    fn test_multiline_and_float_fields() {
        let header = header_of(&["note", "score"]);
        let record = Record::from_pairs([
            ("note", Value::from("line1\nline2")),
            ("score", Value::Float64(0.1)),
        ]);
        let out = encode(&header, &[record]).unwrap();
        assert_eq!(as_text(out), "note,score\n\"line1\nline2\",0.1\n");
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let header = header_of(&["a", "b"]);
        let records = vec![
            Record::from_pairs([("a", Value::Int64(1)), ("b", Value::from("x"))]),
            Record::from_pairs([("b", Value::from("y")), ("a", Value::Int64(2))]),
        ];
        assert_eq!(
            encode(&header, &records).unwrap(),
            encode(&header, &records).unwrap()
        );
    }

    #[test]
    fn test_sink_counts_rows_and_honours_cancel() {
        let table = TableName::from("report");
        let token = CancellationToken::new();
        let mut sink = CsvSink::new(&table, &token);
        sink.begin(&[ColumnDescriptor::new("id", "INT4")]).unwrap();
        sink.record(Record::from_pairs([("id", Value::Int64(1))])).unwrap();

        token.cancel();
        let err = sink
            .record(Record::from_pairs([("id", Value::Int64(2))]))
            .unwrap_err();
        assert!(matches!(err, ExportError::Cancelled(_)));
        assert_eq!(sink.rows(), 1);
        assert_eq!(as_text(sink.finish().unwrap()), "id\n1\n");
    }

    #[test]
    fn test_sink_without_header_fails() {
        let sink = CsvSink::new(&TableName::from("t"), &CancellationToken::new());
        assert!(sink.finish().is_err());
    }
}

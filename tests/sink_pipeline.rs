// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Producer-to-file integration tests for the streaming sink.

mod common;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use parquet_flow::basic::{Repetition, Type};
use parquet_flow::errors::ParquetFlowError;
use parquet_flow::file::properties::{SinkProperties, WriterProperties};
use parquet_flow::file::writer::SerializedFileWriter;
use parquet_flow::schema::{ColumnDef, SchemaDescriptor};
use parquet_flow::sink::LogSink;

use common::*;

fn seq_schema() -> SchemaDescriptor {
    SchemaDescriptor::new(vec![ColumnDef::new(
        "seq",
        Type::INT64,
        Repetition::REQUIRED,
    )])
    .unwrap()
}

fn file_sink(
    path: &std::path::Path,
    row_group_rows: usize,
) -> LogSink<std::io::BufWriter<std::fs::File>> {
    let file = std::fs::File::create(path).unwrap();
    let writer = SerializedFileWriter::new(
        std::io::BufWriter::new(file),
        seq_schema(),
        Arc::new(WriterProperties::default()),
    )
    .unwrap();
    let props = SinkProperties::builder()
        .set_ring_capacity(256)
        .set_row_group_rows(row_group_rows)
        .set_idle_timeout(Duration::from_millis(5))
        .build()
        .unwrap();
    LogSink::try_new(writer, props).unwrap()
}

#[test]
fn test_records_survive_in_producer_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seq.parquet");
    let mut sink = file_sink(&path, 64);
    sink.start().unwrap();

    let mut accepted = Vec::new();
    for i in 0..1000i64 {
        if sink.try_record(&i.to_le_bytes()) {
            accepted.push(i);
        }
    }
    sink.shutdown().unwrap();
    assert_eq!(sink.entries_written(), accepted.len() as u64);
    assert_eq!(
        accepted.len() as u64 + sink.dropped_count(),
        1000,
        "accepted + dropped == attempted"
    );

    let bytes = std::fs::read(&path).unwrap();
    let metadata = parse_file_metadata(&bytes);
    assert_eq!(metadata.num_rows, accepted.len() as i64);
    let mut seen = Vec::new();
    for row_group in &metadata.row_groups {
        let (_, body) = read_page_body(&bytes, &row_group.columns[0]);
        seen.extend(decode_i64s(&body));
    }
    assert_eq!(seen, accepted);
}

#[test]
fn test_shutdown_splits_residual_rows_into_final_row_group() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("residual.parquet");
    let mut sink = file_sink(&path, 16);
    sink.start().unwrap();

    for i in 0..17i64 {
        while !sink.try_record(&i.to_le_bytes()) {
            std::thread::yield_now();
        }
    }
    sink.shutdown().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let metadata = parse_file_metadata(&bytes);
    assert_eq!(metadata.num_rows, 17);
    let sizes: Vec<i64> = metadata.row_groups.iter().map(|rg| rg.num_rows).collect();
    assert_eq!(sizes, vec![16, 1]);
}

#[test]
fn test_idle_timeout_flushes_partial_batches() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("idle.parquet");
    let mut sink = file_sink(&path, 1024);
    sink.start().unwrap();

    for i in 0..5i64 {
        assert!(sink.try_record(&i.to_le_bytes()));
    }
    // well past the 5ms idle timeout
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while sink.entries_written() < 5 {
        assert!(
            std::time::Instant::now() < deadline,
            "idle flush never happened"
        );
        std::thread::sleep(Duration::from_millis(1));
    }
    sink.shutdown().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(parse_file_metadata(&bytes).num_rows, 5);
}

#[test]
fn test_concurrent_producer_and_drainer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hot.parquet");
    let mut sink = file_sink(&path, 128);
    sink.start().unwrap();

    let sink = Arc::new(sink);
    let producer_sink = Arc::clone(&sink);
    let producer = std::thread::spawn(move || {
        let mut accepted = 0u64;
        for i in 0..50_000i64 {
            if producer_sink.try_record(&i.to_le_bytes()) {
                accepted += 1;
            }
        }
        accepted
    });
    let accepted = producer.join().unwrap();

    let mut sink = Arc::into_inner(sink).unwrap();
    sink.shutdown().unwrap();
    assert_eq!(sink.entries_written(), accepted);
    assert_eq!(accepted + sink.dropped_count(), 50_000);

    let bytes = std::fs::read(&path).unwrap();
    let metadata = parse_file_metadata(&bytes);
    assert_eq!(metadata.num_rows, accepted as i64);

    // strictly increasing sequence numbers prove producer order survived
    let mut last = -1i64;
    for row_group in &metadata.row_groups {
        let (_, body) = read_page_body(&bytes, &row_group.columns[0]);
        for v in decode_i64s(&body) {
            assert!(v > last);
            last = v;
        }
    }
}

#[test]
fn test_optional_columns_roundtrip_through_the_sink() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("optional.parquet");
    let schema = SchemaDescriptor::new(vec![
        ColumnDef::new("seq", Type::INT64, Repetition::REQUIRED),
        ColumnDef::new("qty", Type::INT32, Repetition::OPTIONAL),
    ])
    .unwrap();
    let file = std::fs::File::create(&path).unwrap();
    let writer = SerializedFileWriter::new(
        std::io::BufWriter::new(file),
        schema,
        Arc::new(WriterProperties::default()),
    )
    .unwrap();
    let props = SinkProperties::builder()
        .set_ring_capacity(64)
        .set_row_group_rows(8)
        .set_idle_timeout(Duration::from_millis(5))
        .build()
        .unwrap();
    let mut sink = LogSink::try_new(writer, props).unwrap();
    // bitmap(1) + i64(8) + i32(4)
    assert_eq!(sink.record_size(), 13);
    sink.start().unwrap();

    for i in 0..10i64 {
        let present = i % 3 != 0;
        let mut record = vec![present as u8];
        record.extend_from_slice(&i.to_le_bytes());
        record.extend_from_slice(&(i as i32 * 10).to_le_bytes());
        while !sink.try_record(&record) {
            std::thread::yield_now();
        }
    }
    sink.shutdown().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let metadata = parse_file_metadata(&bytes);
    assert_eq!(metadata.num_rows, 10);

    let mut def = Vec::new();
    let mut values = Vec::new();
    for row_group in &metadata.row_groups {
        let chunk = &row_group.columns[1];
        let (_, body) = read_page_body(&bytes, chunk);
        let (_, d, v) = split_page_body(&body, 1, row_group.num_rows as usize);
        def.extend(d);
        values.extend(decode_i32s(&v));
    }
    let expected_def: Vec<u8> = (0..10).map(|i| (i % 3 != 0) as u8).collect();
    assert_eq!(def, expected_def);
    let expected_values: Vec<i32> = (0..10).filter(|i| i % 3 != 0).map(|i| i * 10).collect();
    assert_eq!(values, expected_values);
}

/// A writer that starts failing after a byte budget, to exercise worker
/// error capture.
struct FailingWriter {
    written: usize,
    budget: usize,
}

impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.written + buf.len() > self.budget {
            return Err(std::io::Error::other("disk full"));
        }
        self.written += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_worker_error_surfaces_at_shutdown() {
    let writer = SerializedFileWriter::new(
        FailingWriter {
            written: 0,
            budget: 32,
        },
        seq_schema(),
        Arc::new(WriterProperties::default()),
    )
    .unwrap();
    let props = SinkProperties::builder()
        .set_ring_capacity(64)
        .set_row_group_rows(4)
        .set_idle_timeout(Duration::from_millis(5))
        .build()
        .unwrap();
    let mut sink = LogSink::try_new(writer, props).unwrap();
    sink.start().unwrap();

    for i in 0..8i64 {
        while !sink.try_record(&i.to_le_bytes()) {
            std::thread::yield_now();
        }
    }
    let err = sink.shutdown().expect_err("the writer ran out of budget");
    assert!(matches!(err, ParquetFlowError::External(_)));
    assert_eq!(sink.files_written(), 0);
}

#[test]
fn test_sink_writes_nothing_after_error() {
    // same failing setup, but confirm the producer path stays usable
    let writer = SerializedFileWriter::new(
        FailingWriter {
            written: 0,
            budget: 32,
        },
        seq_schema(),
        Arc::new(WriterProperties::default()),
    )
    .unwrap();
    let props = SinkProperties::builder()
        .set_ring_capacity(8)
        .set_row_group_rows(2)
        .set_idle_timeout(Duration::from_millis(5))
        .build()
        .unwrap();
    let mut sink = LogSink::try_new(writer, props).unwrap();
    sink.start().unwrap();

    let mut attempted = 0u64;
    let mut accepted = 0u64;
    for i in 0..1000i64 {
        attempted += 1;
        if sink.try_record(&i.to_le_bytes()) {
            accepted += 1;
        }
    }
    assert!(sink.shutdown().is_err());
    assert_eq!(accepted + sink.dropped_count(), attempted);
}

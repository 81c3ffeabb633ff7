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

//! Non-blocking Parquet capture for latency-sensitive producers.
//!
//! This crate writes structured binary records to Parquet files without ever
//! blocking the thread that produces them. It is built from three parts:
//!
//! * a self-contained Parquet encoder (Thrift compact metadata, PLAIN
//!   values, RLE/bit-packed levels, optional page compression) exposed as
//!   [`file::writer::SerializedFileWriter`];
//! * a wait-free single-producer/single-consumer [`ring::RingBuffer`] of
//!   fixed-size record slots;
//! * a background [`sink::LogSink`] that drains the ring, batches records
//!   into row groups, and drives the writer.
//!
//! A C ABI over both the writer and the sink lives in [`ffi`].
//!
//! # Writing a file
//!
//! ```
//! use std::sync::Arc;
//! use parquet_flow::basic::{Repetition, Type};
//! use parquet_flow::data_type::ColumnData;
//! use parquet_flow::file::properties::WriterProperties;
//! use parquet_flow::file::writer::SerializedFileWriter;
//! use parquet_flow::schema::{ColumnDef, SchemaDescriptor};
//!
//! # fn main() -> parquet_flow::errors::Result<()> {
//! let schema = SchemaDescriptor::new(vec![
//!     ColumnDef::new("ts", Type::INT64, Repetition::REQUIRED),
//! ])?;
//! let mut writer = SerializedFileWriter::new(
//!     Vec::new(),
//!     schema,
//!     Arc::new(WriterProperties::default()),
//! )?;
//! writer.write_row_group(3, &[ColumnData::Int64(&[1, 2, 3])], None)?;
//! writer.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Streaming records
//!
//! Producers call [`sink::LogSink::try_record`], which copies the record
//! into a ring slot and returns immediately; when the ring is full the
//! record is dropped and counted. A drainer thread owns all encoder state
//! and flushes row groups in the background. See the [`sink`] module docs
//! for the record layout.

#[macro_use]
pub mod errors;
pub mod basic;
pub mod thrift;

pub mod data_type;

mod util;

pub mod compression;
mod encodings;
pub mod file;
pub mod schema;

pub mod ffi;
pub mod ring;
pub mod sink;

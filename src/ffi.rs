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

//! Stable C ABI.
//!
//! Two families of functions are exported over opaque handles:
//!
//! * `pf_writer_*` drives the batch file writer: create, add columns, open,
//!   write row groups, close.
//! * `pf_sink_*` drives the streaming sink: create, start, push from the hot
//!   path, stop.
//!
//! All functions return a status code (see the `PF_STATUS_*` constants);
//! a human-readable message for the most recent failure is available from
//! `pf_writer_last_error` / `pf_sink_last_error` and stays valid until the
//! next call on the same handle. Handles must not be shared between threads,
//! except that `pf_sink_push` may be called from one producer thread
//! concurrently with the sink's internal drainer.
//!
//! Panics never cross the boundary; they are reported as `PF_STATUS_INTERNAL`.

use std::ffi::{c_char, c_void, CStr, CString};
use std::fs::File;
use std::io::BufWriter;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use crate::basic::{Compression, Repetition, Type};
use crate::data_type::{ColumnData, ColumnLevels, Int96};
use crate::errors::{ParquetFlowError, Result};
use crate::file::properties::{SinkProperties, WriterProperties};
use crate::file::writer::SerializedFileWriter;
use crate::schema::{ColumnDef, SchemaDescriptor};
use crate::sink::LogSink;

/// The call succeeded.
pub const PF_STATUS_OK: i32 = 0;
/// An argument was null, malformed, or inconsistent with the schema.
pub const PF_STATUS_INVALID_ARGUMENT: i32 = 1;
/// The operation needs an open writer.
pub const PF_STATUS_NOT_OPEN: i32 = 2;
/// An internal failure, typically I/O; details via `last_error`.
pub const PF_STATUS_INTERNAL: i32 = 3;
/// An allocation failed.
pub const PF_STATUS_OUT_OF_MEMORY: i32 = 4;

/// Column values for `pf_writer_write_row_group`.
///
/// `values_len` is in bytes. `offsets` is only read for `BYTE_ARRAY`
/// columns, where it must hold `offsets_len == value_count + 1` entries.
#[repr(C)]
pub struct PfColumnInput {
    pub values: *const c_void,
    pub values_len: u64,
    pub offsets: *const u32,
    pub offsets_len: u64,
}

/// Column values plus level streams for
/// `pf_writer_write_row_group_with_levels`.
#[repr(C)]
pub struct PfColumnInputWithLevels {
    pub values: *const c_void,
    pub values_len: u64,
    pub offsets: *const u32,
    pub offsets_len: u64,
    pub definition_levels: *const u8,
    pub definition_levels_len: u64,
    pub repetition_levels: *const u8,
    pub repetition_levels_len: u64,
}

/// Column definition for `pf_sink_create`.
#[repr(C)]
pub struct PfColumnDef {
    pub name: *const c_char,
    pub physical_type: i32,
    pub repetition: i32,
    pub type_length: i32,
}

fn status_of(e: &ParquetFlowError) -> i32 {
    match e {
        ParquetFlowError::State(_) => PF_STATUS_NOT_OPEN,
        ParquetFlowError::External(_) => PF_STATUS_INTERNAL,
        _ => PF_STATUS_INVALID_ARGUMENT,
    }
}

fn to_cstring(message: &str) -> CString {
    CString::new(message.replace('\0', " ")).unwrap_or_default()
}

unsafe fn parse_path(path: *const c_char) -> Option<PathBuf> {
    if path.is_null() {
        return None;
    }
    let path = CStr::from_ptr(path).to_str().ok()?;
    if path.is_empty() {
        return None;
    }
    Some(PathBuf::from(path))
}

/// Builds a typed slice from a raw pointer after checking alignment and that
/// the byte length divides evenly.
unsafe fn typed_slice<'a, T>(values: *const c_void, values_len: u64) -> Result<&'a [T]> {
    let size = std::mem::size_of::<T>();
    if values_len == 0 {
        return Ok(&[]);
    }
    if values.is_null() {
        return Err(input_err!("column values pointer is null"));
    }
    if values as usize % std::mem::align_of::<T>() != 0 {
        return Err(input_err!("column values pointer is misaligned"));
    }
    let values_len = values_len as usize;
    if values_len % size != 0 {
        return Err(input_err!(
            "a {} byte buffer does not hold a whole number of {} byte values",
            values_len,
            size
        ));
    }
    Ok(std::slice::from_raw_parts(values as *const T, values_len / size))
}

unsafe fn optional_levels<'a>(ptr: *const u8, len: u64) -> Result<Option<&'a [u8]>> {
    if len == 0 {
        return Ok(None);
    }
    if ptr.is_null() {
        return Err(input_err!("level pointer is null but its length is not 0"));
    }
    Ok(Some(std::slice::from_raw_parts(ptr, len as usize)))
}

/// Interprets one raw column input per the schema column's physical type.
unsafe fn column_data_from_raw<'a>(
    column: &ColumnDef,
    values: *const c_void,
    values_len: u64,
    offsets: *const u32,
    offsets_len: u64,
) -> Result<ColumnData<'a>> {
    match column.physical_type() {
        Type::BOOLEAN => {
            let bytes: &[u8] = typed_slice(values, values_len)?;
            if bytes.is_empty() {
                return Ok(ColumnData::Boolean(&[]));
            }
            if bytes.iter().any(|&b| b > 1) {
                return Err(input_err!(
                    "boolean column {} holds bytes other than 0 and 1",
                    column.name()
                ));
            }
            Ok(ColumnData::Boolean(std::slice::from_raw_parts(
                values as *const bool,
                bytes.len(),
            )))
        }
        Type::INT32 => Ok(ColumnData::Int32(typed_slice(values, values_len)?)),
        Type::INT64 => Ok(ColumnData::Int64(typed_slice(values, values_len)?)),
        Type::INT96 => Ok(ColumnData::Int96(typed_slice::<Int96>(values, values_len)?)),
        Type::FLOAT => Ok(ColumnData::Float(typed_slice(values, values_len)?)),
        Type::DOUBLE => Ok(ColumnData::Double(typed_slice(values, values_len)?)),
        Type::BYTE_ARRAY => {
            let bytes: &[u8] = typed_slice(values, values_len)?;
            if offsets.is_null() || offsets_len == 0 {
                return Err(input_err!(
                    "byte array column {} needs an offsets buffer",
                    column.name()
                ));
            }
            if offsets as usize % std::mem::align_of::<u32>() != 0 {
                return Err(input_err!("offsets pointer is misaligned"));
            }
            let offsets = std::slice::from_raw_parts(offsets, offsets_len as usize);
            Ok(ColumnData::ByteArray { bytes, offsets })
        }
        Type::FIXED_LEN_BYTE_ARRAY => Ok(ColumnData::FixedLenByteArray(typed_slice(
            values, values_len,
        )?)),
    }
}

// ----------------------------------------------------------------------
// Batch writer facade

enum WriterHandleState {
    /// Collecting columns before `pf_writer_open`.
    Building {
        path: PathBuf,
        columns: Vec<ColumnDef>,
    },
    Open(SerializedFileWriter<BufWriter<File>>),
}

/// Opaque writer handle.
pub struct PfWriter {
    compression: Compression,
    state: WriterHandleState,
    last_error: CString,
}

impl PfWriter {
    fn set_error(&mut self, e: &ParquetFlowError) -> i32 {
        self.last_error = to_cstring(&e.to_string());
        status_of(e)
    }
}

/// Creates a writer handle for `output_path`. Returns null when the path or
/// compression code is unusable.
///
/// # Safety
/// `output_path` must be a valid nul-terminated string.
#[no_mangle]
pub unsafe extern "C" fn pf_writer_create(
    output_path: *const c_char,
    compression_code: i32,
) -> *mut PfWriter {
    catch_unwind(AssertUnwindSafe(|| {
        let path = match unsafe { parse_path(output_path) } {
            Some(path) => path,
            None => return std::ptr::null_mut(),
        };
        let compression = match Compression::from_codec_code(compression_code) {
            Ok(compression) => compression,
            Err(_) => return std::ptr::null_mut(),
        };
        Box::into_raw(Box::new(PfWriter {
            compression,
            state: WriterHandleState::Building {
                path,
                columns: vec![],
            },
            last_error: CString::default(),
        }))
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Appends a column to the schema. Must be called before `pf_writer_open`.
///
/// # Safety
/// `handle` must be a live pointer from `pf_writer_create`; `name` must be a
/// valid nul-terminated string.
#[no_mangle]
pub unsafe extern "C" fn pf_writer_add_column(
    handle: *mut PfWriter,
    name: *const c_char,
    physical_type_code: i32,
    repetition_code: i32,
    type_length: u32,
) -> i32 {
    let Some(writer) = handle.as_mut() else {
        return PF_STATUS_INVALID_ARGUMENT;
    };
    catch_unwind(AssertUnwindSafe(|| {
        let result = (|| -> Result<()> {
            if name.is_null() {
                return Err(input_err!("column name is null"));
            }
            let name = unsafe { CStr::from_ptr(name) }
                .to_str()
                .map_err(|_| input_err!("column name is not valid UTF-8"))?;
            let physical_type = Type::from_code(physical_type_code)?;
            let repetition = Repetition::from_code(repetition_code)?;
            match &mut writer.state {
                WriterHandleState::Building { columns, .. } => {
                    columns.push(
                        ColumnDef::new(name, physical_type, repetition)
                            .with_type_length(type_length as i32),
                    );
                    Ok(())
                }
                WriterHandleState::Open(_) => {
                    Err(state_err!("columns cannot be added after open"))
                }
            }
        })();
        match result {
            Ok(()) => PF_STATUS_OK,
            Err(e) => writer.set_error(&e),
        }
    }))
    .unwrap_or(PF_STATUS_INTERNAL)
}

/// Validates the schema, creates the output file, and writes the opening
/// magic.
///
/// # Safety
/// `handle` must be a live pointer from `pf_writer_create`.
#[no_mangle]
pub unsafe extern "C" fn pf_writer_open(handle: *mut PfWriter) -> i32 {
    let Some(writer) = handle.as_mut() else {
        return PF_STATUS_INVALID_ARGUMENT;
    };
    catch_unwind(AssertUnwindSafe(|| {
        let (path, columns) = match &mut writer.state {
            WriterHandleState::Building { path, columns } => (path.clone(), std::mem::take(columns)),
            WriterHandleState::Open(_) => {
                return writer.set_error(&state_err!("the writer is already open"));
            }
        };
        match open_file_writer(&path, columns, writer.compression) {
            Ok(file_writer) => {
                writer.state = WriterHandleState::Open(file_writer);
                PF_STATUS_OK
            }
            Err(e) => {
                // the columns were consumed; restore an empty building state
                writer.state = WriterHandleState::Building {
                    path,
                    columns: vec![],
                };
                writer.set_error(&e)
            }
        }
    }))
    .unwrap_or(PF_STATUS_INTERNAL)
}

fn open_file_writer(
    path: &std::path::Path,
    columns: Vec<ColumnDef>,
    compression: Compression,
) -> Result<SerializedFileWriter<BufWriter<File>>> {
    let schema = SchemaDescriptor::new(columns)?;
    let props = Arc::new(
        WriterProperties::builder()
            .set_compression(compression)
            .build(),
    );
    let file = File::create(path)?;
    SerializedFileWriter::new(BufWriter::new(file), schema, props)
}

fn write_row_group_impl(
    writer: &mut PfWriter,
    row_count: u64,
    column_count: u32,
    build: impl Fn(&SchemaDescriptor, usize) -> Result<(ColumnData<'static>, ColumnLevels<'static>)>,
) -> i32 {
    let result = (|| -> Result<()> {
        let file_writer = match &mut writer.state {
            WriterHandleState::Open(file_writer) => file_writer,
            WriterHandleState::Building { .. } => {
                return Err(state_err!("the writer is not open"));
            }
        };
        let schema = Arc::clone(file_writer.schema_descr());
        if column_count as usize != schema.num_columns() {
            return Err(input_err!(
                "expected {} columns, got {}",
                schema.num_columns(),
                column_count
            ));
        }
        let mut columns = Vec::with_capacity(schema.num_columns());
        let mut levels = Vec::with_capacity(schema.num_columns());
        for i in 0..schema.num_columns() {
            let (data, level) = build(&schema, i)?;
            columns.push(data);
            levels.push(level);
        }
        file_writer.write_row_group(row_count as usize, &columns, Some(&levels))
    })();
    match result {
        Ok(()) => PF_STATUS_OK,
        Err(e) => writer.set_error(&e),
    }
}

/// Writes one row group of `REQUIRED` columns.
///
/// # Safety
/// `handle` must be a live pointer from `pf_writer_create`;
/// `column_inputs` must point to `column_count` valid inputs whose buffers
/// outlive the call.
#[no_mangle]
pub unsafe extern "C" fn pf_writer_write_row_group(
    handle: *mut PfWriter,
    row_count: u64,
    column_inputs: *const PfColumnInput,
    column_count: u32,
) -> i32 {
    let Some(writer) = handle.as_mut() else {
        return PF_STATUS_INVALID_ARGUMENT;
    };
    if column_inputs.is_null() && column_count != 0 {
        return writer.set_error(&input_err!("column inputs pointer is null"));
    }
    catch_unwind(AssertUnwindSafe(|| {
        let inputs: &[_] = if column_inputs.is_null() {
            &[]
        } else {
            unsafe { std::slice::from_raw_parts(column_inputs, column_count as usize) }
        };
        write_row_group_impl(writer, row_count, column_count, |schema, i| {
            let input = &inputs[i];
            let data = unsafe {
                column_data_from_raw(
                    schema.column(i),
                    input.values,
                    input.values_len,
                    input.offsets,
                    input.offsets_len,
                )
            }?;
            Ok((data, ColumnLevels::none()))
        })
    }))
    .unwrap_or(PF_STATUS_INTERNAL)
}

/// Writes one row group with explicit definition/repetition levels.
///
/// # Safety
/// As for `pf_writer_write_row_group`, with the level buffers also required
/// to outlive the call.
#[no_mangle]
pub unsafe extern "C" fn pf_writer_write_row_group_with_levels(
    handle: *mut PfWriter,
    row_count: u64,
    column_inputs: *const PfColumnInputWithLevels,
    column_count: u32,
) -> i32 {
    let Some(writer) = handle.as_mut() else {
        return PF_STATUS_INVALID_ARGUMENT;
    };
    if column_inputs.is_null() && column_count != 0 {
        return writer.set_error(&input_err!("column inputs pointer is null"));
    }
    catch_unwind(AssertUnwindSafe(|| {
        let inputs: &[_] = if column_inputs.is_null() {
            &[]
        } else {
            unsafe { std::slice::from_raw_parts(column_inputs, column_count as usize) }
        };
        write_row_group_impl(writer, row_count, column_count, |schema, i| {
            let input = &inputs[i];
            let data = unsafe {
                column_data_from_raw(
                    schema.column(i),
                    input.values,
                    input.values_len,
                    input.offsets,
                    input.offsets_len,
                )
            }?;
            let levels = unsafe {
                ColumnLevels {
                    def_levels: optional_levels(
                        input.definition_levels,
                        input.definition_levels_len,
                    )?,
                    rep_levels: optional_levels(
                        input.repetition_levels,
                        input.repetition_levels_len,
                    )?,
                }
            };
            Ok((data, levels))
        })
    }))
    .unwrap_or(PF_STATUS_INTERNAL)
}

/// Writes the footer and closes the file. Idempotent once open.
///
/// # Safety
/// `handle` must be a live pointer from `pf_writer_create`.
#[no_mangle]
pub unsafe extern "C" fn pf_writer_close(handle: *mut PfWriter) -> i32 {
    let Some(writer) = handle.as_mut() else {
        return PF_STATUS_INVALID_ARGUMENT;
    };
    catch_unwind(AssertUnwindSafe(|| {
        let file_writer = match &mut writer.state {
            WriterHandleState::Open(file_writer) => file_writer,
            WriterHandleState::Building { .. } => {
                return writer.set_error(&state_err!("the writer is not open"));
            }
        };
        match file_writer.finish() {
            Ok(()) => PF_STATUS_OK,
            Err(e) => writer.set_error(&e),
        }
    }))
    .unwrap_or(PF_STATUS_INTERNAL)
}

/// Frees a writer handle. Null is a no-op. An open, unclosed file is left
/// without a footer.
///
/// # Safety
/// `handle` must be null or a live pointer from `pf_writer_create`, and must
/// not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn pf_writer_destroy(handle: *mut PfWriter) {
    if !handle.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| drop(unsafe { Box::from_raw(handle) })));
    }
}

/// Returns the message for the most recent failure on this handle. The
/// pointer stays valid until the next call on the handle.
///
/// # Safety
/// `handle` must be null or a live pointer from `pf_writer_create`.
#[no_mangle]
pub unsafe extern "C" fn pf_writer_last_error(handle: *const PfWriter) -> *const c_char {
    match handle.as_ref() {
        Some(writer) => writer.last_error.as_ptr(),
        None => std::ptr::null(),
    }
}

// ----------------------------------------------------------------------
// Streaming sink facade

/// Opaque sink handle.
pub struct PfSink {
    sink: LogSink<BufWriter<File>>,
    last_error: CString,
}

impl PfSink {
    fn set_error(&mut self, e: &ParquetFlowError) -> i32 {
        self.last_error = to_cstring(&e.to_string());
        status_of(e)
    }
}

unsafe fn sink_schema(columns: *const PfColumnDef, num_columns: u32) -> Result<SchemaDescriptor> {
    if columns.is_null() || num_columns == 0 {
        return Err(schema_err!("a sink needs at least one column"));
    }
    let defs = std::slice::from_raw_parts(columns, num_columns as usize);
    let mut out = Vec::with_capacity(defs.len());
    for def in defs {
        if def.name.is_null() {
            return Err(schema_err!("column name is null"));
        }
        let name = CStr::from_ptr(def.name)
            .to_str()
            .map_err(|_| schema_err!("column name is not valid UTF-8"))?;
        out.push(
            ColumnDef::new(
                name,
                Type::from_code(def.physical_type)?,
                Repetition::from_code(def.repetition)?,
            )
            .with_type_length(def.type_length),
        );
    }
    SchemaDescriptor::new(out)
}

/// Creates a streaming sink writing to `output_path`.
///
/// `row_size` must equal the record size the schema implies (pass 0 to skip
/// the check). `ring_capacity` and `row_group_rows` of 0 select the
/// defaults. Returns null on any failure.
///
/// # Safety
/// `output_path` must be a valid nul-terminated string and `columns` must
/// point to `num_columns` valid definitions.
#[no_mangle]
pub unsafe extern "C" fn pf_sink_create(
    output_path: *const c_char,
    columns: *const PfColumnDef,
    num_columns: u32,
    row_size: u32,
    compression_code: i32,
    ring_capacity: u64,
    row_group_rows: u64,
) -> *mut PfSink {
    catch_unwind(AssertUnwindSafe(|| {
        let Some(path) = (unsafe { parse_path(output_path) }) else {
            return std::ptr::null_mut();
        };
        let sink = (|| -> Result<LogSink<BufWriter<File>>> {
            let schema = unsafe { sink_schema(columns, num_columns) }?;
            let compression = Compression::from_codec_code(compression_code)?;
            let props = Arc::new(
                WriterProperties::builder()
                    .set_compression(compression)
                    .build(),
            );
            let mut sink_props = SinkProperties::builder();
            if ring_capacity != 0 {
                sink_props = sink_props.set_ring_capacity(ring_capacity as usize);
            }
            if row_group_rows != 0 {
                sink_props = sink_props.set_row_group_rows(row_group_rows as usize);
            }
            let file = File::create(&path)?;
            let writer = SerializedFileWriter::new(BufWriter::new(file), schema, props)?;
            let sink = LogSink::try_new(writer, sink_props.build()?)?;
            if row_size != 0 && sink.record_size() != row_size as usize {
                return Err(config_err!(
                    "the schema implies {} byte records, caller declared {}",
                    sink.record_size(),
                    row_size
                ));
            }
            Ok(sink)
        })();
        match sink {
            Ok(sink) => Box::into_raw(Box::new(PfSink {
                sink,
                last_error: CString::default(),
            })),
            Err(_) => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Spawns the drainer thread.
///
/// # Safety
/// `handle` must be a live pointer from `pf_sink_create`.
#[no_mangle]
pub unsafe extern "C" fn pf_sink_start(handle: *mut PfSink) -> i32 {
    let Some(sink) = handle.as_mut() else {
        return PF_STATUS_INVALID_ARGUMENT;
    };
    catch_unwind(AssertUnwindSafe(|| match sink.sink.start() {
        Ok(()) => PF_STATUS_OK,
        Err(e) => sink.set_error(&e),
    }))
    .unwrap_or(PF_STATUS_INTERNAL)
}

/// Enqueues one record without blocking. Returns `PF_STATUS_OK` when the
/// record was accepted and `PF_STATUS_INVALID_ARGUMENT` when it was dropped
/// (wrong size, sink not running, or ring full); drops are counted either
/// way.
///
/// Safe to call from a single producer thread concurrently with the
/// drainer.
///
/// # Safety
/// `handle` must be a live pointer from `pf_sink_create` and `record` must
/// point to `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn pf_sink_push(
    handle: *const PfSink,
    record: *const c_void,
    len: u32,
) -> i32 {
    let Some(sink) = handle.as_ref() else {
        return PF_STATUS_INVALID_ARGUMENT;
    };
    if record.is_null() {
        return PF_STATUS_INVALID_ARGUMENT;
    }
    let payload = std::slice::from_raw_parts(record as *const u8, len as usize);
    if sink.sink.try_record(payload) {
        PF_STATUS_OK
    } else {
        PF_STATUS_INVALID_ARGUMENT
    }
}

/// Stops the sink: drains the ring, flushes residual rows, writes the
/// footer, and joins the drainer. Returns the first worker error, if any.
///
/// # Safety
/// `handle` must be a live pointer from `pf_sink_create`.
#[no_mangle]
pub unsafe extern "C" fn pf_sink_stop(handle: *mut PfSink) -> i32 {
    let Some(sink) = handle.as_mut() else {
        return PF_STATUS_INVALID_ARGUMENT;
    };
    catch_unwind(AssertUnwindSafe(|| match sink.sink.shutdown() {
        Ok(()) => PF_STATUS_OK,
        Err(e) => sink.set_error(&e),
    }))
    .unwrap_or(PF_STATUS_INTERNAL)
}

/// Frees a sink handle, stopping it first if needed. Null is a no-op.
///
/// # Safety
/// `handle` must be null or a live pointer from `pf_sink_create`, and must
/// not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn pf_sink_destroy(handle: *mut PfSink) {
    if !handle.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            let mut sink = unsafe { Box::from_raw(handle) };
            let _ = sink.sink.shutdown();
        }));
    }
}

/// Number of completely written files (0 or 1). Null handles report 0.
///
/// # Safety
/// `handle` must be null or a live pointer from `pf_sink_create`.
#[no_mangle]
pub unsafe extern "C" fn pf_sink_files_written(handle: *const PfSink) -> i64 {
    handle
        .as_ref()
        .map_or(0, |sink| sink.sink.files_written() as i64)
}

/// Number of records flushed into row groups. Null handles report 0.
///
/// # Safety
/// `handle` must be null or a live pointer from `pf_sink_create`.
#[no_mangle]
pub unsafe extern "C" fn pf_sink_entries_written(handle: *const PfSink) -> i64 {
    handle
        .as_ref()
        .map_or(0, |sink| sink.sink.entries_written() as i64)
}

/// Number of dropped records. Null handles report 0.
///
/// # Safety
/// `handle` must be null or a live pointer from `pf_sink_create`.
#[no_mangle]
pub unsafe extern "C" fn pf_sink_dropped(handle: *const PfSink) -> i64 {
    handle
        .as_ref()
        .map_or(0, |sink| sink.sink.dropped_count() as i64)
}

/// Returns the message for the most recent failure on this handle.
///
/// # Safety
/// `handle` must be null or a live pointer from `pf_sink_create`.
#[no_mangle]
pub unsafe extern "C" fn pf_sink_last_error(handle: *const PfSink) -> *const c_char {
    match handle.as_ref() {
        Some(sink) => sink.last_error.as_ptr(),
        None => std::ptr::null(),
    }
}

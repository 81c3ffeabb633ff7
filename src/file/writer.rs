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

//! Streaming file writer.
//!
//! [`SerializedFileWriter`] drives the whole encoding pipeline: level
//! encoding, PLAIN value encoding, page compression, page headers, and the
//! footer. Row groups are written strictly sequentially, one data page per
//! column chunk.

use std::io::Write;
use std::sync::Arc;

use crate::basic::{Encoding, PageType, Repetition};
use crate::compression::{create_codec, Codec};
use crate::data_type::{check_type, ColumnData, ColumnLevels, LevelInfo};
use crate::encodings::levels::LevelEncoder;
use crate::errors::Result;
use crate::file::metadata::{
    schema_elements, ColumnChunk, ColumnChunkMetaData, ColumnMetaData, DataPageHeader,
    FileMetaData, PageHeader, RowGroup, RowGroupMetaData,
};
use crate::file::properties::WriterPropertiesPtr;
use crate::file::PARQUET_MAGIC;
use crate::schema::SchemaDescriptor;
use crate::thrift::{ThriftCompactOutputProtocol, WriteThrift};

/// A wrapper around a [`Write`] that keeps track of the number of bytes that
/// have been written.
pub struct TrackedWrite<W> {
    inner: W,
    bytes_written: usize,
}

impl<W: Write> TrackedWrite<W> {
    /// Create a new [`TrackedWrite`] from a [`Write`].
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            bytes_written: 0,
        }
    }

    /// Returns the number of bytes written to this instance.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for TrackedWrite<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let bytes = self.inner.write(buf)?;
        self.bytes_written += bytes;
        Ok(bytes)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Per-column state computed during validation, before any byte is emitted.
struct ValidatedColumn {
    info: LevelInfo,
}

/// Parquet file writer.
///
/// The workflow is:
/// - create the writer, which writes the opening magic;
/// - call [`write_row_group`](Self::write_row_group) once per batch of rows;
/// - call [`close`](Self::close) (or [`finish`](Self::finish)) to write the
///   footer.
///
/// Row-group inputs are validated in full before the first byte of the row
/// group is emitted, so a rejected call leaves the output untouched.
pub struct SerializedFileWriter<W: Write> {
    buf: TrackedWrite<W>,
    schema: Arc<SchemaDescriptor>,
    props: WriterPropertiesPtr,
    codec: Option<Box<dyn Codec>>,
    row_groups: Vec<RowGroupMetaData>,
    finished: bool,
    // scratch reused across row groups
    page_buf: Vec<u8>,
    compressed_buf: Vec<u8>,
    header_buf: Vec<u8>,
}

impl<W: Write> SerializedFileWriter<W> {
    /// Creates a new file writer and writes the opening magic bytes.
    pub fn new(writer: W, schema: SchemaDescriptor, props: WriterPropertiesPtr) -> Result<Self> {
        let codec = create_codec(props.compression())?;
        let mut buf = TrackedWrite::new(writer);
        buf.write_all(&PARQUET_MAGIC)?;
        Ok(Self {
            buf,
            schema: Arc::new(schema),
            props,
            codec,
            row_groups: vec![],
            finished: false,
            page_buf: vec![],
            compressed_buf: vec![],
            header_buf: vec![],
        })
    }

    /// The writer's schema.
    pub fn schema_descr(&self) -> &Arc<SchemaDescriptor> {
        &self.schema
    }

    /// Total bytes written to the underlying sink so far.
    pub fn bytes_written(&self) -> usize {
        self.buf.bytes_written()
    }

    /// Metadata for the row groups flushed so far.
    pub fn flushed_row_groups(&self) -> &[RowGroupMetaData] {
        &self.row_groups
    }

    /// Total rows across all flushed row groups.
    pub fn total_rows(&self) -> i64 {
        self.row_groups.iter().map(|rg| rg.num_rows).sum()
    }

    /// Writes one row group: one data page per column, in schema order.
    ///
    /// `levels` may be omitted entirely for schemas whose columns are all
    /// `REQUIRED`; otherwise it must carry one entry per column. A call with
    /// `num_rows == 0` is a no-op and never emits an empty row group.
    pub fn write_row_group(
        &mut self,
        num_rows: usize,
        columns: &[ColumnData<'_>],
        levels: Option<&[ColumnLevels<'_>]>,
    ) -> Result<()> {
        if self.finished {
            return Err(state_err!("cannot write a row group to a closed file"));
        }
        if num_rows == 0 {
            return Ok(());
        }
        let validated = self.validate_row_group(num_rows, columns, levels)?;

        // validation passed for every column, start emitting
        let mut chunks = Vec::with_capacity(columns.len());
        for (i, (data, validated)) in columns.iter().zip(&validated).enumerate() {
            let column_levels = levels.map(|l| l[i]).unwrap_or_default();
            let chunk = self.write_column_chunk(i, data, &column_levels, validated)?;
            chunks.push(chunk);
        }

        let total_byte_size = chunks.iter().map(|c| c.total_compressed_size).sum();
        self.row_groups.push(RowGroupMetaData {
            columns: chunks,
            total_byte_size,
            num_rows: num_rows as i64,
        });
        Ok(())
    }

    /// Checks every column's shape, type, and levels. Nothing is written to
    /// the sink until this returns `Ok` for the whole row group.
    fn validate_row_group(
        &self,
        num_rows: usize,
        columns: &[ColumnData<'_>],
        levels: Option<&[ColumnLevels<'_>]>,
    ) -> Result<Vec<ValidatedColumn>> {
        if num_rows > i32::MAX as usize {
            return Err(input_err!(
                "row groups are limited to {} rows, got {}",
                i32::MAX,
                num_rows
            ));
        }
        if columns.len() != self.schema.num_columns() {
            return Err(input_err!(
                "expected {} columns, got {}",
                self.schema.num_columns(),
                columns.len()
            ));
        }
        if let Some(levels) = levels {
            if levels.len() != columns.len() {
                return Err(input_err!(
                    "expected levels for {} columns, got {}",
                    columns.len(),
                    levels.len()
                ));
            }
        }

        let mut validated = Vec::with_capacity(columns.len());
        for (i, data) in columns.iter().enumerate() {
            let column = self.schema.column(i);
            check_type(data, column.physical_type(), column.name())?;
            let column_levels = levels.map(|l| l[i]).unwrap_or_default();
            let info = column_levels.validate(column.repetition(), num_rows)?;
            let value_count = data.value_count(column.type_length())?;
            if value_count != info.num_present_values {
                return Err(input_err!(
                    "column {} holds {} values but its levels describe {}",
                    column.name(),
                    value_count,
                    info.num_present_values
                ));
            }
            validated.push(ValidatedColumn { info });
        }
        Ok(validated)
    }

    /// Encodes and writes a single column chunk, returning its metadata.
    fn write_column_chunk(
        &mut self,
        column_index: usize,
        data: &ColumnData<'_>,
        levels: &ColumnLevels<'_>,
        validated: &ValidatedColumn,
    ) -> Result<ColumnChunkMetaData> {
        let column = self.schema.column(column_index);
        let num_entries = validated.info.num_level_entries;

        self.page_buf.clear();
        if column.repetition() == Repetition::REPEATED {
            let mut encoder = LevelEncoder::v1(1, num_entries);
            encoder.put(levels.rep_levels.unwrap_or_default());
            self.page_buf.extend_from_slice(&encoder.consume());
        }
        if column.repetition() != Repetition::REQUIRED {
            let mut encoder = LevelEncoder::v1(1, num_entries);
            encoder.put(levels.def_levels.unwrap_or_default());
            self.page_buf.extend_from_slice(&encoder.consume());
        }
        data.encode_plain(&mut self.page_buf);

        let uncompressed_size = self.page_buf.len();
        if uncompressed_size > i32::MAX as usize {
            return Err(too_large_err!(
                "page of {} bytes exceeds the format's page size limit",
                uncompressed_size
            ));
        }
        let payload: &[u8] = match self.codec.as_mut() {
            Some(codec) => {
                self.compressed_buf.clear();
                codec.compress(&self.page_buf, &mut self.compressed_buf)?;
                &self.compressed_buf
            }
            None => &self.page_buf,
        };
        if payload.len() > i32::MAX as usize {
            return Err(too_large_err!(
                "compressed page of {} bytes exceeds the format's page size limit",
                payload.len()
            ));
        }

        let header = PageHeader {
            type_: PageType::DATA_PAGE,
            uncompressed_page_size: uncompressed_size as i32,
            compressed_page_size: payload.len() as i32,
            data_page_header: DataPageHeader {
                num_values: num_entries as i32,
                encoding: Encoding::PLAIN,
                definition_level_encoding: Encoding::RLE,
                repetition_level_encoding: Encoding::RLE,
            },
        };
        self.header_buf.clear();
        {
            let mut protocol = ThriftCompactOutputProtocol::new(&mut self.header_buf);
            header.write_thrift(&mut protocol)?;
        }

        let chunk_start = self.buf.bytes_written() as i64;
        self.buf.write_all(&self.header_buf)?;
        self.buf.write_all(payload)?;

        let header_size = self.header_buf.len() as i64;
        Ok(ColumnChunkMetaData {
            column_index,
            data_page_offset: chunk_start,
            total_compressed_size: header_size + payload.len() as i64,
            total_uncompressed_size: header_size + uncompressed_size as i64,
            num_values: num_entries as i64,
        })
    }

    /// Writes the footer and flushes the sink. Idempotent: subsequent calls
    /// are no-ops.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }

        let row_groups = self
            .row_groups
            .iter()
            .map(|rg| RowGroup {
                columns: rg
                    .columns
                    .iter()
                    .map(|c| ColumnChunk {
                        file_offset: c.data_page_offset,
                        meta_data: ColumnMetaData {
                            type_: self.schema.column(c.column_index).physical_type(),
                            encodings: vec![Encoding::PLAIN, Encoding::RLE],
                            path_in_schema: vec![self.schema.column(c.column_index).name()],
                            codec: self.props.compression(),
                            num_values: c.num_values,
                            total_uncompressed_size: c.total_uncompressed_size,
                            total_compressed_size: c.total_compressed_size,
                            data_page_offset: c.data_page_offset,
                        },
                    })
                    .collect(),
                total_byte_size: rg.total_byte_size,
                num_rows: rg.num_rows,
            })
            .collect();

        let metadata = FileMetaData {
            version: 1,
            schema: schema_elements(&self.schema),
            num_rows: self.total_rows(),
            row_groups,
            created_by: Some(self.props.created_by()),
        };

        let start_pos = self.buf.bytes_written();
        {
            let mut protocol = ThriftCompactOutputProtocol::new(&mut self.buf);
            metadata.write_thrift(&mut protocol)?;
        }
        let metadata_len = self.buf.bytes_written() - start_pos;
        if metadata_len > u32::MAX as usize {
            return Err(too_large_err!(
                "file metadata of {} bytes exceeds the footer length field",
                metadata_len
            ));
        }

        self.buf.write_all(&(metadata_len as u32).to_le_bytes())?;
        self.buf.write_all(&PARQUET_MAGIC)?;
        self.buf.flush()?;
        self.finished = true;
        Ok(())
    }

    /// Finishes the file and consumes the writer.
    pub fn close(mut self) -> Result<()> {
        self.finish()
    }

    /// Consumes the writer, returning the underlying sink. The footer must
    /// already have been written.
    pub fn into_inner(self) -> Result<W> {
        if !self.finished {
            return Err(state_err!("the file footer has not been written"));
        }
        Ok(self.buf.into_inner())
    }
}

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

//! Splits fixed-size binary records into per-column batch buffers.
//!
//! # Record layout
//!
//! A record is a fixed-size little-endian image of one row:
//!
//! ```text
//! [null bitmap][field 0][field 1]...[field N-1]
//! ```
//!
//! The bitmap holds one bit per `OPTIONAL` column in schema order, LSB
//! first; a set bit means the value is present. `REQUIRED` columns have no
//! bitmap bit. Field widths are fixed per physical type; `BYTE_ARRAY`
//! fields are a 4-byte length followed by `type_length` reserved bytes, of
//! which the first `length` are meaningful.
//!
//! The accumulator is owned exclusively by the drainer thread; producers
//! never touch it.

use crate::basic::{Repetition, Type};
use crate::data_type::{ColumnData, ColumnLevels, Int96};
use crate::errors::Result;
use crate::schema::SchemaDescriptor;
use crate::util::bit_util::ceil;

/// Placement of one column's field inside a record.
#[derive(Debug, Clone)]
struct FieldLayout {
    /// Byte offset of the field, bitmap included.
    offset: usize,
    /// Bytes the field occupies in the record.
    width: usize,
    /// Bit position in the null bitmap for `OPTIONAL` columns.
    nullable_index: Option<usize>,
}

/// Byte layout of the fixed-size records a schema implies.
#[derive(Debug, Clone)]
pub struct RecordLayout {
    fields: Vec<FieldLayout>,
    record_size: usize,
}

impl RecordLayout {
    /// Computes the layout for `schema`.
    ///
    /// Streaming records cannot express repetition, so `REPEATED` columns
    /// are rejected, as are `BYTE_ARRAY` columns without a declared maximum
    /// width in `type_length`.
    pub fn try_new(schema: &SchemaDescriptor) -> Result<Self> {
        let nullable_count = schema
            .columns()
            .iter()
            .filter(|c| c.repetition() == Repetition::OPTIONAL)
            .count();
        let bitmap_len = ceil(nullable_count, 8);

        let mut fields = Vec::with_capacity(schema.num_columns());
        let mut offset = bitmap_len;
        let mut nullable_index = 0;
        for column in schema.columns() {
            let width = match column.physical_type() {
                Type::BOOLEAN => 1,
                Type::INT32 | Type::FLOAT => 4,
                Type::INT64 | Type::DOUBLE => 8,
                Type::INT96 => 12,
                Type::FIXED_LEN_BYTE_ARRAY => column.type_length() as usize,
                Type::BYTE_ARRAY => {
                    if column.type_length() <= 0 {
                        return Err(schema_err!(
                            "streaming column {} is BYTE_ARRAY and needs a maximum width in type_length",
                            column.name()
                        ));
                    }
                    4 + column.type_length() as usize
                }
            };
            let index = match column.repetition() {
                Repetition::REQUIRED => None,
                Repetition::OPTIONAL => {
                    let index = nullable_index;
                    nullable_index += 1;
                    Some(index)
                }
                Repetition::REPEATED => {
                    return Err(schema_err!(
                        "streaming column {} is REPEATED, which fixed-size records cannot express",
                        column.name()
                    ));
                }
            };
            fields.push(FieldLayout {
                offset,
                width,
                nullable_index: index,
            });
            offset += width;
        }
        Ok(Self {
            fields,
            record_size: offset,
        })
    }

    /// Total record size in bytes, bitmap included.
    pub fn record_size(&self) -> usize {
        self.record_size
    }
}

/// Owned, growable buffers for one column's accumulated values.
enum ColumnBuffer {
    Boolean(Vec<bool>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Int96(Vec<Int96>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    ByteArray { bytes: Vec<u8>, offsets: Vec<u32> },
    FixedLenByteArray(Vec<u8>),
}

impl ColumnBuffer {
    fn for_type(physical_type: Type) -> Self {
        match physical_type {
            Type::BOOLEAN => ColumnBuffer::Boolean(vec![]),
            Type::INT32 => ColumnBuffer::Int32(vec![]),
            Type::INT64 => ColumnBuffer::Int64(vec![]),
            Type::INT96 => ColumnBuffer::Int96(vec![]),
            Type::FLOAT => ColumnBuffer::Float(vec![]),
            Type::DOUBLE => ColumnBuffer::Double(vec![]),
            Type::BYTE_ARRAY => ColumnBuffer::ByteArray {
                bytes: vec![],
                offsets: vec![0],
            },
            Type::FIXED_LEN_BYTE_ARRAY => ColumnBuffer::FixedLenByteArray(vec![]),
        }
    }

    /// Decodes one field image and appends the value.
    fn push_field(&mut self, field: &[u8]) -> Result<()> {
        match self {
            ColumnBuffer::Boolean(values) => values.push(field[0] != 0),
            ColumnBuffer::Int32(values) => {
                values.push(i32::from_le_bytes(field.try_into().unwrap()))
            }
            ColumnBuffer::Int64(values) => {
                values.push(i64::from_le_bytes(field.try_into().unwrap()))
            }
            ColumnBuffer::Int96(values) => {
                let mut words = [0u32; 3];
                for (word, chunk) in words.iter_mut().zip(field.chunks_exact(4)) {
                    *word = u32::from_le_bytes(chunk.try_into().unwrap());
                }
                values.push(words);
            }
            ColumnBuffer::Float(values) => {
                values.push(f32::from_le_bytes(field.try_into().unwrap()))
            }
            ColumnBuffer::Double(values) => {
                values.push(f64::from_le_bytes(field.try_into().unwrap()))
            }
            ColumnBuffer::ByteArray { bytes, offsets } => {
                let len = u32::from_le_bytes(field[..4].try_into().unwrap()) as usize;
                if len > field.len() - 4 {
                    return Err(input_err!(
                        "record declares a {} byte string in a {} byte field",
                        len,
                        field.len() - 4
                    ));
                }
                bytes.extend_from_slice(&field[4..4 + len]);
                offsets.push(bytes.len() as u32);
            }
            ColumnBuffer::FixedLenByteArray(bytes) => bytes.extend_from_slice(field),
        }
        Ok(())
    }

    fn as_column_data(&self) -> ColumnData<'_> {
        match self {
            ColumnBuffer::Boolean(values) => ColumnData::Boolean(values),
            ColumnBuffer::Int32(values) => ColumnData::Int32(values),
            ColumnBuffer::Int64(values) => ColumnData::Int64(values),
            ColumnBuffer::Int96(values) => ColumnData::Int96(values),
            ColumnBuffer::Float(values) => ColumnData::Float(values),
            ColumnBuffer::Double(values) => ColumnData::Double(values),
            ColumnBuffer::ByteArray { bytes, offsets } => ColumnData::ByteArray {
                bytes,
                offsets,
            },
            ColumnBuffer::FixedLenByteArray(bytes) => ColumnData::FixedLenByteArray(bytes),
        }
    }

    fn clear(&mut self) {
        match self {
            ColumnBuffer::Boolean(values) => values.clear(),
            ColumnBuffer::Int32(values) => values.clear(),
            ColumnBuffer::Int64(values) => values.clear(),
            ColumnBuffer::Int96(values) => values.clear(),
            ColumnBuffer::Float(values) => values.clear(),
            ColumnBuffer::Double(values) => values.clear(),
            ColumnBuffer::ByteArray { bytes, offsets } => {
                bytes.clear();
                offsets.clear();
                offsets.push(0);
            }
            ColumnBuffer::FixedLenByteArray(bytes) => bytes.clear(),
        }
    }
}

/// Accumulates drained records into per-column buffers until a row group is
/// flushed.
pub struct BatchAccumulator {
    layout: RecordLayout,
    columns: Vec<ColumnState>,
    has_optional: bool,
    row_count: usize,
}

struct ColumnState {
    buffer: ColumnBuffer,
    def_levels: Vec<u8>,
}

impl BatchAccumulator {
    pub fn try_new(schema: &SchemaDescriptor) -> Result<Self> {
        let layout = RecordLayout::try_new(schema)?;
        let columns = schema
            .columns()
            .iter()
            .map(|c| ColumnState {
                buffer: ColumnBuffer::for_type(c.physical_type()),
                def_levels: vec![],
            })
            .collect();
        let has_optional = schema
            .columns()
            .iter()
            .any(|c| c.repetition() == Repetition::OPTIONAL);
        Ok(Self {
            layout,
            columns,
            has_optional,
            row_count: 0,
        })
    }

    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Splits one record into the per-column buffers.
    pub fn append(&mut self, record: &[u8]) -> Result<()> {
        if record.len() != self.layout.record_size {
            return Err(input_err!(
                "expected a {} byte record, got {}",
                self.layout.record_size,
                record.len()
            ));
        }
        for (field, column) in self.layout.fields.iter().zip(self.columns.iter_mut()) {
            if let Some(bit) = field.nullable_index {
                let present = record[bit / 8] >> (bit % 8) & 1;
                column.def_levels.push(present);
                if present == 0 {
                    continue;
                }
            }
            column
                .buffer
                .push_field(&record[field.offset..field.offset + field.width])?;
        }
        self.row_count += 1;
        Ok(())
    }

    /// Borrows the accumulated buffers in the shape the writer takes.
    pub fn batch(&self) -> (Vec<ColumnData<'_>>, Option<Vec<ColumnLevels<'_>>>) {
        let columns = self
            .columns
            .iter()
            .map(|c| c.buffer.as_column_data())
            .collect();
        let levels = self.has_optional.then(|| {
            self.columns
                .iter()
                .map(|c| {
                    if c.def_levels.is_empty() {
                        ColumnLevels::none()
                    } else {
                        ColumnLevels::optional(&c.def_levels)
                    }
                })
                .collect()
        });
        (columns, levels)
    }

    /// Clears all buffers, retaining their capacity.
    pub fn reset(&mut self) {
        for column in &mut self.columns {
            column.buffer.clear();
            column.def_levels.clear();
        }
        self.row_count = 0;
    }
}

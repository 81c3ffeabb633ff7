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

//! Column value buffers and their PLAIN encodings.

use crate::basic::{Repetition, Type};
use crate::errors::Result;
use crate::util::bit_util::BitWriter;

/// An INT96 value: three little-endian 32-bit words, 12 bytes on the wire.
pub type Int96 = [u32; 3];

/// Borrowed value buffer for one column of a row group.
///
/// The variant must match the column's physical type; the writer checks this
/// before touching the sink. Buffers are dense: they contain only the values
/// that are actually present (nulls are described by the definition levels,
/// not by slots in the buffer).
#[derive(Debug, Clone, Copy)]
pub enum ColumnData<'a> {
    Boolean(&'a [bool]),
    Int32(&'a [i32]),
    Int64(&'a [i64]),
    Int96(&'a [Int96]),
    Float(&'a [f32]),
    Double(&'a [f64]),
    /// Variable-length byte strings: `offsets` has one more entry than there
    /// are values, starts at 0, is non-decreasing, and ends at `bytes.len()`.
    ByteArray {
        bytes: &'a [u8],
        offsets: &'a [u32],
    },
    /// Concatenated fixed-width values; the width comes from the schema.
    FixedLenByteArray(&'a [u8]),
}

impl ColumnData<'_> {
    /// The physical type this buffer carries.
    pub fn physical_type(&self) -> Type {
        match self {
            ColumnData::Boolean(_) => Type::BOOLEAN,
            ColumnData::Int32(_) => Type::INT32,
            ColumnData::Int64(_) => Type::INT64,
            ColumnData::Int96(_) => Type::INT96,
            ColumnData::Float(_) => Type::FLOAT,
            ColumnData::Double(_) => Type::DOUBLE,
            ColumnData::ByteArray { .. } => Type::BYTE_ARRAY,
            ColumnData::FixedLenByteArray(_) => Type::FIXED_LEN_BYTE_ARRAY,
        }
    }

    /// Validates the buffer's internal shape and returns the number of
    /// values it holds. `type_length` is the schema's fixed width, used only
    /// by `FIXED_LEN_BYTE_ARRAY`.
    pub fn value_count(&self, type_length: i32) -> Result<usize> {
        match self {
            ColumnData::Boolean(v) => Ok(v.len()),
            ColumnData::Int32(v) => Ok(v.len()),
            ColumnData::Int64(v) => Ok(v.len()),
            ColumnData::Int96(v) => Ok(v.len()),
            ColumnData::Float(v) => Ok(v.len()),
            ColumnData::Double(v) => Ok(v.len()),
            ColumnData::ByteArray { bytes, offsets } => {
                if offsets.is_empty() {
                    return Err(input_err!("byte array offsets must not be empty"));
                }
                if offsets[0] != 0 {
                    return Err(input_err!("byte array offsets must start at 0"));
                }
                if offsets.windows(2).any(|w| w[0] > w[1]) {
                    return Err(input_err!("byte array offsets must be non-decreasing"));
                }
                if offsets[offsets.len() - 1] as usize != bytes.len() {
                    return Err(input_err!(
                        "byte array offsets must end at the byte length {}, got {}",
                        bytes.len(),
                        offsets[offsets.len() - 1]
                    ));
                }
                Ok(offsets.len() - 1)
            }
            ColumnData::FixedLenByteArray(bytes) => {
                let type_length = type_length as usize;
                if type_length == 0 || bytes.len() % type_length != 0 {
                    return Err(input_err!(
                        "fixed length byte array buffer of {} bytes is not a multiple of the type length {}",
                        bytes.len(),
                        type_length
                    ));
                }
                Ok(bytes.len() / type_length)
            }
        }
    }

    /// Appends the PLAIN encoding of every value to `buffer`.
    ///
    /// All multi-byte values are little-endian on the wire regardless of the
    /// host; `to_le_bytes` performs the swap where one is needed.
    pub fn encode_plain(&self, buffer: &mut Vec<u8>) {
        match self {
            ColumnData::Boolean(values) => {
                let mut bits = BitWriter::new(values.len().div_ceil(8));
                for &v in *values {
                    bits.put_value(v as u64, 1);
                }
                buffer.extend_from_slice(&bits.consume());
            }
            ColumnData::Int32(values) => {
                buffer.reserve(values.len() * 4);
                for v in *values {
                    buffer.extend_from_slice(&v.to_le_bytes());
                }
            }
            ColumnData::Int64(values) => {
                buffer.reserve(values.len() * 8);
                for v in *values {
                    buffer.extend_from_slice(&v.to_le_bytes());
                }
            }
            ColumnData::Int96(values) => {
                buffer.reserve(values.len() * 12);
                for v in *values {
                    for word in v {
                        buffer.extend_from_slice(&word.to_le_bytes());
                    }
                }
            }
            ColumnData::Float(values) => {
                buffer.reserve(values.len() * 4);
                for v in *values {
                    buffer.extend_from_slice(&v.to_le_bytes());
                }
            }
            ColumnData::Double(values) => {
                buffer.reserve(values.len() * 8);
                for v in *values {
                    buffer.extend_from_slice(&v.to_le_bytes());
                }
            }
            ColumnData::ByteArray { bytes, offsets } => {
                for w in offsets.windows(2) {
                    let (start, end) = (w[0] as usize, w[1] as usize);
                    buffer.extend_from_slice(&((end - start) as u32).to_le_bytes());
                    buffer.extend_from_slice(&bytes[start..end]);
                }
            }
            ColumnData::FixedLenByteArray(bytes) => {
                buffer.extend_from_slice(bytes);
            }
        }
    }
}

/// Definition and repetition level streams for one column of a row group.
///
/// Both streams use one byte per level entry. `REQUIRED` columns carry
/// neither stream, `OPTIONAL` columns carry definition levels only, and
/// `REPEATED` columns carry both.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnLevels<'a> {
    pub def_levels: Option<&'a [u8]>,
    pub rep_levels: Option<&'a [u8]>,
}

impl<'a> ColumnLevels<'a> {
    /// Levels for a `REQUIRED` column.
    pub fn none() -> Self {
        Self::default()
    }

    /// Levels for an `OPTIONAL` column: one definition level per row.
    pub fn optional(def_levels: &'a [u8]) -> Self {
        Self {
            def_levels: Some(def_levels),
            rep_levels: None,
        }
    }

    /// Levels for a `REPEATED` column.
    pub fn repeated(def_levels: &'a [u8], rep_levels: &'a [u8]) -> Self {
        Self {
            def_levels: Some(def_levels),
            rep_levels: Some(rep_levels),
        }
    }

    fn def(&self) -> &[u8] {
        self.def_levels.unwrap_or_default()
    }

    fn rep(&self) -> &[u8] {
        self.rep_levels.unwrap_or_default()
    }

    /// Validates the level streams against the column's repetition and the
    /// row count, returning the per-column accounting the writer needs.
    pub fn validate(&self, repetition: Repetition, num_rows: usize) -> Result<LevelInfo> {
        match repetition {
            Repetition::REQUIRED => {
                if !self.def().is_empty() || !self.rep().is_empty() {
                    return Err(input_err!("required columns must not carry levels"));
                }
                Ok(LevelInfo {
                    num_level_entries: num_rows,
                    num_present_values: num_rows,
                })
            }
            Repetition::OPTIONAL => {
                let def = self.def();
                if !self.rep().is_empty() {
                    return Err(input_err!(
                        "optional columns must not carry repetition levels"
                    ));
                }
                if def.len() != num_rows {
                    return Err(input_err!(
                        "expected {} definition levels, got {}",
                        num_rows,
                        def.len()
                    ));
                }
                if let Some(bad) = def.iter().find(|&&l| l > 1) {
                    return Err(input_err!(
                        "definition level {} exceeds the maximum of 1",
                        bad
                    ));
                }
                Ok(LevelInfo {
                    num_level_entries: def.len(),
                    num_present_values: def.iter().filter(|&&l| l == 1).count(),
                })
            }
            Repetition::REPEATED => {
                let def = self.def();
                let rep = self.rep();
                if def.len() != rep.len() {
                    return Err(input_err!(
                        "definition and repetition level streams differ in length: {} vs {}",
                        def.len(),
                        rep.len()
                    ));
                }
                if def.iter().any(|&l| l > 1) || rep.iter().any(|&l| l > 1) {
                    return Err(input_err!(
                        "levels beyond 1 imply nested groups, which are not supported"
                    ));
                }
                match rep.first() {
                    None => {
                        if num_rows != 0 {
                            return Err(input_err!(
                                "expected levels for {} rows, got none",
                                num_rows
                            ));
                        }
                    }
                    Some(&first) if first != 0 => {
                        return Err(input_err!("the first repetition level must be 0"));
                    }
                    _ => {}
                }
                let rows = rep.iter().filter(|&&l| l == 0).count();
                if rows != num_rows {
                    return Err(input_err!(
                        "repetition levels describe {} rows, expected {}",
                        rows,
                        num_rows
                    ));
                }
                Ok(LevelInfo {
                    num_level_entries: def.len(),
                    num_present_values: def.iter().filter(|&&l| l == 1).count(),
                })
            }
        }
    }
}

/// Accounting derived from a validated level pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInfo {
    /// Number of level entries, i.e. the `num_values` recorded in the page
    /// header and chunk metadata.
    pub num_level_entries: usize,
    /// Number of values physically present in the value buffer.
    pub num_present_values: usize,
}

/// Checks a [`ColumnData`] variant against the schema's physical type.
pub(crate) fn check_type(data: &ColumnData<'_>, expected: Type, column: &str) -> Result<()> {
    let actual = data.physical_type();
    if actual != expected {
        return Err(input_err!(
            "column {} expects {} values, got {}",
            column,
            expected,
            actual
        ));
    }
    Ok(())
}

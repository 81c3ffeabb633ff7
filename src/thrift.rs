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

//! Write-only encoder for the Thrift [compact protocol], which carries all
//! of the file metadata.
//!
//! Only the writer half of the protocol exists here; the crate never reads
//! metadata back. [`ThriftCompactOutputProtocol`] holds the primitive
//! operations (varints, field and list headers, binary), and the
//! [`WriteThrift`] / [`WriteThriftField`] traits let each metadata struct
//! describe its own field layout on top of them.
//!
//! [compact protocol]: https://github.com/apache/thrift/blob/master/doc/specs/thrift-compact-protocol.md

use std::io::Write;

use crate::errors::Result;

/// Wire type nibble for a struct field.
///
/// Booleans are special: their value is the type nibble itself, so a bool
/// field carries no bytes beyond its header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldType {
    Stop = 0,
    BooleanTrue = 1,
    BooleanFalse = 2,
    Byte = 3,
    I16 = 4,
    I32 = 5,
    I64 = 6,
    Double = 7,
    Binary = 8,
    List = 9,
    Set = 10,
    Map = 11,
    Struct = 12,
}

/// Wire type nibble for a list element.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ElementType {
    Bool = 2,
    Byte = 3,
    I16 = 4,
    I32 = 5,
    I64 = 6,
    Double = 7,
    Binary = 8,
    List = 9,
    Set = 10,
    Map = 11,
    Struct = 12,
}

/// The compact-protocol encoder over an arbitrary byte sink.
///
/// Struct encoding is cooperative: the protocol does not track nesting or
/// field ids itself. Callers thread the previous field id through
/// [`write_field_begin`](Self::write_field_begin) so the one-byte delta
/// header can be used, and call [`write_struct_end`](Self::write_struct_end)
/// when a struct's fields are done.
pub struct ThriftCompactOutputProtocol<W: Write> {
    sink: W,
}

impl<W: Write> ThriftCompactOutputProtocol<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    #[inline]
    fn write_byte(&mut self, b: u8) -> Result<()> {
        self.sink.write_all(std::slice::from_ref(&b))?;
        Ok(())
    }

    /// ULEB128: seven payload bits per byte, high bit set on every byte but
    /// the last. Encoded into a stack buffer so the sink sees one write.
    pub fn write_vlq(&mut self, mut value: u64) -> Result<()> {
        let mut encoded = [0u8; 10];
        let mut len = 0;
        loop {
            let low = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                encoded[len] = low;
                len += 1;
                break;
            }
            encoded[len] = low | 0x80;
            len += 1;
        }
        self.sink.write_all(&encoded[..len])?;
        Ok(())
    }

    /// Zig-zag maps the signed range onto the unsigned one, small magnitudes
    /// first, so negative ids stay short as varints.
    pub fn write_zig_zag(&mut self, value: i64) -> Result<()> {
        self.write_vlq(((value << 1) ^ (value >> 63)) as u64)
    }

    /// Field header. When the id gap since the previous field fits in a
    /// nibble the header is a single `delta << 4 | type` byte; anything else
    /// takes the long form of a bare type byte plus the full zig-zag id.
    pub fn write_field_begin(
        &mut self,
        field_type: FieldType,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<()> {
        let gap = i32::from(field_id) - i32::from(last_field_id);
        if !(1..=15).contains(&gap) {
            self.write_byte(field_type as u8)?;
            return self.write_zig_zag(i64::from(field_id));
        }
        self.write_byte(((gap as u8) << 4) | field_type as u8)
    }

    /// List header: sizes under 15 share a byte with the element type,
    /// larger ones escape to `0xf` and a varint size.
    pub fn write_list_begin(&mut self, element_type: ElementType, len: usize) -> Result<()> {
        if len >= 15 {
            self.write_byte(0xf0 | element_type as u8)?;
            return self.write_vlq(len as u64);
        }
        self.write_byte(((len as u8) << 4) | element_type as u8)
    }

    /// Terminates the current struct's field list.
    pub fn write_struct_end(&mut self) -> Result<()> {
        self.write_byte(FieldType::Stop as u8)
    }

    /// Binary: varint byte length, then the payload verbatim.
    pub fn write_bytes(&mut self, payload: &[u8]) -> Result<()> {
        self.write_vlq(payload.len() as u64)?;
        self.sink.write_all(payload)?;
        Ok(())
    }

    /// A standalone bool, as found inside lists. Struct-field bools never
    /// reach this; they are folded into the field header instead.
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        let marker = if value {
            FieldType::BooleanTrue
        } else {
            FieldType::BooleanFalse
        };
        self.write_byte(marker as u8)
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write_zig_zag(i64::from(value))
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_zig_zag(i64::from(value))
    }

    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_zig_zag(value)
    }

    /// Doubles are the one fixed-width primitive: eight little-endian bytes.
    pub fn write_double(&mut self, value: f64) -> Result<()> {
        self.sink.write_all(&value.to_le_bytes())?;
        Ok(())
    }
}

/// A value that knows its own compact-protocol encoding.
///
/// Implemented by the protocol primitives below and by every metadata
/// struct and enum in the crate.
pub trait WriteThrift {
    /// Type nibble announced when values of this type appear in a list.
    const ELEMENT_TYPE: ElementType;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()>;
}

/// A value that can appear as a numbered field of a Thrift struct.
///
/// `write_thrift_field` emits the field header for `field_id` (delta-encoded
/// against `last_field_id`) followed by the value, and hands `field_id` back
/// so the caller can chain it into the next field:
///
/// ```ignore
/// let mut last_field_id = self.version.write_thrift_field(writer, 1, 0)?;
/// last_field_id = self.num_rows.write_thrift_field(writer, 3, last_field_id)?;
/// writer.write_struct_end()
/// ```
///
/// Optional fields simply skip their `write_thrift_field` call, which is
/// what makes the chained-id style worth the ceremony.
pub trait WriteThriftField {
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16>;
}

/// Generates both trait impls for a primitive that maps onto one protocol
/// method.
macro_rules! thrift_primitive {
    ($ty:ty, $element_type:ident, $field_type:ident, $method:ident) => {
        impl WriteThrift for $ty {
            const ELEMENT_TYPE: ElementType = ElementType::$element_type;

            fn write_thrift<W: Write>(
                &self,
                writer: &mut ThriftCompactOutputProtocol<W>,
            ) -> Result<()> {
                writer.$method(*self)
            }
        }

        impl WriteThriftField for $ty {
            fn write_thrift_field<W: Write>(
                &self,
                writer: &mut ThriftCompactOutputProtocol<W>,
                field_id: i16,
                last_field_id: i16,
            ) -> Result<i16> {
                writer.write_field_begin(FieldType::$field_type, field_id, last_field_id)?;
                writer.$method(*self)?;
                Ok(field_id)
            }
        }
    };
}

thrift_primitive!(i16, I16, I16, write_i16);
thrift_primitive!(i32, I32, I32, write_i32);
thrift_primitive!(i64, I64, I64, write_i64);
thrift_primitive!(f64, Double, Double, write_double);

impl WriteThrift for &str {
    const ELEMENT_TYPE: ElementType = ElementType::Binary;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        writer.write_bytes(self.as_bytes())
    }
}

impl WriteThriftField for &str {
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16> {
        writer.write_field_begin(FieldType::Binary, field_id, last_field_id)?;
        writer.write_bytes(self.as_bytes())?;
        Ok(field_id)
    }
}

impl WriteThrift for &[u8] {
    const ELEMENT_TYPE: ElementType = ElementType::Binary;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        writer.write_bytes(self)
    }
}

impl WriteThriftField for &[u8] {
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16> {
        writer.write_field_begin(FieldType::Binary, field_id, last_field_id)?;
        writer.write_bytes(self)?;
        Ok(field_id)
    }
}

impl WriteThrift for bool {
    const ELEMENT_TYPE: ElementType = ElementType::Bool;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        writer.write_bool(*self)
    }
}

// As a struct field a bool is all header: the type nibble doubles as the
// value and no body follows.
impl WriteThriftField for bool {
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16> {
        let field_type = if *self {
            FieldType::BooleanTrue
        } else {
            FieldType::BooleanFalse
        };
        writer.write_field_begin(field_type, field_id, last_field_id)?;
        Ok(field_id)
    }
}

impl<T: WriteThrift> WriteThrift for Vec<T> {
    const ELEMENT_TYPE: ElementType = ElementType::List;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        writer.write_list_begin(T::ELEMENT_TYPE, self.len())?;
        self.iter().try_for_each(|element| element.write_thrift(writer))
    }
}

impl<T: WriteThrift> WriteThriftField for Vec<T> {
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16> {
        writer.write_field_begin(FieldType::List, field_id, last_field_id)?;
        self.write_thrift(writer)?;
        Ok(field_id)
    }
}

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

//! In-memory metadata records and their Thrift serializations.
//!
//! The field ids in the `write_thrift` impls are fixed by `parquet.thrift`
//! and must not change.

use std::io::Write;

use crate::basic::{Compression, Encoding, PageType, Repetition, Type};
use crate::errors::Result;
use crate::schema::SchemaDescriptor;
use crate::thrift::{
    ElementType, FieldType, ThriftCompactOutputProtocol, WriteThrift, WriteThriftField,
};

/// Metadata the writer accumulates for each written column chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnChunkMetaData {
    /// Index of the column in the schema.
    pub column_index: usize,
    /// Absolute offset of the chunk's (only) data page header in the file.
    pub data_page_offset: i64,
    /// Bytes occupied by the chunk in the file: page header plus compressed
    /// page body.
    pub total_compressed_size: i64,
    /// Page header plus page body before compression.
    pub total_uncompressed_size: i64,
    /// Number of values in the chunk, counting nulls.
    pub num_values: i64,
}

/// Metadata for one written row group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowGroupMetaData {
    pub columns: Vec<ColumnChunkMetaData>,
    /// Total compressed byte size of all column chunks.
    pub total_byte_size: i64,
    pub num_rows: i64,
}

// ----------------------------------------------------------------------
// Thrift struct `PageHeader` and `DataPageHeader`

pub(crate) struct DataPageHeader {
    pub num_values: i32,
    pub encoding: Encoding,
    pub definition_level_encoding: Encoding,
    pub repetition_level_encoding: Encoding,
}

impl WriteThrift for DataPageHeader {
    const ELEMENT_TYPE: ElementType = ElementType::Struct;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let mut last_field_id = self.num_values.write_thrift_field(writer, 1, 0)?;
        last_field_id = self.encoding.write_thrift_field(writer, 2, last_field_id)?;
        last_field_id = self
            .definition_level_encoding
            .write_thrift_field(writer, 3, last_field_id)?;
        self.repetition_level_encoding
            .write_thrift_field(writer, 4, last_field_id)?;
        writer.write_struct_end()
    }
}

impl WriteThriftField for DataPageHeader {
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16> {
        writer.write_field_begin(FieldType::Struct, field_id, last_field_id)?;
        self.write_thrift(writer)?;
        Ok(field_id)
    }
}

pub(crate) struct PageHeader {
    pub type_: PageType,
    pub uncompressed_page_size: i32,
    pub compressed_page_size: i32,
    pub data_page_header: DataPageHeader,
}

impl WriteThrift for PageHeader {
    const ELEMENT_TYPE: ElementType = ElementType::Struct;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let mut last_field_id = self.type_.write_thrift_field(writer, 1, 0)?;
        last_field_id = self
            .uncompressed_page_size
            .write_thrift_field(writer, 2, last_field_id)?;
        last_field_id = self
            .compressed_page_size
            .write_thrift_field(writer, 3, last_field_id)?;
        // field 4 (crc) is not written
        self.data_page_header
            .write_thrift_field(writer, 5, last_field_id)?;
        writer.write_struct_end()
    }
}

// ----------------------------------------------------------------------
// Thrift struct `SchemaElement`

pub(crate) struct SchemaElement<'a> {
    pub type_: Option<Type>,
    pub type_length: Option<i32>,
    pub repetition_type: Option<Repetition>,
    pub name: &'a str,
    pub num_children: Option<i32>,
    pub converted_type: Option<crate::basic::ConvertedType>,
}

impl WriteThrift for SchemaElement<'_> {
    const ELEMENT_TYPE: ElementType = ElementType::Struct;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let mut last_field_id = 0i16;
        if let Some(type_) = self.type_ {
            last_field_id = type_.write_thrift_field(writer, 1, last_field_id)?;
        }
        if let Some(type_length) = self.type_length {
            last_field_id = type_length.write_thrift_field(writer, 2, last_field_id)?;
        }
        if let Some(repetition_type) = self.repetition_type {
            last_field_id = repetition_type.write_thrift_field(writer, 3, last_field_id)?;
        }
        last_field_id = self.name.write_thrift_field(writer, 4, last_field_id)?;
        if let Some(num_children) = self.num_children {
            last_field_id = num_children.write_thrift_field(writer, 5, last_field_id)?;
        }
        if let Some(converted_type) = self.converted_type {
            converted_type.write_thrift_field(writer, 6, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

/// Flattens a schema into its thrift form: a root group element named
/// "schema" followed by one leaf element per column.
pub(crate) fn schema_elements<'a>(schema: &'a SchemaDescriptor) -> Vec<SchemaElement<'a>> {
    let mut elements = Vec::with_capacity(schema.num_columns() + 1);
    elements.push(SchemaElement {
        type_: None,
        type_length: None,
        repetition_type: None,
        name: "schema",
        num_children: Some(schema.num_columns() as i32),
        converted_type: None,
    });
    for column in schema.columns() {
        let type_length = (column.physical_type() == Type::FIXED_LEN_BYTE_ARRAY)
            .then(|| column.type_length());
        elements.push(SchemaElement {
            type_: Some(column.physical_type()),
            type_length,
            repetition_type: Some(column.repetition()),
            name: column.name(),
            num_children: None,
            converted_type: column.converted_type(),
        });
    }
    elements
}

// ----------------------------------------------------------------------
// Thrift structs `ColumnMetaData`, `ColumnChunk`, `RowGroup`, `FileMetaData`

pub(crate) struct ColumnMetaData<'a> {
    pub type_: Type,
    pub encodings: Vec<Encoding>,
    pub path_in_schema: Vec<&'a str>,
    pub codec: Compression,
    pub num_values: i64,
    pub total_uncompressed_size: i64,
    pub total_compressed_size: i64,
    pub data_page_offset: i64,
}

impl WriteThrift for ColumnMetaData<'_> {
    const ELEMENT_TYPE: ElementType = ElementType::Struct;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let mut last_field_id = self.type_.write_thrift_field(writer, 1, 0)?;
        last_field_id = self.encodings.write_thrift_field(writer, 2, last_field_id)?;
        last_field_id = self
            .path_in_schema
            .write_thrift_field(writer, 3, last_field_id)?;
        last_field_id = self.codec.write_thrift_field(writer, 4, last_field_id)?;
        last_field_id = self.num_values.write_thrift_field(writer, 5, last_field_id)?;
        last_field_id = self
            .total_uncompressed_size
            .write_thrift_field(writer, 6, last_field_id)?;
        last_field_id = self
            .total_compressed_size
            .write_thrift_field(writer, 7, last_field_id)?;
        // field 8 (key_value_metadata) is not written
        self.data_page_offset
            .write_thrift_field(writer, 9, last_field_id)?;
        writer.write_struct_end()
    }
}

impl WriteThriftField for ColumnMetaData<'_> {
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16> {
        writer.write_field_begin(FieldType::Struct, field_id, last_field_id)?;
        self.write_thrift(writer)?;
        Ok(field_id)
    }
}

pub(crate) struct ColumnChunk<'a> {
    /// Offset of the chunk's first byte; the same value as
    /// `meta_data.data_page_offset` for the single-page chunks this writer
    /// produces.
    pub file_offset: i64,
    pub meta_data: ColumnMetaData<'a>,
}

impl WriteThrift for ColumnChunk<'_> {
    const ELEMENT_TYPE: ElementType = ElementType::Struct;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        // field 1 (file_path) is not written: chunks live in this file
        let last_field_id = self.file_offset.write_thrift_field(writer, 2, 0)?;
        self.meta_data.write_thrift_field(writer, 3, last_field_id)?;
        writer.write_struct_end()
    }
}

pub(crate) struct RowGroup<'a> {
    pub columns: Vec<ColumnChunk<'a>>,
    pub total_byte_size: i64,
    pub num_rows: i64,
}

impl WriteThrift for RowGroup<'_> {
    const ELEMENT_TYPE: ElementType = ElementType::Struct;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let mut last_field_id = self.columns.write_thrift_field(writer, 1, 0)?;
        last_field_id = self
            .total_byte_size
            .write_thrift_field(writer, 2, last_field_id)?;
        self.num_rows.write_thrift_field(writer, 3, last_field_id)?;
        writer.write_struct_end()
    }
}

pub(crate) struct FileMetaData<'a> {
    pub version: i32,
    pub schema: Vec<SchemaElement<'a>>,
    pub num_rows: i64,
    pub row_groups: Vec<RowGroup<'a>>,
    pub created_by: Option<&'a str>,
}

impl WriteThrift for FileMetaData<'_> {
    const ELEMENT_TYPE: ElementType = ElementType::Struct;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let mut last_field_id = self.version.write_thrift_field(writer, 1, 0)?;
        last_field_id = self.schema.write_thrift_field(writer, 2, last_field_id)?;
        last_field_id = self.num_rows.write_thrift_field(writer, 3, last_field_id)?;
        last_field_id = self.row_groups.write_thrift_field(writer, 4, last_field_id)?;
        // field 5 (key_value_metadata) is not written
        if let Some(created_by) = self.created_by {
            created_by.write_thrift_field(writer, 6, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::ConvertedType;
    use crate::schema::ColumnDef;

    fn encode<T: WriteThrift>(value: &T) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut prot = ThriftCompactOutputProtocol::new(&mut buf);
        value.write_thrift(&mut prot).unwrap();
        buf
    }

    #[test]
    fn test_page_header_encoding() {
        let header = PageHeader {
            type_: PageType::DATA_PAGE,
            uncompressed_page_size: 10,
            compressed_page_size: 10,
            data_page_header: DataPageHeader {
                num_values: 1,
                encoding: Encoding::PLAIN,
                definition_level_encoding: Encoding::RLE,
                repetition_level_encoding: Encoding::RLE,
            },
        };
        let buf = encode(&header);
        // field 1 i32 short header, zig-zag 0
        assert_eq!(buf[0], 0x15);
        assert_eq!(buf[1], 0x00);
        // field 2 i32, zig-zag 20
        assert_eq!(buf[2], 0x15);
        assert_eq!(buf[3], 0x14);
        // field 3 i32, zig-zag 20
        assert_eq!(buf[4], 0x15);
        assert_eq!(buf[5], 0x14);
        // field 5 struct, delta 2
        assert_eq!(buf[6], 0x2c);
        // nested: num_values=1, encodings PLAIN/RLE/RLE, stop
        assert_eq!(
            &buf[7..],
            &[0x15, 0x02, 0x15, 0x00, 0x15, 0x06, 0x15, 0x06, 0x00, 0x00]
        );
    }

    #[test]
    fn test_schema_elements_shape() {
        let schema = SchemaDescriptor::new(vec![
            ColumnDef::new("id", Type::INT64, Repetition::REQUIRED),
            ColumnDef::new("sym", Type::FIXED_LEN_BYTE_ARRAY, Repetition::OPTIONAL)
                .with_type_length(8),
            ColumnDef::new("note", Type::BYTE_ARRAY, Repetition::OPTIONAL)
                .with_converted_type(ConvertedType::UTF8),
        ])
        .unwrap();
        let elements = schema_elements(&schema);
        assert_eq!(elements.len(), 4);
        assert_eq!(elements[0].name, "schema");
        assert_eq!(elements[0].num_children, Some(3));
        assert!(elements[0].type_.is_none());
        assert_eq!(elements[1].type_, Some(Type::INT64));
        assert_eq!(elements[1].type_length, None);
        assert_eq!(elements[2].type_length, Some(8));
        assert_eq!(elements[3].converted_type, Some(ConvertedType::UTF8));
    }

    #[test]
    fn test_root_schema_element_encoding() {
        let element = SchemaElement {
            type_: None,
            type_length: None,
            repetition_type: None,
            name: "schema",
            num_children: Some(1),
            converted_type: None,
        };
        let buf = encode(&element);
        // field 4 (binary): long-ish delta of 4 packs into the nibble
        assert_eq!(buf[0], 0x48);
        assert_eq!(buf[1], 6);
        assert_eq!(&buf[2..8], b"schema");
        // field 5 (i32) delta 1, value zig-zag 2
        assert_eq!(&buf[8..], &[0x15, 0x02, 0x00]);
    }

    #[test]
    fn test_file_metadata_minimal_encoding_walk() {
        let schema =
            SchemaDescriptor::new(vec![ColumnDef::new("v", Type::INT32, Repetition::REQUIRED)])
                .unwrap();
        let metadata = FileMetaData {
            version: 1,
            schema: schema_elements(&schema),
            num_rows: 0,
            row_groups: vec![],
            created_by: Some("test"),
        };
        let buf = encode(&metadata);
        // version: field 1, i32, zig-zag 2
        assert_eq!(&buf[..2], &[0x15, 0x02]);
        // schema list: field 2, list of 2 structs
        assert_eq!(buf[2], 0x19);
        assert_eq!(buf[3], 0x2c);
        // ends with created_by and the outer stop byte
        assert_eq!(buf[buf.len() - 1], 0x00);
    }
}

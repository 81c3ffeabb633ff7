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

//! A small independent reader used to verify written files: enough of the
//! Thrift compact protocol, the level encoding, and PLAIN decoding to walk
//! a footer and decode every page this writer can produce.

#![allow(dead_code)]

/// Minimal Thrift compact protocol reader.
pub struct ThriftReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ThriftReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn read_byte(&mut self) -> u8 {
        let b = self.buf[self.pos];
        self.pos += 1;
        b
    }

    pub fn read_vlq(&mut self) -> u64 {
        let mut result = 0u64;
        let mut shift = 0;
        loop {
            let byte = self.read_byte();
            result |= ((byte & 0x7f) as u64) << shift;
            if byte & 0x80 == 0 {
                return result;
            }
            shift += 7;
        }
    }

    pub fn read_zig_zag(&mut self) -> i64 {
        let v = self.read_vlq();
        (v >> 1) as i64 ^ -((v & 1) as i64)
    }

    pub fn read_i32(&mut self) -> i32 {
        self.read_zig_zag() as i32
    }

    pub fn read_i64(&mut self) -> i64 {
        self.read_zig_zag()
    }

    pub fn read_binary(&mut self) -> &'a [u8] {
        let len = self.read_vlq() as usize;
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        out
    }

    /// Returns `(field_type, field_id)`, or `None` at the stop byte.
    pub fn read_field(&mut self, last_id: i16) -> Option<(u8, i16)> {
        let header = self.read_byte();
        if header == 0 {
            return None;
        }
        let field_type = header & 0x0f;
        let delta = (header & 0xf0) >> 4;
        let id = if delta != 0 {
            last_id + delta as i16
        } else {
            self.read_zig_zag() as i16
        };
        Some((field_type, id))
    }

    /// Returns `(element_type, count)`.
    pub fn read_list_header(&mut self) -> (u8, usize) {
        let header = self.read_byte();
        let element_type = header & 0x0f;
        let count = (header & 0xf0) >> 4;
        let count = if count == 15 {
            self.read_vlq() as usize
        } else {
            count as usize
        };
        (element_type, count)
    }

    pub fn skip(&mut self, field_type: u8) {
        match field_type {
            1 | 2 => {}
            3..=6 => {
                self.read_vlq();
            }
            7 => self.pos += 8,
            8 => {
                self.read_binary();
            }
            9 => {
                let (element_type, count) = self.read_list_header();
                for _ in 0..count {
                    self.skip(element_type);
                }
            }
            12 => {
                let mut last_id = 0i16;
                while let Some((t, id)) = self.read_field(last_id) {
                    self.skip(t);
                    last_id = id;
                }
            }
            _ => panic!("cannot skip field type {field_type}"),
        }
    }
}

#[derive(Debug, Default)]
pub struct SchemaElement {
    pub type_: Option<i32>,
    pub type_length: Option<i32>,
    pub repetition: Option<i32>,
    pub name: String,
    pub num_children: Option<i32>,
    pub converted_type: Option<i32>,
}

#[derive(Debug, Default)]
pub struct ColumnChunk {
    pub file_offset: i64,
    pub type_: i32,
    pub encodings: Vec<i32>,
    pub path_in_schema: Vec<String>,
    pub codec: i32,
    pub num_values: i64,
    pub total_uncompressed_size: i64,
    pub total_compressed_size: i64,
    pub data_page_offset: i64,
}

#[derive(Debug, Default)]
pub struct RowGroup {
    pub columns: Vec<ColumnChunk>,
    pub total_byte_size: i64,
    pub num_rows: i64,
}

#[derive(Debug, Default)]
pub struct FileMetaData {
    pub version: i32,
    pub schema: Vec<SchemaElement>,
    pub num_rows: i64,
    pub row_groups: Vec<RowGroup>,
    pub created_by: Option<String>,
}

fn parse_schema_element(reader: &mut ThriftReader<'_>) -> SchemaElement {
    let mut element = SchemaElement::default();
    let mut last_id = 0i16;
    while let Some((field_type, id)) = reader.read_field(last_id) {
        match id {
            1 => element.type_ = Some(reader.read_i32()),
            2 => element.type_length = Some(reader.read_i32()),
            3 => element.repetition = Some(reader.read_i32()),
            4 => element.name = String::from_utf8(reader.read_binary().to_vec()).unwrap(),
            5 => element.num_children = Some(reader.read_i32()),
            6 => element.converted_type = Some(reader.read_i32()),
            _ => reader.skip(field_type),
        }
        last_id = id;
    }
    element
}

fn parse_column_chunk(reader: &mut ThriftReader<'_>) -> ColumnChunk {
    let mut chunk = ColumnChunk::default();
    let mut last_id = 0i16;
    while let Some((field_type, id)) = reader.read_field(last_id) {
        match id {
            2 => chunk.file_offset = reader.read_i64(),
            3 => {
                let mut meta_last_id = 0i16;
                while let Some((meta_type, meta_id)) = reader.read_field(meta_last_id) {
                    match meta_id {
                        1 => chunk.type_ = reader.read_i32(),
                        2 => {
                            let (_, count) = reader.read_list_header();
                            chunk.encodings = (0..count).map(|_| reader.read_i32()).collect();
                        }
                        3 => {
                            let (_, count) = reader.read_list_header();
                            chunk.path_in_schema = (0..count)
                                .map(|_| {
                                    String::from_utf8(reader.read_binary().to_vec()).unwrap()
                                })
                                .collect();
                        }
                        4 => chunk.codec = reader.read_i32(),
                        5 => chunk.num_values = reader.read_i64(),
                        6 => chunk.total_uncompressed_size = reader.read_i64(),
                        7 => chunk.total_compressed_size = reader.read_i64(),
                        9 => chunk.data_page_offset = reader.read_i64(),
                        _ => reader.skip(meta_type),
                    }
                    meta_last_id = meta_id;
                }
            }
            _ => reader.skip(field_type),
        }
        last_id = id;
    }
    chunk
}

fn parse_row_group(reader: &mut ThriftReader<'_>) -> RowGroup {
    let mut row_group = RowGroup::default();
    let mut last_id = 0i16;
    while let Some((field_type, id)) = reader.read_field(last_id) {
        match id {
            1 => {
                let (_, count) = reader.read_list_header();
                row_group.columns = (0..count).map(|_| parse_column_chunk(reader)).collect();
            }
            2 => row_group.total_byte_size = reader.read_i64(),
            3 => row_group.num_rows = reader.read_i64(),
            _ => reader.skip(field_type),
        }
        last_id = id;
    }
    row_group
}

/// Parses the footer of `file`, checking the magic framing on the way.
pub fn parse_file_metadata(file: &[u8]) -> FileMetaData {
    assert!(file.len() >= 12, "file too short");
    assert_eq!(&file[..4], b"PAR1", "missing leading magic");
    assert_eq!(&file[file.len() - 4..], b"PAR1", "missing trailing magic");
    let footer_len =
        u32::from_le_bytes(file[file.len() - 8..file.len() - 4].try_into().unwrap()) as usize;
    let footer_start = file.len() - 8 - footer_len;
    assert!(footer_start >= 4, "footer length overruns the file");
    let footer = &file[footer_start..file.len() - 8];

    let mut reader = ThriftReader::new(footer);
    let mut metadata = FileMetaData::default();
    let mut last_id = 0i16;
    while let Some((field_type, id)) = reader.read_field(last_id) {
        match id {
            1 => metadata.version = reader.read_i32(),
            2 => {
                let (_, count) = reader.read_list_header();
                metadata.schema = (0..count).map(|_| parse_schema_element(&mut reader)).collect();
            }
            3 => metadata.num_rows = reader.read_i64(),
            4 => {
                let (_, count) = reader.read_list_header();
                metadata.row_groups = (0..count).map(|_| parse_row_group(&mut reader)).collect();
            }
            6 => {
                metadata.created_by =
                    Some(String::from_utf8(reader.read_binary().to_vec()).unwrap())
            }
            _ => reader.skip(field_type),
        }
        last_id = id;
    }
    assert_eq!(reader.position(), footer.len(), "trailing bytes in footer");
    metadata
}

#[derive(Debug)]
pub struct PageHeader {
    pub type_: i32,
    pub uncompressed_page_size: i32,
    pub compressed_page_size: i32,
    pub num_values: i32,
    pub encoding: i32,
    pub definition_level_encoding: i32,
    pub repetition_level_encoding: i32,
    /// Bytes the header itself occupies.
    pub header_len: usize,
}

/// Parses the page header found at `offset`.
pub fn parse_page_header(file: &[u8], offset: usize) -> PageHeader {
    let mut reader = ThriftReader::new(&file[offset..]);
    let mut header = PageHeader {
        type_: -1,
        uncompressed_page_size: -1,
        compressed_page_size: -1,
        num_values: -1,
        encoding: -1,
        definition_level_encoding: -1,
        repetition_level_encoding: -1,
        header_len: 0,
    };
    let mut last_id = 0i16;
    while let Some((field_type, id)) = reader.read_field(last_id) {
        match id {
            1 => header.type_ = reader.read_i32(),
            2 => header.uncompressed_page_size = reader.read_i32(),
            3 => header.compressed_page_size = reader.read_i32(),
            5 => {
                let mut dph_last_id = 0i16;
                while let Some((dph_type, dph_id)) = reader.read_field(dph_last_id) {
                    match dph_id {
                        1 => header.num_values = reader.read_i32(),
                        2 => header.encoding = reader.read_i32(),
                        3 => header.definition_level_encoding = reader.read_i32(),
                        4 => header.repetition_level_encoding = reader.read_i32(),
                        _ => reader.skip(dph_type),
                    }
                    dph_last_id = dph_id;
                }
            }
            _ => reader.skip(field_type),
        }
        last_id = id;
    }
    header.header_len = reader.position();
    header
}

/// Decodes an RLE/bit-packed level stream of `num_values` 1-bit levels.
pub fn decode_levels(data: &[u8], num_values: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(num_values);
    let mut pos = 0usize;
    while out.len() < num_values {
        let mut header = 0u64;
        let mut shift = 0;
        loop {
            let byte = data[pos];
            pos += 1;
            header |= ((byte & 0x7f) as u64) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        if header & 1 == 0 {
            let count = (header >> 1) as usize;
            let value = data[pos];
            pos += 1;
            for _ in 0..count.min(num_values - out.len()) {
                out.push(value);
            }
        } else {
            let groups = (header >> 1) as usize;
            for i in 0..groups * 8 {
                if out.len() == num_values {
                    break;
                }
                out.push(data[pos + i / 8] >> (i % 8) & 1);
            }
            pos += groups;
        }
    }
    out
}

/// The decompressed body of the single data page of `chunk`, plus its parsed
/// header.
pub fn read_page_body(file: &[u8], chunk: &ColumnChunk) -> (PageHeader, Vec<u8>) {
    let offset = chunk.data_page_offset as usize;
    let header = parse_page_header(file, offset);
    assert_eq!(header.type_, 0, "expected a v1 data page");
    let body_start = offset + header.header_len;
    let body = &file[body_start..body_start + header.compressed_page_size as usize];
    assert_eq!(
        chunk.total_compressed_size as usize,
        header.header_len + body.len(),
        "chunk size accounting"
    );
    let body = match chunk.codec {
        0 => body.to_vec(),
        2 => {
            use std::io::Read;
            let mut out = Vec::new();
            flate2::read::GzDecoder::new(body).read_to_end(&mut out).unwrap();
            out
        }
        6 => zstd::decode_all(body).unwrap(),
        other => panic!("unexpected codec {other}"),
    };
    assert_eq!(body.len(), header.uncompressed_page_size as usize);
    (header, body)
}

/// Splits a page body into `(rep_levels, def_levels, values)` for a column
/// with the given repetition (0 required, 1 optional, 2 repeated).
pub fn split_page_body(body: &[u8], repetition: i32, num_values: usize) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
    let mut pos = 0usize;
    let mut rep = Vec::new();
    let mut def = Vec::new();
    if repetition == 2 {
        let len = u32::from_le_bytes(body[pos..pos + 4].try_into().unwrap()) as usize;
        rep = decode_levels(&body[pos + 4..pos + 4 + len], num_values);
        pos += 4 + len;
    }
    if repetition != 0 {
        let len = u32::from_le_bytes(body[pos..pos + 4].try_into().unwrap()) as usize;
        def = decode_levels(&body[pos + 4..pos + 4 + len], num_values);
        pos += 4 + len;
    }
    (rep, def, body[pos..].to_vec())
}

/// Decodes PLAIN-encoded BYTE_ARRAY values.
pub fn decode_byte_arrays(mut values: &[u8], count: usize) -> Vec<Vec<u8>> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let len = u32::from_le_bytes(values[..4].try_into().unwrap()) as usize;
        out.push(values[4..4 + len].to_vec());
        values = &values[4 + len..];
    }
    assert!(values.is_empty(), "trailing bytes after byte array values");
    out
}

/// Decodes PLAIN-encoded i64 values.
pub fn decode_i64s(values: &[u8]) -> Vec<i64> {
    values
        .chunks_exact(8)
        .map(|c| i64::from_le_bytes(c.try_into().unwrap()))
        .collect()
}

/// Decodes PLAIN-encoded i32 values.
pub fn decode_i32s(values: &[u8]) -> Vec<i32> {
    values
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes(c.try_into().unwrap()))
        .collect()
}

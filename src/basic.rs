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

//! Rust mappings for the Thrift enums of the Parquet format. The integer
//! values are part of the format and must match `parquet.thrift`.

use std::fmt;
use std::io::Write;

use crate::errors::{ParquetFlowError, Result};
use crate::thrift::{
    ElementType, FieldType, ThriftCompactOutputProtocol, WriteThrift, WriteThriftField,
};

/// Declares an enum whose variants carry the integer codes assigned by
/// `parquet.thrift`, together with code-to-variant conversion and the thrift
/// write impls (enums are serialized as zig-zag `i32` on the wire).
macro_rules! wire_enum {
    ($(#[$outer:meta])* $name:ident { $($(#[$inner:meta])* $variant:ident = $code:literal,)+ }) => {
        $(#[$outer])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[allow(non_camel_case_types)]
        pub enum $name {
            $($(#[$inner])* $variant = $code,)+
        }

        impl $name {
            /// Maps a raw format code back to a variant.
            pub fn from_code(code: i32) -> Result<Self> {
                $(if code == $code {
                    return Ok($name::$variant);
                })+
                Err(input_err!("unexpected {} {}", stringify!($name), code))
            }
        }

        impl TryFrom<i32> for $name {
            type Error = ParquetFlowError;

            fn try_from(code: i32) -> Result<Self> {
                $name::from_code(code)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        }

        impl WriteThrift for $name {
            const ELEMENT_TYPE: ElementType = ElementType::I32;

            fn write_thrift<W: Write>(
                &self,
                writer: &mut ThriftCompactOutputProtocol<W>,
            ) -> Result<()> {
                writer.write_i32(*self as i32)
            }
        }

        impl WriteThriftField for $name {
            fn write_thrift_field<W: Write>(
                &self,
                writer: &mut ThriftCompactOutputProtocol<W>,
                field_id: i16,
                last_field_id: i16,
            ) -> Result<i16> {
                writer.write_field_begin(FieldType::I32, field_id, last_field_id)?;
                writer.write_i32(*self as i32)?;
                Ok(field_id)
            }
        }
    }
}

wire_enum!(
/// Physical types supported by Parquet.
///
/// These types describe the on-disk representation only; see
/// [`ConvertedType`] for the annotations layered on top.
Type {
  BOOLEAN = 0,
  INT32 = 1,
  INT64 = 2,
  /// Deprecated in the format, but still emitted by legacy timestamp
  /// producers and accepted here for capture compatibility.
  INT96 = 3,
  FLOAT = 4,
  DOUBLE = 5,
  BYTE_ARRAY = 6,
  FIXED_LEN_BYTE_ARRAY = 7,
}
);

wire_enum!(
/// Representation of field repetition in a schema.
Repetition {
  /// The field is required (can not be null) and each row has exactly 1 value.
  REQUIRED = 0,
  /// The field is optional (can be null) and each row has 0 or 1 values.
  OPTIONAL = 1,
  /// The field is repeated and can contain 0 or more values.
  REPEATED = 2,
}
);

wire_enum!(
/// Encodings this writer emits.
///
/// Values are always PLAIN; definition and repetition levels always use the
/// RLE/bit-packing hybrid.
Encoding {
  PLAIN = 0,
  RLE = 3,
}
);

wire_enum!(
/// Page types. Only v1 data pages are written.
PageType {
  DATA_PAGE = 0,
}
);

wire_enum!(
/// Converted-type annotations carried on schema leaves.
///
/// Only the string annotation is supported; it tells readers a `BYTE_ARRAY`
/// column holds UTF-8 text.
ConvertedType {
  UTF8 = 0,
}
);

// ----------------------------------------------------------------------
// Mirrors thrift enum `CompressionCodec`
//
// Cannot use the macro because the variants carry compression levels.

/// Supported block compression codecs for page bodies.
///
/// The wire codes (`UNCOMPRESSED=0`, `GZIP=2`, `ZSTD=6`) are fixed by the
/// Parquet format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum Compression {
    /// No compression.
    UNCOMPRESSED,
    /// [Gzip compression](https://www.ietf.org/rfc/rfc1952.txt)
    GZIP(GzipLevel),
    /// [ZSTD compression](https://datatracker.ietf.org/doc/html/rfc8878)
    ZSTD(ZstdLevel),
}

impl Compression {
    /// The integer codec code assigned by the Parquet format.
    pub fn codec_code(&self) -> i32 {
        match self {
            Compression::UNCOMPRESSED => 0,
            Compression::GZIP(_) => 2,
            Compression::ZSTD(_) => 6,
        }
    }

    /// Maps a raw codec code to a `Compression` with default levels, as used
    /// by the foreign-callable facade.
    pub fn from_codec_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Compression::UNCOMPRESSED),
            2 => Ok(Compression::GZIP(Default::default())),
            6 => Ok(Compression::ZSTD(Default::default())),
            1 | 3 | 4 | 5 | 7 => Err(ParquetFlowError::Compression(format!(
                "codec {code} is not supported by this writer"
            ))),
            _ => Err(input_err!("unexpected compression codec {}", code)),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Compression::UNCOMPRESSED => write!(f, "UNCOMPRESSED"),
            Compression::GZIP(level) => write!(f, "GZIP({})", level.0),
            Compression::ZSTD(level) => write!(f, "ZSTD({})", level.0),
        }
    }
}

impl WriteThrift for Compression {
    const ELEMENT_TYPE: ElementType = ElementType::I32;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        writer.write_i32(self.codec_code())
    }
}

impl WriteThriftField for Compression {
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16> {
        writer.write_field_begin(FieldType::I32, field_id, last_field_id)?;
        self.write_thrift(writer)?;
        Ok(field_id)
    }
}

/// Valid compression levels for gzip. Levels 0..=9 are accepted, mirroring
/// the range flate2 supports.
#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub struct GzipLevel(u32);

impl Default for GzipLevel {
    fn default() -> Self {
        // flate2's own default
        Self(6)
    }
}

impl GzipLevel {
    /// Attempts to create a gzip compression level.
    pub fn try_new(level: u32) -> Result<Self> {
        if level <= 9 {
            Ok(Self(level))
        } else {
            Err(config_err!("valid gzip compression range is 0..=9, got {}", level))
        }
    }

    /// Returns the compression level.
    pub fn compression_level(&self) -> u32 {
        self.0
    }
}

/// Valid compression levels for zstd. Levels 1..=22 are accepted, mirroring
/// the range the zstd crate supports.
#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub struct ZstdLevel(i32);

impl Default for ZstdLevel {
    fn default() -> Self {
        Self(1)
    }
}

impl ZstdLevel {
    /// Attempts to create a zstd compression level.
    pub fn try_new(level: i32) -> Result<Self> {
        if (1..=22).contains(&level) {
            Ok(Self(level))
        } else {
            Err(config_err!("valid zstd compression range is 1..=22, got {}", level))
        }
    }

    /// Returns the compression level.
    pub fn compression_level(&self) -> i32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thrift::tests::read_zig_zag;

    #[test]
    fn test_type_codes_match_format() {
        assert_eq!(Type::BOOLEAN as i32, 0);
        assert_eq!(Type::INT32 as i32, 1);
        assert_eq!(Type::INT64 as i32, 2);
        assert_eq!(Type::INT96 as i32, 3);
        assert_eq!(Type::FLOAT as i32, 4);
        assert_eq!(Type::DOUBLE as i32, 5);
        assert_eq!(Type::BYTE_ARRAY as i32, 6);
        assert_eq!(Type::FIXED_LEN_BYTE_ARRAY as i32, 7);
    }

    #[test]
    fn test_repetition_codes_match_format() {
        assert_eq!(Repetition::REQUIRED as i32, 0);
        assert_eq!(Repetition::OPTIONAL as i32, 1);
        assert_eq!(Repetition::REPEATED as i32, 2);
    }

    #[test]
    fn test_encoding_codes_match_format() {
        assert_eq!(Encoding::PLAIN as i32, 0);
        assert_eq!(Encoding::RLE as i32, 3);
    }

    #[test]
    fn test_compression_codes_match_format() {
        assert_eq!(Compression::UNCOMPRESSED.codec_code(), 0);
        assert_eq!(Compression::GZIP(Default::default()).codec_code(), 2);
        assert_eq!(Compression::ZSTD(Default::default()).codec_code(), 6);
    }

    #[test]
    fn test_compression_from_code() {
        assert_eq!(
            Compression::from_codec_code(0).unwrap(),
            Compression::UNCOMPRESSED
        );
        assert_eq!(
            Compression::from_codec_code(2).unwrap(),
            Compression::GZIP(Default::default())
        );
        assert_eq!(
            Compression::from_codec_code(6).unwrap(),
            Compression::ZSTD(Default::default())
        );
        // SNAPPY is a valid format code this writer does not implement
        assert!(matches!(
            Compression::from_codec_code(1),
            Err(ParquetFlowError::Compression(_))
        ));
        assert!(Compression::from_codec_code(42).is_err());
    }

    #[test]
    fn test_from_code() {
        assert_eq!(Type::from_code(6).unwrap(), Type::BYTE_ARRAY);
        assert!(Type::from_code(8).is_err());
        assert_eq!(Repetition::from_code(1).unwrap(), Repetition::OPTIONAL);
        assert!(Repetition::from_code(3).is_err());
        // TryFrom delegates to from_code
        assert_eq!(Type::try_from(0).unwrap(), Type::BOOLEAN);
        assert!(PageType::try_from(1).is_err());
    }

    #[test]
    fn test_enum_thrift_encoding_is_zig_zag() {
        let mut buf = Vec::new();
        let mut prot = ThriftCompactOutputProtocol::new(&mut buf);
        Type::BYTE_ARRAY.write_thrift(&mut prot).unwrap();
        let (val, len) = read_zig_zag(&buf);
        assert_eq!(val, 6);
        assert_eq!(len, buf.len());
    }

    #[test]
    fn test_compression_levels() {
        assert!(GzipLevel::try_new(10).is_err());
        assert_eq!(GzipLevel::try_new(9).unwrap().compression_level(), 9);
        assert!(ZstdLevel::try_new(0).is_err());
        assert!(ZstdLevel::try_new(23).is_err());
        assert_eq!(ZstdLevel::try_new(3).unwrap().compression_level(), 3);
    }
}

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

//! Page-body compression codecs.
//!
//! See [`Compression`] for the codecs this writer understands. Codecs are
//! created through [`create_codec`]; `UNCOMPRESSED` yields `None` and the
//! writer copies page bodies through untouched.

use crate::basic::Compression;
use crate::errors::Result;

/// A block compression codec for page bodies.
///
/// Codecs are `Send + Sync` so a writer owning one can cross into the sink's
/// drainer thread. `decompress` exists so the compressed output can be
/// verified against a reference decoder in tests; the writer itself only
/// compresses.
pub trait Codec: Send + Sync {
    /// Compresses all of `input` and appends the result to `output`.
    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()>;

    /// Decompresses all of `input`, appending to `output` and returning the
    /// number of bytes produced.
    fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize>;
}

/// Creates the codec for `compression`, or `None` for `UNCOMPRESSED`.
///
/// Returns an error when the requested codec was disabled at build time.
pub fn create_codec(compression: Compression) -> Result<Option<Box<dyn Codec>>> {
    match compression {
        Compression::UNCOMPRESSED => Ok(None),
        #[cfg(feature = "gzip")]
        Compression::GZIP(level) => Ok(Some(Box::new(GZipCodec::new(level)))),
        #[cfg(not(feature = "gzip"))]
        Compression::GZIP(_) => Err(compression_err!(
            "GZIP support requires the gzip feature"
        )),
        #[cfg(feature = "zstd")]
        Compression::ZSTD(level) => Ok(Some(Box::new(ZSTDCodec::new(level)))),
        #[cfg(not(feature = "zstd"))]
        Compression::ZSTD(_) => Err(compression_err!(
            "ZSTD support requires the zstd feature"
        )),
    }
}

#[cfg(feature = "gzip")]
mod gzip_codec {
    use std::io::{Read, Write};

    use flate2::{read::GzDecoder, write::GzEncoder, Compression as GzCompression};

    use super::Codec;
    use crate::basic::GzipLevel;
    use crate::errors::Result;

    /// Codec for GZIP compression, producing RFC 1952 members.
    pub struct GZipCodec {
        level: GzipLevel,
    }

    impl GZipCodec {
        pub(crate) fn new(level: GzipLevel) -> Self {
            Self { level }
        }
    }

    impl Codec for GZipCodec {
        fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
            let mut encoder = GzEncoder::new(output, GzCompression::new(self.level.compression_level()));
            encoder.write_all(input)?;
            encoder.try_finish()?;
            Ok(())
        }

        fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
            let mut decoder = GzDecoder::new(input);
            Ok(decoder.read_to_end(output)?)
        }
    }
}

#[cfg(feature = "gzip")]
pub use gzip_codec::GZipCodec;

#[cfg(feature = "zstd")]
mod zstd_codec {
    use std::io::Write;

    use super::Codec;
    use crate::basic::ZstdLevel;
    use crate::errors::Result;

    /// Codec for Zstandard compression.
    pub struct ZSTDCodec {
        level: ZstdLevel,
    }

    impl ZSTDCodec {
        pub(crate) fn new(level: ZstdLevel) -> Self {
            Self { level }
        }
    }

    impl Codec for ZSTDCodec {
        fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
            let mut encoder = zstd::Encoder::new(output, self.level.compression_level())
                .map_err(|e| compression_err!("zstd encoder: {}", e))?;
            encoder.write_all(input)?;
            encoder
                .finish()
                .map_err(|e| compression_err!("zstd finish: {}", e))?;
            Ok(())
        }

        fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
            let before = output.len();
            zstd::stream::copy_decode(input, &mut *output)
                .map_err(|e| compression_err!("zstd decode: {}", e))?;
            Ok(output.len() - before)
        }
    }
}

#[cfg(feature = "zstd")]
pub use zstd_codec::ZSTDCodec;

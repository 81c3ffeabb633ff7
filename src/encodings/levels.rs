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

//! Encoder for definition and repetition levels in v1 data pages.

use std::mem;

use crate::encodings::rle::RleEncoder;
use crate::util::bit_util::num_required_bits;

/// Encoder for a definition or repetition level stream.
///
/// Levels are RLE/bit-pack encoded, and the v1 data page framing prepends
/// the encoded byte length as a 4-byte little-endian integer.
pub struct LevelEncoder {
    encoder: RleEncoder,
}

impl LevelEncoder {
    /// Creates a level encoder for v1 data pages, reserving space for the
    /// length header.
    pub fn v1(max_level: u8, capacity: usize) -> Self {
        let bit_width = num_required_bits(max_level as u64);
        let mut buffer =
            Vec::with_capacity(RleEncoder::max_buffer_size(bit_width, capacity) + mem::size_of::<u32>());
        // reserve space for the length header, patched in consume
        buffer.extend_from_slice(&[0; 4]);
        Self {
            encoder: RleEncoder::new_from_buf(bit_width, buffer),
        }
    }

    /// Encodes a slice of levels.
    pub fn put(&mut self, levels: &[u8]) {
        for &level in levels {
            self.encoder.put(level as u64);
        }
    }

    /// Finalizes the stream and returns `[len: u32 LE][encoded bytes]`.
    pub fn consume(self) -> Vec<u8> {
        let mut encoded = self.encoder.consume();
        let encoded_len = encoded.len() - mem::size_of::<u32>();
        encoded[0..4].copy_from_slice(&(encoded_len as u32).to_le_bytes());
        encoded
    }
}

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

//! Run-length / bit-packing hybrid encoding, as used for definition and
//! repetition levels.
//!
//! The stream is a sequence of runs, each prefixed with a ULEB128 header:
//!
//! ```text
//! rle-run        := (repeat-count << 1) , value as ceil(bit_width / 8) LE bytes
//! bit-packed-run := (group-count << 1 | 1) , group-count * bit_width packed bytes
//! ```
//!
//! Runs of 8 or more identical values become RLE runs; everything else is
//! accumulated into bit-packed groups of 8 values, LSB first. The final
//! group is padded with zero values; decoders stop at the value count they
//! were told to expect.

use crate::util::bit_util::{ceil, BitWriter};

/// Encoder for the RLE/bit-packing hybrid.
///
/// Values are fed one at a time with [`put`](Self::put); [`consume`](Self::consume)
/// flushes trailing state and returns the encoded bytes.
pub struct RleEncoder {
    /// Bit width of each value; at most 8 for the level streams this crate
    /// writes, but kept general.
    bit_width: u8,
    /// Completed output runs.
    buffer: Vec<u8>,
    /// Values awaiting a full bit-packed group, always fewer than 8.
    pending: Vec<u64>,
    /// Packed groups of the current (unterminated) bit-packed run.
    packed: BitWriter,
    /// Number of 8-value groups in `packed`.
    packed_groups: usize,
    /// Value of the current run of identical values.
    current_value: u64,
    /// Length of the current run of identical values.
    repeat_count: usize,
}

impl RleEncoder {
    pub fn new(bit_width: u8, capacity: usize) -> Self {
        Self::new_from_buf(bit_width, Vec::with_capacity(capacity))
    }

    /// Creates an encoder appending to an existing buffer.
    pub fn new_from_buf(bit_width: u8, buffer: Vec<u8>) -> Self {
        assert!(bit_width <= 64, "bit width out of range: {bit_width}");
        Self {
            bit_width,
            buffer,
            pending: Vec::with_capacity(8),
            packed: BitWriter::new(64),
            packed_groups: 0,
            current_value: 0,
            repeat_count: 0,
        }
    }

    /// Conservative upper bound on the encoded size of `num_values` values.
    pub fn max_buffer_size(bit_width: u8, num_values: usize) -> usize {
        // worst case everything bit-packed: one group per 8 values plus one
        // maximal varint header
        ceil(num_values, 8) * bit_width as usize + 10
    }

    /// Buffers a single value.
    #[inline]
    pub fn put(&mut self, value: u64) {
        if self.repeat_count > 0 && value == self.current_value {
            self.repeat_count += 1;
            return;
        }
        self.end_run();
        self.current_value = value;
        self.repeat_count = 1;
    }

    /// Terminates the in-progress run of identical values, routing it to the
    /// RLE or bit-packed side.
    fn end_run(&mut self) {
        if self.repeat_count == 0 {
            return;
        }
        if !self.pending.is_empty() {
            // an unfinished group cannot precede an RLE run mid-stream, so
            // complete it from the head of this run first
            let take = (8 - self.pending.len()).min(self.repeat_count);
            for _ in 0..take {
                self.push_pending(self.current_value);
            }
            self.repeat_count -= take;
        }
        if self.repeat_count >= 8 {
            self.flush_bit_packed_run();
            self.write_rle_run();
        } else {
            for _ in 0..self.repeat_count {
                self.push_pending(self.current_value);
            }
        }
        self.repeat_count = 0;
    }

    #[inline]
    fn push_pending(&mut self, value: u64) {
        self.pending.push(value);
        if self.pending.len() == 8 {
            for v in self.pending.drain(..) {
                self.packed.put_value(v, self.bit_width as usize);
            }
            self.packed_groups += 1;
        }
    }

    /// Emits `current_value` repeated `repeat_count` times as an RLE run.
    fn write_rle_run(&mut self) {
        write_vlq(&mut self.buffer, (self.repeat_count as u64) << 1);
        let width = ceil(self.bit_width as usize, 8);
        self.buffer
            .extend_from_slice(&self.current_value.to_le_bytes()[..width]);
    }

    /// Emits the accumulated bit-packed groups, if any.
    fn flush_bit_packed_run(&mut self) {
        if self.packed_groups == 0 {
            return;
        }
        write_vlq(&mut self.buffer, (self.packed_groups as u64) << 1 | 1);
        let packed = std::mem::replace(&mut self.packed, BitWriter::new(64));
        self.buffer.extend_from_slice(&packed.consume());
        self.packed_groups = 0;
    }

    /// Flushes all buffered state into the output.
    pub fn flush(&mut self) {
        self.end_run();
        if !self.pending.is_empty() {
            // pad the trailing group; decoders read only the values they need
            while !self.pending.is_empty() {
                self.push_pending(0);
            }
        }
        self.flush_bit_packed_run();
    }

    /// Flushes and returns the encoded bytes.
    pub fn consume(mut self) -> Vec<u8> {
        self.flush();
        self.buffer
    }
}

fn write_vlq(buffer: &mut Vec<u8>, val: u64) {
    let mut v = val;
    while v > 0x7f {
        buffer.push(v as u8 | 0x80);
        v >>= 7;
    }
    buffer.push(v as u8);
}

/// Decoder counterpart used to validate that encoded streams round-trip.
#[cfg(test)]
pub(crate) struct RleDecoder<'a> {
    bit_width: u8,
    data: &'a [u8],
    pos: usize,
}

#[cfg(test)]
impl<'a> RleDecoder<'a> {
    pub(crate) fn new(bit_width: u8, data: &'a [u8]) -> Self {
        Self {
            bit_width,
            data,
            pos: 0,
        }
    }

    fn read_vlq(&mut self) -> u64 {
        let mut result = 0u64;
        let mut shift = 0;
        loop {
            let byte = self.data[self.pos];
            self.pos += 1;
            result |= ((byte & 0x7f) as u64) << shift;
            if byte & 0x80 == 0 {
                return result;
            }
            shift += 7;
        }
    }

    /// Decodes exactly `num_values` values.
    pub(crate) fn decode(&mut self, num_values: usize) -> Vec<u64> {
        let mut out = Vec::with_capacity(num_values);
        while out.len() < num_values {
            let header = self.read_vlq();
            if header & 1 == 0 {
                let count = (header >> 1) as usize;
                let width = ceil(self.bit_width as usize, 8);
                let mut value_bytes = [0u8; 8];
                value_bytes[..width].copy_from_slice(&self.data[self.pos..self.pos + width]);
                self.pos += width;
                let value = u64::from_le_bytes(value_bytes);
                for _ in 0..count.min(num_values - out.len()) {
                    out.push(value);
                }
            } else {
                let groups = (header >> 1) as usize;
                let num_bytes = groups * self.bit_width as usize;
                let bytes = &self.data[self.pos..self.pos + num_bytes];
                self.pos += num_bytes;
                for i in 0..groups * 8 {
                    if out.len() == num_values {
                        break;
                    }
                    let mut value = 0u64;
                    for bit in 0..self.bit_width as usize {
                        let abs_bit = i * self.bit_width as usize + bit;
                        if bytes[abs_bit / 8] >> (abs_bit % 8) & 1 == 1 {
                            value |= 1 << bit;
                        }
                    }
                    out.push(value);
                }
            }
        }
        out
    }
}

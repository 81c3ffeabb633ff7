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

//! File writing APIs and the on-disk framing constants.
//!
//! The overall layout of a written file is
//!
//! ```text
//! "PAR1"
//! row group 0: column chunk 0 | column chunk 1 | ...
//! row group 1: ...
//! FileMetaData (thrift compact)
//! little-endian u32 footer length
//! "PAR1"
//! ```

pub mod metadata;
pub mod properties;
pub mod writer;

/// Magic bytes at the start and end of every file.
pub const PARQUET_MAGIC: [u8; 4] = [b'P', b'A', b'R', b'1'];

/// Length of the fixed trailer: the footer length plus the closing magic.
pub const FOOTER_SIZE: usize = 8;

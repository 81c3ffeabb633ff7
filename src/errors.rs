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

//! Common errors and convenience macros.

use std::error::Error;
use std::{io, result};

/// Error enumeration for everything that can go wrong while encoding a file
/// or running a sink.
///
/// Variants group the failure modes a caller can meaningfully distinguish:
/// bad schemas, malformed column inputs, configuration mistakes, lifecycle
/// violations, size-limit overruns, codec failures, and everything the
/// operating system reports.
#[derive(Debug)]
pub enum ParquetFlowError {
    /// The schema handed to the writer is not usable: empty, a column with an
    /// empty name, a `FIXED_LEN_BYTE_ARRAY` without a positive length, and
    /// similar construction-time mistakes.
    Schema(String),
    /// A row-group input does not match the schema or its own invariants:
    /// column count or type mismatches, malformed offsets, inconsistent
    /// definition/repetition levels.
    Input(String),
    /// Sink or writer configuration is invalid, e.g. a ring capacity that is
    /// not a power of two or a zero row-group size.
    Config(String),
    /// The operation is not valid in the writer's or sink's current state.
    State(String),
    /// A size field would overflow what the file format can represent.
    TooLarge(String),
    /// The requested compression codec is recognized but not available in
    /// this build, or the codec itself failed.
    Compression(String),
    /// An external error, typically I/O.
    External(Box<dyn Error + Send + Sync>),
}

impl std::fmt::Display for ParquetFlowError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self {
            ParquetFlowError::Schema(message) => write!(fmt, "Invalid schema: {message}"),
            ParquetFlowError::Input(message) => write!(fmt, "Invalid input: {message}"),
            ParquetFlowError::Config(message) => write!(fmt, "Invalid configuration: {message}"),
            ParquetFlowError::State(message) => write!(fmt, "Invalid state: {message}"),
            ParquetFlowError::TooLarge(message) => write!(fmt, "Size limit exceeded: {message}"),
            ParquetFlowError::Compression(message) => write!(fmt, "Compression: {message}"),
            ParquetFlowError::External(e) => write!(fmt, "External: {e}"),
        }
    }
}

impl Error for ParquetFlowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ParquetFlowError::External(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for ParquetFlowError {
    fn from(e: io::Error) -> ParquetFlowError {
        ParquetFlowError::External(Box::new(e))
    }
}

/// A specialized `Result` for this crate's errors.
pub type Result<T, E = ParquetFlowError> = result::Result<T, E>;

// ----------------------------------------------------------------------
// Conversion from `ParquetFlowError` to other types of `Error`s

impl From<ParquetFlowError> for io::Error {
    fn from(e: ParquetFlowError) -> Self {
        io::Error::other(e)
    }
}

// ----------------------------------------------------------------------
// Convenient macros for different errors

macro_rules! schema_err {
    ($fmt:expr) => (crate::errors::ParquetFlowError::Schema($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (crate::errors::ParquetFlowError::Schema(format!($fmt, $($args),*)));
}

macro_rules! input_err {
    ($fmt:expr) => (crate::errors::ParquetFlowError::Input($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (crate::errors::ParquetFlowError::Input(format!($fmt, $($args),*)));
}

macro_rules! config_err {
    ($fmt:expr) => (crate::errors::ParquetFlowError::Config($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (crate::errors::ParquetFlowError::Config(format!($fmt, $($args),*)));
}

macro_rules! state_err {
    ($fmt:expr) => (crate::errors::ParquetFlowError::State($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (crate::errors::ParquetFlowError::State(format!($fmt, $($args),*)));
}

macro_rules! too_large_err {
    ($fmt:expr) => (crate::errors::ParquetFlowError::TooLarge($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (crate::errors::ParquetFlowError::TooLarge(format!($fmt, $($args),*)));
}

macro_rules! compression_err {
    ($fmt:expr) => (crate::errors::ParquetFlowError::Compression($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (crate::errors::ParquetFlowError::Compression(format!($fmt, $($args),*)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            schema_err!("empty schema").to_string(),
            "Invalid schema: empty schema"
        );
        assert_eq!(
            input_err!("expected {} columns, got {}", 2, 3).to_string(),
            "Invalid input: expected 2 columns, got 3"
        );
        assert_eq!(
            state_err!("writer is closed").to_string(),
            "Invalid state: writer is closed"
        );
    }

    #[test]
    fn test_io_error_source() {
        let err = ParquetFlowError::from(io::Error::other("disk on fire"));
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "External: disk on fire");
    }
}

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

//! Configuration for the file writer and the streaming sink.
//!
//! Both follow the builder idiom:
//!
//! ```
//! use parquet_flow::basic::Compression;
//! use parquet_flow::file::properties::WriterProperties;
//!
//! let props = WriterProperties::builder()
//!     .set_compression(Compression::GZIP(Default::default()))
//!     .build();
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::basic::Compression;
use crate::errors::Result;

/// Default `created_by` label written to file footers.
pub const DEFAULT_CREATED_BY: &str =
    concat!("parquet-flow version ", env!("CARGO_PKG_VERSION"));

/// Default ring capacity for sinks, in records.
pub const DEFAULT_RING_CAPACITY: usize = 1 << 20;

/// Default number of rows per flushed row group.
pub const DEFAULT_ROW_GROUP_ROWS: usize = 65_536;

/// Default time the drainer waits on an empty ring before flushing a
/// partial row group.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(100);

/// Reference-counted writer properties, shared with the worker thread.
pub type WriterPropertiesPtr = Arc<WriterProperties>;

/// Immutable properties of a file writer.
#[derive(Debug, Clone)]
pub struct WriterProperties {
    compression: Compression,
    created_by: String,
}

impl Default for WriterProperties {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl WriterProperties {
    /// Returns a default builder.
    pub fn builder() -> WriterPropertiesBuilder {
        WriterPropertiesBuilder::default()
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }
}

/// Builder for [`WriterProperties`].
pub struct WriterPropertiesBuilder {
    compression: Compression,
    created_by: String,
}

impl Default for WriterPropertiesBuilder {
    fn default() -> Self {
        Self {
            compression: Compression::UNCOMPRESSED,
            created_by: DEFAULT_CREATED_BY.to_string(),
        }
    }
}

impl WriterPropertiesBuilder {
    /// Sets the page-body compression codec.
    pub fn set_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Sets the `created_by` label recorded in the footer.
    pub fn set_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = created_by.into();
        self
    }

    /// Finalizes the properties.
    pub fn build(self) -> WriterProperties {
        WriterProperties {
            compression: self.compression,
            created_by: self.created_by,
        }
    }
}

/// Immutable properties of a streaming sink.
#[derive(Debug, Clone)]
pub struct SinkProperties {
    ring_capacity: usize,
    row_group_rows: usize,
    idle_timeout: Duration,
}

impl Default for SinkProperties {
    fn default() -> Self {
        Self::builder().build().expect("defaults are valid")
    }
}

impl SinkProperties {
    /// Returns a default builder.
    pub fn builder() -> SinkPropertiesBuilder {
        SinkPropertiesBuilder::default()
    }

    pub fn ring_capacity(&self) -> usize {
        self.ring_capacity
    }

    pub fn row_group_rows(&self) -> usize {
        self.row_group_rows
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }
}

/// Builder for [`SinkProperties`].
pub struct SinkPropertiesBuilder {
    ring_capacity: usize,
    row_group_rows: usize,
    idle_timeout: Duration,
}

impl Default for SinkPropertiesBuilder {
    fn default() -> Self {
        Self {
            ring_capacity: DEFAULT_RING_CAPACITY,
            row_group_rows: DEFAULT_ROW_GROUP_ROWS,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl SinkPropertiesBuilder {
    /// Sets the ring capacity in records. Must be a power of two.
    pub fn set_ring_capacity(mut self, ring_capacity: usize) -> Self {
        self.ring_capacity = ring_capacity;
        self
    }

    /// Sets the number of accumulated rows that triggers a row-group flush.
    pub fn set_row_group_rows(mut self, row_group_rows: usize) -> Self {
        self.row_group_rows = row_group_rows;
        self
    }

    /// Sets how long the drainer idles on an empty ring before flushing a
    /// partial row group.
    pub fn set_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Validates and finalizes the properties.
    pub fn build(self) -> Result<SinkProperties> {
        if self.ring_capacity < 2 || !self.ring_capacity.is_power_of_two() {
            return Err(config_err!(
                "ring capacity must be a power of two of at least 2, got {}",
                self.ring_capacity
            ));
        }
        if self.row_group_rows == 0 {
            return Err(config_err!("row group size must be at least one row"));
        }
        if self.row_group_rows > i32::MAX as usize {
            return Err(config_err!(
                "row group size {} exceeds the format's row limit",
                self.row_group_rows
            ));
        }
        Ok(SinkProperties {
            ring_capacity: self.ring_capacity,
            row_group_rows: self.row_group_rows,
            idle_timeout: self.idle_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_defaults() {
        let props = WriterProperties::default();
        assert_eq!(props.compression(), Compression::UNCOMPRESSED);
        assert!(props.created_by().starts_with("parquet-flow version"));
    }

    #[test]
    fn test_sink_defaults() {
        let props = SinkProperties::default();
        assert_eq!(props.ring_capacity(), DEFAULT_RING_CAPACITY);
        assert_eq!(props.row_group_rows(), DEFAULT_ROW_GROUP_ROWS);
        assert_eq!(props.idle_timeout(), DEFAULT_IDLE_TIMEOUT);
    }

    #[test]
    fn test_ring_capacity_must_be_power_of_two() {
        assert!(SinkProperties::builder()
            .set_ring_capacity(1000)
            .build()
            .is_err());
        assert!(SinkProperties::builder().set_ring_capacity(1).build().is_err());
        assert!(SinkProperties::builder()
            .set_ring_capacity(1024)
            .build()
            .is_ok());
    }

    #[test]
    fn test_row_group_rows_must_be_positive() {
        assert!(SinkProperties::builder()
            .set_row_group_rows(0)
            .build()
            .is_err());
    }
}

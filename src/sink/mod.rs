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

//! Non-blocking log sink.
//!
//! A [`LogSink`] couples a wait-free ring with a background drainer thread
//! that batches records into row groups and feeds the file writer:
//!
//! ```text
//! producer ──try_record──▶ [SPSC ring] ──drain──▶ accumulator ──flush──▶ writer
//! ```
//!
//! [`try_record`](LogSink::try_record) copies the record into a ring slot
//! and returns; it never blocks, never allocates, and never takes a lock.
//! When the ring is full the record is dropped and counted. The drainer
//! flushes a row group whenever `row_group_rows` rows have accumulated,
//! when the ring has been idle for the configured timeout, and at shutdown.

pub mod accumulator;

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use tracing::{debug, error, warn};

use crate::errors::{ParquetFlowError, Result};
use crate::file::properties::SinkProperties;
use crate::file::writer::SerializedFileWriter;
use crate::ring::RingBuffer;
use crate::sink::accumulator::BatchAccumulator;

/// State shared between the producer-facing handle and the drainer.
struct SinkShared {
    ring: RingBuffer,
    /// Gate for `try_record`; cleared before the drainer is asked to stop.
    accepting: AtomicBool,
    /// Tells the drainer to finish up and exit.
    stop: AtomicBool,
    /// Set while the drainer is parked on the condvar, so producers only
    /// pay for a notification when somebody is listening.
    sleeping: AtomicBool,
    dropped: AtomicU64,
    entries_written: AtomicU64,
    files_written: AtomicU64,
    /// First error the worker hit; read back by `shutdown`.
    error: Mutex<Option<ParquetFlowError>>,
    signal: Mutex<()>,
    condvar: Condvar,
}

impl SinkShared {
    fn capture_error(&self, e: ParquetFlowError) {
        error!(error = %e, "sink worker failed, discarding further records");
        let mut slot = self.error.lock().unwrap();
        if slot.is_none() {
            *slot = Some(e);
        }
    }
}

enum SinkState<W: Write + Send + 'static> {
    /// Writer and accumulator waiting for `start` to hand them to the
    /// drainer thread.
    Created {
        writer: SerializedFileWriter<W>,
        accumulator: BatchAccumulator,
    },
    Running {
        worker: JoinHandle<()>,
    },
    Stopped,
}

/// A non-blocking sink writing fixed-size records to one file.
///
/// Exactly one producer thread may call [`try_record`](Self::try_record) at
/// a time, concurrently with the internal drainer. All lifecycle calls
/// (`start`, `shutdown`) belong to the owning thread.
pub struct LogSink<W: Write + Send + 'static> {
    shared: Arc<SinkShared>,
    props: SinkProperties,
    state: SinkState<W>,
    record_size: usize,
}

impl<W: Write + Send + 'static> LogSink<W> {
    /// Creates a sink draining into `writer`.
    ///
    /// The record layout (and with it the expected payload size) is derived
    /// from the writer's schema; see the
    /// [accumulator docs](crate::sink::accumulator) for the record format.
    pub fn try_new(writer: SerializedFileWriter<W>, props: SinkProperties) -> Result<Self> {
        let accumulator = BatchAccumulator::try_new(writer.schema_descr())?;
        let record_size = accumulator.layout().record_size();
        let ring = RingBuffer::new(props.ring_capacity(), record_size)?;
        let shared = Arc::new(SinkShared {
            ring,
            accepting: AtomicBool::new(false),
            stop: AtomicBool::new(false),
            sleeping: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
            entries_written: AtomicU64::new(0),
            files_written: AtomicU64::new(0),
            error: Mutex::new(None),
            signal: Mutex::new(()),
            condvar: Condvar::new(),
        });
        Ok(Self {
            shared,
            props,
            state: SinkState::Created {
                writer,
                accumulator,
            },
            record_size,
        })
    }

    /// The exact payload size `try_record` accepts.
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Spawns the drainer thread and starts accepting records.
    pub fn start(&mut self) -> Result<()> {
        if !matches!(self.state, SinkState::Created { .. }) {
            return Err(state_err!("the sink is already started or stopped"));
        }
        let SinkState::Created {
            writer,
            accumulator,
        } = std::mem::replace(&mut self.state, SinkState::Stopped)
        else {
            unreachable!()
        };

        let shared = Arc::clone(&self.shared);
        let props = self.props.clone();
        let worker = std::thread::Builder::new()
            .name("parquet-flow-drain".to_string())
            .spawn(move || run_drainer(shared, props, writer, accumulator))
            .map_err(|e| ParquetFlowError::External(Box::new(e)))?;
        self.shared.accepting.store(true, Ordering::Release);
        self.state = SinkState::Running { worker };
        Ok(())
    }

    /// Attempts to enqueue one record. Never blocks.
    ///
    /// Returns `false`, incrementing the drop counter, when the payload size
    /// is wrong, the sink is not running, or the ring is full.
    pub fn try_record(&self, payload: &[u8]) -> bool {
        if payload.is_empty()
            || payload.len() != self.record_size
            || !self.shared.accepting.load(Ordering::Acquire)
            || !self.shared.ring.try_push(payload)
        {
            self.shared.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        if self.shared.sleeping.load(Ordering::Relaxed) {
            self.shared.condvar.notify_one();
        }
        true
    }

    /// Number of records dropped so far. Monotonic.
    pub fn dropped_count(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Number of records flushed into row groups so far.
    pub fn entries_written(&self) -> u64 {
        self.shared.entries_written.load(Ordering::Relaxed)
    }

    /// Number of completely written files: 0 before a successful shutdown,
    /// 1 after.
    pub fn files_written(&self) -> u64 {
        self.shared.files_written.load(Ordering::Relaxed)
    }

    /// Stops accepting records, drains the ring, flushes residual rows,
    /// closes the writer, and joins the drainer.
    ///
    /// Returns the first error the worker captured, if any. Idempotent.
    pub fn shutdown(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, SinkState::Stopped) {
            SinkState::Created { mut writer, .. } => {
                // never started: just finalize the (empty) file
                writer.finish()?;
                self.shared.files_written.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            SinkState::Running { worker } => {
                self.shared.accepting.store(false, Ordering::Release);
                self.shared.stop.store(true, Ordering::Release);
                self.shared.condvar.notify_one();
                worker
                    .join()
                    .map_err(|_| state_err!("the drainer thread panicked"))?;
                let dropped = self.dropped_count();
                if dropped > 0 {
                    warn!(dropped, "sink dropped records");
                }
                self.shared.error.lock().unwrap().take().map_or(Ok(()), Err)
            }
            SinkState::Stopped => Ok(()),
        }
    }
}

/// The drainer loop: drain, accumulate, flush on thresholds, idle on the
/// condvar, and finish the file on shutdown.
fn run_drainer<W: Write + Send + 'static>(
    shared: Arc<SinkShared>,
    props: SinkProperties,
    mut writer: SerializedFileWriter<W>,
    mut accumulator: BatchAccumulator,
) {
    let row_group_rows = props.row_group_rows();
    let mut failed = false;

    loop {
        let drained = drain_into(&shared, &mut accumulator, row_group_rows, &mut failed);
        if accumulator.row_count() >= row_group_rows {
            flush(&shared, &mut writer, &mut accumulator, &mut failed);
        }
        if drained > 0 {
            continue;
        }
        if shared.stop.load(Ordering::Acquire) {
            break;
        }

        // idle: park until a producer signals or the timeout elapses
        let guard = shared.signal.lock().unwrap();
        shared.sleeping.store(true, Ordering::Release);
        if shared.ring.is_empty() && !shared.stop.load(Ordering::Acquire) {
            let (guard, timeout) = shared
                .condvar
                .wait_timeout(guard, props.idle_timeout())
                .unwrap();
            drop(guard);
            if timeout.timed_out() && accumulator.row_count() > 0 {
                // nobody is feeding us; persist the partial batch
                flush(&shared, &mut writer, &mut accumulator, &mut failed);
            }
        } else {
            drop(guard);
        }
        shared.sleeping.store(false, Ordering::Release);
    }

    // stop requested: drain whatever is left, then flush the residue
    loop {
        let drained = drain_into(&shared, &mut accumulator, row_group_rows, &mut failed);
        if accumulator.row_count() >= row_group_rows {
            flush(&shared, &mut writer, &mut accumulator, &mut failed);
        }
        if drained == 0 && shared.ring.is_empty() {
            break;
        }
    }
    if accumulator.row_count() > 0 {
        flush(&shared, &mut writer, &mut accumulator, &mut failed);
    }

    match writer.finish() {
        Ok(()) => {
            if !failed {
                shared.files_written.fetch_add(1, Ordering::Relaxed);
            }
        }
        Err(e) => shared.capture_error(e),
    }
}

/// Drains up to the row-group boundary so flushed groups have exactly
/// `row_group_rows` rows. After a failure records are drained and discarded
/// so the producer side keeps its drop-free fast path.
fn drain_into(
    shared: &SinkShared,
    accumulator: &mut BatchAccumulator,
    row_group_rows: usize,
    failed: &mut bool,
) -> usize {
    let want = row_group_rows - accumulator.row_count();
    let mut append_error = None;
    let drained = shared.ring.drain(want, |record| {
        if *failed || append_error.is_some() {
            return;
        }
        if let Err(e) = accumulator.append(record) {
            append_error = Some(e);
        }
    });
    if let Some(e) = append_error {
        shared.capture_error(e);
        *failed = true;
    }
    drained
}

fn flush<W: Write + Send + 'static>(
    shared: &SinkShared,
    writer: &mut SerializedFileWriter<W>,
    accumulator: &mut BatchAccumulator,
    failed: &mut bool,
) {
    let rows = accumulator.row_count();
    if *failed || rows == 0 {
        accumulator.reset();
        return;
    }
    let (columns, levels) = accumulator.batch();
    match writer.write_row_group(rows, &columns, levels.as_deref()) {
        Ok(()) => {
            shared.entries_written.fetch_add(rows as u64, Ordering::Relaxed);
            debug!(rows, "flushed row group");
        }
        Err(e) => {
            shared.capture_error(e);
            *failed = true;
        }
    }
    accumulator.reset();
}

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

//! Wait-free single-producer / single-consumer ring buffer of fixed-size
//! record slots.
//!
//! The head and tail indices are monotonically increasing counters, masked
//! only when indexing into storage; the `head - tail` occupancy computation
//! relies on unsigned wrap-around and would break if the stored counters
//! were pre-masked. Each index lives on its own cache line so the producer
//! and consumer do not false-share.
//!
//! # Safety contract
//!
//! Exactly one thread may call [`try_push`](RingBuffer::try_push) and
//! exactly one thread may call [`try_pop_with`](RingBuffer::try_pop_with) /
//! [`drain`](RingBuffer::drain) concurrently. The sink enforces this by
//! construction; the type is `Sync` only under that discipline.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

use crate::errors::Result;

/// SPSC ring of `capacity` slots of `slot_size` bytes each.
///
/// All storage is allocated at construction; `try_push` and `drain` never
/// allocate, block, or spin.
pub struct RingBuffer {
    mask: u64,
    capacity: u64,
    slot_size: usize,
    /// Payload length per slot.
    lens: Box<[UnsafeCell<u32>]>,
    /// `capacity * slot_size` bytes of record storage.
    slots: Box<[UnsafeCell<u8>]>,
    /// Next slot the producer will write. Only the producer stores it.
    head: CachePadded<AtomicU64>,
    /// Next slot the consumer will read. Only the consumer stores it.
    tail: CachePadded<AtomicU64>,
}

// Safety: slots are handed off between the producer and consumer through the
// release/acquire pairs on head and tail; a slot is never written while the
// consumer can read it and vice versa.
unsafe impl Send for RingBuffer {}
unsafe impl Sync for RingBuffer {}

impl RingBuffer {
    /// Creates a ring with `capacity` slots (a power of two) holding up to
    /// `slot_size` bytes each.
    pub fn new(capacity: usize, slot_size: usize) -> Result<Self> {
        if capacity < 2 || !capacity.is_power_of_two() {
            return Err(config_err!(
                "ring capacity must be a power of two of at least 2, got {}",
                capacity
            ));
        }
        if slot_size == 0 {
            return Err(config_err!("ring slot size must not be zero"));
        }
        let lens = (0..capacity).map(|_| UnsafeCell::new(0)).collect();
        let slots = (0..capacity * slot_size).map(|_| UnsafeCell::new(0)).collect();
        Ok(Self {
            mask: capacity as u64 - 1,
            capacity: capacity as u64,
            slot_size,
            lens,
            slots,
            head: CachePadded::new(AtomicU64::new(0)),
            tail: CachePadded::new(AtomicU64::new(0)),
        })
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Maximum payload bytes per record.
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    #[inline]
    fn slot_ptr(&self, index: u64) -> *mut u8 {
        let offset = (index & self.mask) as usize * self.slot_size;
        self.slots[offset].get()
    }

    /// Copies `payload` into the next free slot. Returns `false` without
    /// side effects when the ring is full.
    ///
    /// Wait-free; must only be called from the producer thread.
    #[inline]
    pub fn try_push(&self, payload: &[u8]) -> bool {
        debug_assert!(payload.len() <= self.slot_size);
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if head.wrapping_sub(tail) >= self.capacity {
            return false;
        }
        // Safety: head < tail + capacity, so this slot has been consumed (or
        // never written) and the consumer cannot touch it until the release
        // store below publishes it.
        unsafe {
            std::ptr::copy_nonoverlapping(payload.as_ptr(), self.slot_ptr(head), payload.len());
            *self.lens[(head & self.mask) as usize].get() = payload.len() as u32;
        }
        self.head.store(head.wrapping_add(1), Ordering::Release);
        true
    }

    /// Pops a single record, passing its bytes to `f`.
    ///
    /// Wait-free; must only be called from the consumer thread.
    pub fn try_pop_with<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&[u8]) -> R,
    {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        if head == tail {
            return None;
        }
        let result = f(unsafe { self.slot_bytes(tail) });
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        Some(result)
    }

    /// Reads up to `max` records in one pass, invoking `f` for each, and
    /// publishes the new tail with a single release store.
    ///
    /// Returns the number of records consumed. Must only be called from the
    /// consumer thread.
    pub fn drain<F>(&self, max: usize, mut f: F) -> usize
    where
        F: FnMut(&[u8]),
    {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        let available = head.wrapping_sub(tail);
        let count = available.min(max as u64);
        for i in 0..count {
            f(unsafe { self.slot_bytes(tail.wrapping_add(i)) });
        }
        if count > 0 {
            self.tail.store(tail.wrapping_add(count), Ordering::Release);
        }
        count as usize
    }

    /// Number of unread records. Observational only: the value may be stale
    /// by the time the caller looks at it.
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        head.wrapping_sub(tail) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Safety: `index` must address a slot published by the producer and not
    /// yet released back to it.
    #[inline]
    unsafe fn slot_bytes(&self, index: u64) -> &[u8] {
        let len = *self.lens[(index & self.mask) as usize].get() as usize;
        std::slice::from_raw_parts(self.slot_ptr(index), len)
    }
}

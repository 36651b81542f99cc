// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounded single-producer single-consumer row buffer.
//!
//! A [`RowSet`] connects one producer step copy to one consumer step copy.
//! `put` waits while the buffer is full, `get` waits while it is empty, which
//! is what gives a graph its back-pressure. Once the producer marks the rowset
//! done and the consumer has drained it, every `get` reports end of stream.
//!
//! Either side may flag the rowset as errored. That discards the buffered rows
//! and wakes both sides, which then see [`RowSetError::Aborted`].
//!
//! Wake-ups go through `tokio::sync::Notify` with `notify_one`, whose stored
//! permit means a signal sent between a failed check and the wait is never
//! lost. The "readable" signal may be shared by every input rowset of one
//! consumer copy, so that a consumer merging several inputs can wait on all of
//! them at once; spurious wake-ups only cost a re-check.

use crate::errors::RowSetError;
use crate::model::Record;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Result of a non-blocking read.
#[derive(Debug)]
pub enum TryGet {
    Row(Record),
    /// Nothing buffered yet, but the producer is not done.
    Empty,
    /// Producer is done and the buffer is drained.
    Done,
}

#[derive(Debug, Default)]
struct State {
    queue: VecDeque<Record>,
    done: bool,
    errored: bool,
}

#[derive(Debug)]
struct Shared {
    name: String,
    capacity: usize,
    state: Mutex<State>,
    readable: Arc<Notify>,
    writable: Notify,
}

/// Cloneable handle to one bounded row channel.
#[derive(Debug, Clone)]
pub struct RowSet {
    shared: Arc<Shared>,
}

impl RowSet {
    /// Rowset with its own readable signal. A capacity of 0 is raised to 1.
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self::with_reader_signal(name, capacity, Arc::new(Notify::new()))
    }

    /// Rowset that signals `readable` whenever rows arrive or its state changes.
    pub fn with_reader_signal(
        name: impl Into<String>,
        capacity: usize,
        readable: Arc<Notify>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                capacity: capacity.max(1),
                state: Mutex::new(State::default()),
                readable,
                writable: Notify::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    pub fn is_done(&self) -> bool {
        self.lock().done
    }

    pub fn is_errored(&self) -> bool {
        self.lock().errored
    }

    /// Append a record, waiting while the buffer is full.
    pub async fn put(&self, record: Record) -> Result<(), RowSetError> {
        loop {
            {
                let mut state = self.lock();
                if state.errored {
                    return Err(RowSetError::Aborted(self.shared.name.clone()));
                }
                if state.done {
                    return Err(RowSetError::Closed(self.shared.name.clone()));
                }
                if state.queue.len() < self.shared.capacity {
                    state.queue.push_back(record);
                    drop(state);
                    self.shared.readable.notify_one();
                    return Ok(());
                }
            }
            self.shared.writable.notified().await;
        }
    }

    /// Take the oldest record, waiting while the buffer is empty.
    ///
    /// `Ok(None)` is end of stream, returned for every call once the producer
    /// is done and the buffer is drained.
    pub async fn get(&self) -> Result<Option<Record>, RowSetError> {
        loop {
            match self.try_get()? {
                TryGet::Row(record) => return Ok(Some(record)),
                TryGet::Done => return Ok(None),
                TryGet::Empty => {}
            }
            self.shared.readable.notified().await;
        }
    }

    pub fn try_get(&self) -> Result<TryGet, RowSetError> {
        let mut state = self.lock();
        if state.errored {
            return Err(RowSetError::Aborted(self.shared.name.clone()));
        }
        match state.queue.pop_front() {
            Some(record) => {
                drop(state);
                self.shared.writable.notify_one();
                Ok(TryGet::Row(record))
            }
            None if state.done => Ok(TryGet::Done),
            None => Ok(TryGet::Empty),
        }
    }

    /// Producer side: no more rows will be put. Idempotent.
    pub fn mark_done(&self) {
        self.lock().done = true;
        self.shared.readable.notify_one();
    }

    /// Abort the rowset from either side. Idempotent; wakes both sides.
    pub fn set_errored(&self) {
        {
            let mut state = self.lock();
            state.errored = true;
            state.queue.clear();
        }
        self.shared.readable.notify_one();
        self.shared.writable.notify_one();
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDescriptor, Row, RowSchema, SchemaRef, Value, ValueType};
    use std::time::Duration;
    use tokio::time::timeout;

    fn schema() -> SchemaRef {
        RowSchema::new(vec![FieldDescriptor::new("n", ValueType::Integer)])
            .unwrap()
            .into_ref()
    }

    fn record(schema: &SchemaRef, n: i64) -> Record {
        Record::new(schema.clone(), Row::from(vec![Value::Integer(n)]))
    }

    fn value_of(record: &Record) -> i64 {
        record.row.get(0).and_then(Value::as_i64).unwrap()
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let schema = schema();
        let rowset = RowSet::new("a.0 -> b.0", 10);
        for n in 0..5 {
            rowset.put(record(&schema, n)).await.unwrap();
        }
        rowset.mark_done();

        let mut seen = Vec::new();
        while let Some(record) = rowset.get().await.unwrap() {
            seen.push(value_of(&record));
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_end_of_stream_is_idempotent() {
        let rowset = RowSet::new("r", 1);
        rowset.mark_done();
        rowset.mark_done();
        for _ in 0..3 {
            assert!(rowset.get().await.unwrap().is_none());
        }
        assert!(matches!(rowset.try_get().unwrap(), TryGet::Done));
    }

    #[tokio::test]
    async fn test_put_blocks_when_full_until_get() {
        let schema = schema();
        let rowset = RowSet::new("r", 2);
        rowset.put(record(&schema, 1)).await.unwrap();
        rowset.put(record(&schema, 2)).await.unwrap();
        assert_eq!(rowset.len(), 2);

        let blocked = timeout(Duration::from_millis(50), rowset.put(record(&schema, 3))).await;
        assert!(blocked.is_err(), "put on a full rowset should wait");
        assert_eq!(rowset.len(), 2);

        let producer = {
            let rowset = rowset.clone();
            let schema = schema.clone();
            tokio::spawn(async move { rowset.put(record(&schema, 3)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(value_of(&rowset.get().await.unwrap().unwrap()), 1);

        producer.await.unwrap().unwrap();
        assert_eq!(rowset.len(), 2);
    }

    #[tokio::test]
    async fn test_get_waits_for_rows() {
        let schema = schema();
        let rowset = RowSet::new("r", 4);
        let consumer = {
            let rowset = rowset.clone();
            tokio::spawn(async move { rowset.get().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        rowset.put(record(&schema, 9)).await.unwrap();

        let got = consumer.await.unwrap().unwrap().unwrap();
        assert_eq!(value_of(&got), 9);
    }

    #[tokio::test]
    async fn test_set_errored_wakes_blocked_consumer_and_producer() {
        let schema = schema();
        let empty = RowSet::new("empty", 1);
        let full = RowSet::new("full", 1);
        full.put(record(&schema, 1)).await.unwrap();

        let consumer = {
            let rowset = empty.clone();
            tokio::spawn(async move { rowset.get().await })
        };
        let producer = {
            let rowset = full.clone();
            let schema = schema.clone();
            tokio::spawn(async move { rowset.put(record(&schema, 2)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        empty.set_errored();
        full.set_errored();
        full.set_errored();

        assert!(matches!(consumer.await.unwrap(), Err(RowSetError::Aborted(_))));
        assert!(matches!(producer.await.unwrap(), Err(RowSetError::Aborted(_))));
        assert!(full.is_errored());
        assert_eq!(full.len(), 0);
    }

    #[tokio::test]
    async fn test_put_after_done_is_closed() {
        let rowset = RowSet::new("r", 1);
        rowset.mark_done();
        let result = rowset.put(record(&schema(), 1)).await;
        assert_eq!(result.unwrap_err(), RowSetError::Closed("r".to_string()));
    }

    #[tokio::test]
    async fn test_zero_capacity_is_raised_to_one() {
        let rowset = RowSet::new("r", 0);
        assert_eq!(rowset.capacity(), 1);
        rowset.put(record(&schema(), 1)).await.unwrap();
        assert!(matches!(rowset.try_get().unwrap(), TryGet::Row(_)));
        assert!(matches!(rowset.try_get().unwrap(), TryGet::Empty));
    }

    #[tokio::test]
    async fn test_shared_reader_signal_wakes_on_any_input() {
        let schema = schema();
        let signal = Arc::new(Notify::new());
        let first = RowSet::with_reader_signal("first", 1, signal.clone());
        let second = RowSet::with_reader_signal("second", 1, signal.clone());

        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.notified().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        second.put(record(&schema, 1)).await.unwrap();

        timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert!(first.is_empty());
        assert!(!second.is_empty());
    }
}

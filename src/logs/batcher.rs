//! Size- and time-triggered log batching with requeue on failure.
//!
//! ```text
//! push ──▶ buffer (VecDeque, capped) ──fills batch_size───▶ wake flusher
//!                 ▲                                              │
//!                 │ requeue at front on failure                  ▼
//!                 └──────────── flush: take batch ─▶ OTLP/JSON ─▶ POST /v1/logs
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, Notify};
use tokio::time::{self, MissedTickBehavior};

use crate::config::LogBatchConfig;
use crate::logs::exporter::{ExportError, OtlpLogExporter};
use crate::logs::payload::{build_payload, ResourceInfo};
use crate::logs::record::LogRecord;
use crate::observability::metrics;

/// Bounded FIFO of pending records. Drops the oldest when full.
#[derive(Debug)]
pub(crate) struct LogBuffer {
    records: VecDeque<LogRecord>,
    capacity: usize,
}

impl LogBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append a record, returning how many old records were evicted.
    pub(crate) fn push(&mut self, record: LogRecord) -> usize {
        let mut dropped = 0;
        while self.records.len() >= self.capacity {
            self.records.pop_front();
            dropped += 1;
        }
        self.records.push_back(record);
        dropped
    }

    /// Remove up to `max` records from the front.
    pub(crate) fn take_batch(&mut self, max: usize) -> Vec<LogRecord> {
        let n = max.min(self.records.len());
        self.records.drain(..n).collect()
    }

    /// Put a failed batch back at the front in its original order.
    ///
    /// Records pushed since the batch was taken keep their place; the oldest
    /// records of the batch are dropped if there is not enough room.
    pub(crate) fn requeue(&mut self, batch: Vec<LogRecord>) -> usize {
        let room = self.capacity.saturating_sub(self.records.len());
        let dropped = batch.len().saturating_sub(room);
        for record in batch.into_iter().skip(dropped).rev() {
            self.records.push_front(record);
        }
        dropped
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}

/// Point-in-time exporter counters.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BatchStats {
    pub buffered: usize,
    pub exported: u64,
    pub dropped: u64,
    pub failed_exports: u64,
    pub last_error: Option<String>,
    pub endpoint: String,
}

/// Buffers application logs and ships them to the ingest endpoint.
pub struct LogBatcher {
    buffer: Mutex<LogBuffer>,
    config: LogBatchConfig,
    resource: ResourceInfo,
    exporter: OtlpLogExporter,
    flush_lock: tokio::sync::Mutex<()>,
    wake: Notify,
    exported: AtomicU64,
    dropped: AtomicU64,
    failed_exports: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl LogBatcher {
    pub fn new(config: LogBatchConfig, resource: ResourceInfo, exporter: OtlpLogExporter) -> Self {
        Self {
            buffer: Mutex::new(LogBuffer::new(config.max_buffer_size)),
            config,
            resource,
            exporter,
            flush_lock: tokio::sync::Mutex::new(()),
            wake: Notify::new(),
            exported: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            failed_exports: AtomicU64::new(0),
            last_error: Mutex::new(None),
        }
    }

    fn lock_buffer(&self) -> MutexGuard<'_, LogBuffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a record. Wakes the flusher when the buffer reaches a full batch.
    ///
    /// Only the transition wakes it: a buffer left above `batch_size` by a
    /// failed export is retried on the interval, not on every push.
    pub fn push(&self, record: LogRecord) {
        let (dropped, before, len) = {
            let mut buffer = self.lock_buffer();
            let before = buffer.len();
            let dropped = buffer.push(record);
            (dropped, before, buffer.len())
        };

        if dropped > 0 {
            self.dropped.fetch_add(dropped as u64, Ordering::Relaxed);
            metrics::record_logs_dropped(dropped);
        }
        metrics::record_log_buffer_size(len);

        if before < self.config.batch_size && len >= self.config.batch_size {
            self.wake.notify_one();
        }
    }

    /// Export everything currently buffered, one batch at a time.
    ///
    /// Stops at the first failed batch, which goes back to the front of the
    /// buffer. Returns the number of records exported.
    pub async fn flush(&self) -> Result<usize, ExportError> {
        let _flushing = self.flush_lock.lock().await;
        let mut exported = 0;

        loop {
            let batch = self.lock_buffer().take_batch(self.config.batch_size);
            if batch.is_empty() {
                break;
            }

            let payload = build_payload(&self.resource, &self.config.scope_name, &batch);
            match self.exporter.export(&payload).await {
                Ok(()) => {
                    exported += batch.len();
                    self.exported.fetch_add(batch.len() as u64, Ordering::Relaxed);
                    metrics::record_logs_exported(batch.len());
                    tracing::debug!(count = batch.len(), "Exported log batch");
                }
                Err(e) => {
                    let batch_len = batch.len();
                    let (dropped, len) = {
                        let mut buffer = self.lock_buffer();
                        let dropped = buffer.requeue(batch);
                        (dropped, buffer.len())
                    };
                    if dropped > 0 {
                        self.dropped.fetch_add(dropped as u64, Ordering::Relaxed);
                        metrics::record_logs_dropped(dropped);
                    }
                    self.failed_exports.fetch_add(1, Ordering::Relaxed);
                    metrics::record_log_export_failure();
                    metrics::record_log_buffer_size(len);
                    *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(e.to_string());

                    tracing::warn!(
                        error = %e,
                        batch = batch_len,
                        requeued = batch_len - dropped,
                        dropped,
                        "Log export failed, batch requeued"
                    );
                    return Err(e);
                }
            }
        }

        metrics::record_log_buffer_size(self.lock_buffer().len());
        Ok(exported)
    }

    /// Background flusher: periodic, on full batch, and once on shutdown.
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let interval = Duration::from_millis(self.config.flush_interval_ms);
        let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            endpoint = %self.exporter.url(),
            batch_size = self.config.batch_size,
            flush_interval_ms = self.config.flush_interval_ms,
            max_buffer_size = self.config.max_buffer_size,
            "Log batcher starting"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let _ = self.flush().await;
                }
                _ = self.wake.notified() => {
                    let _ = self.flush().await;
                }
                _ = shutdown.recv() => {
                    match self.flush().await {
                        Ok(count) => tracing::info!(count, "Final log flush complete"),
                        Err(e) => tracing::error!(
                            error = %e,
                            remaining = self.lock_buffer().len(),
                            "Final log flush failed, logs lost"
                        ),
                    }
                    break;
                }
            }
        }
    }

    pub fn stats(&self) -> BatchStats {
        BatchStats {
            buffered: self.lock_buffer().len(),
            exported: self.exported.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            failed_exports: self.failed_exports.load(Ordering::Relaxed),
            last_error: self
                .last_error
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            endpoint: self.exporter.url().to_string(),
        }
    }
}

//! Record writers.
//!
//! Two ways to put records on a transport:
//!
//! - [`RecordWriter`] owns the write half and writes one record per call. The
//!   returned future completes once the frame has been written and flushed, and
//!   a transport failure comes back as [`FcgiError::TransportWrite`].
//! - [`spawn_writer_task`] moves the write half into a dedicated task fed by an
//!   mpsc channel. [`WriterHandle`]s are cheap to clone, so many producers
//!   (one per request, say) can share a connection without a lock.
//!
//! # Architecture
//!
//! ```text
//! Request 1 ─┐
//! Request 2 ─┼─► mpsc::Sender<OutboundFrame> ─► Writer Task ─► Transport
//! Request N ─┘
//! ```
//!
//! Each record is encoded into its own buffer before it is queued, so frames
//! from different producers never share bytes. The task batches whatever is
//! ready into a single `write_vectored` call.

use std::io::IoSlice;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::backpressure::{BackpressureController, ReservedSlot};
use crate::error::{FcgiError, Result};
use crate::protocol::{build_frame, encode_frame_into, Frame, PaddingStrategy, Record};

/// Default maximum pending records before backpressure kicks in.
pub const DEFAULT_MAX_PENDING_FRAMES: usize = crate::backpressure::DEFAULT_MAX_PENDING;

/// Default channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Maximum frames to batch in a single write operation.
const MAX_BATCH_SIZE: usize = 64;

/// An encoded frame queued for the writer task.
#[derive(Debug)]
pub struct OutboundFrame {
    /// Header, body and padding.
    bytes: Bytes,
    /// Told how the batch containing this frame fared.
    written: Option<oneshot::Sender<Result<()>>>,
}

impl OutboundFrame {
    /// Wrap an already encoded frame.
    #[inline]
    pub fn new(bytes: Bytes) -> Self {
        Self {
            bytes,
            written: None,
        }
    }

    /// Encode `record` for `request_id` into a fresh buffer.
    pub fn encode(request_id: u16, record: &Record, padding: PaddingStrategy) -> Result<Self> {
        build_frame(request_id, record, padding).map(Self::new)
    }

    /// Total size on the wire.
    #[inline]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// The encoded frame.
    #[inline]
    pub fn as_bytes(&self) -> &Bytes {
        &self.bytes
    }
}

/// Configuration for record writers.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Padding applied to every outgoing record.
    pub padding: PaddingStrategy,
    /// Maximum pending records before backpressure kicks in.
    pub max_pending_frames: usize,
    /// Channel capacity for the record queue.
    pub channel_capacity: usize,
    /// How long a producer may wait for backpressure to clear. `None` waits
    /// until a slot frees up or the writer task stops.
    pub backpressure_timeout: Option<Duration>,
}

impl WriterConfig {
    /// Set the padding applied to outgoing records.
    pub fn with_padding(mut self, padding: PaddingStrategy) -> Self {
        self.padding = padding;
        self
    }

    /// Set how many records may be queued before producers wait.
    pub fn with_max_pending_frames(mut self, max: usize) -> Self {
        self.max_pending_frames = max;
        self
    }

    /// Set the writer task's channel capacity.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Fail queued writes with [`FcgiError::BackpressureTimeout`] if no slot
    /// frees up within `timeout`.
    pub fn with_backpressure_timeout(mut self, timeout: Duration) -> Self {
        self.backpressure_timeout = Some(timeout);
        self
    }
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            padding: PaddingStrategy::default(),
            max_pending_frames: DEFAULT_MAX_PENDING_FRAMES,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            backpressure_timeout: None,
        }
    }
}

/// Writes records directly to an `AsyncWrite`.
///
/// `&mut self` on every write means only one frame is in flight, so a single
/// scratch buffer is reused across calls.
pub struct RecordWriter<W> {
    writer: W,
    padding: PaddingStrategy,
    scratch: BytesMut,
}

impl<W: AsyncWrite + Unpin> RecordWriter<W> {
    /// Create a writer with legacy padding.
    pub fn new(writer: W) -> Self {
        Self::with_padding(writer, PaddingStrategy::default())
    }

    /// Create a writer with the given padding strategy.
    pub fn with_padding(writer: W, padding: PaddingStrategy) -> Self {
        Self {
            writer,
            padding,
            scratch: BytesMut::new(),
        }
    }

    #[inline]
    pub fn padding(&self) -> PaddingStrategy {
        self.padding
    }

    /// Encode and write one record, then flush.
    ///
    /// Completes when the transport has accepted every byte.
    ///
    /// # Errors
    ///
    /// - [`FcgiError::RecordTooLarge`] if the body exceeds 65535 bytes (nothing
    ///   is written)
    /// - [`FcgiError::TransportWrite`] if the transport fails
    pub async fn write_record(&mut self, request_id: u16, record: &Record) -> Result<()> {
        self.scratch.clear();
        encode_frame_into(request_id, record, self.padding, &mut self.scratch)?;

        tracing::trace!(
            "Writing {} record for request {} ({} bytes)",
            record.record_type(),
            request_id,
            self.scratch.len()
        );

        self.writer
            .write_all(&self.scratch)
            .await
            .map_err(FcgiError::TransportWrite)?;
        self.writer.flush().await.map_err(FcgiError::TransportWrite)
    }

    /// Write a decoded or hand-built frame.
    pub async fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.write_record(frame.request_id, &frame.record).await
    }

    /// Shut down the write half.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await.map_err(FcgiError::TransportWrite)
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Handle for queueing records on the writer task.
///
/// This is cheaply cloneable and can be shared across producers.
#[derive(Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<OutboundFrame>,
    backpressure: BackpressureController,
    padding: PaddingStrategy,
}

impl WriterHandle {
    fn new(
        tx: mpsc::Sender<OutboundFrame>,
        backpressure: BackpressureController,
        padding: PaddingStrategy,
    ) -> Self {
        Self {
            tx,
            backpressure,
            padding,
        }
    }

    /// Encode a record and queue it for writing.
    ///
    /// Completes once the record is queued. Waits while backpressure is
    /// active; if a timeout was configured, fails with
    /// [`FcgiError::BackpressureTimeout`] once it elapses.
    pub async fn write_record(&self, request_id: u16, record: &Record) -> Result<()> {
        let frame = OutboundFrame::encode(request_id, record, self.padding)?;
        self.send(frame).await
    }

    /// Like [`write_record`](Self::write_record), but completes only after
    /// the writer task has flushed the record to the transport.
    ///
    /// # Errors
    ///
    /// - [`FcgiError::TransportWrite`] if the write carrying this record fails
    /// - [`FcgiError::ConnectionClosed`] if the task stops before writing it
    pub async fn write_record_flushed(&self, request_id: u16, record: &Record) -> Result<()> {
        let mut frame = OutboundFrame::encode(request_id, record, self.padding)?;
        let (done_tx, done_rx) = oneshot::channel();
        frame.written = Some(done_tx);

        self.send(frame).await?;
        done_rx.await.map_err(|_| FcgiError::ConnectionClosed)?
    }

    /// Queue a frame.
    pub async fn write_frame(&self, frame: &Frame) -> Result<()> {
        self.write_record(frame.request_id, &frame.record).await
    }

    /// Queue an encoded frame, waiting for backpressure to clear.
    pub async fn send(&self, frame: OutboundFrame) -> Result<()> {
        self.backpressure.reserve().await?;
        let slot = ReservedSlot::new(&self.backpressure);

        self.tx
            .send(frame)
            .await
            .map_err(|_| FcgiError::ConnectionClosed)?;

        slot.commit();
        Ok(())
    }

    /// Try to queue a record without waiting.
    ///
    /// Returns `Err(BackpressureTimeout)` immediately if at capacity.
    pub fn try_write_record(&self, request_id: u16, record: &Record) -> Result<()> {
        let frame = OutboundFrame::encode(request_id, record, self.padding)?;
        self.try_send(frame)
    }

    /// Try to queue an encoded frame without waiting.
    pub fn try_send(&self, frame: OutboundFrame) -> Result<()> {
        self.backpressure.try_reserve()?;
        let slot = ReservedSlot::new(&self.backpressure);

        self.tx.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => FcgiError::BackpressureTimeout,
            mpsc::error::TrySendError::Closed(_) => FcgiError::ConnectionClosed,
        })?;

        slot.commit();
        Ok(())
    }

    /// Check if backpressure is currently active.
    #[inline]
    pub fn is_backpressure_active(&self) -> bool {
        self.backpressure.is_active()
    }

    /// Records queued but not yet written.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.backpressure.pending_count()
    }

    /// Whether the writer task has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Padding applied to queued records.
    #[inline]
    pub fn padding(&self) -> PaddingStrategy {
        self.padding
    }
}

/// Spawn the writer task and return a handle for queueing records.
///
/// The task exits cleanly once every handle has been dropped, and with
/// [`FcgiError::TransportWrite`] if the transport fails.
pub fn spawn_writer_task<W>(
    writer: W,
    config: WriterConfig,
) -> (WriterHandle, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(config.channel_capacity);
    let backpressure =
        BackpressureController::with_timeout(config.max_pending_frames, config.backpressure_timeout);

    let handle = WriterHandle::new(tx, backpressure.clone(), config.padding);

    let task = tokio::spawn(async move {
        let result = writer_loop(rx, writer, backpressure).await;
        match &result {
            Ok(()) => tracing::debug!("Writer task finished"),
            Err(e) => tracing::error!("Writer task failed: {}", e),
        }
        result
    });

    (handle, task)
}

/// Spawn the writer task with default configuration.
pub fn spawn_writer_task_default<W>(writer: W) -> (WriterHandle, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    spawn_writer_task(writer, WriterConfig::default())
}

/// Receives frames and writes them in batches.
async fn writer_loop<W>(
    mut rx: mpsc::Receiver<OutboundFrame>,
    mut writer: W,
    backpressure: BackpressureController,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut batch = Vec::with_capacity(MAX_BATCH_SIZE);

    // Channel closed once every handle is dropped
    while let Some(first) = rx.recv().await {
        batch.push(first);

        while batch.len() < MAX_BATCH_SIZE {
            match rx.try_recv() {
                Ok(frame) => batch.push(frame),
                Err(_) => break,
            }
        }

        let batch_size = batch.len();
        tracing::trace!("Writing batch of {} records", batch_size);
        let result = write_batch(&mut writer, &batch).await;
        backpressure.release_many(batch_size);

        if let Err(e) = result {
            // Waiters on this batch and anything still queued see the failure
            rx.close();
            while let Ok(frame) = rx.try_recv() {
                backpressure.release();
                batch.push(frame);
            }
            backpressure.close();

            for frame in batch.drain(..) {
                if let Some(done) = frame.written {
                    let _ = done.send(Err(waiter_error(&e)));
                }
            }
            return Err(e);
        }

        for frame in batch.drain(..) {
            if let Some(done) = frame.written {
                let _ = done.send(Ok(()));
            }
        }
    }

    writer.flush().await.map_err(FcgiError::TransportWrite)
}

/// Copy of a batch failure for a `write_record_flushed` caller.
fn waiter_error(err: &FcgiError) -> FcgiError {
    match err {
        FcgiError::TransportWrite(io) => {
            FcgiError::TransportWrite(std::io::Error::new(io.kind(), io.to_string()))
        }
        _ => FcgiError::ConnectionClosed,
    }
}

/// Write a batch of frames using scatter/gather I/O, then flush.
async fn write_batch<W>(writer: &mut W, batch: &[OutboundFrame]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let total_size: usize = batch.iter().map(OutboundFrame::size).sum();
    let mut total_written = 0;

    while total_written < total_size {
        let slices = build_remaining_slices(batch, total_written);
        let written = writer
            .write_vectored(&slices)
            .await
            .map_err(FcgiError::TransportWrite)?;

        if written == 0 {
            return Err(FcgiError::TransportWrite(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "write_vectored returned 0",
            )));
        }

        total_written += written;
    }

    writer.flush().await.map_err(FcgiError::TransportWrite)
}

/// Build IoSlice array for the data after the first `skip_bytes`.
fn build_remaining_slices(batch: &[OutboundFrame], skip_bytes: usize) -> Vec<IoSlice<'_>> {
    let mut slices = Vec::with_capacity(batch.len());
    let mut offset = 0;

    for frame in batch {
        let end = offset + frame.size();
        if skip_bytes < end {
            let start = skip_bytes.saturating_sub(offset);
            slices.push(IoSlice::new(&frame.bytes[start..]));
        }
        offset = end;
    }

    slices
}

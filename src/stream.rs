//! Async read side and connection helpers.
//!
//! [`RecordReader`] drives a [`RecordBuffer`] from an `AsyncRead`, yielding one
//! frame per call in arrival order. [`FcgiStream`] pairs a reader with a
//! [`RecordWriter`] over the two halves of a duplex transport, and
//! [`spawn_reader_task`] moves the read loop into its own task that delivers
//! frames over a channel.
//!
//! # Example
//!
//! ```
//! use fcgi_wire::protocol::{Record, Role};
//! use fcgi_wire::stream::FcgiStream;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> fcgi_wire::Result<()> {
//! let (web_server, app) = tokio::io::duplex(4096);
//! let mut web_server = FcgiStream::new(web_server);
//! let mut app = FcgiStream::new(app);
//!
//! web_server.write_record(1, &Record::begin_request(Role::Responder, false)).await?;
//!
//! let frame = app.read_record().await?.unwrap();
//! assert_eq!(frame.request_id, 1);
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::protocol::{
    Frame, PaddingStrategy, Record, RecordBuffer, RecordRegistry, StandardRegistry,
    DEFAULT_BUFFER_CAPACITY,
};
use crate::writer::{spawn_writer_task, RecordWriter, WriterConfig, WriterHandle};

/// Default size of each transport read (64KB).
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Default capacity of the reader task's frame channel.
pub const DEFAULT_READER_CHANNEL_CAPACITY: usize = 1024;

/// Configuration for readers and connections.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Bytes requested per transport read.
    pub read_buffer_size: usize,
    /// Initial capacity of the accumulation buffer.
    pub initial_capacity: usize,
    /// Capacity of the channel used by [`spawn_reader_task`].
    pub channel_capacity: usize,
    /// Settings for the write side.
    pub writer: WriterConfig,
}

impl StreamConfig {
    pub fn builder() -> StreamConfigBuilder {
        StreamConfigBuilder::new()
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            initial_capacity: DEFAULT_BUFFER_CAPACITY,
            channel_capacity: DEFAULT_READER_CHANNEL_CAPACITY,
            writer: WriterConfig::default(),
        }
    }
}

/// Builder for [`StreamConfig`].
#[derive(Debug, Clone, Default)]
pub struct StreamConfigBuilder {
    config: StreamConfig,
}

impl StreamConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes requested per transport read (minimum 1).
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size.max(1);
        self
    }

    /// Initial size of the framer's buffer.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.config.initial_capacity = capacity;
        self
    }

    /// Reader task channel capacity (minimum 1).
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity.max(1);
        self
    }

    /// Padding for outgoing records.
    pub fn padding(mut self, padding: PaddingStrategy) -> Self {
        self.config.writer.padding = padding;
        self
    }

    /// Configuration for writers created from the stream.
    pub fn writer(mut self, writer: WriterConfig) -> Self {
        self.config.writer = writer;
        self
    }

    pub fn build(self) -> StreamConfig {
        self.config
    }
}

/// Reads frames from an `AsyncRead`.
///
/// A decode fault is returned from [`read_record`](Self::read_record) without
/// losing sync: the next call continues with the record after the bad one.
pub struct RecordReader<Rd, R = StandardRegistry> {
    reader: Rd,
    buffer: RecordBuffer<R>,
    /// Frames recovered from the buffer at end of stream.
    ready: VecDeque<Frame>,
    chunk: Vec<u8>,
    eof: bool,
}

impl<Rd: AsyncRead + Unpin> RecordReader<Rd, StandardRegistry> {
    /// Reader with the standard registry and default buffer sizes.
    pub fn new(reader: Rd) -> Self {
        Self::with_config(reader, &StreamConfig::default())
    }

    pub fn with_config(reader: Rd, config: &StreamConfig) -> Self {
        Self::with_registry(reader, StandardRegistry, config)
    }
}

impl<Rd: AsyncRead + Unpin, R: RecordRegistry> RecordReader<Rd, R> {
    /// Reader decoding bodies through `registry`.
    pub fn with_registry(reader: Rd, registry: R, config: &StreamConfig) -> Self {
        Self {
            reader,
            buffer: RecordBuffer::with_capacity_and_registry(config.initial_capacity, registry),
            ready: VecDeque::new(),
            chunk: vec![0u8; config.read_buffer_size.max(1)],
            eof: false,
        }
    }

    /// Read the next frame.
    ///
    /// Returns `Ok(None)` once the transport has closed and every complete
    /// record has been returned.
    ///
    /// # Errors
    ///
    /// - decode faults ([`FcgiError::is_decode_error`](crate::FcgiError::is_decode_error));
    ///   reading may continue
    /// - [`FcgiError::PrematureEof`] if the transport closed mid-record
    /// - [`FcgiError::Io`] if the read failed
    pub async fn read_record(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some(frame) = self.ready.pop_front() {
                return Ok(Some(frame));
            }

            match self.buffer.next_record() {
                Ok(Some(frame)) => {
                    tracing::trace!(
                        "Read {} record for request {}",
                        frame.record.record_type(),
                        frame.request_id
                    );
                    return Ok(Some(frame));
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Dropping undecodable record: {}", e);
                    return Err(e);
                }
            }

            if self.eof {
                // Also reached after a deferred fault, for the bytes behind it
                let tail = self.buffer.finish()?;
                if tail.is_empty() {
                    return Ok(None);
                }
                self.ready.extend(tail);
                continue;
            }

            let n = self.reader.read(&mut self.chunk).await?;
            if n == 0 {
                tracing::debug!("Transport closed, {} bytes buffered", self.buffer.len());
                self.eof = true;
                continue;
            }

            self.buffer.extend(&self.chunk[..n]);
        }
    }

    /// Whether the transport has reported end of stream.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    pub fn buffer(&self) -> &RecordBuffer<R> {
        &self.buffer
    }

    pub fn get_ref(&self) -> &Rd {
        &self.reader
    }

    pub fn into_inner(self) -> Rd {
        self.reader
    }
}

/// A duplex transport split into a record reader and a record writer.
pub struct FcgiStream<T, R = StandardRegistry> {
    reader: RecordReader<ReadHalf<T>, R>,
    writer: RecordWriter<WriteHalf<T>>,
    config: StreamConfig,
}

impl<T: AsyncRead + AsyncWrite> FcgiStream<T, StandardRegistry> {
    /// Split `io` with the default configuration.
    pub fn new(io: T) -> Self {
        Self::with_config(io, StreamConfig::default())
    }

    pub fn with_config(io: T, config: StreamConfig) -> Self {
        Self::with_registry(io, StandardRegistry, config)
    }
}

impl<T: AsyncRead + AsyncWrite, R: RecordRegistry> FcgiStream<T, R> {
    /// Split `io`, decoding bodies through `registry`.
    pub fn with_registry(io: T, registry: R, config: StreamConfig) -> Self {
        let (read_half, write_half) = tokio::io::split(io);
        Self {
            reader: RecordReader::with_registry(read_half, registry, &config),
            writer: RecordWriter::with_padding(write_half, config.writer.padding),
            config,
        }
    }

    /// Read the next frame. See [`RecordReader::read_record`].
    pub async fn read_record(&mut self) -> Result<Option<Frame>> {
        self.reader.read_record().await
    }

    /// Write one record and flush. See [`RecordWriter::write_record`].
    pub async fn write_record(&mut self, request_id: u16, record: &Record) -> Result<()> {
        self.writer.write_record(request_id, record).await
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Split into independently owned halves.
    pub fn into_split(self) -> (RecordReader<ReadHalf<T>, R>, RecordWriter<WriteHalf<T>>) {
        (self.reader, self.writer)
    }
}

impl<T, R> FcgiStream<T, R>
where
    T: AsyncRead + AsyncWrite + Send + 'static,
    R: RecordRegistry,
{
    /// Keep the reader and move the write half into a writer task.
    pub fn spawn_writer(
        self,
    ) -> (
        RecordReader<ReadHalf<T>, R>,
        WriterHandle,
        JoinHandle<Result<()>>,
    ) {
        let writer_config = self.config.writer.clone();
        let (reader, writer) = self.into_split();
        let (handle, task) = spawn_writer_task(writer.into_inner(), writer_config);
        (reader, handle, task)
    }
}

/// Spawn a task that reads frames and sends them over a channel.
///
/// Decode faults are sent as `Err` and reading continues. Transport errors
/// and [`FcgiError::PrematureEof`](crate::FcgiError::PrematureEof) are sent
/// and end the task. The channel closes when the transport reaches end of
/// stream; dropping the receiver stops the task at its next frame.
pub fn spawn_reader_task<Rd, R>(
    reader: Rd,
    registry: R,
    config: &StreamConfig,
) -> (mpsc::Receiver<Result<Frame>>, JoinHandle<()>)
where
    Rd: AsyncRead + Unpin + Send + 'static,
    R: RecordRegistry + 'static,
{
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
    let reader = RecordReader::with_registry(reader, registry, config);
    let task = tokio::spawn(reader_loop(reader, tx));
    (rx, task)
}

async fn reader_loop<Rd, R>(mut reader: RecordReader<Rd, R>, tx: mpsc::Sender<Result<Frame>>)
where
    Rd: AsyncRead + Unpin,
    R: RecordRegistry,
{
    loop {
        let (item, fatal) = match reader.read_record().await {
            Ok(Some(frame)) => (Ok(frame), false),
            Ok(None) => {
                tracing::debug!("Reader task finished");
                return;
            }
            Err(e) => {
                let fatal = !e.is_decode_error();
                if fatal {
                    tracing::error!("Reader task failed: {}", e);
                }
                (Err(e), fatal)
            }
        };

        if tx.send(item).await.is_err() {
            tracing::debug!("Frame receiver dropped, stopping reader task");
            return;
        }
        if fatal {
            return;
        }
    }
}

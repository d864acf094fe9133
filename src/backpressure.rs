//! Pending-record accounting for the writer task.
//!
//! Producers reserve a slot before queueing an encoded record; the writer task
//! releases slots once a batch has been flushed to the transport. When all
//! slots are taken, [`WriterHandle::write_record`](crate::writer::WriterHandle::write_record)
//! waits until the writer task frees one. A timeout is opt-in: with one set,
//! the wait fails with [`FcgiError::BackpressureTimeout`] once it elapses.
//!
//! Defaults: 1024 pending records, no timeout.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, TryAcquireError};

use crate::error::{FcgiError, Result};

/// Default maximum pending records before backpressure kicks in.
pub const DEFAULT_MAX_PENDING: usize = 1024;

/// Counts records queued but not yet written.
///
/// Each pending record holds one semaphore permit; waiters are woken when the
/// writer task hands permits back. Clones share the same semaphore.
#[derive(Debug, Clone)]
pub struct BackpressureController {
    slots: Arc<Semaphore>,
    max_pending: usize,
    timeout: Option<Duration>,
}

impl BackpressureController {
    /// Create a controller that waits for a free slot without limit.
    pub fn new(max_pending: usize) -> Self {
        Self::with_timeout(max_pending, None)
    }

    /// Create a controller whose waits fail after `timeout`, if one is given.
    pub fn with_timeout(max_pending: usize, timeout: Option<Duration>) -> Self {
        let max_pending = max_pending.min(Semaphore::MAX_PERMITS);
        Self {
            slots: Arc::new(Semaphore::new(max_pending)),
            max_pending,
            timeout,
        }
    }

    /// Whether another record can be queued without waiting.
    #[inline]
    pub fn can_accept(&self) -> bool {
        self.slots.available_permits() > 0
    }

    /// Whether backpressure is currently active.
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.can_accept()
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.max_pending.saturating_sub(self.slots.available_permits())
    }

    #[inline]
    pub fn max_pending(&self) -> usize {
        self.max_pending
    }

    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Reserve a slot without waiting.
    ///
    /// Returns `Err(BackpressureTimeout)` if at capacity.
    pub fn try_reserve(&self) -> Result<()> {
        match self.slots.try_acquire() {
            Ok(permit) => {
                permit.forget();
                Ok(())
            }
            Err(TryAcquireError::NoPermits) => Err(FcgiError::BackpressureTimeout),
            Err(TryAcquireError::Closed) => Err(FcgiError::ConnectionClosed),
        }
    }

    /// Reserve a slot, waiting for the writer task to free one.
    ///
    /// With a timeout configured, gives up with
    /// [`FcgiError::BackpressureTimeout`] once it elapses.
    pub async fn reserve(&self) -> Result<()> {
        let acquire = self.slots.acquire();

        let permit = match self.timeout {
            None => acquire.await,
            Some(timeout) => match tokio::time::timeout(timeout, acquire).await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::debug!(
                        "Backpressure timeout after {:?} with {} records pending",
                        timeout,
                        self.pending_count()
                    );
                    return Err(FcgiError::BackpressureTimeout);
                }
            },
        };

        permit.map_err(|_| FcgiError::ConnectionClosed)?.forget();
        Ok(())
    }

    /// Release one slot.
    #[inline]
    pub fn release(&self) {
        self.release_many(1);
    }

    /// Release slots for a written batch.
    #[inline]
    pub fn release_many(&self, count: usize) {
        self.slots.add_permits(count);
    }

    /// Stop handing out slots. Current and later waits fail with
    /// [`FcgiError::ConnectionClosed`].
    pub fn close(&self) {
        self.slots.close();
    }

    /// Whether [`close`](Self::close) has been called.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.slots.is_closed()
    }
}

impl Default for BackpressureController {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PENDING)
    }
}

/// Releases a reserved slot on drop unless disarmed.
///
/// Held while a record is handed to the writer channel, so a failed send
/// gives the slot back.
pub(crate) struct ReservedSlot<'a> {
    controller: &'a BackpressureController,
    armed: bool,
}

impl<'a> ReservedSlot<'a> {
    pub(crate) fn new(controller: &'a BackpressureController) -> Self {
        Self {
            controller,
            armed: true,
        }
    }

    /// The writer task now owns the slot.
    pub(crate) fn commit(mut self) {
        self.armed = false;
    }
}

impl Drop for ReservedSlot<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.controller.release();
        }
    }
}

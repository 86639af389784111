//! Concurrent monotonic identifier generation.
//!
//! A [`Sequence`] produces an unbounded, strictly increasing series of
//! integers. Values are precomputed by a background task into a small
//! bounded channel, so bursts of [`Sequence::fetch`] calls are served
//! without recomputation latency while the producer self-throttles on
//! the channel's backpressure.

use tokio::sync::{mpsc, watch, Mutex};
use tracing::debug;

use crate::error::SessionVaultError;
use crate::Result;

/// Capacity of the precomputed id buffer.
const ID_BUFFER: usize = 4;

/// A process-wide monotonic id generator.
///
/// Ids start at `start` and advance by `step` with no duplicates,
/// regardless of how many tasks fetch concurrently. Typical uses are
/// application instance ids and other session-adjacent bookkeeping
/// counters.
///
/// Shutdown is coordinated through a watch signal checked on both
/// sides: the producer never sends into a closed channel, and a
/// [`Sequence::fetch`] that arrives after [`Sequence::close`] fails
/// fast with [`SessionVaultError::SequenceClosed`] instead of blocking.
/// Ids still buffered at close time are discarded.
///
/// Dropping the `Sequence` also stops the producer task.
pub struct Sequence {
    ids: Mutex<mpsc::Receiver<i64>>,
    shutdown: watch::Sender<bool>,
}

impl Sequence {
    /// Create a new sequence starting at `start`, advancing by `step`.
    ///
    /// Spawns the producer task immediately.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn new(start: i64, step: i64) -> Self {
        let (tx, rx) = mpsc::channel(ID_BUFFER);
        let (shutdown, mut closed) = watch::channel(false);

        tokio::spawn(async move {
            let mut next = start;
            loop {
                tokio::select! {
                    _ = closed.changed() => break,
                    permit = tx.reserve() => match permit {
                        Ok(permit) => {
                            permit.send(next);
                            next += step;
                        }
                        // Receiver dropped: the Sequence itself is gone.
                        Err(_) => break,
                    },
                }
            }
            debug!(next, "id producer stopped");
        });

        Self {
            ids: Mutex::new(rx),
            shutdown,
        }
    }

    /// Fetch the next id, waiting until one is buffered.
    ///
    /// Under normal load this resolves immediately; the wait is bounded
    /// by the producer's pace. Returns
    /// [`SessionVaultError::SequenceClosed`] once the sequence has been
    /// closed.
    pub async fn fetch(&self) -> Result<i64> {
        if *self.shutdown.borrow() {
            return Err(SessionVaultError::SequenceClosed);
        }

        let mut ids = self.ids.lock().await;
        ids.recv().await.ok_or(SessionVaultError::SequenceClosed)
    }

    /// Stop producing ids.
    ///
    /// Idempotent. Pending and future [`Sequence::fetch`] calls return
    /// promptly with an error rather than blocking forever.
    pub fn close(&self) {
        self.shutdown.send_replace(true);
    }

    /// Whether [`Sequence::close`] has been called.
    pub fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }
}

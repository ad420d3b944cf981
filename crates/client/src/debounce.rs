//! Trailing-edge debouncing for snapshot writes.
//!
//! Field edits arrive keystroke by keystroke; writing the local
//! snapshot on every one is wasteful. A [`Debouncer`] coalesces a burst
//! of values and delivers only the last one after a quiet period.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

/// Coalesces submitted values, invoking the flush callback with the
/// most recent value once `delay` has elapsed without a new submission.
/// Dropping the debouncer flushes any pending value immediately.
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawn the debounce worker. `on_flush` runs on the worker task.
    pub fn new<F>(delay: Duration, mut on_flush: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();

        tokio::spawn(async move {
            loop {
                // Idle until the first value of a burst arrives.
                let Some(mut pending) = rx.recv().await else {
                    return;
                };

                let sleep = tokio::time::sleep(delay);
                tokio::pin!(sleep);

                loop {
                    tokio::select! {
                        () = &mut sleep => {
                            on_flush(pending);
                            break;
                        }
                        next = rx.recv() => match next {
                            Some(value) => {
                                pending = value;
                                sleep.as_mut().reset(Instant::now() + delay);
                            }
                            // Channel closed mid-burst: flush the last
                            // value so nothing is lost on shutdown.
                            None => {
                                on_flush(pending);
                                return;
                            }
                        }
                    }
                }
            }
        });

        Self { tx }
    }

    /// Submit a value, restarting the quiet-period timer. Values
    /// submitted while one is pending replace it.
    pub fn submit(&self, value: T) {
        // Send fails only if the worker is gone, at which point there
        // is nothing left to snapshot to.
        let _ = self.tx.send(value);
    }
}

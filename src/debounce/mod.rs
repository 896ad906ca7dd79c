//! Trailing-edge debouncer over a `watch` channel.
//!
//! [`Debouncer::push`] restarts a single timer task; only the last value pushed before
//! a quiet period of `delay` is published. Intermediate values are dropped.


use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

struct Pending {
    /// Bumped on every push and cancel; a timer only fires if its generation is current.
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

/// Publishes the latest pushed value once it has been stable for `delay`.
///
/// Timers are spawned on the ambient Tokio runtime. Dropping the debouncer cancels
/// the pending timer.
pub struct Debouncer<T> {
    delay: Duration,
    tx: Arc<watch::Sender<T>>,
    pending: Arc<Mutex<Pending>>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Creates a debouncer whose debounced value starts at `initial`.
    pub fn new(initial: T, delay: Duration) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            delay,
            tx: Arc::new(tx),
            pending: Arc::new(Mutex::new(Pending {
                generation: 0,
                handle: None,
            })),
        }
    }

    /// Records a new input, cancelling any pending emission.
    ///
    /// With a zero delay the value is published immediately.
    pub fn push(&self, value: T) {
        let mut pending = self.pending.lock();
        if let Some(handle) = pending.handle.take() {
            handle.abort();
        }
        pending.generation = pending.generation.wrapping_add(1);

        if self.delay.is_zero() {
            publish(&self.tx, value);
            return;
        }

        let generation = pending.generation;
        let delay = self.delay;
        let tx = Arc::clone(&self.tx);
        let shared = Arc::clone(&self.pending);
        pending.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let mut pending = shared.lock();
            if pending.generation != generation {
                return;
            }
            pending.handle = None;
            publish(&tx, value);
        }));
    }

    /// Publishes `value` now, cancelling any pending emission.
    pub fn flush(&self, value: T) {
        let mut pending = self.pending.lock();
        pending.generation = pending.generation.wrapping_add(1);
        if let Some(handle) = pending.handle.take() {
            handle.abort();
        }
        publish(&self.tx, value);
    }

    /// Returns the current debounced value.
    #[inline]
    pub fn current(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Subscribes to debounced value changes.
    #[inline]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Returns `true` while an emission is scheduled.
    pub fn is_pending(&self) -> bool {
        self.pending.lock().handle.is_some()
    }

    /// Cancels the pending emission, if any. The debounced value is left unchanged.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock();
        pending.generation = pending.generation.wrapping_add(1);
        if let Some(handle) = pending.handle.take() {
            handle.abort();
        }
    }

    #[inline]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.lock().handle.take() {
            handle.abort();
        }
    }
}

impl<T> std::fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .field("pending", &self.pending.lock().handle.is_some())
            .finish()
    }
}

/// Sets the watched value, notifying receivers only if it changed.
fn publish<T: PartialEq>(tx: &watch::Sender<T>, value: T) {
    tx.send_if_modified(|current| {
        if *current == value {
            false
        } else {
            *current = value;
            true
        }
    });
}

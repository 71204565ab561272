//! Debounced values, e.g. a search box feeding a search query.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Delay used by search inputs.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Writer side of a [`Debouncer`]. Cheap to clone.
#[derive(Debug)]
pub struct DebounceInput<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for DebounceInput<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T: PartialEq> DebounceInput<T> {
    /// Records a new raw value. Setting the current value again is ignored.
    pub fn set(&self, value: T) {
        self.tx.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }
}

/// Yields a value only once it has stopped changing for `delay`.
#[derive(Debug)]
pub struct Debouncer<T> {
    rx: watch::Receiver<T>,
    input: DebounceInput<T>,
    delay: Duration,
}

impl<T: Clone + PartialEq> Debouncer<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        let (tx, rx) = watch::channel(initial);
        Self {
            rx,
            input: DebounceInput { tx: Arc::new(tx) },
            delay,
        }
    }

    pub fn input(&self) -> DebounceInput<T> {
        self.input.clone()
    }

    /// The latest raw value, settled or not.
    pub fn latest(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Waits for the next change, then until no further change arrives for
    /// the delay, and returns the value at that point.
    pub async fn settled(&mut self) -> T {
        // The debouncer holds a sender itself, so `changed` cannot fail here.
        let _ = self.rx.changed().await;
        loop {
            tokio::select! {
                _ = self.rx.changed() => {}
                _ = tokio::time::sleep(self.delay) => break,
            }
        }
        self.rx.borrow_and_update().clone()
    }
}

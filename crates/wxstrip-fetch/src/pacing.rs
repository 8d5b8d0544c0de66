//! Sequential, rate-limited release of one site's requests.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// Releases queued items one at a time. Every item after the first is held
/// back until `delay` has passed since the previous item was finished, which
/// is the moment the caller asks for the next one.
#[derive(Debug)]
pub struct PacedQueue<T> {
    items: VecDeque<T>,
    delay: Duration,
    released_any: bool,
}

impl<T> PacedQueue<T> {
    pub fn new(items: impl IntoIterator<Item = T>, delay: Duration) -> Self {
        Self {
            items: items.into_iter().collect(),
            delay,
            released_any: false,
        }
    }

    /// Waits out the inter-request delay, then yields the next item.
    pub async fn next(&mut self) -> Option<T> {
        let item = self.items.pop_front()?;
        if self.released_any && !self.delay.is_zero() {
            tokio::time::sleep_until(Instant::now() + self.delay).await;
        }
        self.released_any = true;
        Some(item)
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

//! Fixed pre-fetch delay.
//!
//! Every admitted row waits the configured delay before its fetch is issued.
//! The wait is a timer suspension (`tokio::time::sleep`), so other in-flight
//! rows keep making progress while one row is waiting.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use sku_images_core::download::Throttle;
//!
//! # async fn example() {
//! let throttle = Throttle::new(Duration::from_millis(250));
//! throttle.wait().await;
//! # }
//! ```

use std::time::Duration;

use tracing::{debug, instrument};

/// Fixed delay applied before each fetch.
#[derive(Debug, Clone, Copy, Default)]
pub struct Throttle {
    delay: Duration,
}

impl Throttle {
    /// Creates a throttle with the given delay.
    #[must_use]
    #[instrument(skip_all, fields(delay_ms = delay.as_millis()))]
    pub fn new(delay: Duration) -> Self {
        debug!("creating throttle");
        Self { delay }
    }

    /// Creates a throttle that never waits.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Returns whether this throttle applies no delay.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.delay.is_zero()
    }

    /// Returns the configured delay.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Suspends the calling future for the configured delay.
    pub async fn wait(&self) {
        if self.is_disabled() {
            return;
        }
        tokio::time::sleep(self.delay).await;
    }
}

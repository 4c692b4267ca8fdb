//! Bounded retry with widening wait windows.
//!
//! Dialogs load asynchronously, so a single lookup is usually premature.
//! [`RetryPolicy::wait_for`] retries a lookup across a fixed number of
//! attempts, giving each attempt a larger wait window than the one before.
//! The window grows per attempt; there is no delay between attempts.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use crate::errors::AutomationError;

/// Maps a 0-based attempt index to that attempt's wait window.
pub type BackoffSchedule = Arc<dyn Fn(u32) -> Duration + Send + Sync>;

/// The default schedule: attempt `i` waits up to `5 * i` seconds
/// (0s, 5s, 10s, 15s over the default four attempts).
pub fn linear_backoff(attempt: u32) -> Duration {
    Duration::from_secs(5 * u64::from(attempt))
}

const DEFAULT_MAX_ATTEMPTS: u32 = 4;
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// How often and how long to re-run a lookup before giving up.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: BackoffSchedule,
    poll_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, Arc::new(linear_backoff))
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: BackoffSchedule) -> Self {
        Self {
            max_attempts,
            backoff,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// A zero-duration schedule: every attempt is a single immediate probe.
    /// Lets tests run the full attempt budget without real waits.
    pub fn immediate() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, Arc::new(|_| Duration::ZERO))
            .with_poll_interval(Duration::ZERO)
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The wait window the given attempt gets under this policy's schedule.
    pub fn window_for(&self, attempt: u32) -> Duration {
        (self.backoff)(attempt)
    }

    /// Derive a single-attempt policy with a fixed window, keeping this
    /// policy's probe interval. Used for readiness waits that carry their own
    /// budget rather than the attempt schedule.
    pub(crate) fn one_window(&self, window: Duration) -> Self {
        Self {
            max_attempts: 1,
            backoff: Arc::new(move |_| window),
            poll_interval: self.poll_interval,
        }
    }

    /// Run `lookup` until it yields a value or the attempt budget is gone.
    ///
    /// `Ok(None)` means "not there yet" and is probed again until the current
    /// attempt's window elapses; the next attempt then starts immediately
    /// with a larger window. Any `Err` from the lookup is a real failure and
    /// propagates at once. Exhausting all attempts yields
    /// [`AutomationError::Timeout`] carrying `description`, so callers can
    /// tell "never appeared" from "acting on it failed".
    ///
    /// A zero probe interval makes each window a single probe.
    pub async fn wait_for<T, F>(
        &self,
        description: &str,
        mut lookup: F,
    ) -> Result<T, AutomationError>
    where
        F: FnMut() -> Result<Option<T>, AutomationError>,
    {
        for attempt in 0..self.max_attempts {
            let window = (self.backoff)(attempt);
            let deadline = Instant::now() + window;
            trace!(attempt, ?window, "probing for {}", description);

            loop {
                if let Some(value) = lookup()? {
                    debug!(attempt, "found {}", description);
                    return Ok(value);
                }
                let now = Instant::now();
                if now >= deadline || self.poll_interval.is_zero() {
                    break;
                }
                sleep(self.poll_interval.min(deadline - now)).await;
            }
        }

        Err(AutomationError::Timeout(format!(
            "timed out waiting for {description} after {} attempts",
            self.max_attempts
        )))
    }
}

//! Backoff and timeout settings for polling.

use std::time::Duration;

const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);
const DEFAULT_MULTIPLIER: f64 = 2.0;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// How long to wait between poll attempts and when to give up.
///
/// The delay before attempt `n + 1` is `initial_delay * multiplier^n`,
/// capped at `max_delay`. When `timeout` is set, polling stops with
/// [`GoodDataError::PollTimeout`](crate::GoodDataError::PollTimeout) once
/// the total wait reaches it.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use gooddata::PollSettings;
///
/// let settings = PollSettings::default()
///     .with_initial_delay(Duration::from_millis(100))
///     .with_timeout(Some(Duration::from_secs(60)));
/// assert_eq!(settings.delay_for(0), Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PollSettings {
    /// Delay after the first unfinished response.
    pub initial_delay: Duration,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
    /// Growth factor applied per attempt.
    pub multiplier: f64,
    /// Ceiling on total time spent polling. `None` polls forever.
    pub timeout: Option<Duration>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            multiplier: DEFAULT_MULTIPLIER,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl PollSettings {
    /// Constant delay between attempts, default timeout.
    #[must_use]
    pub fn fixed(delay: Duration) -> Self {
        Self {
            initial_delay: delay,
            max_delay: delay,
            multiplier: 1.0,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Delay to wait after the `attempt`-th unfinished response (0-indexed).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let multiplier = if self.multiplier.is_finite() && self.multiplier >= 1.0 {
            self.multiplier
        } else {
            1.0
        };
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * multiplier.powi(exponent);
        let max = self.max_delay.max(self.initial_delay);

        if !secs.is_finite() || secs >= max.as_secs_f64() {
            max
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

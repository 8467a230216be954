//! Reconnection policy for realtime channels.
//!
//! Pure decision logic, no timers; the channel driver does the sleeping.

use std::time::Duration;

/// Default number of connection attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Default fixed delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
/// Default per-attempt connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Bounded, fixed-delay reconnection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl ReconnectPolicy {
    /// Check if another attempt should be made.
    ///
    /// # Arguments
    ///
    /// * `attempts_made` - Number of attempts already made (0 before the first)
    ///
    /// # Returns
    ///
    /// `true` while the attempt budget is not exhausted
    pub fn should_attempt(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

use std::time::{Duration, Instant};

pub(crate) const DEFAULT_WARN_INTERVAL: Duration = Duration::from_secs(2);

/// Rate limit for warnings that can fire every frame.
#[derive(Debug)]
pub(crate) struct WarnThrottle {
    interval: Duration,
    last_emit: Option<Instant>,
    suppressed: u64,
}

impl Default for WarnThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_WARN_INTERVAL)
    }
}

impl WarnThrottle {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
            suppressed: 0,
        }
    }

    /// `Some(n)` when a warning may be logged now, `n` being how many were swallowed
    /// since the previous one.
    pub(crate) fn check(&mut self, now: Instant) -> Option<u64> {
        let due = match self.last_emit {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        };
        if due {
            self.last_emit = Some(now);
            Some(std::mem::take(&mut self.suppressed))
        } else {
            self.suppressed = self.suppressed.saturating_add(1);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_warning_passes_then_suppresses_until_interval() {
        let base = Instant::now();
        let mut throttle = WarnThrottle::new(Duration::from_secs(1));

        assert_eq!(throttle.check(base), Some(0));
        assert_eq!(throttle.check(base + Duration::from_millis(100)), None);
        assert_eq!(throttle.check(base + Duration::from_millis(900)), None);
        assert_eq!(throttle.check(base + Duration::from_secs(1)), Some(2));
        assert_eq!(throttle.check(base + Duration::from_millis(1500)), None);
    }
}

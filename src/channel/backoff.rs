use std::time::Duration;

/// Doubling reconnect delay, capped, reset after a successful connect.
#[derive(Clone, Debug)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial_ms: u64, max_ms: u64) -> Self {
        let initial = Duration::from_millis(initial_ms.max(1));
        let max = Duration::from_millis(max_ms.max(initial_ms.max(1)));
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// Delay to wait before the next attempt; grows the one after it.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.checked_mul(2).unwrap_or(self.max).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doubles_until_cap() {
        let mut b = Backoff::new(500, 3000);
        assert_eq!(b.next_delay(), Duration::from_millis(500));
        assert_eq!(b.next_delay(), Duration::from_millis(1000));
        assert_eq!(b.next_delay(), Duration::from_millis(2000));
        assert_eq!(b.next_delay(), Duration::from_millis(3000));
        assert_eq!(b.next_delay(), Duration::from_millis(3000));
    }

    #[test]
    fn test_reset_returns_to_initial() {
        let mut b = Backoff::new(100, 1000);
        b.next_delay();
        b.next_delay();
        b.reset();
        assert_eq!(b.next_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_max_never_below_initial() {
        let mut b = Backoff::new(800, 200);
        assert_eq!(b.next_delay(), Duration::from_millis(800));
        assert_eq!(b.next_delay(), Duration::from_millis(800));
    }

    #[test]
    fn test_huge_delays_saturate_at_max() {
        let mut b = Backoff::new(u64::MAX, u64::MAX);
        let max = Duration::from_millis(u64::MAX);
        assert_eq!(b.next_delay(), max);
        assert_eq!(b.next_delay(), max);
    }

    #[test]
    fn test_zero_initial_is_clamped() {
        let mut b = Backoff::new(0, 0);
        assert_eq!(b.next_delay(), Duration::from_millis(1));
    }
}

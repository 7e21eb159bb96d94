use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Advisory rate limiting, called once after every oracle call.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pace(&self);
}

/// Never waits. Used by tests and `--no-pacing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unpaced;

#[async_trait]
impl Pacer for Unpaced {
    async fn pace(&self) {}
}

/// Minimum-interval gate.
///
/// Each `pace()` waits for whatever is left of `interval` since the previous
/// `pace()` returned, so time spent inside the call counts towards the gap.
/// The first `pace()` waits the whole interval.
#[derive(Debug)]
pub struct MinIntervalPacer {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl MinIntervalPacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[async_trait]
impl Pacer for MinIntervalPacer {
    async fn pace(&self) {
        let mut last = self.last.lock().await;
        let wait = match *last {
            Some(prev) => self.interval.saturating_sub(prev.elapsed()),
            None => self.interval,
        };
        if !wait.is_zero() {
            debug!("Pacing for {:?}", wait);
            tokio::time::sleep(wait).await;
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_pace_waits_full_interval() {
        let pacer = MinIntervalPacer::from_millis(1000);
        let start = Instant::now();
        pacer.pace().await;
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn time_spent_in_the_call_counts_towards_the_gap() {
        let pacer = MinIntervalPacer::from_millis(1000);
        pacer.pace().await;

        // Simulate a slow oracle call
        tokio::time::advance(Duration::from_millis(400)).await;
        let before = Instant::now();
        pacer.pace().await;
        let waited = before.elapsed();
        assert!(waited >= Duration::from_millis(600));
        assert!(waited < Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_calls_are_not_delayed_further() {
        let pacer = MinIntervalPacer::from_millis(500);
        pacer.pace().await;

        tokio::time::advance(Duration::from_secs(2)).await;
        let before = Instant::now();
        pacer.pace().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn unpaced_returns_immediately() {
        let before = std::time::Instant::now();
        for _ in 0..100 {
            Unpaced.pace().await;
        }
        assert!(before.elapsed() < Duration::from_secs(1));
    }
}

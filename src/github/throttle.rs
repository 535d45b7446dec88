use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

const HOUR: Duration = Duration::from_secs(60 * 60);

/// Token bucket limiting outgoing requests to `hourly_tokens` per hour with bursts of `burst`.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    burst: u32,
    bucket: Mutex<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    available: u32,
    last_refill: Instant,
}

impl Throttle {
    /// Returns `None` when either limit is zero, which disables throttling.
    pub fn new(hourly_tokens: u32, burst: u32) -> Option<Self> {
        if hourly_tokens == 0 || burst == 0 {
            return None;
        }

        Some(Self {
            interval: HOUR / hourly_tokens,
            burst,
            bucket: Mutex::new(Bucket {
                available: burst,
                last_refill: Instant::now(),
            }),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until a request may be sent and consumes one token.
    pub async fn acquire(&self) {
        let mut bucket = self.bucket.lock().await;
        self.refill(&mut bucket, Instant::now());

        if bucket.available > 0 {
            bucket.available -= 1;
            return;
        }

        let next_token_at = bucket.last_refill + self.interval;
        let wait = next_token_at.saturating_duration_since(Instant::now());
        tracing::debug!(wait = ?wait, "throttling request");
        sleep(wait).await;
        bucket.last_refill = next_token_at;
    }

    fn refill(&self, bucket: &mut Bucket, now: Instant) {
        let elapsed = now.saturating_duration_since(bucket.last_refill);
        let earned = elapsed.as_nanos() / self.interval.as_nanos();
        if earned == 0 {
            return;
        }

        let earned = u32::try_from(earned).unwrap_or(u32::MAX);
        if bucket.available.saturating_add(earned) >= self.burst {
            bucket.available = self.burst;
            bucket.last_refill = now;
        } else {
            bucket.available += earned;
            bucket.last_refill += self.interval * earned;
        }
    }
}

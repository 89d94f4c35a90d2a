//! Sliding-window request throttling.
//!
//! A throttle counts requests per key inside a rolling window and refuses the
//! request that would exceed the limit. Two backends exist:
//! - `MemoryThrottle`: per-process map of key to request instants; idle keys are swept
//! - `RedisThrottle`: one sorted set per key, shared by every API instance
//!
//! Keys are namespaced by caller, e.g. `reset:{email}` or `ai:{user_id}`.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::errors::AppError;

#[derive(Debug, Error)]
pub enum ThrottleError {
    #[error("rate limit exceeded (max {limit} requests per {window_secs}s)")]
    Exceeded { limit: usize, window_secs: u64 },

    #[error("throttle backend error: {0}")]
    Backend(String),
}

impl From<ThrottleError> for AppError {
    fn from(e: ThrottleError) -> Self {
        match e {
            ThrottleError::Exceeded { limit, window_secs } => AppError::TooManyRequests(format!(
                "Too many requests. At most {limit} allowed every {}. Please try again later.",
                describe_window(window_secs)
            )),
            ThrottleError::Backend(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

/// Limit and window applied to one family of keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleRule {
    pub limit: usize,
    pub window: Duration,
}

impl ThrottleRule {
    pub fn new(limit: usize, window_secs: u64) -> Self {
        Self {
            limit,
            window: Duration::from_secs(window_secs),
        }
    }

    fn exceeded(&self) -> ThrottleError {
        ThrottleError::Exceeded {
            limit: self.limit,
            window_secs: self.window.as_secs(),
        }
    }
}

#[async_trait]
pub trait RequestThrottle: Send + Sync {
    /// Checks the rule for `key` and, when allowed, records the request.
    async fn check_and_record(&self, key: &str, rule: ThrottleRule) -> Result<(), ThrottleError>;
}

// =============================================================================
// IN-MEMORY
// =============================================================================

/// Idle keys are swept at most this often.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct Bucket {
    window: Duration,
    hits: VecDeque<Instant>,
}

#[derive(Default)]
struct MemoryState {
    buckets: HashMap<String, Bucket>,
    last_sweep: Option<Instant>,
}

impl MemoryState {
    /// Drops every key whose window holds no requests.
    fn sweep(&mut self, now: Instant) {
        let due = self
            .last_sweep
            .map_or(true, |last| now.duration_since(last) >= SWEEP_INTERVAL);
        if !due {
            return;
        }
        self.buckets.retain(|_, bucket| {
            prune_window(&mut bucket.hits, now, bucket.window);
            !bucket.hits.is_empty()
        });
        self.last_sweep = Some(now);
    }
}

#[derive(Default)]
pub struct MemoryThrottle {
    state: Mutex<MemoryState>,
}

impl MemoryThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_and_record_at(
        &self,
        key: &str,
        rule: ThrottleRule,
        now: Instant,
    ) -> Result<(), ThrottleError> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        state.sweep(now);

        let bucket = state.buckets.entry(key.to_string()).or_insert_with(|| Bucket {
            window: rule.window,
            hits: VecDeque::new(),
        });
        bucket.window = rule.window;
        prune_window(&mut bucket.hits, now, rule.window);
        if bucket.hits.len() >= rule.limit {
            return Err(rule.exceeded());
        }
        bucket.hits.push_back(now);
        Ok(())
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .buckets
            .len()
    }
}

#[async_trait]
impl RequestThrottle for MemoryThrottle {
    async fn check_and_record(&self, key: &str, rule: ThrottleRule) -> Result<(), ThrottleError> {
        self.check_and_record_at(key, rule, Instant::now())
    }
}

fn prune_window(deque: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&front) = deque.front() {
        if now.duration_since(front) >= window {
            deque.pop_front();
        } else {
            break;
        }
    }
}

// =============================================================================
// REDIS
// =============================================================================

pub struct RedisThrottle {
    client: redis::Client,
}

impl RedisThrottle {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RequestThrottle for RedisThrottle {
    async fn check_and_record(&self, key: &str, rule: ThrottleRule) -> Result<(), ThrottleError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| ThrottleError::Backend(e.to_string()))?;

        let redis_key = format!("throttle:{key}");
        let now_ms = chrono::Utc::now().timestamp_millis();
        let window_ms = i64::try_from(rule.window.as_millis()).unwrap_or(i64::MAX);
        let cutoff = now_ms - window_ms;

        // One MULTI: trim, add, count. Every caller sees a distinct count,
        // so at most `limit` members survive in the window.
        let member = format!("{now_ms}-{}", uuid::Uuid::new_v4());
        let (count,): (usize,) = redis::pipe()
            .atomic()
            .zrembyscore(&redis_key, i64::MIN, cutoff)
            .ignore()
            .zadd(&redis_key, &member, now_ms)
            .ignore()
            .zcard(&redis_key)
            .expire(&redis_key, rule.window.as_secs().max(1) as i64)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| ThrottleError::Backend(e.to_string()))?;

        if !admits(count, rule.limit) {
            // Rejected requests do not occupy a slot.
            redis::cmd("ZREM")
                .arg(&redis_key)
                .arg(&member)
                .query_async::<_, ()>(&mut conn)
                .await
                .map_err(|e| ThrottleError::Backend(e.to_string()))?;
            warn!("Throttle rejected key {key} ({count}/{})", rule.limit);
            return Err(rule.exceeded());
        }

        Ok(())
    }
}

/// Whether a request whose own entry brought the window to `count` fits.
fn admits(count_including_self: usize, limit: usize) -> bool {
    count_including_self <= limit
}

/// Renders a window for user-facing messages: "15 minutes", "60 seconds".
pub fn describe_window(window_secs: u64) -> String {
    if window_secs >= 60 && window_secs % 60 == 0 {
        let minutes = window_secs / 60;
        if minutes == 1 {
            "minute".to_string()
        } else {
            format!("{minutes} minutes")
        }
    } else {
        format!("{window_secs} seconds")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_limit_then_rejects() {
        let throttle = MemoryThrottle::new();
        let rule = ThrottleRule::new(3, 60);
        let now = Instant::now();
        for _ in 0..3 {
            assert!(throttle.check_and_record_at("reset:a@b.co", rule, now).is_ok());
        }
        let err = throttle
            .check_and_record_at("reset:a@b.co", rule, now)
            .unwrap_err();
        assert!(matches!(err, ThrottleError::Exceeded { limit: 3, window_secs: 60 }));
    }

    #[test]
    fn test_keys_are_independent() {
        let throttle = MemoryThrottle::new();
        let rule = ThrottleRule::new(1, 60);
        let now = Instant::now();
        assert!(throttle.check_and_record_at("reset:a@b.co", rule, now).is_ok());
        assert!(throttle.check_and_record_at("reset:c@d.co", rule, now).is_ok());
        assert!(throttle.check_and_record_at("reset:a@b.co", rule, now).is_err());
    }

    #[test]
    fn test_window_slides() {
        let throttle = MemoryThrottle::new();
        let rule = ThrottleRule::new(2, 60);
        let start = Instant::now();
        assert!(throttle.check_and_record_at("k", rule, start).is_ok());
        assert!(throttle
            .check_and_record_at("k", rule, start + Duration::from_secs(30))
            .is_ok());
        assert!(throttle
            .check_and_record_at("k", rule, start + Duration::from_secs(45))
            .is_err());
        // First request ages out at 60s.
        assert!(throttle
            .check_and_record_at("k", rule, start + Duration::from_secs(61))
            .is_ok());
    }

    #[test]
    fn test_rejected_requests_are_not_recorded() {
        let throttle = MemoryThrottle::new();
        let rule = ThrottleRule::new(1, 10);
        let start = Instant::now();
        assert!(throttle.check_and_record_at("k", rule, start).is_ok());
        for i in 1..5 {
            assert!(throttle
                .check_and_record_at("k", rule, start + Duration::from_secs(i))
                .is_err());
        }
        assert!(throttle
            .check_and_record_at("k", rule, start + Duration::from_secs(10))
            .is_ok());
    }

    #[test]
    fn test_expired_keys_are_swept() {
        let throttle = MemoryThrottle::new();
        let rule = ThrottleRule::new(3, 60);
        let start = Instant::now();
        for i in 0..10_000 {
            let key = format!("reset:user{i}@x.io");
            assert!(throttle.check_and_record_at(&key, rule, start).is_ok());
        }
        assert_eq!(throttle.tracked_keys(), 10_000);

        let later = start + Duration::from_secs(3600);
        assert!(throttle
            .check_and_record_at("reset:late@x.io", rule, later)
            .is_ok());
        assert_eq!(throttle.tracked_keys(), 1);
    }

    #[test]
    fn test_sweep_respects_each_keys_window() {
        let throttle = MemoryThrottle::new();
        let start = Instant::now();
        assert!(throttle
            .check_and_record_at("ai:u1", ThrottleRule::new(10, 60), start)
            .is_ok());
        assert!(throttle
            .check_and_record_at("reset:a@b.co", ThrottleRule::new(3, 900), start)
            .is_ok());

        // The 60s window has expired, the 900s one has not.
        let later = start + Duration::from_secs(120);
        assert!(throttle
            .check_and_record_at("ai:u2", ThrottleRule::new(10, 60), later)
            .is_ok());
        assert_eq!(throttle.tracked_keys(), 2);
    }

    #[test]
    fn test_concurrent_adds_admit_only_up_to_limit() {
        // Two racing requests on a window holding 2 of 3 see counts 3 and 4.
        assert!(admits(3, 3));
        assert!(!admits(4, 3));
        assert!(admits(1, 1));
        assert!(!admits(1, 0));
    }

    #[test]
    fn test_describe_window() {
        assert_eq!(describe_window(900), "15 minutes");
        assert_eq!(describe_window(60), "minute");
        assert_eq!(describe_window(45), "45 seconds");
    }

    #[test]
    fn test_exceeded_maps_to_429() {
        let err: AppError = ThrottleRule::new(3, 900).exceeded().into();
        assert_eq!(err.status(), axum::http::StatusCode::TOO_MANY_REQUESTS);
        assert!(err.to_string().contains("15 minutes"));
    }
}

//! Rate Limiter (spec §4.3): a sliding window of per-user submission
//! timestamps, keyed `user_submission_timestamp:{user_id}` (spec §6).
//!
//! The purge-check-append sequence runs as a single Redis `EVAL` so it is
//! atomic per user without a client-side lock (spec §5, §9's first open
//! question about ordering).

use chrono::{Duration, SecondsFormat, Utc};
use deadpool_redis::Pool as RedisPool;
use redis::Script;

use olympus_common::AppResult;

const DEFAULT_WINDOW_SECS: i64 = 60;
const DEFAULT_MAX_SUBMISSIONS: i64 = 3;

/// Lua script performing purge-check-append atomically.
///
/// Timestamps are stored as millisecond-precision RFC3339 strings with a
/// fixed width, so lexicographic comparison against the cutoff string is
/// equivalent to chronological comparison — no date parsing needed in Lua.
const SLIDING_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local cutoff = ARGV[1]
local now = ARGV[2]
local max = tonumber(ARGV[3])
local window = tonumber(ARGV[4])

while true do
    local tail = redis.call('LINDEX', key, -1)
    if not tail then
        break
    end
    if tail < cutoff then
        redis.call('RPOP', key)
    else
        break
    end
end

local len = redis.call('LLEN', key)
if len < max then
    redis.call('LPUSH', key, now)
    redis.call('EXPIRE', key, window + 5)
    return 1
else
    return 0
end
"#;

/// Sliding-window rate limiter over a shared Redis list per user.
#[derive(Clone)]
pub struct RateLimiter {
    redis: RedisPool,
    window_secs: i64,
    max_submissions: i64,
}

impl RateLimiter {
    pub fn new(redis: RedisPool) -> Self {
        Self {
            redis,
            window_secs: DEFAULT_WINDOW_SECS,
            max_submissions: DEFAULT_MAX_SUBMISSIONS,
        }
    }

    pub fn with_limit(mut self, max_submissions: i64, window_secs: i64) -> Self {
        self.max_submissions = max_submissions;
        self.window_secs = window_secs;
        self
    }

    /// `allow_to_submit(user_id) -> bool`. If allowed, the timestamp is
    /// recorded in the same atomic step (this is the "record on successful
    /// intake" ordering the spec calls for).
    pub async fn allow_to_submit(&self, user_id: i64) -> AppResult<bool> {
        let mut conn = self.redis.get().await?;
        let key = format!("user_submission_timestamp:{user_id}");

        let now = Utc::now();
        let now_str = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        let cutoff_str = (now - Duration::seconds(self.window_secs))
            .to_rfc3339_opts(SecondsFormat::Millis, true);

        let allowed: i64 = Script::new(SLIDING_WINDOW_SCRIPT)
            .key(key)
            .arg(cutoff_str)
            .arg(now_str)
            .arg(self.max_submissions)
            .arg(self.window_secs)
            .invoke_async(&mut conn)
            .await?;

        Ok(allowed == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc3339_millis_is_lexicographically_ordered() {
        let earlier = Utc::now() - Duration::seconds(10);
        let later = Utc::now();
        let earlier_str = earlier.to_rfc3339_opts(SecondsFormat::Millis, true);
        let later_str = later.to_rfc3339_opts(SecondsFormat::Millis, true);
        assert!(earlier_str < later_str);
    }
}

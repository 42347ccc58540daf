//! Rate limiter for login attempts
//!
//! Failed logins are counted per client IP and per account. Five failures
//! inside a fifteen-minute window lock that key out for thirty minutes.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use tokio::sync::RwLock;

const MAX_FAILURES: usize = 5;
const WINDOW_MINUTES: i64 = 15;
const LOCKOUT_MINUTES: i64 = 30;

#[derive(Debug, Default)]
struct Attempts {
    failures: Vec<DateTime<Utc>>,
    locked_until: Option<DateTime<Utc>>,
}

/// What failed logins are counted against
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LoginKey {
    Client(IpAddr),
    /// `<kind>:<lowercased email>`
    Account(String),
}

impl LoginKey {
    pub fn account(kind: &str, email: &str) -> Self {
        LoginKey::Account(format!("{}:{}", kind, email.trim().to_lowercase()))
    }
}

impl fmt::Display for LoginKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginKey::Client(ip) => write!(f, "client {}", ip),
            LoginKey::Account(account) => write!(f, "account {}", account),
        }
    }
}

/// Login rate limiter
#[derive(Debug, Default)]
pub struct LoginRateLimiter {
    attempts: RwLock<HashMap<LoginKey, Attempts>>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining lockout for `key`, if any
    pub async fn locked_for(&self, key: &LoginKey) -> Option<Duration> {
        self.locked_for_at(key, Utc::now()).await
    }

    async fn locked_for_at(&self, key: &LoginKey, now: DateTime<Utc>) -> Option<Duration> {
        let attempts = self.attempts.read().await;
        attempts
            .get(key)
            .and_then(|a| a.locked_until)
            .filter(|until| *until > now)
            .map(|until| until - now)
    }

    pub async fn record_failure(&self, key: &LoginKey) {
        self.record_failure_at(key, Utc::now()).await
    }

    async fn record_failure_at(&self, key: &LoginKey, now: DateTime<Utc>) {
        let mut attempts = self.attempts.write().await;
        let entry = attempts.entry(key.clone()).or_default();

        let cutoff = now - Duration::minutes(WINDOW_MINUTES);
        entry.failures.retain(|t| *t > cutoff);
        entry.failures.push(now);

        if entry.failures.len() >= MAX_FAILURES {
            tracing::warn!("Locking out {} after {} failed logins", key, entry.failures.len());
            entry.locked_until = Some(now + Duration::minutes(LOCKOUT_MINUTES));
            entry.failures.clear();
        }
    }

    /// Forget a key's failures after a successful login
    pub async fn clear(&self, key: &LoginKey) {
        self.attempts.write().await.remove(key);
    }

    /// Drop stale entries; run periodically
    pub async fn cleanup(&self) {
        let now = Utc::now();
        let cutoff = now - Duration::minutes(WINDOW_MINUTES);
        self.attempts.write().await.retain(|_, a| {
            a.failures.retain(|t| *t > cutoff);
            !a.failures.is_empty() || a.locked_until.is_some_and(|until| until > now)
        });
    }
}

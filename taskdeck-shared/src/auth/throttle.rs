/// Login-attempt throttling
///
/// Gates authentication attempts per email to slow brute-force guessing.
/// Each email moves through three states:
///
/// ```text
/// Clear ──(failure)──> Counting ──(count reaches max)──> Locked
///   ^                     │                                 │
///   └──────(success)──────┘              (lockout elapses)──┘──> treated as Clear/Counting
/// ```
///
/// While locked, every attempt is rejected before the credential check and
/// the count is not touched. A successful authentication deletes the record.
/// An expired lockout is treated as not-locked but the record is only purged
/// on the next success; the next failure restarts the count at 1.
///
/// State is held in memory only: a process restart clears all throttling.
/// Access is serialized through a single mutex around the record map, so
/// concurrent attempts for the same email cannot lose updates.
///
/// # Example
///
/// ```
/// use taskdeck_shared::auth::throttle::{LoginThrottle, ThrottleConfig, ThrottleStatus};
///
/// let throttle = LoginThrottle::new(ThrottleConfig::default());
///
/// match throttle.status("a@x.com") {
///     ThrottleStatus::Open { attempts_remaining } => assert_eq!(attempts_remaining, 3),
///     ThrottleStatus::Locked { .. } => unreachable!(),
/// }
///
/// throttle.record_failure("a@x.com");
/// throttle.record_success("a@x.com");
/// ```

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{info, warn};

/// Throttle configuration
#[derive(Debug, Clone, Copy)]
pub struct ThrottleConfig {
    /// Failed attempts allowed before lockout
    pub max_attempts: u32,

    /// Lockout window in seconds
    pub lockout_seconds: i64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            lockout_seconds: 300,
        }
    }
}

/// Per-email attempt record
///
/// Created on first failure, mutated on each subsequent one, deleted on
/// success. Volatile: never persisted.
#[derive(Debug, Clone)]
struct AttemptRecord {
    /// Consecutive failures since the last success
    failures: u32,

    /// Set when the count reaches the maximum; attempts are rejected until
    /// this instant passes
    lockout_until: Option<DateTime<Utc>>,
}

/// Result of consulting the throttle for an email
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleStatus {
    /// Attempts are permitted; `attempts_remaining` failures are left
    /// before lockout
    Open {
        /// Failures remaining before the lockout triggers
        attempts_remaining: u32,
    },

    /// Attempts are rejected until the lockout elapses
    Locked {
        /// Time left on the lockout
        remaining: Duration,
    },
}

/// In-memory per-email login throttle
///
/// Owned by application state and shared via `Arc`; the interior mutex
/// serializes all record access.
#[derive(Debug)]
pub struct LoginThrottle {
    config: ThrottleConfig,
    records: Mutex<HashMap<String, AttemptRecord>>,
}

impl LoginThrottle {
    /// Creates a throttle with the given configuration
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Reports the current status for an email without mutating state
    ///
    /// An expired lockout reads as `Open` with a full allowance; the stale
    /// record itself is only removed on the next successful attempt.
    pub fn status(&self, email: &str) -> ThrottleStatus {
        self.status_at(email, Utc::now())
    }

    fn status_at(&self, email: &str, now: DateTime<Utc>) -> ThrottleStatus {
        let records = self.records.lock().unwrap();

        match records.get(email) {
            None => ThrottleStatus::Open {
                attempts_remaining: self.config.max_attempts,
            },
            Some(record) => match record.lockout_until {
                Some(until) if until > now => ThrottleStatus::Locked {
                    remaining: until - now,
                },
                Some(_) => ThrottleStatus::Open {
                    // Lockout elapsed: treated as a fresh allowance, record
                    // retained until the next success
                    attempts_remaining: self.config.max_attempts,
                },
                None => ThrottleStatus::Open {
                    attempts_remaining: self.config.max_attempts.saturating_sub(record.failures),
                },
            },
        }
    }

    /// Records a failed authentication attempt
    ///
    /// Increments the count; reaching the configured maximum sets the
    /// lockout and returns `Locked`. A failure after an expired lockout
    /// restarts the count at 1. Must not be called while the status is
    /// `Locked` with time remaining (the caller rejects those attempts
    /// before the credential check).
    pub fn record_failure(&self, email: &str) -> ThrottleStatus {
        self.record_failure_at(email, Utc::now())
    }

    fn record_failure_at(&self, email: &str, now: DateTime<Utc>) -> ThrottleStatus {
        let mut records = self.records.lock().unwrap();

        let record = records.entry(email.to_string()).or_insert(AttemptRecord {
            failures: 0,
            lockout_until: None,
        });

        // A stale lockout behaves like a clean slate
        if let Some(until) = record.lockout_until {
            if until <= now {
                record.failures = 0;
                record.lockout_until = None;
            }
        }

        record.failures += 1;

        if record.failures >= self.config.max_attempts {
            let until = now + Duration::seconds(self.config.lockout_seconds);
            record.lockout_until = Some(until);
            warn!(
                email = email,
                failures = record.failures,
                lockout_seconds = self.config.lockout_seconds,
                "Login throttle lockout triggered"
            );
            ThrottleStatus::Locked {
                remaining: until - now,
            }
        } else {
            ThrottleStatus::Open {
                attempts_remaining: self.config.max_attempts - record.failures,
            }
        }
    }

    /// Records a successful authentication, clearing the record
    pub fn record_success(&self, email: &str) {
        let mut records = self.records.lock().unwrap();
        if records.remove(email).is_some() {
            info!(email = email, "Login throttle record cleared");
        }
    }
}

/// Formats a remaining lockout duration as minutes and seconds ("5m 0s")
pub fn format_remaining(remaining: Duration) -> String {
    let total = remaining.num_seconds().max(0);
    format!("{}m {}s", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttle() -> LoginThrottle {
        LoginThrottle::new(ThrottleConfig::default())
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_clear_email_has_full_allowance() {
        let t = throttle();
        assert_eq!(
            t.status("a@x.com"),
            ThrottleStatus::Open {
                attempts_remaining: 3
            }
        );
    }

    #[test]
    fn test_status_does_not_mutate() {
        let t = throttle();
        t.record_failure("a@x.com");
        let before = t.status("a@x.com");
        let after = t.status("a@x.com");
        assert_eq!(before, after);
        assert_eq!(
            before,
            ThrottleStatus::Open {
                attempts_remaining: 2
            }
        );
    }

    #[test]
    fn test_third_failure_locks() {
        let t = throttle();
        let start = now();
        assert_eq!(
            t.record_failure_at("a@x.com", start),
            ThrottleStatus::Open {
                attempts_remaining: 2
            }
        );
        assert_eq!(
            t.record_failure_at("a@x.com", start),
            ThrottleStatus::Open {
                attempts_remaining: 1
            }
        );
        match t.record_failure_at("a@x.com", start) {
            ThrottleStatus::Locked { remaining } => {
                assert_eq!(remaining.num_seconds(), 300);
            }
            other => panic!("expected locked, got {:?}", other),
        }
        // Attempts-remaining derives to 0 only via the locked branch; while
        // locked, status reports the remaining time
        match t.status_at("a@x.com", start) {
            ThrottleStatus::Locked { remaining } => {
                assert!(remaining.num_seconds() <= 300);
            }
            other => panic!("expected locked, got {:?}", other),
        }
    }

    #[test]
    fn test_success_clears_record() {
        let t = throttle();
        t.record_failure("a@x.com");
        t.record_failure("a@x.com");
        t.record_success("a@x.com");
        assert_eq!(
            t.status("a@x.com"),
            ThrottleStatus::Open {
                attempts_remaining: 3
            }
        );
    }

    #[test]
    fn test_lockout_expiry_reads_as_open() {
        let t = throttle();
        let start = now();
        for _ in 0..3 {
            t.record_failure_at("a@x.com", start);
        }

        // Still locked one second before expiry
        let almost = start + Duration::seconds(299);
        assert!(matches!(
            t.status_at("a@x.com", almost),
            ThrottleStatus::Locked { .. }
        ));

        // Open once the window has elapsed; record not purged, but the
        // allowance is full again
        let after = start + Duration::seconds(301);
        assert_eq!(
            t.status_at("a@x.com", after),
            ThrottleStatus::Open {
                attempts_remaining: 3
            }
        );
    }

    #[test]
    fn test_failure_after_expired_lockout_restarts_count() {
        let t = throttle();
        let start = now();
        for _ in 0..3 {
            t.record_failure_at("a@x.com", start);
        }

        let after = start + Duration::seconds(301);
        assert_eq!(
            t.record_failure_at("a@x.com", after),
            ThrottleStatus::Open {
                attempts_remaining: 2
            }
        );
    }

    #[test]
    fn test_emails_are_throttled_independently() {
        let t = throttle();
        let start = now();
        for _ in 0..3 {
            t.record_failure_at("a@x.com", start);
        }
        assert!(matches!(
            t.status_at("a@x.com", start),
            ThrottleStatus::Locked { .. }
        ));
        assert_eq!(
            t.status_at("b@x.com", start),
            ThrottleStatus::Open {
                attempts_remaining: 3
            }
        );
    }

    #[test]
    fn test_custom_config() {
        let t = LoginThrottle::new(ThrottleConfig {
            max_attempts: 1,
            lockout_seconds: 60,
        });
        match t.record_failure("a@x.com") {
            ThrottleStatus::Locked { remaining } => assert_eq!(remaining.num_seconds(), 60),
            other => panic!("expected locked, got {:?}", other),
        }
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(Duration::seconds(300)), "5m 0s");
        assert_eq!(format_remaining(Duration::seconds(61)), "1m 1s");
        assert_eq!(format_remaining(Duration::seconds(0)), "0m 0s");
        assert_eq!(format_remaining(Duration::seconds(-5)), "0m 0s");
    }
}

//! Per-scope cooldown gate.
//!
//! The gate remembers when each conversation scope last made an accepted
//! request.  It is backed by [`DashMap`]; the check and the update for one
//! scope happen under a single entry lock, so two concurrent callers for the
//! same scope can never both pass within one window.
//!
//! Entries are never evicted.  One timestamp per scope that has ever spoken
//! is small, but the table does grow without bound.
//!
//! # Example
//!
//! ```rust
//! # use std::time::{Duration, Instant};
//! # use quipster_agent::cooldown::{CooldownGate, Scope};
//! let gate = CooldownGate::new(Duration::from_millis(3500));
//! let scope = Scope::from(42_u64);
//! let t0 = Instant::now();
//!
//! assert!(!gate.check_and_mark(&scope, t0));
//! assert!(gate.check_and_mark(&scope, t0 + Duration::from_secs(1)));
//! assert!(!gate.check_and_mark(&scope, t0 + Duration::from_secs(4)));
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Default minimum spacing between accepted requests from one scope.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(3500);

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// Opaque conversation-scope key (a guild, group or channel id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scope(String);

impl Scope {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for Scope {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for Scope {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for Scope {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Cooldown table keyed by [`Scope`].
///
/// Cheaply cloneable; clones share the same table.
#[derive(Debug, Clone)]
pub struct CooldownGate {
    window: Duration,
    last_accepted: Arc<DashMap<Scope, Instant>>,
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl CooldownGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: Arc::new(DashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Check `scope` against the configured window at time `now`.
    ///
    /// Returns `true` when the scope is on cooldown and the request must be
    /// rejected.  See [`check_and_mark_with`](Self::check_and_mark_with).
    pub fn check_and_mark(&self, scope: &Scope, now: Instant) -> bool {
        self.check_and_mark_with(scope, now, self.window)
    }

    /// Same as [`check_and_mark`](Self::check_and_mark) at the current
    /// instant.
    pub fn check_and_mark_now(&self, scope: &Scope) -> bool {
        self.check_and_mark(scope, Instant::now())
    }

    /// Atomically check and update the timestamp for `scope`.
    ///
    /// If the scope has no timestamp, or at least `window` has elapsed since
    /// it, `now` is recorded and `false` is returned.  Otherwise returns
    /// `true` and leaves the stored timestamp untouched, so rejected
    /// requests never extend the window.
    pub fn check_and_mark_with(&self, scope: &Scope, now: Instant, window: Duration) -> bool {
        match self.last_accepted.entry(scope.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(now);
                false
            }
            Entry::Occupied(mut slot) => {
                let last = *slot.get();
                if now.saturating_duration_since(last) >= window && now >= last {
                    slot.insert(now);
                    false
                } else {
                    tracing::debug!(scope = %scope, "scope on cooldown");
                    true
                }
            }
        }
    }

    /// Last accepted instant for `scope`, if any.
    pub fn last_accepted(&self, scope: &Scope) -> Option<Instant> {
        self.last_accepted.get(scope).map(|entry| *entry.value())
    }

    /// Number of scopes that have made at least one accepted request.
    pub fn len(&self) -> usize {
        self.last_accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_accepted.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(3500);

    #[test]
    fn first_request_passes_and_is_recorded() {
        let gate = CooldownGate::new(WINDOW);
        let scope = Scope::from("guild-1");
        let now = Instant::now();

        assert!(!gate.check_and_mark(&scope, now));
        assert_eq!(gate.last_accepted(&scope), Some(now));
        assert_eq!(gate.len(), 1);
    }

    #[test]
    fn second_request_inside_window_is_rejected() {
        let gate = CooldownGate::new(WINDOW);
        let scope = Scope::from(7_u64);
        let t1 = Instant::now();

        assert!(!gate.check_and_mark(&scope, t1));
        assert!(gate.check_and_mark(&scope, t1 + Duration::from_secs(1)));
    }

    #[test]
    fn request_at_exact_window_passes() {
        let gate = CooldownGate::new(WINDOW);
        let scope = Scope::from(7_u64);
        let t1 = Instant::now();

        assert!(!gate.check_and_mark(&scope, t1));
        assert!(!gate.check_and_mark(&scope, t1 + WINDOW));
        assert_eq!(gate.last_accepted(&scope), Some(t1 + WINDOW));
    }

    #[test]
    fn rejection_does_not_extend_window() {
        let gate = CooldownGate::new(WINDOW);
        let scope = Scope::from("s");
        let t1 = Instant::now();

        assert!(!gate.check_and_mark(&scope, t1));
        assert!(gate.check_and_mark(&scope, t1 + Duration::from_secs(3)));
        assert_eq!(gate.last_accepted(&scope), Some(t1));
        // 3.6s after the accepted request, even though only 0.6s after the
        // rejected one.
        assert!(!gate.check_and_mark(&scope, t1 + Duration::from_millis(3600)));
    }

    #[test]
    fn scopes_are_independent() {
        let gate = CooldownGate::new(WINDOW);
        let now = Instant::now();

        assert!(!gate.check_and_mark(&Scope::from(1_u64), now));
        assert!(!gate.check_and_mark(&Scope::from(2_u64), now));
        assert!(gate.check_and_mark(&Scope::from(1_u64), now));
        assert_eq!(gate.len(), 2);
    }

    #[test]
    fn earlier_instant_never_moves_timestamp_back() {
        let gate = CooldownGate::new(Duration::ZERO);
        let scope = Scope::from("s");
        let t1 = Instant::now() + Duration::from_secs(10);

        assert!(!gate.check_and_mark(&scope, t1));
        assert!(gate.check_and_mark(&scope, t1 - Duration::from_secs(5)));
        assert_eq!(gate.last_accepted(&scope), Some(t1));
    }

    #[test]
    fn explicit_window_overrides_configured() {
        let gate = CooldownGate::new(WINDOW);
        let scope = Scope::from("s");
        let t1 = Instant::now();

        assert!(!gate.check_and_mark_with(&scope, t1, Duration::from_secs(1)));
        assert!(!gate.check_and_mark_with(&scope, t1 + Duration::from_secs(1), Duration::from_secs(1)));
    }

    #[test]
    fn concurrent_callers_admit_exactly_one() {
        let gate = CooldownGate::new(Duration::from_secs(60));
        let scope = Scope::from("busy");
        let now = Instant::now();

        let admitted = std::thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|_| s.spawn(|| !gate.check_and_mark(&scope, now)))
                .collect();
            handles
                .into_iter()
                .filter_map(|h| h.join().ok())
                .filter(|passed| *passed)
                .count()
        });

        assert_eq!(admitted, 1);
    }
}

//! Rate limiting implementation
//!
//! Two mechanisms share one suspension point:
//!
//! - the server-reported budget (`x-ratelimit-remaining` / `x-ratelimit-reset`),
//!   tracked in [`RateState`] and guarded by [`RateGovernor`];
//! - optional client-side pacing, a token bucket from the governor crate that
//!   spaces requests at a fixed minimum interval.

use crate::cancel::CancelToken;
use crate::error::Result;
use chrono::{DateTime, Utc};
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use reqwest::header::HeaderMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Header carrying the window size
pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
/// Header carrying the remaining budget
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
/// Header carrying the reset time (Unix epoch seconds)
pub const RESET_HEADER: &str = "x-ratelimit-reset";

fn header_number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

// ============================================================================
// Rate State
// ============================================================================

/// Remaining request budget as last reported by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateState {
    /// Requests left in the current window
    pub remaining: u32,
    /// Window size
    pub limit: u32,
    /// When the window resets
    pub reset_at: DateTime<Utc>,
}

impl RateState {
    /// Create a new rate state
    pub fn new(limit: u32, remaining: u32, reset_at: DateTime<Utc>) -> Self {
        Self {
            remaining,
            limit,
            reset_at,
        }
    }

    /// Read the rate-limit headers. `None` when the API did not report limits.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let remaining: u32 = header_number(headers, REMAINING_HEADER)?;
        let reset_epoch: i64 = header_number(headers, RESET_HEADER)?;
        let reset_at = DateTime::from_timestamp(reset_epoch, 0)?;
        let limit = header_number(headers, LIMIT_HEADER).unwrap_or(remaining);
        Some(Self::new(limit, remaining, reset_at))
    }

    /// Whether the budget is used up
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// How long a caller must wait at `now` before the next request
    pub fn wait_at(&self, now: DateTime<Utc>) -> Duration {
        if self.remaining > 0 {
            return Duration::ZERO;
        }
        (self.reset_at - now).to_std().unwrap_or(Duration::ZERO)
    }
}

// ============================================================================
// Request Pacer
// ============================================================================

/// Fixed-interval pacing between requests
#[derive(Clone)]
pub struct RequestPacer {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
    interval: Duration,
}

impl RequestPacer {
    /// Allow one request per `interval`. `None` for a zero interval.
    pub fn new(interval: Duration) -> Option<Self> {
        let quota = Quota::with_period(interval)?;
        Some(Self {
            limiter: Arc::new(Governor::direct(quota)),
            interval,
        })
    }

    /// Minimum spacing between requests
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the next request may go out
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// Try to take a slot without waiting
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl std::fmt::Debug for RequestPacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPacer")
            .field("interval", &self.interval)
            .finish()
    }
}

// ============================================================================
// Rate Governor
// ============================================================================

/// Shared owner of the process-wide [`RateState`].
///
/// Cloning the governor shares the state, so every executor built from the
/// same handle draws on one budget. All reads and updates go through a single
/// mutex.
#[derive(Clone, Default)]
pub struct RateGovernor {
    state: Arc<Mutex<Option<RateState>>>,
    pacer: Option<RequestPacer>,
}

impl RateGovernor {
    /// Create a governor with no known budget
    pub fn new() -> Self {
        Self::default()
    }

    /// Also enforce a minimum interval between requests
    #[must_use]
    pub fn with_pacing(mut self, interval: Duration) -> Self {
        self.pacer = RequestPacer::new(interval);
        self
    }

    /// Seed the governor with a known state
    pub fn with_state(state: RateState) -> Self {
        Self {
            state: Arc::new(Mutex::new(Some(state))),
            pacer: None,
        }
    }

    /// Current state, if the API has reported one
    pub async fn state(&self) -> Option<RateState> {
        *self.state.lock().await
    }

    /// Update the budget from response headers.
    ///
    /// Within one window the smaller `remaining` wins, so a late response to an
    /// earlier request cannot hand back budget that was already spent. A
    /// response from an older window is ignored.
    pub async fn observe(&self, headers: &HeaderMap) {
        let Some(observed) = RateState::from_headers(headers) else {
            return;
        };
        let mut guard = self.state.lock().await;
        let next = match *guard {
            Some(current) if current.reset_at > observed.reset_at => return,
            Some(current) if current.reset_at == observed.reset_at => RateState {
                remaining: current.remaining.min(observed.remaining),
                ..observed
            },
            _ => observed,
        };
        debug!(
            remaining = next.remaining,
            limit = next.limit,
            reset_at = %next.reset_at,
            "Rate limit observed"
        );
        *guard = Some(next);
    }

    /// Wait required before the next request
    pub async fn should_wait(&self) -> Duration {
        self.should_wait_at(Utc::now()).await
    }

    /// Wait required before the next request, evaluated at `now`
    pub async fn should_wait_at(&self, now: DateTime<Utc>) -> Duration {
        match *self.state.lock().await {
            Some(state) => state.wait_at(now),
            None => Duration::ZERO,
        }
    }

    /// Reserve one unit of budget.
    ///
    /// Returns zero when the caller may send now (one unit has been consumed),
    /// otherwise the time until the window resets.
    pub async fn reserve(&self) -> Duration {
        self.reserve_at(Utc::now()).await
    }

    /// [`reserve`](Self::reserve) evaluated at `now`
    pub async fn reserve_at(&self, now: DateTime<Utc>) -> Duration {
        let mut guard = self.state.lock().await;
        let Some(state) = guard.as_mut() else {
            return Duration::ZERO;
        };

        if state.remaining == 0 && now >= state.reset_at {
            state.remaining = state.limit;
        }

        if state.remaining > 0 {
            state.remaining -= 1;
            Duration::ZERO
        } else {
            state.wait_at(now)
        }
    }

    /// Suspend until a request may be issued. Returns the time spent waiting
    /// on the budget (pacing is not counted).
    pub async fn acquire(&self, cancel: &CancelToken) -> Result<Duration> {
        let mut waited = Duration::ZERO;
        loop {
            let wait = self.reserve().await;
            if wait.is_zero() {
                break;
            }
            warn!("Rate limit exhausted, waiting {:?} for reset", wait);
            cancel.sleep(wait).await?;
            waited += wait;
        }

        if let Some(ref pacer) = self.pacer {
            cancel.run(pacer.wait()).await?;
        }

        Ok(waited)
    }

    /// Whether request pacing is enabled
    pub fn has_pacer(&self) -> bool {
        self.pacer.is_some()
    }
}

impl std::fmt::Debug for RateGovernor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateGovernor")
            .field("pacer", &self.pacer)
            .finish_non_exhaustive()
    }
}

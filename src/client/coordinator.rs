//! Debounced, cancellable re-querying for a single search field.
//!
//! [`SearchCoordinator`] is a synchronous state machine. The driver feeds it
//! keystrokes ([`SearchCoordinator::input`]), wakes it at
//! [`SearchCoordinator::next_deadline`] ([`SearchCoordinator::tick`]), runs
//! the returned [`Dispatch`] and reports the outcome back
//! ([`SearchCoordinator::resolve`]). Time comes from a [`Clock`], so the
//! whole flow is testable without real timers.
//!
//! Every issued request gets a sequence number one higher than the last.
//! Only the response carrying the latest number is ever applied; anything
//! else is discarded on arrival.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{AbortHandle, AbortRegistration};
use thiserror::Error;

use crate::models::search::{SearchRequest, SearchResult, SortKey, DEFAULT_PAGE_SIZE};
use crate::search::taxonomy::TypeScope;

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Millisecond time source.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// A clock that only moves when told to.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Quiet period after the last keystroke before a request is issued.
    pub debounce_ms: u64,
    /// How long a request may stay unanswered before its slot is freed.
    pub timeout_ms: u64,
    pub page_size: u32,
    pub sort: SortKey,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            page_size: DEFAULT_PAGE_SIZE,
            sort: SortKey::default(),
        }
    }
}

/// Why a search request produced no result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The server answered 503. The same request may be repeated.
    #[error("Search is temporarily unavailable: {0}")]
    Unavailable(String),
    /// The server rejected the request parameters.
    #[error("Search request rejected: {0}")]
    Rejected(String),
    #[error("Network error: {0}")]
    Transport(String),
    #[error("Search timed out")]
    TimedOut,
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::Rejected(_))
    }
}

/// Coarse view of the coordinator, mirroring `Idle -> Pending -> InFlight`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    /// A debounce timer is running.
    Pending,
    /// A request is awaiting its response and no timer is running.
    InFlight,
}

/// What happened to a response handed to [`SearchCoordinator::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The response was for the latest request and is now displayed.
    Applied,
    /// The latest request failed; the error is now displayed.
    Failed,
    /// The response was superseded or timed out and has been ignored.
    Discarded,
}

/// The request currently considered authoritative.
#[derive(Debug)]
pub struct PendingQuery {
    seq: u64,
    key: QueryKey,
    issued_at: u64,
    abort: AbortHandle,
}

impl PendingQuery {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn term(&self) -> &str {
        &self.key.term
    }

    fn cancel(self) {
        self.abort.abort();
    }
}

/// A request the driver must now send.
///
/// Wrap the transport future with
/// `futures::future::Abortable::new(fut, dispatch.registration)` so that a
/// superseded request is abandoned.
#[derive(Debug)]
pub struct Dispatch {
    pub seq: u64,
    pub request: SearchRequest,
    pub registration: AbortRegistration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct QueryKey {
    term: String,
    page: u32,
}

#[derive(Debug)]
struct Debounce {
    term: String,
    fire_at: u64,
}

pub struct SearchCoordinator<C: Clock> {
    clock: C,
    config: CoordinatorConfig,
    scope: Option<TypeScope>,
    timer: Option<Debounce>,
    in_flight: Option<PendingQuery>,
    last_submitted: Option<QueryKey>,
    last_issued: u64,
    last_applied: Option<u64>,
    displayed: Option<SearchResult>,
    displayed_term: Option<String>,
    error: Option<FetchError>,
}

impl<C: Clock> SearchCoordinator<C> {
    /// A coordinator for a field whose results are restricted to `scope`.
    pub fn new(clock: C, scope: Option<TypeScope>) -> Self {
        Self::with_config(clock, scope, CoordinatorConfig::default())
    }

    pub fn with_config(clock: C, scope: Option<TypeScope>, config: CoordinatorConfig) -> Self {
        Self {
            clock,
            config,
            scope,
            timer: None,
            in_flight: None,
            last_submitted: None,
            last_issued: 0,
            last_applied: None,
            displayed: None,
            displayed_term: None,
            error: None,
        }
    }

    /// Record a keystroke. Restarts the debounce timer.
    pub fn input(&mut self, term: &str) {
        self.timer = Some(Debounce {
            term: term.trim().to_string(),
            fire_at: self.clock.now_ms() + self.config.debounce_ms,
        });
    }

    /// Jump to another page of the current term, bypassing the debounce.
    pub fn go_to_page(&mut self, page: u32) -> Option<Dispatch> {
        let term = self
            .timer
            .take()
            .map(|t| t.term)
            .or_else(|| self.last_submitted.as_ref().map(|k| k.term.clone()))
            .or_else(|| self.displayed_term.clone())
            .unwrap_or_default();

        self.submit(QueryKey {
            term,
            page: page.max(1),
        })
    }

    /// Advance to the current time: fire an elapsed debounce timer and expire
    /// an overdue request. Returns the request to send, if any.
    pub fn tick(&mut self) -> Option<Dispatch> {
        let now = self.clock.now_ms();

        if let Some(query) = self.in_flight.take_if(|q| now >= q.issued_at + self.config.timeout_ms)
        {
            tracing::debug!(seq = query.seq, "search request timed out");
            query.cancel();
            self.last_submitted = None;
            self.error = Some(FetchError::TimedOut);
        }

        let timer = self.timer.take_if(|t| now >= t.fire_at)?;
        self.submit(QueryKey {
            term: timer.term,
            page: 1,
        })
    }

    fn submit(&mut self, key: QueryKey) -> Option<Dispatch> {
        if self.last_submitted.as_ref() == Some(&key) {
            return None;
        }

        if let Some(previous) = self.in_flight.take() {
            tracing::debug!(seq = previous.seq, "superseding search request");
            previous.cancel();
        }

        self.last_issued += 1;
        let seq = self.last_issued;
        let (abort, registration) = AbortHandle::new_pair();

        let request = SearchRequest {
            term: key.term.clone(),
            scope: self.scope,
            page: key.page,
            size: self.config.page_size,
            sort: self.config.sort,
        };

        self.in_flight = Some(PendingQuery {
            seq,
            key: key.clone(),
            issued_at: self.clock.now_ms(),
            abort,
        });
        self.last_submitted = Some(key);
        self.error = None;

        Some(Dispatch {
            seq,
            request,
            registration,
        })
    }

    /// Hand back the outcome of the request numbered `seq`.
    pub fn resolve(&mut self, seq: u64, outcome: Result<SearchResult, FetchError>) -> Resolution {
        let Some(query) = self.in_flight.take_if(|q| q.seq == seq) else {
            tracing::debug!(seq, latest = self.last_issued, "discarding stale search response");
            return Resolution::Discarded;
        };

        match outcome {
            Ok(result) => {
                self.displayed = Some(result);
                self.displayed_term = Some(query.key.term);
                self.last_applied = Some(seq);
                self.error = None;
                Resolution::Applied
            }
            Err(err) => {
                // Leave the field re-queryable with the same term.
                self.last_submitted = None;
                self.error = Some(err);
                Resolution::Failed
            }
        }
    }

    pub fn state(&self) -> CoordinatorState {
        if self.timer.is_some() {
            CoordinatorState::Pending
        } else if self.in_flight.is_some() {
            CoordinatorState::InFlight
        } else {
            CoordinatorState::Idle
        }
    }

    /// When the driver should next call [`tick`](Self::tick).
    pub fn next_deadline(&self) -> Option<u64> {
        let timer = self.timer.as_ref().map(|t| t.fire_at);
        let timeout = self
            .in_flight
            .as_ref()
            .map(|q| q.issued_at + self.config.timeout_ms);
        match (timer, timeout) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn in_flight(&self) -> Option<&PendingQuery> {
        self.in_flight.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The result currently on screen.
    pub fn results(&self) -> Option<&SearchResult> {
        self.displayed.as_ref()
    }

    /// The term the displayed result was fetched for.
    pub fn displayed_term(&self) -> Option<&str> {
        self.displayed_term.as_deref()
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn last_issued_seq(&self) -> u64 {
        self.last_issued
    }

    pub fn last_applied_seq(&self) -> Option<u64> {
        self.last_applied
    }

    pub fn scope(&self) -> Option<TypeScope> {
        self.scope
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}

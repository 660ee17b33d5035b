//! Per-request aggregation of segment outcomes.
//!
//! A [`PartAggregator`] counts down the segments of one send and keeps the
//! highest failure level seen so far. Completions may arrive on any thread in
//! any order; all updates are serialized by the aggregator's mutex. Waiters
//! park until the count reaches zero or their deadline passes.

use std::fmt;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use smsgate_core::{classify, FailureLevel, ResultCode};
use tokio::sync::watch;

use super::error::SendError;

/// Aggregated outcome of one send.
///
/// `pending_parts > 0` means the wait budget ran out before every segment
/// reported back; the true outcome of those segments is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    pub pending_parts: u32,
    pub highest_failure: FailureLevel,
}

impl SendResult {
    /// Every segment reported back.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.pending_parts == 0
    }

    /// The wait budget ran out with segments still unaccounted for.
    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.pending_parts > 0
    }

    /// Every segment reported back and none of them failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.is_complete() && self.highest_failure == FailureLevel::None
    }
}

impl fmt::Display for SendResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SendResult: pending={}, highest_failure={}",
            self.pending_parts, self.highest_failure
        )
    }
}

/// Effect of one [`PartAggregator::record_part`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartRecorded {
    /// State after the update.
    pub result: SendResult,
    /// This call accounted for the last pending segment.
    pub resolved_request: bool,
}

#[derive(Debug)]
struct PartState {
    pending: u32,
    highest: FailureLevel,
}

impl PartState {
    fn snapshot(&self) -> SendResult {
        SendResult {
            pending_parts: self.pending,
            highest_failure: self.highest,
        }
    }
}

/// Counts down the segments of one in-flight send.
#[derive(Debug)]
pub struct PartAggregator {
    expected_parts: u32,
    state: Mutex<PartState>,
    resolved: Condvar,
    pending_tx: watch::Sender<u32>,
}

impl PartAggregator {
    /// Creates an aggregator expecting `expected_parts` completions.
    ///
    /// # Errors
    ///
    /// Returns `SendError::InvalidPartCount` when `expected_parts` is zero or
    /// does not fit in a `u32`.
    pub fn new(expected_parts: usize) -> Result<Self, SendError> {
        let expected_parts = u32::try_from(expected_parts)
            .ok()
            .filter(|n| *n > 0)
            .ok_or(SendError::InvalidPartCount)?;
        let (pending_tx, _) = watch::channel(expected_parts);
        Ok(Self {
            expected_parts,
            state: Mutex::new(PartState {
                pending: expected_parts,
                highest: FailureLevel::None,
            }),
            resolved: Condvar::new(),
            pending_tx,
        })
    }

    #[must_use]
    pub fn expected_parts(&self) -> u32 {
        self.expected_parts
    }

    /// Records the outcome of one segment.
    ///
    /// Wakes every waiter once the last pending segment is recorded. A
    /// completion beyond the expected count still joins its failure level but
    /// leaves the count at zero.
    pub fn record_part(&self, code: ResultCode) -> PartRecorded {
        let level = classify(code);
        let mut state = self.state.lock();
        state.highest = state.highest.join(level);
        if state.pending == 0 {
            tracing::warn!(
                result_code = code.as_raw(),
                expected_parts = self.expected_parts,
                "completion beyond expected part count"
            );
            return PartRecorded {
                result: state.snapshot(),
                resolved_request: false,
            };
        }
        state.pending -= 1;
        self.pending_tx.send_replace(state.pending);
        let resolved_request = state.pending == 0;
        if resolved_request {
            self.resolved.notify_all();
        }
        PartRecorded {
            result: state.snapshot(),
            resolved_request,
        }
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.state.lock().pending > 0
    }

    #[must_use]
    pub fn highest_failure(&self) -> FailureLevel {
        self.state.lock().highest
    }

    #[must_use]
    pub fn snapshot(&self) -> SendResult {
        self.state.lock().snapshot()
    }

    /// Blocks until every segment reported back or `deadline` passes.
    ///
    /// Spurious wakeups re-arm the wait against the same absolute deadline, so
    /// the total wait never exceeds the budget.
    pub fn wait_until(&self, deadline: Instant) -> SendResult {
        let mut state = self.state.lock();
        while state.pending > 0 {
            if self.resolved.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        state.snapshot()
    }

    /// Async counterpart of [`PartAggregator::wait_until`].
    pub async fn wait_until_async(&self, deadline: tokio::time::Instant) -> SendResult {
        let mut pending_rx = self.pending_tx.subscribe();
        let _ = tokio::time::timeout_at(deadline, pending_rx.wait_for(|pending| *pending == 0))
            .await;
        self.snapshot()
    }
}

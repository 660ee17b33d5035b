//! In-process radio that answers completion tokens on its own threads.
//!
//! Used by the `sms-sim` binary and by integration-style tests. Each queued
//! segment is answered after a random latency; a configurable share of
//! segments fail or are never answered at all.

use std::thread;
use std::time::Duration;

use rand::Rng;
use serde::Deserialize;
use smsgate_core::{CompletionToken, ResultCode};

use crate::sender::CompletionHandler;
use crate::traits::{Addressing, SegmentSubmission, SmsTransport, TransmitError};

/// Behaviour of the simulated radio.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RadioProfile {
    /// Lower bound of the per-segment answer latency.
    pub min_latency_ms: u64,
    /// Upper bound of the per-segment answer latency.
    pub max_latency_ms: u64,
    /// Probability that a segment is never answered.
    pub drop_rate: f64,
    /// Probability that an answered segment fails.
    pub failure_rate: f64,
    /// Result code reported for failed segments.
    pub failure_code: i32,
    /// Carrier error code attached to failed segments.
    pub carrier_error_code: Option<i32>,
    /// Destinations refused up front, as if missing from the FDN list.
    pub blocked_destinations: Vec<String>,
}

impl Default for RadioProfile {
    fn default() -> Self {
        Self {
            min_latency_ms: 20,
            max_latency_ms: 200,
            drop_rate: 0.0,
            failure_rate: 0.0,
            failure_code: ResultCode::GenericFailure.as_raw(),
            carrier_error_code: None,
            blocked_destinations: Vec::new(),
        }
    }
}

/// Transport that fakes a radio: accepts segments and answers them later.
pub struct SimulatedRadio {
    handler: CompletionHandler,
    profile: RadioProfile,
}

impl SimulatedRadio {
    /// Creates a radio; rates are clamped to `[0, 1]` and non-finite rates
    /// count as zero.
    pub fn new(handler: CompletionHandler, mut profile: RadioProfile) -> Self {
        profile.drop_rate = probability("drop_rate", profile.drop_rate);
        profile.failure_rate = probability("failure_rate", profile.failure_rate);
        if profile.max_latency_ms < profile.min_latency_ms {
            profile.max_latency_ms = profile.min_latency_ms;
        }
        Self { handler, profile }
    }

    fn check_destination(&self, destination: &str) -> Result<(), TransmitError> {
        if destination.is_empty() {
            return Err(TransmitError::InvalidArgument("empty destination".into()));
        }
        if self
            .profile
            .blocked_destinations
            .iter()
            .any(|blocked| blocked == destination)
        {
            return Err(TransmitError::FdnRestricted);
        }
        Ok(())
    }

    /// Schedules the answer for one segment, or drops it.
    fn schedule(&self, segment: SegmentSubmission) {
        let mut rng = rand::rng();
        if rng.random_bool(self.profile.drop_rate) {
            tracing::debug!(
                request_id = %segment.sent.request_id,
                part_id = %segment.sent.part_id,
                "simulated radio dropped segment"
            );
            return;
        }
        let failed = rng.random_bool(self.profile.failure_rate);
        let latency = Duration::from_millis(
            rng.random_range(self.profile.min_latency_ms..=self.profile.max_latency_ms),
        );
        let (code, error_code) = if failed {
            (
                ResultCode::from_raw(self.profile.failure_code),
                self.profile.carrier_error_code,
            )
        } else {
            (ResultCode::Ok, None)
        };

        let handler = self.handler.clone();
        let SegmentSubmission { sent, delivered, .. } = segment;
        thread::spawn(move || answer(&handler, latency, &sent, code, error_code, delivered));
    }
}

fn probability(name: &str, rate: f64) -> f64 {
    if rate.is_finite() {
        rate.clamp(0.0, 1.0)
    } else {
        tracing::warn!(name, rate, "ignoring non-finite radio rate");
        0.0
    }
}

fn answer(
    handler: &CompletionHandler,
    latency: Duration,
    sent: &CompletionToken,
    code: ResultCode,
    error_code: Option<i32>,
    delivered: Option<CompletionToken>,
) {
    thread::sleep(latency);
    handler.on_completion(sent, code, error_code);
    if let Some(delivered) = delivered.filter(|_| code.is_ok()) {
        thread::sleep(latency);
        handler.on_completion(&delivered, ResultCode::Ok, None);
    }
}

impl SmsTransport for SimulatedRadio {
    fn send_text(
        &self,
        addressing: &Addressing<'_>,
        segment: SegmentSubmission,
    ) -> Result<(), TransmitError> {
        self.check_destination(addressing.destination)?;
        self.schedule(segment);
        Ok(())
    }

    fn send_multipart_text(
        &self,
        addressing: &Addressing<'_>,
        segments: Vec<SegmentSubmission>,
    ) -> Result<(), TransmitError> {
        self.check_destination(addressing.destination)?;
        if segments.is_empty() {
            return Err(TransmitError::InvalidArgument("no segments".into()));
        }
        for segment in segments {
            self.schedule(segment);
        }
        Ok(())
    }
}

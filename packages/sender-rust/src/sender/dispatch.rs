//! Hands resolved segments to the transport with their correlation tokens.

use std::sync::Arc;

use smsgate_core::{CompletionToken, PartId, RequestId, SubscriptionId};

use super::config::DispatchStrategy;
use super::error::SendError;
use crate::traits::{Addressing, SegmentSubmission, SmsTransport};

/// Everything the dispatcher needs for one send.
#[derive(Debug, Clone, Copy)]
pub struct DispatchPlan<'a> {
    pub subscription_id: SubscriptionId,
    pub destination: &'a str,
    pub service_center: Option<&'a str>,
    pub segments: &'a [String],
    pub request_id: &'a RequestId,
    pub wants_delivery_report: bool,
    pub strategy: DispatchStrategy,
}

/// Builds the per-segment token set for a send.
///
/// Every segment gets a sent token. Only the last segment gets a delivered
/// token, and only when a delivery report was requested.
#[must_use]
pub fn build_submissions(plan: &DispatchPlan<'_>) -> Vec<SegmentSubmission> {
    let count = plan.segments.len();
    plan.segments
        .iter()
        .enumerate()
        .map(|(index, text)| {
            let part_id = PartId::for_segment(index, count);
            let delivered = (plan.wants_delivery_report && index + 1 == count).then(|| {
                CompletionToken::delivered(plan.request_id.clone(), part_id, plan.subscription_id)
            });
            SegmentSubmission {
                text: text.clone(),
                sent: CompletionToken::sent(plan.request_id.clone(), part_id, plan.subscription_id),
                delivered,
            }
        })
        .collect()
}

/// Issues transport calls for resolved messages.
pub struct Dispatcher {
    transport: Arc<dyn SmsTransport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn SmsTransport>) -> Self {
        Self { transport }
    }

    /// Queues every segment of `plan` with the transport.
    ///
    /// Returns once the transport accepted the calls; outcomes arrive later
    /// through the completion handler.
    ///
    /// # Errors
    ///
    /// Returns `SendError::DispatchRejected` if the transport refuses a call.
    /// Under `SeparateMessages`, segments queued before the refusal stay
    /// queued.
    pub fn dispatch(&self, plan: &DispatchPlan<'_>) -> Result<(), SendError> {
        let addressing = Addressing {
            subscription_id: plan.subscription_id,
            destination: plan.destination,
            service_center: plan.service_center,
        };
        let submissions = build_submissions(plan);

        let outcome = match plan.strategy {
            DispatchStrategy::SeparateMessages => submissions
                .into_iter()
                .try_for_each(|segment| self.transport.send_text(&addressing, segment)),
            DispatchStrategy::Multipart => {
                self.transport.send_multipart_text(&addressing, submissions)
            }
        };

        outcome.map_err(|e| {
            tracing::error!(
                request_id = %plan.request_id,
                subscription_id = %plan.subscription_id,
                error = %e,
                "transport rejected message"
            );
            SendError::DispatchRejected {
                reason: e.to_string(),
            }
        })
    }
}

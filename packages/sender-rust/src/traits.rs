use std::fmt;

use smsgate_core::{CompletionToken, RequestId, SubscriptionId};

/// Where a message goes and through which subscription.
#[derive(Debug, Clone, Copy)]
pub struct Addressing<'a> {
    pub subscription_id: SubscriptionId,
    pub destination: &'a str,
    /// Service center (SMSC) override; `None` uses the SIM's default.
    pub service_center: Option<&'a str>,
}

/// One segment handed to the transport together with its callback tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentSubmission {
    pub text: String,
    /// Returned through the completion handler once the radio accepted or
    /// refused the segment.
    pub sent: CompletionToken,
    /// Returned once the recipient acknowledged delivery, when requested.
    pub delivered: Option<CompletionToken>,
}

/// Immediate refusal by the transport. No completion will follow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransmitError {
    /// The SIM's fixed dialing number list does not allow the destination.
    #[error("destination is not on the fixed dialing number list")]
    FdnRestricted,
    /// The call's arguments were refused, e.g. an empty destination.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The radio or messaging service cannot take messages right now.
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Fire-and-forget SMS transmission interface.
///
/// Both calls return as soon as the segments are queued. Each segment's
/// outcome is reported later, on a transport-owned thread, by passing its
/// token to [`CompletionHandler::on_completion`](crate::sender::CompletionHandler::on_completion).
/// Implementations must be safe to call from several threads at once.
pub trait SmsTransport: Send + Sync {
    /// Sends one segment as a standalone message.
    ///
    /// # Errors
    ///
    /// Returns `TransmitError` if the segment is refused before queueing.
    fn send_text(
        &self,
        addressing: &Addressing<'_>,
        segment: SegmentSubmission,
    ) -> Result<(), TransmitError>;

    /// Sends all segments as one concatenated message.
    ///
    /// # Errors
    ///
    /// Returns `TransmitError` if the message is refused before queueing.
    fn send_multipart_text(
        &self,
        addressing: &Addressing<'_>,
        segments: Vec<SegmentSubmission>,
    ) -> Result<(), TransmitError>;
}

/// A failed segment that carried a carrier error code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendFailureNotice {
    pub request_id: RequestId,
    pub subscription_id: SubscriptionId,
    pub error_code: i32,
    pub carrier_name: Option<String>,
}

impl fmt::Display for SendFailureNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.carrier_name {
            Some(carrier) => write!(
                f,
                "{carrier} could not send the message (error {})",
                self.error_code
            ),
            None => write!(f, "Message not sent (error {})", self.error_code),
        }
    }
}

/// User-facing signals raised while segment outcomes come in.
pub trait SendNotifier: Send + Sync {
    /// A segment failed with a carrier error code.
    fn send_failed(&self, notice: &SendFailureNotice);

    /// A segment was refused by the fixed-dialing-number check.
    fn fdn_check_failed(&self, _request_id: &RequestId, _subscription_id: SubscriptionId) {}

    /// Every segment of a send was accepted and the subscription asked for
    /// send confirmations.
    ///
    /// Raised once per send, and only if no segment failed: a send whose last
    /// segment succeeds after an earlier one failed is not confirmed.
    fn send_succeeded(&self, _request_id: &RequestId, _subscription_id: SubscriptionId) {}
}

/// Notifier that only writes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl SendNotifier for LogNotifier {
    fn send_failed(&self, notice: &SendFailureNotice) {
        tracing::warn!(
            request_id = %notice.request_id,
            subscription_id = %notice.subscription_id,
            error_code = notice.error_code,
            "{notice}"
        );
    }

    fn fdn_check_failed(&self, request_id: &RequestId, subscription_id: SubscriptionId) {
        tracing::info!(%request_id, %subscription_id, "segment refused by FDN check");
    }

    fn send_succeeded(&self, request_id: &RequestId, subscription_id: SubscriptionId) {
        tracing::info!(%request_id, %subscription_id, "message sent");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice(carrier: Option<&str>) -> SendFailureNotice {
        SendFailureNotice {
            request_id: RequestId::new("content://sms/outbox/9"),
            subscription_id: SubscriptionId(1),
            error_code: 38,
            carrier_name: carrier.map(str::to_string),
        }
    }

    #[test]
    fn failure_notice_names_the_carrier() {
        assert_eq!(
            notice(Some("Acme Mobile")).to_string(),
            "Acme Mobile could not send the message (error 38)"
        );
    }

    #[test]
    fn failure_notice_without_carrier() {
        assert_eq!(notice(None).to_string(), "Message not sent (error 38)");
    }

    #[test]
    fn transmit_error_messages() {
        assert_eq!(
            TransmitError::FdnRestricted.to_string(),
            "destination is not on the fixed dialing number list"
        );
        assert_eq!(
            TransmitError::Unavailable("radio busy".into()).to_string(),
            "transport unavailable: radio busy"
        );
    }
}

use smsgate_core::RequestId;

/// Errors raised synchronously by [`SmsSender::send`](super::SmsSender::send).
///
/// Every variant is raised before any segment outcome is known. Outcomes of
/// dispatched segments are reported as data in [`SendResult`](super::SendResult).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// Nothing dialable is left after separator stripping.
    #[error("empty destination address")]
    EmptyDestination,
    /// The body is empty and the subscription does not allow empty messages.
    #[error("empty text message")]
    EmptyMessage,
    /// The segmenter returned no segments for a non-empty body.
    #[error("failed to divide message into segments")]
    SegmentationFailure,
    /// The transport refused the message before queueing it.
    #[error("transmission rejected: {reason}")]
    DispatchRejected { reason: String },
    /// Another send with the same request id is still in flight.
    #[error("request {request_id} is already in flight")]
    DuplicateRequest { request_id: RequestId },
    /// An aggregator was asked to expect zero parts.
    #[error("a send needs at least one part")]
    InvalidPartCount,
    /// A quick reply names more recipients than the subscription allows.
    #[error("{count} recipients exceed the limit of {limit}")]
    RecipientLimitExceeded { limit: usize, count: usize },
    /// A recipient list had no usable entry.
    #[error("no recipients")]
    NoRecipients,
}

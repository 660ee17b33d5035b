use std::fmt;

use serde::{Deserialize, Serialize};

/// Platform subscription (SIM slot) identifier.
///
/// `-1` is the platform's "default subscription" sentinel and is kept as-is
/// so ids coming from the telephony layer round-trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub i32);

impl SubscriptionId {
    /// The platform's "use the default SMS subscription" sentinel.
    pub const DEFAULT: SubscriptionId = SubscriptionId(-1);
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier correlating every segment of one logical send.
///
/// Callers normally pass the URI of the outbox row that owns the message.
/// Two in-flight sends must never share an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Prefix used by [`RequestId::generate`].
    pub const OUTBOX_PREFIX: &'static str = "content://sms/outbox/";

    /// Wraps a caller-supplied identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a fresh, random outbox-style identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{}{}", Self::OUTBOX_PREFIX, uuid::Uuid::new_v4()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Segment identifier carried in completion tokens.
///
/// A single-segment send uses [`PartId::SINGLE`] (0). Multi-segment sends
/// number their parts from 1, so the token of a lone segment never collides
/// with the first part of a multi-segment send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartId(pub u32);

impl PartId {
    pub const SINGLE: PartId = PartId(0);

    /// Part id for the segment at 0-based `index` of a `count`-segment message.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn for_segment(index: usize, count: usize) -> Self {
        if count <= 1 {
            Self::SINGLE
        } else {
            PartId(index as u32 + 1)
        }
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which status a completion token reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionKind {
    /// The radio accepted (or refused) the segment.
    Sent,
    /// The recipient's handset acknowledged the message.
    Delivered,
}

/// Correlation token handed to the transport with each segment.
///
/// The transport treats it as opaque and passes it back unchanged with the
/// segment's outcome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionToken {
    pub kind: CompletionKind,
    pub request_id: RequestId,
    pub part_id: PartId,
    pub subscription_id: SubscriptionId,
}

impl CompletionToken {
    #[must_use]
    pub fn sent(request_id: RequestId, part_id: PartId, subscription_id: SubscriptionId) -> Self {
        Self {
            kind: CompletionKind::Sent,
            request_id,
            part_id,
            subscription_id,
        }
    }

    #[must_use]
    pub fn delivered(
        request_id: RequestId,
        part_id: PartId,
        subscription_id: SubscriptionId,
    ) -> Self {
        Self {
            kind: CompletionKind::Delivered,
            request_id,
            part_id,
            subscription_id,
        }
    }
}

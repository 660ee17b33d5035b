//! Per-segment result codes and the failure-severity lattice.
//!
//! Every segment outcome reported by the transport is classified into a
//! [`FailureLevel`]. A request's verdict is the join (maximum) of the levels
//! of all its segments, so the caller can decide whether a retry is worth it:
//! `Temporary` failures may succeed later, `Permanent` ones will not.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw status reported by the transmission layer for one segment.
///
/// Known platform codes get their own variant; anything else is carried
/// verbatim in [`ResultCode::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum ResultCode {
    /// The radio accepted the segment.
    Ok,
    /// Unspecified failure; may carry a carrier error code.
    GenericFailure,
    /// The radio is switched off, e.g. airplane mode.
    RadioOff,
    /// No PDU could be built for the segment.
    NullPdu,
    /// The radio is on but has no network service.
    NoService,
    /// The platform's outgoing message limit was reached.
    LimitExceeded,
    /// The destination is blocked by the SIM's fixed-dialing-number list.
    FdnCheckFailure,
    /// Any code without a dedicated variant, kept verbatim.
    Other(i32),
}

impl ResultCode {
    const RAW_OK: i32 = -1;
    const RAW_GENERIC_FAILURE: i32 = 1;
    const RAW_RADIO_OFF: i32 = 2;
    const RAW_NULL_PDU: i32 = 3;
    const RAW_NO_SERVICE: i32 = 4;
    const RAW_LIMIT_EXCEEDED: i32 = 5;
    const RAW_FDN_CHECK_FAILURE: i32 = 6;

    #[must_use]
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            Self::RAW_OK => Self::Ok,
            Self::RAW_GENERIC_FAILURE => Self::GenericFailure,
            Self::RAW_RADIO_OFF => Self::RadioOff,
            Self::RAW_NULL_PDU => Self::NullPdu,
            Self::RAW_NO_SERVICE => Self::NoService,
            Self::RAW_LIMIT_EXCEEDED => Self::LimitExceeded,
            Self::RAW_FDN_CHECK_FAILURE => Self::FdnCheckFailure,
            other => Self::Other(other),
        }
    }

    #[must_use]
    pub fn as_raw(self) -> i32 {
        match self {
            Self::Ok => Self::RAW_OK,
            Self::GenericFailure => Self::RAW_GENERIC_FAILURE,
            Self::RadioOff => Self::RAW_RADIO_OFF,
            Self::NullPdu => Self::RAW_NULL_PDU,
            Self::NoService => Self::RAW_NO_SERVICE,
            Self::LimitExceeded => Self::RAW_LIMIT_EXCEEDED,
            Self::FdnCheckFailure => Self::RAW_FDN_CHECK_FAILURE,
            Self::Other(raw) => raw,
        }
    }

    #[must_use]
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl From<i32> for ResultCode {
    fn from(raw: i32) -> Self {
        Self::from_raw(raw)
    }
}

impl From<ResultCode> for i32 {
    fn from(code: ResultCode) -> Self {
        code.as_raw()
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_raw())
    }
}

/// Severity of a segment or request failure.
///
/// Ordered `None < Temporary < Permanent`; [`FailureLevel::join`] is the
/// lattice join used to fold segment outcomes into a request verdict.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum FailureLevel {
    /// No failure.
    #[default]
    None,
    /// A retry may succeed once conditions change.
    Temporary,
    /// Retrying will not help.
    Permanent,
}

impl FailureLevel {
    /// Least upper bound of two levels.
    #[must_use]
    pub fn join(self, other: Self) -> Self {
        self.max(other)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Temporary => "temporary",
            Self::Permanent => "permanent",
        }
    }
}

impl fmt::Display for FailureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a segment result code onto the failure lattice.
///
/// Codes without a dedicated rule fall into `Permanent`, and are logged as
/// unexpected so they show up in diagnostics.
#[must_use]
pub fn classify(code: ResultCode) -> FailureLevel {
    match code {
        ResultCode::Ok => FailureLevel::None,
        ResultCode::NoService => FailureLevel::Temporary,
        ResultCode::GenericFailure | ResultCode::RadioOff => FailureLevel::Permanent,
        other => {
            tracing::warn!(result_code = other.as_raw(), "unexpected sent result code");
            FailureLevel::Permanent
        }
    }
}

//! smsgate core: segment result codes, the failure lattice, request
//! identifiers, destination address rules and message segmentation.

pub mod address;
pub mod failure;
pub mod segment;
pub mod traits;
pub mod types;

pub use address::{is_email_address, strip_separators, AliasRules};
pub use failure::{classify, FailureLevel, ResultCode};
pub use segment::Ucs2Segmenter;
pub use traits::Segmenter;
pub use types::{CompletionKind, CompletionToken, PartId, RequestId, SubscriptionId};

//! Multi-part SMS sending with correlated, timeout-bounded completion.
//!
//! A send flows through these stages:
//!
//! 1. **Resolution** (`resolver`): destination normalization, gateway rewrite, segmentation
//! 2. **Registration** (`correlation`): one `PartAggregator` per request id
//! 3. **Dispatch** (`dispatch`): segments and their tokens handed to the `SmsTransport`
//! 4. **Completion** (`completion`): transport callbacks counted into the aggregator
//! 5. **Wait** (`facade`): block until every segment reported back or the timeout expires

pub mod aggregator;
pub mod completion;
pub mod config;
pub mod correlation;
pub mod dispatch;
pub mod error;
pub mod facade;
pub mod resolver;

pub use aggregator::{PartAggregator, PartRecorded, SendResult};
pub use completion::CompletionHandler;
pub use config::{
    ConfigError, DispatchStrategy, EmptyMessageMode, SenderConfig, SubscriptionConfig,
    DEFAULT_SEND_TIMEOUT_MS,
};
pub use correlation::CorrelationTable;
pub use dispatch::{build_submissions, DispatchPlan, Dispatcher};
pub use error::SendError;
pub use facade::{SendRequest, SmsSender};
pub use resolver::{Resolved, Resolver};

//! Blocking, timeout-bounded send over a fire-and-forget transport.
//!
//! [`SmsSender::send`] behaves like a request/response call: it queues every
//! segment of a message and waits until each segment's outcome came back or
//! the send timeout expires, then returns the aggregated [`SendResult`].

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use smsgate_core::{RequestId, Segmenter, SubscriptionId};
use tracing::{field, info_span, Instrument, Span};

use super::aggregator::{PartAggregator, SendResult};
use super::completion::CompletionHandler;
use super::config::SenderConfig;
use super::correlation::CorrelationTable;
use super::dispatch::{DispatchPlan, Dispatcher};
use super::error::SendError;
use super::resolver::Resolver;
use crate::traits::{SendNotifier, SmsTransport};

/// One outbound text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub subscription_id: SubscriptionId,
    pub destination: String,
    pub body: String,
    pub service_center: Option<String>,
    pub wants_delivery_report: bool,
    /// Must not be shared with any other in-flight send.
    pub request_id: RequestId,
}

impl SendRequest {
    /// Creates a request with a freshly generated request id.
    pub fn new(
        subscription_id: SubscriptionId,
        destination: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id,
            destination: destination.into(),
            body: body.into(),
            service_center: None,
            wants_delivery_report: false,
            request_id: RequestId::generate(),
        }
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    #[must_use]
    pub fn with_service_center(mut self, service_center: impl Into<String>) -> Self {
        self.service_center = Some(service_center.into());
        self
    }

    #[must_use]
    pub fn with_delivery_report(mut self, wants_delivery_report: bool) -> Self {
        self.wants_delivery_report = wants_delivery_report;
        self
    }
}

/// Correlation entry of one send; removed from the table when dropped.
struct Registration<'a> {
    table: &'a CorrelationTable,
    request_id: &'a RequestId,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.table.remove(self.request_id);
    }
}

/// A dispatched send waiting for its segment outcomes.
struct InFlight<'a> {
    aggregator: Arc<PartAggregator>,
    started: Instant,
    deadline: Instant,
    _registration: Registration<'a>,
}

/// Sends SMS messages and waits for their per-segment outcomes.
///
/// Each sender owns its correlation table. The transport reports outcomes
/// through the handler returned by [`SmsSender::completion_handler`].
pub struct SmsSender {
    config: Arc<ArcSwap<SenderConfig>>,
    table: Arc<CorrelationTable>,
    resolver: Resolver,
    dispatcher: Dispatcher,
    completions: CompletionHandler,
}

impl SmsSender {
    /// Creates a sender.
    ///
    /// `make_transport` receives the completion handler the transport must
    /// call with each token it is given; transports that route outcomes
    /// through another path may ignore it and use
    /// [`SmsSender::completion_handler`] later.
    pub fn new<F>(
        config: SenderConfig,
        segmenter: Arc<dyn Segmenter>,
        notifier: Arc<dyn SendNotifier>,
        make_transport: F,
    ) -> Self
    where
        F: FnOnce(CompletionHandler) -> Arc<dyn SmsTransport>,
    {
        let config = Arc::new(ArcSwap::from_pointee(config));
        let table = Arc::new(CorrelationTable::new());
        let completions =
            CompletionHandler::new(Arc::clone(&table), Arc::clone(&config), notifier);
        let transport = make_transport(completions.clone());
        Self {
            config,
            table,
            resolver: Resolver::new(segmenter),
            dispatcher: Dispatcher::new(transport),
            completions,
        }
    }

    /// Handler the transport calls with segment outcomes.
    #[must_use]
    pub fn completion_handler(&self) -> CompletionHandler {
        self.completions.clone()
    }

    /// Current configuration snapshot.
    #[must_use]
    pub fn config(&self) -> Arc<SenderConfig> {
        self.config.load_full()
    }

    /// Replaces the configuration, e.g. after a carrier config change.
    ///
    /// Sends already in flight keep the snapshot they started with.
    pub fn update_config(&self, config: SenderConfig) {
        tracing::info!(
            send_timeout_ms = config.send_timeout_ms,
            subscriptions = config.subscriptions.len(),
            "sender config updated"
        );
        self.config.store(Arc::new(config));
    }

    /// Number of sends currently waiting for segment outcomes.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.table.len()
    }

    /// Sends a message and blocks until its outcome is known or the send
    /// timeout expires.
    ///
    /// A timed-out send is not an error: the returned result has
    /// `pending_parts > 0`. Segments still in the transport are not
    /// cancelled; their late outcomes are ignored.
    ///
    /// Blocks the calling thread; async callers use [`SmsSender::send_async`].
    ///
    /// # Errors
    ///
    /// - `EmptyDestination`, `EmptyMessage`, `SegmentationFailure` when the
    ///   message cannot be resolved; nothing was sent.
    /// - `DuplicateRequest` when `request.request_id` is already in flight;
    ///   nothing was sent.
    /// - `DispatchRejected` when the transport refused the message.
    pub fn send(&self, request: &SendRequest) -> Result<SendResult, SendError> {
        let span = send_span(request);
        let _entered = span.enter();

        let in_flight = self.begin(request)?;
        let result = in_flight.aggregator.wait_until(in_flight.deadline);
        Ok(finish(request, &in_flight, result))
    }

    /// Async counterpart of [`SmsSender::send`].
    ///
    /// Dropping the returned future before it completes removes the send's
    /// correlation entry, exactly like a timeout.
    ///
    /// # Errors
    ///
    /// Same as [`SmsSender::send`].
    pub async fn send_async(&self, request: &SendRequest) -> Result<SendResult, SendError> {
        let span = send_span(request);
        async {
            let in_flight = self.begin(request)?;
            let deadline = tokio::time::Instant::from_std(in_flight.deadline);
            let result = in_flight.aggregator.wait_until_async(deadline).await;
            Ok(finish(request, &in_flight, result))
        }
        .instrument(span)
        .await
    }

    /// Resolves, registers and dispatches a send.
    fn begin<'a>(&'a self, request: &'a SendRequest) -> Result<InFlight<'a>, SendError> {
        let config = self.config.load_full();
        let subscription = config.subscription(request.subscription_id);

        tracing::debug!(
            destination = %request.destination,
            service_center = request.service_center.as_deref(),
            wants_delivery_report = request.wants_delivery_report,
            "sending message"
        );
        let resolved =
            self.resolver
                .resolve(subscription, &request.destination, &request.body)?;
        let aggregator = Arc::new(PartAggregator::new(resolved.segments.len())?);

        self.table
            .put(request.request_id.clone(), Arc::clone(&aggregator))?;
        let registration = Registration {
            table: &self.table,
            request_id: &request.request_id,
        };
        Span::current().record("parts", resolved.segments.len());

        let started = Instant::now();
        self.dispatcher.dispatch(&DispatchPlan {
            subscription_id: request.subscription_id,
            destination: &resolved.destination,
            service_center: request.service_center.as_deref(),
            segments: &resolved.segments,
            request_id: &request.request_id,
            wants_delivery_report: request.wants_delivery_report,
            strategy: subscription.dispatch_strategy,
        })?;

        Ok(InFlight {
            aggregator,
            started,
            deadline: started + config.send_timeout(),
            _registration: registration,
        })
    }
}

fn send_span(request: &SendRequest) -> Span {
    info_span!(
        "sms_send",
        request_id = %request.request_id,
        subscription_id = %request.subscription_id,
        parts = field::Empty,
        duration_ms = field::Empty,
        outcome = field::Empty,
    )
}

fn finish(request: &SendRequest, in_flight: &InFlight<'_>, result: SendResult) -> SendResult {
    #[allow(clippy::cast_possible_truncation)]
    let duration_ms = in_flight.started.elapsed().as_millis() as u64;
    let outcome = if result.timed_out() {
        "timed_out"
    } else {
        result.highest_failure.as_str()
    };
    let span = Span::current();
    span.record("duration_ms", duration_ms);
    span.record("outcome", outcome);

    if result.timed_out() {
        tracing::warn!(
            request_id = %request.request_id,
            pending_parts = result.pending_parts,
            expected_parts = in_flight.aggregator.expected_parts(),
            duration_ms,
            "timed out waiting for sent results"
        );
    } else {
        tracing::info!(
            request_id = %request.request_id,
            duration_ms,
            outcome,
            "sending completed"
        );
    }
    result
}

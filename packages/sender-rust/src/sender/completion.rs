//! Entry point for segment outcomes reported by the transport.

use std::sync::Arc;

use arc_swap::ArcSwap;
use smsgate_core::{CompletionKind, CompletionToken, ResultCode};

use super::config::SenderConfig;
use super::correlation::CorrelationTable;
use crate::traits::{SendFailureNotice, SendNotifier};

/// Routes segment outcomes to the aggregator of their send.
///
/// Cheap to clone; every clone shares the sender's correlation table. The
/// transport may call [`CompletionHandler::on_completion`] from any thread,
/// any number of times per token.
#[derive(Clone)]
pub struct CompletionHandler {
    table: Arc<CorrelationTable>,
    config: Arc<ArcSwap<SenderConfig>>,
    notifier: Arc<dyn SendNotifier>,
}

impl CompletionHandler {
    pub fn new(
        table: Arc<CorrelationTable>,
        config: Arc<ArcSwap<SenderConfig>>,
        notifier: Arc<dyn SendNotifier>,
    ) -> Self {
        Self {
            table,
            config,
            notifier,
        }
    }

    /// Reports the outcome of one segment.
    ///
    /// `error_code` is the carrier's auxiliary error code, when it sent one.
    /// Outcomes for sends that are unknown or already finished are logged and
    /// dropped. Delivery reports are acknowledged in the log only.
    pub fn on_completion(
        &self,
        token: &CompletionToken,
        result_code: ResultCode,
        error_code: Option<i32>,
    ) {
        let CompletionToken {
            kind,
            request_id,
            part_id,
            subscription_id,
        } = token;

        if *kind == CompletionKind::Delivered {
            tracing::debug!(
                %request_id,
                %part_id,
                result_code = result_code.as_raw(),
                "delivery report received"
            );
            return;
        }

        let recorded = match self.table.get(request_id) {
            Some(aggregator) => Some(aggregator.record_part(result_code)),
            None => {
                tracing::warn!(
                    %request_id,
                    %part_id,
                    result_code = result_code.as_raw(),
                    "ignoring sent result for unknown request"
                );
                None
            }
        };

        if !result_code.is_ok() {
            tracing::error!(
                %request_id,
                %part_id,
                result_code = result_code.as_raw(),
                error_code,
                "failure in sending message part"
            );
            if let Some(error_code) = error_code {
                let config = self.config.load();
                let notice = SendFailureNotice {
                    request_id: request_id.clone(),
                    subscription_id: *subscription_id,
                    error_code,
                    carrier_name: config.subscription(*subscription_id).carrier_name.clone(),
                };
                self.notifier.send_failed(&notice);
            } else if result_code == ResultCode::FdnCheckFailure {
                self.notifier.fdn_check_failed(request_id, *subscription_id);
            }
            return;
        }

        tracing::debug!(%request_id, %part_id, "received sent result");
        let wants_confirmation = self
            .config
            .load()
            .subscription(*subscription_id)
            .send_confirmation;
        if wants_confirmation
            && recorded.is_some_and(|r| r.resolved_request && r.result.is_success())
        {
            self.notifier.send_succeeded(request_id, *subscription_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use smsgate_core::{FailureLevel, PartId, RequestId, SubscriptionId};

    use super::*;
    use crate::sender::aggregator::PartAggregator;
    use crate::sender::config::SubscriptionConfig;

    #[derive(Debug, PartialEq, Eq)]
    enum Signal {
        Failed(String),
        Fdn,
        Succeeded,
    }

    #[derive(Default)]
    struct RecordingNotifier {
        signals: Mutex<Vec<Signal>>,
    }

    impl SendNotifier for RecordingNotifier {
        fn send_failed(&self, notice: &SendFailureNotice) {
            self.signals.lock().push(Signal::Failed(notice.to_string()));
        }

        fn fdn_check_failed(&self, _request_id: &RequestId, _subscription_id: SubscriptionId) {
            self.signals.lock().push(Signal::Fdn);
        }

        fn send_succeeded(&self, _request_id: &RequestId, _subscription_id: SubscriptionId) {
            self.signals.lock().push(Signal::Succeeded);
        }
    }

    struct Fixture {
        table: Arc<CorrelationTable>,
        notifier: Arc<RecordingNotifier>,
        handler: CompletionHandler,
    }

    fn fixture(subscription: SubscriptionConfig) -> Fixture {
        let table = Arc::new(CorrelationTable::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let config = SenderConfig {
            default_subscription: subscription,
            ..SenderConfig::default()
        };
        let handler = CompletionHandler::new(
            Arc::clone(&table),
            Arc::new(ArcSwap::from_pointee(config)),
            notifier.clone(),
        );
        Fixture {
            table,
            notifier,
            handler,
        }
    }

    fn register(table: &CorrelationTable, id: &RequestId, parts: usize) -> Arc<PartAggregator> {
        let agg = Arc::new(PartAggregator::new(parts).unwrap());
        table.put(id.clone(), Arc::clone(&agg)).unwrap();
        agg
    }

    fn sent(id: &RequestId, part: u32) -> CompletionToken {
        CompletionToken::sent(id.clone(), PartId(part), SubscriptionId(1))
    }

    #[test]
    fn records_part_on_known_request() {
        let fx = fixture(SubscriptionConfig::default());
        let id = RequestId::new("content://sms/outbox/1");
        let agg = register(&fx.table, &id, 2);

        fx.handler.on_completion(&sent(&id, 1), ResultCode::Ok, None);
        fx.handler.on_completion(&sent(&id, 2), ResultCode::NoService, None);

        let result = agg.snapshot();
        assert_eq!(result.pending_parts, 0);
        assert_eq!(result.highest_failure, FailureLevel::Temporary);
    }

    #[test]
    fn unknown_request_is_ignored() {
        let fx = fixture(SubscriptionConfig::default());
        let other = RequestId::new("content://sms/outbox/live");
        let agg = register(&fx.table, &other, 1);

        let missing = RequestId::new("content://sms/outbox/gone");
        fx.handler.on_completion(&sent(&missing, 0), ResultCode::Ok, None);
        fx.handler.on_completion(&sent(&missing, 0), ResultCode::RadioOff, None);

        assert!(agg.has_pending());
        assert_eq!(agg.highest_failure(), FailureLevel::None);
        assert!(!fx.table.contains(&missing));
    }

    #[test]
    fn delivery_reports_do_not_count_as_parts() {
        let fx = fixture(SubscriptionConfig::default());
        let id = RequestId::new("content://sms/outbox/2");
        let agg = register(&fx.table, &id, 1);

        let token = CompletionToken::delivered(id.clone(), PartId::SINGLE, SubscriptionId(1));
        fx.handler.on_completion(&token, ResultCode::Ok, None);

        assert!(agg.has_pending());
    }

    #[test]
    fn failure_with_error_code_names_carrier() {
        let fx = fixture(SubscriptionConfig {
            carrier_name: Some("Acme".into()),
            ..SubscriptionConfig::default()
        });
        let id = RequestId::new("content://sms/outbox/3");
        register(&fx.table, &id, 1);

        fx.handler
            .on_completion(&sent(&id, 0), ResultCode::GenericFailure, Some(21));

        assert_eq!(
            *fx.notifier.signals.lock(),
            vec![Signal::Failed("Acme could not send the message (error 21)".into())]
        );
    }

    #[test]
    fn failure_is_signalled_even_after_timeout() {
        let fx = fixture(SubscriptionConfig::default());
        let id = RequestId::new("content://sms/outbox/late");

        fx.handler
            .on_completion(&sent(&id, 0), ResultCode::GenericFailure, Some(7));

        assert_eq!(
            *fx.notifier.signals.lock(),
            vec![Signal::Failed("Message not sent (error 7)".into())]
        );
    }

    #[test]
    fn fdn_failure_without_error_code_gets_soft_signal() {
        let fx = fixture(SubscriptionConfig::default());
        let id = RequestId::new("content://sms/outbox/4");
        register(&fx.table, &id, 1);

        fx.handler
            .on_completion(&sent(&id, 0), ResultCode::FdnCheckFailure, None);

        assert_eq!(*fx.notifier.signals.lock(), vec![Signal::Fdn]);
    }

    #[test]
    fn failure_without_error_code_is_silent() {
        let fx = fixture(SubscriptionConfig::default());
        let id = RequestId::new("content://sms/outbox/5");
        register(&fx.table, &id, 1);

        fx.handler.on_completion(&sent(&id, 0), ResultCode::RadioOff, None);

        assert!(fx.notifier.signals.lock().is_empty());
    }

    #[test]
    fn confirmation_only_after_last_part() {
        let fx = fixture(SubscriptionConfig {
            send_confirmation: true,
            ..SubscriptionConfig::default()
        });
        let id = RequestId::new("content://sms/outbox/6");
        register(&fx.table, &id, 3);

        fx.handler.on_completion(&sent(&id, 1), ResultCode::Ok, None);
        fx.handler.on_completion(&sent(&id, 2), ResultCode::Ok, None);
        assert!(fx.notifier.signals.lock().is_empty());

        fx.handler.on_completion(&sent(&id, 3), ResultCode::Ok, None);
        // A duplicate of the last callback must not confirm twice.
        fx.handler.on_completion(&sent(&id, 3), ResultCode::Ok, None);
        assert_eq!(*fx.notifier.signals.lock(), vec![Signal::Succeeded]);
    }

    #[test]
    fn no_confirmation_when_an_earlier_part_failed() {
        let fx = fixture(SubscriptionConfig {
            send_confirmation: true,
            ..SubscriptionConfig::default()
        });
        let id = RequestId::new("content://sms/outbox/8");
        register(&fx.table, &id, 2);

        fx.handler.on_completion(&sent(&id, 1), ResultCode::RadioOff, None);
        fx.handler.on_completion(&sent(&id, 2), ResultCode::Ok, None);

        assert!(fx.notifier.signals.lock().is_empty());
    }

    #[test]
    fn callbacks_after_removal_leave_aggregator_untouched() {
        let fx = fixture(SubscriptionConfig {
            send_confirmation: true,
            ..SubscriptionConfig::default()
        });
        let id = RequestId::new("content://sms/outbox/9");
        let agg = register(&fx.table, &id, 1);
        fx.handler.on_completion(&sent(&id, 0), ResultCode::Ok, None);
        fx.table.remove(&id);
        let before = agg.snapshot();

        fx.handler.on_completion(&sent(&id, 0), ResultCode::GenericFailure, None);
        fx.handler.on_completion(&sent(&id, 0), ResultCode::Ok, None);

        assert_eq!(agg.snapshot(), before);
        assert_eq!(before.highest_failure, FailureLevel::None);
        assert_eq!(*fx.notifier.signals.lock(), vec![Signal::Succeeded]);
    }

    #[test]
    fn no_confirmation_when_disabled() {
        let fx = fixture(SubscriptionConfig::default());
        let id = RequestId::new("content://sms/outbox/7");
        register(&fx.table, &id, 1);

        fx.handler.on_completion(&sent(&id, 0), ResultCode::Ok, None);

        assert!(fx.notifier.signals.lock().is_empty());
    }
}

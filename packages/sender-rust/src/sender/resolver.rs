//! Destination normalization and body segmentation.

use std::sync::Arc;

use smsgate_core::{is_email_address, strip_separators, Segmenter};

use super::config::SubscriptionConfig;
use super::error::SendError;

/// Final destination and segments of a message, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub destination: String,
    /// Body after any gateway rewrite.
    pub body: String,
    /// Never empty.
    pub segments: Vec<String>,
}

/// Turns a caller's destination and body into dispatchable segments.
pub struct Resolver {
    segmenter: Arc<dyn Segmenter>,
}

impl Resolver {
    pub fn new(segmenter: Arc<dyn Segmenter>) -> Self {
        Self { segmenter }
    }

    /// Resolves `destination` and `body` under a subscription's settings.
    ///
    /// Email addresses and aliases are routed through the subscription's
    /// email gateway: the original destination is prefixed to the body and
    /// the gateway becomes the destination. Any other destination has its
    /// separators stripped.
    ///
    /// # Errors
    ///
    /// - `SendError::EmptyDestination` if nothing dialable remains.
    /// - `SendError::EmptyMessage` if `body` is empty and the subscription
    ///   does not allow empty messages.
    /// - `SendError::SegmentationFailure` if the segmenter returns nothing
    ///   and empty messages are not allowed.
    pub fn resolve(
        &self,
        subscription: &SubscriptionConfig,
        destination: &str,
        body: &str,
    ) -> Result<Resolved, SendError> {
        let (destination, text) = match subscription.email_gateway() {
            Some(gateway)
                if is_email_address(destination) || subscription.alias.is_alias(destination) =>
            {
                (gateway.to_string(), format!("{destination} {body}"))
            }
            _ => (strip_separators(destination), body.to_string()),
        };

        if destination.is_empty() {
            return Err(SendError::EmptyDestination);
        }
        let mode = subscription.empty_message_mode;
        if body.is_empty() && !mode.allows_empty() {
            return Err(SendError::EmptyMessage);
        }

        let mut segments = self.segmenter.divide_message(&text);
        if segments.is_empty() {
            if !mode.allows_empty() {
                return Err(SendError::SegmentationFailure);
            }
            segments.push(String::new());
        }

        Ok(Resolved {
            destination,
            body: text,
            segments,
        })
    }
}

#[cfg(test)]
mod tests {
    use smsgate_core::{AliasRules, Ucs2Segmenter};

    use super::*;
    use crate::sender::config::EmptyMessageMode;

    fn resolver() -> Resolver {
        Resolver::new(Arc::new(Ucs2Segmenter))
    }

    fn gateway_subscription() -> SubscriptionConfig {
        SubscriptionConfig {
            email_gateway: Some("user@gw".into()),
            alias: AliasRules {
                enabled: true,
                ..AliasRules::default()
            },
            ..SubscriptionConfig::default()
        }
    }

    #[test]
    fn strips_separators_from_numbers() {
        let resolved = resolver()
            .resolve(&SubscriptionConfig::default(), "801 555 1212", "hi")
            .unwrap();
        assert_eq!(resolved.destination, "8015551212");
        assert_eq!(resolved.segments, vec!["hi"]);
    }

    #[test]
    fn empty_body_is_rejected_when_disabled() {
        let err = resolver()
            .resolve(&SubscriptionConfig::default(), "801 555 1212", "")
            .unwrap_err();
        assert_eq!(err, SendError::EmptyMessage);
    }

    #[test]
    fn empty_destination_is_rejected() {
        let err = resolver()
            .resolve(&SubscriptionConfig::default(), " - ", "hi")
            .unwrap_err();
        assert_eq!(err, SendError::EmptyDestination);
    }

    #[test]
    fn alias_routes_through_gateway() {
        let resolved = resolver()
            .resolve(&gateway_subscription(), "bob", "see you")
            .unwrap();
        assert_eq!(resolved.destination, "user@gw");
        assert_eq!(resolved.body, "bob see you");
        assert_eq!(resolved.segments, vec!["bob see you"]);
    }

    #[test]
    fn email_routes_through_gateway() {
        let resolved = resolver()
            .resolve(&gateway_subscription(), "alice@example.com", "hello")
            .unwrap();
        assert_eq!(resolved.destination, "user@gw");
        assert_eq!(resolved.body, "alice@example.com hello");
    }

    #[test]
    fn email_without_gateway_is_stripped() {
        // No gateway: the address is treated as a number and nothing dialable
        // survives.
        let err = resolver()
            .resolve(&SubscriptionConfig::default(), "alice@example.com", "hello")
            .unwrap_err();
        assert_eq!(err, SendError::EmptyDestination);
    }

    #[test]
    fn empty_body_allowed_sends_one_empty_segment() {
        for mode in [
            EmptyMessageMode::AllowWithPlaceholder,
            EmptyMessageMode::AllowAsIs,
        ] {
            let sub = SubscriptionConfig {
                empty_message_mode: mode,
                ..SubscriptionConfig::default()
            };
            let resolved = resolver().resolve(&sub, "5551234", "").unwrap();
            assert_eq!(resolved.segments, vec![String::new()]);
        }
    }

    #[test]
    fn segmenter_returning_nothing_is_a_failure() {
        let resolver = Resolver::new(Arc::new(|_: &str| Vec::<String>::new()));
        let err = resolver
            .resolve(&SubscriptionConfig::default(), "5551234", "hi")
            .unwrap_err();
        assert_eq!(err, SendError::SegmentationFailure);
    }

    #[test]
    fn long_bodies_are_segmented_in_order() {
        let body = "z".repeat(150);
        let resolved = resolver()
            .resolve(&SubscriptionConfig::default(), "5551234", &body)
            .unwrap();
        assert_eq!(resolved.segments.len(), 3);
        assert_eq!(resolved.segments.concat(), body);
    }
}

//! Recipient lists for quick replies sent to several people at once.

use crate::sender::{SendError, SubscriptionConfig};

/// Splits a comma- or semicolon-separated recipient list.
///
/// Entries are trimmed; blank entries are dropped.
///
/// # Errors
///
/// Returns `SendError::NoRecipients` if no entry is left.
pub fn parse_recipients(list: &str) -> Result<Vec<String>, SendError> {
    let recipients: Vec<String> = list
        .split([',', ';'])
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();
    if recipients.is_empty() {
        return Err(SendError::NoRecipients);
    }
    Ok(recipients)
}

/// Checks a recipient list against the subscription's recipient limit.
///
/// # Errors
///
/// Returns `SendError::RecipientLimitExceeded` when the subscription has a
/// limit and `recipients` is longer.
pub fn check_recipient_limit(
    subscription: &SubscriptionConfig,
    recipients: &[String],
) -> Result<(), SendError> {
    match subscription.recipient_limit {
        Some(limit) if recipients.len() > limit => {
            tracing::warn!(
                limit,
                count = recipients.len(),
                "recipient limit exceeded"
            );
            Err(SendError::RecipientLimitExceeded {
                limit,
                count: recipients.len(),
            })
        }
        _ => Ok(()),
    }
}

//! Destination address rules: separator stripping, email and alias detection.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// First code point of each run of ten decimal digits in the Basic
/// Multilingual Plane (Unicode general category `Nd`).
const DECIMAL_DIGIT_ZEROS: &[u32] = &[
    0x0030, 0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6, 0x0C66,
    0x0CE6, 0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x1090, 0x17E0, 0x1810, 0x1946,
    0x19D0, 0x1A80, 0x1A90, 0x1B50, 0x1BB0, 0x1C40, 0x1C50, 0xA620, 0xA8D0, 0xA900, 0xA9D0,
    0xA9F0, 0xAA50, 0xABF0, 0xFF10,
];

/// ASCII digit for a decimal digit of any script.
fn ascii_digit(c: char) -> Option<char> {
    let code = u32::from(c);
    DECIMAL_DIGIT_ZEROS
        .iter()
        .find(|&&zero| (zero..zero + 10).contains(&code))
        .and_then(|&zero| char::from_digit(code - zero, 10))
}

/// Removes every character that is not part of a dialable number.
///
/// Decimal digits of any script are kept as ASCII digits. `+`, `*`, `#` and
/// the dial-string control characters `N` (wild), `;` (wait) and `,`
/// (pause) survive; spaces, dashes, dots and parentheses do not.
///
/// `"801 555 1212"` becomes `"8015551212"`, `"+8211-123-4567"` becomes
/// `"+82111234567"`.
#[must_use]
pub fn strip_separators(number: &str) -> String {
    number
        .chars()
        .filter_map(|c| ascii_digit(c).or_else(|| is_dial_control(c).then_some(c)))
        .collect()
}

fn is_dial_control(c: char) -> bool {
    matches!(c, '+' | '*' | '#' | 'N' | ';' | ',')
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9+._%\-]{1,256}@[a-zA-Z0-9][a-zA-Z0-9\-]{0,64}(\.[a-zA-Z0-9][a-zA-Z0-9\-]{0,25})+$",
        )
        .expect("email pattern is a valid regex")
    })
}

/// Returns the addr-spec of a `Name <addr>` form, or the trimmed input.
fn extract_addr_spec(address: &str) -> &str {
    match (address.find('<'), address.rfind('>')) {
        (Some(open), Some(close)) if open < close => &address[open + 1..close],
        _ => address.trim(),
    }
}

/// Whether `address` is an email address, accepting the `Name <addr>` form.
#[must_use]
pub fn is_email_address(address: &str) -> bool {
    let spec = extract_addr_spec(address);
    !spec.is_empty() && email_pattern().is_match(spec)
}

/// Carrier rules for short alphanumeric aliases routed via the email gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AliasRules {
    /// Whether the carrier accepts aliases at all.
    pub enabled: bool,
    /// Minimum alias length in characters.
    pub min_chars: usize,
    /// Maximum alias length in characters.
    pub max_chars: usize,
}

impl Default for AliasRules {
    fn default() -> Self {
        Self {
            enabled: false,
            min_chars: 2,
            max_chars: 48,
        }
    }
}

impl AliasRules {
    /// Whether `candidate` is an alias under these rules.
    ///
    /// An alias starts with a letter and continues with letters, digits or
    /// dots, and its length lies within `[min_chars, max_chars]`.
    #[must_use]
    pub fn is_alias(&self, candidate: &str) -> bool {
        if !self.enabled {
            return false;
        }
        let len = candidate.chars().count();
        if len < self.min_chars || len > self.max_chars {
            return false;
        }
        let mut chars = candidate.chars();
        match chars.next() {
            Some(first) if first.is_alphabetic() => {}
            _ => return false,
        }
        chars.all(|c| c.is_alphanumeric() || c == '.')
    }
}

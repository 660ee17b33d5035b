//! Fallback segmentation for 16-bit (UCS-2) encoded messages.

use crate::traits::Segmenter;

/// User-data capacity of a single SMS PDU, in bytes.
pub const MAX_USER_DATA_BYTES: usize = 140;

/// User-data capacity of a PDU that also carries a concatenation header.
pub const MAX_USER_DATA_BYTES_WITH_HEADER: usize = 134;

/// Segments text as UCS-2, two bytes per UTF-16 code unit.
///
/// A body that fits in [`MAX_USER_DATA_BYTES`] is sent whole; longer bodies
/// are cut into chunks of [`MAX_USER_DATA_BYTES_WITH_HEADER`] bytes. A chunk
/// boundary never falls inside a surrogate pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ucs2Segmenter;

impl Segmenter for Ucs2Segmenter {
    fn divide_message(&self, body: &str) -> Vec<String> {
        let total_units = body.encode_utf16().count();
        if total_units == 0 {
            return Vec::new();
        }
        if total_units * 2 <= MAX_USER_DATA_BYTES {
            return vec![body.to_string()];
        }

        let limit = MAX_USER_DATA_BYTES_WITH_HEADER / 2;
        let mut segments = Vec::with_capacity(total_units.div_ceil(limit));
        let mut current = String::new();
        let mut current_units = 0;
        for c in body.chars() {
            let units = c.len_utf16();
            if current_units + units > limit {
                segments.push(std::mem::take(&mut current));
                current_units = 0;
            }
            current.push(c);
            current_units += units;
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}

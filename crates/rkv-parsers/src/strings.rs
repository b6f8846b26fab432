//! Printable string extraction
//!
//! Mirrors the default behaviour of `strings(1)`: runs of printable ASCII
//! (plus tab) of at least `min_length` bytes, terminated by any other byte.

use serde::{Deserialize, Serialize};

/// Default minimum run length used by `strings(1)`
pub const DEFAULT_MIN_LENGTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedString {
    pub value: String,
    pub offset: u64,
}

fn is_printable(byte: u8) -> bool {
    byte == b'\t' || (0x20..0x7F).contains(&byte)
}

/// Extract all printable strings from a buffer, in file order
pub fn extract_strings(data: &[u8], min_length: usize) -> Vec<ExtractedString> {
    let mut strings = Vec::new();
    let mut start = 0usize;
    let mut in_run = false;

    for (i, &byte) in data.iter().enumerate() {
        if is_printable(byte) {
            if !in_run {
                start = i;
                in_run = true;
            }
        } else if in_run {
            push_run(&mut strings, data, start, i, min_length);
            in_run = false;
        }
    }

    if in_run {
        push_run(&mut strings, data, start, data.len(), min_length);
    }

    strings
}

fn push_run(
    out: &mut Vec<ExtractedString>,
    data: &[u8],
    start: usize,
    end: usize,
    min_length: usize,
) {
    if end - start < min_length.max(1) {
        return;
    }
    // Printable ASCII is always valid UTF-8
    let value = String::from_utf8_lossy(&data[start..end]).into_owned();
    out.push(ExtractedString {
        value,
        offset: start as u64,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_terminated_and_trailing_runs() {
        let data = b"\x00\x01h264_rkmpp\x00ab\x00scale_rkrga";
        let found = extract_strings(data, DEFAULT_MIN_LENGTH);

        let values: Vec<_> = found.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(values, vec!["h264_rkmpp", "scale_rkrga"]);
        assert_eq!(found[0].offset, 2);
    }

    #[test]
    fn test_min_length_filters_short_runs() {
        let data = b"abc\xffabcd\xffabcdefgh";
        assert_eq!(extract_strings(data, 5).len(), 1);
        assert_eq!(extract_strings(data, 3).len(), 3);
    }

    #[test]
    fn test_tab_is_printable() {
        let found = extract_strings(b"\x00key\tvalue\x00", 4);
        assert_eq!(found[0].value, "key\tvalue");
    }
}

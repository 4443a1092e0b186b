//! String primitives.
//!
//! Strings are counted Unicode: positions and lengths are in characters,
//! indexing is 1-based, and values are immutable. `copy_str` is the
//! canonical substring operation; out-of-range requests degrade to the
//! empty string rather than failing.

use std::cmp::Ordering;

use crate::{
    error::{RunError, RunResult},
    value::Value,
};

/// 1-based character read. Fails with an index error citing the valid
/// bounds `[1..len]`.
pub fn char_at(s: &str, index: i64) -> RunResult<Value> {
    let len = s.chars().count() as i64;
    if index < 1 || index > len {
        return Err(RunError::index(index, 1, len, "string"));
    }
    let ch = s
        .chars()
        .nth(index as usize - 1)
        .expect("index checked against char count");
    Ok(Value::Str(ch.to_string().as_str().into()))
}

/// The canonical substring operation `Copy(s, idx, cnt)` (1-based).
///
/// Any out-of-range combination — index before the first or past the last
/// character, non-positive count — yields the empty string.
#[must_use]
pub fn copy_str(s: &str, idx: i64, cnt: i64) -> String {
    if idx < 1 || cnt < 1 {
        return String::new();
    }
    s.chars()
        .skip(idx as usize - 1)
        .take(usize::try_from(cnt).unwrap_or(usize::MAX))
        .collect()
}

/// `Pos(needle, haystack)`: 1-based character position of the first match,
/// 0 when absent.
#[must_use]
pub fn pos(needle: &str, haystack: &str) -> i64 {
    pos_ex(needle, haystack, 1)
}

/// `PosEx(needle, haystack, offset)`: first match at or after the 1-based
/// `offset`, 0 when absent. An empty needle returns 0 even at a valid
/// offset, and a non-positive or past-the-end offset returns 0.
#[must_use]
pub fn pos_ex(needle: &str, haystack: &str, offset: i64) -> i64 {
    if needle.is_empty() || offset < 1 {
        return 0;
    }
    let chars: Vec<char> = haystack.chars().collect();
    let start = offset as usize - 1;
    if start >= chars.len() {
        return 0;
    }
    let pattern: Vec<char> = needle.chars().collect();
    if pattern.len() > chars.len() {
        return 0;
    }
    for at in start..=(chars.len() - pattern.len()) {
        if chars[at..at + pattern.len()] == pattern[..] {
            return at as i64 + 1;
        }
    }
    0
}

/// Byte-wise (codepoint-unit) total order — the default, case-sensitive
/// string comparison.
#[must_use]
pub fn compare_str(a: &str, b: &str) -> Ordering {
    a.cmp(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_edge_cases() {
        // The canonical edge-case table for Copy(s, idx, cnt).
        let cases: &[(&str, i64, i64, &str)] = &[
            ("hello", 1, 2, "he"),
            ("hello", 4, 2, "lo"),
            ("hello", 10, 5, ""),
            ("hello", 1, 0, ""),
            ("hello", 1, -5, ""),
            ("hello", 0, 3, ""),
            ("hello", -1, 3, ""),
            ("", 1, 5, ""),
        ];
        for &(s, idx, cnt, expected) in cases {
            assert_eq!(
                copy_str(s, idx, cnt),
                expected,
                "Copy({s:?}, {idx}, {cnt}) should be {expected:?}"
            );
        }
    }

    #[test]
    fn copy_counts_characters_not_bytes() {
        assert_eq!(copy_str("héllo", 2, 2), "él");
    }

    #[test]
    fn pos_is_one_based() {
        assert_eq!(pos("ll", "hello"), 3);
        assert_eq!(pos("z", "hello"), 0);
        assert_eq!(pos("h", "hello"), 1);
    }

    #[test]
    fn pos_ex_respects_offset() {
        assert_eq!(pos_ex("l", "hello", 1), 3);
        assert_eq!(pos_ex("l", "hello", 4), 4);
        assert_eq!(pos_ex("l", "hello", 5), 0);
        assert_eq!(pos_ex("h", "hello", 99), 0);
        assert_eq!(pos_ex("h", "hello", 0), 0);
    }

    #[test]
    fn pos_ex_empty_needle_returns_zero() {
        // Source behaviour preserved: an empty needle never matches, even
        // at a valid offset.
        assert_eq!(pos_ex("", "hello", 1), 0);
        assert_eq!(pos_ex("", "hello", 3), 0);
    }

    #[test]
    fn char_at_bounds() {
        assert_eq!(char_at("hello", 1).unwrap(), Value::string("h"));
        assert_eq!(char_at("hello", 5).unwrap(), Value::string("o"));
        assert_eq!(char_at("hello", 0).unwrap_err(), RunError::index(0, 1, 5, "string"));
        assert_eq!(char_at("hello", 6).unwrap_err(), RunError::index(6, 1, 5, "string"));
        assert!(char_at("", 1).is_err());
    }

    #[test]
    fn compare_str_is_byte_wise() {
        assert_eq!(compare_str("abc", "abd"), Ordering::Less);
        assert_eq!(compare_str("B", "a"), Ordering::Less, "case-sensitive by default");
    }
}

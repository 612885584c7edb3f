// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Positional index digits.
//!
//! Indices are written in base 255 over [`DIGITS`], a run of printable codepoints that
//! starts at `!` and skips the format's reserved characters, whitespace, and control
//! characters. Every number is one length symbol (how many digits follow) and then the
//! digits, most significant first, so consecutive numbers need no separator.

use crate::error::MalformedText;

/// Number of distinct digit symbols.
pub const RADIX: usize = 255;

/// Characters with structural meaning in the text format.
pub const RESERVED: [char; 6] = ['[', ']', ':', ';', '?', '>'];

/// Digit symbols in ascending codepoint order; `DIGITS[d]` renders digit value `d`.
pub const DIGITS: [char; RADIX] = build_digits();

/// Most digits a `usize` can need.
pub const MAX_DIGITS: usize = digits_for(usize::MAX);

const fn skipped(cp: u32) -> bool {
    matches!(
        cp,
        0x3A | 0x3B | 0x3E | 0x3F | 0x5B | 0x5D | 0x7F..=0xA0 | 0xAD
    )
}

const fn build_digits() -> [char; RADIX] {
    let mut out = ['\0'; RADIX];
    let mut cp = 0x21_u32;
    let mut i = 0;
    while i < RADIX {
        if !skipped(cp) {
            if let Some(c) = char::from_u32(cp) {
                out[i] = c;
                i += 1;
            }
        }
        cp += 1;
    }
    out
}

const fn digits_for(mut n: usize) -> usize {
    let mut count = 1;
    while n >= RADIX {
        n /= RADIX;
        count += 1;
    }
    count
}

/// Value of digit symbol `c`, if it is one.
pub fn digit_value(c: char) -> Option<usize> {
    DIGITS.binary_search(&c).ok()
}

/// Append the encoding of `n` to `out`.
pub fn write_index(out: &mut String, mut n: usize) {
    let mut digits = [0_usize; MAX_DIGITS];
    let mut len = 0;
    loop {
        digits[len] = n % RADIX;
        len += 1;
        n /= RADIX;
        if n == 0 {
            break;
        }
    }
    out.push(DIGITS[len]);
    for d in digits[..len].iter().rev() {
        out.push(DIGITS[*d]);
    }
}

/// Parse one index from the front of `text`.
///
/// Returns the value and the number of bytes it occupied.
pub fn parse_index(text: &str) -> Result<(usize, usize), MalformedText> {
    let mut chars = text.char_indices();
    let (_, head) = chars.next().ok_or(MalformedText::UnexpectedEnd)?;
    let count = digit_value(head).ok_or(MalformedText::InvalidDigit(head))?;
    if count == 0 {
        return Err(MalformedText::InvalidDigit(head));
    }
    if count > MAX_DIGITS {
        return Err(MalformedText::Overflow);
    }
    let mut value = 0_usize;
    for _ in 0..count {
        let (_, c) = chars.next().ok_or(MalformedText::UnexpectedEnd)?;
        let d = digit_value(c).ok_or(MalformedText::InvalidDigit(c))?;
        value = value
            .checked_mul(RADIX)
            .and_then(|v| v.checked_add(d))
            .ok_or(MalformedText::Overflow)?;
    }
    Ok((value, chars.offset()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(n: usize) -> String {
        let mut s = String::new();
        write_index(&mut s, n);
        s
    }

    #[test]
    fn alphabet_is_sorted_printable_and_unreserved() {
        assert_eq!(DIGITS[0], '!');
        assert_eq!(DIGITS[254], '\u{148}');
        assert!(DIGITS.windows(2).all(|w| w[0] < w[1]), "digits must be sorted");
        for c in DIGITS {
            assert!(!RESERVED.contains(&c), "{c:?} is reserved");
            assert!(!c.is_whitespace() && !c.is_control(), "{c:?} is not printable");
            assert_ne!(c, '\u{AD}');
        }
    }

    #[test]
    fn small_indices_take_two_symbols() {
        assert_eq!(encoded(0), "\"!");
        assert_eq!(encoded(1), "\"\"");
        assert_eq!(encoded(254).chars().count(), 2);
        assert_eq!(encoded(255).chars().count(), 3);
    }

    #[test]
    fn parse_reads_back_and_reports_length() {
        for n in [0, 1, 87, 88, 254, 255, 65_025, 1 << 31, usize::MAX] {
            let mut s = encoded(n);
            let len = s.len();
            s.push(';');
            assert_eq!(parse_index(&s), Ok((n, len)), "index {n}");
        }
    }

    #[test]
    fn consecutive_indices_need_no_separator() {
        let mut s = String::new();
        for n in [3, 300, 0] {
            write_index(&mut s, n);
        }
        let (a, used) = parse_index(&s).unwrap();
        let (b, used_b) = parse_index(&s[used..]).unwrap();
        let (c, _) = parse_index(&s[used + used_b..]).unwrap();
        assert_eq!((a, b, c), (3, 300, 0));
    }

    #[test]
    fn malformed_indices() {
        assert_eq!(parse_index(""), Err(MalformedText::UnexpectedEnd));
        assert_eq!(parse_index("\""), Err(MalformedText::UnexpectedEnd));
        assert_eq!(parse_index("!"), Err(MalformedText::InvalidDigit('!')));
        assert_eq!(parse_index(";"), Err(MalformedText::InvalidDigit(';')));
        assert_eq!(parse_index("\" "), Err(MalformedText::InvalidDigit(' ')));
        let too_long = DIGITS[MAX_DIGITS + 1].to_string();
        assert_eq!(parse_index(&too_long), Err(MalformedText::Overflow));
        // Enough digits, but more than a usize holds.
        let max: String = core::iter::once(DIGITS[MAX_DIGITS])
            .chain(core::iter::repeat_n(DIGITS[254], MAX_DIGITS))
            .collect();
        assert_eq!(parse_index(&max), Err(MalformedText::Overflow));
    }
}

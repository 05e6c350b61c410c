//! Token estimation
//!
//! One estimated token per 3.5 characters, rounded up. This is not a real
//! tokenizer; callers may rely only on determinism and monotonicity.
//!
//! Characters are counted as UTF-16 code units, so a character outside the
//! Basic Multilingual Plane (most emoji) counts twice.

/// `ceil(utf16_len / 3.5)`, computed in integers
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    let units = text.encode_utf16().count();
    (2 * units).div_ceil(7)
}

/// `1234567` -> `1,234,567`
#[must_use]
pub fn with_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

//! C-compatible text helpers shared by the opcodes and the settings accessor
//!
//! Scripts written for the extension standard rely on the exact behaviour of
//! `strtol`, `atof` and `stricmp`, so these mirror the C library rather than
//! Rust's stricter parsers.

fn is_c_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\x0b' | b'\x0c' | b'\r')
}

/// `strtol(text, NULL, 0)` narrowed to `int`.
///
/// Accepts leading whitespace, a sign, a `0x` prefix for hex and a leading
/// `0` for octal. Parsing stops at the first invalid digit; no digits
/// yields 0.
pub fn parse_c_int(text: &str) -> i32 {
    let bytes = text.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() && is_c_space(bytes[pos]) {
        pos += 1;
    }

    let mut negative = false;
    if pos < bytes.len() && (bytes[pos] == b'+' || bytes[pos] == b'-') {
        negative = bytes[pos] == b'-';
        pos += 1;
    }

    let mut radix = 10;
    if pos < bytes.len() && bytes[pos] == b'0' {
        let has_hex_prefix = matches!(bytes.get(pos + 1), Some(b'x') | Some(b'X'))
            && bytes.get(pos + 2).map_or(false, |b| b.is_ascii_hexdigit());
        if has_hex_prefix {
            radix = 16;
            pos += 2;
        } else {
            radix = 8;
        }
    }

    let mut value: i64 = 0;
    while pos < bytes.len() {
        let digit = match (bytes[pos] as char).to_digit(radix) {
            Some(d) => d as i64,
            None => break,
        };
        value = value.saturating_mul(radix as i64).saturating_add(digit);
        pos += 1;
    }

    if negative {
        value = value.saturating_neg();
    }
    value as i32
}

/// `atof(text)` narrowed to `float`: the longest numeric prefix, 0.0 if none.
pub fn parse_c_float(text: &str) -> f32 {
    let trimmed = text.trim_start_matches(|c: char| c.is_ascii() && is_c_space(c as u8));
    let bytes = trimmed.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }

    let rest = trimmed[end..].to_ascii_lowercase();
    if rest.starts_with("inf") || rest.starts_with("nan") {
        let sign = if trimmed.starts_with('-') { -1.0 } else { 1.0 };
        return if rest.starts_with("inf") {
            sign * f32::INFINITY
        } else {
            f32::NAN
        };
    }

    let mantissa_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    let mantissa = &trimmed[mantissa_start..end];
    if mantissa.is_empty() || mantissa == "." {
        return 0.0;
    }

    // Only take the exponent when it has digits
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }

    trimmed[..end].parse::<f64>().map(|v| v as f32).unwrap_or(0.0)
}

/// `stricmp(a, b) == 0` over ASCII letters
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Truncate to at most `max_len` bytes without splitting a character
pub fn truncate_at_boundary(text: &mut String, max_len: usize) {
    if text.len() <= max_len {
        return;
    }
    let mut cut = max_len;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_c_int_bases() {
        assert_eq!(parse_c_int("42"), 42);
        assert_eq!(parse_c_int("  -17"), -17);
        assert_eq!(parse_c_int("0x1F"), 31);
        assert_eq!(parse_c_int("0X10"), 16);
        assert_eq!(parse_c_int("010"), 8);
        assert_eq!(parse_c_int("+7abc"), 7);
    }

    #[test]
    fn test_parse_c_int_without_digits() {
        assert_eq!(parse_c_int(""), 0);
        assert_eq!(parse_c_int("abc"), 0);
        assert_eq!(parse_c_int("0x"), 0);
        assert_eq!(parse_c_int("0xg"), 0);
        assert_eq!(parse_c_int("09"), 0);
    }

    #[test]
    fn test_parse_c_float_prefix() {
        assert_eq!(parse_c_float("3.5"), 3.5);
        assert_eq!(parse_c_float(" -2.25xyz"), -2.25);
        assert_eq!(parse_c_float("1e3"), 1000.0);
        assert_eq!(parse_c_float("1e"), 1.0);
        assert_eq!(parse_c_float(".5"), 0.5);
        assert_eq!(parse_c_float("abc"), 0.0);
        assert_eq!(parse_c_float("-inf"), f32::NEG_INFINITY);
    }

    #[test]
    fn test_truncate_at_boundary() {
        let mut text = "héllo".to_string();
        truncate_at_boundary(&mut text, 2);
        assert_eq!(text, "h");

        let mut short = "ok".to_string();
        truncate_at_boundary(&mut short, 10);
        assert_eq!(short, "ok");
    }
}

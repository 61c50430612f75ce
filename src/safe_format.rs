//! Printf-style formatting of script values without touching native printf
//!
//! Templates come from script text, so every conversion is parsed and
//! rendered here: `%n` prints as `%d`, `%s` of a non-string prints as `%d`,
//! and a pointer argument never reaches a renderer. Output is bounded by
//! [`OUTPUT_MAX_LEN`] bytes.

use crate::context::ScriptContext;
use crate::error::BridgeError;
use crate::util::truncate_at_boundary;
use crate::value::TaggedValue;
use log::{debug, warn};

/// Longest template accepted, in bytes
pub const TEMPLATE_MAX_LEN: usize = 1024;

/// Capacity of the rendered output, in bytes
pub const OUTPUT_MAX_LEN: usize = 5120;

/// Most values a single template can consume
pub const MAX_FORMAT_ARGS: usize = 7;

/// Text rendered for an opaque pointer argument
const UNSUPPORTED_TYPE: &str = "<UNSUPPORTED TYPE>";

/// Returned when the template is too long
const OVERFLOW_RESULT: &str = "Error";

fn is_length_modifier(c: char) -> bool {
    matches!(c, 'h' | 'l' | 'j' | 'z' | 't' | 'w' | 'L' | 'I')
}

/// Flags, width and precision of one conversion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ConversionSpec {
    left: bool,
    plus: bool,
    space: bool,
    alt: bool,
    zero: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

impl ConversionSpec {
    /// Parse the characters between `%` and the conversion letter.
    /// Anything that is not a flag, a digit or `.` is ignored.
    fn parse(text: &str) -> Self {
        #[derive(PartialEq)]
        enum Part {
            Flags,
            Width,
            Precision,
        }

        let mut spec = ConversionSpec::default();
        let mut part = Part::Flags;
        let mut width = 0usize;
        let mut precision = 0usize;

        for c in text.chars() {
            match (c, &part) {
                ('-', Part::Flags) => spec.left = true,
                ('+', Part::Flags) => spec.plus = true,
                (' ', Part::Flags) => spec.space = true,
                ('#', Part::Flags) => spec.alt = true,
                ('0', Part::Flags) => spec.zero = true,
                ('.', Part::Flags) | ('.', Part::Width) => {
                    part = Part::Precision;
                    spec.precision = Some(0);
                }
                ('0'..='9', Part::Flags) | ('0'..='9', Part::Width) => {
                    part = Part::Width;
                    width = accumulate_digit(width, c);
                    spec.width = Some(width);
                }
                ('0'..='9', Part::Precision) => {
                    precision = accumulate_digit(precision, c);
                    spec.precision = Some(precision);
                }
                _ => {}
            }
        }

        spec
    }

    fn width(&self) -> usize {
        self.width.unwrap_or(0)
    }

    /// Sign character for a signed conversion of a value
    fn sign(&self, negative: bool) -> &'static str {
        if negative {
            "-"
        } else if self.plus {
            "+"
        } else if self.space {
            " "
        } else {
            ""
        }
    }

    /// Pad `prefix` + `body` to the field width. Zeros go between the two.
    fn pad_number(&self, prefix: &str, body: &str, zero_allowed: bool) -> String {
        let len = prefix.len() + body.len();
        let fill = self.width().saturating_sub(len);
        if fill == 0 {
            return format!("{}{}", prefix, body);
        }

        if self.left {
            format!("{}{}{}", prefix, body, " ".repeat(fill))
        } else if self.zero && zero_allowed {
            format!("{}{}{}", prefix, "0".repeat(fill), body)
        } else {
            format!("{}{}{}", " ".repeat(fill), prefix, body)
        }
    }

    fn pad_text(&self, text: &str) -> String {
        self.pad_number("", text, false)
    }
}

fn accumulate_digit(value: usize, digit: char) -> usize {
    let digit = digit.to_digit(10).unwrap_or(0) as usize;
    value
        .saturating_mul(10)
        .saturating_add(digit)
        .min(OUTPUT_MAX_LEN)
}

/// Render an integer conversion (`d i u o x X c p`)
fn render_int(spec: &ConversionSpec, conversion: char, value: i32) -> String {
    match conversion {
        'c' => {
            let byte = value as u8;
            if byte == 0 {
                return String::new();
            }
            return spec.pad_text(&(byte as char).to_string());
        }
        'p' => {
            let address = value as u32;
            let text = if address == 0 {
                "(nil)".to_string()
            } else {
                format!("0x{:x}", address)
            };
            return spec.pad_text(&text);
        }
        _ => {}
    }

    let (sign, mut digits) = match conversion {
        'd' | 'i' => (spec.sign(value < 0), value.unsigned_abs().to_string()),
        'u' => ("", (value as u32).to_string()),
        'o' => ("", format!("{:o}", value as u32)),
        'x' => ("", format!("{:x}", value as u32)),
        _ => ("", format!("{:X}", value as u32)),
    };

    if let Some(precision) = spec.precision {
        if precision == 0 && value == 0 {
            digits.clear();
        } else if digits.len() < precision {
            digits = format!("{}{}", "0".repeat(precision - digits.len()), digits);
        }
    }

    let mut prefix = sign.to_string();
    if spec.alt {
        match conversion {
            'o' if !digits.starts_with('0') => digits.insert(0, '0'),
            'x' if value != 0 => prefix.push_str("0x"),
            'X' if value != 0 => prefix.push_str("0X"),
            _ => {}
        }
    }

    spec.pad_number(&prefix, &digits, spec.precision.is_none())
}

/// C-style exponent form: at least two exponent digits and an explicit sign
fn exponent_form(value: f64, precision: usize, upper: bool, alt: bool) -> String {
    let rendered = format!("{:.*e}", precision, value);
    let (mantissa, exponent) = rendered.split_once('e').unwrap_or((rendered.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let mut out = mantissa.to_string();
    if alt && precision == 0 {
        out.push('.');
    }
    out.push(if upper { 'E' } else { 'e' });
    out.push(if exponent < 0 { '-' } else { '+' });
    out.push_str(&format!("{:02}", exponent.unsigned_abs()));
    out
}

/// Decimal exponent of `value` once rounded to `precision` fraction digits
fn decimal_exponent(value: f64, precision: usize) -> i32 {
    if value == 0.0 {
        return 0;
    }
    let rendered = format!("{:.*e}", precision, value);
    rendered
        .split_once('e')
        .and_then(|(_, exponent)| exponent.parse().ok())
        .unwrap_or(0)
}

fn strip_fraction_zeros(text: &str) -> String {
    if !text.contains('.') {
        return text.to_string();
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// `%g`: shortest of fixed and exponent form per the C rules
fn general_form(value: f64, precision: usize, upper: bool, alt: bool) -> String {
    let precision = precision.max(1);
    let exponent = decimal_exponent(value, precision - 1);

    if exponent >= -4 && exponent < precision as i32 {
        let fraction = (precision as i32 - 1 - exponent) as usize;
        let fixed = format!("{:.*}", fraction, value);
        if alt {
            fixed
        } else {
            strip_fraction_zeros(&fixed)
        }
    } else {
        let exp = exponent_form(value, precision - 1, upper, alt);
        if alt {
            return exp;
        }
        match exp.find(|c| c == 'e' || c == 'E') {
            Some(split) => format!("{}{}", strip_fraction_zeros(&exp[..split]), &exp[split..]),
            None => exp,
        }
    }
}

/// Fraction digits of an `f64` mantissa in hex
const HEX_FRACTION_DIGITS: usize = 13;

/// `%a`: hex mantissa and binary exponent, `0x1.8p+1` for 3.0. Returns the
/// `0x` prefix and the rest separately so zero padding goes between them.
/// Without a precision the fraction is exact with trailing zeros dropped.
fn hex_float_form(
    value: f64,
    precision: Option<usize>,
    upper: bool,
    alt: bool,
) -> (&'static str, String) {
    let bits = value.to_bits();
    let (mut mantissa, exponent) = if value == 0.0 {
        (0u64, 0i32)
    } else {
        let biased = ((bits >> 52) & 0x7ff) as i32;
        ((1u64 << 52) | (bits & ((1u64 << 52) - 1)), biased - 1023)
    };

    let mut digits = match precision {
        Some(p) if p < HEX_FRACTION_DIGITS => {
            // round half to even at the last kept digit
            let shift = (HEX_FRACTION_DIGITS - p) * 4;
            let rest = mantissa & ((1u64 << shift) - 1);
            let half = 1u64 << (shift - 1);
            mantissa >>= shift;
            if rest > half || (rest == half && mantissa & 1 == 1) {
                mantissa += 1;
            }
            p
        }
        Some(p) => p,
        None => HEX_FRACTION_DIGITS,
    };

    let kept = digits.min(HEX_FRACTION_DIGITS);
    let lead = mantissa >> (kept * 4);
    let mut fraction = if kept == 0 {
        String::new()
    } else {
        format!("{:0width$x}", mantissa & ((1u64 << (kept * 4)) - 1), width = kept)
    };
    if precision.is_none() {
        fraction.truncate(fraction.trim_end_matches('0').len());
        digits = fraction.len();
    }
    while fraction.len() < digits {
        fraction.push('0');
    }

    let mut body = lead.to_string();
    if !fraction.is_empty() || alt {
        body.push('.');
    }
    body.push_str(&fraction);
    body.push('p');
    body.push(if exponent < 0 { '-' } else { '+' });
    body.push_str(&exponent.unsigned_abs().to_string());

    if upper {
        ("0X", body.to_ascii_uppercase())
    } else {
        ("0x", body)
    }
}

/// Render a float conversion (`f F e E g G a A`)
fn render_float(spec: &ConversionSpec, conversion: char, value: f64) -> String {
    let upper = conversion.is_ascii_uppercase();
    let sign = spec.sign(value.is_sign_negative() && !value.is_nan());

    if !value.is_finite() {
        let body = match (value.is_nan(), upper) {
            (true, false) => "nan",
            (true, true) => "NAN",
            (false, false) => "inf",
            (false, true) => "INF",
        };
        return spec.pad_number(sign, body, false);
    }

    let magnitude = value.abs();
    if matches!(conversion, 'a' | 'A') {
        let (radix, body) = hex_float_form(magnitude, spec.precision, upper, spec.alt);
        return spec.pad_number(&format!("{}{}", sign, radix), &body, true);
    }

    let precision = spec.precision.unwrap_or(6);
    let body = match conversion {
        'f' | 'F' => {
            let mut fixed = format!("{:.*}", precision, magnitude);
            if spec.alt && precision == 0 {
                fixed.push('.');
            }
            fixed
        }
        'e' | 'E' => exponent_form(magnitude, precision, upper, spec.alt),
        _ => general_form(magnitude, precision, upper, spec.alt),
    };

    spec.pad_number(sign, &body, true)
}

fn render_string(spec: &ConversionSpec, text: &str) -> String {
    let mut text = text.to_string();
    if let Some(precision) = spec.precision {
        truncate_at_boundary(&mut text, precision);
    }
    spec.pad_text(&text)
}

/// Render one conversion of `arg`, or `None` when the letter is not a
/// supported conversion.
fn render_conversion(
    ctx: &dyn ScriptContext,
    spec_text: &str,
    conversion: char,
    arg: TaggedValue,
) -> Option<String> {
    let spec = ConversionSpec::parse(spec_text);

    if let TaggedValue::Pointer(_) = arg {
        return Some(render_string(&spec, UNSUPPORTED_TYPE));
    }

    match conversion {
        'd' | 'i' | 'u' | 'o' | 'x' | 'X' | 'c' | 'p' => {
            let value = match arg {
                TaggedValue::Int(v) => v,
                TaggedValue::Float(v) => v.trunc() as i32,
                TaggedValue::String(handle) => handle as i32,
                TaggedValue::Pointer(_) => 0,
            };
            Some(render_int(&spec, conversion, value))
        }
        'f' | 'F' | 'e' | 'E' | 'g' | 'G' | 'a' | 'A' => {
            let value = match arg {
                TaggedValue::Int(v) => v as f64,
                TaggedValue::Float(v) => v as f64,
                TaggedValue::String(handle) => handle as f64,
                TaggedValue::Pointer(_) => 0.0,
            };
            Some(render_float(&spec, conversion, value))
        }
        's' => {
            let text = match arg {
                TaggedValue::String(handle) => ctx.get_string(handle).unwrap_or_else(|e| {
                    debug!("format: {}", e);
                    ""
                }),
                _ => "",
            };
            Some(render_string(&spec, text))
        }
        _ => None,
    }
}

/// Output buffer with a hard byte capacity
struct BoundedOutput {
    text: String,
}

impl BoundedOutput {
    fn new() -> Self {
        BoundedOutput {
            text: String::new(),
        }
    }

    /// Append as much of `part` as fits. Returns `false` once full.
    fn append(&mut self, part: &str) -> bool {
        let remaining = OUTPUT_MAX_LEN - self.text.len();
        if part.len() < remaining {
            self.text.push_str(part);
            return true;
        }

        let mut cut = remaining;
        while !part.is_char_boundary(cut) {
            cut -= 1;
        }
        self.text.push_str(&part[..cut]);
        false
    }
}

/// Format `template` against `args`, failing only when the template is too
/// long. `op_name` prefixes diagnostics.
pub fn try_format(
    ctx: &dyn ScriptContext,
    template: &str,
    args: &[TaggedValue],
    op_name: &str,
) -> Result<String, BridgeError> {
    if template.is_empty() {
        return Ok(String::new());
    }
    if template.len() > TEMPLATE_MAX_LEN {
        return Err(BridgeError::FormatOverflow(template.len()));
    }

    let mut out = BoundedOutput::new();
    // Literal text since the last emit, then the conversion being read
    let mut pending = String::new();
    // Byte offset of the `%` in `pending` while a conversion is open
    let mut conversion_start: Option<usize> = None;
    let mut consumed = 0usize;

    for c in template.chars() {
        let Some(start) = conversion_start else {
            if c == '%' {
                conversion_start = Some(pending.len());
            }
            pending.push(c);
            continue;
        };

        if c == '%' {
            if !out.append(&pending) {
                return Ok(out.text);
            }
        } else if c.is_ascii_alphabetic() {
            if is_length_modifier(c) {
                continue;
            }

            consumed += 1;
            if consumed == args.len() + 1 {
                debug!(
                    "{}() - format string contains more conversions than passed arguments ({}): {}",
                    op_name,
                    args.len(),
                    template
                );
            }
            let arg = match args.len() {
                0 => TaggedValue::Int(0),
                len => args[(consumed - 1).min(len - 1)],
            };

            let mut conversion = match c {
                'S' | 'Z' => 's',
                'n' => 'd',
                other => other,
            };
            if conversion == 's' && !arg.is_string() {
                conversion = 'd';
            }

            let spec_text = &pending[start + 1..];
            let rendered = render_conversion(ctx, spec_text, conversion, arg);
            let part = match rendered {
                Some(text) => format!("{}{}", &pending[..start], text),
                None => {
                    debug!("{}() - unsupported conversion '%{}'", op_name, c);
                    format!("{}{}", pending, c)
                }
            };
            if !out.append(&part) {
                return Ok(out.text);
            }
        } else {
            pending.push(c);
            continue;
        }

        pending.clear();
        conversion_start = None;
    }

    out.append(&pending);
    Ok(out.text)
}

/// Format for a script: a too-long template yields `"Error"`.
pub fn safe_format(
    ctx: &dyn ScriptContext,
    template: &str,
    args: &[TaggedValue],
    op_name: &str,
) -> String {
    match try_format(ctx, template, args, op_name) {
        Ok(text) => text,
        Err(e) => {
            warn!(
                "{}(): format string exceeds maximum length of {} characters ({})",
                op_name, TEMPLATE_MAX_LEN, e
            );
            OVERFLOW_RESULT.to_string()
        }
    }
}

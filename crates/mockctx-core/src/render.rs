//! Message rendering engine.
//!
//! Reconstructs the text a test runner would have printed for a report:
//! - plain reports render every argument in its default form and join them
//!   with single spaces;
//! - formatted reports treat the template as a sequence of `%` directives
//!   and substitute the arguments positionally.
//!
//! Directive grammar: `%` [flags `-+# 0`] [`[n]`] [width | `*`]
//! [`.` precision | `.*`] verb. Supported verbs are
//! `v s d q x X o b c t f F e E g G T`, plus the `%%` escape.
//!
//! `%q` escapes control characters as `\x00` (ASCII) or `\u0085` (other),
//! never in the `\0` / `\u{85}` forms.
//!
//! Rendering never panics. Misuse (missing or surplus arguments, a verb that
//! does not apply to its argument, a truncated directive, a float precision
//! above [`MAX_FLOAT_PRECISION`]) is returned as a [`RenderError`] so callers
//! can treat the message as unmatched.

use thiserror::Error;

use crate::arg::Arg;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("missing argument {index} for verb %{verb}")]
    MissingArgument { verb: char, index: usize },
    #[error("{count} argument(s) left unused by the format string")]
    ExtraArguments { count: usize },
    #[error("verb %{verb} does not apply to a {kind} argument")]
    BadVerb { verb: char, kind: &'static str },
    #[error("malformed directive at byte {offset}")]
    Malformed { offset: usize },
    #[error("argument index [{index}] is out of range")]
    BadIndex { index: usize },
    #[error("argument {index} used for width or precision is not an integer")]
    BadStarArgument { index: usize },
    #[error("formatted call has no string template")]
    MissingTemplate,
    #[error("precision {precision} exceeds the float limit of {max}", max = MAX_FLOAT_PRECISION)]
    PrecisionTooLarge { precision: usize },
}

/// Largest precision accepted for float verbs.
pub const MAX_FLOAT_PRECISION: usize = 4096;

// ---------------------------------------------------------------------------
// Directive types
// ---------------------------------------------------------------------------

/// Flags parsed from a directive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatFlags {
    pub left_justify: bool, // '-'
    pub force_sign: bool,   // '+'
    pub space_sign: bool,   // ' '
    pub alt_form: bool,     // '#'
    pub zero_pad: bool,     // '0'
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    None,
    Fixed(usize),
    FromArg, // '*'
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    None,
    Fixed(usize),
    FromArg, // '.*'
}

/// A parsed directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    pub flags: FormatFlags,
    /// Explicit 1-based argument index (`%[2]d`).
    pub arg_index: Option<usize>,
    pub width: Width,
    pub precision: Precision,
    pub verb: char,
}

/// A piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatSegment<'a> {
    Literal(&'a str),
    /// `%%`.
    Percent,
    Spec(FormatSpec),
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse one directive. `fmt` starts at the byte after `%`.
///
/// Returns the directive and the number of bytes consumed, or `None` when the
/// template ends before a verb or an index bracket is not closed.
pub fn parse_format_spec(fmt: &str) -> Option<(FormatSpec, usize)> {
    let bytes = fmt.as_bytes();
    let len = bytes.len();
    let mut pos = 0;

    let mut flags = FormatFlags::default();
    while pos < len {
        match bytes[pos] {
            b'-' => flags.left_justify = true,
            b'+' => flags.force_sign = true,
            b' ' => flags.space_sign = true,
            b'#' => flags.alt_form = true,
            b'0' => flags.zero_pad = true,
            _ => break,
        }
        pos += 1;
    }
    if flags.force_sign {
        flags.space_sign = false;
    }
    if flags.left_justify {
        flags.zero_pad = false;
    }

    let arg_index = if pos < len && bytes[pos] == b'[' {
        let start = pos + 1;
        let close = start + bytes[start..].iter().position(|&b| b == b']')?;
        let digits = &bytes[start..close];
        if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
            return None;
        }
        pos = close + 1;
        Some(parse_decimal(digits))
    } else {
        None
    };

    let width = if pos < len && bytes[pos] == b'*' {
        pos += 1;
        Width::FromArg
    } else {
        let start = pos;
        while pos < len && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos > start {
            Width::Fixed(parse_decimal(&bytes[start..pos]))
        } else {
            Width::None
        }
    };

    let precision = if pos < len && bytes[pos] == b'.' {
        pos += 1;
        if pos < len && bytes[pos] == b'*' {
            pos += 1;
            Precision::FromArg
        } else {
            let start = pos;
            while pos < len && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
            Precision::Fixed(parse_decimal(&bytes[start..pos]))
        }
    } else {
        Precision::None
    };

    // Every byte consumed so far is ASCII, so `pos` is a char boundary.
    let verb = fmt[pos..].chars().next()?;
    pos += verb.len_utf8();

    Some((
        FormatSpec {
            flags,
            arg_index,
            width,
            precision,
            verb,
        },
        pos,
    ))
}

/// Split a template into literal runs, `%%` escapes and directives.
pub fn parse_format_string(fmt: &str) -> Result<Vec<FormatSegment<'_>>, RenderError> {
    let bytes = fmt.as_bytes();
    let len = bytes.len();
    let mut segments = Vec::new();
    let mut pos = 0;

    while pos < len {
        let start = pos;
        while pos < len && bytes[pos] != b'%' {
            pos += 1;
        }
        if pos > start {
            segments.push(FormatSegment::Literal(&fmt[start..pos]));
        }
        if pos >= len {
            break;
        }
        let percent_at = pos;
        pos += 1;
        if pos < len && bytes[pos] == b'%' {
            segments.push(FormatSegment::Percent);
            pos += 1;
            continue;
        }
        let (spec, consumed) = parse_format_spec(&fmt[pos..]).ok_or(RenderError::Malformed {
            offset: percent_at,
        })?;
        pos += consumed;
        segments.push(FormatSegment::Spec(spec));
    }
    Ok(segments)
}

// ---------------------------------------------------------------------------
// Message reconstruction
// ---------------------------------------------------------------------------

/// Render a plain report: default forms joined by single spaces.
#[must_use]
pub fn render_plain(args: &[Arg]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a formatted report by substituting `args` into `template`.
pub fn render_format(template: &str, args: &[Arg]) -> Result<String, RenderError> {
    let segments = parse_format_string(template)?;
    let mut out = String::with_capacity(template.len());
    let mut cursor = 0_usize;
    let mut reordered = false;

    for segment in segments {
        let mut spec = match segment {
            FormatSegment::Literal(text) => {
                out.push_str(text);
                continue;
            }
            FormatSegment::Percent => {
                out.push('%');
                continue;
            }
            FormatSegment::Spec(spec) => spec,
        };

        if let Some(index) = spec.arg_index {
            if index == 0 || index > args.len() {
                return Err(RenderError::BadIndex { index });
            }
            cursor = index - 1;
            reordered = true;
        }

        if spec.width == Width::FromArg {
            let width = star_argument(args, &mut cursor)?;
            if width < 0 {
                spec.flags.left_justify = true;
                spec.flags.zero_pad = false;
            }
            spec.width = Width::Fixed(width.unsigned_abs() as usize);
        }
        if spec.precision == Precision::FromArg {
            let precision = star_argument(args, &mut cursor)?;
            spec.precision = if precision < 0 {
                Precision::None
            } else {
                Precision::Fixed(precision as usize)
            };
        }

        let arg = args.get(cursor).ok_or(RenderError::MissingArgument {
            verb: spec.verb,
            index: cursor + 1,
        })?;
        cursor += 1;
        if let Arg::Float(_) = arg
            && let Precision::Fixed(precision) = spec.precision
            && precision > MAX_FLOAT_PRECISION
        {
            return Err(RenderError::PrecisionTooLarge { precision });
        }
        format_arg(arg, &spec, &mut out)?;
    }

    if !reordered && cursor < args.len() {
        return Err(RenderError::ExtraArguments {
            count: args.len() - cursor,
        });
    }
    Ok(out)
}

fn star_argument(args: &[Arg], cursor: &mut usize) -> Result<i64, RenderError> {
    let index = *cursor + 1;
    let value = args
        .get(*cursor)
        .and_then(Arg::as_i64)
        .ok_or(RenderError::BadStarArgument { index })?;
    *cursor += 1;
    Ok(value)
}

/// Render one argument under one directive.
pub fn format_arg(arg: &Arg, spec: &FormatSpec, out: &mut String) -> Result<(), RenderError> {
    let bad_verb = || RenderError::BadVerb {
        verb: spec.verb,
        kind: arg.kind_name(),
    };

    match (arg, spec.verb) {
        (_, 'T') => format_str(arg.kind_name(), spec, out),
        (Arg::Nil, 'v') => format_str("<nil>", spec, out),
        (Arg::Bool(v), 'v' | 't') => format_str(if *v { "true" } else { "false" }, spec, out),
        (Arg::Int(v), 'v') => format_integer(*v < 0, v.unsigned_abs(), &with_verb(spec, 'd'), out),
        (Arg::Int(v), 'd' | 'x' | 'X' | 'o' | 'b') => {
            format_integer(*v < 0, v.unsigned_abs(), spec, out);
        }
        (Arg::Uint(v), 'v') => format_integer(false, *v, &with_verb(spec, 'd'), out),
        (Arg::Uint(v), 'd' | 'x' | 'X' | 'o' | 'b') => format_integer(false, *v, spec, out),
        (Arg::Int(_) | Arg::Uint(_), 'c' | 'q') => {
            let code = arg.as_i64().and_then(|v| u32::try_from(v).ok());
            let c = code
                .and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            format_char(c, spec, out);
        }
        (Arg::Char(c), 'v' | 'c' | 'q') => format_char(*c, spec, out),
        (Arg::Char(c), 's') => format_str(c.encode_utf8(&mut [0; 4]), spec, out),
        (Arg::Char(c), 'd' | 'x' | 'X' | 'o' | 'b') => {
            format_integer(false, u64::from(u32::from(*c)), spec, out);
        }
        (Arg::Float(v), 'v') => format_float(*v, &with_verb(spec, 'g'), out),
        (Arg::Float(v), 'f' | 'F' | 'e' | 'E' | 'g' | 'G') => format_float(*v, spec, out),
        (Arg::Str(s), 'v' | 's') => format_str(s, spec, out),
        (Arg::Str(s), 'q') => format_quoted(s, spec, out),
        (Arg::Str(s), 'x' | 'X') => format_hex_bytes(s.as_bytes(), spec, out),
        _ => return Err(bad_verb()),
    }
    Ok(())
}

fn with_verb(spec: &FormatSpec, verb: char) -> FormatSpec {
    FormatSpec {
        verb,
        ..spec.clone()
    }
}

// ---------------------------------------------------------------------------
// Renderers
// ---------------------------------------------------------------------------

/// Render an integer given as sign + magnitude (`%d %x %X %o %b`).
pub fn format_integer(negative: bool, magnitude: u64, spec: &FormatSpec, out: &mut String) {
    let (base, uppercase) = int_base(spec.verb);
    let mut digits = [0u8; 64];
    let digit_count = render_digits(magnitude, base, uppercase, &mut digits);
    let digit_slice = &digits[64 - digit_count..];

    let sign = if negative {
        Some('-')
    } else if spec.flags.force_sign {
        Some('+')
    } else if spec.flags.space_sign {
        Some(' ')
    } else {
        None
    };

    let min_digits = match spec.precision {
        Precision::Fixed(p) => p,
        _ => 1,
    };
    let suppress_zero = magnitude == 0 && spec.precision == Precision::Fixed(0);
    let shown_digits = if suppress_zero { 0 } else { digit_count };
    let zero_prefix_count = if suppress_zero {
        0
    } else {
        min_digits.saturating_sub(digit_count)
    };

    let prefix = alt_prefix(spec);
    let content = usize::from(sign.is_some()) + prefix.len() + zero_prefix_count + shown_digits;
    let pad_total = resolve_width(spec).saturating_sub(content);
    // An explicit precision disables zero padding.
    let zero_pad = spec.flags.zero_pad && spec.precision == Precision::None;

    if !spec.flags.left_justify && !zero_pad {
        pad(out, ' ', pad_total);
    }
    if let Some(s) = sign {
        out.push(s);
    }
    out.push_str(prefix);
    if !spec.flags.left_justify && zero_pad {
        pad(out, '0', pad_total);
    }
    pad(out, '0', zero_prefix_count);
    if !suppress_zero {
        // Digits are ASCII.
        out.extend(digit_slice.iter().map(|&d| char::from(d)));
    }
    if spec.flags.left_justify {
        pad(out, ' ', pad_total);
    }
}

/// Render a float (`%f %F %e %E %g %G`; `%g` without precision is the
/// shortest round-trip form). Precision is clamped to [`MAX_FLOAT_PRECISION`].
pub fn format_float(value: f64, spec: &FormatSpec, out: &mut String) {
    if value.is_nan() {
        let text = if spec.flags.force_sign {
            "+NaN"
        } else if spec.flags.space_sign {
            " NaN"
        } else {
            "NaN"
        };
        return format_str(text, &without_zero_pad(spec), out);
    }
    if value.is_infinite() {
        let text = if value < 0.0 {
            "-Inf"
        } else if spec.flags.space_sign {
            " Inf"
        } else {
            "+Inf"
        };
        return format_str(text, &without_zero_pad(spec), out);
    }

    let negative = value.is_sign_negative();
    let abs = value.abs();
    let uppercase = spec.verb.is_ascii_uppercase();
    let precision = match spec.precision {
        Precision::Fixed(p) => Precision::Fixed(p.min(MAX_FLOAT_PRECISION)),
        other => other,
    };
    let body = match (spec.verb.to_ascii_lowercase(), precision) {
        ('e', Precision::Fixed(p)) => format_e(abs, p, uppercase),
        ('e', _) => format_e(abs, 6, uppercase),
        ('g', Precision::Fixed(p)) => format_g(abs, p, uppercase, spec.flags.alt_form),
        ('g', _) => {
            let s = shortest_float(abs);
            if uppercase { s.to_ascii_uppercase() } else { s }
        }
        (_, Precision::Fixed(p)) => format_f(abs, p, spec.flags.alt_form),
        _ => format_f(abs, 6, spec.flags.alt_form),
    };

    let sign = if negative {
        Some('-')
    } else if spec.flags.force_sign {
        Some('+')
    } else if spec.flags.space_sign {
        Some(' ')
    } else {
        None
    };

    let content = usize::from(sign.is_some()) + body.len();
    let pad_total = resolve_width(spec).saturating_sub(content);

    if !spec.flags.left_justify && !spec.flags.zero_pad {
        pad(out, ' ', pad_total);
    }
    if let Some(s) = sign {
        out.push(s);
    }
    if !spec.flags.left_justify && spec.flags.zero_pad {
        pad(out, '0', pad_total);
    }
    out.push_str(&body);
    if spec.flags.left_justify {
        pad(out, ' ', pad_total);
    }
}

/// Render a string; precision truncates, width pads (both in chars).
pub fn format_str(s: &str, spec: &FormatSpec, out: &mut String) {
    let effective = match spec.precision {
        Precision::Fixed(p) => truncate_chars(s, p),
        _ => s,
    };
    write_padded(effective, spec, out);
}

pub fn format_char(c: char, spec: &FormatSpec, out: &mut String) {
    if spec.verb == 'q' {
        write_padded(&quote(&c.to_string(), '\''), spec, out);
    } else {
        let mut buf = [0u8; 4];
        write_padded(c.encode_utf8(&mut buf), spec, out);
    }
}

/// `%q`: truncate first, then quote with escapes.
pub fn format_quoted(s: &str, spec: &FormatSpec, out: &mut String) {
    let effective = match spec.precision {
        Precision::Fixed(p) => truncate_chars(s, p),
        _ => s,
    };
    write_padded(&quote(effective, '"'), spec, out);
}

/// `%x` / `%X` on strings: two hex digits per byte.
pub fn format_hex_bytes(bytes: &[u8], spec: &FormatSpec, out: &mut String) {
    let limit = match spec.precision {
        Precision::Fixed(p) => p.min(bytes.len()),
        _ => bytes.len(),
    };
    let hex: String = bytes[..limit]
        .iter()
        .map(|b| {
            if spec.verb == 'X' {
                format!("{b:02X}")
            } else {
                format!("{b:02x}")
            }
        })
        .collect();
    write_padded(&hex, spec, out);
}

/// Shortest decimal form that round-trips, switching to exponent form when
/// the decimal exponent is below -4 or at least 21.
#[must_use]
pub fn shortest_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-Inf" } else { "+Inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    let sci = format!("{value:e}");
    let exp = sci
        .split_once('e')
        .and_then(|(_, e)| e.parse::<i32>().ok())
        .unwrap_or(0);
    if (-4..21).contains(&exp) {
        format!("{value}")
    } else {
        exponent_form(&sci, false)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn parse_decimal(digits: &[u8]) -> usize {
    let mut result = 0_usize;
    for &d in digits {
        result = result
            .saturating_mul(10)
            .saturating_add(usize::from(d - b'0'));
    }
    result
}

fn resolve_width(spec: &FormatSpec) -> usize {
    match spec.width {
        Width::Fixed(w) => w,
        _ => 0,
    }
}

fn without_zero_pad(spec: &FormatSpec) -> FormatSpec {
    let mut spec = spec.clone();
    spec.flags.zero_pad = false;
    spec.precision = Precision::None;
    spec
}

fn int_base(verb: char) -> (u64, bool) {
    match verb {
        'b' => (2, false),
        'o' => (8, false),
        'x' => (16, false),
        'X' => (16, true),
        _ => (10, false),
    }
}

/// Render `value` in `base` right-aligned into `buf`; returns the digit count.
fn render_digits(mut value: u64, base: u64, uppercase: bool, buf: &mut [u8; 64]) -> usize {
    if value == 0 {
        buf[63] = b'0';
        return 1;
    }
    let alpha = if uppercase { b'A' } else { b'a' };
    let mut pos = 64;
    while value > 0 && pos > 0 {
        pos -= 1;
        let digit = (value % base) as u8;
        buf[pos] = if digit < 10 {
            b'0' + digit
        } else {
            alpha + (digit - 10)
        };
        value /= base;
    }
    64 - pos
}

fn alt_prefix(spec: &FormatSpec) -> &'static str {
    if !spec.flags.alt_form {
        return "";
    }
    match spec.verb {
        'b' => "0b",
        'o' => "0",
        'x' => "0x",
        'X' => "0X",
        _ => "",
    }
}

fn pad(out: &mut String, fill: char, count: usize) {
    // Width comes from the template; cap it.
    out.extend(std::iter::repeat_n(fill, count.min(4096)));
}

fn write_padded(text: &str, spec: &FormatSpec, out: &mut String) {
    let pad_total = resolve_width(spec).saturating_sub(text.chars().count());
    if !spec.flags.left_justify {
        pad(out, ' ', pad_total);
    }
    out.push_str(text);
    if spec.flags.left_justify {
        pad(out, ' ', pad_total);
    }
}

/// Wrap `s` in `delim` quotes, escaping the delimiter, backslash and
/// control characters.
fn quote(s: &str, delim: char) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push(delim);
    for c in s.chars() {
        match c {
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0b' => out.push_str("\\v"),
            '\\' => out.push_str("\\\\"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_ascii_control() => out.push_str(&format!("\\x{:02x}", u32::from(c))),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn format_f(value: f64, precision: usize, alt_form: bool) -> String {
    if precision == 0 && alt_form {
        format!("{value:.0}.")
    } else {
        format!("{value:.precision$}")
    }
}

fn format_e(value: f64, precision: usize, uppercase: bool) -> String {
    exponent_form(&format!("{value:.precision$e}"), uppercase)
}

/// Rewrite Rust's `1.5e-7` as `1.5e-07`: explicit sign, at least two digits.
fn exponent_form(sci: &str, uppercase: bool) -> String {
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci, "0"));
    let exp = exp.parse::<i32>().unwrap_or(0);
    let e_char = if uppercase { 'E' } else { 'e' };
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}{e_char}{sign}{:02}", exp.unsigned_abs())
}

/// `%.Ng`: N significant digits, fixed or exponent form by magnitude.
fn format_g(value: f64, precision: usize, uppercase: bool, alt_form: bool) -> String {
    let p = precision.max(1);
    if value == 0.0 {
        return "0".to_string();
    }

    // Exponent after rounding to `p` significant digits.
    let rounded = format!("{value:.prec$e}", prec = p - 1);
    let exp = rounded
        .split_once('e')
        .and_then(|(_, e)| e.parse::<i32>().ok())
        .unwrap_or(0);

    if exp >= -4 && exp < p as i32 {
        let frac_digits = (p as i32 - 1 - exp).max(0) as usize;
        let mut s = format!("{value:.frac_digits$}");
        if !alt_form {
            strip_trailing_zeros(&mut s);
        }
        s
    } else {
        let (mantissa, _) = rounded.split_once('e').unwrap_or((rounded.as_str(), ""));
        let mut mantissa = mantissa.to_string();
        if !alt_form {
            strip_trailing_zeros(&mut mantissa);
        }
        exponent_form(&format!("{mantissa}e{exp}"), uppercase)
    }
}

fn strip_trailing_zeros(s: &mut String) {
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;

    fn render(template: &str, args: &[Arg]) -> String {
        render_format(template, args).unwrap()
    }

    #[test]
    fn test_parse_simple_verb() {
        let (spec, consumed) = parse_format_spec("d").unwrap();
        assert_eq!(consumed, 1);
        assert_eq!(spec.verb, 'd');
        assert_eq!(spec.width, Width::None);
        assert_eq!(spec.precision, Precision::None);
    }

    #[test]
    fn test_parse_width_precision() {
        let (spec, consumed) = parse_format_spec("10.5f").unwrap();
        assert_eq!(consumed, 5);
        assert_eq!(spec.verb, 'f');
        assert_eq!(spec.width, Width::Fixed(10));
        assert_eq!(spec.precision, Precision::Fixed(5));
    }

    #[test]
    fn test_parse_flags() {
        let (spec, _) = parse_format_spec("-+#010d").unwrap();
        assert!(spec.flags.left_justify);
        assert!(spec.flags.force_sign);
        assert!(spec.flags.alt_form);
        assert!(!spec.flags.zero_pad);
    }

    #[test]
    fn test_parse_explicit_index() {
        let (spec, consumed) = parse_format_spec("[2]*s").unwrap();
        assert_eq!(consumed, 5);
        assert_eq!(spec.arg_index, Some(2));
        assert_eq!(spec.width, Width::FromArg);
        assert!(parse_format_spec("[x]d").is_none());
        assert!(parse_format_spec("[2").is_none());
    }

    #[test]
    fn test_parse_format_string_segments() {
        let segments = parse_format_string("hello %d world %s!").unwrap();
        assert_eq!(segments.len(), 5);
        assert_eq!(segments[0], FormatSegment::Literal("hello "));
        assert!(matches!(&segments[1], FormatSegment::Spec(s) if s.verb == 'd'));
        assert_eq!(segments[2], FormatSegment::Literal(" world "));
        assert!(matches!(&segments[3], FormatSegment::Spec(s) if s.verb == 's'));
        assert_eq!(segments[4], FormatSegment::Literal("!"));
    }

    #[test]
    fn test_parse_percent_escape() {
        let segments = parse_format_string("100%%").unwrap();
        assert_eq!(
            segments,
            vec![FormatSegment::Literal("100"), FormatSegment::Percent]
        );
    }

    #[test]
    fn test_trailing_percent_is_malformed() {
        assert_eq!(
            parse_format_string("50%"),
            Err(RenderError::Malformed { offset: 2 })
        );
    }

    #[test]
    fn plain_rendering_joins_with_spaces() {
        assert_eq!(render_plain(args!["a", 1, true, 2.5]), "a 1 true 2.5");
        assert_eq!(render_plain(args![]), "");
        assert_eq!(render_plain(args!["Condition not met!"]), "Condition not met!");
    }

    #[test]
    fn substitutes_strings() {
        assert_eq!(render("an %s occurred", args!["error"]), "an error occurred");
        assert_eq!(render("no directives", args![]), "no directives");
    }

    #[test]
    fn substitutes_integers() {
        assert_eq!(render("%d", args![42]), "42");
        assert_eq!(render("%d", args![-123]), "-123");
        assert_eq!(render("%8d|", args![42]), "      42|");
        assert_eq!(render("%08d", args![42]), "00000042");
        assert_eq!(render("%-8d|", args![42]), "42      |");
        assert_eq!(render("%+d", args![42]), "+42");
        assert_eq!(render("%d", args![i64::MIN]), "-9223372036854775808");
        assert_eq!(render("%.3d", args![7]), "007");
        assert_eq!(render("%.0d|", args![0]), "|");
    }

    #[test]
    fn integer_bases() {
        assert_eq!(render("%x %X %o %b", args![255, 255, 8, 5]), "ff FF 10 101");
        assert_eq!(render("%#x %#o %#b", args![255, 8, 5]), "0xff 010 0b101");
        assert_eq!(render("%x", args![-255]), "-ff");
    }

    #[test]
    fn substitutes_floats() {
        assert_eq!(render("%f", args![3.5]), "3.500000");
        assert_eq!(render("%.2f", args![3.14159]), "3.14");
        assert_eq!(render("%8.3f|", args![-1.5]), "  -1.500|");
        assert_eq!(render("%e", args![1234.5678]), "1.234568e+03");
        assert_eq!(render("%E", args![0.00012]), "1.200000E-04");
        assert_eq!(render("%g", args![0.1 + 0.2]), "0.30000000000000004");
        assert_eq!(render("%.3g", args![1234.5678]), "1.23e+03");
        assert_eq!(render("%.3g", args![0.0001234]), "0.000123");
        assert_eq!(render("%v", args![1e21]), "1e+21");
        assert_eq!(render("%v", args![1.5e-7]), "1.5e-07");
        assert_eq!(render("%f", args![f64::NAN]), "NaN");
        assert_eq!(render("%f", args![f64::INFINITY]), "+Inf");
    }

    #[test]
    fn substitutes_other_kinds() {
        assert_eq!(render("%t", args![true]), "true");
        assert_eq!(render("%c%c", args!['o', 107]), "ok");
        assert_eq!(render("%q", args!["a\"b"]), r#""a\"b""#);
        assert_eq!(render("%q", args!['x']), "'x'");
        assert_eq!(render("%x", args!["hi"]), "6869");
        assert_eq!(render("%v", args![None::<i32>]), "<nil>");
        assert_eq!(render("%T %T", args!["s", 1]), "String i64");
    }

    #[test]
    fn string_width_and_precision_count_chars() {
        assert_eq!(render("%5s|", args!["ab"]), "   ab|");
        assert_eq!(render("%-5s|", args!["ab"]), "ab   |");
        assert_eq!(render("%.3s", args!["hello"]), "hel");
        assert_eq!(render("%.2s", args!["héllo"]), "hé");
        assert_eq!(render("%4s|", args!["é"]), "   é|");
    }

    #[test]
    fn star_width_and_precision() {
        assert_eq!(render("%*d|", args![5, 42]), "   42|");
        assert_eq!(render("%-*d|", args![5, 42]), "42   |");
        assert_eq!(render("%*d|", args![-5, 42]), "42   |");
        assert_eq!(render("%.*f", args![2, 3.14159]), "3.14");
        assert_eq!(
            render_format("%*d", args!["wide", 42]),
            Err(RenderError::BadStarArgument { index: 1 })
        );
    }

    #[test]
    fn explicit_indexes_reorder_arguments() {
        assert_eq!(render("%[2]s %[1]s", args!["world", "hello"]), "hello world");
        assert_eq!(render("%[1]d %d", args![1, 2]), "1 2");
        assert_eq!(render("%[1]s %[1]s", args!["echo", "unused"]), "echo echo");
        assert_eq!(
            render_format("%[3]s", args!["a"]),
            Err(RenderError::BadIndex { index: 3 })
        );
    }

    #[test]
    fn argument_count_mismatch_is_an_error() {
        assert_eq!(
            render_format("%s and %s", args!["one"]),
            Err(RenderError::MissingArgument {
                verb: 's',
                index: 2
            })
        );
        assert_eq!(
            render_format("%s", args!["one", "two"]),
            Err(RenderError::ExtraArguments { count: 1 })
        );
        assert_eq!(
            render_format("plain", args![1]),
            Err(RenderError::ExtraArguments { count: 1 })
        );
    }

    #[test]
    fn verb_kind_mismatch_is_an_error() {
        assert_eq!(
            render_format("%d", args!["text"]),
            Err(RenderError::BadVerb {
                verb: 'd',
                kind: "String"
            })
        );
        assert_eq!(
            render_format("%s", args![5]),
            Err(RenderError::BadVerb {
                verb: 's',
                kind: "i64"
            })
        );
        assert!(render_format("%z", args![5]).is_err());
    }

    #[test]
    fn percent_escape_consumes_nothing() {
        assert_eq!(render("100%% of %d", args![3]), "100% of 3");
    }

    #[test]
    fn huge_width_is_capped() {
        let out = render("%99999d", args![1]);
        assert_eq!(out.len(), 4097);
        assert!(out.ends_with(" 1"));
    }

    #[test]
    fn huge_float_precision_is_an_error() {
        for template in ["%.70000f", "%.70000e", "%.70000g", "%.70000v", "%.4097f"] {
            assert_eq!(
                render_format(template, args![1.5]),
                Err(RenderError::PrecisionTooLarge {
                    precision: template[2..template.len() - 1].parse().unwrap()
                }),
                "{template}"
            );
        }
        assert_eq!(
            render_format("%.*f", args![70_000, 1.5]),
            Err(RenderError::PrecisionTooLarge { precision: 70_000 })
        );
        assert_eq!(render("%.4096f", args![1.5]).len(), 4098);
        // Non-float verbs keep their own limits.
        assert_eq!(render("%.70000s", args!["ok"]), "ok");
    }

    #[test]
    fn format_float_clamps_precision() {
        let spec = FormatSpec {
            flags: FormatFlags::default(),
            arg_index: None,
            width: Width::None,
            precision: Precision::Fixed(usize::MAX),
            verb: 'e',
        };
        let mut out = String::new();
        format_float(2.0, &spec, &mut out);
        assert!(out.starts_with("2.000"));
        assert!(out.ends_with("e+00"));
    }

    #[test]
    fn nan_honours_sign_flags() {
        assert_eq!(render("%+f", args![f64::NAN]), "+NaN");
        assert_eq!(render("% f", args![f64::NAN]), " NaN");
        assert_eq!(render("%06.2f|", args![f64::NAN]), "   NaN|");
    }

    #[test]
    fn quoting_escapes_control_characters() {
        assert_eq!(render("%q", args!["a\u{0}b\u{7f}"]), r#""a\x00b\x7f""#);
        assert_eq!(render("%q", args!["tab\there\n"]), r#""tab\there\n""#);
        assert_eq!(render("%q", args!["back\\slash"]), r#""back\\slash""#);
        assert_eq!(render("%q", args!["it's"]), r#""it's""#);
        assert_eq!(render("%q", args!["\u{85}é"]), r#""\u0085é""#);
        assert_eq!(render("%q", args!['\'']), r"'\''");
        assert_eq!(render("%q", args!['"']), r#"'"'"#);
        assert_eq!(render("%q", args!['\u{0}']), r"'\x00'");
    }
}

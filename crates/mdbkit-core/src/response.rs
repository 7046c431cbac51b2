//! Value extraction from raw command responses.

use crate::breakpoint::Address;

/// Prefix of a breakpoint-creation response.
pub const BREAKPOINT_PREFIX: &str = "Breakpoint ";

/// Prefix of a watchpoint-creation response.
pub const WATCHPOINT_PREFIX: &str = "Watchpoint ";

/// Decimal identifier following `prefix`, e.g. `Breakpoint 3 at ...`.
pub fn id_after(response: &str, prefix: &str) -> Option<u32> {
    let rest = &response[response.find(prefix)? + prefix.len()..];
    let digits = leading(rest, |c| c.is_ascii_digit());
    digits.parse().ok()
}

/// Integer printed for `variable` by `print /<f> <variable>`.
///
/// The value follows `<variable>=`, optionally after whitespace, and uses
/// C-style radix prefixes (`0x` hex, leading `0` octal, else decimal).
pub fn print_value(response: &str, variable: &str) -> Option<i64> {
    let marker = format!("{variable}=");
    let rest = &response[response.find(&marker)? + marker.len()..];
    parse_c_integer(rest.trim_start())
}

/// Address printed by `print /a <variable>`.
pub fn address_value(response: &str, variable: &str) -> Option<Address> {
    let marker = format!("The Address of {variable}: ");
    let rest = response[response.find(&marker)? + marker.len()..].trim_start();
    let rest = rest
        .strip_prefix("0x")
        .or_else(|| rest.strip_prefix("0X"))
        .unwrap_or(rest);
    Address::from_str_radix(leading(rest, |c| c.is_ascii_hexdigit()), 16).ok()
}

/// Parse a leading integer the way C's `strtol(.., 0)` does.
pub fn parse_c_integer(text: &str) -> Option<i64> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let magnitude = if let Some(hex) = body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
    {
        i64::from_str_radix(leading(hex, |c| c.is_ascii_hexdigit()), 16).ok()?
    } else if body.starts_with('0') {
        let octal = leading(&body[1..], |c| c.is_digit(8));
        if octal.is_empty() {
            0
        } else {
            i64::from_str_radix(octal, 8).ok()?
        }
    } else {
        leading(body, |c| c.is_ascii_digit()).parse().ok()?
    };

    Some(if negative { -magnitude } else { magnitude })
}

fn leading(text: &str, keep: impl Fn(char) -> bool) -> &str {
    text.find(|c: char| !keep(c)).map_or(text, |end| &text[..end])
}

//! TTL specification parsing.
//!
//! A TTL arrives at `set_ttl` as an opaque [`Value`]. Strings are tried as a
//! duration string (`"10s"`, `"1h30m"`, `"250ms"`), then as a plain count of
//! whole seconds (`"10"`). Either may carry one leading sign; a negative TTL
//! means the entry's window has already ended. A `Value::Duration` is taken
//! as-is. Anything else is rejected.

use std::time::Duration;

use crate::error::{StoreError, StoreResult};
use crate::value::Value;

/// A parsed TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// The window lasts this long. Zero reverts to the store-wide default.
    After(Duration),
    /// A negative TTL: the window has already ended.
    Elapsed,
}

/// Parse a TTL specification.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use ttl_store::{ttl::{parse_ttl, Ttl}, Value};
///
/// assert_eq!(parse_ttl(&Value::from("10s")).unwrap(), Ttl::After(Duration::from_secs(10)));
/// assert_eq!(parse_ttl(&Value::from("10")).unwrap(), Ttl::After(Duration::from_secs(10)));
/// assert_eq!(parse_ttl(&Value::from("-1s")).unwrap(), Ttl::Elapsed);
/// assert!(parse_ttl(&Value::from("not-a-duration")).is_err());
/// ```
pub fn parse_ttl(spec: &Value) -> StoreResult<Ttl> {
    match spec {
        Value::Str(s) => parse_signed(s).ok_or_else(|| StoreError::InvalidTtl(s.clone())),
        Value::Duration(d) => Ok(Ttl::After(*d)),
        other => Err(StoreError::InvalidTtl(other.to_string())),
    }
}

/// Strip one leading `-`, then parse the magnitude as a duration string or
/// whole seconds. `"-0"` is zero.
fn parse_signed(s: &str) -> Option<Ttl> {
    let (negative, body) = match s.strip_prefix('-') {
        Some(body) => (true, body),
        None => (false, s),
    };
    // Both parsers take their own `+`; only one sign is allowed.
    if negative && body.starts_with('+') {
        return None;
    }

    let magnitude = parse_duration(body).or_else(|| parse_seconds(body))?;
    if negative && !magnitude.is_zero() {
        Some(Ttl::Elapsed)
    } else {
        Some(Ttl::After(magnitude))
    }
}

/// Parse a plain, unsigned integer number of seconds.
fn parse_seconds(s: &str) -> Option<Duration> {
    s.parse::<u64>().ok().map(Duration::from_secs)
}

/// Parse a duration string made of one or more `<number><unit>` terms.
///
/// Numbers may carry a fraction (`"1.5h"`). Valid units are `ns`, `us`
/// (`µs`, `μs`), `ms`, `s`, `m` and `h`. A leading `+` is allowed and `"0"`
/// is accepted without a unit. A leading `-` is not: the result is a
/// [`Duration`], so the sign is handled by [`parse_ttl`].
pub fn parse_duration(s: &str) -> Option<Duration> {
    let mut rest = s.strip_prefix('+').unwrap_or(s);
    if rest == "0" {
        return Some(Duration::ZERO);
    }
    if rest.is_empty() {
        return None;
    }

    let mut total_nanos: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_part, after_int) = rest.split_at(int_len);

        let (frac_part, after_number) = match after_int.strip_prefix('.') {
            Some(tail) => {
                let frac_len = tail.bytes().take_while(u8::is_ascii_digit).count();
                tail.split_at(frac_len)
            }
            None => ("", after_int),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }

        let unit_len = after_number
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() || *c == '.')
            .map(|(i, _)| i)
            .unwrap_or(after_number.len());
        let (unit, tail) = after_number.split_at(unit_len);
        let scale = unit_nanos(unit)?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().ok()?
        };
        total_nanos = total_nanos.checked_add(whole.checked_mul(scale)?)?;

        if !frac_part.is_empty() {
            // Digits beyond nanosecond resolution carry no weight.
            let digits = &frac_part[..frac_part.len().min(18)];
            let numerator: u128 = digits.parse().ok()?;
            let denominator = 10u128.checked_pow(digits.len() as u32)?;
            total_nanos = total_nanos.checked_add(numerator.checked_mul(scale)? / denominator)?;
        }

        rest = tail;
    }

    let secs = u64::try_from(total_nanos / 1_000_000_000).ok()?;
    let nanos = (total_nanos % 1_000_000_000) as u32;
    Some(Duration::new(secs, nanos))
}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(1_000_000_000),
        "m" => Some(60 * 1_000_000_000),
        "h" => Some(3_600 * 1_000_000_000),
        _ => None,
    }
}

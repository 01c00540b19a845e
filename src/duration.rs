//! Elapsed-time syntax: a sequence of decimal numbers, each with an optional
//! fraction and a mandatory unit, e.g. `300ms`, `1.5h` or `2h45m`. A bare `0`
//! is accepted. Units are `ns`, `us` (`µs`), `ms`, `s`, `m` and `h`.

use std::time::Duration;

use crate::error::DecodeError;

const KIND: &str = "duration";

pub fn parse_duration(raw: &str) -> Result<Duration, DecodeError> {
    let mut s = raw;
    if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    } else if let Some(rest) = s.strip_prefix('-') {
        if rest == "0" {
            return Ok(Duration::ZERO);
        }
        return Err(DecodeError::syntax(KIND, format!("negative duration '{raw}'")));
    }

    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(DecodeError::syntax(KIND, "empty value"));
    }

    let mut total: u128 = 0;
    while !s.is_empty() {
        let int_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (int_part, mut rest) = s.split_at(int_end);

        let mut frac_part = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_end = after_dot
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after_dot.len());
            frac_part = &after_dot[..frac_end];
            rest = &after_dot[frac_end..];
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(DecodeError::syntax(KIND, format!("missing number in '{raw}'")));
        }

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let (unit, tail) = rest.split_at(unit_end);
        let scale = unit_scale(unit)
            .ok_or_else(|| DecodeError::syntax(KIND, format!("unknown unit '{unit}' in '{raw}'")))?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_| DecodeError::OutOfRange { kind: KIND })?
        };
        let mut nanos = whole
            .checked_mul(scale)
            .ok_or(DecodeError::OutOfRange { kind: KIND })?;

        if !frac_part.is_empty() {
            // Digits past nanosecond precision of an hour cannot matter.
            let digits = &frac_part[..frac_part.len().min(18)];
            let frac: u128 = digits
                .parse()
                .map_err(|_| DecodeError::OutOfRange { kind: KIND })?;
            nanos += frac * scale / 10u128.pow(digits.len() as u32);
        }

        total = total
            .checked_add(nanos)
            .ok_or(DecodeError::OutOfRange { kind: KIND })?;
        s = tail;
    }

    let nanos = u64::try_from(total).map_err(|_| DecodeError::OutOfRange { kind: KIND })?;
    Ok(Duration::from_nanos(nanos))
}

fn unit_scale(unit: &str) -> Option<u128> {
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

//! Conversion of resolved raw strings into destination storage.
//!
//! A destination opts into custom decoding by exposing one of four capability
//! traits through [`Decode`]. They are checked in fixed order and the first
//! one present wins:
//!
//! 1. [`Decoder`]
//! 2. [`Setter`] (flag-value style)
//! 3. [`UnmarshalText`]
//! 4. [`UnmarshalBinary`] (receives the raw bytes)
//!
//! Without a capability, [`Decode::decode_builtin`] handles strings, numbers,
//! booleans, durations, sequences, mappings and `Option`. Its default body does
//! nothing, so types with no conversion are silently left untouched.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};

use crate::duration::parse_duration;
use crate::error::{BoxError, DecodeError};

/// Custom "decode from string" capability. Highest precedence.
pub trait Decoder {
    fn decode(&mut self, raw: &str) -> Result<(), BoxError>;
}

/// Flag-value style "set from string" capability.
pub trait Setter {
    fn set(&mut self, raw: &str) -> Result<(), BoxError>;
}

pub trait UnmarshalText {
    fn unmarshal_text(&mut self, text: &[u8]) -> Result<(), BoxError>;
}

pub trait UnmarshalBinary {
    fn unmarshal_binary(&mut self, data: &[u8]) -> Result<(), BoxError>;
}

/// A destination that can receive a raw configuration value.
///
/// Override one capability accessor to opt into custom decoding:
///
/// ```ignore
/// impl Decode for Level {
///     fn decoder(&mut self) -> Option<&mut dyn Decoder> {
///         Some(self)
///     }
/// }
/// ```
pub trait Decode {
    fn decoder(&mut self) -> Option<&mut dyn Decoder> {
        None
    }

    fn setter(&mut self) -> Option<&mut dyn Setter> {
        None
    }

    fn text_unmarshaler(&mut self) -> Option<&mut dyn UnmarshalText> {
        None
    }

    fn binary_unmarshaler(&mut self) -> Option<&mut dyn UnmarshalBinary> {
        None
    }

    fn decode_builtin(&mut self, raw: &str) -> Result<(), DecodeError> {
        let _ = raw;
        Ok(())
    }

    /// Whether the destination is a boolean switch (registered as a
    /// value-less CLI flag).
    fn is_switch(&self) -> bool {
        false
    }
}

/// Types usable as sequence elements and mapping keys/values.
///
/// `u8` is deliberately absent: `Vec<u8>` receives the raw bytes instead.
/// As a consequence `u8` cannot appear inside any sequence or mapping
/// (`HashMap<String, u8>`, `[u8; 4]`); declare such members with `u16`.
pub trait Element: Decode + Default {}

/// Decode `raw` into `target`, honoring capability precedence.
pub fn decode(raw: &str, target: &mut dyn Decode) -> Result<(), DecodeError> {
    if let Some(d) = target.decoder() {
        return d.decode(raw).map_err(DecodeError::Custom);
    }
    if let Some(s) = target.setter() {
        return s.set(raw).map_err(DecodeError::Custom);
    }
    if let Some(t) = target.text_unmarshaler() {
        return t.unmarshal_text(raw.as_bytes()).map_err(DecodeError::Custom);
    }
    if let Some(b) = target.binary_unmarshaler() {
        return b.unmarshal_binary(raw.as_bytes()).map_err(DecodeError::Custom);
    }
    target.decode_builtin(raw)
}

fn decode_fresh<T: Decode + Default>(raw: &str) -> Result<T, DecodeError> {
    let mut slot = T::default();
    decode(raw, &mut slot)?;
    Ok(slot)
}

// --- scalars ---

impl Decode for String {
    fn decode_builtin(&mut self, raw: &str) -> Result<(), DecodeError> {
        *self = raw.to_string();
        Ok(())
    }
}

impl Element for String {}

impl Decode for PathBuf {
    fn decode_builtin(&mut self, raw: &str) -> Result<(), DecodeError> {
        *self = PathBuf::from(raw);
        Ok(())
    }
}

impl Element for PathBuf {}

impl Decode for bool {
    fn decode_builtin(&mut self, raw: &str) -> Result<(), DecodeError> {
        *self = match raw {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => true,
            "0" | "f" | "F" | "false" | "FALSE" | "False" => false,
            other => return Err(DecodeError::syntax("bool", format!("'{other}'"))),
        };
        Ok(())
    }

    fn is_switch(&self) -> bool {
        true
    }
}

impl Element for bool {}

/// Split an integer literal into sign and magnitude.
///
/// Accepts an optional sign and a `0x`, `0o` or `0b` base prefix; `_` digit
/// separators are only allowed after a prefix.
fn parse_magnitude(raw: &str, kind: &'static str) -> Result<(bool, u128), DecodeError> {
    let (negative, body) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };

    let lower = body.get(..2).map(str::to_ascii_lowercase);
    let (radix, digits) = match lower.as_deref() {
        Some("0x") => (16, &body[2..]),
        Some("0o") => (8, &body[2..]),
        Some("0b") => (2, &body[2..]),
        _ => (10, body),
    };

    let digits = if radix == 10 {
        digits.to_string()
    } else {
        digits.replace('_', "")
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(DecodeError::syntax(kind, format!("'{raw}'")));
    }

    let magnitude = u128::from_str_radix(&digits, radix).map_err(|e| match e.kind() {
        std::num::IntErrorKind::PosOverflow => DecodeError::OutOfRange { kind },
        _ => DecodeError::syntax(kind, format!("'{raw}'")),
    })?;
    Ok((negative, magnitude))
}

fn parse_signed<T: TryFrom<i128>>(raw: &str, kind: &'static str) -> Result<T, DecodeError> {
    let (negative, magnitude) = parse_magnitude(raw, kind)?;
    let value = if negative {
        0i128.checked_sub_unsigned(magnitude)
    } else {
        i128::try_from(magnitude).ok()
    }
    .ok_or(DecodeError::OutOfRange { kind })?;
    T::try_from(value).map_err(|_| DecodeError::OutOfRange { kind })
}

fn parse_unsigned<T: TryFrom<u128>>(raw: &str, kind: &'static str) -> Result<T, DecodeError> {
    let (negative, magnitude) = parse_magnitude(raw, kind)?;
    if negative && magnitude != 0 {
        return Err(DecodeError::OutOfRange { kind });
    }
    T::try_from(magnitude).map_err(|_| DecodeError::OutOfRange { kind })
}

macro_rules! decode_signed {
    ($($t:ty),*) => {$(
        impl Decode for $t {
            fn decode_builtin(&mut self, raw: &str) -> Result<(), DecodeError> {
                *self = parse_signed(raw, stringify!($t))?;
                Ok(())
            }
        }

        impl Element for $t {}
    )*};
}

macro_rules! decode_unsigned {
    ($($t:ty),*) => {$(
        impl Decode for $t {
            fn decode_builtin(&mut self, raw: &str) -> Result<(), DecodeError> {
                *self = parse_unsigned(raw, stringify!($t))?;
                Ok(())
            }
        }
    )*};
}

macro_rules! decode_float {
    ($($t:ty),*) => {$(
        impl Decode for $t {
            fn decode_builtin(&mut self, raw: &str) -> Result<(), DecodeError> {
                *self = raw
                    .parse::<$t>()
                    .map_err(|e| DecodeError::syntax(stringify!($t), e))?;
                Ok(())
            }
        }

        impl Element for $t {}
    )*};
}

decode_signed!(i8, i16, i32, i64, i128, isize);
decode_unsigned!(u8, u16, u32, u64, u128, usize);
decode_float!(f32, f64);

impl Element for u16 {}
impl Element for u32 {}
impl Element for u64 {}
impl Element for u128 {}
impl Element for usize {}

impl Decode for Duration {
    fn decode_builtin(&mut self, raw: &str) -> Result<(), DecodeError> {
        *self = parse_duration(raw)?;
        Ok(())
    }
}

impl Element for Duration {}

// --- text capability for calendar types ---

impl UnmarshalText for DateTime<Utc> {
    fn unmarshal_text(&mut self, text: &[u8]) -> Result<(), BoxError> {
        let text = std::str::from_utf8(text)?;
        *self = DateTime::parse_from_rfc3339(text)?.with_timezone(&Utc);
        Ok(())
    }
}

impl Decode for DateTime<Utc> {
    fn text_unmarshaler(&mut self) -> Option<&mut dyn UnmarshalText> {
        Some(self)
    }
}

impl Element for DateTime<Utc> {}

impl UnmarshalText for NaiveDate {
    fn unmarshal_text(&mut self, text: &[u8]) -> Result<(), BoxError> {
        let text = std::str::from_utf8(text)?;
        *self = NaiveDate::parse_from_str(text, "%Y-%m-%d")?;
        Ok(())
    }
}

impl Decode for NaiveDate {
    fn text_unmarshaler(&mut self) -> Option<&mut dyn UnmarshalText> {
        Some(self)
    }
}

// --- sequences ---

impl Decode for Vec<u8> {
    fn decode_builtin(&mut self, raw: &str) -> Result<(), DecodeError> {
        *self = raw.as_bytes().to_vec();
        Ok(())
    }
}

fn decode_items<T: Element>(raw: &str) -> Result<Vec<T>, DecodeError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',').map(decode_fresh).collect()
}

impl<T: Element> Decode for Vec<T> {
    fn decode_builtin(&mut self, raw: &str) -> Result<(), DecodeError> {
        *self = decode_items(raw)?;
        Ok(())
    }
}

impl<T: Element, const N: usize> Decode for [T; N] {
    fn decode_builtin(&mut self, raw: &str) -> Result<(), DecodeError> {
        let items: Vec<T> = decode_items(raw)?;
        let found = items.len();
        *self = items
            .try_into()
            .map_err(|_| DecodeError::Length { expected: N, found })?;
        Ok(())
    }
}

// --- mappings ---

fn decode_pairs<K: Element, V: Element>(raw: &str) -> Result<Vec<(K, V)>, DecodeError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',')
        .map(|pair| {
            let mut parts = pair.split(':');
            let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(DecodeError::MapItem(pair.to_string()));
            };
            Ok((decode_fresh(key)?, decode_fresh(value)?))
        })
        .collect()
}

impl<K: Element + Eq + Hash, V: Element> Decode for HashMap<K, V> {
    fn decode_builtin(&mut self, raw: &str) -> Result<(), DecodeError> {
        *self = decode_pairs(raw)?.into_iter().collect();
        Ok(())
    }
}

impl<K: Element + Ord, V: Element> Decode for BTreeMap<K, V> {
    fn decode_builtin(&mut self, raw: &str) -> Result<(), DecodeError> {
        *self = decode_pairs(raw)?.into_iter().collect();
        Ok(())
    }
}

// --- indirection ---

impl<T: Decode + Default> Decode for Option<T> {
    /// Storage is only allocated once a value decodes successfully.
    fn decode_builtin(&mut self, raw: &str) -> Result<(), DecodeError> {
        match self {
            Some(inner) => decode(raw, inner),
            None => {
                *self = Some(decode_fresh(raw)?);
                Ok(())
            }
        }
    }

    fn is_switch(&self) -> bool {
        match self {
            Some(inner) => inner.is_switch(),
            None => T::default().is_switch(),
        }
    }
}

impl<T: Decode + ?Sized> Decode for Box<T> {
    fn decoder(&mut self) -> Option<&mut dyn Decoder> {
        (**self).decoder()
    }

    fn setter(&mut self) -> Option<&mut dyn Setter> {
        (**self).setter()
    }

    fn text_unmarshaler(&mut self) -> Option<&mut dyn UnmarshalText> {
        (**self).text_unmarshaler()
    }

    fn binary_unmarshaler(&mut self) -> Option<&mut dyn UnmarshalBinary> {
        (**self).binary_unmarshaler()
    }

    fn decode_builtin(&mut self, raw: &str) -> Result<(), DecodeError> {
        (**self).decode_builtin(raw)
    }

    fn is_switch(&self) -> bool {
        (**self).is_switch()
    }
}

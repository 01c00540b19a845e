//! Batch operations over discovered fields: key listings, the effective value
//! map and the printable [`Report`].
//!
//! All of them skip keyless fields and the reserved process keys in
//! [`RESERVED_KEYS`], which are set by the runtime rather than the
//! application.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::ConfError;
use crate::field::Field;
use crate::resolve::resolve_value;
use crate::source::Source;

/// Keys owned by the hosting runtime, never listed or reported.
pub const RESERVED_KEYS: [&str; 4] = [
    "APP_NAME",
    "AWS_PROFILE",
    "AWS_REGION",
    "AWS_LAMBDA_FUNCTION_NAME",
];

const MASKED: &str = "****";

pub(crate) fn is_listed(field: &Field<'_>) -> bool {
    !field.is_keyless() && !RESERVED_KEYS.contains(&field.key.as_str())
}

/// Resolved keys, in discovery order.
pub fn env_names(fields: &[Field<'_>]) -> Vec<String> {
    fields
        .iter()
        .filter(|f| is_listed(f))
        .map(|f| f.key.clone())
        .collect()
}

/// Resolved keys of fields without a default, in discovery order.
pub fn env_names_no_defaults(fields: &[Field<'_>]) -> Vec<String> {
    fields
        .iter()
        .filter(|f| is_listed(f) && !f.has_default())
        .map(|f| f.key.clone())
        .collect()
}

/// Key → effective raw value (source value or default; empty when neither).
///
/// Fails on the first required field that no source satisfies.
pub fn env_to_map(
    fields: &[Field<'_>],
    sources: &[&dyn Source],
) -> Result<BTreeMap<String, String>, ConfError> {
    let mut map = BTreeMap::new();
    for field in fields.iter().filter(|f| is_listed(f)) {
        let resolution = resolve_value(field, sources)?;
        let value = resolution.raw().unwrap_or_default().to_string();
        map.insert(field.key.clone(), value);
    }
    Ok(map)
}

/// Like [`env_to_map`], but never fails on missing values, masks `mask`
/// fields and leaves out `no-print` fields. Source failures still propagate.
pub fn report(fields: &[Field<'_>], sources: &[&dyn Source]) -> Result<Report, ConfError> {
    let mut entries = BTreeMap::new();
    for field in fields.iter().filter(|f| is_listed(f) && !f.options.no_print) {
        let raw = match resolve_value(field, sources) {
            Ok(resolution) => resolution.raw().unwrap_or_default().to_string(),
            Err(ConfError::MissingRequiredValue { .. }) => String::new(),
            Err(e) => return Err(e),
        };
        let value = if field.options.mask && !raw.is_empty() {
            MASKED.to_string()
        } else {
            raw
        };
        entries.insert(field.key.clone(), value);
    }
    Ok(Report { entries })
}

/// Printable view of the effective configuration, sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Report {
    entries: BTreeMap<String, String>,
}

impl Report {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pretty-printed JSON object of key → value.
    pub fn to_json(&self) -> Result<String, ConfError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfError::backend("json", "report", e))
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{key} = {value}")?;
        }
        Ok(())
    }
}

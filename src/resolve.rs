//! Value resolution: walk the source chain for each field, fall back to its
//! default, and decode the winner into place.
//!
//! Per field:
//!
//! 1. Sources are asked in order, highest priority first. The first one that
//!    reports an entry stops the chain.
//! 2. A non-empty entry is used verbatim.
//! 3. An empty entry is still present: the annotated default replaces it if
//!    there is one, otherwise the empty string is decoded.
//! 4. With no entry at all the annotated default is used.
//! 5. Otherwise a required field fails with
//!    [`MissingRequiredValue`](ConfError::MissingRequiredValue), and any other
//!    field is skipped with its storage untouched.

use tracing::trace;

use crate::error::ConfError;
use crate::field::Field;
use crate::source::Source;

/// How a batch pass treats per-field failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Stop at the first failing field.
    #[default]
    FailFast,
    /// Keep going and report every failure as [`ConfError::Multiple`].
    Aggregate,
}

/// Outcome of walking the source chain for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A source held a value, possibly empty.
    Found { value: String, source: String },
    /// The annotated default applies.
    Default(String),
    /// Nothing applies; leave the field alone.
    Skip,
}

impl Resolution {
    pub fn raw(&self) -> Option<&str> {
        match self {
            Resolution::Found { value, .. } => Some(value),
            Resolution::Default(value) => Some(value),
            Resolution::Skip => None,
        }
    }
}

/// Walk `sources` for `field` without touching its storage.
pub fn resolve_value(
    field: &Field<'_>,
    sources: &[&dyn Source],
) -> Result<Resolution, ConfError> {
    for source in sources {
        let Some(value) = source.lookup(field)? else {
            continue;
        };
        if value.is_empty() {
            if let Some(default) = field.default_value() {
                trace!(field = field.name, source = source.name(), "empty entry, using default");
                return Ok(Resolution::Default(default.to_string()));
            }
            trace!(field = field.name, source = source.name(), "empty entry");
            return Ok(Resolution::Found {
                value,
                source: source.name().to_string(),
            });
        }
        trace!(
            field = field.name,
            key = %field.key,
            source = source.name(),
            value = field.display_value(&value),
            "resolved"
        );
        return Ok(Resolution::Found {
            value,
            source: source.name().to_string(),
        });
    }

    if let Some(default) = field.default_value() {
        trace!(field = field.name, key = %field.key, "using default");
        return Ok(Resolution::Default(default.to_string()));
    }
    if field.is_required() {
        return Err(ConfError::MissingRequiredValue {
            field: field.name.to_string(),
            key: field.key.clone(),
        });
    }
    trace!(field = field.name, key = %field.key, "no value, skipped");
    Ok(Resolution::Skip)
}

/// Resolve and decode a single field.
pub fn apply(field: &mut Field<'_>, sources: &[&dyn Source]) -> Result<(), ConfError> {
    match resolve_value(field, sources)?.raw() {
        Some(raw) => field.decode(raw),
        None => Ok(()),
    }
}

/// Resolve and decode every field.
pub fn process(
    fields: &mut [Field<'_>],
    sources: &[&dyn Source],
    mode: Mode,
) -> Result<(), ConfError> {
    let mut failures = Vec::new();
    for field in fields.iter_mut() {
        match apply(field, sources) {
            Ok(()) => {}
            Err(e) if mode == Mode::Aggregate => failures.push(e),
            Err(e) => return Err(e),
        }
    }
    ConfError::from_failures(failures)
}

//! Remote parameter-store paths and collection.
//!
//! Each listed field maps to a store path:
//!
//! - an explicit `pstore:/some/path` is used as written;
//! - `pstore:global` maps to `/global/<KEY>`;
//! - anything else maps to `/<app_title>/<KEY>`.
//!
//! `pstore:-` keeps a field out of the store entirely. The store itself is
//! reached through the [`ParamStore`] trait; nothing here talks to a network.

use std::collections::BTreeMap;

use tracing::debug;

use crate::annotation::EXCLUDE;
use crate::error::{BoxError, ConfError};
use crate::field::Field;
use crate::ops::is_listed;
use crate::resolve::{Resolution, resolve_value};
use crate::source::Source;

/// Directory shared by every application.
pub const GLOBAL: &str = "global";

/// A key/value store addressed by path.
pub trait ParamStore {
    fn get_parameter(&self, path: &str) -> Result<String, BoxError>;
}

impl<F> ParamStore for F
where
    F: Fn(&str) -> Result<String, BoxError>,
{
    fn get_parameter(&self, path: &str) -> Result<String, BoxError> {
        self(path)
    }
}

/// Store path for `field`.
pub fn pstore_key(field: &Field<'_>, app_title: &str) -> String {
    match field.options.pstore.as_deref() {
        Some(GLOBAL) => format!("/{GLOBAL}/{}", field.key),
        Some(explicit) => explicit.to_string(),
        None => format!("/{app_title}/{}", field.key),
    }
}

fn check_title(app_title: &str) -> Result<(), ConfError> {
    if app_title.is_empty() {
        return Err(ConfError::InvalidSpec(
            "an app title is required for parameter-store paths".into(),
        ));
    }
    Ok(())
}

/// Fields that take part in the store, paired with their paths.
fn params<'f, 'a>(
    fields: &'f [Field<'a>],
    app_title: &str,
    skip_defaults: bool,
) -> Result<Vec<(&'f Field<'a>, String)>, ConfError> {
    check_title(app_title)?;
    Ok(fields
        .iter()
        .filter(|f| is_listed(f) && f.options.pstore.as_deref() != Some(EXCLUDE))
        .filter(|f| !(skip_defaults && f.has_default()))
        .map(|f| (f, pstore_key(f, app_title)))
        .collect())
}

/// Store paths of every participating field, in discovery order.
pub fn param_names(
    fields: &[Field<'_>],
    app_title: &str,
    skip_defaults: bool,
) -> Result<Vec<String>, ConfError> {
    Ok(params(fields, app_title, skip_defaults)?
        .into_iter()
        .map(|(_, path)| path)
        .collect())
}

/// Store path → value to publish, taken from `sources`.
///
/// Defaulted fields contribute their default unless `skip_defaults` is set.
/// A required field that no source satisfies is an error.
pub fn collect_params_from_env(
    fields: &[Field<'_>],
    sources: &[&dyn Source],
    app_title: &str,
    skip_defaults: bool,
) -> Result<BTreeMap<String, String>, ConfError> {
    let mut out = BTreeMap::new();
    for (field, path) in params(fields, app_title, false)? {
        let value = match resolve_value(field, sources)? {
            Resolution::Found { value, .. } => value,
            Resolution::Default(_) if skip_defaults => continue,
            Resolution::Default(value) => value,
            Resolution::Skip => String::new(),
        };
        out.insert(path, value);
    }
    Ok(out)
}

/// Fetch every participating field from `store`, keyed by the field's
/// resolved key so the result can feed a [`MapSource`](crate::MapSource).
pub fn collect_params(
    fields: &[Field<'_>],
    store: &dyn ParamStore,
    app_title: &str,
    skip_defaults: bool,
) -> Result<BTreeMap<String, String>, ConfError> {
    let mut out = BTreeMap::new();
    for (field, path) in params(fields, app_title, skip_defaults)? {
        let value = store
            .get_parameter(&path)
            .map_err(|e| ConfError::backend("pstore", path.as_str(), e))?;
        out.insert(field.key.clone(), value);
    }
    debug!(count = out.len(), app_title, "collected parameters");
    Ok(out)
}

//! Field discovery: walk a [`Settings`] composite depth-first and flatten it
//! into an ordered list of leaf [`Field`]s with resolved keys.

use std::fmt;

use tracing::debug;

use crate::annotation::{EXCLUDE, Options, parse_annotation};
use crate::decode::{self, Decode};
use crate::error::{ConfError, DecodeError};
use crate::key;
use crate::settings::{Settings, Slot};

const MASKED: &str = "****";

/// One discovered configuration unit.
pub struct Field<'a> {
    /// Declared member name.
    pub name: &'static str,
    /// Underscore-joined ancestor prefix (empty at the root).
    pub prefix: String,
    /// Resolved lookup key, or `-` when the keyed backend must not be consulted.
    pub key: String,
    /// Dotted structural path, e.g. `nested.nest_value`.
    pub path: String,
    pub options: Options,
    target: &'a mut dyn Decode,
}

impl<'a> Field<'a> {
    pub fn is_required(&self) -> bool {
        self.options.required
    }

    pub fn has_default(&self) -> bool {
        self.options.has_default()
    }

    pub fn default_value(&self) -> Option<&str> {
        self.options.default.as_deref()
    }

    /// Whether the keyed backend is skipped for this field.
    pub fn is_keyless(&self) -> bool {
        self.key == EXCLUDE
    }

    pub fn cli_flag(&self) -> Option<&str> {
        self.options.cli.as_deref()
    }

    pub fn is_switch(&self) -> bool {
        self.target.is_switch()
    }

    /// Text safe to show for a raw value of this field.
    pub fn display_value<'v>(&self, raw: &'v str) -> &'v str {
        if self.options.mask { MASKED } else { raw }
    }

    /// Decode `raw` into the field's storage.
    ///
    /// For masked fields the raw value is blanked out of the error, including
    /// the decoder's own message.
    pub fn decode(&mut self, raw: &str) -> Result<(), ConfError> {
        decode::decode(raw, &mut *self.target).map_err(|source| {
            let source = if self.options.mask && !raw.is_empty() {
                DecodeError::Redacted(source.to_string().replace(raw, MASKED))
            } else {
                source
            };
            ConfError::DecodeFailure {
                field: self.name.to_string(),
                value: self.display_value(raw).to_string(),
                source,
            }
        })
    }
}

impl fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("key", &self.key)
            .field("path", &self.path)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Discover every field of `spec`, optionally under a root key prefix.
///
/// Fails with [`ConfError::InvalidSpec`] when `spec` decodes itself as a
/// single value, and with [`ConfError::MalformedAnnotation`] on the first
/// annotation that does not parse.
pub fn fields<'a, S: Settings>(
    spec: &'a mut S,
    prefix: Option<&str>,
) -> Result<Vec<Field<'a>>, ConfError> {
    let spec: &'a mut dyn Settings = spec;
    if spec.as_leaf().is_some() {
        return Err(ConfError::InvalidSpec(
            "settings root must be a composite, not a single decodable value".into(),
        ));
    }

    let prefix = prefix.map(key::root_prefix).unwrap_or_default();
    let mut out = Vec::new();
    walk(spec, &prefix, "", &mut out)?;
    debug!(count = out.len(), prefix = %prefix, "discovered configuration fields");
    Ok(out)
}

fn walk<'a>(
    spec: &'a mut dyn Settings,
    prefix: &str,
    path: &str,
    out: &mut Vec<Field<'a>>,
) -> Result<(), ConfError> {
    for member in spec.members() {
        if !member.settable || member.annotation.trim() == EXCLUDE {
            continue;
        }

        let name = member.name;
        let options =
            parse_annotation(member.annotation).map_err(|source| ConfError::MalformedAnnotation {
                field: name.to_string(),
                source,
            })?;
        if options.ignore {
            continue;
        }

        let (inner, extend) = match member.slot {
            Slot::Leaf(target) => {
                out.push(leaf(name, prefix, path, options, target)?);
                continue;
            }
            Slot::Nested(inner) => (inner, true),
            Slot::Embedded(inner) => (inner, false),
            Slot::Optional(optional) => (optional.materialize(), true),
        };

        if inner.as_leaf().is_some() {
            if let Some(target) = inner.as_leaf() {
                out.push(leaf(name, prefix, path, options, target)?);
            }
            continue;
        }

        let (inner_prefix, inner_path) = if extend {
            nested_scope(prefix, path, name, &options)
        } else {
            (prefix.to_string(), path.to_string())
        };
        walk(inner, &inner_prefix, &inner_path, out).map_err(|source| ConfError::Embedded {
            field: name.to_string(),
            source: Box::new(source),
        })?;
    }
    Ok(())
}

fn leaf<'a>(
    name: &'static str,
    prefix: &str,
    path: &str,
    options: Options,
    target: &'a mut dyn Decode,
) -> Result<Field<'a>, ConfError> {
    let resolved = key::build_key(prefix, name, &options);
    if resolved.is_empty() {
        return Err(ConfError::InvalidSpec(format!(
            "field '{name}' has neither a name nor an env key"
        )));
    }
    Ok(Field {
        name,
        prefix: prefix.to_string(),
        key: resolved,
        path: key::build_path(path, name),
        options,
        target,
    })
}

/// Prefix and path seen by the members of a nested composite.
fn nested_scope(prefix: &str, path: &str, name: &str, options: &Options) -> (String, String) {
    let contribution = key::build_key(prefix, name, options);
    let inner_prefix = if contribution == EXCLUDE {
        prefix.to_string()
    } else {
        contribution
    };
    (inner_prefix, key::build_path(path, name))
}

//! Per-field annotation grammar.
//!
//! An annotation is a comma-separated list of bare flags (`required`,
//! `ignore`, `no-prefix`, `no-print`, `mask`) and `key:value` pairs (`env`, `default`,
//! `pstore`, `cli`, `cli-short`, `cli-usage`). Surrounding whitespace is
//! trimmed from every token and value.
//!
//! Defaults may use a bracketed micro-syntax for composite values, normalized
//! into the canonical comma form understood by the decoder:
//!
//! - `list(a;b;c)` is stored as `a,b,c`
//! - `map(k1|v1;k2|v2)` is stored as `k1:v1,k2:v2`

use serde::Serialize;

use crate::error::AnnotationError;

/// Sentinel value. As a whole annotation it excludes the field from
/// discovery; as an `env` value it excludes the field from keyed lookups.
pub const EXCLUDE: &str = "-";

/// Normalized per-field directives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Options {
    /// Explicit key override (`env:`).
    pub env: Option<String>,
    /// Normalized default raw value (`default:`).
    pub default: Option<String>,
    pub required: bool,
    /// Set by the `ignore` flag or by the exclude sentinel as the whole
    /// annotation.
    pub ignore: bool,
    pub mask: bool,
    pub no_print: bool,
    pub no_prefix: bool,
    /// Explicit parameter-store path (`pstore:`).
    pub pstore: Option<String>,
    pub cli: Option<String>,
    pub cli_short: Option<char>,
    pub cli_usage: Option<String>,
}

impl Options {
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn is_cli(&self) -> bool {
        self.cli.is_some()
    }
}

/// Parse a raw annotation string into [`Options`].
pub fn parse_annotation(raw: &str) -> Result<Options, AnnotationError> {
    let mut opts = Options::default();

    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(opts);
    }
    if raw == EXCLUDE {
        opts.ignore = true;
        return Ok(opts);
    }

    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let Some((key, value)) = token.split_once(':') else {
            match token {
                "required" => opts.required = true,
                "ignore" => opts.ignore = true,
                "no-prefix" => opts.no_prefix = true,
                "no-print" => opts.no_print = true,
                "mask" => opts.mask = true,
                other => return Err(AnnotationError::UnknownTag(other.to_string())),
            }
            continue;
        };

        let key = key.trim();
        let value = value.trim();
        if value.is_empty() {
            return Err(AnnotationError::MissingValue(key.to_string()));
        }

        match key {
            "env" => opts.env = Some(value.to_string()),
            "default" => opts.default = Some(normalize_default(value)?),
            "pstore" => opts.pstore = Some(value.to_string()),
            "cli" => opts.cli = Some(value.to_string()),
            "cli-short" | "cli-s" => {
                let mut chars = value.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => opts.cli_short = Some(c),
                    _ => return Err(AnnotationError::InvalidShort(value.to_string())),
                }
            }
            "cli-usage" | "cli-u" => opts.cli_usage = Some(value.to_string()),
            other => return Err(AnnotationError::UnknownTag(other.to_string())),
        }
    }

    Ok(opts)
}

/// Rewrite `list(...)` / `map(...)` defaults into canonical comma form.
/// Anything else is returned as written.
fn normalize_default(value: &str) -> Result<String, AnnotationError> {
    let inner = match value
        .strip_prefix("list(")
        .or_else(|| value.strip_prefix("map("))
    {
        Some(inner) => inner,
        None => return Ok(value.to_string()),
    };

    let inner = inner
        .strip_suffix(')')
        .ok_or_else(|| AnnotationError::InvalidDefault(value.to_string()))?;

    Ok(inner.replace('|', ":").replace(';', ","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_zero_value() {
        assert_eq!(parse_annotation("").unwrap(), Options::default());
        assert_eq!(parse_annotation("   ").unwrap(), Options::default());
    }

    #[test]
    fn env_only() {
        let opts = parse_annotation("env:FOO_BAR").unwrap();
        assert_eq!(opts.env.as_deref(), Some("FOO_BAR"));
        assert!(!opts.required);
        assert!(!opts.has_default());
    }

    #[test]
    fn env_and_required() {
        let opts = parse_annotation("env:FOO_BAR,required").unwrap();
        assert_eq!(opts.env.as_deref(), Some("FOO_BAR"));
        assert!(opts.required);
    }

    #[test]
    fn every_bare_flag() {
        let opts = parse_annotation("mask,no-print,no-prefix,required").unwrap();
        assert!(opts.mask);
        assert!(opts.no_print);
        assert!(opts.no_prefix);
        assert!(opts.required);
    }

    #[test]
    fn all_settings() {
        let opts = parse_annotation(
            "env:FOO_BAR,pstore:xy/z/key,default:XYZ,no-print,mask,no-prefix,required,cli:foo,cli-short:f,cli-usage:some usage",
        )
        .unwrap();
        assert_eq!(
            opts,
            Options {
                env: Some("FOO_BAR".into()),
                default: Some("XYZ".into()),
                required: true,
                ignore: false,
                mask: true,
                no_print: true,
                no_prefix: true,
                pstore: Some("xy/z/key".into()),
                cli: Some("foo".into()),
                cli_short: Some('f'),
                cli_usage: Some("some usage".into()),
            }
        );
    }

    #[test]
    fn short_cli_aliases() {
        let opts = parse_annotation("cli:foo,cli-s:f,cli-u:usage text").unwrap();
        assert_eq!(opts.cli_short, Some('f'));
        assert_eq!(opts.cli_usage.as_deref(), Some("usage text"));
    }

    #[test]
    fn surrounding_whitespace_trimmed() {
        let opts =
            parse_annotation("  env:      FOO_BAR, default:XYZ, no-print,mask, no-prefix,    required")
                .unwrap();
        assert_eq!(opts.env.as_deref(), Some("FOO_BAR"));
        assert_eq!(opts.default.as_deref(), Some("XYZ"));
        assert!(opts.no_print && opts.mask && opts.no_prefix && opts.required);
    }

    #[test]
    fn default_value_keeps_inner_colons() {
        let opts = parse_annotation("default:http://localhost:8080").unwrap();
        assert_eq!(opts.default.as_deref(), Some("http://localhost:8080"));
    }

    #[test]
    fn default_list_normalized() {
        let opts = parse_annotation("env:FOO_BAR,default:list(a;b;c;d)").unwrap();
        assert_eq!(opts.default.as_deref(), Some("a,b,c,d"));
    }

    #[test]
    fn default_map_normalized() {
        let opts = parse_annotation("default:map(k1|v1;k2|v2)").unwrap();
        assert_eq!(opts.default.as_deref(), Some("k1:v1,k2:v2"));
    }

    #[test]
    fn default_map_inner_spaces_preserved() {
        let opts = parse_annotation("default:map(keyA|valueA;   keyB|valueB)").unwrap();
        assert_eq!(opts.default.as_deref(), Some("keyA:valueA,   keyB:valueB"));
    }

    #[test]
    fn unterminated_list_fails() {
        let err = parse_annotation("default:list(a;b").unwrap_err();
        assert!(matches!(err, AnnotationError::InvalidDefault(_)));
    }

    #[test]
    fn default_without_value_fails() {
        let err = parse_annotation("env:FOO_BAR,default:,required").unwrap_err();
        assert_eq!(err, AnnotationError::MissingValue("default".into()));
        assert!(err.to_string().contains("\"default\""));
    }

    #[test]
    fn env_without_value_fails() {
        let err = parse_annotation("env:  ,default:SomeValue").unwrap_err();
        assert_eq!(err, AnnotationError::MissingValue("env".into()));
    }

    #[test]
    fn unknown_tag_fails() {
        let err = parse_annotation("env:X,optional").unwrap_err();
        assert_eq!(err, AnnotationError::UnknownTag("optional".into()));
    }

    #[test]
    fn long_short_flag_fails() {
        let err = parse_annotation("cli:verbose,cli-short:vv").unwrap_err();
        assert!(matches!(err, AnnotationError::InvalidShort(_)));
    }

    #[test]
    fn exclude_sentinel_marks_ignore() {
        let opts = parse_annotation("-").unwrap();
        assert!(opts.ignore);
    }

    #[test]
    fn ignore_flag_marks_ignore() {
        let opts = parse_annotation("ignore").unwrap();
        assert!(opts.ignore);
        let opts = parse_annotation("env:X, ignore").unwrap();
        assert!(opts.ignore);
        assert_eq!(opts.env.as_deref(), Some("X"));
    }

    #[test]
    fn env_exclude_is_a_plain_value() {
        let opts = parse_annotation("env:-,default:x").unwrap();
        assert_eq!(opts.env.as_deref(), Some(EXCLUDE));
        assert!(!opts.ignore);
    }
}

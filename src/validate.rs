//! Strict-mode validation: detect keys in a config file that no discovered
//! field claims.
//!
//! A file key is known when it equals a field's dotted path or lies beneath
//! one (entries of a mapping-typed field). Tables are only descended into when
//! some field path continues below them.

use std::path::Path;

use toml::{Table, Value};

use crate::error::ConfError;

/// One [`ConfError::UnknownKey`] per unclaimed key in `table`.
pub fn unknown_keys(table: &Table, content: &str, path: &Path, known: &[&str]) -> Vec<ConfError> {
    let mut unknown = Vec::new();
    collect(table, "", known, &mut unknown);
    unknown
        .into_iter()
        .map(|key| {
            let line = find_key_line(content, &key);
            ConfError::UnknownKey {
                key,
                path: path.to_path_buf(),
                line,
            }
        })
        .collect()
}

fn collect(table: &Table, parent: &str, known: &[&str], out: &mut Vec<String>) {
    for (key, value) in table {
        let dotted = if parent.is_empty() {
            key.clone()
        } else {
            format!("{parent}.{key}")
        };

        if known.contains(&dotted.as_str()) {
            continue;
        }

        let below = format!("{dotted}.");
        match value {
            Value::Table(inner) if known.iter().any(|k| k.starts_with(&below)) => {
                collect(inner, &dotted, known, out)
            }
            _ => out.push(dotted),
        }
    }
}

/// Find the 1-indexed line of a dotted key, tracking `[section]` headers.
///
/// Best effort: quoted keys and inline tables are not understood. Returns 0
/// when the key cannot be located.
fn find_key_line(content: &str, dotted_key: &str) -> usize {
    let (section, leaf) = match dotted_key.rsplit_once('.') {
        Some((section, leaf)) => (section.split('.').collect::<Vec<_>>(), leaf),
        None => (Vec::new(), dotted_key),
    };

    let mut current: Vec<String> = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.starts_with('[') && !trimmed.starts_with("[[") {
            let header = trimmed.trim_start_matches('[').trim_end_matches(']');
            current = header.split('.').map(|s| s.trim().to_string()).collect();
            continue;
        }

        let in_section = section.len() == current.len()
            && section.iter().zip(&current).all(|(a, b)| a == b);
        if in_section
            && let Some(rest) = trimmed.strip_prefix(leaf)
            && rest.trim_start().starts_with('=')
        {
            return i + 1;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const KNOWN: &[&str] = &["debug", "port", "nested.nest_value", "map_field"];

    fn check(content: &str) -> Vec<ConfError> {
        let table: Table = content.parse().unwrap();
        unknown_keys(&table, content, &PathBuf::from("/test/app.toml"), KNOWN)
    }

    fn unknown_names(content: &str) -> Vec<String> {
        check(content)
            .into_iter()
            .map(|e| match e {
                ConfError::UnknownKey { key, .. } => key,
                other => panic!("Expected UnknownKey, got {other:?}"),
            })
            .collect()
    }

    #[test]
    fn known_keys_pass() {
        let content = r#"
debug = true
port = 3000

[nested]
nest_value = "x"
"#;
        assert!(check(content).is_empty());
    }

    #[test]
    fn mapping_entries_are_known() {
        let content = "[map_field]\nanything = \"goes\"\nelse = 1\n";
        assert!(check(content).is_empty());
    }

    #[test]
    fn unknown_top_level_key() {
        assert_eq!(unknown_names("debug = true\ntypo_key = 1\n"), vec!["typo_key"]);
    }

    #[test]
    fn unknown_nested_key() {
        let content = "[nested]\nnest_value = \"x\"\nnest_typo = 2\n";
        assert_eq!(unknown_names(content), vec!["nested.nest_typo"]);
    }

    #[test]
    fn unknown_section_reported_once() {
        let content = "[stale]\na = 1\nb = 2\n";
        assert_eq!(unknown_names(content), vec!["stale"]);
    }

    #[test]
    fn line_numbers_reported() {
        let content = "debug = true\n\n[nested]\nnest_value = \"x\"\nbad = 1\n";
        match &check(content)[0] {
            ConfError::UnknownKey { line, path, .. } => {
                assert_eq!(*line, 5);
                assert_eq!(path, &PathBuf::from("/test/app.toml"));
            }
            other => panic!("Expected UnknownKey, got {other:?}"),
        }
    }

    #[test]
    fn line_lookup_respects_sections() {
        let content = "bad = 1\n[nested]\nbad = 2\n";
        assert_eq!(find_key_line(content, "bad"), 1);
        assert_eq!(find_key_line(content, "nested.bad"), 3);
        assert_eq!(find_key_line(content, "missing"), 0);
    }
}

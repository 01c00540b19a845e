//! Lookup key derivation.
//!
//! Declared names are split into camel-case segments, joined with `_` and
//! upper-cased. Ancestor prefixes are prepended unless the field opts out
//! with `no-prefix`.

use crate::annotation::{EXCLUDE, Options};

/// Split a declared name into word segments.
///
/// `_` separates segments and empty segments are dropped. Within a segment a
/// lowercase→uppercase transition starts a new word, and a run of capitals
/// followed by a lowercase letter hands its last capital to the next word:
/// `FOOBar` → `FOO`, `Bar`. Digits stay with the word they follow.
pub fn camel_split(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    for part in name.split('_').filter(|p| !p.is_empty()) {
        split_word(part, &mut words);
    }
    words
}

fn split_word(part: &str, words: &mut Vec<String>) {
    let chars: Vec<char> = part.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let start = i;
        if chars[i].is_ascii_uppercase() {
            while i < chars.len() && chars[i].is_ascii_uppercase() {
                i += 1;
            }
            let upper_end = i;
            while i < chars.len() && !chars[i].is_ascii_uppercase() {
                i += 1;
            }
            // Acronym followed by a capitalized word.
            if i > upper_end && upper_end - start > 1 && chars[upper_end].is_ascii_lowercase() {
                words.push(chars[start..upper_end - 1].iter().collect());
                words.push(chars[upper_end - 1..i].iter().collect());
                continue;
            }
        } else {
            while i < chars.len() && !chars[i].is_ascii_uppercase() {
                i += 1;
            }
        }
        words.push(chars[start..i].iter().collect());
    }
}

/// Camel-split, underscore-join and upper-case a name: `NestValue` → `NEST_VALUE`.
pub fn segment(name: &str) -> String {
    camel_split(name).join("_").to_uppercase()
}

/// Normalize a caller-supplied root prefix.
pub fn root_prefix(prefix: &str) -> String {
    segment(prefix)
}

/// Resolve the lookup key for a member named `name` under `prefix`.
///
/// An `env` override replaces the derived name but is still prefixed unless
/// `no-prefix` is set. The exclude sentinel is returned verbatim.
pub fn build_key(prefix: &str, name: &str, opts: &Options) -> String {
    let own = match opts.env.as_deref() {
        Some(EXCLUDE) => return EXCLUDE.to_string(),
        Some(explicit) => explicit.to_string(),
        None => segment(name),
    };

    if opts.no_prefix || prefix.is_empty() {
        own
    } else {
        format!("{prefix}_{own}")
    }
}

/// Dotted structural key used by the file layer: `nested.nest_value`.
pub fn build_path(parent: &str, name: &str) -> String {
    let own = segment(name).to_lowercase();
    if parent.is_empty() {
        own
    } else {
        format!("{parent}.{own}")
    }
}

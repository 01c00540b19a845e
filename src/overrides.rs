//! Explicit caller-supplied values.
//!
//! Entries name a field either by its resolved key (`APP_HTTP_PORT`) or by its
//! dotted path (`port`, `nested.nest_value`). When both are present the
//! resolved key wins. If the same name is inserted twice, the last one wins.

use std::collections::HashMap;

use crate::annotation::EXCLUDE;
use crate::error::ConfError;
use crate::field::Field;
use crate::source::Source;

#[derive(Debug, Clone, Default)]
pub struct MapSource {
    name: String,
    entries: HashMap<String, String>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::named("overrides")
    }

    /// An empty map reported under `name` in logs.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Chained form of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = MapSource::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Source for MapSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup(&self, field: &Field<'_>) -> Result<Option<String>, ConfError> {
        let by_key = (field.key != EXCLUDE)
            .then(|| self.entries.get(&field.key))
            .flatten();
        Ok(by_key.or_else(|| self.entries.get(&field.path)).cloned())
    }
}

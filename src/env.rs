use std::collections::HashMap;

use tracing::warn;

use crate::error::ConfError;
use crate::field::Field;
use crate::source::Source;

/// Keyed backend over environment variables.
///
/// Built either from the process environment or from injected pairs, so tests
/// never have to mutate global state. Fields whose key is the exclude sentinel
/// are never looked up.
#[derive(Debug, Clone, Default)]
pub struct Env {
    vars: HashMap<String, String>,
}

impl Env {
    /// Snapshot the process environment. Variables that are not valid UTF-8
    /// are skipped.
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => Some((key, value)),
                (Ok(key), Err(_)) => {
                    warn!(%key, "skipping environment variable with non UTF-8 value");
                    None
                }
                _ => None,
            })
            .collect();
        Self { vars }
    }

    pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

impl Source for Env {
    fn name(&self) -> &str {
        "env"
    }

    fn lookup(&self, field: &Field<'_>) -> Result<Option<String>, ConfError> {
        if field.is_keyless() {
            return Ok(None);
        }
        Ok(self.get(&field.key).map(str::to_string))
    }
}

/// Read a process variable that must be set. An empty value is accepted.
pub fn env_var(name: &str) -> Result<String, ConfError> {
    std::env::var(name).map_err(|_| ConfError::EnvVarNotSet(name.to_string()))
}

/// Read a process variable that must be set and non-empty.
pub fn env_var_strict(name: &str) -> Result<String, ConfError> {
    let value = env_var(name)?;
    if value.is_empty() {
        return Err(ConfError::EnvVarEmpty(name.to_string()));
    }
    Ok(value)
}

/// Read a process variable, treating unset and empty alike.
pub fn env_var_optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::fields;
    use crate::fixtures::test::Spec;

    fn env(pairs: &[(&str, &str)]) -> Env {
        Env::from_vars(pairs.iter().copied())
    }

    #[test]
    fn lookup_by_resolved_key() {
        let mut spec = Spec::default();
        let found = fields(&mut spec, Some("APP")).unwrap();
        let source = env(&[("APP_HTTP_PORT", "3000")]);
        let port = found.iter().find(|f| f.name == "port").unwrap();
        assert_eq!(source.lookup(port).unwrap().as_deref(), Some("3000"));
    }

    #[test]
    fn missing_key_is_none() {
        let mut spec = Spec::default();
        let found = fields(&mut spec, Some("APP")).unwrap();
        let source = env(&[("OTHER", "x")]);
        assert!(found.iter().all(|f| source.lookup(f).unwrap().is_none()));
    }

    #[test]
    fn empty_value_is_still_an_entry() {
        let mut spec = Spec::default();
        let found = fields(&mut spec, Some("APP")).unwrap();
        let source = env(&[("APP_DEBUG", "")]);
        let debug = found.iter().find(|f| f.name == "debug").unwrap();
        assert_eq!(source.lookup(debug).unwrap().as_deref(), Some(""));
    }

    #[test]
    fn keyless_field_never_looked_up() {
        let mut spec = Spec::default();
        let found = fields(&mut spec, None).unwrap();
        let source = env(&[("-", "leak"), ("NO_ENV", "leak")]);
        let no_env = found.iter().find(|f| f.name == "no_env").unwrap();
        assert!(source.lookup(no_env).unwrap().is_none());
    }

    #[test]
    fn process_snapshot_sees_path() {
        // PATH is set in every test environment we run under.
        let source = Env::from_process();
        assert!(source.get("PATH").is_some());
    }

    #[test]
    fn env_var_unset_is_error() {
        let err = env_var("TAGCONF_TEST_SURELY_UNSET_VARIABLE").unwrap_err();
        assert!(matches!(err, ConfError::EnvVarNotSet(_)));
        assert!(env_var_strict("TAGCONF_TEST_SURELY_UNSET_VARIABLE").is_err());
        assert!(env_var_optional("TAGCONF_TEST_SURELY_UNSET_VARIABLE").is_none());
    }

    #[test]
    fn env_var_reads_set_value() {
        assert!(!env_var("PATH").unwrap().is_empty());
        assert!(env_var_strict("PATH").is_ok());
        assert!(env_var_optional("PATH").is_some());
    }
}

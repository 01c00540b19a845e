//! TOML file layer.
//!
//! Each [`SearchPath`] resolves to one or more directories, listed
//! priority-ascending. Every directory is checked for `{dir}/{file_name}`;
//! missing files are silently skipped and any other I/O error is reported as
//! a [`ConfError::BackendFailure`]. Under [`SearchMode::Merge`] the files
//! found are deep-merged, later files overriding earlier ones key-by-key.
//! Under [`SearchMode::FirstMatch`] only the highest-priority file is used.
//!
//! Lookups use the field's dotted path (`nested.nest_value`). Values reach the
//! decoder as canonical strings: arrays become `a,b,c` and tables become
//! `k1:v1,k2:v2` with keys sorted, which is the same syntax the decoder
//! accepts for sequences and mappings.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use toml::{Table, Value};
use tracing::debug;

use crate::error::ConfError;
use crate::field::Field;
use crate::source::Source;
use crate::types::{Boundary, SearchMode, SearchPath};
use crate::validate;

/// Resolve a single-directory [`SearchPath`].
///
/// Returns `None` when the directory cannot be determined (no home directory)
/// and for [`SearchPath::Ancestors`], which expands to many directories.
pub fn resolve_search_path(sp: &SearchPath, app_name: &str) -> Option<PathBuf> {
    match sp {
        SearchPath::Platform => {
            let proj = directories::ProjectDirs::from("", "", app_name)?;
            Some(proj.config_dir().to_path_buf())
        }
        SearchPath::Home(subdir) => {
            let user = directories::UserDirs::new()?;
            Some(user.home_dir().join(subdir))
        }
        SearchPath::Cwd => std::env::current_dir().ok(),
        SearchPath::Path(p) => Some(p.clone()),
        SearchPath::Ancestors(_) => None,
    }
}

/// Directories from `start` up to the boundary, shallowest first.
pub fn expand_ancestors(start: &Path, boundary: &Boundary) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    for dir in start.ancestors() {
        dirs.push(dir.to_path_buf());
        if let Boundary::Marker(name) = boundary
            && dir.join(name).exists()
        {
            break;
        }
    }
    dirs.reverse();
    dirs
}

/// Expand search paths into concrete directories, priority-ascending.
///
/// `Ancestors` walks up from `start`, or from the working directory when
/// `start` is `None`.
pub fn expand_search_paths(
    search_paths: &[SearchPath],
    app_name: &str,
    start: Option<&Path>,
) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    for sp in search_paths {
        match sp {
            SearchPath::Ancestors(boundary) => {
                let from = match start {
                    Some(dir) => Some(dir.to_path_buf()),
                    None => std::env::current_dir().ok(),
                };
                if let Some(from) = from {
                    dirs.extend(expand_ancestors(&from, boundary));
                }
            }
            other => dirs.extend(resolve_search_path(other, app_name)),
        }
    }
    dirs
}

/// Read `{dir}/{file_name}` from each directory according to `mode`.
pub fn read_files(
    dirs: &[PathBuf],
    file_name: &str,
    mode: SearchMode,
) -> Result<Vec<(PathBuf, String)>, ConfError> {
    let mut found = Vec::new();
    let ordered: Box<dyn Iterator<Item = &PathBuf>> = match mode {
        SearchMode::Merge => Box::new(dirs.iter()),
        SearchMode::FirstMatch => Box::new(dirs.iter().rev()),
    };

    for dir in ordered {
        let path = dir.join(file_name);
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                debug!(path = %path.display(), "loaded config file");
                found.push((path, content));
                if mode == SearchMode::FirstMatch {
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(ConfError::backend("file", path.display().to_string(), e)),
        }
    }
    Ok(found)
}

/// Overlay `overlay` onto `base`. Tables present on both sides are merged
/// recursively; any other overlay value replaces the base value.
pub fn deep_merge(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        if let Value::Table(incoming) = value {
            if let Some(Value::Table(existing)) = base.get_mut(&key) {
                deep_merge(existing, incoming);
                continue;
            }
            base.insert(key, Value::Table(incoming));
        } else {
            base.insert(key, value);
        }
    }
}

/// Navigate a table by dotted path.
pub fn table_get<'a>(table: &'a Table, dotted: &str) -> Option<&'a Value> {
    let mut segments = dotted.split('.');
    let mut current = table.get(segments.next()?)?;
    for segment in segments {
        current = current.as_table()?.get(segment)?;
    }
    Some(current)
}

/// Reduce a TOML value to the decoder's canonical text form.
pub fn canonical(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Datetime(dt) => dt.to_string(),
        Value::Array(items) => items.iter().map(canonical).collect::<Vec<_>>().join(","),
        Value::Table(table) => {
            let mut pairs: Vec<_> = table
                .iter()
                .map(|(k, v)| format!("{k}:{}", canonical(v)))
                .collect();
            pairs.sort();
            pairs.join(",")
        }
    }
}

#[derive(Debug, Clone)]
struct LoadedFile {
    path: PathBuf,
    content: String,
    table: Table,
}

/// Merged view of every config file found.
#[derive(Debug, Clone, Default)]
pub struct FileLayer {
    files: Vec<LoadedFile>,
    merged: Table,
}

impl FileLayer {
    /// Discover, read and merge config files.
    pub fn load(
        search_paths: &[SearchPath],
        file_name: &str,
        app_name: &str,
        mode: SearchMode,
    ) -> Result<Self, ConfError> {
        let dirs = expand_search_paths(search_paths, app_name, None);
        debug!(dirs = dirs.len(), file_name, "searching for config files");
        Self::from_files(read_files(&dirs, file_name, mode)?)
    }

    /// Parse and merge already-read files, lowest priority first.
    pub fn from_files(files: Vec<(PathBuf, String)>) -> Result<Self, ConfError> {
        let mut layer = FileLayer::default();
        for (path, content) in files {
            let table: Table = content
                .parse()
                .map_err(|e| ConfError::backend("toml", path.display().to_string(), e))?;
            deep_merge(&mut layer.merged, table.clone());
            layer.files.push(LoadedFile {
                path,
                content,
                table,
            });
        }
        Ok(layer)
    }

    /// Paths of the files that contributed, lowest priority first.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|f| f.path.as_path())
    }

    pub fn is_empty(&self) -> bool {
        self.merged.is_empty()
    }

    pub fn contains(&self, dotted: &str) -> bool {
        table_get(&self.merged, dotted).is_some()
    }

    pub fn get(&self, dotted: &str) -> Option<&Value> {
        table_get(&self.merged, dotted)
    }

    /// Fail with every key, across all files, that matches none of `known`.
    pub fn validate(&self, known: &[&str]) -> Result<(), ConfError> {
        let errors: Vec<ConfError> = self
            .files
            .iter()
            .flat_map(|f| validate::unknown_keys(&f.table, &f.content, &f.path, known))
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfError::UnknownKeys(errors))
        }
    }
}

impl FromStr for FileLayer {
    type Err = ConfError;

    /// A single in-memory document, reported as `<inline>`.
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        Self::from_files(vec![(PathBuf::from("<inline>"), content.to_string())])
    }
}

impl Source for FileLayer {
    fn name(&self) -> &str {
        "file"
    }

    fn lookup(&self, field: &Field<'_>) -> Result<Option<String>, ConfError> {
        Ok(self.get(&field.path).map(canonical))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::fields;
    use crate::fixtures::test::Spec;
    use std::fs;
    use tempfile::TempDir;

    fn table(toml_str: &str) -> Table {
        toml_str.parse::<Table>().unwrap()
    }

    #[test]
    fn resolve_explicit_path() {
        let p = PathBuf::from("/tmp/myapp");
        let resolved = resolve_search_path(&SearchPath::Path(p.clone()), "ignored");
        assert_eq!(resolved, Some(p));
    }

    #[test]
    fn no_files_exist() {
        let dir = TempDir::new().unwrap();
        let layer = FileLayer::load(
            &[SearchPath::Path(dir.path().to_path_buf())],
            "missing.toml",
            "test",
            SearchMode::Merge,
        )
        .unwrap();
        assert!(layer.is_empty());
        assert_eq!(layer.paths().count(), 0);
    }

    #[test]
    fn merge_mode_layers_files() {
        let low = TempDir::new().unwrap();
        let high = TempDir::new().unwrap();
        fs::write(low.path().join("app.toml"), "debug = true\nrate = 0.1\n").unwrap();
        fs::write(high.path().join("app.toml"), "rate = 0.9\n").unwrap();

        let layer = FileLayer::load(
            &[
                SearchPath::Path(low.path().to_path_buf()),
                SearchPath::Path(high.path().to_path_buf()),
            ],
            "app.toml",
            "test",
            SearchMode::Merge,
        )
        .unwrap();
        assert_eq!(layer.get("debug"), Some(&Value::Boolean(true)));
        assert_eq!(layer.get("rate"), Some(&Value::Float(0.9)));
        assert_eq!(layer.paths().count(), 2);
    }

    #[test]
    fn first_match_uses_highest_priority_only() {
        let low = TempDir::new().unwrap();
        let high = TempDir::new().unwrap();
        fs::write(low.path().join("app.toml"), "debug = true\n").unwrap();
        fs::write(high.path().join("app.toml"), "rate = 0.9\n").unwrap();

        let layer = FileLayer::load(
            &[
                SearchPath::Path(low.path().to_path_buf()),
                SearchPath::Path(high.path().to_path_buf()),
            ],
            "app.toml",
            "test",
            SearchMode::FirstMatch,
        )
        .unwrap();
        assert!(!layer.contains("debug"));
        assert!(layer.contains("rate"));
    }

    #[test]
    fn first_match_falls_back_to_lower_priority() {
        let low = TempDir::new().unwrap();
        let high = TempDir::new().unwrap();
        fs::write(low.path().join("app.toml"), "debug = true\n").unwrap();

        let dirs = vec![low.path().to_path_buf(), high.path().to_path_buf()];
        let files = read_files(&dirs, "app.toml", SearchMode::FirstMatch).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].1.contains("debug"));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_is_backend_failure() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.toml");
        fs::write(&path, "port = 1\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can read the file regardless of mode.
        if fs::read_to_string(&path).is_err() {
            let result = read_files(&[dir.path().to_path_buf()], "app.toml", SearchMode::Merge);
            assert!(matches!(result, Err(ConfError::BackendFailure { .. })));
        }

        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
    }

    #[test]
    fn invalid_toml_is_backend_failure() {
        let err = "port = = 1".parse::<FileLayer>().unwrap_err();
        match err {
            ConfError::BackendFailure { backend, context, .. } => {
                assert_eq!(backend, "toml");
                assert_eq!(context, "<inline>");
            }
            other => panic!("Expected BackendFailure, got {other:?}"),
        }
    }

    #[test]
    fn ancestors_stop_at_marker() {
        let dir = TempDir::new().unwrap();
        let deep = dir.path().join("a").join("b").join("c");
        fs::create_dir_all(&deep).unwrap();
        fs::create_dir(dir.path().join("a").join(".git")).unwrap();

        let dirs = expand_ancestors(&deep, &Boundary::Marker(".git"));
        assert_eq!(
            dirs,
            vec![
                dir.path().join("a"),
                dir.path().join("a").join("b"),
                deep.clone(),
            ]
        );
    }

    #[test]
    fn ancestors_without_marker_walk_to_root() {
        let dir = TempDir::new().unwrap();
        let deep = dir.path().join("x");
        fs::create_dir_all(&deep).unwrap();

        let dirs = expand_ancestors(&deep, &Boundary::Marker(".nonexistent"));
        assert!(dirs.contains(&dir.path().to_path_buf()));
        assert_eq!(dirs.last(), Some(&deep));
        assert!(dirs[0].parent().is_none());
    }

    #[test]
    fn search_paths_mix_explicit_and_ancestors() {
        let dir = TempDir::new().unwrap();
        let deep = dir.path().join("a").join("b");
        fs::create_dir_all(&deep).unwrap();
        fs::create_dir(dir.path().join("a").join(".marker")).unwrap();
        let explicit = TempDir::new().unwrap();

        let dirs = expand_search_paths(
            &[
                SearchPath::Path(explicit.path().to_path_buf()),
                SearchPath::Ancestors(Boundary::Marker(".marker")),
            ],
            "test",
            Some(&deep),
        );
        assert_eq!(
            dirs,
            vec![explicit.path().to_path_buf(), dir.path().join("a"), deep]
        );
    }

    #[test]
    fn deep_merge_recurses_into_tables() {
        let mut base = table(
            r#"
            [database]
            url = "postgres://old"
            pool_size = 5
            "#,
        );
        deep_merge(&mut base, table("[database]\npool_size = 20\n"));
        assert_eq!(
            base["database"]["url"].as_str(),
            Some("postgres://old")
        );
        assert_eq!(base["database"]["pool_size"].as_integer(), Some(20));
    }

    #[test]
    fn deep_merge_scalar_replaces_table() {
        let mut base = table("[database]\nurl = \"x\"\n");
        deep_merge(&mut base, table("database = \"flat\"\n"));
        assert_eq!(base["database"].as_str(), Some("flat"));
    }

    #[test]
    fn table_get_walks_dotted_path() {
        let t = table("[a.b]\nc = 1\n");
        assert_eq!(table_get(&t, "a.b.c"), Some(&Value::Integer(1)));
        assert!(table_get(&t, "a.x").is_none());
        assert!(table_get(&t, "a.b.c.d").is_none());
    }

    #[test]
    fn canonical_forms() {
        let t = table(
            r#"
            s = "text"
            i = 42
            f = 1.5
            b = false
            list = [3, 5, 10, 20]
            map = { zeta = "z", alpha = 1 }
            "#,
        );
        assert_eq!(canonical(&t["s"]), "text");
        assert_eq!(canonical(&t["i"]), "42");
        assert_eq!(canonical(&t["f"]), "1.5");
        assert_eq!(canonical(&t["b"]), "false");
        assert_eq!(canonical(&t["list"]), "3,5,10,20");
        assert_eq!(canonical(&t["map"]), "alpha:1,zeta:z");
    }

    #[test]
    fn lookup_by_dotted_path() {
        let layer: FileLayer = r#"
            ratios = [0.25, 0.75]

            [nested]
            nest_value = "from file"

            [map_field]
            k = "v"
        "#
        .parse()
        .unwrap();

        let mut spec = Spec::default();
        let found = fields(&mut spec, Some("APP")).unwrap();
        let value = |name: &str| {
            let field = found.iter().find(|f| f.name == name).unwrap();
            layer.lookup(field).unwrap()
        };
        assert_eq!(value("nest_value").as_deref(), Some("from file"));
        assert_eq!(value("ratios").as_deref(), Some("0.25,0.75"));
        assert_eq!(value("map_field").as_deref(), Some("k:v"));
        assert_eq!(value("debug"), None);
    }

    #[test]
    fn validate_reports_unknown_keys() {
        let layer: FileLayer = "debug = true\ntypo = 1\n".parse().unwrap();
        let err = layer.validate(&["debug"]).unwrap_err();
        match err {
            ConfError::UnknownKeys(errors) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].to_string().contains("typo"));
                assert!(errors[0].to_string().contains("line 2"));
            }
            other => panic!("Expected UnknownKeys, got {other:?}"),
        }
    }
}

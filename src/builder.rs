use tracing::debug;

#[cfg(feature = "clap")]
use crate::cli::Cli;
use crate::env::Env;
use crate::error::ConfError;
use crate::field::{self, Field};
use crate::file::FileLayer;
use crate::ops::{self, Report};
use crate::overrides::MapSource;
use crate::pstore::{self, ParamStore};
use crate::resolve::{self, Mode};
use crate::settings::Settings;
use crate::source::Source;
use crate::types::{SearchMode, SearchPath};

use std::collections::BTreeMap;

/// A configured resolution pipeline.
///
/// Sources are consulted highest priority first:
///
/// ```text
/// overrides  >  cli flags  >  environment  >  config files  >  extra sources
/// ```
///
/// followed by each field's annotated default.
pub struct Conf<'s> {
    prefix: Option<String>,
    app_title: Option<String>,
    overrides: MapSource,
    #[cfg(feature = "clap")]
    cli: Option<Cli<'s>>,
    env: Option<Env>,
    files: Option<FileLayer>,
    extra: Vec<Box<dyn Source + 's>>,
    mode: Mode,
    skip_defaults: bool,
    strict: bool,
}

impl<'s> Conf<'s> {
    pub fn builder() -> ConfBuilder<'s> {
        ConfBuilder::new()
    }

    fn chain(&self) -> Vec<&dyn Source> {
        let mut chain: Vec<&dyn Source> = Vec::new();
        if !self.overrides.is_empty() {
            chain.push(&self.overrides);
        }
        #[cfg(feature = "clap")]
        if let Some(cli) = &self.cli {
            chain.push(cli);
        }
        if let Some(env) = &self.env {
            chain.push(env);
        }
        if let Some(files) = &self.files {
            chain.push(files);
        }
        chain.extend(self.extra.iter().map(|s| s.as_ref() as &dyn Source));
        chain
    }

    fn app_title(&self) -> &str {
        self.app_title.as_deref().unwrap_or_default()
    }

    /// The merged config files, if any were loaded.
    pub fn file_layer(&self) -> Option<&FileLayer> {
        self.files.as_ref()
    }

    /// Discover the fields of `spec` under the configured prefix.
    pub fn fields<'a, S: Settings>(&self, spec: &'a mut S) -> Result<Vec<Field<'a>>, ConfError> {
        field::fields(spec, self.prefix.as_deref())
    }

    /// Resolve every field of `spec` and decode it in place.
    ///
    /// In strict mode, keys in the loaded config files that match no field
    /// fail the load before anything is decoded.
    pub fn load<S: Settings>(&self, spec: &mut S) -> Result<(), ConfError> {
        let mut found = self.fields(spec)?;

        if self.strict
            && let Some(files) = &self.files
        {
            let known: Vec<&str> = found.iter().map(|f| f.path.as_str()).collect();
            files.validate(&known)?;
        }

        let chain = self.chain();
        debug!(
            fields = found.len(),
            sources = chain.len(),
            mode = ?self.mode,
            "resolving configuration"
        );
        resolve::process(&mut found, &chain, self.mode)
    }

    pub fn env_names<S: Settings>(&self, spec: &mut S) -> Result<Vec<String>, ConfError> {
        Ok(ops::env_names(&self.fields(spec)?))
    }

    pub fn env_names_no_defaults<S: Settings>(
        &self,
        spec: &mut S,
    ) -> Result<Vec<String>, ConfError> {
        Ok(ops::env_names_no_defaults(&self.fields(spec)?))
    }

    pub fn env_to_map<S: Settings>(
        &self,
        spec: &mut S,
    ) -> Result<BTreeMap<String, String>, ConfError> {
        ops::env_to_map(&self.fields(spec)?, &self.chain())
    }

    pub fn report<S: Settings>(&self, spec: &mut S) -> Result<Report, ConfError> {
        ops::report(&self.fields(spec)?, &self.chain())
    }

    pub fn param_names<S: Settings>(&self, spec: &mut S) -> Result<Vec<String>, ConfError> {
        pstore::param_names(&self.fields(spec)?, self.app_title(), self.skip_defaults)
    }

    pub fn collect_params_from_env<S: Settings>(
        &self,
        spec: &mut S,
    ) -> Result<BTreeMap<String, String>, ConfError> {
        pstore::collect_params_from_env(
            &self.fields(spec)?,
            &self.chain(),
            self.app_title(),
            self.skip_defaults,
        )
    }

    pub fn collect_params<S: Settings>(
        &self,
        spec: &mut S,
        store: &dyn ParamStore,
    ) -> Result<BTreeMap<String, String>, ConfError> {
        pstore::collect_params(
            &self.fields(spec)?,
            store,
            self.app_title(),
            self.skip_defaults,
        )
    }
}

/// Builder for a [`Conf`].
///
/// The process environment is read by default; replace it with
/// [`env()`](Self::env) or drop it with [`no_env()`](Self::no_env). Config
/// files are only searched once [`search_paths()`](Self::search_paths) is set.
pub struct ConfBuilder<'s> {
    prefix: Option<String>,
    app_title: Option<String>,
    file_name: Option<String>,
    search_paths: Option<Vec<SearchPath>>,
    search_mode: SearchMode,
    file_layer: Option<FileLayer>,
    env: Option<Env>,
    env_enabled: bool,
    overrides: MapSource,
    #[cfg(feature = "clap")]
    cli: Option<Cli<'s>>,
    extra: Vec<Box<dyn Source + 's>>,
    mode: Mode,
    skip_defaults: bool,
    strict: bool,
}

impl<'s> ConfBuilder<'s> {
    fn new() -> Self {
        Self {
            prefix: None,
            app_title: None,
            file_name: None,
            search_paths: None,
            search_mode: SearchMode::default(),
            file_layer: None,
            env: None,
            env_enabled: true,
            overrides: MapSource::new(),
            #[cfg(feature = "clap")]
            cli: None,
            extra: Vec::new(),
            mode: Mode::default(),
            skip_defaults: false,
            strict: true,
        }
    }

    /// Root key prefix, e.g. `"MyApp"` → `MY_APP_PORT`.
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    /// Application title. Names the platform config directory, the default
    /// config file (`{title}.toml`) and the parameter-store directory.
    pub fn app_title(mut self, title: &str) -> Self {
        self.app_title = Some(title.to_string());
        self
    }

    /// Override the config file name (default: `"{app_title}.toml"`).
    pub fn file_name(mut self, name: &str) -> Self {
        self.file_name = Some(name.to_string());
        self
    }

    /// Search for config files in these directories, priority-ascending.
    pub fn search_paths(mut self, paths: Vec<SearchPath>) -> Self {
        self.search_paths = Some(paths);
        self
    }

    /// Append a search path. Starts from `[Platform]` if none were set.
    pub fn add_search_path(mut self, path: SearchPath) -> Self {
        self.search_paths
            .get_or_insert_with(|| vec![SearchPath::Platform])
            .push(path);
        self
    }

    /// Set the search mode (default: [`SearchMode::Merge`]).
    pub fn search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = mode;
        self
    }

    /// Use an already-loaded file layer instead of searching.
    pub fn files(mut self, layer: FileLayer) -> Self {
        self.file_layer = Some(layer);
        self
    }

    /// Replace the process environment with `env`.
    pub fn env(mut self, env: Env) -> Self {
        self.env = Some(env);
        self.env_enabled = true;
        self
    }

    /// Disable the environment backend entirely.
    pub fn no_env(mut self) -> Self {
        self.env = None;
        self.env_enabled = false;
        self
    }

    /// Add an explicit value, addressed by resolved key or dotted path.
    /// `None` is ignored, which suits optional parsed arguments.
    pub fn override_value<V: ToString>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.overrides.insert(key, v.to_string());
        }
        self
    }

    /// Add every entry of `overrides`. Later entries win.
    pub fn overrides(mut self, overrides: impl IntoIterator<Item = (String, String)>) -> Self {
        for (key, value) in overrides {
            self.overrides.insert(key, value);
        }
        self
    }

    /// Read explicitly given command-line flags.
    #[cfg(feature = "clap")]
    pub fn cli(mut self, cli: Cli<'s>) -> Self {
        self.cli = Some(cli);
        self
    }

    /// Append a custom source below the built-in ones.
    pub fn source(mut self, source: impl Source + 's) -> Self {
        self.extra.push(Box::new(source));
        self
    }

    /// Set the failure mode (default: [`Mode::FailFast`]).
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Leave defaulted fields out of parameter-store operations.
    pub fn skip_defaults(mut self, skip: bool) -> Self {
        self.skip_defaults = skip;
        self
    }

    /// Enable or disable strict mode (default: `true`).
    /// In strict mode, unknown keys in config files produce errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn effective_file_name(&self) -> Result<String, ConfError> {
        if let Some(name) = &self.file_name {
            return Ok(name.clone());
        }
        match self.app_title.as_deref() {
            Some(title) if !title.is_empty() => Ok(format!("{title}.toml")),
            _ => Err(ConfError::InvalidSpec(
                "searching for config files needs a file name or an app title".into(),
            )),
        }
    }

    fn load_files(&self) -> Result<Option<FileLayer>, ConfError> {
        if let Some(layer) = &self.file_layer {
            return Ok(Some(layer.clone()));
        }
        let Some(paths) = &self.search_paths else {
            return Ok(None);
        };
        let file_name = self.effective_file_name()?;
        let app = self.app_title.as_deref().unwrap_or_default();
        FileLayer::load(paths, &file_name, app, self.search_mode).map(Some)
    }

    /// Load config files and snapshot the environment.
    pub fn build(self) -> Result<Conf<'s>, ConfError> {
        let files = self.load_files()?;
        let env = match (self.env_enabled, self.env) {
            (false, _) => None,
            (true, Some(env)) => Some(env),
            (true, None) => Some(Env::from_process()),
        };

        Ok(Conf {
            prefix: self.prefix,
            app_title: self.app_title,
            overrides: self.overrides,
            #[cfg(feature = "clap")]
            cli: self.cli,
            env,
            files,
            extra: self.extra,
            mode: self.mode,
            skip_defaults: self.skip_defaults,
            strict: self.strict,
        })
    }
}

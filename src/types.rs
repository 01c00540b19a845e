//! File discovery vocabulary.
//!
//! Search paths are listed in **priority-ascending** order: the last entry has
//! the highest priority. [`SearchMode`] decides whether every file found is
//! deep-merged or only the highest-priority one is used.
//!
//! ```ignore
//! // A user-level file, overridden key-by-key by the nearest project file.
//! Conf::builder()
//!     .app_title("myapp")
//!     .search_paths(vec![SearchPath::Platform, SearchPath::Ancestors(Boundary::Marker(".git"))])
//!     .search_mode(SearchMode::Merge)
//!     .build()?
//! ```

use std::path::PathBuf;

/// Where to search for config files.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPath {
    /// Platform config directory (XDG on Linux, ~/Library/Application Support on macOS).
    Platform,
    /// A subdirectory under the user's home directory, e.g. `Home(".myapp")`.
    Home(&'static str),
    /// Current working directory.
    Cwd,
    /// An explicit absolute path.
    Path(PathBuf),
    /// Every directory from the filesystem root (or the [`Boundary`]) down to
    /// the current working directory, shallowest first.
    Ancestors(Boundary),
}

/// How far an [`Ancestors`](SearchPath::Ancestors) walk goes.
#[derive(Debug, Clone, PartialEq)]
pub enum Boundary {
    Root,
    /// Stop (inclusive) at the first directory containing this entry.
    Marker(&'static str),
}

/// What to do when more than one config file is found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// Deep-merge every file; later files override earlier ones key-by-key.
    #[default]
    Merge,
    /// Use only the highest-priority file found.
    FirstMatch,
}

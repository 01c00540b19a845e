//! Tag-driven configuration for Rust applications. Declare a struct, annotate
//! its fields, and resolve them from the environment, config files, CLI flags
//! and programmatic overrides.
//!
//! ```ignore
//! #[derive(Default)]
//! struct Server {
//!     host: String,
//!     port: u16,
//!     timeout: Duration,
//! }
//!
//! tagconf::settings!(Server {
//!     host: leaf = "default:localhost",
//!     port: leaf = "env:HTTP_PORT,default:8080,cli:port",
//!     timeout: leaf = "default:30s",
//! });
//!
//! let mut server = Server::default();
//! Conf::builder().prefix("MyApp").build()?.load(&mut server)?;
//! ```
//!
//! That reads `MY_APP_HOST`, `MY_APP_HTTP_PORT` and `MY_APP_TIMEOUT` from the
//! process environment, falls back to the annotated defaults, and decodes each
//! value into place.
//!
//! # Describing settings
//!
//! A settings struct implements [`Settings`] by listing its members in
//! declaration order. The [`settings!`] macro writes that impl. Each member is
//! one of:
//!
//! - **`leaf`**: a single value, decoded through [`Decode`].
//! - **`nested`**: a sub-struct whose keys extend the parent prefix.
//! - **`embedded`**: a sub-struct whose fields are promoted into the parent.
//! - **`optional`**: an `Option<T>` sub-struct, materialized with
//!   `T::default()` the first time it is walked.
//! - **`private`**: storage the library never touches.
//!
//! A composite type that decodes itself from a single string (through
//! [`Decoder`], [`Setter`], [`UnmarshalText`] or [`UnmarshalBinary`]) is
//! treated as a leaf even when declared `nested`.
//!
//! # Annotations
//!
//! Annotations are comma-separated `tag` or `tag:value` items:
//!
//! | Tag | Meaning |
//! |---|---|
//! | `env:NAME` | Key segment override; `env:-` makes the field keyless |
//! | `default:VALUE` | Fallback when no source has a value |
//! | `required` | Missing everywhere is an error |
//! | `ignore` / `-` | Skip the field entirely |
//! | `no-prefix` | Key is the segment alone |
//! | `mask` | Hide the value in reports and errors |
//! | `no-print` | Leave the field out of reports |
//! | `pstore:PATH` | Parameter-store path, `global`, or `-` to exclude |
//! | `cli:NAME` / `cli-short:C` / `cli-usage:TEXT` | Command-line flag |
//!
//! Unknown tags are rejected with [`ConfError::MalformedAnnotation`].
//!
//! # Keys
//!
//! A field's key is the upper-snake prefix joined with its segment:
//! `MyApp` + `httpServer` → `MY_APP_HTTP_SERVER`. Config files address the same
//! field by its dotted lowercase path, e.g. `http_server` or `db.host`.
//!
//! # Source precedence
//!
//! ```text
//! Annotated default     default:...
//!        ↑ overridden by
//! Extra sources         .source()
//!        ↑ overridden by
//! Config files          search paths in order, later paths win
//!        ↑ overridden by
//! Environment vars      PREFIX_KEY
//!        ↑ overridden by
//! CLI flags             --flag (only when given on the command line)
//!        ↑ overridden by
//! Overrides             .override_value()
//! ```
//!
//! The first source that reports an entry stops the walk. An empty entry is
//! replaced by the field's default when it has one, and is decoded as the
//! empty string otherwise.
//!
//! # Failure modes
//!
//! [`Mode::FailFast`] stops at the first failing field. [`Mode::Aggregate`]
//! processes every field and returns [`ConfError::Multiple`].
//!
//! # Batch operations
//!
//! [`Conf`] also lists keys ([`Conf::env_names`]), produces the effective
//! value map ([`Conf::env_to_map`]), a masked [`Report`], and works with a
//! remote [`ParamStore`] ([`Conf::param_names`], [`Conf::collect_params`]).
//!
//! # Clap integration
//!
//! With the `clap` feature (on by default), [`bind_cli`] registers a flag for
//! every `cli:` field and [`Cli`] reads back explicitly given flags.

pub mod error;
pub mod types;

mod annotation;
mod builder;
#[cfg(feature = "clap")]
mod cli;
mod decode;
mod duration;
mod env;
mod field;
mod file;
mod key;
mod ops;
mod overrides;
mod pstore;
mod resolve;
mod settings;
mod source;
mod validate;

#[cfg(test)]
mod fixtures;

pub use annotation::Options;
pub use builder::{Conf, ConfBuilder};
#[cfg(feature = "clap")]
pub use cli::{Cli, bind_cli};
pub use decode::{Decode, Decoder, Element, Setter, UnmarshalBinary, UnmarshalText};
pub use duration::parse_duration;
pub use env::{Env, env_var, env_var_optional, env_var_strict};
pub use error::ConfError;
pub use field::{Field, fields};
pub use file::FileLayer;
pub use ops::{RESERVED_KEYS, Report};
pub use overrides::MapSource;
pub use pstore::{GLOBAL, ParamStore, pstore_key};
pub use resolve::{Mode, Resolution, apply, process, resolve_value};
pub use settings::{Materialize, Member, Settings, Slot};
pub use source::Source;
pub use types::{Boundary, SearchMode, SearchPath};

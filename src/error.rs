use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by custom decoding capabilities and external backends.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ConfError {
    #[error("Invalid settings: {0}")]
    InvalidSpec(String),

    #[error("Malformed annotation on field '{field}': {source}")]
    MalformedAnnotation {
        field: String,
        source: AnnotationError,
    },

    #[error("Fields failed for embedded struct '{field}': {source}")]
    Embedded {
        field: String,
        source: Box<ConfError>,
    },

    #[error("Required value missing for field '{field}' (key {key})")]
    MissingRequiredValue { field: String, key: String },

    #[error("Failed to decode field '{field}' from '{value}': {source}")]
    DecodeFailure {
        field: String,
        value: String,
        source: DecodeError,
    },

    #[error("{backend} failed for '{context}': {source}")]
    BackendFailure {
        backend: String,
        context: String,
        source: BoxError,
    },

    #[error("Unknown key '{key}' in {path} (line {line})")]
    UnknownKey {
        key: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Unknown keys in config file")]
    UnknownKeys(Vec<ConfError>),

    #[error("{} field(s) failed: {}", .0.len(), summarize(.0))]
    Multiple(Vec<ConfError>),

    #[error("Environment variable '{0}' is not set")]
    EnvVarNotSet(String),

    #[error("Environment variable '{0}' is empty")]
    EnvVarEmpty(String),
}

impl ConfError {
    pub(crate) fn backend(
        backend: impl Into<String>,
        context: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        ConfError::BackendFailure {
            backend: backend.into(),
            context: context.into(),
            source: source.into(),
        }
    }

    /// Collapse collected failures into a result. Empty means success.
    pub(crate) fn from_failures(failures: Vec<ConfError>) -> Result<(), ConfError> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ConfError::Multiple(failures))
        }
    }
}

fn summarize(errors: &[ConfError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Grammar violations in a field annotation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotationError {
    #[error("tag \"{0}\" is missing a value")]
    MissingValue(String),

    #[error("unknown tag \"{0}\"")]
    UnknownTag(String),

    #[error("tag \"default\" has invalid list or map syntax: {0}")]
    InvalidDefault(String),

    #[error("tag \"cli-short\" must be a single character, got \"{0}\"")]
    InvalidShort(String),
}

/// A raw string that could not be converted into its destination type.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid {kind}: {reason}")]
    Syntax { kind: &'static str, reason: String },

    #[error("value out of range for {kind}")]
    OutOfRange { kind: &'static str },

    #[error("invalid map item '{0}': expected exactly one ':' separator")]
    MapItem(String),

    #[error("expected {expected} elements, found {found}")]
    Length { expected: usize, found: usize },

    #[error(transparent)]
    Custom(BoxError),

    /// Message of another error with the offending value blanked out.
    #[error("{0}")]
    Redacted(String),
}

impl DecodeError {
    pub(crate) fn syntax(kind: &'static str, reason: impl ToString) -> Self {
        DecodeError::Syntax {
            kind,
            reason: reason.to_string(),
        }
    }
}

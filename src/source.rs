//! Value sources consulted by the resolver.
//!
//! A [`Source`] answers one question per field: does it hold an entry for
//! it, and if so, what raw string. Each source picks the key form it needs:
//! the keyed backend uses [`Field::key`], the file layer uses [`Field::path`].

use crate::error::ConfError;
use crate::field::Field;

pub trait Source {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Raw value held for `field`, if any. An empty string is still an entry.
    fn lookup(&self, field: &Field<'_>) -> Result<Option<String>, ConfError>;
}

impl<S: Source + ?Sized> Source for &S {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn lookup(&self, field: &Field<'_>) -> Result<Option<String>, ConfError> {
        (**self).lookup(field)
    }
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn lookup(&self, field: &Field<'_>) -> Result<Option<String>, ConfError> {
        (**self).lookup(field)
    }
}

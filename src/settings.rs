//! Structure descriptors.
//!
//! A configuration struct describes its members through [`Settings`]. Each
//! [`Member`] hands out a mutable borrow of one field's storage together with
//! its declared name and raw annotation. The [`settings!`](crate::settings)
//! macro writes the impl for the common case.

use crate::decode::Decode;

/// A composite whose members can be discovered and filled in place.
pub trait Settings {
    /// Members in declaration order.
    fn members(&mut self) -> Vec<Member<'_>>;

    /// A composite that decodes itself from a single raw value returns
    /// `Some` here and is treated as a leaf instead of being descended into.
    fn as_leaf(&mut self) -> Option<&mut dyn Decode> {
        None
    }
}

/// How a member's storage is reached.
pub enum Slot<'a> {
    Leaf(&'a mut dyn Decode),
    /// A named nested composite; extends the key prefix with its own key.
    Nested(&'a mut dyn Settings),
    /// An anonymous composite whose members are spliced in without a prefix.
    Embedded(&'a mut dyn Settings),
    /// An optional composite, materialized with its default when unset.
    Optional(&'a mut dyn Materialize),
}

/// One declared member of a [`Settings`] composite.
pub struct Member<'a> {
    pub name: &'static str,
    pub annotation: &'static str,
    /// Members that are not settable are skipped by discovery.
    pub settable: bool,
    pub slot: Slot<'a>,
}

impl<'a> Member<'a> {
    fn new(name: &'static str, annotation: &'static str, slot: Slot<'a>) -> Self {
        Self {
            name,
            annotation,
            settable: true,
            slot,
        }
    }

    pub fn leaf(name: &'static str, annotation: &'static str, target: &'a mut dyn Decode) -> Self {
        Self::new(name, annotation, Slot::Leaf(target))
    }

    pub fn nested(
        name: &'static str,
        annotation: &'static str,
        target: &'a mut dyn Settings,
    ) -> Self {
        Self::new(name, annotation, Slot::Nested(target))
    }

    pub fn embedded(
        name: &'static str,
        annotation: &'static str,
        target: &'a mut dyn Settings,
    ) -> Self {
        Self::new(name, annotation, Slot::Embedded(target))
    }

    pub fn optional(
        name: &'static str,
        annotation: &'static str,
        target: &'a mut dyn Materialize,
    ) -> Self {
        Self::new(name, annotation, Slot::Optional(target))
    }

    /// A leaf that is declared but not externally settable.
    pub fn private(
        name: &'static str,
        annotation: &'static str,
        target: &'a mut dyn Decode,
    ) -> Self {
        Self {
            settable: false,
            ..Self::leaf(name, annotation, target)
        }
    }
}

/// Optional reference to a composite.
pub trait Materialize {
    /// Allocate a default instance if unset and return it.
    fn materialize(&mut self) -> &mut dyn Settings;
}

impl<T: Settings + Default> Materialize for Option<T> {
    fn materialize(&mut self) -> &mut dyn Settings {
        self.get_or_insert_with(T::default)
    }
}

impl<T: Settings + ?Sized> Settings for Box<T> {
    fn members(&mut self) -> Vec<Member<'_>> {
        (**self).members()
    }

    fn as_leaf(&mut self) -> Option<&mut dyn Decode> {
        (**self).as_leaf()
    }
}

/// Implement [`Settings`] for a struct from a member list.
///
/// Each entry is `field: kind` or `field: kind = "annotation"`, where `kind`
/// is one of `leaf`, `nested`, `embedded`, `optional` or `private`. The
/// field's identifier is its declared name.
///
/// ```ignore
/// settings!(Server {
///     host: leaf = "default:localhost",
///     port: leaf = "env:PORT,required",
///     tls: optional,
///     database: nested,
/// });
/// ```
#[macro_export]
macro_rules! settings {
    ($ty:ty { $($field:ident : $kind:ident $(= $annotation:literal)?),* $(,)? }) => {
        impl $crate::Settings for $ty {
            fn members(&mut self) -> ::std::vec::Vec<$crate::Member<'_>> {
                ::std::vec![$(
                    $crate::Member::$kind(
                        stringify!($field),
                        $crate::settings!(@annotation $($annotation)?),
                        &mut self.$field,
                    )
                ),*]
            }
        }
    };
    (@annotation) => { "" };
    (@annotation $annotation:literal) => { $annotation };
}

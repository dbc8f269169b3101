//! Attachment types: the typed descriptors that identify a category of
//! attachment data and carry everything the propagation engine needs to know
//! about it.
//!
//! An [`AttachmentType<T>`] is created once, usually at startup, through
//! [`AttachmentType::builder`]. It is a cheap handle (a reference-counted
//! pointer) and can be cloned freely; all clones refer to the same type.
//!
//! ```
//! use carryover::prelude::*;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Mana(u32);
//!
//! let mana: AttachmentType<Mana> = AttachmentType::builder("magic:mana")
//!     .codec(FnCodec::new(
//!         |mana: &Mana| Ok(mana.0.to_le_bytes().to_vec()),
//!         |bytes: &[u8]| {
//!             let bytes: [u8; 4] = bytes.try_into().map_err(|_| report!("expected 4 bytes"))?;
//!             Ok(Mana(u32::from_le_bytes(bytes)))
//!         },
//!     ))
//!     .copy_on_death()
//!     .copy_with_clone()
//!     .build();
//!
//! assert!(mana.has_codec());
//! assert!(mana.copy_on_death());
//! ```
//!
//! # Copy handler resolution
//!
//! When the type is built, its copy handler is resolved in this order:
//!
//! 1. The handler set with [`copy_handler`] or [`copy_handler_with`], if any.
//! 2. Otherwise, if the type has a codec, a codec round trip: the value is
//!    encoded and decoded again, which yields an independent value.
//! 3. Otherwise the type has no copy handler.
//!
//! A type without a codec is never propagated, whatever its handler.
//!
//! [`copy_handler`]: AttachmentTypeBuilder::copy_handler
//! [`copy_handler_with`]: AttachmentTypeBuilder::copy_handler_with

mod builder;
mod erased;
mod key;

use alloc::{borrow::Cow, boxed::Box};

use rootcause::Report;
use triomphe::Arc;

pub use self::{builder::AttachmentTypeBuilder, erased::ErasedAttachmentType, key::AttachmentKey};
use crate::{
    codec::{self, AttachmentCodec},
    context::CopyContext,
    handlers::CopyHandler,
    holder::AttachmentHolder,
};

/// Supplier of default values for lazily materialized attachments.
pub(crate) type DefaultSupplier<T> = Box<dyn Fn() -> T + Send + Sync>;

/// The shared, immutable data behind an [`AttachmentType`].
pub(crate) struct TypeData<T: 'static> {
    key: AttachmentKey,
    codec: Option<Box<dyn AttachmentCodec<T>>>,
    copy_on_death: bool,
    copy_handler: Option<Box<dyn CopyHandler<T>>>,
    default_value: Option<DefaultSupplier<T>>,
}

impl<T: Send + Sync + 'static> TypeData<T> {
    /// Produces a copy of `value` for `destination`, following the copy
    /// handler resolution order described in the module documentation.
    fn copy_value(
        &self,
        value: &T,
        destination: &dyn AttachmentHolder,
        context: &CopyContext<'_>,
    ) -> Result<Option<T>, Report> {
        match (&self.copy_handler, &self.codec) {
            (Some(handler), _) => handler.copy(value, destination, context),
            (None, Some(codec)) => codec::round_trip(codec.as_ref(), value).map(Some),
            (None, None) => Ok(None),
        }
    }
}

/// A typed attachment type.
///
/// See the [module documentation](self) for how to build one.
pub struct AttachmentType<T: 'static> {
    data: Arc<TypeData<T>>,
}

impl<T: Send + Sync + 'static> AttachmentType<T> {
    /// Starts building a new attachment type with the given name.
    ///
    /// The name is informational and is what the
    /// [`AttachmentRegistry`](crate::registry::AttachmentRegistry) uses to
    /// detect duplicates; the identity of the type is its freshly allocated
    /// [`AttachmentKey`].
    #[must_use]
    pub fn builder(name: impl Into<Cow<'static, str>>) -> AttachmentTypeBuilder<T> {
        AttachmentTypeBuilder::new(name.into())
    }

    /// The unique key of this attachment type.
    #[must_use]
    pub fn key(&self) -> &AttachmentKey {
        &self.data.key
    }

    /// The name this attachment type was built with.
    #[must_use]
    pub fn name(&self) -> &str {
        self.data.key.name()
    }

    /// Whether this type has a codec, which marks it as transferable.
    #[must_use]
    pub fn has_codec(&self) -> bool {
        self.data.codec.is_some()
    }

    /// The codec of this type, if it has one.
    #[must_use]
    pub fn codec(&self) -> Option<&dyn AttachmentCodec<T>> {
        self.data.codec.as_deref()
    }

    /// Whether values of this type survive the death of their holder.
    #[must_use]
    pub fn copy_on_death(&self) -> bool {
        self.data.copy_on_death
    }

    /// Whether this type has a copy handler, either explicit or derived from
    /// its codec.
    #[must_use]
    pub fn has_copy_handler(&self) -> bool {
        self.data.copy_handler.is_some() || self.data.codec.is_some()
    }

    /// Creates a new default value, if the type has a default supplier.
    #[must_use]
    pub fn create_default(&self) -> Option<T> {
        self.data.default_value.as_ref().map(|supplier| supplier())
    }

    /// Produces a copy of `value` for `destination` using this type's copy
    /// handler.
    ///
    /// Returns `Ok(None)` when the handler declines to copy the value or when
    /// the type has no copy handler at all.
    pub fn copy_value(
        &self,
        value: &T,
        destination: &dyn AttachmentHolder,
        context: &CopyContext<'_>,
    ) -> Result<Option<T>, Report> {
        self.data.copy_value(value, destination, context)
    }

    /// Returns the type-erased form of this attachment type.
    #[must_use]
    pub fn erased(&self) -> ErasedAttachmentType {
        ErasedAttachmentType::from_typed(self.data.clone())
    }

    pub(crate) fn from_data(data: TypeData<T>) -> Self {
        Self {
            data: Arc::new(data),
        }
    }
}

impl<T: 'static> Clone for AttachmentType<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
        }
    }
}

impl<T: 'static> PartialEq for AttachmentType<T> {
    fn eq(&self, other: &Self) -> bool {
        self.data.key == other.data.key
    }
}

impl<T: 'static> Eq for AttachmentType<T> {}

impl<T: 'static> core::fmt::Debug for AttachmentType<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AttachmentType")
            .field("key", &self.data.key)
            .field("value_type", &core::any::type_name::<T>())
            .field("has_codec", &self.data.codec.is_some())
            .field("copy_on_death", &self.data.copy_on_death)
            .finish()
    }
}

//! The type-erased form of [`AttachmentType`].
//!
//! Holders keep attachments of many value types side by side, so the
//! attachment map and the propagation engine work with
//! [`ErasedAttachmentType`]. The per-type behavior stays with the typed
//! [`TypeData<T>`] and is reached through the [`UntypedAttachmentType`] trait
//! object, which is only ever implemented by [`TypeData<T>`]. Values are
//! matched against `T` with a checked downcast before any typed code runs.

use core::any::TypeId;

use carryover_internals::{RawAttachment, RawAttachmentRef};
use rootcause::{Report, bail};
use triomphe::Arc;
use unsize::CoerceUnsize;

use crate::{
    attachment_type::{AttachmentKey, AttachmentType, TypeData},
    context::CopyContext,
    holder::AttachmentHolder,
};

/// Object-safe view of a [`TypeData<T>`].
///
/// This trait is guaranteed to only be implemented for [`TypeData<T>`].
pub(crate) trait UntypedAttachmentType: Send + Sync + 'static {
    fn key(&self) -> &AttachmentKey;

    fn has_codec(&self) -> bool;

    fn copy_on_death(&self) -> bool;

    fn has_copy_handler(&self) -> bool;

    fn value_type_id(&self) -> TypeId;

    fn value_type_name(&self) -> &'static str;

    /// Copies an erased value of this type for `destination`.
    ///
    /// Fails if `value` does not hold a `T`.
    fn copy_raw(
        &self,
        value: RawAttachmentRef<'_>,
        destination: &dyn AttachmentHolder,
        context: &CopyContext<'_>,
    ) -> Result<Option<RawAttachment>, Report>;

    /// Creates an erased default value, if the type has a default supplier.
    fn create_default_raw(&self) -> Option<RawAttachment>;
}

impl<T: Send + Sync + 'static> UntypedAttachmentType for TypeData<T> {
    fn key(&self) -> &AttachmentKey {
        &self.key
    }

    fn has_codec(&self) -> bool {
        self.codec.is_some()
    }

    fn copy_on_death(&self) -> bool {
        self.copy_on_death
    }

    fn has_copy_handler(&self) -> bool {
        self.copy_handler.is_some() || self.codec.is_some()
    }

    fn value_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn value_type_name(&self) -> &'static str {
        core::any::type_name::<T>()
    }

    fn copy_raw(
        &self,
        value: RawAttachmentRef<'_>,
        destination: &dyn AttachmentHolder,
        context: &CopyContext<'_>,
    ) -> Result<Option<RawAttachment>, Report> {
        let Some(typed) = value.downcast::<T>() else {
            bail!(
                "attachment `{}` holds a value of type `{}`, expected `{}`",
                self.key,
                value.attachment_type_name(),
                core::any::type_name::<T>()
            );
        };

        let copy = self.copy_value(typed, destination, context)?;
        Ok(copy.map(RawAttachment::new))
    }

    fn create_default_raw(&self) -> Option<RawAttachment> {
        self.default_value
            .as_ref()
            .map(|supplier| RawAttachment::new(supplier()))
    }
}

/// A type-erased [`AttachmentType`].
///
/// Two erased types are equal exactly when they come from the same
/// [`AttachmentType`], i.e. when their keys are equal.
#[derive(Clone)]
pub struct ErasedAttachmentType {
    inner: Arc<dyn UntypedAttachmentType>,
}

impl ErasedAttachmentType {
    pub(super) fn from_typed<T: Send + Sync + 'static>(data: Arc<TypeData<T>>) -> Self {
        let inner = data.unsize(unsize::Coercion!(to dyn UntypedAttachmentType));
        Self { inner }
    }

    /// The unique key of this attachment type.
    #[must_use]
    pub fn key(&self) -> &AttachmentKey {
        self.inner.key()
    }

    /// The name this attachment type was built with.
    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.key().name()
    }

    /// Whether this type has a codec, which marks it as transferable.
    #[must_use]
    pub fn has_codec(&self) -> bool {
        self.inner.has_codec()
    }

    /// Whether values of this type survive the death of their holder.
    #[must_use]
    pub fn copy_on_death(&self) -> bool {
        self.inner.copy_on_death()
    }

    /// Whether this type has a copy handler, either explicit or derived from
    /// its codec.
    #[must_use]
    pub fn has_copy_handler(&self) -> bool {
        self.inner.has_copy_handler()
    }

    /// The [`TypeId`] of the values stored under this type.
    #[must_use]
    pub fn value_type_id(&self) -> TypeId {
        self.inner.value_type_id()
    }

    /// The [`core::any::type_name`] of the values stored under this type.
    #[must_use]
    pub fn value_type_name(&self) -> &'static str {
        self.inner.value_type_name()
    }

    /// Whether this is the erased form of `attachment_type`.
    #[must_use]
    pub fn is<T: Send + Sync + 'static>(&self, attachment_type: &AttachmentType<T>) -> bool {
        self.key() == attachment_type.key()
    }

    pub(crate) fn copy_raw(
        &self,
        value: RawAttachmentRef<'_>,
        destination: &dyn AttachmentHolder,
        context: &CopyContext<'_>,
    ) -> Result<Option<RawAttachment>, Report> {
        self.inner.copy_raw(value, destination, context)
    }

    pub(crate) fn create_default_raw(&self) -> Option<RawAttachment> {
        self.inner.create_default_raw()
    }
}

impl PartialEq for ErasedAttachmentType {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ErasedAttachmentType {}

impl core::hash::Hash for ErasedAttachmentType {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl core::fmt::Debug for ErasedAttachmentType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ErasedAttachmentType")
            .field("key", self.key())
            .field("value_type", &self.value_type_name())
            .field("has_codec", &self.has_codec())
            .field("copy_on_death", &self.copy_on_death())
            .finish()
    }
}

impl core::fmt::Display for ErasedAttachmentType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(self.key(), f)
    }
}

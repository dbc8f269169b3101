//! Holders: objects that carry attachments.
//!
//! Any object can carry attachments by implementing [`AttachmentHolder`].
//! The trait only asks for the four capabilities the propagation engine
//! consumes; the storage itself is an [`AttachmentMap`], which most holders
//! embed as a field and delegate to:
//!
//! ```
//! use carryover::prelude::*;
//! use carryover::holder::{AttachmentRef, ExistingTypes};
//!
//! struct Chunk {
//!     x: i32,
//!     z: i32,
//!     attachments: AttachmentMap,
//! }
//!
//! impl AttachmentHolder for Chunk {
//!     fn has_attachments(&self) -> bool {
//!         self.attachments.has_attachments()
//!     }
//!
//!     fn existing_types(&self) -> ExistingTypes<'_> {
//!         self.attachments.existing_types()
//!     }
//!
//!     fn get_attachment(&self, key: &AttachmentKey) -> Option<AttachmentRef<'_>> {
//!         self.attachments.get_attachment(key)
//!     }
//!
//!     fn attachments_mut(&mut self) -> &mut AttachmentMap {
//!         &mut self.attachments
//!     }
//! }
//! ```
//!
//! The typed accessors (`get_data`, `set_data`, ...) come from
//! [`AttachmentHolderExt`], which every holder implements automatically,
//! including `dyn AttachmentHolder`.

mod iter;
mod map;

use carryover_internals::RawAttachmentRef;

pub use self::{
    iter::{ExistingTypes, Types},
    map::AttachmentMap,
};
use crate::attachment_type::{AttachmentKey, AttachmentType, ErasedAttachmentType};

/// The capability of carrying attachments.
///
/// # Contract
///
/// - `has_attachments` is `false` exactly when `existing_types` yields
///   nothing.
/// - Every type yielded by `existing_types` can be fetched with
///   `get_attachment` until the holder is mutated.
/// - `attachments_mut` returns the storage that `get_attachment` reads from,
///   so that a value installed through it is visible afterwards.
pub trait AttachmentHolder {
    /// Whether the holder carries any attachments at all.
    fn has_attachments(&self) -> bool;

    /// The attachment types currently populated on this holder.
    ///
    /// The sequence is lazy and finite; calling the method again restarts it.
    fn existing_types(&self) -> ExistingTypes<'_>;

    /// The value stored under `key`, if any.
    fn get_attachment(&self, key: &AttachmentKey) -> Option<AttachmentRef<'_>>;

    /// Mutable access to the storage, used to install values.
    fn attachments_mut(&mut self) -> &mut AttachmentMap;
}

/// Typed accessors for every [`AttachmentHolder`].
///
/// This trait is implemented automatically for all holders, sized or not.
pub trait AttachmentHolderExt: AttachmentHolder {
    /// The value of `attachment_type` on this holder, if present.
    fn get_data<T: Send + Sync + 'static>(
        &self,
        attachment_type: &AttachmentType<T>,
    ) -> Option<&T> {
        self.get_attachment(attachment_type.key())?
            .downcast_inner::<T>()
    }

    /// Whether this holder carries a value of `attachment_type`.
    fn has_data<T: Send + Sync + 'static>(&self, attachment_type: &AttachmentType<T>) -> bool {
        self.get_attachment(attachment_type.key()).is_some()
    }

    /// Mutable access to the value of `attachment_type`, if present.
    fn get_data_mut<T: Send + Sync + 'static>(
        &mut self,
        attachment_type: &AttachmentType<T>,
    ) -> Option<&mut T> {
        self.attachments_mut().get_mut(attachment_type)
    }

    /// Sets the value of `attachment_type`, returning the previous value.
    fn set_data<T: Send + Sync + 'static>(
        &mut self,
        attachment_type: &AttachmentType<T>,
        value: T,
    ) -> Option<T> {
        self.attachments_mut().insert(attachment_type, value)
    }

    /// Removes the value of `attachment_type`, returning it.
    fn remove_data<T: Send + Sync + 'static>(
        &mut self,
        attachment_type: &AttachmentType<T>,
    ) -> Option<T> {
        self.attachments_mut().remove(attachment_type)
    }

    /// Mutable access to the value of `attachment_type`, creating it from the
    /// type's default supplier first if the holder does not carry one.
    ///
    /// Returns `None` only when the value is absent and the type has no
    /// default supplier.
    fn get_data_or_default<T: Send + Sync + 'static>(
        &mut self,
        attachment_type: &AttachmentType<T>,
    ) -> Option<&mut T> {
        self.attachments_mut().get_or_insert_default(attachment_type)
    }
}

impl<H: AttachmentHolder + ?Sized> AttachmentHolderExt for H {}

/// A borrowed, type-erased attachment value together with its type.
#[derive(Clone, Copy)]
pub struct AttachmentRef<'a> {
    attachment_type: &'a ErasedAttachmentType,
    raw: RawAttachmentRef<'a>,
}

impl<'a> AttachmentRef<'a> {
    pub(crate) fn new(attachment_type: &'a ErasedAttachmentType, raw: RawAttachmentRef<'a>) -> Self {
        Self {
            attachment_type,
            raw,
        }
    }

    /// The attachment type this value is stored under.
    #[must_use]
    pub fn attachment_type(self) -> &'a ErasedAttachmentType {
        self.attachment_type
    }

    /// The value as a `&T`, if it is a `T`.
    #[must_use]
    pub fn downcast_inner<T: 'static>(self) -> Option<&'a T> {
        self.raw.downcast::<T>()
    }

    /// The [`core::any::type_name`] of the stored value.
    #[must_use]
    pub fn value_type_name(self) -> &'static str {
        self.raw.attachment_type_name()
    }

    pub(crate) fn raw(self) -> RawAttachmentRef<'a> {
        self.raw
    }
}

impl core::fmt::Debug for AttachmentRef<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AttachmentRef")
            .field("attachment_type", self.attachment_type.key())
            .field("value_type", &self.value_type_name())
            .finish()
    }
}

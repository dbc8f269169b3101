//! Vtable for type-erased attachment operations.
//!
//! This module contains the [`AttachmentVtable`] which enables operating on
//! attachments when their concrete attachment type `A` has been erased. The
//! vtable stores function pointers that dispatch to the correct typed
//! implementations.
//!
//! This module encapsulates the fields of [`AttachmentVtable`] so they cannot
//! be accessed directly. This visibility restriction guarantees the safety
//! invariant: **the vtable's type parameter must match the actual attachment
//! type stored in the [`AttachmentData`]**.
//!
//! # Safety Invariant
//!
//! This invariant is maintained because vtables are created as `&'static`
//! references via [`AttachmentVtable::new`], which pairs the function pointers
//! with a specific type `A` at compile time.

use alloc::boxed::Box;
use core::{any::TypeId, ptr::NonNull};

use crate::{attachment::data::AttachmentData, util::Erased};

/// Vtable for type-erased attachment operations.
///
/// # Safety Invariant
///
/// The field `drop` is guaranteed to point to the function defined below
/// instantiated with the attachment type `A` that was used to create this
/// [`AttachmentVtable`].
pub(crate) struct AttachmentVtable {
    /// Gets the [`TypeId`] of the attachment type that was used to create this
    /// [`AttachmentVtable`].
    type_id: fn() -> TypeId,
    /// Gets the [`core::any::type_name`] of the attachment type that was used
    /// to create this [`AttachmentVtable`].
    type_name: fn() -> &'static str,
    /// Drops the [`Box<AttachmentData<A>>`] instance pointed to by this
    /// pointer.
    drop: unsafe fn(NonNull<AttachmentData<Erased>>),
}

impl AttachmentVtable {
    /// Creates a new [`AttachmentVtable`] for the attachment type `A`.
    pub(super) const fn new<A: 'static>() -> &'static Self {
        const {
            &Self {
                type_id: TypeId::of::<A>,
                type_name: core::any::type_name::<A>,
                drop: drop::<A>,
            }
        }
    }

    /// Gets the [`TypeId`] of the attachment type that was used to create this
    /// [`AttachmentVtable`].
    #[inline]
    pub(super) fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Gets the [`core::any::type_name`] of the attachment type that was used
    /// to create this [`AttachmentVtable`].
    #[inline]
    pub(super) fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// Drops the `Box<AttachmentData<A>>` instance pointed to by this pointer.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The pointer comes from [`Box<AttachmentData<A>>`] via
    ///    [`Box::into_raw`]
    /// 2. This [`AttachmentVtable`] must be a vtable for the attachment type
    ///    stored in the [`AttachmentData`].
    /// 3. This method drops the [`Box<AttachmentData<A>>`], so the caller must
    ///    ensure that the pointer has not previously been dropped, that it is
    ///    able to transfer ownership of the pointer, and that it will not use
    ///    the pointer after calling this method.
    #[inline]
    pub(super) unsafe fn drop(&self, ptr: NonNull<AttachmentData<Erased>>) {
        // SAFETY: We know that `self.drop` points to the function `drop::<A>` below.
        // That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        // 3. Guaranteed by the caller
        unsafe {
            (self.drop)(ptr);
        }
    }
}

/// Drops the [`Box<AttachmentData<A>>`] instance pointed to by this pointer.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The pointer comes from [`Box<AttachmentData<A>>`] via [`Box::into_raw`]
/// 2. The attachment type `A` matches the actual attachment type stored in the
///    [`AttachmentData`]
/// 3. This method drops the [`Box<AttachmentData<A>>`], so the caller must
///    ensure that the pointer has not previously been dropped, that it is able
///    to transfer ownership of the pointer, and that it will not use the
///    pointer after calling this method.
unsafe fn drop<A: 'static>(ptr: NonNull<AttachmentData<Erased>>) {
    let ptr: NonNull<AttachmentData<A>> = ptr.cast();
    let ptr = ptr.as_ptr();
    // SAFETY: Our pointer has the correct type as guaranteed by the caller, and it
    // came from a call to `Box::into_raw` as also guaranteed by our caller.
    let boxed = unsafe { Box::from_raw(ptr) };
    core::mem::drop(boxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_vtable_eq() {
        let vtable1 = AttachmentVtable::new::<i32>();
        let vtable2 = AttachmentVtable::new::<i32>();

        // Both should be the exact same static instance
        assert!(core::ptr::eq(vtable1, vtable2));
    }

    #[test]
    fn test_attachment_type_id_and_name() {
        let vtable = AttachmentVtable::new::<i32>();
        assert_eq!(vtable.type_id(), TypeId::of::<i32>());
        assert_eq!(vtable.type_name(), "i32");

        let other = AttachmentVtable::new::<u64>();
        assert!(!core::ptr::eq(vtable, other));
    }
}

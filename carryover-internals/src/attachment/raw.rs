//! Type-erased attachment pointer types.
//!
//! This module encapsulates the `ptr` field of [`RawAttachment`],
//! [`RawAttachmentRef`] and [`RawAttachmentMut`], ensuring it is only visible
//! within this module. This visibility restriction guarantees the safety
//! invariant: **the pointer always comes from `Box<AttachmentData<A>>`**.
//!
//! # Safety Invariant
//!
//! Since the `ptr` field can only be set via [`RawAttachment::new`] (which
//! creates it from `Box::into_raw`), and cannot be modified afterward (no `pub`
//! or `pub(crate)` fields), the pointer provenance remains valid throughout the
//! value's lifetime.
//!
//! The [`RawAttachment::drop`] implementation relies on this invariant to
//! safely reconstruct the `Box` and deallocate the memory.
//!
//! # Type Erasure
//!
//! The concrete type parameter `A` is erased by casting to
//! `AttachmentData<Erased>`. The vtable stored within the `AttachmentData`
//! provides the runtime type information needed to check downcasts and to
//! drop the value.

use alloc::boxed::Box;
use core::{any::TypeId, mem::ManuallyDrop, ptr::NonNull};

use crate::{attachment::data::AttachmentData, util::Erased};

/// A pointer to an [`AttachmentData`] that is guaranteed to point to an
/// initialized instance of an [`AttachmentData<A>`] for some specific `A`,
/// though we do not know which actual `A` it is.
///
/// However, the pointer is allowed to transition into a non-initialized state
/// inside the [`RawAttachment::drop`] method.
///
/// The pointer is guaranteed to have been created using [`Box::into_raw`].
///
/// We cannot use a [`Box<AttachmentData<A>>`] directly, because that does not
/// allow us to type-erase the `A`.
#[repr(transparent)]
pub struct RawAttachment {
    /// Pointer to the inner attachment data
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The pointer must have been created from a `Box<AttachmentData<A>>`
    ///    for some `A: Send + Sync` using `Box::into_raw`.
    /// 2. The pointer will point to the same `AttachmentData<A>` for the entire
    ///    lifetime of this object.
    /// 3. The pointee is properly initialized for the entire lifetime of this
    ///    object, except during the execution of the `Drop` implementation.
    ptr: NonNull<AttachmentData<Erased>>,
}

// SAFETY: `RawAttachment` owns an `AttachmentData<A>` where `A: Send + Sync`
// is required by the only constructor, `RawAttachment::new`. Owning it on
// another thread is therefore the same as owning a `Box<A>` there.
unsafe impl Send for RawAttachment {}

// SAFETY: Shared access only ever produces `&A` where `A: Sync`, see above.
unsafe impl Sync for RawAttachment {}

impl RawAttachment {
    /// Creates a new [`RawAttachment`] holding the specified value.
    #[inline]
    pub fn new<A>(attachment: A) -> Self
    where
        A: Send + Sync + 'static,
    {
        let ptr = Box::new(AttachmentData::new(attachment));
        let ptr: *mut AttachmentData<A> = Box::into_raw(ptr);
        let ptr: *mut AttachmentData<Erased> = ptr.cast::<AttachmentData<Erased>>();

        // SAFETY: `Box::into_raw` returns a non-null pointer
        let ptr: NonNull<AttachmentData<Erased>> = unsafe { NonNull::new_unchecked(ptr) };

        Self { ptr }
    }

    /// Returns a reference to the [`AttachmentData`] instance.
    #[inline]
    pub fn as_ref(&self) -> RawAttachmentRef<'_> {
        RawAttachmentRef {
            ptr: self.ptr,
            _marker: core::marker::PhantomData,
        }
    }

    /// Returns a mutable reference to the [`AttachmentData`] instance.
    #[inline]
    pub fn as_mut(&mut self) -> RawAttachmentMut<'_> {
        RawAttachmentMut {
            ptr: self.ptr,
            _marker: core::marker::PhantomData,
        }
    }

    /// Consumes the [`RawAttachment`] and returns the inner value if it is of
    /// type `A`. Otherwise the [`RawAttachment`] is handed back unchanged.
    #[inline]
    pub fn into_inner<A: 'static>(self) -> Result<A, Self> {
        if self.as_ref().attachment_type_id() != TypeId::of::<A>() {
            return Err(self);
        }

        // We take over the ownership of the allocation, so the `Drop`
        // implementation of `self` must not run.
        let this = ManuallyDrop::new(self);
        let ptr: *mut AttachmentData<A> = this.ptr.cast::<AttachmentData<A>>().as_ptr();

        // SAFETY:
        // 1. The pointer comes from `Box::into_raw` on a `Box<AttachmentData<A>>`
        //    (guaranteed by `RawAttachment::new`), and we just checked that the
        //    stored type is `A`.
        // 2. `this` is never used or dropped again, so ownership of the
        //    allocation is transferred exactly once.
        let boxed: Box<AttachmentData<A>> = unsafe { Box::from_raw(ptr) };
        Ok((*boxed).into_attachment())
    }
}

impl core::ops::Drop for RawAttachment {
    #[inline]
    fn drop(&mut self) {
        let vtable = self.as_ref().vtable();

        // SAFETY:
        // 1. The pointer comes from `Box::into_raw` (guaranteed by
        //    `RawAttachment::new`)
        // 2. The vtable returned by `self.as_ref().vtable()` is guaranteed to match the
        //    data in the `AttachmentData`.
        // 3. The pointer is initialized and has not been previously free as guaranteed
        //    by the invariants on this type. We are correctly transferring ownership
        //    here and the pointer is not used afterwards, as we are in the drop
        //    function.
        unsafe {
            vtable.drop(self.ptr);
        }
    }
}

impl core::fmt::Debug for RawAttachment {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.as_ref().fmt(f)
    }
}

/// A lifetime-bound pointer to an [`AttachmentData`] that is guaranteed to
/// point to an initialized instance of an [`AttachmentData<A>`] for some
/// specific `A`, though we do not know which actual `A` it is.
///
/// We cannot use a [`&'a AttachmentData<A>`] directly, because that would
/// require us to know the actual type of the attachment, which we do not.
///
/// [`&'a AttachmentData<A>`]: AttachmentData
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct RawAttachmentRef<'a> {
    /// Pointer to the inner attachment data
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The pointer must have been created from a `Box<AttachmentData<A>>`
    ///    for some `A: Send + Sync` using `Box::into_raw`.
    /// 2. The pointer will point to the same `AttachmentData<A>` for the entire
    ///    lifetime of this object.
    ptr: NonNull<AttachmentData<Erased>>,

    /// Marker to tell the compiler that we should
    /// behave the same as a `&'a AttachmentData<Erased>`
    _marker: core::marker::PhantomData<&'a AttachmentData<Erased>>,
}

// SAFETY: A `RawAttachmentRef` only hands out `&A` where `A: Sync`.
unsafe impl Send for RawAttachmentRef<'_> {}

// SAFETY: A `RawAttachmentRef` only hands out `&A` where `A: Sync`.
unsafe impl Sync for RawAttachmentRef<'_> {}

impl<'a> RawAttachmentRef<'a> {
    /// Casts the [`RawAttachmentRef`] to an [`AttachmentData<A>`] reference.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The type `A` matches the actual attachment type stored in the
    ///    [`AttachmentData`].
    #[inline]
    pub(super) unsafe fn cast_inner<A>(self) -> &'a AttachmentData<A> {
        // Debug assertion to catch type mismatches in case of bugs
        debug_assert_eq!(self.vtable().type_id(), TypeId::of::<A>());

        let this = self.ptr.cast::<AttachmentData<A>>();
        // SAFETY: Converting the NonNull pointer to a reference is sound because:
        // - The pointer is non-null, properly aligned, and dereferenceable (guaranteed
        //   by RawAttachmentRef's type invariants)
        // - The pointee is properly initialized (RawAttachmentRef's doc comment
        //   guarantees it points to an initialized AttachmentData<A> for some A)
        // - The type `A` matches the actual attachment type (guaranteed by caller)
        // - Shared access is allowed
        // - The reference lifetime 'a is valid (tied to RawAttachmentRef<'a>'s
        //   lifetime)
        unsafe { this.as_ref() }
    }

    /// Returns a raw pointer to the [`AttachmentData`] instance.
    #[inline]
    pub(super) fn as_ptr(self) -> *const AttachmentData<Erased> {
        self.ptr.as_ptr()
    }

    /// Returns the [`TypeId`] of the attachment.
    #[inline]
    pub fn attachment_type_id(self) -> TypeId {
        self.vtable().type_id()
    }

    /// Returns the [`core::any::type_name`] of the attachment.
    #[inline]
    pub fn attachment_type_name(self) -> &'static str {
        self.vtable().type_name()
    }

    /// Returns the attachment as an `&A` if the stored value is of type `A`.
    #[inline]
    pub fn downcast<A: 'static>(self) -> Option<&'a A> {
        if self.attachment_type_id() == TypeId::of::<A>() {
            // SAFETY:
            // 1. We just checked that the stored type is `A`.
            Some(unsafe { self.attachment_downcast_unchecked::<A>() })
        } else {
            None
        }
    }
}

impl core::fmt::Debug for RawAttachmentRef<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RawAttachment")
            .field("type_name", &self.attachment_type_name())
            .finish_non_exhaustive()
    }
}

/// A lifetime-bound exclusive pointer to an [`AttachmentData`] that is
/// guaranteed to point to an initialized instance of an
/// [`AttachmentData<A>`] for some specific `A`, though we do not know which
/// actual `A` it is.
///
/// # Safety invariants
///
/// This reference behaves like a `&'a mut AttachmentData<A>` for some unknown
/// `A`: no other reference to the pointee exists for the lifetime `'a`.
#[repr(transparent)]
pub struct RawAttachmentMut<'a> {
    /// Pointer to the inner attachment data
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The pointer must have been created from a `Box<AttachmentData<A>>`
    ///    for some `A: Send + Sync` using `Box::into_raw`.
    /// 2. The pointer will point to the same `AttachmentData<A>` for the entire
    ///    lifetime of this object.
    /// 3. This is the only live reference to the pointee for the lifetime
    ///    `'a`, since it was created from a `&'a mut RawAttachment`.
    ptr: NonNull<AttachmentData<Erased>>,

    /// Marker to tell the compiler that we should
    /// behave the same as a `&'a mut AttachmentData<Erased>`
    _marker: core::marker::PhantomData<&'a mut AttachmentData<Erased>>,
}

impl<'a> RawAttachmentMut<'a> {
    /// Casts the [`RawAttachmentMut`] to a mutable [`AttachmentData<A>`]
    /// reference.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The type `A` matches the actual attachment type stored in the
    ///    [`AttachmentData`].
    #[inline]
    pub(super) unsafe fn cast_inner_mut<A>(self) -> &'a mut AttachmentData<A> {
        debug_assert_eq!(self.as_ref().attachment_type_id(), TypeId::of::<A>());

        let mut this = self.ptr.cast::<AttachmentData<A>>();
        // SAFETY: Converting the NonNull pointer to a mutable reference is sound
        // because:
        // - The pointer is non-null, properly aligned, and dereferenceable
        // - The pointee is properly initialized
        // - The type `A` matches the actual attachment type (guaranteed by caller)
        // - Exclusive access is guaranteed by the invariants of `RawAttachmentMut`
        unsafe { this.as_mut() }
    }

    /// Reborrows the [`RawAttachmentMut`] as a shared [`RawAttachmentRef`].
    #[inline]
    pub fn as_ref(&self) -> RawAttachmentRef<'_> {
        RawAttachmentRef {
            ptr: self.ptr,
            _marker: core::marker::PhantomData,
        }
    }

    /// Returns the attachment as an `&mut A` if the stored value is of type
    /// `A`.
    #[inline]
    pub fn downcast_mut<A: 'static>(self) -> Option<&'a mut A> {
        if self.as_ref().attachment_type_id() == TypeId::of::<A>() {
            // SAFETY:
            // 1. We just checked that the stored type is `A`.
            Some(unsafe { self.attachment_downcast_unchecked_mut::<A>() })
        } else {
            None
        }
    }
}

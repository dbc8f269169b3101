//! The heap cell behind every stored attachment value.
//!
//! An [`AttachmentData<A>`] pairs a value with the [`AttachmentVtable`] built
//! for `A`. Both are written together in [`AttachmentData::new`] and neither
//! field is reachable outside this module, so a cell's vtable always describes
//! the value stored next to it. The rest of the crate only sees the cell
//! through the erased pointers in [`raw`](super::raw).

use crate::attachment::{
    raw::{RawAttachmentMut, RawAttachmentRef},
    vtable::AttachmentVtable,
};

/// A stored attachment value together with its vtable.
///
/// The layout is `#[repr(C)]` with the vtable first, so the vtable can be read
/// through a pointer to `AttachmentData<Erased>` without knowing `A`.
#[repr(C)]
pub(super) struct AttachmentData<A: 'static> {
    vtable: &'static AttachmentVtable,
    value: A,
}

impl<A: 'static> AttachmentData<A> {
    /// Wraps `value` in a cell dispatching through the vtable for `A`.
    #[inline]
    pub(super) fn new(value: A) -> Self {
        Self {
            vtable: AttachmentVtable::new::<A>(),
            value,
        }
    }

    /// Unwraps the stored value.
    #[inline]
    pub(super) fn into_attachment(self) -> A {
        self.value
    }
}

impl<'a> RawAttachmentRef<'a> {
    /// Reads the vtable of the cell without knowing its value type.
    #[inline]
    pub(super) fn vtable(self) -> &'static AttachmentVtable {
        let ptr = self.as_ptr();
        // SAFETY: `ptr` points to a live `AttachmentData<A>` for some unknown
        // `A`. The `vtable` field sits at offset 0 of every such cell, so its
        // address is the same for all `A`. Only a raw place is formed here; no
        // `&AttachmentData<Erased>` is created.
        let vtable_ptr: *const &'static AttachmentVtable = unsafe { &raw const (*ptr).vtable };

        // SAFETY: `vtable_ptr` is aligned and points to the initialized
        // `vtable` field of the same live cell.
        unsafe { *vtable_ptr }
    }

    /// Borrows the stored value as an `A`.
    ///
    /// # Safety
    ///
    /// `A` must be the type the cell was created with.
    #[inline]
    pub unsafe fn attachment_downcast_unchecked<A: 'static>(self) -> &'a A {
        // SAFETY: the caller guarantees the cell holds an `A`.
        let cell = unsafe { self.cast_inner::<A>() };
        &cell.value
    }
}

impl<'a> RawAttachmentMut<'a> {
    /// Mutably borrows the stored value as an `A`.
    ///
    /// # Safety
    ///
    /// `A` must be the type the cell was created with.
    #[inline]
    pub unsafe fn attachment_downcast_unchecked_mut<A: 'static>(self) -> &'a mut A {
        // SAFETY: the caller guarantees the cell holds an `A`.
        let cell = unsafe { self.cast_inner_mut::<A>() };
        &mut cell.value
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::String, vec, vec::Vec};
    use core::mem::{offset_of, size_of};

    use super::*;

    type VtableRef = &'static AttachmentVtable;

    #[repr(align(64))]
    struct CacheLine(#[allow(dead_code)] u8);

    #[test]
    fn test_vtable_leads_every_cell() {
        assert_eq!(offset_of!(AttachmentData<()>, vtable), 0);
        assert_eq!(offset_of!(AttachmentData<u16>, vtable), 0);
        assert_eq!(offset_of!(AttachmentData<String>, vtable), 0);
        assert_eq!(offset_of!(AttachmentData<CacheLine>, vtable), 0);
    }

    #[test]
    fn test_value_follows_vtable() {
        assert!(offset_of!(AttachmentData<u16>, value) >= size_of::<VtableRef>());
        assert!(offset_of!(AttachmentData<Vec<u8>>, value) >= size_of::<VtableRef>());
        assert_eq!(offset_of!(AttachmentData<CacheLine>, value), 64);
    }

    #[test]
    fn test_cell_gives_back_its_value() {
        let cell = AttachmentData::new(vec![String::from("ember"), String::from("frost")]);
        assert_eq!(cell.into_attachment(), ["ember", "frost"]);
    }
}

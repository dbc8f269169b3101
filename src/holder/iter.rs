use alloc::boxed::Box;
use core::iter::FusedIterator;

use hashbrown::hash_map::Values;

use crate::{
    attachment_type::{AttachmentKey, ErasedAttachmentType},
    holder::map::Slot,
};

/// An iterator over the attachment types populated in an
/// [`AttachmentMap`](crate::holder::AttachmentMap).
///
/// Created by [`AttachmentMap::types`](crate::holder::AttachmentMap::types).
#[must_use]
pub struct Types<'a> {
    iter: Values<'a, AttachmentKey, Slot>,
}

impl<'a> Types<'a> {
    pub(super) fn new(iter: Values<'a, AttachmentKey, Slot>) -> Self {
        Self { iter }
    }
}

impl<'a> Iterator for Types<'a> {
    type Item = &'a ErasedAttachmentType;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|slot| &slot.attachment_type)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl ExactSizeIterator for Types<'_> {
    fn len(&self) -> usize {
        self.iter.len()
    }
}

impl FusedIterator for Types<'_> {}

impl core::fmt::Debug for Types<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Types")
            .field("remaining", &self.iter.len())
            .finish()
    }
}

/// The lazily produced sequence of attachment types a holder carries.
///
/// Returned by
/// [`AttachmentHolder::existing_types`](crate::holder::AttachmentHolder::existing_types).
/// Holders that keep their attachments in several places can chain their
/// sources into a single sequence with [`ExistingTypes::new`].
#[must_use]
pub struct ExistingTypes<'a> {
    iter: Box<dyn Iterator<Item = ErasedAttachmentType> + 'a>,
}

impl<'a> ExistingTypes<'a> {
    /// Wraps any iterator of attachment types.
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = ErasedAttachmentType> + 'a,
    {
        Self {
            iter: Box::new(iter),
        }
    }

    /// A sequence without any types.
    pub fn empty() -> Self {
        Self::new(core::iter::empty())
    }
}

impl Iterator for ExistingTypes<'_> {
    type Item = ErasedAttachmentType;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl core::fmt::Debug for ExistingTypes<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ExistingTypes").finish_non_exhaustive()
    }
}

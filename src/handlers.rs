//! Copy handlers decide how an attachment value is carried over to a new
//! holder.
//!
//! # What Are Copy Handlers?
//!
//! A copy handler is the type-specific logic that turns the value an old
//! holder carries into the value its successor should carry. Each
//! [`AttachmentType`](crate::attachment_type::AttachmentType) has at most one.
//! A handler receives:
//! - the source value,
//! - the destination holder, so it can inspect what the successor already
//!   carries,
//! - the [`CopyContext`], so it can resolve registry objects in the
//!   destination's world.
//!
//! It answers in one of three ways:
//! - `Ok(Some(copy))`: install `copy` on the destination,
//! - `Ok(None)`: do not carry this value over (a veto),
//! - `Err(report)`: something is wrong; the propagation is aborted.
//!
//! The returned copy must be independent of the source value. Sharing state
//! between the two through interior mutability defeats the purpose.
//!
//! # Built-in Handlers
//!
//! - [`CloneCopy`]: copies with [`Clone`]. Also available as
//!   [`AttachmentTypeBuilder::copy_with_clone`].
//! - [`NeverCopy`]: always vetoes.
//!
//! Closures with the right signature are handlers too, see
//! [`AttachmentTypeBuilder::copy_handler`].
//!
//! [`AttachmentTypeBuilder::copy_with_clone`]: crate::attachment_type::AttachmentTypeBuilder::copy_with_clone
//! [`AttachmentTypeBuilder::copy_handler`]: crate::attachment_type::AttachmentTypeBuilder::copy_handler

use rootcause::Report;

use crate::{context::CopyContext, holder::AttachmentHolder};

/// Type-specific logic that produces an independent copy of an attachment
/// value for a new holder.
///
/// # Examples
///
/// A handler that only carries a value over when the destination does not
/// already have a bigger one:
///
/// ```
/// use carryover::{handlers::CopyHandler, prelude::*};
///
/// struct KeepLargest {
///     attachment_type: AttachmentType<u64>,
/// }
///
/// impl CopyHandler<u64> for KeepLargest {
///     fn copy(
///         &self,
///         value: &u64,
///         destination: &dyn AttachmentHolder,
///         _context: &CopyContext<'_>,
///     ) -> Result<Option<u64>, Report> {
///         match destination.get_data(&self.attachment_type) {
///             Some(existing) if existing >= value => Ok(None),
///             _ => Ok(Some(*value)),
///         }
///     }
/// }
/// ```
pub trait CopyHandler<T>: Send + Sync + 'static {
    /// Produces a copy of `value` for `destination`, or `None` to veto the
    /// copy.
    fn copy(
        &self,
        value: &T,
        destination: &dyn AttachmentHolder,
        context: &CopyContext<'_>,
    ) -> Result<Option<T>, Report>;
}

impl<T, F> CopyHandler<T> for F
where
    F: Fn(&T, &dyn AttachmentHolder, &CopyContext<'_>) -> Result<Option<T>, Report>
        + Send
        + Sync
        + 'static,
{
    #[inline]
    fn copy(
        &self,
        value: &T,
        destination: &dyn AttachmentHolder,
        context: &CopyContext<'_>,
    ) -> Result<Option<T>, Report> {
        self(value, destination, context)
    }
}

/// Handler that copies values with [`Clone`].
///
/// # Example
///
/// ```
/// use carryover::{handlers::CloneCopy, prelude::*};
///
/// let titles: AttachmentType<Vec<String>> = AttachmentType::builder("social:titles")
///     .copy_handler_with(CloneCopy)
///     .build();
/// # assert!(titles.has_copy_handler());
/// ```
#[derive(Copy, Clone, Debug, Default)]
pub struct CloneCopy;

impl<T: Clone + Send + Sync + 'static> CopyHandler<T> for CloneCopy {
    #[inline]
    fn copy(
        &self,
        value: &T,
        _destination: &dyn AttachmentHolder,
        _context: &CopyContext<'_>,
    ) -> Result<Option<T>, Report> {
        Ok(Some(value.clone()))
    }
}

/// Handler that never copies anything.
///
/// Useful for types that need a codec for other reasons but must never
/// survive into a successor holder.
#[derive(Copy, Clone, Debug, Default)]
pub struct NeverCopy;

impl<T: 'static> CopyHandler<T> for NeverCopy {
    #[inline]
    fn copy(
        &self,
        _value: &T,
        _destination: &dyn AttachmentHolder,
        _context: &CopyContext<'_>,
    ) -> Result<Option<T>, Report> {
        Ok(None)
    }
}

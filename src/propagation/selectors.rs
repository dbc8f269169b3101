//! Standard selector policies.
//!
//! A selector decides, per attachment type, whether a propagation call should
//! consider it. Selectors only run for transferable types (those with a
//! codec); the engine skips everything else before a selector is consulted.

use crate::attachment_type::ErasedAttachmentType;

/// Why a holder is being replaced by its successor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RemovalReason {
    /// The holder died, for example a player that is respawning.
    Death,
    /// The holder is being converted into a different kind of holder, for
    /// example a zombie villager being cured.
    Conversion,
    /// The holder moves somewhere else alive, for example through a portal.
    Transfer,
}

impl RemovalReason {
    /// Whether only types flagged copy-on-death survive this removal.
    ///
    /// Conversions count as death: the old holder is discarded and only data
    /// meant to survive it is carried over.
    #[must_use]
    pub const fn is_death(self) -> bool {
        matches!(self, Self::Death | Self::Conversion)
    }
}

/// A selector that accepts every attachment type.
///
/// Used for structural promotions, where the successor is the same logical
/// object in a new form (a proto-chunk becoming a full chunk, for instance).
pub fn unconditional() -> impl Fn(&ErasedAttachmentType) -> bool + Copy {
    |_| true
}

/// A selector for replacing a holder that is being removed for `reason`.
///
/// If the removal counts as death only types flagged copy-on-death are
/// accepted; otherwise every type is.
///
/// # Examples
///
/// ```
/// use carryover::{prelude::*, propagation::selectors};
///
/// let soul: AttachmentType<u32> = AttachmentType::builder("magic:soul")
///     .copy_on_death()
///     .build();
/// let rage: AttachmentType<u32> = AttachmentType::builder("combat:rage").build();
///
/// let on_death = selectors::on_removal(RemovalReason::Death);
/// assert!(on_death(&soul.erased()));
/// assert!(!on_death(&rage.erased()));
///
/// let on_transfer = selectors::on_removal(RemovalReason::Transfer);
/// assert!(on_transfer(&rage.erased()));
/// ```
pub fn on_removal(reason: RemovalReason) -> impl Fn(&ErasedAttachmentType) -> bool + Copy {
    let is_death = reason.is_death();
    move |attachment_type| !is_death || attachment_type.copy_on_death()
}

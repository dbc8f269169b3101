//! The propagation engine.
//!
//! When an object's identity continues in a new object (a player respawning,
//! a mob converting into another kind of mob, a proto-chunk promoted to a full
//! chunk), the attachments of the old holder are carried over to the new one
//! by [`propagate`].
//!
//! A call considers every attachment type populated on the source, in a
//! snapshot taken before anything is copied, and for each type:
//!
//! 1. skips it if the type has no codec, since such data is never transferable,
//! 2. skips it if the selector rejects it,
//! 3. asks the type's copy handler for an independent copy,
//! 4. installs the copy on the destination, unless the handler vetoed it.
//!
//! A failing copy handler aborts the call. Copies installed before the failure
//! stay on the destination.
//!
//! The [`copy_on_promotion`] and [`copy_on_replacement`] triggers wrap
//! [`propagate`] with the standard [selectors].

pub mod selectors;

use indexmap::IndexSet;
use rootcause::Report;
use rustc_hash::FxBuildHasher;
use tracing::{debug, trace, warn};

use self::selectors::RemovalReason;
use crate::{
    attachment_type::{AttachmentKey, ErasedAttachmentType},
    context::CopyContext,
    holder::AttachmentHolder,
};

/// The set of types a propagation call works through, fixed before the first
/// copy is made.
type Snapshot = IndexSet<ErasedAttachmentType, FxBuildHasher>;

/// The ways a propagation call can fail.
#[derive(Clone, PartialEq, Eq)]
pub enum PropagationError {
    /// The copy handler of the attachment type failed. The handler's report is
    /// attached as the child of the returned report.
    CopyFailed {
        /// The key of the attachment type whose handler failed.
        key: AttachmentKey,
    },
    /// The source listed an attachment type among its existing types but did
    /// not hold a value for it.
    MissingSource {
        /// The key of the attachment type without a value.
        key: AttachmentKey,
    },
}

impl PropagationError {
    /// The key of the attachment type the error is about.
    #[must_use]
    pub fn key(&self) -> &AttachmentKey {
        match self {
            Self::CopyFailed { key } | Self::MissingSource { key } => key,
        }
    }
}

impl core::fmt::Debug for PropagationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::CopyFailed { key } => f.debug_struct("CopyFailed").field("key", key).finish(),
            Self::MissingSource { key } => {
                f.debug_struct("MissingSource").field("key", key).finish()
            }
        }
    }
}

impl core::fmt::Display for PropagationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::CopyFailed { key } => {
                write!(f, "failed to copy attachment `{key}` to the destination holder")
            }
            Self::MissingSource { key } => write!(
                f,
                "source holder lists attachment `{key}` but holds no value for it"
            ),
        }
    }
}

impl core::error::Error for PropagationError {}

/// What a single propagation call did, per attachment type of the snapshot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PropagationOutcome {
    /// Types whose copy was installed on the destination.
    pub installed: usize,
    /// Types whose copy handler declined to copy the value.
    pub vetoed: usize,
    /// Transferable types rejected by the selector.
    pub filtered: usize,
    /// Types skipped because they have no codec.
    pub non_transferable: usize,
}

impl PropagationOutcome {
    /// The number of types the call looked at.
    #[must_use]
    pub fn considered(&self) -> usize {
        self.installed + self.vetoed + self.filtered + self.non_transferable
    }
}

/// Copies the attachments of `source` that `selector` accepts onto
/// `destination`.
///
/// Values already on the destination are left alone unless the source carries
/// a copy of the same type, in which case they are overwritten.
///
/// # Errors
///
/// - [`PropagationError::CopyFailed`] if a copy handler fails. Copies made
///   earlier in the same call are kept on the destination, and the remaining
///   types are not processed.
/// - [`PropagationError::MissingSource`] if the source lists a type it holds
///   no value for.
///
/// # Examples
///
/// ```
/// use carryover::{prelude::*, propagation::selectors};
///
/// let xp: AttachmentType<u32> = AttachmentType::builder("player:xp")
///     .codec(FnCodec::new(
///         |xp: &u32| Ok(xp.to_le_bytes().to_vec()),
///         |bytes: &[u8]| Ok(u32::from_le_bytes(bytes.try_into()?)),
///     ))
///     .build();
///
/// let mut old_player = AttachmentMap::new();
/// old_player.set_data(&xp, 1200);
/// let mut new_player = AttachmentMap::new();
///
/// propagate(
///     &CopyContext::empty(),
///     &old_player,
///     &mut new_player,
///     selectors::unconditional(),
/// )?;
/// assert_eq!(new_player.get_data(&xp), Some(&1200));
/// # Ok::<(), Report<carryover::propagation::PropagationError>>(())
/// ```
pub fn propagate<F>(
    context: &CopyContext<'_>,
    source: &dyn AttachmentHolder,
    destination: &mut dyn AttachmentHolder,
    selector: F,
) -> Result<(), Report<PropagationError>>
where
    F: Fn(&ErasedAttachmentType) -> bool,
{
    propagate_with_outcome(context, source, destination, selector)?;
    Ok(())
}

/// Like [`propagate`], but reports what the call did.
///
/// # Errors
///
/// See [`propagate`].
pub fn propagate_with_outcome<F>(
    context: &CopyContext<'_>,
    source: &dyn AttachmentHolder,
    destination: &mut dyn AttachmentHolder,
    selector: F,
) -> Result<PropagationOutcome, Report<PropagationError>>
where
    F: Fn(&ErasedAttachmentType) -> bool,
{
    let mut outcome = PropagationOutcome::default();
    if !source.has_attachments() {
        trace!("source holder carries no attachments");
        return Ok(outcome);
    }

    let snapshot: Snapshot = source.existing_types().collect();

    for attachment_type in &snapshot {
        if !attachment_type.has_codec() {
            trace!(attachment = %attachment_type, "skipping attachment without codec");
            outcome.non_transferable += 1;
            continue;
        }

        if !selector(attachment_type) {
            trace!(attachment = %attachment_type, "skipping attachment rejected by selector");
            outcome.filtered += 1;
            continue;
        }

        let Some(value) = source.get_attachment(attachment_type.key()) else {
            return Err(Report::new(PropagationError::MissingSource {
                key: attachment_type.key().clone(),
            }));
        };

        let copy = match attachment_type.copy_raw(value.raw(), &*destination, context) {
            Ok(copy) => copy,
            Err(report) => {
                warn!(
                    attachment = %attachment_type,
                    installed = outcome.installed,
                    "copy handler failed, aborting propagation"
                );
                return Err(report.context(PropagationError::CopyFailed {
                    key: attachment_type.key().clone(),
                }));
            }
        };

        match copy {
            Some(copy) => {
                destination
                    .attachments_mut()
                    .install_raw(attachment_type, copy);
                debug!(attachment = %attachment_type, "installed attachment copy");
                outcome.installed += 1;
            }
            None => {
                trace!(attachment = %attachment_type, "copy handler vetoed attachment");
                outcome.vetoed += 1;
            }
        }
    }

    debug!(
        installed = outcome.installed,
        vetoed = outcome.vetoed,
        filtered = outcome.filtered,
        non_transferable = outcome.non_transferable,
        "propagation finished"
    );
    Ok(outcome)
}

/// Carries every transferable attachment of `from` over to `to`.
///
/// Used when a holder is promoted to a new form that continues it, such as a
/// proto-chunk becoming a full chunk.
///
/// # Errors
///
/// See [`propagate`].
pub fn copy_on_promotion(
    context: &CopyContext<'_>,
    from: &dyn AttachmentHolder,
    to: &mut dyn AttachmentHolder,
) -> Result<(), Report<PropagationError>> {
    propagate(context, from, to, selectors::unconditional())
}

/// Carries the attachments of `from` over to its replacement `to`.
///
/// When `reason` counts as death only types flagged copy-on-death are carried
/// over; otherwise every transferable type is.
///
/// # Errors
///
/// See [`propagate`].
pub fn copy_on_replacement(
    context: &CopyContext<'_>,
    from: &dyn AttachmentHolder,
    to: &mut dyn AttachmentHolder,
    reason: RemovalReason,
) -> Result<(), Report<PropagationError>> {
    propagate(context, from, to, selectors::on_removal(reason))
}

#[cfg(test)]
mod tests {
    use alloc::{string::String, vec, vec::Vec};

    use rootcause::report;

    use super::*;
    use crate::{
        attachment_type::AttachmentType,
        codec::FnCodec,
        holder::{AttachmentHolderExt, AttachmentMap, AttachmentRef, ExistingTypes},
    };

    fn u32_codec() -> FnCodec<u32> {
        FnCodec::new(
            |value: &u32| Ok(value.to_le_bytes().to_vec()),
            |bytes: &[u8]| Ok(u32::from_le_bytes(bytes.try_into()?)),
        )
    }

    fn transferable(name: &'static str) -> AttachmentType<u32> {
        AttachmentType::builder(name).codec(u32_codec()).build()
    }

    #[test]
    fn test_empty_source_is_noop() {
        let source = AttachmentMap::new();
        let mut destination = AttachmentMap::new();
        let kept = transferable("test:kept");
        destination.set_data(&kept, 3);

        let outcome = propagate_with_outcome(
            &CopyContext::empty(),
            &source,
            &mut destination,
            |_| panic!("selector must not run for an empty source"),
        )
        .unwrap();

        assert_eq!(outcome, PropagationOutcome::default());
        assert_eq!(destination.len(), 1);
        assert_eq!(destination.get(&kept), Some(&3));
    }

    #[test]
    fn test_codec_gate_precedes_selector() {
        let local: AttachmentType<u32> = AttachmentType::builder("test:local")
            .copy_handler(|value: &u32, _, _| Ok(Some(*value)))
            .build();
        let mut source = AttachmentMap::new();
        source.set_data(&local, 1);
        let mut destination = AttachmentMap::new();

        let outcome = propagate_with_outcome(
            &CopyContext::empty(),
            &source,
            &mut destination,
            |_| panic!("selector must not see types without a codec"),
        )
        .unwrap();

        assert_eq!(outcome.non_transferable, 1);
        assert!(destination.is_empty());
    }

    #[test]
    fn test_outcome_counts() {
        let copied = transferable("test:copied");
        let filtered = transferable("test:filtered");
        let vetoed: AttachmentType<u32> = AttachmentType::builder("test:vetoed")
            .codec(u32_codec())
            .copy_handler(|_: &u32, _, _| Ok(None))
            .build();
        let local: AttachmentType<u32> = AttachmentType::builder("test:local").build();

        let mut source = AttachmentMap::new();
        for ty in [&copied, &filtered, &vetoed, &local] {
            source.set_data(ty, 1);
        }
        let mut destination = AttachmentMap::new();

        let outcome = propagate_with_outcome(
            &CopyContext::empty(),
            &source,
            &mut destination,
            |ty| !ty.is(&filtered),
        )
        .unwrap();

        assert_eq!(
            outcome,
            PropagationOutcome {
                installed: 1,
                vetoed: 1,
                filtered: 1,
                non_transferable: 1,
            }
        );
        assert_eq!(outcome.considered(), 4);
        assert_eq!(destination.get(&copied), Some(&1));
        assert_eq!(destination.len(), 1);
    }

    #[test]
    fn test_handler_failure_is_wrapped() {
        let failing: AttachmentType<u32> = AttachmentType::builder("test:failing")
            .codec(u32_codec())
            .copy_handler(|_: &u32, _, _| Err(report!("registry entry vanished")))
            .build();
        let mut source = AttachmentMap::new();
        source.set_data(&failing, 1);
        let mut destination = AttachmentMap::new();

        let report =
            copy_on_promotion(&CopyContext::empty(), &source, &mut destination).unwrap_err();

        assert_eq!(
            report.current_context(),
            &PropagationError::CopyFailed {
                key: failing.key().clone()
            }
        );
        assert_eq!(report.children().len(), 1);
        assert!(destination.is_empty());
    }

    /// A holder that lists a type it does not hold.
    struct Lying {
        attachments: AttachmentMap,
        phantom: ErasedAttachmentType,
    }

    impl AttachmentHolder for Lying {
        fn has_attachments(&self) -> bool {
            true
        }

        fn existing_types(&self) -> ExistingTypes<'_> {
            ExistingTypes::new(
                self.attachments
                    .existing_types()
                    .chain(core::iter::once(self.phantom.clone())),
            )
        }

        fn get_attachment(&self, key: &AttachmentKey) -> Option<AttachmentRef<'_>> {
            self.attachments.get_attachment(key)
        }

        fn attachments_mut(&mut self) -> &mut AttachmentMap {
            &mut self.attachments
        }
    }

    #[test]
    fn test_missing_source_value() {
        let phantom = transferable("test:phantom");
        let source = Lying {
            attachments: AttachmentMap::new(),
            phantom: phantom.erased(),
        };
        let mut destination = AttachmentMap::new();

        let report =
            copy_on_promotion(&CopyContext::empty(), &source, &mut destination).unwrap_err();
        assert_eq!(report.current_context().key(), phantom.key());
        assert!(matches!(
            report.current_context(),
            PropagationError::MissingSource { .. }
        ));
    }

    #[test]
    fn test_duplicate_listed_types_are_copied_once() {
        let counted: AttachmentType<Vec<String>> = AttachmentType::builder("test:counted")
            .codec(FnCodec::new(
                |_: &Vec<String>| Ok(Vec::new()),
                |_: &[u8]| Ok(Vec::new()),
            ))
            .copy_handler(|value: &Vec<String>, destination: &dyn AttachmentHolder, _| {
                assert!(!destination.has_attachments(), "copied twice");
                Ok(Some(value.clone()))
            })
            .build();
        let mut inner = AttachmentMap::new();
        inner.set_data(&counted, vec![String::from("a")]);
        let source = Lying {
            attachments: inner,
            phantom: counted.erased(),
        };
        let mut destination = AttachmentMap::new();

        let outcome =
            propagate_with_outcome(&CopyContext::empty(), &source, &mut destination, |_| true)
                .unwrap();
        assert_eq!(outcome.installed, 1);
    }

    #[test]
    fn test_error_display() {
        let ty = transferable("test:display");
        let error = PropagationError::CopyFailed {
            key: ty.key().clone(),
        };
        assert_eq!(
            alloc::format!("{error}"),
            "failed to copy attachment `test:display` to the destination holder"
        );
    }
}

#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Typed per-object attachments that carry over when an object's identity
//! continues in another object.
//!
//! ## Overview
//!
//! Game objects such as players, mobs, chunks and levels often need to carry
//! extra data that the object itself knows nothing about: the mana of a
//! player, the pollution level of a chunk. This crate lets any object carry
//! such data as typed, keyed *attachments*, and carries those attachments over
//! when the object is replaced by a successor that continues its identity: a
//! respawned player, a cured zombie villager, a proto-chunk promoted to a full
//! chunk.
//!
//! The pieces:
//!
//! - [`AttachmentType<T>`](attachment_type::AttachmentType) describes a
//!   category of attachment data. Whether it has a
//!   [codec](codec::AttachmentCodec) decides whether it is transferable at
//!   all; its copy-on-death flag decides whether it survives the death of its
//!   holder; its [copy handler](handlers::CopyHandler) produces the copy.
//! - An [`AttachmentHolder`](holder::AttachmentHolder) is any object carrying
//!   attachments, usually by embedding an
//!   [`AttachmentMap`](holder::AttachmentMap).
//! - [`propagate`](propagation::propagate) copies the attachments a selector
//!   accepts from a source holder to a destination holder. The
//!   [`copy_on_promotion`](propagation::copy_on_promotion) and
//!   [`copy_on_replacement`](propagation::copy_on_replacement) triggers wrap it
//!   with the standard selectors.
//! - The [`AttachmentRegistry`](registry::AttachmentRegistry) registers each
//!   type once under a unique name.
//!
//! ## Example
//!
//! ```
//! use carryover::prelude::*;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Mana(u32);
//!
//! fn mana_codec() -> FnCodec<Mana> {
//!     FnCodec::new(
//!         |mana: &Mana| Ok(mana.0.to_le_bytes().to_vec()),
//!         |bytes: &[u8]| Ok(Mana(u32::from_le_bytes(bytes.try_into()?))),
//!     )
//! }
//!
//! // Survives death.
//! let mana: AttachmentType<Mana> = AttachmentType::builder("magic:mana")
//!     .codec(mana_codec())
//!     .copy_on_death()
//!     .build();
//!
//! // Transferable, but lost on death.
//! let rage: AttachmentType<u32> = AttachmentType::builder("combat:rage")
//!     .codec(FnCodec::new(
//!         |rage: &u32| Ok(rage.to_le_bytes().to_vec()),
//!         |bytes: &[u8]| Ok(u32::from_le_bytes(bytes.try_into()?)),
//!     ))
//!     .build();
//!
//! let mut dead_player = AttachmentMap::new();
//! dead_player.set_data(&mana, Mana(40));
//! dead_player.set_data(&rage, 7);
//!
//! let mut respawned = AttachmentMap::new();
//! copy_on_replacement(
//!     &CopyContext::empty(),
//!     &dead_player,
//!     &mut respawned,
//!     RemovalReason::Death,
//! )?;
//!
//! assert_eq!(respawned.get_data(&mana), Some(&Mana(40)));
//! assert!(!respawned.has_data(&rage));
//! # Ok::<(), Report<carryover::propagation::PropagationError>>(())
//! ```
//!
//! ## Logging
//!
//! The propagation engine and the registry emit [`tracing`] events. Skipped
//! types are logged at `TRACE`, installed copies and per-call summaries at
//! `DEBUG`, and failing copy handlers at `WARN`. No subscriber is installed by
//! this crate.
//!
//! ## Features
//!
//! - `std`: uses `std::sync::RwLock` for the registry instead of a spin lock.
//!
//! [`tracing`]: https://docs.rs/tracing

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod attachment_type;
pub mod codec;
pub mod context;
pub mod handlers;
pub mod holder;
pub mod prelude;
pub mod propagation;
pub mod registry;

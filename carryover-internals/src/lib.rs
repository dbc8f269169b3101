#![no_std]
#![forbid(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::missing_docs_in_private_items,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
#![allow(rustdoc::private_intra_doc_links)]
//! Internal implementation crate for [`carryover`].
//!
//! # Overview
//!
//! This crate contains the low-level, type-erased attachment cell that the
//! [`carryover`] attachment map stores. A holder keeps values of many
//! different types side by side under their attachment keys; this crate is
//! what lets it do so without a `Box<dyn Any>` per value and without ever
//! handing out an unchecked cast.
//!
//! **This crate is an implementation detail.** No semantic versioning guarantees
//! are provided. Users should depend on the [`carryover`] crate, not this one.
//!
//! # Architecture
//!
//! - [`RawAttachment`]: Owned attachment value with [`Box`]-based allocation
//! - [`RawAttachmentRef`]: Shared borrow of an attachment value
//! - [`RawAttachmentMut`]: Exclusive borrow of an attachment value
//! - [`AttachmentData`]: `#[repr(C)]` wrapper enabling field access on erased
//!   types
//! - [`AttachmentVtable`]: Function pointers for type-erased dispatch
//!
//! # Safety Strategy
//!
//! When we erase `AttachmentData<Mana>` to `AttachmentData<Erased>`, the
//! vtable function pointers must still match the concrete type in memory.
//! This crate keeps that true through:
//!
//! - **Module-based encapsulation**: Safety-critical types keep fields
//!   module-private, making invariants locally verifiable within a single file
//! - **`#[repr(C)]` layout**: Enables safe field projection on type-erased
//!   pointers without constructing invalid references
//! - **Checked downcasts**: Every public downcast compares [`TypeId`]s before
//!   casting; the unchecked variants are `unsafe` and documented
//!
//! [`carryover`]: https://docs.rs/carryover/latest/carryover/
//! [`AttachmentData`]: attachment::data::AttachmentData
//! [`AttachmentVtable`]: attachment::vtable::AttachmentVtable
//! [`Box`]: alloc::boxed::Box
//! [`TypeId`]: core::any::TypeId

extern crate alloc;

mod attachment;
mod util;

pub use attachment::{RawAttachment, RawAttachmentMut, RawAttachmentRef};

//! Commonly used items for convenient importing.
//!
//! ```rust
//! use carryover::prelude::*;
//!
//! let title: AttachmentType<String> = AttachmentType::builder("social:title")
//!     .copy_with_clone()
//!     .build();
//!
//! let mut holder = AttachmentMap::new();
//! holder.set_data(&title, String::from("Baron"));
//! assert_eq!(holder.get_data(&title).map(String::as_str), Some("Baron"));
//! ```
//!
//! # What's Included
//!
//! - **[`AttachmentType`]**, **[`AttachmentKey`]** and
//!   **[`ErasedAttachmentType`]**: attachment type descriptors
//! - **[`AttachmentHolder`]** and **[`AttachmentHolderExt`]**: the holder
//!   capability and its typed accessors
//! - **[`AttachmentMap`]**: attachment storage
//! - **[`CopyContext`]** and **[`FnCodec`]**
//! - **[`propagate`]**, **[`copy_on_promotion`]**, **[`copy_on_replacement`]**
//!   and **[`RemovalReason`]**: the propagation engine and its triggers
//! - **[`Report`]**, **[`report!`]** and **[`bail!`]** from `rootcause`, for
//!   writing codecs and copy handlers

pub use rootcause::{Report, bail, report};

pub use crate::{
    attachment_type::{AttachmentKey, AttachmentType, ErasedAttachmentType},
    codec::FnCodec,
    context::CopyContext,
    holder::{AttachmentHolder, AttachmentHolderExt, AttachmentMap},
    propagation::{copy_on_promotion, copy_on_replacement, propagate, selectors::RemovalReason},
};

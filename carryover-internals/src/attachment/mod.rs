//! Module containing the type-erased attachment cell

mod data;
mod raw;
mod vtable;

pub use self::raw::{RawAttachment, RawAttachmentMut, RawAttachmentRef};

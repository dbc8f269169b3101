//! Internal utility types.

/// Marker type used when type-erasing attachments.
///
/// This zero-sized type serves as a placeholder in generic type parameters
/// when the actual concrete type has been erased. For example,
/// `AttachmentData<Erased>` represents an attachment whose concrete type
/// is unknown at the current scope.
pub(crate) struct Erased;

use alloc::borrow::Cow;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Source of process-unique attachment key ids.
static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// The unique identity of an attachment type.
///
/// Every call to [`AttachmentType::builder`] allocates a fresh id, so two
/// attachment types never share a key even when they were given the same
/// name. Equality, ordering and hashing only look at the id; the name is kept
/// for display and for lookups through the
/// [`AttachmentRegistry`](crate::registry::AttachmentRegistry).
///
/// [`AttachmentType::builder`]: crate::attachment_type::AttachmentType::builder
#[derive(Clone)]
pub struct AttachmentKey {
    id: usize,
    name: Cow<'static, str>,
}

impl AttachmentKey {
    pub(crate) fn allocate(name: Cow<'static, str>) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            name,
        }
    }

    /// The name the attachment type was built with, such as `"magic:mana"`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The process-unique numeric id of this key.
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }
}

impl PartialEq for AttachmentKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AttachmentKey {}

impl PartialOrd for AttachmentKey {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AttachmentKey {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl core::hash::Hash for AttachmentKey {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl core::fmt::Display for AttachmentKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

impl core::fmt::Debug for AttachmentKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

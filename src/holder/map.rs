use carryover_internals::RawAttachment;
use hashbrown::{HashMap, hash_map::Entry};
use rustc_hash::FxBuildHasher;

use crate::{
    attachment_type::{AttachmentKey, AttachmentType, ErasedAttachmentType},
    holder::{AttachmentHolder, AttachmentRef, ExistingTypes, Types},
};

/// One populated attachment: the value together with the type it is stored
/// under.
pub(super) struct Slot {
    pub(super) attachment_type: ErasedAttachmentType,
    pub(super) value: RawAttachment,
}

impl Slot {
    fn new<T: Send + Sync + 'static>(attachment_type: &AttachmentType<T>, value: T) -> Self {
        Self {
            attachment_type: attachment_type.erased(),
            value: RawAttachment::new(value),
        }
    }
}

/// Storage for the attachments of a single holder.
///
/// At most one value is stored per attachment type. The map is itself an
/// [`AttachmentHolder`], and domain objects usually embed one and delegate to
/// it.
///
/// # Examples
///
/// ```
/// use carryover::prelude::*;
///
/// let hunger: AttachmentType<u32> = AttachmentType::builder("survival:hunger")
///     .default_value(|| 20)
///     .build();
///
/// let mut attachments = AttachmentMap::new();
/// assert!(attachments.get(&hunger).is_none());
///
/// *attachments.get_or_insert_default(&hunger).unwrap() -= 3;
/// assert_eq!(attachments.get(&hunger), Some(&17));
///
/// assert_eq!(attachments.insert(&hunger, 5), Some(17));
/// assert_eq!(attachments.remove(&hunger), Some(5));
/// assert!(attachments.is_empty());
/// ```
#[derive(Default)]
pub struct AttachmentMap {
    slots: HashMap<AttachmentKey, Slot, FxBuildHasher>,
}

impl AttachmentMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the map holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The number of populated attachment types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether a value is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &AttachmentKey) -> bool {
        self.slots.contains_key(key)
    }

    /// The value of `attachment_type`, if present.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self, attachment_type: &AttachmentType<T>) -> Option<&T> {
        self.slots
            .get(attachment_type.key())?
            .value
            .as_ref()
            .downcast::<T>()
    }

    /// Mutable access to the value of `attachment_type`, if present.
    #[must_use]
    pub fn get_mut<T: Send + Sync + 'static>(
        &mut self,
        attachment_type: &AttachmentType<T>,
    ) -> Option<&mut T> {
        self.slots
            .get_mut(attachment_type.key())?
            .value
            .as_mut()
            .downcast_mut::<T>()
    }

    /// Stores `value` under `attachment_type`, returning the value it
    /// replaces.
    pub fn insert<T: Send + Sync + 'static>(
        &mut self,
        attachment_type: &AttachmentType<T>,
        value: T,
    ) -> Option<T> {
        let previous = self.slots.insert(
            attachment_type.key().clone(),
            Slot::new(attachment_type, value),
        )?;
        previous.value.into_inner::<T>().ok()
    }

    /// Removes the value of `attachment_type`, returning it.
    pub fn remove<T: Send + Sync + 'static>(
        &mut self,
        attachment_type: &AttachmentType<T>,
    ) -> Option<T> {
        let slot = self.slots.remove(attachment_type.key())?;
        slot.value.into_inner::<T>().ok()
    }

    /// Mutable access to the value of `attachment_type`, materializing it from
    /// the type's default supplier when absent.
    ///
    /// Returns `None` when the value is absent and the type has no default
    /// supplier; the map is left unchanged in that case.
    pub fn get_or_insert_default<T: Send + Sync + 'static>(
        &mut self,
        attachment_type: &AttachmentType<T>,
    ) -> Option<&mut T> {
        let slot = match self.slots.entry(attachment_type.key().clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let value = attachment_type.create_default()?;
                entry.insert(Slot::new(attachment_type, value))
            }
        };
        slot.value.as_mut().downcast_mut::<T>()
    }

    /// The attachment types currently populated, in no particular order.
    pub fn types(&self) -> Types<'_> {
        Types::new(self.slots.values())
    }

    /// Removes every value.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Installs an already erased value, overwriting any value of the same
    /// type.
    pub(crate) fn install_raw(
        &mut self,
        attachment_type: &ErasedAttachmentType,
        value: RawAttachment,
    ) -> Option<RawAttachment> {
        debug_assert_eq!(
            value.as_ref().attachment_type_id(),
            attachment_type.value_type_id()
        );

        let slot = Slot {
            attachment_type: attachment_type.clone(),
            value,
        };
        self.slots
            .insert(attachment_type.key().clone(), slot)
            .map(|previous| previous.value)
    }
}

impl AttachmentHolder for AttachmentMap {
    fn has_attachments(&self) -> bool {
        !self.is_empty()
    }

    fn existing_types(&self) -> ExistingTypes<'_> {
        ExistingTypes::new(self.types().cloned())
    }

    fn get_attachment(&self, key: &AttachmentKey) -> Option<AttachmentRef<'_>> {
        let slot = self.slots.get(key)?;
        Some(AttachmentRef::new(&slot.attachment_type, slot.value.as_ref()))
    }

    fn attachments_mut(&mut self) -> &mut AttachmentMap {
        self
    }
}

impl core::fmt::Debug for AttachmentMap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map()
            .entries(
                self.slots
                    .iter()
                    .map(|(key, slot)| (key, slot.value.as_ref().attachment_type_name())),
            )
            .finish()
    }
}

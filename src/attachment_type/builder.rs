use alloc::{borrow::Cow, boxed::Box};

use rootcause::Report;

use crate::{
    attachment_type::{AttachmentKey, AttachmentType, DefaultSupplier, TypeData},
    codec::AttachmentCodec,
    context::CopyContext,
    handlers::{CloneCopy, CopyHandler},
    holder::AttachmentHolder,
};

/// Builder for [`AttachmentType`].
///
/// Created with [`AttachmentType::builder`]; finished with
/// [`build`](Self::build).
#[must_use]
pub struct AttachmentTypeBuilder<T: 'static> {
    name: Cow<'static, str>,
    codec: Option<Box<dyn AttachmentCodec<T>>>,
    copy_on_death: bool,
    copy_handler: Option<Box<dyn CopyHandler<T>>>,
    default_value: Option<DefaultSupplier<T>>,
}

impl<T: Send + Sync + 'static> AttachmentTypeBuilder<T> {
    pub(super) fn new(name: Cow<'static, str>) -> Self {
        Self {
            name,
            codec: None,
            copy_on_death: false,
            copy_handler: None,
            default_value: None,
        }
    }

    /// Sets the codec of the attachment type.
    ///
    /// Only types with a codec are ever propagated to another holder. Unless
    /// an explicit copy handler is set, the codec also provides the copy
    /// handler: values are copied by encoding and decoding them.
    pub fn codec<C>(mut self, codec: C) -> Self
    where
        C: AttachmentCodec<T>,
    {
        self.codec = Some(Box::new(codec));
        self
    }

    /// Marks the attachment type as surviving the death of its holder.
    ///
    /// See [`selectors::on_removal`](crate::propagation::selectors::on_removal).
    pub fn copy_on_death(mut self) -> Self {
        self.copy_on_death = true;
        self
    }

    /// Sets the copy handler from a closure.
    ///
    /// The closure receives the source value, the destination holder and the
    /// copy context. It returns `Ok(Some(copy))` to install a copy, `Ok(None)`
    /// to veto the copy of this particular value, or an error to abort the
    /// whole propagation.
    pub fn copy_handler<F>(self, handler: F) -> Self
    where
        F: Fn(&T, &dyn AttachmentHolder, &CopyContext<'_>) -> Result<Option<T>, Report>
            + Send
            + Sync
            + 'static,
    {
        self.copy_handler_with(handler)
    }

    /// Sets the copy handler from any [`CopyHandler`] implementation, such as
    /// the built-in [`NeverCopy`](crate::handlers::NeverCopy).
    pub fn copy_handler_with<H>(mut self, handler: H) -> Self
    where
        H: CopyHandler<T>,
    {
        self.copy_handler = Some(Box::new(handler));
        self
    }

    /// Sets a supplier of default values, used when an attachment of this
    /// type is materialized lazily on a holder that does not carry one yet.
    pub fn default_value<F>(mut self, supplier: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.default_value = Some(Box::new(supplier));
        self
    }

    /// Finishes the attachment type, allocating its unique key.
    #[must_use]
    pub fn build(self) -> AttachmentType<T> {
        AttachmentType::from_data(TypeData {
            key: AttachmentKey::allocate(self.name),
            codec: self.codec,
            copy_on_death: self.copy_on_death,
            copy_handler: self.copy_handler,
            default_value: self.default_value,
        })
    }
}

impl<T: Clone + Send + Sync + 'static> AttachmentTypeBuilder<T> {
    /// Uses [`Clone`] to copy values of this type.
    pub fn copy_with_clone(self) -> Self {
        self.copy_handler_with(CloneCopy)
    }
}

impl<T: 'static> core::fmt::Debug for AttachmentTypeBuilder<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AttachmentTypeBuilder")
            .field("name", &self.name)
            .field("has_codec", &self.codec.is_some())
            .field("copy_on_death", &self.copy_on_death)
            .field("has_copy_handler", &self.copy_handler.is_some())
            .finish_non_exhaustive()
    }
}

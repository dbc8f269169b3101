//! Registration of attachment types.
//!
//! Attachment types are meant to be created once, at startup, and registered
//! under a unique name before any holder is populated. The
//! [`AttachmentRegistry`] enforces that: it rejects a second type under a name
//! that is already taken, and once [frozen](AttachmentRegistry::freeze) it
//! rejects registrations altogether.
//!
//! The registry is internally synchronized and its constructor is `const`, so
//! it can live in a `static`:
//!
//! ```
//! use carryover::{prelude::*, registry::AttachmentRegistry};
//!
//! static ATTACHMENTS: AttachmentRegistry = AttachmentRegistry::new();
//!
//! let thirst: AttachmentType<u8> = AttachmentType::builder("survival:thirst").build();
//! ATTACHMENTS.register(&thirst)?;
//! ATTACHMENTS.freeze();
//!
//! assert!(ATTACHMENTS.get("survival:thirst").is_some_and(|ty| ty.is(&thirst)));
//! assert!(ATTACHMENTS.register(&thirst).is_err());
//! # Ok::<(), Report<carryover::registry::RegistryError>>(())
//! ```

mod lock;

use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use indexmap::{IndexMap, map::Entry};
use rootcause::Report;
use rustc_hash::FxBuildHasher;
use tracing::debug;

use self::lock::RegistryLock;
use crate::attachment_type::{AttachmentType, ErasedAttachmentType};

/// The ways a registration can fail.
#[derive(Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A different attachment type is already registered under this name.
    DuplicateKey {
        /// The contested name.
        name: String,
    },
    /// The registry has been frozen.
    Frozen {
        /// The name of the type that was being registered.
        name: String,
    },
}

impl core::fmt::Debug for RegistryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::DuplicateKey { name } => {
                f.debug_struct("DuplicateKey").field("name", name).finish()
            }
            Self::Frozen { name } => f.debug_struct("Frozen").field("name", name).finish(),
        }
    }
}

impl core::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::DuplicateKey { name } => {
                write!(f, "an attachment type named `{name}` is already registered")
            }
            Self::Frozen { name } => write!(
                f,
                "cannot register attachment type `{name}`: the registry is frozen"
            ),
        }
    }
}

impl core::error::Error for RegistryError {}

struct RegistryState {
    types: IndexMap<String, ErasedAttachmentType, FxBuildHasher>,
    frozen: bool,
}

impl RegistryState {
    fn new() -> Self {
        Self {
            types: IndexMap::default(),
            frozen: false,
        }
    }
}

/// A set of attachment types, keyed by name, in registration order.
pub struct AttachmentRegistry {
    state: RegistryLock<RegistryState>,
}

impl AttachmentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: RegistryLock::new(),
        }
    }

    /// Registers `attachment_type` under its name.
    ///
    /// Registering the same type twice is a no-op.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::DuplicateKey`] if a different type is registered
    ///   under the same name.
    /// - [`RegistryError::Frozen`] if the registry has been frozen.
    pub fn register<T: Send + Sync + 'static>(
        &self,
        attachment_type: &AttachmentType<T>,
    ) -> Result<(), Report<RegistryError>> {
        let name = attachment_type.name();
        let mut guard = self.state.write();
        let state = guard.get_or_insert_with(RegistryState::new);

        if state.frozen {
            return Err(Report::new(RegistryError::Frozen {
                name: name.to_string(),
            }));
        }

        match state.types.entry(name.to_string()) {
            Entry::Occupied(entry) if entry.get().is(attachment_type) => Ok(()),
            Entry::Occupied(_) => Err(Report::new(RegistryError::DuplicateKey {
                name: name.to_string(),
            })),
            Entry::Vacant(entry) => {
                entry.insert(attachment_type.erased());
                debug!(attachment = name, "registered attachment type");
                Ok(())
            }
        }
    }

    /// The attachment type registered under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ErasedAttachmentType> {
        self.state.read().get()?.types.get(name).cloned()
    }

    /// Whether a type is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.state
            .read()
            .get()
            .is_some_and(|state| state.types.contains_key(name))
    }

    /// The number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().get().map_or(0, |state| state.types.len())
    }

    /// Whether no type has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All registered types, in registration order.
    #[must_use]
    pub fn types(&self) -> Vec<ErasedAttachmentType> {
        self.state
            .read()
            .get()
            .map(|state| state.types.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Rejects every later registration.
    pub fn freeze(&self) {
        self.state.write().get_or_insert_with(RegistryState::new).frozen = true;
        debug!(types = self.len(), "attachment registry frozen");
    }

    /// Whether [`freeze`](Self::freeze) has been called.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.state.read().get().is_some_and(|state| state.frozen)
    }
}

impl Default for AttachmentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for AttachmentRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AttachmentRegistry")
            .field("types", &self.types())
            .field("frozen", &self.is_frozen())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_order_and_lookup() {
        let registry = AttachmentRegistry::new();
        let first: AttachmentType<u8> = AttachmentType::builder("test:first").build();
        let second: AttachmentType<u16> = AttachmentType::builder("test:second").build();
        assert!(registry.is_empty());

        registry.register(&first).unwrap();
        registry.register(&second).unwrap();
        registry.register(&first).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("test:second"));
        assert!(!registry.contains("test:third"));
        assert!(registry.get("test:first").is_some_and(|ty| ty.is(&first)));

        let names: Vec<_> = registry
            .types()
            .iter()
            .map(|ty| ty.name().to_string())
            .collect();
        assert_eq!(names, ["test:first", "test:second"]);
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let registry = AttachmentRegistry::new();
        let original: AttachmentType<u8> = AttachmentType::builder("test:taken").build();
        let impostor: AttachmentType<u8> = AttachmentType::builder("test:taken").build();

        registry.register(&original).unwrap();
        let report = registry.register(&impostor).unwrap_err();

        assert_eq!(
            report.current_context(),
            &RegistryError::DuplicateKey {
                name: String::from("test:taken")
            }
        );
        assert!(registry.get("test:taken").is_some_and(|ty| ty.is(&original)));
    }

    #[test]
    fn test_frozen_registry_rejects_registration() {
        let registry = AttachmentRegistry::new();
        let late: AttachmentType<u8> = AttachmentType::builder("test:late").build();
        assert!(!registry.is_frozen());

        registry.freeze();
        assert!(registry.is_frozen());

        let report = registry.register(&late).unwrap_err();
        assert!(matches!(report.current_context(), RegistryError::Frozen { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_is_sync() {
        static_assertions::assert_impl_all!(AttachmentRegistry: Send, Sync);
    }
}

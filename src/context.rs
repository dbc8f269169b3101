//! The capability threaded through a single propagation call to copy
//! handlers.

use core::any::Any;

use rootcause::{Report, report};

/// Opaque capability passed to every copy handler of one propagation call.
///
/// Typically this wraps the data-registry or lookup handle of the
/// destination's world, so that handlers can re-resolve registry references
/// the copied value holds. The engine never inspects it; handlers recover the
/// provider they expect with [`provider`](Self::provider) or
/// [`require`](Self::require).
///
/// # Examples
///
/// ```
/// use carryover::prelude::*;
///
/// struct Biomes {
///     names: Vec<&'static str>,
/// }
///
/// let biomes = Biomes {
///     names: vec!["plains", "desert"],
/// };
/// let context = CopyContext::new(&biomes);
///
/// let resolved = context.require::<Biomes>().unwrap();
/// assert_eq!(resolved.names[1], "desert");
/// assert!(context.provider::<String>().is_none());
/// ```
#[derive(Clone, Copy)]
pub struct CopyContext<'a> {
    provider: Option<&'a dyn Any>,
}

impl<'a> CopyContext<'a> {
    /// Creates a context that carries `provider`.
    #[must_use]
    pub fn new<P: Any>(provider: &'a P) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Creates a context without a provider, for holders that have no
    /// registries to resolve against.
    #[must_use]
    pub const fn empty() -> CopyContext<'static> {
        CopyContext { provider: None }
    }

    /// Whether this context carries a provider at all.
    #[must_use]
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Returns the provider if it is of type `P`.
    #[must_use]
    pub fn provider<P: Any>(&self) -> Option<&'a P> {
        self.provider?.downcast_ref::<P>()
    }

    /// Returns the provider if it is of type `P`, or an error naming the
    /// expected type.
    pub fn require<P: Any>(&self) -> Result<&'a P, Report> {
        self.provider::<P>().ok_or_else(|| {
            report!(
                "copy context does not carry a provider of type `{}`",
                core::any::type_name::<P>()
            )
        })
    }
}

impl Default for CopyContext<'_> {
    fn default() -> Self {
        CopyContext::empty()
    }
}

impl core::fmt::Debug for CopyContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CopyContext")
            .field("has_provider", &self.has_provider())
            .finish()
    }
}

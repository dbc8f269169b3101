#[cfg(feature = "std")]
use std::sync as impl_;

#[cfg(not(feature = "std"))]
use spin as impl_;

#[repr(transparent)]
pub(crate) struct RegistryLock<T: 'static + Send + Sync>(impl_::RwLock<Option<T>>);

#[repr(transparent)]
pub(crate) struct RegistryReadGuard<'a, T: 'static + Send + Sync>(
    impl_::RwLockReadGuard<'a, Option<T>>,
);

#[repr(transparent)]
pub(crate) struct RegistryWriteGuard<'a, T: 'static + Send + Sync>(
    impl_::RwLockWriteGuard<'a, Option<T>>,
);

impl<T: 'static + Send + Sync> RegistryLock<T> {
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self(impl_::RwLock::new(None))
    }

    #[inline]
    pub(crate) fn read(&self) -> RegistryReadGuard<'_, T> {
        #[cfg(not(feature = "std"))]
        let guard = self.0.read();

        // Every write is a single insertion or flag store, so poisoned state
        // is still consistent.
        #[cfg(feature = "std")]
        let guard = self.0.read().unwrap_or_else(std::sync::PoisonError::into_inner);

        RegistryReadGuard(guard)
    }

    #[inline]
    pub(crate) fn write(&self) -> RegistryWriteGuard<'_, T> {
        #[cfg(not(feature = "std"))]
        let guard = self.0.write();

        #[cfg(feature = "std")]
        let guard = self
            .0
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        RegistryWriteGuard(guard)
    }
}

impl<T: 'static + Send + Sync> RegistryReadGuard<'_, T> {
    #[inline]
    pub(crate) fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }
}

impl<T: 'static + Send + Sync> RegistryWriteGuard<'_, T> {
    #[inline]
    pub(crate) fn get_or_insert_with(&mut self, init: impl FnOnce() -> T) -> &mut T {
        self.0.get_or_insert_with(init)
    }
}

/*!
 * Finalizable Objects
 *
 * Guarantees unmanaged cleanup when the owner never calls `dispose()`.
 */

use super::traits::Disposable;
use super::DisposeOrigin;
use std::ops::Deref;

/// Owner of a [`Disposable`] that disposes it on drop
///
/// The drop path uses [`DisposeOrigin::Finalizer`], so `dispose_managed` is
/// skipped there: collaborators may already be gone. An explicit `dispose()`
/// before drop turns the drop path into a no-op.
pub struct Finalizable<T: Disposable> {
    inner: T,
}

impl<T: Disposable> Finalizable<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Disposable> Deref for Finalizable<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: Disposable> Drop for Finalizable<T> {
    fn drop(&mut self) {
        self.inner.dispose_from(DisposeOrigin::Finalizer);
    }
}

//! Thread-safe pool of reusable values
//!
//! The light-map renderer needs two scratch [`CoordinatePair`](crate::CoordinatePair)s
//! per tile. Rather than allocating per tile, workers acquire them from an
//! [`InstancePool`] and hand them back when the tile is written.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Values that can be returned to a pool and handed out again.
pub trait Poolable {
    /// Return the value to its zero state before it re-enters the pool.
    fn reset(&mut self);
}

type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;

/// A free-list of reusable values guarded by a single lock.
///
/// Values are moved out on [`acquire`](Self::acquire) and moved back on
/// [`release`](Self::release), so an instance can never have two live holders.
/// New instances are built with the factory supplied at construction.
pub struct InstancePool<T> {
    available: Mutex<Vec<T>>,
    factory: Factory<T>,
    created: AtomicUsize,
}

impl<T: Poolable> InstancePool<T> {
    /// Create an empty pool that builds new instances with `factory`.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            available: Mutex::new(Vec::new()),
            factory: Box::new(factory),
            created: AtomicUsize::new(0),
        }
    }

    /// Take a retired instance, or build a new one when none is available.
    pub fn acquire(&self) -> T {
        let reused = self
            .available
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        match reused {
            Some(instance) => instance,
            None => {
                self.created.fetch_add(1, Ordering::Relaxed);
                (self.factory)()
            }
        }
    }

    /// Reset `instance` and make it available to later callers.
    pub fn release(&self, mut instance: T) {
        instance.reset();
        self.available
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(instance);
    }

    /// Acquire an instance that is released automatically when dropped.
    pub fn checkout(&self) -> Pooled<'_, T> {
        Pooled {
            pool: self,
            instance: Some(self.acquire()),
        }
    }

    /// Number of retired instances waiting to be reused.
    pub fn available(&self) -> usize {
        self.available
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Total number of instances the factory has built.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}

impl<T: Poolable + Default + 'static> Default for InstancePool<T> {
    fn default() -> Self {
        Self::new(T::default)
    }
}

impl<T> std::fmt::Debug for InstancePool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstancePool")
            .field("created", &self.created.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// A pooled instance that returns itself to its pool on drop.
pub struct Pooled<'a, T: Poolable> {
    pool: &'a InstancePool<T>,
    instance: Option<T>,
}

impl<T: Poolable> Pooled<'_, T> {
    /// Detach the instance from the pool; it will not be released.
    pub fn into_inner(mut self) -> T {
        // `instance` is only None after this call or after drop
        self.instance.take().unwrap_or_else(|| (self.pool.factory)())
    }
}

impl<T: Poolable> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.instance {
            Some(instance) => instance,
            None => unreachable!("pooled instance accessed after release"),
        }
    }
}

impl<T: Poolable> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.instance {
            Some(instance) => instance,
            None => unreachable!("pooled instance accessed after release"),
        }
    }
}

impl<T: Poolable> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(instance) = self.instance.take() {
            self.pool.release(instance);
        }
    }
}

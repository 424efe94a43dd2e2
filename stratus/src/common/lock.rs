use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::sync::Arc;

/// A handle to a named mutex that can be stored and reused.
pub struct LockHandle {
    lock: Arc<Mutex<()>>,
}

impl LockHandle {
    /// Acquires the lock, blocking until it is available.
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock()
    }
}

/// Registry for managing named mutexes.
///
/// Catalog mutations are compare-and-swap operations against the store, but
/// within a single process there is no point racing two writers of the same
/// collection against each other. The registry hands out one mutex per key so
/// catalog mutations serialize per collection, layered over the CAS.
///
/// This implementation uses `parking_lot`'s poison-free locks.
///
/// # Examples
///
/// ```
/// use stratus::common::LockRegistry;
/// let registry = LockRegistry::new();
/// let handle = registry.get_lock("users");
/// {
///     let _guard = handle.lock();
/// } // lock is held while _guard is in scope
/// ```
#[derive(Clone)]
pub struct LockRegistry {
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl LockRegistry {
    /// Creates a new empty lock registry.
    pub fn new() -> Self {
        LockRegistry {
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Gets the lock for the given name, creating it when absent.
    pub fn get_lock(&self, name: &str) -> LockHandle {
        let lock = {
            let mut locks = self.locks.lock();
            locks
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        LockHandle { lock }
    }

    /// Removes a lock from the registry if it is no longer needed.
    ///
    /// Returns `true` if the lock was removed, `false` if it did not exist.
    pub fn remove_lock(&self, name: &str) -> bool {
        let mut locks = self.locks.lock();
        locks.remove(name).is_some()
    }

    /// Returns the number of locks currently registered.
    pub fn lock_count(&self) -> usize {
        let locks = self.locks.lock();
        locks.len()
    }
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

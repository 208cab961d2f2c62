//! # kos-sync
//!
//! Shared-resource primitives for the dispensary, symbol map, file-IO
//! handle table, and TLS bookkeeping (§5 "Shared-resource policy").
//!
//! The teacher's `nx-std-sync` builds its `Mutex`/`RwLock`/`OnceLock` on top
//! of Horizon's futex-style address-wait SVCs. This kernel's syscall surface
//! (§6.1) has no such primitive — waiting is expressed only as port receive
//! with a timeout — so these wrappers are spinlocks from the `spin` crate
//! instead, matching the synchronization style the other kernel-shaped repos
//! in this family reach for (`spin = "0.9"` in the hobby x86_64 kernel this
//! system's virtual-memory primitives are modeled on). The public API
//! mirrors `nx-std-sync` (`lock`, `read`/`write`, `get_or_init`) so callers
//! read the same regardless of which primitive backs them.

#![no_std]

extern crate alloc;

pub use spin::{Mutex, MutexGuard, Once, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A cell written at most once, then read many times without further
/// synchronization. Thin wrapper over [`spin::Once`] matching the
/// `get_or_init` ergonomics of `nx-std-sync::once_lock::OnceLock`.
pub struct OnceLock<T>(Once<T>);

impl<T> OnceLock<T> {
    /// Creates an uninitialized cell.
    pub const fn new() -> Self {
        Self(Once::new())
    }

    /// Returns the stored value, initializing it on first access.
    pub fn get_or_init(&self, f: impl FnOnce() -> T) -> &T {
        self.0.call_once(f)
    }

    /// Returns the stored value if already initialized.
    pub fn get(&self) -> Option<&T> {
        self.0.get()
    }
}

impl<T> Default for OnceLock<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn once_lock_runs_initializer_exactly_once() {
        use core::sync::atomic::{AtomicUsize, Ordering};
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        let cell: OnceLock<u32> = OnceLock::new();
        let a = cell.get_or_init(|| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            42
        });
        let b = cell.get_or_init(|| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            7
        });
        assert_eq!(*a, 42);
        assert_eq!(*b, 42);
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rwlock_allows_concurrent_readers() {
        let lock = RwLock::new(5);
        let r1 = lock.read();
        let r2 = lock.read();
        assert_eq!(*r1, 5);
        assert_eq!(*r2, 5);
    }
}

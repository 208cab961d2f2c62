//! Name → port registry (§4.1).
//!
//! Grounded on the teacher's `nx-rt::service_registry`: a single global,
//! lazily-initialized `RwLock<Vec<(name, value)>>` behind a `OnceLock`.
//! The teacher downcasts a type-erased `Arc<dyn Any>` per entry because it
//! registers heterogeneous service session objects; every dispensary entry
//! is the same `PortHandle`, so no type erasure is needed here.

use alloc::string::String;
use alloc::vec::Vec;

use kos_svc::handle::PortHandle;
use kos_sync::{OnceLock, RwLock};

const INITIAL_CAPACITY: usize = 8;

static REGISTRY: OnceLock<RwLock<Vec<(String, PortHandle)>>> = OnceLock::new();

fn table() -> &'static RwLock<Vec<(String, PortHandle)>> {
    REGISTRY.get_or_init(|| RwLock::new(Vec::with_capacity(INITIAL_CAPACITY)))
}

/// Inserts or replaces the mapping for `name` (§4.1: "last-writer-wins").
pub fn register(name: &str, port: PortHandle) {
    let mut guard = table().write();
    guard.retain(|(entry_name, _)| entry_name != name);
    guard.push((String::from(name), port));
}

/// Returns the current mapping for `name`, if any.
pub fn lookup(name: &str) -> Option<PortHandle> {
    let guard = table().read();
    guard
        .iter()
        .find(|(entry_name, _)| entry_name == name)
        .map(|(_, port)| *port)
}

/// Removes the mapping for `name` if present.
pub fn unregister(name: &str) {
    let mut guard = table().write();
    guard.retain(|(entry_name, _)| entry_name != name);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins_on_duplicate_name() {
        let first = unsafe { PortHandle::from_raw(1) };
        let second = unsafe { PortHandle::from_raw(2) };
        register("me.blraaz.rpc.test-dup", first);
        register("me.blraaz.rpc.test-dup", second);
        assert_eq!(lookup("me.blraaz.rpc.test-dup"), Some(second));
        unregister("me.blraaz.rpc.test-dup");
    }

    #[test]
    fn unregister_removes_entry() {
        let port = unsafe { PortHandle::from_raw(3) };
        register("me.blraaz.rpc.test-unreg", port);
        unregister("me.blraaz.rpc.test-unreg");
        assert_eq!(lookup("me.blraaz.rpc.test-unreg"), None);
    }

    #[test]
    fn lookup_of_unknown_name_is_none() {
        assert_eq!(lookup("me.blraaz.rpc.never-registered"), None);
    }
}

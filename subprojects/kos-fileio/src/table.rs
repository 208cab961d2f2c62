//! Server-scoped open-file handle table (§4.4: "File handles are
//! server-scoped monotonic integers. Handle→File map is behind a mutex.").
//!
//! Grounded on `nx-service-nv`'s fd-behind-a-session shape, generalized
//! from a single fixed-width `Fd(u32)` to an owning table since this
//! endpoint, unlike the NV driver client, is the side that hands handles
//! out rather than merely wrapping ones returned by another process.

use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, Ordering};

use kos_bundle::Contents;
use kos_sync::Mutex;

/// An open file's contents, indexed by its server-scoped handle.
pub struct HandleTable<'a> {
    next: AtomicU32,
    open: Mutex<Vec<(u32, Contents<'a>)>>,
}

impl<'a> HandleTable<'a> {
    pub fn new() -> Self {
        HandleTable {
            // 0 is reserved so a decoded handle of 0 is unambiguously invalid.
            next: AtomicU32::new(1),
            open: Mutex::new(Vec::new()),
        }
    }

    /// Registers newly opened contents and returns its handle.
    pub fn insert(&self, contents: Contents<'a>) -> u32 {
        let handle = self.next.fetch_add(1, Ordering::Relaxed);
        self.open.lock().push((handle, contents));
        handle
    }

    /// Reads `length` bytes starting at `offset`, clamped to what's there.
    pub fn read_at(&self, handle: u32, offset: u64, length: usize) -> Option<Vec<u8>> {
        let table = self.open.lock();
        let (_, contents) = table.iter().find(|(h, _)| *h == handle)?;
        let bytes: &[u8] = contents;
        let start = usize::try_from(offset).ok()?.min(bytes.len());
        let end = start.saturating_add(length).min(bytes.len());
        Some(bytes[start..end].to_vec())
    }

    pub fn len_of(&self, handle: u32) -> Option<usize> {
        let table = self.open.lock();
        table.iter().find(|(h, _)| *h == handle).map(|(_, c)| c.len())
    }

    /// Removes `handle`, releasing the reference to its contents.
    /// Returns `true` if the handle was open.
    pub fn close(&self, handle: u32) -> bool {
        let mut table = self.open.lock();
        let before = table.len();
        table.retain(|(h, _)| *h != handle);
        table.len() != before
    }
}

impl Default for HandleTable<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_read_then_close() {
        let table = HandleTable::new();
        let handle = table.insert(Contents::Borrowed(b"hello world"));
        assert_eq!(table.len_of(handle), Some(11));
        assert_eq!(table.read_at(handle, 6, 5).unwrap(), b"world");
        assert!(table.close(handle));
        assert!(!table.close(handle));
        assert_eq!(table.len_of(handle), None);
    }

    #[test]
    fn read_clamps_past_end_of_file() {
        let table = HandleTable::new();
        let handle = table.insert(Contents::Borrowed(b"abc"));
        assert_eq!(table.read_at(handle, 1, 100).unwrap(), b"bc");
        assert_eq!(table.read_at(handle, 10, 5).unwrap(), b"");
    }
}

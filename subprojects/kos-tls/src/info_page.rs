//! Parses the TLS info page `kos_linker::tls_page` writes at a fixed
//! address below a dynamically linked task's launch-info page, and
//! bootstraps the calling thread's TLS from it.
//!
//! `magic='TLSI' | object_count | total_size | align`, followed by one
//! `(offset, data_off, data_len)` triple per object, followed by raw
//! `.tdata` bytes — mirrors `kos_linker::tls_page::build`'s write side
//! exactly, since the two sides never share a crate (the linker runs in
//! `dyldo`, this one runs inside the target task itself).

use kos_config::TLS_INFO_MAGIC;
use zerocopy::little_endian::{U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{TlsError, TlsLayout, TlsObject};

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
struct Header {
    magic: U32,
    object_count: U32,
    total_size: U64,
    align: U64,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
struct Entry {
    offset: U64,
    data_off: U64,
    data_len: U64,
}

/// Parses a raw TLS info page into a layout and the object list
/// [`crate::setup_tls`] expects, or `None` if `page` doesn't start with the
/// expected magic (the page is optional: statically linked tasks have no
/// TLS info page mapped at all).
pub fn parse(page: &[u8]) -> Option<(TlsLayout, alloc::vec::Vec<TlsObject<'_>>)> {
    let (header, rest) = Header::ref_from_prefix(page).ok()?;
    if header.magic.get() != TLS_INFO_MAGIC {
        return None;
    }

    let object_count = header.object_count.get() as usize;
    let entries_len = object_count * size_of::<Entry>();
    let entry_bytes = rest.get(..entries_len)?;

    let mut objects = alloc::vec::Vec::with_capacity(object_count);
    for i in 0..object_count {
        let raw = entry_bytes.get(i * size_of::<Entry>()..(i + 1) * size_of::<Entry>())?;
        let (entry, _) = Entry::ref_from_prefix(raw).ok()?;
        let data_off = entry.data_off.get() as usize;
        let data_len = entry.data_len.get() as usize;
        let tdata = page.get(data_off..data_off + data_len)?;
        objects.push(TlsObject { offset: entry.offset.get() as usize, tdata });
    }

    let layout = TlsLayout {
        total_size: header.total_size.get() as usize,
        align: header.align.get() as usize,
    };
    Some((layout, objects))
}

/// Checks whether `base` has anything mapped at all before dereferencing it
/// as a TLS info page: a statically linked task has nothing mapped at the
/// TLS info address, and reading it directly would fault.
fn page_is_mapped(base: u64) -> bool {
    kos_svc::mem::get_handle_for_addr(base).is_ok()
}

/// Reads the TLS info page at `base` (one of the `kos_config::tls_info_base`
/// constants) and, if present, calls [`crate::setup_tls`] for the calling
/// thread. Returns `Ok(None)` for a statically linked task with no page
/// mapped there; that is not an error, just nothing to set up.
///
/// # Safety
///
/// Same preconditions as [`crate::setup_tls`]: at most once per thread,
/// before any thread-local access, from the thread being set up.
pub unsafe fn bootstrap_from_fixed_address(base: u64) -> Result<Option<*mut crate::TlsBlock>, TlsError> {
    if !page_is_mapped(base) {
        return Ok(None);
    }

    // SAFETY: `page_is_mapped` confirmed a region is mapped at `base`; the
    // kernel places a full page there whenever it places one at all.
    let page = unsafe { core::slice::from_raw_parts(base as *const u8, kos_config::PAGE_SIZE) };
    let Some((layout, objects)) = parse(page) else {
        return Ok(None);
    };

    let block = unsafe { crate::setup_tls(layout, &objects)? };
    Ok(Some(block))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_page(total_size: u64, align: u64, objects: &[(u64, &[u8])]) -> alloc::vec::Vec<u8> {
        let mut page = alloc::vec![0u8; kos_config::PAGE_SIZE];
        let entries_off = size_of::<Header>();
        let mut cursor = entries_off + objects.len() * size_of::<Entry>();
        let mut entries = alloc::vec::Vec::new();
        for (offset, tdata) in objects {
            let data_off = cursor;
            page[data_off..data_off + tdata.len()].copy_from_slice(tdata);
            entries.push(Entry {
                offset: (*offset).into(),
                data_off: (data_off as u64).into(),
                data_len: (tdata.len() as u64).into(),
            });
            cursor += tdata.len();
        }
        for (i, entry) in entries.iter().enumerate() {
            let off = entries_off + i * size_of::<Entry>();
            page[off..off + size_of::<Entry>()].copy_from_slice(entry.as_bytes());
        }
        let header = Header {
            magic: TLS_INFO_MAGIC.into(),
            object_count: (objects.len() as u32).into(),
            total_size: total_size.into(),
            align: align.into(),
        };
        page[..size_of::<Header>()].copy_from_slice(header.as_bytes());
        page
    }

    #[test]
    fn parses_a_well_formed_page() {
        let page = build_page(0x40, 8, &[(0, b"abc")]);
        let (layout, objects) = parse(&page).unwrap();
        assert_eq!(layout.total_size, 0x40);
        assert_eq!(layout.align, 8);
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].tdata, b"abc");
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut page = alloc::vec![0u8; kos_config::PAGE_SIZE];
        page[..4].copy_from_slice(b"XXXX");
        assert!(parse(&page).is_none());
    }

    #[test]
    fn rejects_truncated_entry_table() {
        let mut page = build_page(0x40, 8, &[(0, b"abc")]);
        page.truncate(size_of::<Header>());
        assert!(parse(&page).is_none());
    }
}

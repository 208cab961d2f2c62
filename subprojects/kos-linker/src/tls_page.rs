//! TLS info page layout and builder. The target's own runtime startup stub
//! reads this page at a fixed address to build the `kos_tls::TlsObject`
//! list and call `kos_tls::setup_tls` for itself — the combined template
//! cannot round-trip through the `TaskCreatedReply` wire message (§6.2
//! pins its reply to exactly `task_handle`/`status`/`entry_point`), so the
//! linker writes it out of band instead, the same way the root loader
//! writes the launch-info page out of band of the kernel's own ABI.
//!
//! `magic='TLSI' | object_count | total_size | align`, followed by one
//! `(offset, data_off, data_len)` triple per loaded object with a `PT_TLS`
//! segment, followed by each object's raw `.tdata` bytes.

use alloc::vec::Vec;

use kos_config::{PAGE_SIZE, TLS_INFO_MAGIC};
use static_assertions::const_assert_eq;
use zerocopy::little_endian::{U32, U64};
use zerocopy::{Immutable, IntoBytes, KnownLayout};

#[derive(Debug, Clone, Copy, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
struct Header {
    magic: U32,
    object_count: U32,
    total_size: U64,
    align: U64,
}
const_assert_eq!(size_of::<Header>(), 24);

#[derive(Debug, Clone, Copy, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
struct Entry {
    offset: U64,
    data_off: U64,
    data_len: U64,
}
const_assert_eq!(size_of::<Entry>(), 24);

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum BuildError {
    #[error("tls info page ({needed} bytes) overflows the {PAGE_SIZE}-byte page")]
    Overflow { needed: usize },
}

/// One loaded object's contribution, in load order: where its block sits
/// within the combined TLS image (`offset`) and its file-backed `.tdata`.
pub struct TlsContribution<'a> {
    pub offset: usize,
    pub tdata: &'a [u8],
}

/// Builds the TLS info page for a task with a combined TLS image of
/// `total_size` bytes aligned to `align`, contributed to by `objects` in
/// load order. Pages beyond the first would be needed only once combined
/// `.tdata` exceeds a page, which §4.9's `MIN_TLS_SIZE`-scale images never
/// approach in practice; larger images are rejected rather than spilled.
pub fn build(total_size: usize, align: usize, objects: &[TlsContribution<'_>]) -> Result<[u8; PAGE_SIZE], BuildError> {
    let mut page = [0u8; PAGE_SIZE];

    let entries_off = size_of::<Header>();
    let entries_len = objects.len() * size_of::<Entry>();
    let mut cursor = entries_off + entries_len;
    if cursor > PAGE_SIZE {
        return Err(BuildError::Overflow { needed: cursor });
    }

    let mut entries = Vec::with_capacity(objects.len());
    for object in objects {
        let needed = cursor + object.tdata.len();
        if needed > PAGE_SIZE {
            return Err(BuildError::Overflow { needed });
        }
        page[cursor..needed].copy_from_slice(object.tdata);
        entries.push(Entry {
            offset: (object.offset as u64).into(),
            data_off: (cursor as u64).into(),
            data_len: (object.tdata.len() as u64).into(),
        });
        cursor = needed;
    }

    for (i, entry) in entries.iter().enumerate() {
        let off = entries_off + i * size_of::<Entry>();
        page[off..off + size_of::<Entry>()].copy_from_slice(entry.as_bytes());
    }

    let header = Header {
        magic: TLS_INFO_MAGIC.into(),
        object_count: (objects.len() as u32).into(),
        total_size: (total_size as u64).into(),
        align: (align as u64).into(),
    };
    page[..size_of::<Header>()].copy_from_slice(header.as_bytes());

    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_carries_the_magic_and_counts() {
        let objects = [TlsContribution { offset: 0, tdata: b"abc" }];
        let page = build(0x40, 8, &objects).unwrap();
        assert_eq!(&page[0..4], &TLS_INFO_MAGIC.to_le_bytes());
        let count = u32::from_le_bytes(page[4..8].try_into().unwrap());
        assert_eq!(count, 1);
    }

    #[test]
    fn entry_data_offsets_point_at_the_copied_bytes() {
        let objects = [
            TlsContribution { offset: 0, tdata: b"exe!" },
            TlsContribution { offset: 16, tdata: b"lib" },
        ];
        let page = build(0x40, 8, &objects).unwrap();
        let entries_off = size_of::<Header>();
        let second_off = entries_off + size_of::<Entry>();
        let data_off = u64::from_le_bytes(page[second_off + 8..second_off + 16].try_into().unwrap()) as usize;
        let data_len = u64::from_le_bytes(page[second_off + 16..second_off + 24].try_into().unwrap()) as usize;
        assert_eq!(&page[data_off..data_off + data_len], b"lib");
    }

    #[test]
    fn oversized_tdata_is_rejected() {
        let big = alloc::vec![0u8; PAGE_SIZE];
        let objects = [TlsContribution { offset: 0, tdata: &big }];
        assert!(build(PAGE_SIZE, 8, &objects).is_err());
    }
}

//! Launch-info page layout and builder (§6.4).
//!
//! `magic='TASK' | load_path_ptr | argc | argv_ptr`, all pointer fields
//! target-task virtual addresses. Padding fields keep every 8-byte field
//! naturally aligned so the wire layout matches a real struct layout on
//! both supported word widths.

use kos_config::{LAUNCH_INFO_MAGIC, PAGE_SIZE};
use static_assertions::const_assert_eq;
use zerocopy::little_endian::{U32, U64};
use zerocopy::{Immutable, IntoBytes, KnownLayout};

#[derive(Debug, Clone, Copy, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
struct Header {
    magic: U32,
    _pad0: U32,
    load_path_ptr: U64,
    argc: U32,
    _pad1: U32,
    argv_ptr: U64,
}
const_assert_eq!(size_of::<Header>(), 32);

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum BuildError {
    #[error("launch-info page ({needed} bytes) overflows the {PAGE_SIZE}-byte page")]
    Overflow { needed: usize },
    #[error("argc {0} exceeds what a single page's pointer array can hold")]
    TooManyArgs(usize),
}

/// Builds a launch-info page: fixed header, then the `argv` pointer array
/// (NULL-terminated), then `path` and each `args` string, all NUL-terminated.
/// Pointers embedded in the page are `base + offset` (target virtual
/// addresses), since the page is mapped at the fixed `base` given.
pub fn build(base: u64, path: &str, args: &[&str]) -> Result<[u8; PAGE_SIZE], BuildError> {
    let mut page = [0u8; PAGE_SIZE];

    let argv_off = size_of::<Header>();
    let argv_len = (args.len() + 1) * size_of::<u64>();
    let strings_off = argv_off + argv_len;
    if strings_off > PAGE_SIZE {
        return Err(BuildError::TooManyArgs(args.len()));
    }

    let mut cursor = strings_off;
    let path_off = cursor;
    write_cstr(&mut page, &mut cursor, path)?;

    for (i, arg) in args.iter().enumerate() {
        let off = cursor;
        write_cstr(&mut page, &mut cursor, arg)?;
        let ptr_off = argv_off + i * size_of::<u64>();
        page[ptr_off..ptr_off + 8].copy_from_slice(&(base + off as u64).to_le_bytes());
    }
    // Terminating NULL entry of the argv array is already zero from init.

    let header = Header {
        magic: LAUNCH_INFO_MAGIC.into(),
        _pad0: 0.into(),
        load_path_ptr: (base + path_off as u64).into(),
        argc: (args.len() as u32).into(),
        _pad1: 0.into(),
        argv_ptr: (base + argv_off as u64).into(),
    };
    page[..size_of::<Header>()].copy_from_slice(header.as_bytes());

    Ok(page)
}

fn write_cstr(page: &mut [u8; PAGE_SIZE], cursor: &mut usize, s: &str) -> Result<(), BuildError> {
    let needed = *cursor + s.len() + 1;
    if needed > PAGE_SIZE {
        return Err(BuildError::Overflow { needed });
    }
    page[*cursor..*cursor + s.len()].copy_from_slice(s.as_bytes());
    page[*cursor + s.len()] = 0;
    *cursor += s.len() + 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_carries_the_magic_and_pointers() {
        let page = build(0x7000_0000, "/sbin/hello", &["hello", "world"]).unwrap();
        assert_eq!(&page[0..4], &LAUNCH_INFO_MAGIC.to_le_bytes());
        let argc = u32::from_le_bytes(page[20..24].try_into().unwrap());
        assert_eq!(argc, 2);
    }

    #[test]
    fn argv_pointers_resolve_to_nul_terminated_strings() {
        let base = 0x1000;
        let page = build(base, "/bin/app", &["one"]).unwrap();
        let argv_ptr = u64::from_le_bytes(page[24..32].try_into().unwrap());
        let first_entry_off = (argv_ptr - base) as usize;
        let arg_ptr = u64::from_le_bytes(page[first_entry_off..first_entry_off + 8].try_into().unwrap());
        let arg_off = (arg_ptr - base) as usize;
        assert_eq!(&page[arg_off..arg_off + 3], b"one");
        assert_eq!(page[arg_off + 3], 0);
    }
}

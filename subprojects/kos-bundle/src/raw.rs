//! Wire layout of the init bundle (§6.3, bit-exact).

use static_assertions::const_assert_eq;
use zerocopy::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// `'KUSH'` in little-endian ASCII.
pub const MAGIC: u32 = u32::from_le_bytes(*b"KUSH");
/// `'INIT'` in little-endian ASCII.
pub const TYPE: u32 = u32::from_le_bytes(*b"INIT");

/// File data regions are aligned to this boundary past the header array.
pub const DATA_ALIGN: usize = 16;

/// Set on [`FileHeader::flags`] when the file's data range is LZFSE
/// compressed.
pub const FLAG_COMPRESSED: u32 = 1 << 31;

/// 24-byte master header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct MasterHeader {
    pub magic: U32,
    pub major: U16,
    pub minor: U16,
    pub bundle_type: U32,
    pub header_len: U32,
    pub total_len: U32,
    pub num_files: U32,
}

const_assert_eq!(size_of::<MasterHeader>(), 24);

/// Fixed portion of a file header; `name[name_len]` follows immediately.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct FileHeaderFixed {
    pub flags: U32,
    pub data_off: U32,
    pub data_len: U32,
    pub raw_len: U32,
    pub name_len: u8,
}

const_assert_eq!(size_of::<FileHeaderFixed>(), 17);

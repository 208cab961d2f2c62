//! High-level bundle reader (§4.3).
//!
//! Grounded on the teacher's `nx-object::read::romfs::RomFs`: a thin
//! `zerocopy`-backed view over a mapped image plus a lookup-by-name
//! operation. The decompression cache's weak-reference sharing has no
//! analogue in the teacher (RomFS entries are never compressed), so it is
//! built directly from §4.3's requirement using the same `alloc::sync`
//! primitives the rest of the corpus reaches for when it needs shared
//! ownership (see `nx-rt::service_registry`'s `Arc<dyn Any>` entries).

use alloc::string::String;
use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;

use kos_sync::Mutex;
use thiserror::Error;
use zerocopy::FromBytes;

use crate::lzfse::{self, LzfseError};
use crate::raw::{self, FileHeaderFixed, MasterHeader, FLAG_COMPRESSED};

#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum OpenBundleError {
    #[error("buffer too small for the master header")]
    Truncated,
    #[error("bad magic {found:#x}, expected {expected:#x}")]
    BadMagic { found: u32, expected: u32 },
    #[error("bad type tag {found:#x}, expected {expected:#x}")]
    BadType { found: u32, expected: u32 },
    #[error("bundle total_len {total_len} exceeds mapped region of {mapped_len} bytes")]
    TooLarge { total_len: usize, mapped_len: usize },
}

/// A parsed init bundle over a mapped byte span (§3 "Init bundle").
pub struct Bundle<'a> {
    bytes: &'a [u8],
    entries: Vec<Entry<'a>>,
    cache: Mutex<Vec<(String, Weak<Vec<u8>>)>>,
}

struct Entry<'a> {
    name: &'a str,
    data: &'a [u8],
    raw_len: usize,
    compressed: bool,
}

impl<'a> Bundle<'a> {
    /// Validates the master header and indexes every file entry.
    pub fn try_from_bytes(bytes: &'a [u8]) -> Result<Self, OpenBundleError> {
        if bytes.len() < size_of::<MasterHeader>() {
            return Err(OpenBundleError::Truncated);
        }
        let header = MasterHeader::ref_from_prefix(bytes).unwrap().0;

        if header.magic.get() != raw::MAGIC {
            return Err(OpenBundleError::BadMagic {
                found: header.magic.get(),
                expected: raw::MAGIC,
            });
        }
        if header.bundle_type.get() != raw::TYPE {
            return Err(OpenBundleError::BadType {
                found: header.bundle_type.get(),
                expected: raw::TYPE,
            });
        }
        let total_len = header.total_len.get() as usize;
        if total_len > bytes.len() {
            return Err(OpenBundleError::TooLarge {
                total_len,
                mapped_len: bytes.len(),
            });
        }

        let mut cursor = header.header_len.get() as usize;
        let mut entries = Vec::with_capacity(header.num_files.get() as usize);
        for _ in 0..header.num_files.get() {
            let fixed = FileHeaderFixed::ref_from_prefix(&bytes[cursor..])
                .map_err(|_| OpenBundleError::Truncated)?
                .0;
            let name_start = cursor + size_of::<FileHeaderFixed>();
            let name_len = fixed.name_len as usize;
            let name_bytes = bytes
                .get(name_start..name_start + name_len)
                .ok_or(OpenBundleError::Truncated)?;
            let name = core::str::from_utf8(name_bytes).map_err(|_| OpenBundleError::Truncated)?;

            let data_off = fixed.data_off.get() as usize;
            let data_len = fixed.data_len.get() as usize;
            let data = bytes
                .get(data_off..data_off + data_len)
                .ok_or(OpenBundleError::Truncated)?;

            entries.push(Entry {
                name,
                data,
                raw_len: fixed.raw_len.get() as usize,
                compressed: fixed.flags.get() & FLAG_COMPRESSED != 0,
            });
            cursor = name_start + name_len;
        }

        Ok(Bundle {
            bytes,
            entries,
            cache: Mutex::new(Vec::new()),
        })
    }

    /// Scans the header array for `name`, returning a handle to it.
    pub fn open(&self, name: &str) -> Option<File<'_, 'a>> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| File { bundle: self, entry })
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

/// A handle into one bundle entry, wrapping `(data_ptr, data_len, compressed?)`.
pub struct File<'b, 'a> {
    bundle: &'b Bundle<'a>,
    entry: &'b Entry<'a>,
}

impl<'b, 'a> File<'b, 'a> {
    pub fn is_compressed(&self) -> bool {
        self.entry.compressed
    }

    pub fn raw_len(&self) -> usize {
        self.entry.raw_len
    }

    /// Returns the file's decompressed bytes. If uncompressed, this is the
    /// raw mapped span with no copy. If compressed, a decompressed buffer
    /// is produced lazily and cached by name with a weak reference, so
    /// concurrent `open()`s of the same name share the same buffer while
    /// any caller holds it (§4.3).
    pub fn contents(&self) -> Result<Contents<'a>, LzfseError> {
        if !self.entry.compressed {
            return Ok(Contents::Borrowed(self.entry.data));
        }

        let mut cache = self.bundle.cache.lock();
        if let Some((_, weak)) = cache.iter().find(|(name, _)| name == self.entry.name) {
            if let Some(shared) = weak.upgrade() {
                return Ok(Contents::Shared(shared));
            }
        }

        let decompressed = Arc::new(lzfse::decompress(self.entry.data, self.entry.raw_len)?);
        cache.retain(|(_, weak)| weak.strong_count() > 0);
        cache.push((String::from(self.entry.name), Arc::downgrade(&decompressed)));
        Ok(Contents::Shared(decompressed))
    }
}

/// Either a borrow of the mapped span (uncompressed) or a shared,
/// reference-counted decompressed buffer.
pub enum Contents<'a> {
    Borrowed(&'a [u8]),
    Shared(Arc<Vec<u8>>),
}

impl core::ops::Deref for Contents<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Contents::Borrowed(slice) => slice,
            Contents::Shared(arc) => arc.as_slice(),
        }
    }
}

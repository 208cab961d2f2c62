//! `.dynamic` section walk (§4.6 step 3).

use zerocopy::FromBytes;

use crate::raw32::Elf32Dyn;
use crate::raw64::Elf64Dyn;

/// One `(d_tag, d_val)` pair, widened to 64 bits.
#[derive(Debug, Clone, Copy)]
pub struct DynEntry {
    pub tag: i64,
    pub val: u64,
}

/// Walks entries starting at `bytes`, stopping at `DT_NULL` (§consts::DT_NULL).
pub struct DynIter32<'a> {
    pub(crate) bytes: &'a [u8],
    pub(crate) offset: usize,
    pub(crate) done: bool,
}

impl Iterator for DynIter32<'_> {
    type Item = DynEntry;

    fn next(&mut self) -> Option<DynEntry> {
        if self.done {
            return None;
        }
        let raw = Elf32Dyn::ref_from_prefix(self.bytes.get(self.offset..)?).ok()?.0;
        self.offset += size_of::<Elf32Dyn>();
        let entry = DynEntry {
            tag: raw.d_tag.get() as i64,
            val: raw.d_val.get() as u64,
        };
        if entry.tag == crate::consts::DT_NULL {
            self.done = true;
            return None;
        }
        Some(entry)
    }
}

pub struct DynIter64<'a> {
    pub(crate) bytes: &'a [u8],
    pub(crate) offset: usize,
    pub(crate) done: bool,
}

impl Iterator for DynIter64<'_> {
    type Item = DynEntry;

    fn next(&mut self) -> Option<DynEntry> {
        if self.done {
            return None;
        }
        let raw = Elf64Dyn::ref_from_prefix(self.bytes.get(self.offset..)?).ok()?.0;
        self.offset += size_of::<Elf64Dyn>();
        let entry = DynEntry {
            tag: raw.d_tag.get(),
            val: raw.d_val.get(),
        };
        if entry.tag == crate::consts::DT_NULL {
            self.done = true;
            return None;
        }
        Some(entry)
    }
}

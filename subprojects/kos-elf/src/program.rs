//! Program header iteration, normalized across word widths (§4.5 step 2).

use zerocopy::FromBytes;

use crate::raw32::Elf32Phdr;
use crate::raw64::Elf64Phdr;

/// A program header with every field widened to `u64`, so the loader and
/// linker can work arch-independently after parsing.
#[derive(Debug, Clone, Copy)]
pub struct ProgramHeader {
    pub p_type: u32,
    pub p_flags: u32,
    pub p_offset: u64,
    pub p_vaddr: u64,
    pub p_filesz: u64,
    pub p_memsz: u64,
    pub p_align: u64,
}

impl From<&Elf32Phdr> for ProgramHeader {
    fn from(raw: &Elf32Phdr) -> Self {
        ProgramHeader {
            p_type: raw.p_type.get(),
            p_flags: raw.p_flags.get(),
            p_offset: raw.p_offset.get() as u64,
            p_vaddr: raw.p_vaddr.get() as u64,
            p_filesz: raw.p_filesz.get() as u64,
            p_memsz: raw.p_memsz.get() as u64,
            p_align: raw.p_align.get() as u64,
        }
    }
}

impl From<&Elf64Phdr> for ProgramHeader {
    fn from(raw: &Elf64Phdr) -> Self {
        ProgramHeader {
            p_type: raw.p_type.get(),
            p_flags: raw.p_flags.get(),
            p_offset: raw.p_offset.get(),
            p_vaddr: raw.p_vaddr.get(),
            p_filesz: raw.p_filesz.get(),
            p_memsz: raw.p_memsz.get(),
            p_align: raw.p_align.get(),
        }
    }
}

pub struct ProgramHeaderIter32<'a> {
    pub(crate) bytes: &'a [u8],
    pub(crate) index: u16,
    pub(crate) count: u16,
}

impl Iterator for ProgramHeaderIter32<'_> {
    type Item = ProgramHeader;

    fn next(&mut self) -> Option<ProgramHeader> {
        if self.index >= self.count {
            return None;
        }
        let off = self.index as usize * size_of::<Elf32Phdr>();
        let raw = Elf32Phdr::ref_from_prefix(self.bytes.get(off..)?).ok()?.0;
        self.index += 1;
        Some(raw.into())
    }
}

pub struct ProgramHeaderIter64<'a> {
    pub(crate) bytes: &'a [u8],
    pub(crate) index: u16,
    pub(crate) count: u16,
}

impl Iterator for ProgramHeaderIter64<'_> {
    type Item = ProgramHeader;

    fn next(&mut self) -> Option<ProgramHeader> {
        if self.index >= self.count {
            return None;
        }
        let off = self.index as usize * size_of::<Elf64Phdr>();
        let raw = Elf64Phdr::ref_from_prefix(self.bytes.get(off..)?).ok()?.0;
        self.index += 1;
        Some(raw.into())
    }
}

//! Top-level ELF image view, dispatching on word width (§4.5 step 1-2).

use zerocopy::FromBytes;

use crate::dynamic::{DynIter32, DynIter64};
use crate::ident::{self, Class, IdentError};
use crate::program::{ProgramHeaderIter32, ProgramHeaderIter64};
use crate::raw32::Elf32Ehdr;
use crate::raw64::Elf64Ehdr;
use crate::reltab::{RelEntry, RelIter32, RelaIter64};
use crate::symtab::{self, Symbol};

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ImageError {
    #[error(transparent)]
    Ident(#[from] IdentError),
    #[error("buffer too small for the {class:?} header")]
    Truncated { class: Class },
}

/// A validated ELF image, either 32- or 64-bit.
pub enum ElfImage<'a> {
    Elf32 { bytes: &'a [u8], header: &'a Elf32Ehdr },
    Elf64 { bytes: &'a [u8], header: &'a Elf64Ehdr },
}

impl<'a> ElfImage<'a> {
    /// Validates `e_ident` and the fixed header, per §4.5 step 1.
    pub fn try_from_bytes(bytes: &'a [u8]) -> Result<Self, ImageError> {
        let class = ident::validate(bytes)?;
        Ok(match class {
            Class::Elf32 => {
                let header = Elf32Ehdr::ref_from_prefix(bytes)
                    .map_err(|_| ImageError::Truncated { class })?
                    .0;
                ElfImage::Elf32 { bytes, header }
            }
            Class::Elf64 => {
                let header = Elf64Ehdr::ref_from_prefix(bytes)
                    .map_err(|_| ImageError::Truncated { class })?
                    .0;
                ElfImage::Elf64 { bytes, header }
            }
        })
    }

    pub fn class(&self) -> Class {
        match self {
            ElfImage::Elf32 { .. } => Class::Elf32,
            ElfImage::Elf64 { .. } => Class::Elf64,
        }
    }

    pub fn machine(&self) -> u16 {
        match self {
            ElfImage::Elf32 { header, .. } => header.e_machine.get(),
            ElfImage::Elf64 { header, .. } => header.e_machine.get(),
        }
    }

    pub fn ty(&self) -> u16 {
        match self {
            ElfImage::Elf32 { header, .. } => header.e_type.get(),
            ElfImage::Elf64 { header, .. } => header.e_type.get(),
        }
    }

    pub fn entry(&self) -> u64 {
        match self {
            ElfImage::Elf32 { header, .. } => header.e_entry.get() as u64,
            ElfImage::Elf64 { header, .. } => header.e_entry.get(),
        }
    }

    pub fn bytes(&self) -> &'a [u8] {
        match self {
            ElfImage::Elf32 { bytes, .. } => bytes,
            ElfImage::Elf64 { bytes, .. } => bytes,
        }
    }

    pub fn program_headers(&self) -> ProgramHeaders<'a> {
        match self {
            ElfImage::Elf32 { bytes, header } => ProgramHeaders::Elf32(ProgramHeaderIter32 {
                bytes: &bytes[header.e_phoff.get() as usize..],
                index: 0,
                count: header.e_phnum.get(),
            }),
            ElfImage::Elf64 { bytes, header } => ProgramHeaders::Elf64(ProgramHeaderIter64 {
                bytes: &bytes[header.e_phoff.get() as usize..],
                index: 0,
                count: header.e_phnum.get(),
            }),
        }
    }

    /// Walks `.dynamic` starting at file offset `dyn_off`, per §4.6 step 3.
    pub fn dynamic_entries(&self, dyn_off: u64) -> DynEntries<'a> {
        match self {
            ElfImage::Elf32 { bytes, .. } => DynEntries::Elf32(DynIter32 {
                bytes,
                offset: dyn_off as usize,
                done: false,
            }),
            ElfImage::Elf64 { bytes, .. } => DynEntries::Elf64(DynIter64 {
                bytes,
                offset: dyn_off as usize,
                done: false,
            }),
        }
    }

    pub fn str_at(&self, strtab_off: u64, off: u32) -> Option<&'a str> {
        symtab::str_at(self.bytes(), strtab_off, off)
    }

    pub fn symbol_at(&self, symtab_off: u64, index: u32) -> Option<Symbol> {
        match self {
            ElfImage::Elf32 { bytes, .. } => symtab::symbol_at32(bytes, symtab_off, index),
            ElfImage::Elf64 { bytes, .. } => symtab::symbol_at64(bytes, symtab_off, index),
        }
    }

    /// Iterates a REL/RELA array at file offset `off` with `count` entries
    /// each `stride` bytes apart (§4.8: configurable stride).
    pub fn relocations(&self, off: u64, stride: usize, count: usize) -> Relocations<'a> {
        match self {
            ElfImage::Elf32 { bytes, .. } => {
                Relocations::Rel(RelIter32::new(&bytes[off as usize..], stride, count))
            }
            ElfImage::Elf64 { bytes, .. } => {
                Relocations::Rela(RelaIter64::new(&bytes[off as usize..], stride, count))
            }
        }
    }
}

pub enum ProgramHeaders<'a> {
    Elf32(ProgramHeaderIter32<'a>),
    Elf64(ProgramHeaderIter64<'a>),
}

impl Iterator for ProgramHeaders<'_> {
    type Item = crate::program::ProgramHeader;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            ProgramHeaders::Elf32(iter) => iter.next(),
            ProgramHeaders::Elf64(iter) => iter.next(),
        }
    }
}

pub enum DynEntries<'a> {
    Elf32(DynIter32<'a>),
    Elf64(DynIter64<'a>),
}

impl Iterator for DynEntries<'_> {
    type Item = crate::dynamic::DynEntry;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            DynEntries::Elf32(iter) => iter.next(),
            DynEntries::Elf64(iter) => iter.next(),
        }
    }
}

pub enum Relocations<'a> {
    Rel(RelIter32<'a>),
    Rela(RelaIter64<'a>),
}

impl Iterator for Relocations<'_> {
    type Item = RelEntry;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Relocations::Rel(iter) => iter.next(),
            Relocations::Rela(iter) => iter.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elf64_header_bytes(e_type: u16, phnum: u16) -> [u8; 64] {
        let mut buf = [0u8; 64];
        buf[..4].copy_from_slice(&ident::ELFMAG);
        buf[ident::EI_CLASS] = 2;
        buf[ident::EI_DATA] = 1;
        buf[ident::EI_VERSION] = 1;
        buf[16..18].copy_from_slice(&e_type.to_le_bytes());
        buf[18..20].copy_from_slice(&62u16.to_le_bytes()); // EM_X86_64
        buf[54..56].copy_from_slice(&56u16.to_le_bytes()); // e_phentsize
        buf[56..58].copy_from_slice(&phnum.to_le_bytes());
        buf
    }

    #[test]
    fn parses_elf64_header_fields() {
        let bytes = elf64_header_bytes(2, 0);
        let image = ElfImage::try_from_bytes(&bytes).unwrap();
        assert_eq!(image.class(), Class::Elf64);
        assert_eq!(image.machine(), 62);
        assert_eq!(image.ty(), 2);
        assert_eq!(image.program_headers().count(), 0);
    }
}

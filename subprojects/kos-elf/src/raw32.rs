//! i386 wire structures (bit-exact).

use static_assertions::const_assert_eq;
use zerocopy::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct Elf32Ehdr {
    pub e_ident: [u8; 16],
    pub e_type: U16,
    pub e_machine: U16,
    pub e_version: U32,
    pub e_entry: U32,
    pub e_phoff: U32,
    pub e_shoff: U32,
    pub e_flags: U32,
    pub e_ehsize: U16,
    pub e_phentsize: U16,
    pub e_phnum: U16,
    pub e_shentsize: U16,
    pub e_shnum: U16,
    pub e_shstrndx: U16,
}
const_assert_eq!(size_of::<Elf32Ehdr>(), 52);

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct Elf32Phdr {
    pub p_type: U32,
    pub p_offset: U32,
    pub p_vaddr: U32,
    pub p_paddr: U32,
    pub p_filesz: U32,
    pub p_memsz: U32,
    pub p_flags: U32,
    pub p_align: U32,
}
const_assert_eq!(size_of::<Elf32Phdr>(), 32);

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct Elf32Dyn {
    pub d_tag: zerocopy::little_endian::I32,
    pub d_val: U32,
}
const_assert_eq!(size_of::<Elf32Dyn>(), 8);

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct Elf32Sym {
    pub st_name: U32,
    pub st_value: U32,
    pub st_size: U32,
    pub st_info: u8,
    pub st_other: u8,
    pub st_shndx: U16,
}
const_assert_eq!(size_of::<Elf32Sym>(), 16);

/// REL entry (i386 addends are implicit at the relocation target).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct Elf32Rel {
    pub r_offset: U32,
    pub r_info: U32,
}
const_assert_eq!(size_of::<Elf32Rel>(), 8);

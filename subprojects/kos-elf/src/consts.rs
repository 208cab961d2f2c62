//! ELF constants referenced by the loader and linker (§4.5–§4.8).

pub const ET_EXEC: u16 = 2;
pub const ET_DYN: u16 = 3;

pub const EM_386: u16 = 3;
pub const EM_X86_64: u16 = 62;

pub const PT_NULL: u32 = 0;
pub const PT_LOAD: u32 = 1;
pub const PT_DYNAMIC: u32 = 2;
pub const PT_INTERP: u32 = 3;
pub const PT_PHDR: u32 = 6;
pub const PT_TLS: u32 = 7;
pub const PT_GNU_STACK: u32 = 0x6474_e551;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SegmentFlags: u32 {
        const EXEC = 1 << 0;
        const WRITE = 1 << 1;
        const READ = 1 << 2;
    }
}

pub const DT_NULL: i64 = 0;
pub const DT_NEEDED: i64 = 1;
pub const DT_PLTRELSZ: i64 = 2;
pub const DT_HASH: i64 = 4;
pub const DT_STRTAB: i64 = 5;
pub const DT_SYMTAB: i64 = 6;
pub const DT_RELA: i64 = 7;
pub const DT_RELASZ: i64 = 8;
pub const DT_RELAENT: i64 = 9;
pub const DT_STRSZ: i64 = 10;
pub const DT_SYMENT: i64 = 11;
pub const DT_INIT: i64 = 12;
pub const DT_FINI: i64 = 13;
pub const DT_SONAME: i64 = 14;
pub const DT_REL: i64 = 17;
pub const DT_RELSZ: i64 = 18;
pub const DT_RELENT: i64 = 19;
pub const DT_PLTREL: i64 = 20;
pub const DT_JMPREL: i64 = 23;
pub const DT_INIT_ARRAY: i64 = 25;
pub const DT_FINI_ARRAY: i64 = 26;
pub const DT_INIT_ARRAYSZ: i64 = 27;
pub const DT_FINI_ARRAYSZ: i64 = 28;

/// `d_un.d_val` of a `DT_PLTREL` entry naming REL-style PLT relocations.
pub const DT_TAG_REL: i64 = DT_REL;
/// `d_un.d_val` of a `DT_PLTREL` entry naming RELA-style PLT relocations.
pub const DT_TAG_RELA: i64 = DT_RELA;

pub const SHN_UNDEF: u16 = 0;

pub const STB_LOCAL: u8 = 0;
pub const STB_GLOBAL: u8 = 1;
pub const STB_WEAK: u8 = 2;

pub const STT_NOTYPE: u8 = 0;
pub const STT_OBJECT: u8 = 1;
pub const STT_FUNC: u8 = 2;
pub const STT_TLS: u8 = 6;

/// Decomposes `st_info` into `(binding, type)`.
pub fn st_info(info: u8) -> (u8, u8) {
    (info >> 4, info & 0xf)
}

// i386 (REL) relocation types.
pub const R_386_32: u32 = 1;
pub const R_386_COPY: u32 = 5;
pub const R_386_GLOB_DAT: u32 = 6;
pub const R_386_JMP_SLOT: u32 = 7;
pub const R_386_RELATIVE: u32 = 8;
pub const R_386_TLS_TPOFF: u32 = 14;
pub const R_386_TLS_DTPMOD32: u32 = 35;
pub const R_386_TLS_DTPOFF32: u32 = 36;

/// Decomposes a 32-bit `r_info` into `(sym_index, reloc_type)`.
pub fn elf32_r_info(info: u32) -> (u32, u32) {
    (info >> 8, info & 0xff)
}

// amd64 (RELA) relocation types.
pub const R_X86_64_64: u32 = 1;
pub const R_X86_64_COPY: u32 = 5;
pub const R_X86_64_GLOB_DAT: u32 = 6;
pub const R_X86_64_JMP_SLOT: u32 = 7;
pub const R_X86_64_RELATIVE: u32 = 8;
pub const R_X86_64_DTPMOD64: u32 = 16;
pub const R_X86_64_DTPOFF64: u32 = 17;
pub const R_X86_64_TPOFF64: u32 = 18;

/// Decomposes a 64-bit `r_info` into `(sym_index, reloc_type)`.
pub fn elf64_r_info(info: u64) -> (u32, u32) {
    ((info >> 32) as u32, (info & 0xffff_ffff) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn st_info_splits_binding_and_type() {
        assert_eq!(st_info(0x12), (1, 2));
    }

    #[test]
    fn r_info_packing_matches_reference_layout() {
        assert_eq!(elf32_r_info(0x0000_0105), (1, 5));
        assert_eq!(elf64_r_info(0x0000_0002_0000_0007), (2, 7));
    }
}

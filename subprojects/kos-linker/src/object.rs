//! `.dynamic` section walking (§4.6 step 3): `DT_STRTAB`/`DT_SYMTAB`/
//! `DT_SYMENT`, `DT_REL(A)`+size+stride, `DT_JMPREL`+size+kind,
//! `DT_INIT`/`DT_FINI`(+array counterparts), and the `DT_NEEDED` list.

use alloc::vec::Vec;

use kos_elf::consts;
use kos_elf::ElfImage;

use crate::error::LinkError;

/// A `DT_REL`/`DT_RELA`/`DT_JMPREL` array's location and shape.
#[derive(Debug, Clone, Copy)]
pub struct RelTable {
    pub off: u64,
    pub total_size: u64,
    pub ent_size: u64,
    pub is_rela: bool,
}

impl RelTable {
    pub fn count(&self) -> usize {
        if self.ent_size == 0 {
            0
        } else {
            (self.total_size / self.ent_size) as usize
        }
    }
}

/// Everything the linker needs out of one object's `.dynamic` section.
#[derive(Debug, Default, Clone)]
pub struct DynInfo {
    pub strtab_off: u64,
    pub symtab_off: u64,
    pub syment: u64,
    pub rel: Option<RelTable>,
    pub jmprel: Option<RelTable>,
    pub init: Option<u64>,
    pub fini: Option<u64>,
    pub init_array: Option<(u64, u64)>,
    pub fini_array: Option<(u64, u64)>,
    /// `strtab_off`-relative name offsets, one per `DT_NEEDED`.
    pub needed: Vec<u32>,
    pub soname: Option<u32>,
    /// File offset of the `DT_HASH` table, if present. Its second word
    /// (`nchain`) equals the dynamic symbol table's entry count — there is
    /// no `DT_SYMTAB` size tag, so this is how its extent is known.
    pub hash_off: Option<u64>,
}

/// Reads the dynamic symbol count out of a classic SysV `.hash` table's
/// `nchain` field (the table's second 32-bit word).
pub fn symbol_count(bytes: &[u8], hash_off: u64) -> Option<u32> {
    let off = hash_off as usize + 4;
    Some(u32::from_le_bytes(bytes.get(off..off + 4)?.try_into().ok()?))
}

/// File offset of the first `PT_DYNAMIC` segment, if any.
pub fn find_pt_dynamic(elf: &ElfImage<'_>) -> Option<u64> {
    elf.program_headers()
        .find(|ph| ph.p_type == consts::PT_DYNAMIC)
        .map(|ph| ph.p_offset)
}

/// File offset and memsz/filesz of the first `PT_TLS` segment, if any, with
/// its in-image virtual address (object-relative, before any slide).
pub fn find_pt_tls(elf: &ElfImage<'_>) -> Option<kos_elf::ProgramHeader> {
    elf.program_headers().find(|ph| ph.p_type == consts::PT_TLS)
}

pub fn parse_dynamic(elf: &ElfImage<'_>, dyn_off: u64) -> DynInfo {
    let mut info = DynInfo::default();
    let mut rel_off = None;
    let mut rel_sz = 0u64;
    let mut rel_ent = 0u64;
    let mut rela_off = None;
    let mut rela_sz = 0u64;
    let mut rela_ent = 0u64;
    let mut jmprel_off = None;
    let mut jmprel_sz = 0u64;
    let mut pltrel_is_rela = false;

    for entry in elf.dynamic_entries(dyn_off) {
        let tag = entry.tag;
        let val = entry.val;
        match tag {
            consts::DT_STRTAB => info.strtab_off = val,
            consts::DT_SYMTAB => info.symtab_off = val,
            consts::DT_SYMENT => info.syment = val,
            consts::DT_REL => rel_off = Some(val),
            consts::DT_RELSZ => rel_sz = val,
            consts::DT_RELENT => rel_ent = val,
            consts::DT_RELA => rela_off = Some(val),
            consts::DT_RELASZ => rela_sz = val,
            consts::DT_RELAENT => rela_ent = val,
            consts::DT_JMPREL => jmprel_off = Some(val),
            consts::DT_PLTRELSZ => jmprel_sz = val,
            consts::DT_PLTREL => pltrel_is_rela = val == consts::DT_TAG_RELA as u64,
            consts::DT_INIT => info.init = Some(val),
            consts::DT_FINI => info.fini = Some(val),
            consts::DT_INIT_ARRAY => info.init_array = Some((val, info.init_array.map(|(_, s)| s).unwrap_or(0))),
            consts::DT_INIT_ARRAYSZ => info.init_array = Some((info.init_array.map(|(a, _)| a).unwrap_or(0), val)),
            consts::DT_FINI_ARRAY => info.fini_array = Some((val, info.fini_array.map(|(_, s)| s).unwrap_or(0))),
            consts::DT_FINI_ARRAYSZ => info.fini_array = Some((info.fini_array.map(|(a, _)| a).unwrap_or(0), val)),
            consts::DT_NEEDED => info.needed.push(val as u32),
            consts::DT_SONAME => info.soname = Some(val as u32),
            consts::DT_HASH => info.hash_off = Some(val),
            _ => {}
        }
    }

    info.rel = match (rela_off, rel_off) {
        (Some(off), _) => Some(RelTable { off, total_size: rela_sz, ent_size: rela_ent, is_rela: true }),
        (None, Some(off)) => Some(RelTable { off, total_size: rel_sz, ent_size: rel_ent, is_rela: false }),
        (None, None) => None,
    };
    info.jmprel = jmprel_off.map(|off| RelTable {
        off,
        total_size: jmprel_sz,
        ent_size: if pltrel_is_rela { rela_ent } else { rel_ent },
        is_rela: pltrel_is_rela,
    });

    info
}

/// Validates that `elf` is a dynamically linked object of the kernel's
/// architecture, returning its `PT_DYNAMIC` file offset.
pub fn require_dynamic(elf: &ElfImage<'_>, name: &str) -> Result<u64, LinkError> {
    find_pt_dynamic(elf).ok_or_else(|| LinkError::MissingDynamic(alloc::string::String::from(name)))
}

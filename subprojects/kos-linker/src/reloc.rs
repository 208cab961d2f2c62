//! The relocation engine (§4.8): per-architecture handler tables over
//! [`kos_elf`]'s configurable-stride relocation iterator, applied in the
//! order exe-data → exe-PLT → per-library-data → per-library-PLT.

use alloc::string::String;

use kos_elf::{consts, ElfImage};

use crate::error::LinkError;
use crate::graph::TlsLayout;
use crate::object::{DynInfo, RelTable};
use crate::segment::{self, LocalSegment};
use crate::symbol::{Binding, ResolvedSymbol, SymbolKind, SymbolMap};

/// One object as the relocation engine needs to see it: its slide, its
/// `.dynamic` info, and a borrow of its whole file so symbol names can be
/// looked up by index.
pub struct RelocTarget<'a> {
    pub name: &'a str,
    pub base: u64,
    pub bytes: &'a [u8],
    pub dyn_info: &'a DynInfo,
    pub object_index: usize,
}

fn symbol_name<'a>(target: &RelocTarget<'a>, sym_index: u32) -> Option<&'a str> {
    if sym_index == 0 {
        return None;
    }
    let elf = ElfImage::try_from_bytes(target.bytes).ok()?;
    let sym = elf.symbol_at(target.dyn_info.symtab_off, sym_index)?;
    elf.str_at(target.dyn_info.strtab_off, sym.name_off)
}

/// Applies one `RelTable` (data or PLT) belonging to `target` against the
/// whole graph's staged segments, resolving undefined symbols through
/// `symbols` and installing `COPY` overrides back into it.
pub fn apply_table(
    target: &RelocTarget<'_>,
    table: &RelTable,
    symbols: &mut SymbolMap,
    segments: &mut [LocalSegment],
    tls: &TlsLayout,
) -> Result<(), LinkError> {
    let elf = ElfImage::try_from_bytes(target.bytes)?;
    let amd64 = elf.machine() == consts::EM_X86_64;

    for entry in elf.relocations(table.off, table.ent_size as usize, table.count()) {
        let vaddr = target.base + entry.offset;
        let name = symbol_name(target, entry.sym_index);
        let defined = name.and_then(|n| symbols.resolve(n));

        let value = if amd64 {
            amd64_value(entry.reloc_type, target.base, entry.addend.unwrap_or(0), defined, tls)?
        } else {
            let addend = entry.addend.unwrap_or_else(|| {
                segment::read_word(segments, vaddr, 4).unwrap_or(0) as i64
            });
            i386_value(entry.reloc_type, target.base, addend, defined, tls)?
        };

        match value {
            RelocEffect::Write32(v) => segment::write_at(segments, vaddr, &(v as u32).to_le_bytes())?,
            RelocEffect::Write64(v) => segment::write_at(segments, vaddr, &v.to_le_bytes())?,
            RelocEffect::Copy => {
                let Some(defined) = defined else {
                    return Err(LinkError::UndefinedSymbol(String::from(name.unwrap_or("<anon>"))));
                };
                let bytes = segment::read_bytes(segments, defined.address, defined.size as usize)
                    .ok_or(LinkError::RelocationOutOfRange(defined.address))?;
                segment::write_at(segments, vaddr, &bytes)?;
                if let Some(n) = name {
                    symbols.install_override(
                        String::from(n),
                        ResolvedSymbol {
                            address: vaddr,
                            size: defined.size,
                            kind: SymbolKind::Data,
                            binding: Binding::Global,
                            object: target.object_index,
                        },
                    );
                }
            }
        }
    }
    Ok(())
}

enum RelocEffect {
    Write32(u64),
    Write64(u64),
    Copy,
}

fn require_symbol(defined: Option<&ResolvedSymbol>) -> Result<u64, LinkError> {
    defined.map(|s| s.address).ok_or(LinkError::UndefinedSymbol(String::from("<unresolved>")))
}

/// The defining object's offset within the combined TLS image, per §4.8's
/// `library_tls_offset(symbol.library)`. Objects without a `PT_TLS` segment
/// never have a TLS-typed symbol resolve into them, so a missing entry is
/// an inconsistent graph rather than a value to default away.
fn library_tls_offset(tls: &TlsLayout, defined: &ResolvedSymbol) -> Result<u64, LinkError> {
    tls.offsets
        .get(defined.object)
        .copied()
        .flatten()
        .map(|off| off as u64)
        .ok_or(LinkError::UndefinedSymbol(String::from("<no-tls-segment>")))
}

fn tpoff(addend: i64, tls: &TlsLayout, defined: Option<&ResolvedSymbol>) -> Result<u64, LinkError> {
    let defined = defined.ok_or_else(|| LinkError::UndefinedSymbol(String::from("<unresolved>")))?;
    let offset = library_tls_offset(tls, defined)?;
    Ok((addend + offset as i64 - tls.exec_tls_size as i64 + defined.address as i64) as u64)
}

fn dtpmod(tls: &TlsLayout, defined: Option<&ResolvedSymbol>) -> Result<u64, LinkError> {
    let defined = defined.ok_or_else(|| LinkError::UndefinedSymbol(String::from("<unresolved>")))?;
    library_tls_offset(tls, defined)
}

fn dtpoff(addend: i64, defined: Option<&ResolvedSymbol>) -> Result<u64, LinkError> {
    Ok((require_symbol(defined)? as i64 + addend) as u64)
}

fn amd64_value(
    ty: u32,
    base: u64,
    addend: i64,
    defined: Option<&ResolvedSymbol>,
    tls: &TlsLayout,
) -> Result<RelocEffect, LinkError> {
    Ok(match ty {
        consts::R_X86_64_RELATIVE => RelocEffect::Write64((base as i64 + addend) as u64),
        consts::R_X86_64_64 => RelocEffect::Write64((require_symbol(defined)? as i64 + addend) as u64),
        consts::R_X86_64_GLOB_DAT | consts::R_X86_64_JMP_SLOT => RelocEffect::Write64(require_symbol(defined)?),
        consts::R_X86_64_COPY => RelocEffect::Copy,
        consts::R_X86_64_TPOFF64 => RelocEffect::Write64(tpoff(addend, tls, defined)?),
        consts::R_X86_64_DTPMOD64 => RelocEffect::Write64(dtpmod(tls, defined)?),
        consts::R_X86_64_DTPOFF64 => RelocEffect::Write64(dtpoff(addend, defined)?),
        other => return Err(LinkError::UnknownRelocation(other)),
    })
}

fn i386_value(
    ty: u32,
    base: u64,
    addend: i64,
    defined: Option<&ResolvedSymbol>,
    tls: &TlsLayout,
) -> Result<RelocEffect, LinkError> {
    Ok(match ty {
        consts::R_386_RELATIVE => RelocEffect::Write32((base as i64 + addend) as u64),
        consts::R_386_32 => RelocEffect::Write32((require_symbol(defined)? as i64 + addend) as u64),
        consts::R_386_GLOB_DAT | consts::R_386_JMP_SLOT => RelocEffect::Write32(require_symbol(defined)?),
        consts::R_386_COPY => RelocEffect::Copy,
        // i386 `DT_REL` carries no explicit addend; the implicit one is the
        // value already at the relocation site (§4.8's "current"), read by
        // the caller and passed in as `addend`.
        consts::R_386_TLS_TPOFF => RelocEffect::Write32(tpoff(addend, tls, defined)?),
        consts::R_386_TLS_DTPMOD32 => RelocEffect::Write32(dtpmod(tls, defined)?),
        consts::R_386_TLS_DTPOFF32 => RelocEffect::Write32(dtpoff(addend, defined)?),
        other => return Err(LinkError::UnknownRelocation(other)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{Binding, SymbolKind};

    fn tls_layout() -> TlsLayout {
        // Executable's own TLS block is 0x20 bytes (object 0); a library's
        // block (object 1) sits right after it at offset 0x20.
        TlsLayout {
            offsets: alloc::vec![Some(0), Some(0x20)],
            exec_tls_size: 0x20,
            total_size: 0x30,
            align: 8,
        }
    }

    fn tls_sym(address: u64, object: usize) -> ResolvedSymbol {
        ResolvedSymbol { address, size: 0, kind: SymbolKind::ThreadLocal, binding: Binding::Global, object }
    }

    #[test]
    fn tpoff_combines_library_offset_and_exec_size() {
        let tls = tls_layout();
        let sym = tls_sym(4, 1);
        // 0 (addend) + 0x20 (library offset) - 0x20 (exec size) + 4 (symbol).
        assert_eq!(tpoff(0, &tls, Some(&sym)).unwrap(), 4);
    }

    #[test]
    fn tpoff_for_the_executables_own_tls_symbol() {
        let tls = tls_layout();
        let sym = tls_sym(8, 0);
        // 0 + 0 (exec's own library offset) - 0x20 + 8 = -0x18.
        assert_eq!(tpoff(0, &tls, Some(&sym)).unwrap() as i64, 8 - 0x20);
    }

    #[test]
    fn dtpmod_returns_the_defining_objects_tls_offset() {
        let tls = tls_layout();
        let sym = tls_sym(0, 1);
        assert_eq!(dtpmod(&tls, Some(&sym)).unwrap(), 0x20);
    }

    #[test]
    fn dtpoff_is_just_the_symbols_own_address_plus_addend() {
        let sym = tls_sym(6, 1);
        assert_eq!(dtpoff(2, Some(&sym)).unwrap(), 8);
    }

    #[test]
    fn tls_relocation_against_an_object_without_a_tls_segment_is_an_error() {
        let tls = tls_layout();
        let sym = tls_sym(0, 2);
        assert!(library_tls_offset(&tls, &sym).is_err());
    }

    #[test]
    fn relative_reloc_adds_addend_to_base() {
        let value = amd64_value(consts::R_X86_64_RELATIVE, 0x1000, 0x10, None, &tls_layout()).unwrap();
        assert!(matches!(value, RelocEffect::Write64(0x1010)));
    }

    #[test]
    fn glob_dat_requires_a_resolved_symbol() {
        let err = i386_value(consts::R_386_GLOB_DAT, 0, 0, None, &tls_layout()).unwrap_err();
        assert!(matches!(err, LinkError::UndefinedSymbol(_)));
    }
}

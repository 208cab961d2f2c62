//! Library graph resolution (§4.6): breadth-first `DT_NEEDED` walk from the
//! executable, ASLR slide per object, soname dedup, and the combined
//! symbol map and flat segment list every relocation is applied against.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use kos_config::LIBRARY_SEARCH_PATH;
use kos_elf::consts;
use kos_elf::ElfImage;
use kos_svc::handle::PortHandle;

use crate::aslr;
use crate::error::LinkError;
use crate::object::{self, DynInfo};
use crate::segment::{self, LocalSegment};
use crate::symbol::{Binding, DuplicateGlobal, ResolvedSymbol, SymbolKind, SymbolMap};
use crate::tls_page::TlsContribution;

/// One resolved object: its file bytes (kept around for symbol/string table
/// lookups during relocation), its load bias, and its parsed `.dynamic`.
pub struct Object {
    pub name: String,
    pub bytes: Vec<u8>,
    pub base: u64,
    pub dyn_info: DynInfo,
    pub tls: Option<kos_elf::ProgramHeader>,
    /// Every `DT_NEEDED` string this object names, resolved to a search-path
    /// path at load time; used only to tally [`Object::refcount`] once the
    /// whole graph is known.
    needed_names: Vec<String>,
    /// Number of distinct objects that name this one as a `DT_NEEDED`
    /// dependency, plus one for the root executable. Not decremented by
    /// anything but [`LibraryGraph::dlclose`]: actual unmapping on reaching
    /// zero is out of scope, since demand paging/unmapping at runtime is a
    /// non-goal.
    pub refcount: u32,
}

/// The fully resolved, not-yet-relocated graph: every object in load order,
/// the flat segment list staged across all of them, and the symbol map
/// accumulated from each object's globals in that same order.
pub struct LibraryGraph {
    pub objects: Vec<Object>,
    pub segments: Vec<LocalSegment>,
    pub symbols: SymbolMap,
}

impl LibraryGraph {
    /// Decrements the refcount of the object named `name`, matching a
    /// `dlopen`-style consumer's `dlclose`. The soname-dedup walk in
    /// [`resolve`] never loads the same library twice, so this is the only
    /// bookkeeping `dlclose` needs to do.
    pub fn dlclose(&mut self, name: &str) {
        if let Some(object) = self.objects.iter_mut().find(|o| o.name == name) {
            object.refcount = object.refcount.saturating_sub(1);
        }
    }
}

/// Walks `DT_NEEDED` breadth-first starting from `exe_bytes` (already read
/// by the caller, since it is the one object re-opened by path rather than
/// discovered on the search path), staging every `PT_LOAD` segment and
/// building the combined symbol map as each object is loaded.
pub fn resolve(fileio: PortHandle, exe_path: &str, exe_bytes: Vec<u8>, timeout_us: u64) -> Result<LibraryGraph, LinkError> {
    let mut objects = Vec::new();
    let mut object_names: Vec<String> = Vec::new();
    let mut segments = Vec::new();
    let mut symbols = SymbolMap::new();
    // Every name (load path or soname) already resolved or queued, so a
    // `DT_NEEDED` shared by two objects is only fetched and parsed once
    // (§4.6 step 5's "avoiding duplicates by soname"). Refcounts are
    // tallied in a second pass once every object's dependency list is known.
    let mut seen_names: BTreeSet<String> = BTreeSet::new();
    seen_names.insert(exe_path.to_string());
    let mut queue: Vec<(String, Vec<u8>)> = alloc::vec![(exe_path.to_string(), exe_bytes)];

    while let Some((name, bytes)) = queue.pop() {
        let object_index = objects.len();
        object_names.push(name.clone());
        let elf = ElfImage::try_from_bytes(&bytes)?;
        if elf.machine() != expected_machine() {
            return Err(LinkError::UnsupportedArch(elf.machine()));
        }

        let dyn_off = object::require_dynamic(&elf, &name)?;
        let dyn_info = object::parse_dynamic(&elf, dyn_off);

        if let Some(soname_off) = dyn_info.soname {
            if let Some(soname) = elf.str_at(dyn_info.strtab_off, soname_off) {
                seen_names.insert(soname.to_string());
            }
        }

        let base = aslr::pick_slide(elf.machine())?;

        for ph in elf.program_headers().filter(|ph| ph.p_type == consts::PT_LOAD) {
            if ph.p_memsz == 0 {
                continue;
            }
            segments.push(segment::stage(base, &bytes, &ph)?);
        }

        load_globals(&elf, &dyn_info, base, object_index, &mut symbols).map_err(|dup| {
            LinkError::DuplicateGlobalSymbol {
                name: dup.name,
                first: object_names.get(dup.first_object).cloned().unwrap_or_default(),
                second: object_names.get(dup.second_object).cloned().unwrap_or_default(),
            }
        })?;

        let tls = object::find_pt_tls(&elf);

        let mut needed_names = Vec::new();
        for &name_off in &dyn_info.needed {
            let Some(needed_name) = elf.str_at(dyn_info.strtab_off, name_off) else {
                continue;
            };
            needed_names.push(needed_name.to_string());

            if seen_names.contains(needed_name) {
                continue;
            }
            seen_names.insert(needed_name.to_string());
            let path = find_on_search_path(fileio, needed_name, timeout_us)?;
            let lib_bytes = crate::io::read_whole_file(fileio, &path, timeout_us)?;
            queue.push((path, lib_bytes));
        }

        objects.push(Object { name, bytes, base, dyn_info, tls, needed_names, refcount: 0 });
    }

    tally_refcounts(&mut objects);

    Ok(LibraryGraph { objects, segments, symbols })
}

/// Computes each object's [`Object::refcount`] from every other object's
/// recorded `DT_NEEDED` names, plus one for the root executable (index 0,
/// since it is always the first item `resolve` queues).
fn tally_refcounts(objects: &mut [Object]) {
    let mut by_name: BTreeMap<String, usize> = BTreeMap::new();
    for (index, object) in objects.iter().enumerate() {
        by_name.insert(object.name.clone(), index);
        if let Some(soname_off) = object.dyn_info.soname {
            if let Some(soname) = kos_elf::ElfImage::try_from_bytes(&object.bytes)
                .ok()
                .and_then(|elf| elf.str_at(object.dyn_info.strtab_off, soname_off))
            {
                by_name.insert(soname.to_string(), index);
            }
        }
    }

    let mut bumps = alloc::vec![0u32; objects.len()];
    if !objects.is_empty() {
        bumps[0] += 1;
    }
    for object in objects.iter() {
        for needed in &object.needed_names {
            if let Some(&target) = by_name.get(needed) {
                bumps[target] += 1;
            }
        }
    }
    for (object, bump) in objects.iter_mut().zip(bumps) {
        object.refcount = bump;
    }
}

/// Registers every global/weak `STB_GLOBAL`/`STB_WEAK` symbol an object
/// defines (`shndx != SHN_UNDEF`), rebased by its load bias, mapping a
/// [`crate::symbol::DuplicateGlobal`] back to a diagnostic naming both
/// colliding objects by path.
fn load_globals(
    elf: &ElfImage<'_>,
    dyn_info: &DynInfo,
    base: u64,
    object_index: usize,
    symbols: &mut SymbolMap,
) -> Result<(), DuplicateGlobal> {
    const SHN_UNDEF: u16 = 0;
    let Some(hash_off) = dyn_info.hash_off else {
        // No `.hash` table means no exported symbols to register (an
        // object with `DT_NEEDED` entries but nothing to resolve against).
        return Ok(());
    };
    let Some(count) = object::symbol_count(elf.bytes(), hash_off) else {
        return Ok(());
    };

    for index in 1..count {
        let Some(sym) = elf.symbol_at(dyn_info.symtab_off, index) else {
            continue;
        };
        if sym.binding == consts::STB_LOCAL || sym.shndx == SHN_UNDEF || sym.name_off == 0 {
            continue;
        }
        let Some(name) = elf.str_at(dyn_info.strtab_off, sym.name_off) else {
            continue;
        };
        let resolved = ResolvedSymbol {
            address: base + sym.value,
            size: sym.size,
            kind: SymbolKind::from_stt(sym.ty),
            binding: Binding::from_stb(sym.binding),
            object: object_index,
        };
        symbols.insert_global(name.to_string(), resolved)?;
    }
    Ok(())
}

fn find_on_search_path(fileio: PortHandle, soname: &str, timeout_us: u64) -> Result<String, LinkError> {
    for dir in LIBRARY_SEARCH_PATH {
        let candidate = alloc::format!("{dir}/{soname}");
        match kos_fileio::open(fileio, &candidate, timeout_us)? {
            Some(opened) => {
                let _ = kos_fileio::close(fileio, opened.handle, timeout_us);
                return Ok(candidate);
            }
            None => continue,
        }
    }
    Err(LinkError::MissingDependency(soname.to_string()))
}

fn expected_machine() -> u16 {
    #[cfg(target_arch = "x86_64")]
    {
        consts::EM_X86_64
    }
    #[cfg(target_arch = "x86")]
    {
        consts::EM_386
    }
}

/// Per-object TLS placement: each loaded object's offset into the combined
/// TLS image (`None` for objects without a `PT_TLS` segment), the
/// executable's own TLS size (`exec_tls_size`, object 0's `p_memsz`), the
/// combined image size, and its alignment — everything §4.8's `TPOFF`/
/// `DTPMOD` formulas and §4.9's `setup_tls` need.
pub struct TlsLayout {
    pub offsets: Vec<Option<usize>>,
    pub exec_tls_size: usize,
    pub total_size: usize,
    pub align: usize,
}

/// Builds the TLS contributions for every loaded object that has a
/// `PT_TLS` segment, in load order, and the combined layout (§4.9 steps
/// 1-2; offset assignment per the intro: "executable sits at offset zero;
/// each library's block is placed immediately after").
pub fn tls_layout(graph: &LibraryGraph) -> (Vec<TlsContribution<'_>>, TlsLayout) {
    let mut contributions = Vec::new();
    let mut offsets = alloc::vec![None; graph.objects.len()];
    let mut offset = 0usize;
    let mut align = 1usize;
    let mut exec_tls_size = 0usize;

    for (index, object) in graph.objects.iter().enumerate() {
        let Some(ph) = object.tls else { continue };
        let obj_align = core::cmp::max(ph.p_align as usize, 1);
        offset = (offset + obj_align - 1) & !(obj_align - 1);
        let tdata = &object.bytes[ph.p_offset as usize..(ph.p_offset + ph.p_filesz) as usize];
        contributions.push(TlsContribution { offset, tdata });
        offsets[index] = Some(offset);
        if index == 0 {
            exec_tls_size = ph.p_memsz as usize;
        }
        offset += ph.p_memsz as usize;
        align = core::cmp::max(align, obj_align);
    }

    (contributions, TlsLayout { offsets, exec_tls_size, total_size: offset, align })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(name: &str, needed_names: Vec<&str>) -> Object {
        Object {
            name: name.to_string(),
            bytes: Vec::new(),
            base: 0,
            dyn_info: DynInfo::default(),
            tls: None,
            needed_names: needed_names.into_iter().map(String::from).collect(),
            refcount: 0,
        }
    }

    #[test]
    fn the_executable_always_starts_with_one_reference() {
        let mut objects = alloc::vec![object("a.out", alloc::vec![])];
        tally_refcounts(&mut objects);
        assert_eq!(objects[0].refcount, 1);
    }

    #[test]
    fn a_shared_dependency_is_tallied_once_per_dependent() {
        let mut objects = alloc::vec![
            object("a.out", alloc::vec!["libfoo.so", "libbar.so"]),
            object("libfoo.so", alloc::vec!["libbaz.so"]),
            object("libbar.so", alloc::vec!["libbaz.so"]),
            object("libbaz.so", alloc::vec![]),
        ];
        tally_refcounts(&mut objects);
        assert_eq!(objects[0].refcount, 1); // only the root bump
        assert_eq!(objects[1].refcount, 1); // named by a.out
        assert_eq!(objects[2].refcount, 1); // named by a.out
        assert_eq!(objects[3].refcount, 2); // named by both libfoo and libbar
    }

    #[test]
    fn tls_layout_places_the_executables_block_at_offset_zero() {
        let exe_tls = kos_elf::ProgramHeader {
            p_type: consts::PT_TLS,
            p_flags: 0,
            p_offset: 0,
            p_vaddr: 0,
            p_filesz: 4,
            p_memsz: 8,
            p_align: 4,
        };
        let mut exe = object("a.out", alloc::vec![]);
        exe.tls = Some(exe_tls);
        exe.bytes = alloc::vec![1, 2, 3, 4];

        let lib_tls = kos_elf::ProgramHeader {
            p_type: consts::PT_TLS,
            p_flags: 0,
            p_offset: 0,
            p_vaddr: 0,
            p_filesz: 2,
            p_memsz: 4,
            p_align: 4,
        };
        let mut lib = object("libfoo.so", alloc::vec![]);
        lib.tls = Some(lib_tls);
        lib.bytes = alloc::vec![5, 6];

        let graph = LibraryGraph { objects: alloc::vec![exe, lib], segments: Vec::new(), symbols: SymbolMap::new() };
        let (contributions, tls) = tls_layout(&graph);

        assert_eq!(tls.offsets, alloc::vec![Some(0), Some(8)]);
        assert_eq!(tls.exec_tls_size, 8);
        assert_eq!(tls.total_size, 12);
        assert_eq!(contributions.len(), 2);
        assert_eq!(contributions[1].offset, 8);
    }
}

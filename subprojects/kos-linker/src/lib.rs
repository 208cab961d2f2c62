//! `kos-linker`: the dynamic linker's library half (§4.6-§4.10), run by the
//! `dyldo` binary against a target task it does not itself own. Resolves
//! the `DT_NEEDED` graph, applies every relocation in the mandated order,
//! places the finished segments and the TLS info page into the target,
//! and hands back the entry point `dyldo` reports over `TaskCreatedReply`.

#![no_std]

extern crate alloc;

pub mod aslr;
pub mod dlinfo;
pub mod error;
pub mod graph;
pub mod io;
pub mod object;
pub mod reloc;
pub mod segment;
pub mod symbol;
pub mod tls_page;

use alloc::vec::Vec;

use kos_config::{tls_info_base, PAGE_SIZE};
use kos_elf::ident::Class;
use kos_elf::ElfImage;
use kos_mem::region::Region;
use kos_svc::handle::{PortHandle, TaskHandle};
use kos_svc::mem::RegionFlags;

use error::LinkError;
use graph::LibraryGraph;
use reloc::RelocTarget;

/// Result of linking one target task: its computed entry point and the
/// resolved graph, kept alive for later `dlsym`/`dl_iterate_phdr`/`dlclose`
/// calls against the same task.
pub struct LinkedImage {
    pub entry_point: u64,
    pub graph: LibraryGraph,
}

/// Resolves, relocates, and places `path`'s full dependency graph into
/// `target`, per §4.6 through §4.9. `fileio` is the legacy file-IO port
/// used to re-open every object by path; `timeout_us` bounds every RPC.
pub fn link(target: TaskHandle, fileio: PortHandle, path: &str, timeout_us: u64) -> Result<LinkedImage, LinkError> {
    let exe_bytes = io::read_whole_file(fileio, path, timeout_us)?;
    let exe_class = ElfImage::try_from_bytes(&exe_bytes)?.class();

    let mut graph = graph::resolve(fileio, path, exe_bytes, timeout_us)?;
    apply_all_relocations(&mut graph)?;

    let (contributions, tls) = graph::tls_layout(&graph);
    if tls.total_size > 0 {
        place_tls_info_page(target, exe_class, &contributions, &tls)?;
    }

    let exe_bytes = graph.objects[0].bytes.clone();
    let exe = ElfImage::try_from_bytes(&exe_bytes)?;
    let entry_point = graph.objects[0].base + exe.entry();

    segment::commit(target, core::mem::take(&mut graph.segments))?;

    Ok(LinkedImage { entry_point, graph })
}

/// Applies every object's relocations in §4.8's mandated order: the
/// executable's data relocations, then its PLT, then each library's data
/// relocations, then each library's PLT, in load order.
fn apply_all_relocations(graph: &mut LibraryGraph) -> Result<(), LinkError> {
    let (_, tls) = graph::tls_layout(graph);

    for object_index in 0..graph.objects.len() {
        let (bytes, base, dyn_info, name) = {
            let object = &graph.objects[object_index];
            (object.bytes.clone(), object.base, object.dyn_info.clone(), object.name.clone())
        };
        let target = RelocTarget {
            name: &name,
            base,
            bytes: &bytes,
            dyn_info: &dyn_info,
            object_index,
        };
        if let Some(table) = dyn_info.rel {
            reloc::apply_table(&target, &table, &mut graph.symbols, &mut graph.segments, &tls)?;
        }
        if let Some(table) = dyn_info.jmprel {
            reloc::apply_table(&target, &table, &mut graph.symbols, &mut graph.segments, &tls)?;
        }
    }
    Ok(())
}

/// Builds the TLS info page and places it at the fixed per-architecture
/// address the target's own startup stub reads (§4.9), the same
/// build-then-place sequence the root loader uses for its launch-info page.
fn place_tls_info_page(
    target: TaskHandle,
    class: Class,
    contributions: &[tls_page::TlsContribution<'_>],
    tls: &graph::TlsLayout,
) -> Result<(), LinkError> {
    let page = tls_page::build(tls.total_size, tls.align, contributions)?;

    let base = match class {
        Class::Elf32 => tls_info_base::I386 as u64,
        Class::Elf64 => tls_info_base::AMD64 as u64,
    };

    let region = Region::alloc(PAGE_SIZE as u64, RegionFlags::READ | RegionFlags::WRITE)?;
    let mut local = region.map_local()?;
    local.as_mut_slice().copy_from_slice(&page);
    let unmapped = local.unmap_local()?;
    let mut remote = unmapped.map_into(target, base)?;
    remote.tighten(RegionFlags::READ)?;
    Ok(())
}

//! The `DlInfo` surface (§4.10): `dl_iterate_phdr`, `dlsym`, `dlerror`,
//! installed as symbol overrides per §4.10's closing sentence so an
//! application can call them exactly like any other resolved symbol.
//!
//! `dlerror`'s last-error slot is process-wide rather than genuinely
//! per-thread: a real `#[thread_local]` slot needs the TLS model this
//! crate itself sets up, which is circular for the linker's own use of it.
//! A `kos_sync::Mutex`-guarded slot is the pragmatic stand-in, noted as a
//! known simplification.

use alloc::string::String;
use alloc::vec::Vec;

use kos_sync::Mutex;

use crate::graph::LibraryGraph;
use crate::symbol::ResolvedSymbol;

static LAST_ERROR: Mutex<Option<String>> = Mutex::new(None);

fn set_last_error(message: String) {
    *LAST_ERROR.lock() = Some(message);
}

/// Returns and clears the last error recorded by [`dlsym`], mirroring
/// POSIX `dlerror`'s consume-once semantics.
pub fn dlerror() -> Option<String> {
    LAST_ERROR.lock().take()
}

/// Looks up `name` in the graph's symbol map, recording an error message
/// for [`dlerror`] on a miss.
pub fn dlsym(graph: &LibraryGraph, name: &str) -> Option<ResolvedSymbol> {
    match graph.symbols.resolve(name) {
        Some(sym) => Some(*sym),
        None => {
            set_last_error(alloc::format!("undefined symbol: {name}"));
            None
        }
    }
}

/// One entry `dl_iterate_phdr` walks over: an object's name, load bias,
/// and raw program headers (so a callback can inspect segment layout the
/// way the real `dl_phdr_info` struct does).
pub struct PhdrInfo<'a> {
    pub name: &'a str,
    pub base: u64,
    pub headers: Vec<kos_elf::ProgramHeader>,
}

/// Calls `callback` once per loaded object, executable first, then every
/// library in load order, stopping early if `callback` returns `false`.
pub fn dl_iterate_phdr(graph: &LibraryGraph, mut callback: impl FnMut(&PhdrInfo<'_>) -> bool) {
    for object in &graph.objects {
        let Ok(elf) = kos_elf::ElfImage::try_from_bytes(&object.bytes) else {
            continue;
        };
        let info = PhdrInfo {
            name: &object.name,
            base: object.base,
            headers: elf.program_headers().collect(),
        };
        if !callback(&info) {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dlerror_is_consumed_once() {
        set_last_error(alloc::string::String::from("boom"));
        assert_eq!(dlerror(), Some(alloc::string::String::from("boom")));
        assert_eq!(dlerror(), None);
    }
}

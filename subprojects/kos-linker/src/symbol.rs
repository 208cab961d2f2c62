//! The symbol map (§4.7): a primary map built up as objects are loaded,
//! and an override map consulted first, installed by `COPY` relocations
//! and by the `DlInfo` surface (§4.10's "installed as symbol overrides").

use alloc::collections::BTreeMap;
use alloc::string::String;

use kos_elf::consts;

/// What kind of thing a symbol names, from `STT_*` (§4.6 step 5).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SymbolKind {
    Data,
    Function,
    ThreadLocal,
    Other,
}

impl SymbolKind {
    pub fn from_stt(ty: u8) -> Self {
        match ty {
            consts::STT_OBJECT => SymbolKind::Data,
            consts::STT_FUNC => SymbolKind::Function,
            consts::STT_TLS => SymbolKind::ThreadLocal,
            _ => SymbolKind::Other,
        }
    }
}

/// Binding strength, from `STB_*`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Binding {
    Local,
    Global,
    WeakGlobal,
}

impl Binding {
    pub fn from_stb(bind: u8) -> Self {
        match bind {
            consts::STB_LOCAL => Binding::Local,
            consts::STB_WEAK => Binding::WeakGlobal,
            _ => Binding::Global,
        }
    }
}

/// A resolved, rebased symbol (§4.6 step 5): `address = rebase(st_value)`.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedSymbol {
    pub address: u64,
    pub size: u64,
    pub kind: SymbolKind,
    pub binding: Binding,
    /// Index of the object that defines it, for diagnostics.
    pub object: usize,
}

/// Two objects both define `name` as a global symbol; raised by
/// [`SymbolMap::insert_global`], which only knows the colliding objects'
/// indices, not their display names.
#[derive(Debug, Clone)]
pub struct DuplicateGlobal {
    pub name: String,
    pub first_object: usize,
    pub second_object: usize,
}

#[derive(Default)]
pub struct SymbolMap {
    primary: BTreeMap<String, ResolvedSymbol>,
    override_map: BTreeMap<String, ResolvedSymbol>,
}

impl SymbolMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `sym` as an override, consulted before the primary map.
    /// Used for `COPY` relocations (§4.8) and the `DlInfo` surface.
    pub fn install_override(&mut self, name: String, sym: ResolvedSymbol) {
        self.override_map.insert(name, sym);
    }

    /// Registers a global/weak definition in load order. A later weak
    /// definition of an already-global name loses silently; two global
    /// definitions of the same name is a [`crate::error::LinkError::
    /// DuplicateGlobalSymbol`], left for the caller to raise since only it
    /// knows both objects' names for the diagnostic.
    pub fn insert_global(&mut self, name: String, sym: ResolvedSymbol) -> Result<(), DuplicateGlobal> {
        match self.primary.get(&name) {
            None => {
                self.primary.insert(name, sym);
                Ok(())
            }
            Some(existing) => match (existing.binding, sym.binding) {
                (Binding::Global, Binding::Global) => {
                    Err(DuplicateGlobal { name, first_object: existing.object, second_object: sym.object })
                }
                (Binding::WeakGlobal, Binding::Global) => {
                    self.primary.insert(name, sym);
                    Ok(())
                }
                // Existing is Global and the new one is weak, or both weak:
                // the earlier-loaded definition wins, matching how load
                // order already decided the winner for same-strength ties.
                _ => Ok(()),
            },
        }
    }

    pub fn resolve(&self, name: &str) -> Option<&ResolvedSymbol> {
        self.override_map.get(name).or_else(|| self.primary.get(name))
    }

    pub fn len(&self) -> usize {
        self.primary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(address: u64, binding: Binding, object: usize) -> ResolvedSymbol {
        ResolvedSymbol { address, size: 0, kind: SymbolKind::Function, binding, object }
    }

    #[test]
    fn weak_loses_to_an_existing_global() {
        let mut map = SymbolMap::new();
        map.insert_global(String::from("foo"), sym(0x1000, Binding::Global, 0)).unwrap();
        map.insert_global(String::from("foo"), sym(0x2000, Binding::WeakGlobal, 1)).unwrap();
        assert_eq!(map.resolve("foo").unwrap().address, 0x1000);
    }

    #[test]
    fn a_later_global_replaces_an_earlier_weak() {
        let mut map = SymbolMap::new();
        map.insert_global(String::from("foo"), sym(0x1000, Binding::WeakGlobal, 0)).unwrap();
        map.insert_global(String::from("foo"), sym(0x2000, Binding::Global, 1)).unwrap();
        assert_eq!(map.resolve("foo").unwrap().address, 0x2000);
    }

    #[test]
    fn two_globals_collide() {
        let mut map = SymbolMap::new();
        map.insert_global(String::from("foo"), sym(0x1000, Binding::Global, 0)).unwrap();
        let err = map.insert_global(String::from("foo"), sym(0x2000, Binding::Global, 1)).unwrap_err();
        assert_eq!(err.name, "foo");
        assert_eq!(err.first_object, 0);
        assert_eq!(err.second_object, 1);
    }

    #[test]
    fn override_is_consulted_before_primary() {
        let mut map = SymbolMap::new();
        map.insert_global(String::from("foo"), sym(0x1000, Binding::Global, 0)).unwrap();
        map.install_override(String::from("foo"), sym(0x9000, Binding::Global, 2));
        assert_eq!(map.resolve("foo").unwrap().address, 0x9000);
    }
}

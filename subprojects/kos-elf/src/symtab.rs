//! Symbol table access (§4.6 "Symbol extraction").

use zerocopy::FromBytes;

use crate::consts::st_info;
use crate::raw32::Elf32Sym;
use crate::raw64::Elf64Sym;

/// A symbol table entry, widened to 64 bits.
#[derive(Debug, Clone, Copy)]
pub struct Symbol {
    pub name_off: u32,
    pub value: u64,
    pub size: u64,
    pub binding: u8,
    pub ty: u8,
    pub shndx: u16,
}

impl From<&Elf32Sym> for Symbol {
    fn from(raw: &Elf32Sym) -> Self {
        let (binding, ty) = st_info(raw.st_info);
        Symbol {
            name_off: raw.st_name.get(),
            value: raw.st_value.get() as u64,
            size: raw.st_size.get() as u64,
            binding,
            ty,
            shndx: raw.st_shndx.get(),
        }
    }
}

impl From<&Elf64Sym> for Symbol {
    fn from(raw: &Elf64Sym) -> Self {
        let (binding, ty) = st_info(raw.st_info);
        Symbol {
            name_off: raw.st_name.get(),
            value: raw.st_value.get(),
            size: raw.st_size.get(),
            binding,
            ty,
            shndx: raw.st_shndx.get(),
        }
    }
}

/// Reads the symbol at `index` out of a `.dynsym`/`.symtab` span.
pub fn symbol_at32(bytes: &[u8], symtab_off: u64, index: u32) -> Option<Symbol> {
    let off = symtab_off as usize + index as usize * size_of::<Elf32Sym>();
    Some(Elf32Sym::ref_from_prefix(bytes.get(off..)?).ok()?.0.into())
}

pub fn symbol_at64(bytes: &[u8], symtab_off: u64, index: u32) -> Option<Symbol> {
    let off = symtab_off as usize + index as usize * size_of::<Elf64Sym>();
    Some(Elf64Sym::ref_from_prefix(bytes.get(off..)?).ok()?.0.into())
}

/// Reads a NUL-terminated string out of `.dynstr`/`.strtab` at `off`.
pub fn str_at(bytes: &[u8], strtab_off: u64, off: u32) -> Option<&str> {
    let start = strtab_off as usize + off as usize;
    let slice = bytes.get(start..)?;
    let end = slice.iter().position(|&b| b == 0)?;
    core::str::from_utf8(&slice[..end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn str_at_reads_up_to_nul() {
        let table = b"\0libc.so\0libm.so\0";
        assert_eq!(str_at(table, 0, 1), Some("libc.so"));
        assert_eq!(str_at(table, 0, 9), Some("libm.so"));
    }
}

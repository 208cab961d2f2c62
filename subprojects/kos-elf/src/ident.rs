//! `e_ident` validation (§4.5 step 1).

pub const EI_MAG0: usize = 0;
pub const EI_MAG1: usize = 1;
pub const EI_MAG2: usize = 2;
pub const EI_MAG3: usize = 3;
pub const EI_CLASS: usize = 4;
pub const EI_DATA: usize = 5;
pub const EI_VERSION: usize = 6;
pub const EI_NIDENT: usize = 16;

pub const ELFMAG: [u8; 4] = [0x7f, b'E', b'L', b'F'];

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Class {
    Elf32,
    Elf64,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum IdentError {
    #[error("bad magic {found:?}, expected {ELFMAG:?}")]
    BadMagic { found: [u8; 4] },
    #[error("unsupported ELF class {0}")]
    UnsupportedClass(u8),
    #[error("unsupported byte order {0}, only little-endian images are loadable")]
    NotLittleEndian(u8),
    #[error("unsupported e_ident version {0}")]
    BadVersion(u8),
    #[error("buffer too small to hold e_ident")]
    Truncated,
}

const ELFCLASS32: u8 = 1;
const ELFCLASS64: u8 = 2;
const ELFDATA2LSB: u8 = 1;
const EV_CURRENT: u8 = 1;

/// Validates `e_ident` and returns the image's word width.
pub fn validate(ident: &[u8]) -> Result<Class, IdentError> {
    if ident.len() < EI_NIDENT {
        return Err(IdentError::Truncated);
    }
    let magic = [ident[EI_MAG0], ident[EI_MAG1], ident[EI_MAG2], ident[EI_MAG3]];
    if magic != ELFMAG {
        return Err(IdentError::BadMagic { found: magic });
    }
    let class = match ident[EI_CLASS] {
        ELFCLASS32 => Class::Elf32,
        ELFCLASS64 => Class::Elf64,
        other => return Err(IdentError::UnsupportedClass(other)),
    };
    if ident[EI_DATA] != ELFDATA2LSB {
        return Err(IdentError::NotLittleEndian(ident[EI_DATA]));
    }
    if ident[EI_VERSION] != EV_CURRENT {
        return Err(IdentError::BadVersion(ident[EI_VERSION]));
    }
    Ok(class)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(class: u8) -> [u8; EI_NIDENT] {
        let mut buf = [0u8; EI_NIDENT];
        buf[..4].copy_from_slice(&ELFMAG);
        buf[EI_CLASS] = class;
        buf[EI_DATA] = ELFDATA2LSB;
        buf[EI_VERSION] = EV_CURRENT;
        buf
    }

    #[test]
    fn accepts_both_classes() {
        assert_eq!(validate(&ident(ELFCLASS32)).unwrap(), Class::Elf32);
        assert_eq!(validate(&ident(ELFCLASS64)).unwrap(), Class::Elf64);
    }

    #[test]
    fn rejects_big_endian() {
        let mut buf = ident(ELFCLASS64);
        buf[EI_DATA] = 2;
        assert!(matches!(validate(&buf), Err(IdentError::NotLittleEndian(2))));
    }

    #[test]
    fn rejects_bad_magic() {
        let buf = [0u8; EI_NIDENT];
        assert!(matches!(validate(&buf), Err(IdentError::BadMagic { .. })));
    }
}

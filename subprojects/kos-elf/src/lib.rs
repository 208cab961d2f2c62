//! # kos-elf
//!
//! Zero-copy ELF32/ELF64 parsing shared by the root-server loader (§4.5)
//! and the dynamic linker (§4.6-§4.8): header and `e_ident` validation,
//! program-header/`.dynamic`/symbol-table/relocation-table readers.
//! Hand-rolled rather than built on the `object`/`goblin` crates, which
//! are host-toolchain-oriented; grounded on the teacher's `nx-object::raw`
//! zerocopy struct style instead, generalized from Nintendo's NSO/NRO
//! formats to plain ELF.

#![no_std]

pub mod consts;
pub mod dynamic;
pub mod ident;
pub mod image;
pub mod program;
pub mod raw32;
pub mod raw64;
pub mod reltab;
pub mod symtab;

pub use ident::{Class, IdentError};
pub use image::{ElfImage, ImageError};
pub use program::ProgramHeader;
pub use reltab::RelEntry;
pub use symtab::Symbol;

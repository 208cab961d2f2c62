//! # kos-bundle
//!
//! Reader for the init bundle image the root server maps in at startup
//! (§3, §4.3, §6.3): the wire layout, a minimal LZFSE-compatible block
//! decoder for compressed entries, and the `Bundle`/`File` lookup API the
//! rest of the system opens files through. Grounded on the teacher's
//! `nx-object` crate, which plays the equivalent role for Horizon's RomFS
//! images.

#![no_std]

extern crate alloc;

pub mod lzfse;
pub mod raw;
pub mod read;

pub use lzfse::LzfseError;
pub use read::{Bundle, Contents, File, OpenBundleError};

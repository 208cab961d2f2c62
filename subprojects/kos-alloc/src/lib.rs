//! # kos-alloc
//!
//! The global heap allocator `rootsrv` and `dyldo` link against so the rest
//! of the tree (symbol maps, the library graph, bundle decompression
//! buffers) can use `alloc` freely. Grounded on the teacher's `nx-alloc`,
//! narrowed to the one allocator strategy this runtime needs: no feature
//! flag to opt out of being the global allocator, since both binaries that
//! depend on this crate always want it to be.

#![no_std]

pub mod global;
mod heap;

pub use global::init;

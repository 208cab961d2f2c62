//! # kos-mem
//!
//! Virtual-memory helpers layered over [`kos_svc::mem`]: page-alignment
//! arithmetic and a typed region state machine that tracks whether a
//! region is unmapped, mapped locally, or mapped into a remote task.
//! Grounded on the teacher's `nx-sys-mem`, which wraps the same kind of
//! raw SVCs in a typed `StackMemory<Unmapped | Mapped>`.

#![no_std]

pub mod alignment;
pub mod region;
pub mod stack;

pub use region::{MappedLocal, MappedRemote, MemError, Region, Unmapped};

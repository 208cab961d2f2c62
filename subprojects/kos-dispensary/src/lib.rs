//! # kos-dispensary
//!
//! The dispensary name service (§4.1): a concurrent-safe name → port
//! registry plus the RPC endpoint that exposes it, and the client-side
//! polling helper services use while waiting for a dependency to register.
//! Grounded on the teacher's `nx-service-sm` (the Horizon service manager
//! this system's dispensary plays the same role as) and `nx-rt`'s
//! `OnceLock<RwLock<Vec<...>>>` registry pattern.

#![no_std]

extern crate alloc;

pub mod client;
pub mod endpoint;
pub mod registry;
pub mod wire;

pub use client::{lookup, register_remote, wait_for};
pub use registry::{register, unregister};

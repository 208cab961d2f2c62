//! # kos-svc
//!
//! Thin, safe(r) wrappers around the kernel's system call surface (§6.1):
//! task and thread lifecycle, ports, and virtual memory regions. Grounded
//! on the teacher's `nx-svc`, which splits the same concerns into
//! `raw`/`handle`/`result` plus one module per object kind; the split
//! carries over unchanged; only the syscall ABI and object set change
//! (Horizon's handle-table SVCs and IPC buffers become this kernel's
//! six-register syscall and bare port primitive).

#![no_std]

pub mod handle;
pub mod logger;
pub mod mem;
pub mod misc;
pub mod port;
pub mod raw;
pub mod result;
pub mod task;
pub mod thread;

pub use handle::{PortHandle, RegionHandle, TaskHandle, ThreadHandle, Waitable};
pub use result::{KernelError, Result};

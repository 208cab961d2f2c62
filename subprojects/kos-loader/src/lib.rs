//! Root-server ELF loader: maps a validated `ET_EXEC` image's `PT_LOAD`
//! segments into a freshly created task, stages its stack and launch-info
//! page, and (for dynamically linked images) hands off to `dyldo` over the
//! dyldo-pipe RPC before programming the task's initial PC/SP (§4.5).

#![no_std]

extern crate alloc;

mod launch_info;
mod loader;
pub mod wire;

pub use loader::{load, LoadError};

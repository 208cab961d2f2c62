//! # kos-taskep
//!
//! The root server's task-creation endpoint (§6.2): the public RPC a
//! client calls to run a binary out of the init bundle, and the thing that
//! actually drives `kos_loader::load`. Grounded on the teacher's
//! `nx-service-sm`-style "receive a request, hand it to a subsystem, reply
//! with a status" server loop, narrowed to the one operation §2's boot
//! flow needs.

#![no_std]

extern crate alloc;

pub mod endpoint;
pub mod wire;

pub use endpoint::{serve_forever, serve_one, ServeError};

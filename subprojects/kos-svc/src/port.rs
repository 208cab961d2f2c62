//! Port syscalls: the sole IPC primitive (§6.1, §6.2).
//!
//! A port is an unordered mailbox between two tasks. Message framing (the
//! 16-byte header + payload) is a client concern layered on top in
//! `kos-sf`; this module only moves bytes.

use crate::handle::PortHandle;
use crate::raw::{self, num};
use crate::result::{self, Result};

/// Creates a new port, owned by the calling task.
pub fn create() -> Result<PortHandle> {
    let code = unsafe { raw::syscall0(num::PORT_CREATE) };
    let raw_handle = result::decode(code)?;
    Ok(unsafe { PortHandle::from_raw(raw_handle) })
}

/// Sends `buf` to `port`. Never blocks the sender past enqueueing.
pub fn send(port: PortHandle, buf: &[u8]) -> Result<()> {
    let code = unsafe {
        raw::syscall3(
            num::PORT_SEND,
            port.to_raw(),
            buf.as_ptr() as u64,
            buf.len() as u64,
        )
    };
    result::check(code)
}

/// Receives into `buf`, blocking up to `timeout_us` microseconds
/// (`u64::MAX` blocks indefinitely). Returns the number of bytes received.
pub fn receive(port: PortHandle, buf: &mut [u8], timeout_us: u64) -> Result<usize> {
    let code = unsafe {
        raw::syscall4(
            num::PORT_RECEIVE,
            port.to_raw(),
            buf.as_mut_ptr() as u64,
            buf.len() as u64,
            timeout_us,
        )
    };
    result::decode(code).map(|n| n as usize)
}

/// Destroys a port. Pending messages are dropped.
pub fn destroy(port: PortHandle) -> Result<()> {
    let code = unsafe { raw::syscall1(num::PORT_DESTROY, port.to_raw()) };
    result::check(code)
}

//! Errors surfaced by the RPC framing layer (§7: `RpcTimeout` / `RpcMalformed`).

use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum PacketError {
    /// Underlying port operation failed.
    #[error("port operation failed: {0}")]
    Port(#[from] kos_svc::KernelError),
    /// A reply (or request) arrived with fewer than 16 header bytes, or a
    /// payload shorter than the caller's buffer requires.
    #[error("malformed rpc packet: received {received} bytes, need at least {needed}")]
    Malformed { received: usize, needed: usize },
    /// The peer's `port_receive` call exceeded its timeout before a message
    /// arrived; surfaced as a distinct variant even though the kernel
    /// already reports it via [`kos_svc::KernelError::Timeout`], so callers
    /// can match on RPC semantics without reaching into the kernel layer.
    #[error("rpc timed out")]
    Timeout,
}

impl PacketError {
    pub(crate) fn from_kernel(err: kos_svc::KernelError) -> Self {
        match err {
            kos_svc::KernelError::Timeout => PacketError::Timeout,
            other => PacketError::Port(other),
        }
    }
}

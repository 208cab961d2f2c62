//! Kernel result codes.
//!
//! Every syscall wrapper in [`crate::task`], [`crate::thread`],
//! [`crate::port`], and [`crate::mem`] returns [`Result`]. The raw ABI is a
//! signed code: `0` on success, a negative small integer identifying the
//! failure otherwise (§7's abstract error kinds, narrowed here to what a
//! syscall itself can report — higher layers such as the linker and loader
//! layer their own `thiserror` enums on top of this one, e.g.
//! `kos-loader::MapFailed`, wrapping a [`KernelError`] as its source).

use thiserror::Error;

use crate::raw::RawCode;

/// Result alias for fallible syscall wrappers.
pub type Result<T, E = KernelError> = core::result::Result<T, E>;

/// A syscall-level failure, decoded from a negative [`RawCode`].
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum KernelError {
    /// A handle argument did not name a live kernel object.
    #[error("invalid handle")]
    InvalidHandle,
    /// `alloc_virtual_anon_region`/`map_virtual_region_*` could not satisfy
    /// the request (no free range, or `flags` rejected by the kernel).
    #[error("virtual memory allocation or mapping failed")]
    MapFailed,
    /// A `port_receive` call's timeout elapsed with no message pending.
    #[error("rpc timed out")]
    Timeout,
    /// An argument was out of range or otherwise rejected by the kernel.
    #[error("invalid argument")]
    InvalidArgument,
    /// The kernel returned a code this wrapper does not recognize.
    #[error("unrecognized kernel error code {0}")]
    Unknown(i64),
}

impl KernelError {
    pub(crate) fn from_raw(code: RawCode) -> Self {
        match code {
            -1 => KernelError::InvalidHandle,
            -2 => KernelError::MapFailed,
            -3 => KernelError::Timeout,
            -4 => KernelError::InvalidArgument,
            other => KernelError::Unknown(other),
        }
    }
}

/// Decodes a raw syscall return into `Ok(())` on `0`, or the matching
/// [`KernelError`] otherwise.
pub(crate) fn check(code: RawCode) -> Result<()> {
    if code == 0 {
        Ok(())
    } else {
        Err(KernelError::from_raw(code))
    }
}

/// Decodes a raw syscall return, mapping success to `value`.
pub(crate) fn check_value<T>(code: RawCode, value: T) -> Result<T> {
    check(code).map(|()| value)
}

/// Decodes a syscall whose non-negative return is itself a value (a newly
/// allocated handle, a byte count) rather than a plain success marker.
pub(crate) fn decode(code: RawCode) -> Result<u64> {
    if code < 0 {
        Err(KernelError::from_raw(code))
    } else {
        Ok(code as u64)
    }
}

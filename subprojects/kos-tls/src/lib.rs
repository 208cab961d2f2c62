//! # kos-tls
//!
//! TLS block allocation, population, and architectural base-register
//! programming for `setup_tls`/`teardown_tls`/`get_tls_info` (§4.9).
//!
//! Grounded on the teacher's `nx-sys-thread-tls`: both crates own a
//! fixed-layout, self-referential control structure that a single register
//! (`TPIDRRO_EL0` there, `%fs`/`%gs` base here) points at. The teacher's
//! block is kernel-allocated and fixed-size per Horizon's ABI; this one is
//! allocated by the linker itself since the target kernel has no dedicated
//! TLS syscall beyond setting the base register (§6.1), so the layout
//! math of §4.9 steps 1-3 lives here rather than in the kernel.

#![no_std]

extern crate alloc;

pub mod info_page;

use alloc::alloc::{alloc_zeroed, dealloc, Layout};
use core::mem::size_of;

use kos_config::MIN_TLS_SIZE;
use thiserror::Error;

/// Pointer width in bytes, used as the baseline TLS alignment (§4.9 step 1).
const WORD_ALIGN: usize = size_of::<usize>();

/// One object's contribution to the combined TLS image, as recorded by the
/// linker while walking `PT_TLS` segments in load order (§4.9 intro).
#[derive(Debug, Clone, Copy)]
pub struct TlsObject<'a> {
    /// Offset of this object's block within the combined TLS image. The
    /// executable is always offset zero; libraries follow in load order.
    pub offset: usize,
    /// Bytes copied verbatim from the object's `PT_TLS` file contents
    /// (`.tdata`). Shorter than the object's total TLS size when the
    /// object also has `.tbss`, which is left zeroed.
    pub tdata: &'a [u8],
}

/// Combined size and alignment of every loaded object's TLS blocks.
#[derive(Debug, Clone, Copy)]
pub struct TlsLayout {
    pub total_size: usize,
    pub align: usize,
}

/// The trailing self-referential control structure (§4.9 step 5). Exactly
/// three pointer-sized fields: `self` makes the block discoverable once
/// only the base register is known, `base` and `tls` both point at the
/// start of the variable-sized data region ahead of this struct.
#[repr(C)]
pub struct TlsBlock {
    pub myself: *mut TlsBlock,
    pub base: usize,
    pub tls: usize,
}

static_assertions::const_assert_eq!(size_of::<TlsBlock>(), 3 * WORD_ALIGN);

#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum TlsError {
    #[error("tls allocation failed")]
    AllocFailed,
    #[error("kernel rejected the tls base register update: {0}")]
    Kernel(#[from] kos_svc::KernelError),
}

/// Allocates, populates, and installs a thread's TLS block (§4.9 steps 1-7).
///
/// # Safety
///
/// Must be called at most once per thread, before any thread-local access,
/// and from the thread the TLS block is being installed for.
pub unsafe fn setup_tls(layout: TlsLayout, objects: &[TlsObject<'_>]) -> Result<*mut TlsBlock, TlsError> {
    let alignment = core::cmp::max(WORD_ALIGN, layout.align);
    let actual = round_up(layout.total_size, alignment);
    let allocated = core::cmp::max(MIN_TLS_SIZE, actual);

    let block_layout = Layout::from_size_align(allocated + size_of::<TlsBlock>(), alignment)
        .map_err(|_| TlsError::AllocFailed)?;
    let base_ptr = unsafe { alloc_zeroed(block_layout) };
    if base_ptr.is_null() {
        return Err(TlsError::AllocFailed);
    }
    let base = base_ptr as usize;

    for object in objects {
        let dst = unsafe { base_ptr.add(object.offset) };
        unsafe { core::ptr::copy_nonoverlapping(object.tdata.as_ptr(), dst, object.tdata.len()) };
    }

    let block_ptr = unsafe { base_ptr.add(allocated) } as *mut TlsBlock;
    unsafe {
        block_ptr.write(TlsBlock {
            myself: block_ptr,
            base,
            tls: base,
        });
    }

    kos_svc::mem::set_tls_base(block_ptr as u64)?;

    Ok(block_ptr)
}

/// Recovers the current thread's [`TlsBlock`] by reading the architectural
/// base register directly (the self-pointer trick means no syscall round
/// trip is needed to locate it), frees the allocation, and clears the base.
///
/// # Safety
///
/// Must be called at most once per thread, after the last thread-local
/// access, and the thread must have previously called [`setup_tls`].
pub unsafe fn teardown_tls(layout: TlsLayout) -> Result<(), TlsError> {
    let block_ptr = unsafe { current_block() };
    let alignment = core::cmp::max(WORD_ALIGN, layout.align);
    let actual = round_up(layout.total_size, alignment);
    let allocated = core::cmp::max(MIN_TLS_SIZE, actual);

    let base = unsafe { (*block_ptr).base } as *mut u8;
    let block_layout = Layout::from_size_align(allocated + size_of::<TlsBlock>(), alignment)
        .map_err(|_| TlsError::AllocFailed)?;
    unsafe { dealloc(base, block_layout) };

    kos_svc::mem::set_tls_base(0)?;
    Ok(())
}

/// Reads the executable's TLS template span and combined size, for
/// implementations that need to allocate TLS themselves (§4.9).
pub fn get_tls_info(executable: TlsObject<'_>, layout: TlsLayout) -> (&[u8], usize) {
    (executable.tdata, layout.total_size)
}

fn round_up(value: usize, alignment: usize) -> usize {
    (value + alignment - 1) & !(alignment - 1)
}

/// Reads the current thread's TLS base register and returns the block it
/// points at, relying on the self-referential `myself` field to avoid a
/// dedicated "get TLS base" syscall.
unsafe fn current_block() -> *mut TlsBlock {
    let base: usize;
    #[cfg(target_arch = "x86_64")]
    unsafe {
        core::arch::asm!("mov {0}, fs:0", out(reg) base, options(nostack, readonly));
    }
    #[cfg(target_arch = "x86")]
    unsafe {
        core::arch::asm!("mov {0}, gs:0", out(reg) base, options(nostack, readonly));
    }
    base as *mut TlsBlock
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_up_matches_manual_alignment() {
        assert_eq!(round_up(10, 8), 16);
        assert_eq!(round_up(16, 8), 16);
        assert_eq!(round_up(0, 8), 0);
    }

    #[test]
    fn allocated_never_smaller_than_min_tls() {
        let alignment = core::cmp::max(WORD_ALIGN, 8);
        let actual = round_up(4, alignment);
        let allocated = core::cmp::max(MIN_TLS_SIZE, actual);
        assert_eq!(allocated, MIN_TLS_SIZE);
    }
}

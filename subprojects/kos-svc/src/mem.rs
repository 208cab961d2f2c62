//! Virtual memory region syscalls (§6.1).
//!
//! Every mapping, in the calling task or a remote one, goes through an
//! anonymous [`RegionHandle`] first: `alloc_virtual_anon_region` reserves
//! backing pages, then one of the `map_virtual_region_*` calls places them
//! into an address space. This two-step shape is what lets the root-server
//! loader build a target task's image without ever running code in it
//! (§4.5: allocate in the loader's own space, populate, map into the
//! target, then unmap from the loader).

use bitflags::bitflags;

use crate::handle::RegionHandle;
use crate::raw::{self, num, Handle};
use crate::result::{self, Result};

bitflags! {
    /// Page protection and allocation flags (§6.1).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RegionFlags: u32 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const EXEC = 1 << 2;
        /// Forces immediate physical backing instead of demand paging.
        const FORCE_ALLOC = 1 << 3;
    }
}

/// Metadata returned by [`get_info`].
#[derive(Debug, Clone, Copy)]
pub struct RegionInfo {
    pub base: u64,
    pub len: u64,
    pub flags: RegionFlags,
}

/// Reserves `size` bytes of anonymous memory with the given protection.
pub fn alloc_anon_region(size: u64, flags: RegionFlags) -> Result<RegionHandle> {
    let code = unsafe {
        raw::syscall2(num::ALLOC_VIRTUAL_ANON_REGION, size, flags.bits() as u64)
    };
    let raw_handle = result::decode(code)?;
    Ok(unsafe { RegionHandle::from_raw(raw_handle) })
}

/// Maps `region` into `task` at a kernel-chosen address, returning it.
pub fn map_to(region: RegionHandle, task: Handle, addr_hint: u64) -> Result<u64> {
    let code = unsafe {
        raw::syscall3(num::MAP_VIRTUAL_REGION_TO, region.to_raw(), task, addr_hint)
    };
    result::decode(code)
}

/// Maps `region` into the calling task somewhere within `[lo, hi)`,
/// returning the base address the kernel chose.
pub fn map_range(region: RegionHandle, lo: u64, hi: u64, size: u64, flags: RegionFlags) -> Result<u64> {
    let mut base: u64 = 0;
    let code = unsafe {
        raw::syscall6(
            num::MAP_VIRTUAL_REGION_RANGE,
            region.to_raw(),
            lo,
            hi,
            size,
            flags.bits() as u64,
            &mut base as *mut u64 as u64,
        )
    };
    result::check_value(code, base)
}

/// Maps `region` into `task` at the exact address `addr` (no kernel choice).
pub fn map_remote(task: Handle, region: RegionHandle, addr: u64, size: u64, flags: RegionFlags) -> Result<()> {
    let code = unsafe {
        raw::syscall5(
            num::MAP_VIRTUAL_REGION_REMOTE,
            task,
            region.to_raw(),
            addr,
            size,
            flags.bits() as u64,
        )
    };
    result::check(code)
}

/// Removes a mapping previously established for `region`.
pub fn unmap(region: RegionHandle) -> Result<()> {
    let code = unsafe { raw::syscall1(num::UNMAP_VIRTUAL_REGION, region.to_raw()) };
    result::check(code)
}

/// Changes the protection of an existing mapping (used after relocation to
/// drop `WRITE` from a segment whose `p_flags` demanded it only for the
/// relocation pass, per the "no mapping both writable and executable"
/// invariant of §8).
pub fn set_flags(region: RegionHandle, flags: RegionFlags) -> Result<()> {
    let code = unsafe {
        raw::syscall2(num::VIRTUAL_REGION_SET_FLAGS, region.to_raw(), flags.bits() as u64)
    };
    result::check(code)
}

/// Reads back a region's current base, length, and flags.
pub fn get_info(region: RegionHandle) -> Result<RegionInfo> {
    let mut base: u64 = 0;
    let mut len: u64 = 0;
    let mut flags_raw: u64 = 0;
    let code = unsafe {
        raw::syscall4(
            num::VIRTUAL_REGION_GET_INFO,
            region.to_raw(),
            &mut base as *mut u64 as u64,
            &mut len as *mut u64 as u64,
            &mut flags_raw as *mut u64 as u64,
        )
    };
    result::check(code)?;
    Ok(RegionInfo {
        base,
        len,
        flags: RegionFlags::from_bits_truncate(flags_raw as u32),
    })
}

/// Resolves the region handle that owns the mapping containing `addr`.
pub fn get_handle_for_addr(addr: u64) -> Result<RegionHandle> {
    let mut handle_raw: u64 = 0;
    let code = unsafe {
        raw::syscall2(
            num::VIRTUAL_GET_HANDLE_FOR_ADDR,
            addr,
            &mut handle_raw as *mut u64 as u64,
        )
    };
    result::check(code)?;
    Ok(unsafe { RegionHandle::from_raw(handle_raw) })
}

/// Sets the `%fs`/`%gs` base register for the calling thread (§4.9).
pub fn set_tls_base(base: u64) -> Result<()> {
    let code = unsafe { raw::syscall1(num::ARCH_SET_TLS_BASE, base) };
    result::check(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_flags_exclude_force_alloc_by_default() {
        let rw = RegionFlags::READ | RegionFlags::WRITE;
        assert!(!rw.contains(RegionFlags::FORCE_ALLOC));
        assert!(!rw.contains(RegionFlags::EXEC));
    }
}

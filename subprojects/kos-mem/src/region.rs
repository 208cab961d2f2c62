//! Typed state machine over [`kos_svc::mem`] regions.
//!
//! The loader's build-then-place sequence (§4.5 step 3: "allocate in the
//! loader's own space, populate, map into the target, then unmap from the
//! loader") is exactly the `Unmapped` → `MappedLocal` → `Unmapped` →
//! `MappedRemote` cycle modeled here, the same shape the teacher's
//! `nx-sys-mem::stack::StackMemory<Unmapped|Mapped>` uses for thread
//! stacks. Encoding the state in the type means a caller cannot read from
//! a region that was never mapped locally, nor forget to unmap before
//! reusing the handle for a remote placement.

use core::marker::PhantomData;
use core::slice;

use kos_svc::handle::{RegionHandle, TaskHandle};
use kos_svc::mem::{self, RegionFlags};
use thiserror::Error;

/// Failure from a region lifecycle operation.
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum MemError {
    #[error("kernel rejected the memory operation: {0}")]
    Kernel(#[from] kos_svc::KernelError),
}

type Result<T> = core::result::Result<T, MemError>;

mod sealed {
    pub trait Sealed {}
}

/// Marker for a [`Region`]'s current placement.
pub trait RegionState: sealed::Sealed {}

/// Backing pages exist but are not mapped anywhere.
pub struct Unmapped;
impl sealed::Sealed for Unmapped {}
impl RegionState for Unmapped {}

/// Mapped into the calling task's own address space at `addr`.
pub struct MappedLocal;
impl sealed::Sealed for MappedLocal {}
impl RegionState for MappedLocal {}

/// Mapped into a remote task; the caller holds no local pointer to it.
pub struct MappedRemote;
impl sealed::Sealed for MappedRemote {}
impl RegionState for MappedRemote {}

/// An anonymous virtual memory region, tagged with its current placement.
pub struct Region<S: RegionState> {
    handle: RegionHandle,
    size: u64,
    flags: RegionFlags,
    addr: u64,
    _state: PhantomData<S>,
}

impl Region<Unmapped> {
    /// Reserves `size` bytes of anonymous backing with `flags` (§6.1
    /// `alloc_virtual_anon_region`). Not mapped anywhere yet.
    pub fn alloc(size: u64, flags: RegionFlags) -> Result<Self> {
        let handle = mem::alloc_anon_region(size, flags)?;
        Ok(Region {
            handle,
            size,
            flags,
            addr: 0,
            _state: PhantomData,
        })
    }

    /// Maps the region into the calling task's own address space so its
    /// contents can be populated before being placed into a target task.
    pub fn map_local(self) -> Result<Region<MappedLocal>> {
        self.map_local_in_range(0, u64::MAX)
    }

    /// Maps the region into the calling task somewhere within `[lo, hi)`,
    /// letting the kernel pick the exact base. Used by the dynamic linker
    /// to place a library's mapping within its architecture's ASLR
    /// aperture (§4.6 step 4) — the kernel, not the linker, is the source
    /// of placement entropy.
    pub fn map_local_in_range(self, lo: u64, hi: u64) -> Result<Region<MappedLocal>> {
        let base = mem::map_range(self.handle, lo, hi, self.size, self.flags)?;
        Ok(Region {
            handle: self.handle,
            size: self.size,
            flags: self.flags,
            addr: base,
            _state: PhantomData,
        })
    }

    /// Maps the region directly into `task` at the exact address `addr`,
    /// skipping the local-population step (used for regions whose content
    /// the kernel fills in, e.g. a fresh stack).
    pub fn map_into(self, task: TaskHandle, addr: u64) -> Result<Region<MappedRemote>> {
        mem::map_remote(task.to_raw(), self.handle, addr, self.size, self.flags)?;
        Ok(Region {
            handle: self.handle,
            size: self.size,
            flags: self.flags,
            addr,
            _state: PhantomData,
        })
    }
}

impl Region<MappedLocal> {
    /// Byte view of the populated region.
    pub fn as_slice(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.addr as *const u8, self.size as usize) }
    }

    /// Mutable byte view, used while the loader is writing segment
    /// contents or relocated bytes.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(self.addr as *mut u8, self.size as usize) }
    }

    /// Unmaps from the caller's address space, returning to [`Unmapped`] so
    /// the same backing pages can be placed into a target task.
    pub fn unmap_local(self) -> Result<Region<Unmapped>> {
        mem::unmap(self.handle)?;
        Ok(Region {
            handle: self.handle,
            size: self.size,
            flags: self.flags,
            addr: 0,
            _state: PhantomData,
        })
    }
}

impl Region<MappedRemote> {
    /// The address this region was placed at in the remote task.
    pub fn addr(&self) -> u64 {
        self.addr
    }

    /// Drops `WRITE` from a remote mapping once relocation is done, upholding
    /// the "no mapping both writable and executable" invariant of §8.
    pub fn tighten(&mut self, flags: RegionFlags) -> Result<()> {
        mem::set_flags(self.handle, flags)?;
        self.flags = flags;
        Ok(())
    }

    /// Unmaps from the target task. Used by the loader's structured cleanup
    /// when a later step fails partway through placing segments (§7
    /// "unwind by unmapping regions mapped so far").
    pub fn unmap(self) -> Result<()> {
        mem::unmap(self.handle)?;
        Ok(())
    }
}

impl<S: RegionState> Region<S> {
    pub fn handle(&self) -> RegionHandle {
        self.handle
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

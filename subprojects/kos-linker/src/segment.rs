//! Per-object segment staging (§4.6 step 4 / §4.8): each `PT_LOAD` is
//! mapped locally, populated from the file, and kept mapped while
//! relocations are written into it; only once every object has been
//! relocated are segments unmapped from the linker and placed into the
//! target task, mirroring the root-server loader's own build-then-place
//! sequence (`kos_loader::loader::place_segment`) generalized across
//! several objects whose relocations can cross-reference each other.

use alloc::vec::Vec;

use kos_config::PAGE_SIZE;
use kos_elf::consts::SegmentFlags;
use kos_mem::region::{MappedLocal, MappedRemote, Region};
use kos_svc::handle::TaskHandle;
use kos_svc::mem::RegionFlags;

use crate::error::LinkError;

/// One `PT_LOAD` segment, still mapped in the linker's own address space,
/// tagged with the address it will occupy in the target task.
pub struct LocalSegment {
    pub target_base: u64,
    pub local: Region<MappedLocal>,
    pub final_flags: RegionFlags,
}

impl LocalSegment {
    fn contains(&self, vaddr: u64) -> bool {
        vaddr >= self.target_base && vaddr < self.target_base + self.local.size()
    }

    /// Writes `bytes` at target-space address `vaddr`, if this segment
    /// covers it.
    pub fn write_at(&mut self, vaddr: u64, bytes: &[u8]) -> bool {
        if !self.contains(vaddr) {
            return false;
        }
        let off = (vaddr - self.target_base) as usize;
        self.local.as_mut_slice()[off..off + bytes.len()].copy_from_slice(bytes);
        true
    }

    /// Reads back the 32- or 64-bit word at target-space address `vaddr`,
    /// used by relocation kinds that add to the existing value (§4.8:
    /// i386's implicit-addend `DT_REL` entries).
    pub fn read_word(&self, vaddr: u64, width: usize) -> Option<u64> {
        if !self.contains(vaddr) {
            return None;
        }
        let off = (vaddr - self.target_base) as usize;
        let bytes = self.local.as_slice();
        match width {
            4 => Some(u32::from_le_bytes(bytes[off..off + 4].try_into().ok()?) as u64),
            8 => Some(u64::from_le_bytes(bytes[off..off + 8].try_into().ok()?)),
            _ => None,
        }
    }
}

/// Finds the segment covering `vaddr` and writes `bytes` into it.
pub fn write_at(segments: &mut [LocalSegment], vaddr: u64, bytes: &[u8]) -> Result<(), LinkError> {
    for seg in segments.iter_mut() {
        if seg.write_at(vaddr, bytes) {
            return Ok(());
        }
    }
    Err(LinkError::RelocationOutOfRange(vaddr))
}

pub fn read_word(segments: &[LocalSegment], vaddr: u64, width: usize) -> Option<u64> {
    segments.iter().find_map(|seg| seg.read_word(vaddr, width))
}

/// Copies `len` bytes starting at target-space address `vaddr`, for `COPY`
/// relocations (§4.8), which pull a library's initial data into the
/// executable's own `.bss` reservation.
pub fn read_bytes(segments: &[LocalSegment], vaddr: u64, len: usize) -> Option<Vec<u8>> {
    let seg = segments.iter().find(|seg| seg.contains(vaddr))?;
    let off = (vaddr - seg.target_base) as usize;
    Some(seg.local.as_slice()[off..off + len].to_vec())
}

/// Maps one `PT_LOAD` segment locally at `base + p_vaddr`, zero-filled and
/// populated with its file contents, ready for relocation.
pub fn stage(base: u64, image: &[u8], ph: &kos_elf::ProgramHeader) -> Result<LocalSegment, LinkError> {
    let seg_flags = SegmentFlags::from_bits_truncate(ph.p_flags);
    if seg_flags.contains(SegmentFlags::WRITE | SegmentFlags::EXEC) {
        return Err(LinkError::WriteExec);
    }
    let target_vaddr = base + ph.p_vaddr;
    let page_off = (target_vaddr % PAGE_SIZE as u64) as usize;
    let alloc_size = round_up(ph.p_memsz as usize + page_off, PAGE_SIZE) as u64;

    let region = Region::alloc(alloc_size, RegionFlags::READ | RegionFlags::WRITE)?;
    let mut local = region.map_local()?;
    let slice = local.as_mut_slice();
    slice.fill(0);
    let src = &image[ph.p_offset as usize..ph.p_offset as usize + ph.p_filesz as usize];
    slice[page_off..page_off + src.len()].copy_from_slice(src);

    Ok(LocalSegment {
        target_base: target_vaddr & !(PAGE_SIZE as u64 - 1),
        local,
        final_flags: translate_flags(seg_flags),
    })
}

/// Unmaps every staged segment from the linker and places it into `target`
/// at its recorded address, tightening to its final protection.
pub fn commit(target: TaskHandle, segments: Vec<LocalSegment>) -> Result<Vec<Region<MappedRemote>>, LinkError> {
    let mut placed = Vec::with_capacity(segments.len());
    for seg in segments {
        let unmapped = seg.local.unmap_local()?;
        let mut remote = unmapped.map_into(target, seg.target_base)?;
        remote.tighten(seg.final_flags)?;
        placed.push(remote);
    }
    Ok(placed)
}

fn translate_flags(pf: SegmentFlags) -> RegionFlags {
    let mut flags = RegionFlags::empty();
    if pf.contains(SegmentFlags::READ) {
        flags |= RegionFlags::READ;
    }
    if pf.contains(SegmentFlags::WRITE) {
        flags |= RegionFlags::WRITE;
    }
    if pf.contains(SegmentFlags::EXEC) {
        flags |= RegionFlags::EXEC;
    }
    flags
}

fn round_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

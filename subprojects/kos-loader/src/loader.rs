//! Root-server ELF loader (§4.5).

extern crate alloc;

use alloc::vec::Vec;

use kos_config::{launch_info_base, stack_base, PAGE_SIZE};
use kos_elf::consts::{self, SegmentFlags};
use kos_elf::ident::Class;
use kos_elf::{ElfImage, ImageError};
use kos_mem::region::{MemError, Region};
use kos_mem::stack;
use kos_sf::{Client, PacketError};
use kos_svc::handle::{PortHandle, TaskHandle};
use kos_svc::mem::RegionFlags;
use kos_svc::{task, KernelError};

use crate::launch_info::{self, BuildError};
use crate::wire::{self, TASK_CREATED_REQUEST};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error("e_type {0:#x} is not ET_EXEC")]
    NotExecutable(u16),
    #[error("e_machine {0:#x} does not match this kernel's architecture")]
    UnsupportedArch(u16),
    #[error("PT_LOAD segments at {0:#x} and {1:#x} overlap")]
    OverlappingLoad(u64, u64),
    #[error("PT_LOAD p_memsz ({memsz}) is smaller than p_filesz ({filesz})")]
    FilesizeExceedsMemsz { filesz: u64, memsz: u64 },
    #[error("PT_LOAD requests both WRITE and EXEC, refused")]
    WriteExec,
    #[error("PT_LOAD p_align does not divide (p_vaddr - p_offset)")]
    BadAlign,
    #[error(transparent)]
    Mem(#[from] MemError),
    #[error(transparent)]
    LaunchInfo(#[from] BuildError),
    #[error("image has PT_INTERP/PT_DYNAMIC but no dyldo port was supplied")]
    MissingDyldo,
    #[error(transparent)]
    Rpc(#[from] PacketError),
    #[error("dyldo rejected the task with status {0}")]
    DyldoRejected(i32),
    #[error(transparent)]
    Kernel(#[from] KernelError),
}

/// Loads `image` into `target` and programs its initial PC/SP, per §4.5's
/// six steps. `dyldo` is the dynamic linker's well-known port, required
/// only if the image carries `PT_INTERP`/`PT_DYNAMIC`.
pub fn load(
    target: TaskHandle,
    image: &[u8],
    path: &str,
    args: &[&str],
    dyldo: Option<PortHandle>,
) -> Result<(), LoadError> {
    let elf = ElfImage::try_from_bytes(image)?;
    if elf.ty() != consts::ET_EXEC {
        return Err(LoadError::NotExecutable(elf.ty()));
    }
    if elf.machine() != expected_machine() {
        return Err(LoadError::UnsupportedArch(elf.machine()));
    }

    check_no_overlap(&elf)?;

    // A dynamic image's PT_LOAD segments are placed by dyldo, not here:
    // dyldo needs to hold the region handles it placed them with in order
    // to later tighten their protection once relocations are written, and
    // handles aren't transferable across tasks over this RPC. The loader
    // only places segments for statically linked (no PT_INTERP/PT_DYNAMIC)
    // images.
    let is_dynamic = elf
        .program_headers()
        .any(|ph| matches!(ph.p_type, consts::PT_INTERP | consts::PT_DYNAMIC));

    let mut mapped = Vec::new();

    if !is_dynamic {
        for ph in elf.program_headers().filter(|ph| ph.p_type == consts::PT_LOAD) {
            match place_segment(target, image, &ph) {
                Ok(Some(region)) => mapped.push(region),
                Ok(None) => {}
                Err(err) => {
                    unwind(mapped);
                    return Err(err);
                }
            }
        }
    }

    let (stack_base, launch_info_base) = match elf.class() {
        Class::Elf32 => (stack_base::I386 as u64, launch_info_base::I386 as u64),
        Class::Elf64 => (stack_base::AMD64 as u64, launch_info_base::AMD64 as u64),
    };

    match stage_launch_info(target, launch_info_base, path, args) {
        Ok(region) => mapped.push(region),
        Err(err) => {
            unwind(mapped);
            return Err(err);
        }
    }

    let sp = match stack::stage_for_task(target, stack_base, launch_info_base, None) {
        Ok(sp) => sp,
        Err(err) => {
            unwind(mapped);
            return Err(err.into());
        }
    };

    let entry_point = if is_dynamic {
        let Some(dyldo) = dyldo else {
            unwind(mapped);
            return Err(LoadError::MissingDyldo);
        };
        match invoke_dyldo(dyldo, target, path) {
            Ok(entry) => entry,
            Err(err) => {
                unwind(mapped);
                return Err(err);
            }
        }
    } else {
        elf.entry()
    };

    if let Err(err) = task::initialize(target, entry_point, sp) {
        unwind(mapped);
        return Err(err.into());
    }

    Ok(())
}

fn expected_machine() -> u16 {
    #[cfg(target_arch = "x86_64")]
    {
        consts::EM_X86_64
    }
    #[cfg(target_arch = "x86")]
    {
        consts::EM_386
    }
}

/// Sorted-interval scan over every `PT_LOAD`'s `[p_vaddr, p_vaddr+p_memsz)`.
fn check_no_overlap(elf: &ElfImage<'_>) -> Result<(), LoadError> {
    let loads = || elf.program_headers().filter(|ph| ph.p_type == consts::PT_LOAD && ph.p_memsz > 0);

    for (i, a) in loads().enumerate() {
        for (j, b) in loads().enumerate() {
            if i >= j {
                continue;
            }
            let a_end = a.p_vaddr + a.p_memsz;
            let b_end = b.p_vaddr + b.p_memsz;
            if a.p_vaddr < b_end && b.p_vaddr < a_end {
                return Err(LoadError::OverlappingLoad(a.p_vaddr, b.p_vaddr));
            }
        }
    }
    Ok(())
}

fn place_segment(
    target: TaskHandle,
    image: &[u8],
    ph: &kos_elf::ProgramHeader,
) -> Result<Option<Region<kos_mem::region::MappedRemote>>, LoadError> {
    if ph.p_memsz == 0 {
        return Ok(None);
    }
    if ph.p_memsz < ph.p_filesz {
        return Err(LoadError::FilesizeExceedsMemsz {
            filesz: ph.p_filesz,
            memsz: ph.p_memsz,
        });
    }
    let seg_flags = SegmentFlags::from_bits_truncate(ph.p_flags);
    if seg_flags.contains(SegmentFlags::WRITE | SegmentFlags::EXEC) {
        return Err(LoadError::WriteExec);
    }
    if ph.p_align > 1 && ph.p_vaddr % ph.p_align != ph.p_offset % ph.p_align {
        return Err(LoadError::BadAlign);
    }

    let page_off = (ph.p_vaddr % PAGE_SIZE as u64) as usize;
    let alloc_size = round_up(ph.p_memsz as usize + page_off, PAGE_SIZE) as u64;

    let region = Region::alloc(alloc_size, RegionFlags::READ | RegionFlags::WRITE)?;
    let mut local = region.map_local()?;
    let slice = local.as_mut_slice();
    slice.fill(0);
    let src = &image[ph.p_offset as usize..ph.p_offset as usize + ph.p_filesz as usize];
    slice[page_off..page_off + src.len()].copy_from_slice(src);
    let unmapped = local.unmap_local()?;

    let remote_base = ph.p_vaddr & !(PAGE_SIZE as u64 - 1);
    let mut remote = unmapped.map_into(target, remote_base)?;
    remote.tighten(translate_flags(seg_flags))?;
    Ok(Some(remote))
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

fn stage_launch_info(
    target: TaskHandle,
    base: u64,
    path: &str,
    args: &[&str],
) -> Result<Region<kos_mem::region::MappedRemote>, LoadError> {
    let page = launch_info::build(base, path, args)?;
    let region = Region::alloc(PAGE_SIZE as u64, RegionFlags::READ | RegionFlags::WRITE)?;
    let mut local = region.map_local()?;
    local.as_mut_slice().copy_from_slice(&page);
    let unmapped = local.unmap_local()?;
    let mut remote = unmapped.map_into(target, base)?;
    remote.tighten(RegionFlags::READ)?;
    Ok(remote)
}

fn invoke_dyldo(dyldo: PortHandle, target: TaskHandle, path: &str) -> Result<u64, LoadError> {
    let client = Client::connect(dyldo)?;
    let mut payload = [0u8; 512];
    let len = wire::encode_request(target.to_raw(), path, &mut payload)
        .ok_or(PacketError::Malformed { received: 0, needed: 8 + path.len() })?;
    let mut recv_buf = [0u8; 256];
    let (_, received) = client.call(TASK_CREATED_REQUEST, 0, &payload[..len], &mut recv_buf, u64::MAX)?;
    let reply = wire::decode_reply(&recv_buf[16..received])
        .map_err(|_| PacketError::Malformed { received, needed: 36 })?;
    if reply.status != 0 {
        return Err(LoadError::DyldoRejected(reply.status));
    }
    Ok(reply.entry_point)
}

fn unwind(mapped: Vec<Region<kos_mem::region::MappedRemote>>) {
    for region in mapped.into_iter().rev() {
        if let Err(err) = region.unmap() {
            log::warn!("loader: cleanup failed to unmap a region: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_up_pads_to_the_next_page() {
        assert_eq!(round_up(0, PAGE_SIZE), 0);
        assert_eq!(round_up(1, PAGE_SIZE), PAGE_SIZE);
        assert_eq!(round_up(PAGE_SIZE, PAGE_SIZE), PAGE_SIZE);
        assert_eq!(round_up(PAGE_SIZE + 1, PAGE_SIZE), 2 * PAGE_SIZE);
    }

    #[test]
    fn translate_flags_maps_elf_bit_positions_to_region_bit_positions() {
        let rw = SegmentFlags::READ | SegmentFlags::WRITE;
        let translated = translate_flags(rw);
        assert!(translated.contains(RegionFlags::READ));
        assert!(translated.contains(RegionFlags::WRITE));
        assert!(!translated.contains(RegionFlags::EXEC));
    }

    #[test]
    fn place_segment_skips_zero_memsz_segments() {
        // p_memsz == 0 must short-circuit before any region is allocated,
        // so this never reaches a syscall even without a live kernel.
        let ph = kos_elf::ProgramHeader {
            p_type: consts::PT_LOAD,
            p_flags: 0,
            p_offset: 0,
            p_vaddr: 0x1000,
            p_filesz: 0,
            p_memsz: 0,
            p_align: 0x1000,
        };
        let target = unsafe { TaskHandle::from_raw(1) };
        let result = place_segment(target, &[], &ph);
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn place_segment_rejects_filesz_larger_than_memsz() {
        let ph = kos_elf::ProgramHeader {
            p_type: consts::PT_LOAD,
            p_flags: SegmentFlags::READ.bits(),
            p_offset: 0,
            p_vaddr: 0x1000,
            p_filesz: 64,
            p_memsz: 32,
            p_align: 0x1000,
        };
        let target = unsafe { TaskHandle::from_raw(1) };
        let err = place_segment(target, &[0u8; 64], &ph).unwrap_err();
        assert!(matches!(
            err,
            LoadError::FilesizeExceedsMemsz { filesz: 64, memsz: 32 }
        ));
    }

    #[test]
    fn place_segment_rejects_write_plus_exec() {
        let ph = kos_elf::ProgramHeader {
            p_type: consts::PT_LOAD,
            p_flags: (SegmentFlags::WRITE | SegmentFlags::EXEC).bits(),
            p_offset: 0,
            p_vaddr: 0x1000,
            p_filesz: 0,
            p_memsz: 16,
            p_align: 0x1000,
        };
        let target = unsafe { TaskHandle::from_raw(1) };
        let err = place_segment(target, &[0u8; 16], &ph).unwrap_err();
        assert!(matches!(err, LoadError::WriteExec));
    }
}

//! Stack staging for a newly created task (§4.5 step 3), and for worker
//! threads spawned within the calling task itself (§5: "concurrency comes
//! from dedicated worker threads per endpoint, each with its own port").

use kos_config::DEFAULT_STACK_SIZE;
use kos_svc::handle::{TaskHandle, ThreadHandle};
use kos_svc::mem::RegionFlags;

use crate::region::{MemError, Region};

/// Reserves and maps a target task's initial stack at `base` (the caller
/// picks `kos_config::stack_base::{I386, AMD64}` per the target's ELF
/// class), returning the stack-top stack pointer value to program into
/// `task_initialize`.
///
/// The topmost word is populated with `launch_info_addr` before the
/// region is placed into the target (§4.5 step 3: "the topmost word holds
/// a pointer to the launch-info struct") — the loader must map locally,
/// write it, then remap remotely, since a region placed directly into a
/// target arrives zeroed.
pub fn stage_for_task(
    task: TaskHandle,
    base: u64,
    launch_info_addr: u64,
    size: Option<u64>,
) -> core::result::Result<u64, MemError> {
    let size = size.unwrap_or(DEFAULT_STACK_SIZE as u64);
    let flags = RegionFlags::READ | RegionFlags::WRITE;
    let region = Region::alloc(size, flags)?;
    let mut local = region.map_local()?;
    let top = local.as_mut_slice().len() - size_of::<u64>();
    local.as_mut_slice()[top..].copy_from_slice(&launch_info_addr.to_le_bytes());
    let unmapped = local.unmap_local()?;
    let mapped = unmapped.map_into(task, base)?;
    Ok(mapped.addr() + mapped.size() - size_of::<u64>() as u64)
}

/// Allocates a stack within the calling task's own address space and
/// starts `entry` running on it with `arg` in the kernel's single
/// argument-passing register (§6.1 `thread_create`). Unlike
/// [`stage_for_task`], the region is never unmapped or remapped: a worker
/// thread's stack belongs to the same task that allocates it, so it stays
/// mapped locally for the thread's entire lifetime. The backing region is
/// deliberately leaked rather than returned — there is no point in the
/// worker's lifetime at which the caller would unmap it out from under a
/// running thread.
pub fn spawn_worker(entry: extern "C" fn(u64) -> !, arg: u64, stack_size: Option<u64>) -> core::result::Result<ThreadHandle, MemError> {
    let size = stack_size.unwrap_or(DEFAULT_STACK_SIZE as u64);
    let flags = RegionFlags::READ | RegionFlags::WRITE;
    let mut local = Region::alloc(size, flags)?.map_local()?;
    let stack_top = local.as_mut_slice().as_mut_ptr() as u64 + size;

    let thread = kos_svc::thread::create(entry as u64, arg, stack_top)?;
    kos_svc::thread::resume(thread)?;
    Ok(thread)
}

//! Lazily-initialized heap backing for the `#[global_allocator]`.
//!
//! Grounded on the teacher's `nx-alloc::llffalloc`, which wraps
//! `linked_list_allocator::Heap` behind a `None`-until-first-use `Option`.
//! The teacher carves its backing store from Horizon's `SetHeapSize` SVC;
//! this kernel has no equivalent (§6.1's VM primitives are region-based,
//! not a single growable per-task heap), so the backing store here is an
//! ordinary anonymous region allocated and mapped the same way the loader
//! and linker map every other region.

use core::alloc::Layout;
use core::ptr;

use kos_mem::region::Region;
use kos_svc::mem::RegionFlags;

/// The heap's backing allocator, `None` until [`Heap::init`] or the first
/// allocation through [`Heap::malloc`], whichever comes first.
pub struct Heap(Option<linked_list_allocator::Heap>);

impl Heap {
    pub const fn new_uninit() -> Self {
        Self(None)
    }

    pub fn is_initialized(&self) -> bool {
        self.0.is_some()
    }

    /// Reserves and maps [`kos_config::HEAP_SIZE`] bytes of anonymous
    /// memory and hands it to `linked_list_allocator` as the backing store.
    /// Panics if the kernel can't satisfy the reservation: there is no
    /// fallback heap size to retry with, unlike the teacher's
    /// available-minus-used sizing (this kernel exposes no "how much memory
    /// is left" query), so a task that can't get its one heap region has
    /// nothing left to try.
    pub fn init(&mut self) {
        self.0 = Some(init_inner_heap());
    }

    pub unsafe fn malloc(&mut self, size: usize, align: usize) -> *mut u8 {
        let Ok(layout) = Layout::from_size_align(size, align) else {
            return ptr::null_mut();
        };

        let heap = self.0.get_or_insert_with(init_inner_heap);
        match heap.allocate_first_fit(layout) {
            Ok(nn) => nn.as_ptr(),
            Err(_) => ptr::null_mut(),
        }
    }

    pub unsafe fn free(&mut self, ptr: *mut u8, size: usize, align: usize) {
        let Some(ptr) = ptr::NonNull::new(ptr) else {
            return;
        };

        let heap = self.0.get_or_insert_with(init_inner_heap);
        let layout = unsafe { Layout::from_size_align_unchecked(size, align) };
        unsafe { heap.deallocate(ptr, layout) };
    }
}

fn init_inner_heap() -> linked_list_allocator::Heap {
    let flags = RegionFlags::READ | RegionFlags::WRITE;
    let mut region = Region::alloc(kos_config::HEAP_SIZE as u64, flags)
        .and_then(Region::map_local)
        .expect("failed to reserve the heap region");

    let slice = region.as_mut_slice();
    let heap = unsafe { linked_list_allocator::Heap::new(slice.as_mut_ptr(), slice.len()) };

    // The region is never unmapped: it backs the process's heap for the
    // task's entire lifetime, so `region` is simply left to go out of
    // scope rather than threaded through as owned state the allocator has
    // no use for.
    heap
}

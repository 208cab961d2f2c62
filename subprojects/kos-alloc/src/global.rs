//! The `#[global_allocator]` itself, wrapping [`crate::heap::Heap`] behind
//! a spinlock. Grounded on the teacher's `nx-alloc::global`, same shape:
//! a process-wide `Mutex<Heap>`, an `init()` entry point a task calls once
//! at startup, and a thin `GlobalAlloc` impl that locks and delegates.

use core::alloc::{GlobalAlloc, Layout};

use kos_sync::{Mutex, MutexGuard};

use crate::heap;

#[global_allocator]
static GLOBAL_ALLOCATOR: KernelAllocator = KernelAllocator;

static ALLOC: Mutex<heap::Heap> = Mutex::new(heap::Heap::new_uninit());

/// Reserves the heap region up front. Not required before the first
/// allocation — [`heap::Heap::malloc`] initializes lazily too — but calling
/// it from a task's entry point surfaces an out-of-memory condition before
/// anything else runs rather than at an arbitrary first `alloc::vec![]`.
pub fn init() {
    ALLOC.lock().init();
}

fn lock<'a>() -> MutexGuard<'a, heap::Heap> {
    ALLOC.lock()
}

struct KernelAllocator;

unsafe impl GlobalAlloc for KernelAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        unsafe { lock().malloc(layout.size(), layout.align()) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { lock().free(ptr, layout.size(), layout.align()) }
    }
}

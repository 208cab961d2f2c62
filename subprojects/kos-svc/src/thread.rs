//! Thread management syscalls (§6.1).

use crate::handle::ThreadHandle;
use crate::raw::{self, num};
use crate::result::{self, Result};

/// Creates a thread in the calling task, with the given entry point,
/// single argument register, and stack top.
pub fn create(entry: u64, arg: u64, stack_top: u64) -> Result<ThreadHandle> {
    let code = unsafe { raw::syscall3(num::THREAD_CREATE, entry, arg, stack_top) };
    let raw_handle = result::decode(code)?;
    Ok(unsafe { ThreadHandle::from_raw(raw_handle) })
}

/// Sets a thread's debug name.
pub fn set_name(thread: ThreadHandle, name: &str) -> Result<()> {
    let code = unsafe {
        raw::syscall3(
            num::THREAD_SET_NAME,
            thread.to_raw(),
            name.as_ptr() as u64,
            name.len() as u64,
        )
    };
    result::check(code)
}

/// Puts the calling thread to sleep for at least `micros` microseconds.
pub fn usleep(micros: u64) -> Result<()> {
    let code = unsafe { raw::syscall1(num::THREAD_USLEEP, micros) };
    result::check(code)
}

/// Looks up the kernel-assigned handle for a thread by its internal ID.
pub fn get_handle(thread_id: u64) -> Result<ThreadHandle> {
    let code = unsafe { raw::syscall1(num::THREAD_GET_HANDLE, thread_id) };
    let raw_handle = result::decode(code)?;
    Ok(unsafe { ThreadHandle::from_raw(raw_handle) })
}

/// Tears down a thread that has finished running.
pub fn destroy(thread: ThreadHandle) -> Result<()> {
    let code = unsafe { raw::syscall1(num::THREAD_DESTROY, thread.to_raw()) };
    result::check(code)
}

/// Resumes a thread created via [`create`] (threads start suspended).
pub fn resume(thread: ThreadHandle) -> Result<()> {
    let code = unsafe { raw::syscall1(num::THREAD_RESUME, thread.to_raw()) };
    result::check(code)
}

/// Blocks the calling thread until `thread` terminates.
pub fn wait(thread: ThreadHandle) -> Result<()> {
    let code = unsafe { raw::syscall1(num::THREAD_WAIT, thread.to_raw()) };
    result::check(code)
}

/// Yields the remainder of the calling thread's timeslice.
pub fn r#yield() -> Result<()> {
    let code = unsafe { raw::syscall0(num::THREAD_YIELD) };
    result::check(code)
}

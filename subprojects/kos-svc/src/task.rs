//! Task management syscalls (§6.1).

use crate::handle::TaskHandle;
use crate::raw::{self, num};
use crate::result::{self, Result};

/// Creates a new task, optionally as a child of `parent`.
///
/// `parent = None` asks the kernel to parent the new task under the
/// calling task, matching the root server's own usage (§4.5 step 1).
pub fn create(parent: Option<TaskHandle>) -> Result<TaskHandle> {
    let parent_raw = parent.map(|h| h.to_raw()).unwrap_or(raw::INVALID_HANDLE);
    let code = unsafe { raw::syscall1(num::TASK_CREATE, parent_raw) };
    let raw_handle = result::decode(code)?;
    Ok(unsafe { TaskHandle::from_raw(raw_handle) })
}

/// Sets a task's debug name, truncated by the kernel if it exceeds the
/// kernel's internal name buffer.
pub fn set_name(task: TaskHandle, name: &str) -> Result<()> {
    let code = unsafe {
        raw::syscall3(
            num::TASK_SET_NAME,
            task.to_raw(),
            name.as_ptr() as u64,
            name.len() as u64,
        )
    };
    result::check(code)
}

/// Programs a created-but-not-yet-running task's initial program counter
/// and stack pointer (§4.5 step 7).
pub fn initialize(task: TaskHandle, pc: u64, sp: u64) -> Result<()> {
    let code = unsafe { raw::syscall3(num::TASK_INITIALIZE, task.to_raw(), pc, sp) };
    result::check(code)
}

/// Looks up the kernel-assigned handle for a task by its internal ID.
pub fn get_handle(task_id: u64) -> Result<TaskHandle> {
    let code = unsafe { raw::syscall1(num::TASK_GET_HANDLE, task_id) };
    let raw_handle = result::decode(code)?;
    Ok(unsafe { TaskHandle::from_raw(raw_handle) })
}

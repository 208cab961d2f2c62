//! Miscellaneous syscalls that don't belong to a single object kind.

use crate::raw::{self, num};
use crate::result::{self, Result};

/// Draws one 64-bit word from the kernel's TRNG, used to seed the dynamic
/// linker's ASLR slide (§4.6 step 4).
///
/// The value is written through an out-pointer rather than returned in the
/// result register: a genuine random word can have its high bit set, which
/// the single signed-result-code convention used elsewhere in this module
/// would otherwise misread as a negative error code.
pub fn get_random_u64() -> Result<u64> {
    let mut out: u64 = 0;
    let code = unsafe { raw::syscall1(num::MISC_GET_RANDOM, &mut out as *mut u64 as u64) };
    result::check_value(code, out)
}

/// Writes raw bytes to the kernel's debug log sink. The sole backend for
/// [`crate::logger`]; there is no other way for a userland task to produce
/// diagnostic output, since this kernel has no console device of its own.
pub fn debug_write(bytes: &[u8]) -> Result<()> {
    let code = unsafe { raw::syscall2(num::MISC_DEBUG_WRITE, bytes.as_ptr() as u64, bytes.len() as u64) };
    result::check(code)
}

//! # kos-panic-handler
//!
//! Panic handler shared by every userland task linked against the core
//! runtime (root server, `dyldo`, and any task that embeds `kos-std`).
//!
//! There is no supervisor call in [`kos_svc`](../kos_svc/index.html) for
//! reporting a fatal condition to a debugger (the kernel's syscall surface
//! in scope for this crate family stops at task/thread/port/VM primitives),
//! so a panic here writes the formatted message to a fixed static buffer and
//! parks the faulting thread. The buffer's address survives in registers
//! long enough that an external debugger attached to the kernel can still
//! recover it from the core dump.

#![no_std]

use core::{fmt::Write as _, panic::PanicInfo};

/// Maximum size for the panic message buffer.
const MSG_BUFFER_SIZE: usize = 512;

#[panic_handler]
fn panic_handler(info: &PanicInfo) -> ! {
    static mut MSG_BUFFER: [u8; MSG_BUFFER_SIZE] = [0; MSG_BUFFER_SIZE];

    // SAFETY: exclusive access during a panic; no other code touches this buffer.
    let buf = unsafe {
        let raw_ptr = &raw mut MSG_BUFFER;
        core::slice::from_raw_parts_mut(raw_ptr.cast::<u8>(), MSG_BUFFER_SIZE)
    };

    let mut cursor = Cursor::new(buf);
    let _ = write!(cursor, "{info}");

    // Parking rather than looping tightly keeps the faulting thread from
    // burning the core while a kernel debugger inspects the buffer above.
    loop {
        core::hint::spin_loop();
    }
}

struct Cursor<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }
}

impl core::fmt::Write for Cursor<'_> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buf.len().saturating_sub(self.pos);
        let to_write = bytes.len().min(remaining);
        if to_write > 0 {
            self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
            self.pos += to_write;
        }
        Ok(())
    }
}

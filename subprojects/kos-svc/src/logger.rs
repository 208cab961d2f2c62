//! A minimal [`log::Log`] implementation over [`crate::misc::debug_write`],
//! installed once at task start by `rootsrv` and `dyldo`. There is no
//! allocator-free way to format a `log::Record` directly into the kernel's
//! write syscall, so this reuses the fixed-buffer [`core::fmt::Write`]
//! cursor [`kos-panic-handler`] already writes panic messages through,
//! rather than pulling in a buffered-writer crate for a single call site.

use core::fmt::Write as _;

use log::{Level, Log, Metadata, Record};

/// Line buffer a single log call is formatted into before the syscall.
/// Long lines are truncated rather than split across writes.
const LINE_BUFFER_SIZE: usize = 256;

struct Cursor<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.pos]
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

struct SyscallLogger;

impl Log for SyscallLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let mut raw = [0u8; LINE_BUFFER_SIZE];
        let mut cursor = Cursor::new(&mut raw);
        let _ = write!(cursor, "[{}] {}\n", record.level(), record.args());
        let _ = crate::misc::debug_write(cursor.as_bytes());
    }

    fn flush(&self) {}
}

static LOGGER: SyscallLogger = SyscallLogger;

/// Installs [`SyscallLogger`] as the global `log` backend. Call once, as
/// early as possible in a task's entry point — every `log::info!`/`warn!`
/// call elsewhere in this tree assumes this has already run.
pub fn init(level: Level) {
    log::set_max_level(level.to_level_filter());
    // Only fails if a logger is already installed, which would mean a
    // binary called this twice; either way there is nothing to recover.
    let _ = log::set_logger(&LOGGER);
}

//! # kos-config
//!
//! Compile-time constants shared by the root server, `dyldo`, and the
//! runtime crates underneath them. These mirror the `#define`s the original
//! C++ kernel's build system baked into each translation unit — nothing
//! here is read from a config file at runtime, matching the teacher's
//! pattern of compile-time board constants (see `nx-alloc::config`).

#![no_std]

/// All pages managed by the kernel's VM primitives are 4 KiB (§6.1).
pub const PAGE_SIZE: usize = 0x1000;

/// Default stack size staged by the root-server loader (§4.5 step 3).
pub const DEFAULT_STACK_SIZE: usize = 128 * 1024;

/// Fixed per-architecture virtual address of a new task's initial stack.
pub mod stack_base {
    /// i386 stack base: just below the 3 GiB user/kernel split.
    pub const I386: usize = 0xBFFF_0000;
    /// amd64 stack base: just below the canonical-address ceiling used for
    /// user mappings, leaving headroom above for the launch-info page.
    pub const AMD64: usize = 0x0000_7FFF_FFFF_0000;
}

/// Fixed virtual address of the launch-info page (§6.4), one per arch.
pub mod launch_info_base {
    pub const I386: usize = 0xBFFE_F000;
    pub const AMD64: usize = 0x0000_7FFF_FFFE_F000;
}

/// `'TASK'` in little-endian, the launch-info page magic (§6.4).
pub const LAUNCH_INFO_MAGIC: u32 = u32::from_le_bytes(*b"TASK");

/// Fixed virtual address of the TLS info page the dynamic linker writes
/// for a dynamically linked task, one page below the launch-info page.
/// Not part of the wire protocol (§6.2's `TaskCreatedReply` carries only
/// `entry_point`): the target's own startup code reads this fixed address
/// directly rather than round-tripping the combined TLS template and
/// layout through the root server.
pub mod tls_info_base {
    pub const I386: usize = super::launch_info_base::I386 - super::PAGE_SIZE;
    pub const AMD64: usize = super::launch_info_base::AMD64 - super::PAGE_SIZE;
}

/// `'TLSI'` in little-endian, the TLS info page magic.
pub const TLS_INFO_MAGIC: u32 = u32::from_le_bytes(*b"TLSI");

/// `'KUSH'`, the init bundle master header magic (§6.3).
pub const BUNDLE_MAGIC: u32 = u32::from_le_bytes(*b"KUSH");

/// `'INIT'`, the init bundle header type tag (§6.3).
pub const BUNDLE_TYPE: u32 = u32::from_le_bytes(*b"INIT");

/// Bundle file data regions are aligned to 16 bytes (§6.3).
pub const BUNDLE_DATA_ALIGN: usize = 16;

/// Fixed path list searched for `DT_NEEDED` entries (§4.6 step 4), in order.
pub const LIBRARY_SEARCH_PATH: &[&str] = &["/sbin", "/lib", "/usr/lib"];

/// amd64 dynamic-library ASLR aperture: a 512 GiB region, 2 MiB aligned,
/// with ~20 bits of slide entropy (§4.6 step 4).
pub mod aslr {
    pub const AMD64_APERTURE_BASE: usize = 0x0000_2000_0000_0000;
    pub const AMD64_APERTURE_SIZE: usize = 512 * 1024 * 1024 * 1024;
    pub const AMD64_SLIDE_ALIGN: usize = 2 * 1024 * 1024;
    pub const AMD64_SLIDE_ENTROPY_BITS: u32 = 20;

    /// i386 has no aperture to slide within; libraries load at a fixed base.
    pub const I386_FIXED_BASE: usize = 0x5000_0000;
}

/// Minimum TLS block size allocated regardless of the requested total
/// (§4.9 step 2, `allocated = max(min_tls, actual)`).
pub const MIN_TLS_SIZE: usize = 0x200;

/// Service name the dispensary itself is reachable under — bootstrapped by
/// the kernel before any userland task exists (it is a pseudo-port, not a
/// registry entry).
pub const DISPENSARY_PORT_NAME: &str = "me.blraaz.rpc.dispensary";

/// Well-known name the dynamic linker's task-notification port is
/// registered under once it has finished priming itself (§2 flow).
pub const DYLDO_PORT_NAME: &str = "me.blraaz.rpc.dyldo";

/// Well-known name of the root server's task-creation endpoint (§6.2).
pub const TASK_ENDPOINT_PORT_NAME: &str = "me.blraaz.rpc.task";

/// Well-known name of the legacy file-IO endpoint (§4.4).
pub const FILEIO_PORT_NAME: &str = "me.blraaz.rpc.fileio";

/// Maximum single `ReadDirect` transfer accepted by the file-IO endpoint.
pub const FILEIO_MAX_READ_BLOCK: usize = 32 * 1024;

/// Sleep between dispensary lookup retries while polling for a not-yet-
/// registered service (§4.1: "poll with their own backoff").
pub const DISPENSARY_POLL_BACKOFF_US: u64 = 5_000;

/// Raw port handle every task is assumed to start with, pre-opened by the
/// kernel to the dispensary's pseudo-port (§4.1). There is no syscall for
/// handing a port handle from one task to another, so the one port that
/// bootstraps every other lookup can't itself be discovered by name; the
/// kernel hands it out at the same fixed slot in every task's handle space
/// instead, the same way [`stack_base`] and [`launch_info_base`] hand out
/// fixed addresses rather than making the task discover them.
pub const DISPENSARY_RESERVED_PORT_HANDLE: u64 = 1;

/// Fixed virtual address the root server maps the init bundle's bytes to
/// before parsing it (§6.3). The bundle is handed to the root server by the
/// kernel at task start the same way a stack and launch-info page are handed
/// to every other task; unlike those, its size isn't known up front, so
/// [`BUNDLE_MAX_SIZE`] bounds how much address space is reserved for it.
pub mod bundle_base {
    pub const I386: usize = 0xB000_0000;
    pub const AMD64: usize = 0x0000_7FFF_0000_0000;
}

/// Upper bound on the init bundle's mapped size (§6.3); the root server
/// rejects a master header claiming more than this.
pub const BUNDLE_MAX_SIZE: usize = 64 * 1024 * 1024;

/// Heap size carved out by [`kos-alloc`]'s global allocator for `rootsrv`
/// and `dyldo`, the two binaries in this tree that need `alloc`.
pub const HEAP_SIZE: usize = 4 * 1024 * 1024;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magics_round_trip_their_ascii_tag() {
        assert_eq!(&BUNDLE_MAGIC.to_le_bytes(), b"KUSH");
        assert_eq!(&BUNDLE_TYPE.to_le_bytes(), b"INIT");
        assert_eq!(&LAUNCH_INFO_MAGIC.to_le_bytes(), b"TASK");
    }

    #[test]
    fn aslr_aperture_is_page_aligned() {
        assert_eq!(aslr::AMD64_APERTURE_SIZE % PAGE_SIZE, 0);
        assert_eq!(aslr::AMD64_SLIDE_ALIGN % PAGE_SIZE, 0);
    }
}

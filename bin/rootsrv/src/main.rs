//! The root server (§2, §4): the first task the kernel starts. Maps the
//! init bundle, serves the legacy file-IO endpoint out of it, owns the
//! dispensary's registry in-process, and runs the task-creation endpoint
//! that drives `kos_loader::load` for every other task on the system.
//!
//! There is no runtime in this tree that supplies an ELF entry point or a
//! `_start` convention (every other crate here is a plain `rlib`), so this
//! binary provides its own minimal one: a naked `call` into [`rust_main`]
//! with whatever stack pointer `task_initialize` programmed for it.

#![no_std]
#![no_main]

extern crate alloc;
extern crate kos_panic_handler as _;

use core::arch::global_asm;

use kos_bundle::Bundle;
use kos_bundle::raw::MasterHeader;
use kos_config::{BUNDLE_MAX_SIZE, DISPENSARY_PORT_NAME, DISPENSARY_POLL_BACKOFF_US, DISPENSARY_RESERVED_PORT_HANDLE, DYLDO_PORT_NAME, FILEIO_PORT_NAME, TASK_ENDPOINT_PORT_NAME, bundle_base, tls_info_base};
use kos_svc::handle::PortHandle;
use kos_sync::OnceLock;
use zerocopy::FromBytes;

#[cfg(target_arch = "x86_64")]
const BUNDLE_BASE: u64 = bundle_base::AMD64 as u64;
#[cfg(target_arch = "x86")]
const BUNDLE_BASE: u64 = bundle_base::I386 as u64;

#[cfg(target_arch = "x86_64")]
const TLS_INFO_BASE: u64 = tls_info_base::AMD64 as u64;
#[cfg(target_arch = "x86")]
const TLS_INFO_BASE: u64 = tls_info_base::I386 as u64;

global_asm!(".global _start", "_start:", "call {entry}", "ud2", entry = sym rust_main);

static BUNDLE: OnceLock<Bundle<'static>> = OnceLock::new();

extern "C" fn rust_main() -> ! {
    kos_alloc::init();
    kos_svc::logger::init(log::Level::Info);

    // Statically linked, so nothing is expected at this address; best effort.
    let _ = unsafe { kos_tls::info_page::bootstrap_from_fixed_address(TLS_INFO_BASE) };

    let bundle = BUNDLE.get_or_init(map_bundle);

    let fileio_port = kos_svc::port::create().expect("failed to create the file-IO port");
    kos_dispensary::register(FILEIO_PORT_NAME, fileio_port);
    kos_mem::stack::spawn_worker(fileio_worker, fileio_port.to_raw(), None)
        .expect("failed to spawn the file-IO worker thread");

    let dispensary_port = unsafe { PortHandle::from_raw(DISPENSARY_RESERVED_PORT_HANDLE) };
    kos_dispensary::register(DISPENSARY_PORT_NAME, dispensary_port);
    kos_mem::stack::spawn_worker(dispensary_worker, dispensary_port.to_raw(), None)
        .expect("failed to spawn the dispensary worker thread");

    let task_port = kos_svc::port::create().expect("failed to create the task-creation port");
    kos_dispensary::register(TASK_ENDPOINT_PORT_NAME, task_port);

    log::info!("waiting for dyldo to register before serving task-create requests");
    let dyldo = wait_for_dyldo();
    log::info!("dyldo ready, serving task-creation requests on {task_port:?}");

    kos_taskep::serve_forever(bundle, dyldo, task_port);
}

/// Reads exactly the 24-byte master header first, since that much is
/// guaranteed mapped (the kernel would not hand over a bundle smaller than
/// its own header), then re-slices to `total_len` once known rather than
/// reading a full [`BUNDLE_MAX_SIZE`] span that may reach past what the
/// kernel actually committed at [`BUNDLE_BASE`] (§6.3).
fn map_bundle() -> Bundle<'static> {
    let base = BUNDLE_BASE as *const u8;
    let header_bytes = unsafe { core::slice::from_raw_parts(base, size_of::<MasterHeader>()) };
    let header = MasterHeader::ref_from_prefix(header_bytes).expect("bundle too small for its own header").0;

    let total_len = header.total_len.get() as usize;
    assert!(total_len <= BUNDLE_MAX_SIZE, "bundle claims {total_len} bytes, over the {BUNDLE_MAX_SIZE}-byte reservation");

    let bytes = unsafe { core::slice::from_raw_parts(base, total_len) };
    Bundle::try_from_bytes(bytes).expect("malformed init bundle")
}

fn wait_for_dyldo() -> PortHandle {
    loop {
        if let Some(port) = kos_dispensary::registry::lookup(DYLDO_PORT_NAME) {
            return port;
        }
        let _ = kos_svc::thread::usleep(DISPENSARY_POLL_BACKOFF_US);
    }
}

extern "C" fn fileio_worker(port: u64) -> ! {
    let port = unsafe { PortHandle::from_raw(port) };
    kos_fileio::serve_forever(port, BUNDLE.get().expect("bundle initialized before this worker is spawned"))
}

extern "C" fn dispensary_worker(port: u64) -> ! {
    kos_dispensary::endpoint::serve_forever(unsafe { PortHandle::from_raw(port) })
}

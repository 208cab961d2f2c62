//! `dyldo` (§4.6-§4.10): the dynamic linker, run as its own task because it
//! needs to hold onto the region handles it places segments with, and
//! handles don't cross tasks (§5). Primed by the root server at boot,
//! registers its task-notification port with the dispensary, then answers
//! one `TaskCreated` request per dynamically linked task the root server
//! creates.

#![no_std]
#![no_main]

extern crate alloc;
extern crate kos_panic_handler as _;

use core::arch::global_asm;

use kos_config::{DISPENSARY_POLL_BACKOFF_US, DISPENSARY_RESERVED_PORT_HANDLE, DYLDO_PORT_NAME, FILEIO_PORT_NAME, tls_info_base};
use kos_loader::wire::{self as task_wire, TASK_CREATED_REPLY, TASK_CREATED_REQUEST};
use kos_sf::{PacketError, Server};
use kos_svc::handle::{PortHandle, TaskHandle};

#[cfg(target_arch = "x86_64")]
const TLS_INFO_BASE: u64 = tls_info_base::AMD64 as u64;
#[cfg(target_arch = "x86")]
const TLS_INFO_BASE: u64 = tls_info_base::I386 as u64;

/// Bounds every RPC dyldo itself issues (the dispensary lookup/register
/// calls, and the file-io reads `kos_linker::link` drives). Generous
/// relative to the dispensary's own poll backoff since this is a round
/// trip, not a wait for state to change.
const RPC_TIMEOUT_US: u64 = 2_000_000;

global_asm!(".global _start", "_start:", "call {entry}", "ud2", entry = sym rust_main);

extern "C" fn rust_main() -> ! {
    kos_alloc::init();
    kos_svc::logger::init(log::Level::Info);

    // dyldo is never itself dynamically linked, so nothing is expected here.
    let _ = unsafe { kos_tls::info_page::bootstrap_from_fixed_address(TLS_INFO_BASE) };

    let dispensary = unsafe { PortHandle::from_raw(DISPENSARY_RESERVED_PORT_HANDLE) };
    let fileio = kos_dispensary::wait_for(dispensary, FILEIO_PORT_NAME, RPC_TIMEOUT_US, DISPENSARY_POLL_BACKOFF_US);

    let port = kos_svc::port::create().expect("failed to create dyldo's task-notification port");
    kos_dispensary::register_remote(dispensary, DYLDO_PORT_NAME, port, RPC_TIMEOUT_US)
        .expect("failed to register with the dispensary");

    log::info!("registered as {DYLDO_PORT_NAME}, serving task-created requests on {port:?}");

    let server = Server::new(port);
    loop {
        if let Err(err) = serve_one(&server, fileio) {
            log::warn!("dyldo: dropping malformed request: {err}");
        }
    }
}

fn serve_one(server: &Server, fileio: PortHandle) -> Result<(), PacketError> {
    let mut buf = [0u8; 512];
    let (header, payload) = server.receive(&mut buf, u64::MAX)?;
    if header.message_type.get() != TASK_CREATED_REQUEST {
        return Ok(());
    }
    let reply_port = header.reply_port.get();
    let tag = header.tag.get();

    let Ok(request) = task_wire::decode_request(payload) else {
        let mut reply = [0u8; 20];
        task_wire::encode_reply(0, -1, 0, &mut reply);
        return server.reply(reply_port, TASK_CREATED_REPLY, tag, &reply);
    };

    let target = unsafe { TaskHandle::from_raw(request.task_handle) };
    let mut reply = [0u8; 20];
    match kos_linker::link(target, fileio, request.path, RPC_TIMEOUT_US) {
        Ok(linked) => task_wire::encode_reply(request.task_handle, 0, linked.entry_point, &mut reply),
        Err(err) => {
            log::warn!("dyldo: failed to link {:?}: {err}", request.path);
            task_wire::encode_reply(request.task_handle, -1, 0, &mut reply);
        }
    }
    server.reply(reply_port, TASK_CREATED_REPLY, tag, &reply)
}

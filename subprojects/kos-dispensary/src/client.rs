//! Client-side lookups against the dispensary (§4.1: "Clients that need a
//! service that is not yet registered poll with their own backoff").

use kos_sf::{Client, PacketError};
use kos_svc::handle::PortHandle;
use kos_svc::thread;

use alloc::vec::Vec;

use crate::wire::{self, LOOKUP_REQUEST, REGISTER_REQUEST, STATUS_FOUND};

/// A single, non-blocking `Lookup` call. `timeout_us` bounds the RPC round
/// trip itself, not whether the name is registered yet.
pub fn lookup(dispensary: PortHandle, name: &str, timeout_us: u64) -> Result<Option<PortHandle>, PacketError> {
    let client = Client::connect(dispensary)?;
    let mut buf = [0u8; 256];
    let (_header, len) = client.call(LOOKUP_REQUEST, 1, wire::encode_request(name), &mut buf, timeout_us)?;
    let reply = match wire::decode_reply(&buf[16..len]) {
        Ok(r) => r,
        Err(_) => return Ok(None),
    };
    if reply.status == STATUS_FOUND {
        Ok(Some(unsafe { PortHandle::from_raw(reply.port) }))
    } else {
        Ok(None)
    }
}

/// Polls [`lookup`] with a fixed backoff until the name resolves, per the
/// dispensary's documented client-side polling convention.
pub fn wait_for(dispensary: PortHandle, name: &str, timeout_us: u64, backoff_us: u64) -> PortHandle {
    loop {
        if let Ok(Some(port)) = lookup(dispensary, name, timeout_us) {
            return port;
        }
        let _ = thread::usleep(backoff_us);
    }
}

/// Publishes `port` under `name`, for a service running in a task other
/// than the dispensary's own (e.g. `dyldo` registering itself with
/// rootsrv). Same last-writer-wins semantics as [`crate::registry::register`].
pub fn register_remote(dispensary: PortHandle, name: &str, port: PortHandle, timeout_us: u64) -> Result<(), PacketError> {
    let client = Client::connect(dispensary)?;
    let mut request = Vec::new();
    wire::encode_register_request(name, port.to_raw(), &mut request);
    let mut buf = [0u8; 256];
    client.call(REGISTER_REQUEST, 1, &request, &mut buf, timeout_us)?;
    Ok(())
}

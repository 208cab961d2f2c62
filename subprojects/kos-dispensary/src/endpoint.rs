//! The dispensary's own RPC endpoint, wrapping [`crate::registry`] (§4.1).

use alloc::vec::Vec;

use kos_sf::{PacketError, Server};
use kos_svc::handle::PortHandle;

use crate::registry;
use crate::wire::{self, LOOKUP_REPLY, LOOKUP_REQUEST, REGISTER_REPLY, REGISTER_REQUEST, STATUS_FOUND, STATUS_NOT_FOUND};

/// Services one request off `port`, blocking up to `timeout_us`: either a
/// `Lookup` or a `Register` (the latter is how a service running in its own
/// task, like `dyldo`, publishes its port — it has no way to call
/// [`registry::register`] in-process). The registry itself never blocks
/// (§4.1: "the server never blocks on behalf of the caller") — a miss is
/// answered immediately with [`STATUS_NOT_FOUND`], not retried here.
pub fn serve_one(server: &Server, timeout_us: u64) -> Result<(), PacketError> {
    let mut buf = [0u8; 256];
    let (header, payload) = server.receive(&mut buf, timeout_us)?;
    let reply_port = header.reply_port.get();
    let tag = header.tag.get();

    match header.message_type.get() {
        LOOKUP_REQUEST => {
            let Ok(name) = wire::decode_request(payload) else {
                let mut reply = Vec::new();
                wire::encode_reply("", STATUS_NOT_FOUND, 0, &mut reply);
                return server.reply(reply_port, LOOKUP_REPLY, tag, &reply);
            };

            let mut reply = Vec::new();
            match registry::lookup(name) {
                Some(port) => wire::encode_reply(name, STATUS_FOUND, port.to_raw(), &mut reply),
                None => wire::encode_reply(name, STATUS_NOT_FOUND, 0, &mut reply),
            }
            server.reply(reply_port, LOOKUP_REPLY, tag, &reply)
        }
        REGISTER_REQUEST => {
            let Ok(request) = wire::decode_register_request(payload) else {
                let reply = wire::encode_register_reply(false);
                return server.reply(reply_port, REGISTER_REPLY, tag, &reply);
            };
            registry::register(request.name, unsafe { kos_svc::handle::PortHandle::from_raw(request.port) });
            let reply = wire::encode_register_reply(true);
            server.reply(reply_port, REGISTER_REPLY, tag, &reply)
        }
        _ => Ok(()),
    }
}

/// Runs [`serve_one`] forever on `port`.
pub fn serve_forever(port: PortHandle) -> ! {
    let server = Server::new(port);
    loop {
        if let Err(err) = serve_one(&server, u64::MAX) {
            log::warn!("dispensary: dropping malformed request: {err}");
        }
    }
}

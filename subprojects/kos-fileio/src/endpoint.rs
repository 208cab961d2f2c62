//! The legacy file-IO RPC endpoint (§4.4), serving a mapped init bundle.

use alloc::vec::Vec;

use kos_bundle::Bundle;
use kos_sf::{PacketError, Server};
use kos_svc::handle::PortHandle;

use crate::table::HandleTable;
use crate::wire::{self, MODE_READ_ONLY};

/// Protocol version this endpoint answers `GetCapabilities` with.
const VERSION: u32 = 1;

bitflags::bitflags! {
    /// `caps_bitflag` returned by `GetCapabilities`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u32 {
        const READ = 1 << 0;
    }
}

/// Services one request off `port`, backed by `bundle` and `table`.
pub fn serve_one<'a>(
    server: &Server,
    bundle: &Bundle<'a>,
    table: &HandleTable<'a>,
    timeout_us: u64,
) -> Result<(), PacketError> {
    let mut buf = [0u8; 4096];
    let (header, payload) = server.receive(&mut buf, timeout_us)?;
    let reply_port = header.reply_port.get();
    let tag = header.tag.get();

    match header.message_type.get() {
        wire::GET_CAPABILITIES_REQUEST => {
            let mut reply = Vec::new();
            wire::encode_get_capabilities_reply(
                VERSION,
                Capabilities::READ.bits(),
                kos_config::FILEIO_MAX_READ_BLOCK as u32,
                &mut reply,
            );
            server.reply(reply_port, wire::GET_CAPABILITIES_REPLY, tag, &reply)
        }
        wire::OPEN_REQUEST => {
            let mut reply = Vec::new();
            match wire::decode_open_request(payload) {
                Ok((MODE_READ_ONLY, path)) => match bundle.open(path) {
                    Some(file) => match file.contents() {
                        Ok(contents) => {
                            let length = contents.len() as u64;
                            let handle = table.insert(contents);
                            wire::encode_open_reply(wire::STATUS_OK, handle, length, &mut reply);
                        }
                        Err(err) => {
                            log::warn!("fileio: decompressing {path}: {err}");
                            wire::encode_open_reply(wire::STATUS_ENOENT, 0, 0, &mut reply);
                        }
                    },
                    None => wire::encode_open_reply(wire::STATUS_ENOENT, 0, 0, &mut reply),
                },
                Ok(_) => wire::encode_open_reply(wire::STATUS_EROFS, 0, 0, &mut reply),
                Err(_) => wire::encode_open_reply(wire::STATUS_EINVAL, 0, 0, &mut reply),
            }
            server.reply(reply_port, wire::OPEN_REPLY, tag, &reply)
        }
        wire::CLOSE_REQUEST => {
            let mut reply = Vec::new();
            let status = match wire::decode_close_request(payload) {
                Ok(handle) if table.close(handle) => wire::STATUS_OK,
                Ok(_) => wire::STATUS_EBADF,
                Err(_) => wire::STATUS_EINVAL,
            };
            wire::encode_close_reply(status, &mut reply);
            server.reply(reply_port, wire::CLOSE_REPLY, tag, &reply)
        }
        wire::READ_DIRECT_REQUEST => {
            let mut reply = Vec::new();
            match wire::decode_read_direct_request(payload) {
                Ok((handle, _offset, length)) if length as usize > kos_config::FILEIO_MAX_READ_BLOCK => {
                    wire::encode_read_direct_reply(wire::STATUS_EINVAL, handle, &[], &mut reply);
                }
                Ok((handle, offset, length)) => match table.read_at(handle, offset, length as usize) {
                    Some(data) => wire::encode_read_direct_reply(wire::STATUS_OK, handle, &data, &mut reply),
                    None => wire::encode_read_direct_reply(wire::STATUS_EBADF, handle, &[], &mut reply),
                },
                Err(_) => wire::encode_read_direct_reply(wire::STATUS_EINVAL, 0, &[], &mut reply),
            }
            server.reply(reply_port, wire::READ_DIRECT_REPLY, tag, &reply)
        }
        _ => Ok(()),
    }
}

/// Runs [`serve_one`] forever on `port`.
pub fn serve_forever(port: PortHandle, bundle: &Bundle<'_>) -> ! {
    let server = Server::new(port);
    let table = HandleTable::new();
    loop {
        if let Err(err) = serve_one(&server, bundle, &table, u64::MAX) {
            log::warn!("fileio: dropping malformed request: {err}");
        }
    }
}

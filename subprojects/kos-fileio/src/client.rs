//! Client side of the legacy file-IO endpoint (§4.4), used by the dynamic
//! linker to re-open an executable by path rather than trust its own
//! pre-mapped image (§4.6 step 1: "the dynamic section references file
//! offsets, so the linker reads the file directly").

use alloc::vec::Vec;

use kos_sf::{Client, PacketError};
use kos_svc::handle::PortHandle;

use crate::wire::{self, MODE_READ_ONLY};

/// An open file handle plus its total length, as returned by [`open`].
#[derive(Debug, Clone, Copy)]
pub struct OpenFile {
    pub handle: u32,
    pub length: u64,
}

/// Sends `GetCapabilities`, returning the server's declared
/// `max_read_block`.
pub fn max_read_block(fileio: PortHandle, timeout_us: u64) -> Result<u32, PacketError> {
    let client = Client::connect(fileio)?;
    let mut buf = [0u8; 64];
    let (_, len) = client.call(wire::GET_CAPABILITIES_REQUEST, 0, &[], &mut buf, timeout_us)?;
    let reply = wire::decode_get_capabilities_reply(&buf[16..len])
        .map_err(|_| PacketError::Malformed { received: len, needed: 16 + 12 })?;
    Ok(reply.max_read_block)
}

/// Opens `path` read-only. `Ok(None)` means the server reported the file
/// doesn't exist; any other non-`STATUS_OK` reply is surfaced as an error
/// with the raw status byte folded into `PacketError::Malformed`'s
/// `received` field so callers can still see it without a new variant.
pub fn open(fileio: PortHandle, path: &str, timeout_us: u64) -> Result<Option<OpenFile>, PacketError> {
    let client = Client::connect(fileio)?;
    let mut request = Vec::new();
    wire::encode_open_request(MODE_READ_ONLY, path, &mut request);
    let mut buf = [0u8; 256];
    let (_, len) = client.call(wire::OPEN_REQUEST, 0, &request, &mut buf, timeout_us)?;
    let reply = wire::decode_open_reply(&buf[16..len])
        .map_err(|_| PacketError::Malformed { received: len, needed: 16 + 13 })?;
    match reply.status {
        wire::STATUS_OK => Ok(Some(OpenFile { handle: reply.handle, length: reply.length })),
        wire::STATUS_ENOENT => Ok(None),
        status => Err(PacketError::Malformed { received: status as usize, needed: 0 }),
    }
}

/// Reads up to `length` bytes at `offset` from an already-open handle into
/// `out`, returning the slice actually filled. `length` must not exceed the
/// server's `max_read_block`.
pub fn read_direct<'buf>(
    fileio: PortHandle,
    handle: u32,
    offset: u64,
    length: u32,
    out: &'buf mut [u8],
    timeout_us: u64,
) -> Result<&'buf [u8], PacketError> {
    let client = Client::connect(fileio)?;
    let mut request = Vec::new();
    wire::encode_read_direct_request(handle, offset, length, &mut request);
    let mut buf = alloc::vec![0u8; 16 + 13 + length as usize];
    let (_, len) = client.call(wire::READ_DIRECT_REQUEST, 0, &request, &mut buf, timeout_us)?;
    let reply = wire::decode_read_direct_reply(&buf[16..len])
        .map_err(|_| PacketError::Malformed { received: len, needed: 16 + 5 })?;
    if reply.status != wire::STATUS_OK {
        return Err(PacketError::Malformed { received: reply.status as usize, needed: 0 });
    }
    let n = reply.data.len();
    out[..n].copy_from_slice(reply.data);
    Ok(&out[..n])
}

/// Closes a handle previously returned by [`open`]. Best-effort: the
/// linker doesn't retry a failed close, since a leaked server-side handle
/// only matters if the task keeps running, and by then the image is
/// already mapped.
pub fn close(fileio: PortHandle, handle: u32, timeout_us: u64) -> Result<(), PacketError> {
    let client = Client::connect(fileio)?;
    let mut request = Vec::new();
    wire::encode_close_request(handle, &mut request);
    let mut buf = [0u8; 32];
    client.call(wire::CLOSE_REQUEST, 0, &request, &mut buf, timeout_us)?;
    Ok(())
}

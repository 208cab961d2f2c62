//! Legacy File-IO message encoding (§4.4).
//!
//! Four request/reply pairs over the same 16-byte-header framing as the
//! dispensary, with payload layouts chosen per-message rather than through
//! a general schema — same rationale as `kos_dispensary::wire`.

use alloc::vec::Vec;

pub const GET_CAPABILITIES_REQUEST: u32 = 1;
pub const GET_CAPABILITIES_REPLY: u32 = 2;
pub const OPEN_REQUEST: u32 = 3;
pub const OPEN_REPLY: u32 = 4;
pub const CLOSE_REQUEST: u32 = 5;
pub const CLOSE_REPLY: u32 = 6;
pub const READ_DIRECT_REQUEST: u32 = 7;
pub const READ_DIRECT_REPLY: u32 = 8;

pub const STATUS_OK: u8 = 0;
/// Returned from `Open` when `mode` requests anything but read-only.
pub const STATUS_EROFS: u8 = 1;
/// Returned when a handle doesn't name a currently-open file.
pub const STATUS_EBADF: u8 = 2;
/// Returned from `Open` when the bundle has no file of that name.
pub const STATUS_ENOENT: u8 = 3;
/// Returned from `ReadDirect` when `length` exceeds `max_read_block`.
pub const STATUS_EINVAL: u8 = 4;

/// Read-only mode value accepted by `Open`; anything else is rejected.
pub const MODE_READ_ONLY: u8 = 0;

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("malformed file-io payload")]
pub struct DecodeError;

/// `GetCapabilitiesReply` payload: `version:u32 | caps:u32 | max_read_block:u32`.
pub fn encode_get_capabilities_reply(version: u32, caps: u32, max_read_block: u32, out: &mut Vec<u8>) {
    out.extend_from_slice(&version.to_le_bytes());
    out.extend_from_slice(&caps.to_le_bytes());
    out.extend_from_slice(&max_read_block.to_le_bytes());
}

/// Decoded `GetCapabilitiesReply` payload.
pub struct CapabilitiesReply {
    pub version: u32,
    pub caps: u32,
    pub max_read_block: u32,
}

pub fn decode_get_capabilities_reply(payload: &[u8]) -> Result<CapabilitiesReply, DecodeError> {
    let version = u32::from_le_bytes(payload.get(0..4).ok_or(DecodeError)?.try_into().unwrap());
    let caps = u32::from_le_bytes(payload.get(4..8).ok_or(DecodeError)?.try_into().unwrap());
    let max_read_block = u32::from_le_bytes(payload.get(8..12).ok_or(DecodeError)?.try_into().unwrap());
    Ok(CapabilitiesReply { version, caps, max_read_block })
}

/// `OpenRequest` payload: `mode:u8 | path`. The path is the remainder of
/// the payload, not length-prefixed.
pub fn encode_open_request(mode: u8, path: &str, out: &mut Vec<u8>) {
    out.push(mode);
    out.extend_from_slice(path.as_bytes());
}

pub fn decode_open_request(payload: &[u8]) -> Result<(u8, &str), DecodeError> {
    let mode = *payload.first().ok_or(DecodeError)?;
    let path = core::str::from_utf8(&payload[1..]).map_err(|_| DecodeError)?;
    Ok((mode, path))
}

/// `OpenReply` payload: `status:u8 | handle:u32 | length:u64`.
pub fn encode_open_reply(status: u8, handle: u32, length: u64, out: &mut Vec<u8>) {
    out.push(status);
    out.extend_from_slice(&handle.to_le_bytes());
    out.extend_from_slice(&length.to_le_bytes());
}

/// Decoded `OpenReply` payload.
pub struct OpenReply {
    pub status: u8,
    pub handle: u32,
    pub length: u64,
}

pub fn decode_open_reply(payload: &[u8]) -> Result<OpenReply, DecodeError> {
    let status = *payload.first().ok_or(DecodeError)?;
    let handle = u32::from_le_bytes(payload.get(1..5).ok_or(DecodeError)?.try_into().unwrap());
    let length = u64::from_le_bytes(payload.get(5..13).ok_or(DecodeError)?.try_into().unwrap());
    Ok(OpenReply { status, handle, length })
}

/// `CloseRequest` payload: `handle:u32`.
pub fn encode_close_request(handle: u32, out: &mut Vec<u8>) {
    out.extend_from_slice(&handle.to_le_bytes());
}

pub fn decode_close_request(payload: &[u8]) -> Result<u32, DecodeError> {
    let bytes: [u8; 4] = payload.get(0..4).ok_or(DecodeError)?.try_into().unwrap();
    Ok(u32::from_le_bytes(bytes))
}

/// `CloseReply` payload: `status:u8`.
pub fn encode_close_reply(status: u8, out: &mut Vec<u8>) {
    out.push(status);
}

pub fn decode_close_reply(payload: &[u8]) -> Result<u8, DecodeError> {
    payload.first().copied().ok_or(DecodeError)
}

/// `ReadDirectRequest` payload: `handle:u32 | offset:u64 | length:u32`.
pub fn encode_read_direct_request(handle: u32, offset: u64, length: u32, out: &mut Vec<u8>) {
    out.extend_from_slice(&handle.to_le_bytes());
    out.extend_from_slice(&offset.to_le_bytes());
    out.extend_from_slice(&length.to_le_bytes());
}

pub fn decode_read_direct_request(payload: &[u8]) -> Result<(u32, u64, u32), DecodeError> {
    let handle = u32::from_le_bytes(payload.get(0..4).ok_or(DecodeError)?.try_into().unwrap());
    let offset = u64::from_le_bytes(payload.get(4..12).ok_or(DecodeError)?.try_into().unwrap());
    let length = u32::from_le_bytes(payload.get(12..16).ok_or(DecodeError)?.try_into().unwrap());
    Ok((handle, offset, length))
}

/// `ReadDirectReply` payload: `status:u8 | handle:u32 | data`.
pub fn encode_read_direct_reply(status: u8, handle: u32, data: &[u8], out: &mut Vec<u8>) {
    out.push(status);
    out.extend_from_slice(&handle.to_le_bytes());
    out.extend_from_slice(data);
}

/// Decoded `ReadDirectReply` payload; `data` borrows from the caller's
/// receive buffer.
pub struct ReadDirectReply<'a> {
    pub status: u8,
    pub handle: u32,
    pub data: &'a [u8],
}

pub fn decode_read_direct_reply(payload: &[u8]) -> Result<ReadDirectReply<'_>, DecodeError> {
    let status = *payload.first().ok_or(DecodeError)?;
    let handle = u32::from_le_bytes(payload.get(1..5).ok_or(DecodeError)?.try_into().unwrap());
    let data = payload.get(5..).ok_or(DecodeError)?;
    Ok(ReadDirectReply { status, handle, data })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_request_splits_mode_and_path() {
        let mut payload = alloc::vec![MODE_READ_ONLY];
        payload.extend_from_slice(b"/sbin/dyldo");
        let (mode, path) = decode_open_request(&payload).unwrap();
        assert_eq!(mode, MODE_READ_ONLY);
        assert_eq!(path, "/sbin/dyldo");
    }

    #[test]
    fn read_direct_request_round_trips() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&7u32.to_le_bytes());
        payload.extend_from_slice(&4096u64.to_le_bytes());
        payload.extend_from_slice(&512u32.to_le_bytes());
        let (handle, offset, length) = decode_read_direct_request(&payload).unwrap();
        assert_eq!(handle, 7);
        assert_eq!(offset, 4096);
        assert_eq!(length, 512);
    }

    #[test]
    fn truncated_close_request_is_rejected() {
        assert!(decode_close_request(&[1, 2]).is_err());
    }
}

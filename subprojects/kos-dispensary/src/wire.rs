//! Lookup request/reply payload encoding (§6.2).
//!
//! A small tagged record rather than a general serialization framework,
//! matching the teacher's CMIF headers: the schema is fixed and known to
//! both ends, so there is nothing a general-purpose format would buy.

/// `type` discriminant for a lookup request.
pub const LOOKUP_REQUEST: u32 = 1;
/// `type` discriminant for a lookup reply.
pub const LOOKUP_REPLY: u32 = 2;
/// `type` discriminant for a register request. Not in §6.2's Lookup-only
/// schema table: a task that owns a port (`dyldo`, the task-create
/// endpoint) runs in its own address space, so it cannot call
/// [`crate::registry::register`] directly the way rootsrv's own in-process
/// services do. Exposed over the same port as `Lookup` rather than inventing
/// a second well-known name for it.
pub const REGISTER_REQUEST: u32 = 3;
/// `type` discriminant for a register reply.
pub const REGISTER_REPLY: u32 = 4;

/// `status` byte for a reply carrying a live port.
pub const STATUS_FOUND: u8 = 1;
/// `status` byte for a reply with no matching registration.
pub const STATUS_NOT_FOUND: u8 = 0;

use alloc::vec::Vec;

/// A `Lookup` request payload is just the service name's UTF-8 bytes.
pub fn encode_request(name: &str) -> &[u8] {
    name.as_bytes()
}

/// Decodes a `Lookup` request payload back to a name.
pub fn decode_request(payload: &[u8]) -> Result<&str, core::str::Utf8Error> {
    core::str::from_utf8(payload)
}

/// `LookupReply` payload: `name_len:u8 | name | status:u8 | port:u64`.
pub fn encode_reply(name: &str, status: u8, port: u64, out: &mut Vec<u8>) {
    out.push(name.len() as u8);
    out.extend_from_slice(name.as_bytes());
    out.push(status);
    out.extend_from_slice(&port.to_le_bytes());
}

/// Decoded `LookupReply` payload.
pub struct LookupReply<'a> {
    pub name: &'a str,
    pub status: u8,
    pub port: u64,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("malformed lookup reply payload")]
pub struct DecodeError;

/// Decodes a `LookupReply` payload.
pub fn decode_reply(payload: &[u8]) -> Result<LookupReply<'_>, DecodeError> {
    let name_len = *payload.first().ok_or(DecodeError)? as usize;
    let name_end = 1 + name_len;
    let name_bytes = payload.get(1..name_end).ok_or(DecodeError)?;
    let name = core::str::from_utf8(name_bytes).map_err(|_| DecodeError)?;
    let status = *payload.get(name_end).ok_or(DecodeError)?;
    let port_bytes = payload.get(name_end + 1..name_end + 9).ok_or(DecodeError)?;
    let port = u64::from_le_bytes(port_bytes.try_into().unwrap());
    Ok(LookupReply { name, status, port })
}

/// A `Register` request payload: `name_len:u8 | name | port:u64`.
pub fn encode_register_request(name: &str, port: u64, out: &mut Vec<u8>) {
    out.push(name.len() as u8);
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(&port.to_le_bytes());
}

/// Decoded `Register` request payload.
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub port: u64,
}

/// Decodes a `Register` request payload.
pub fn decode_register_request(payload: &[u8]) -> Result<RegisterRequest<'_>, DecodeError> {
    let name_len = *payload.first().ok_or(DecodeError)? as usize;
    let name_end = 1 + name_len;
    let name_bytes = payload.get(1..name_end).ok_or(DecodeError)?;
    let name = core::str::from_utf8(name_bytes).map_err(|_| DecodeError)?;
    let port_bytes = payload.get(name_end..name_end + 8).ok_or(DecodeError)?;
    let port = u64::from_le_bytes(port_bytes.try_into().unwrap());
    Ok(RegisterRequest { name, port })
}

/// A `RegisterReply` payload is a single status byte, reusing
/// [`STATUS_FOUND`] to mean "accepted".
pub fn encode_register_reply(accepted: bool) -> [u8; 1] {
    [if accepted { STATUS_FOUND } else { STATUS_NOT_FOUND }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_round_trips() {
        let mut buf = Vec::new();
        encode_register_request("me.blraaz.rpc.dyldo", 0x42, &mut buf);
        let decoded = decode_register_request(&buf).unwrap();
        assert_eq!(decoded.name, "me.blraaz.rpc.dyldo");
        assert_eq!(decoded.port, 0x42);
    }

    #[test]
    fn reply_round_trips() {
        let mut buf = Vec::new();
        encode_reply("me.blraaz.rpc.vfs", STATUS_FOUND, 0xABCD, &mut buf);
        let decoded = decode_reply(&buf).unwrap();
        assert_eq!(decoded.name, "me.blraaz.rpc.vfs");
        assert_eq!(decoded.status, STATUS_FOUND);
        assert_eq!(decoded.port, 0xABCD);
    }

    #[test]
    fn truncated_reply_is_rejected() {
        assert!(decode_reply(&[3, b'a', b'b']).is_err());
    }
}

//! `TaskCreated`/`TaskCreatedReply` encoding for the dyldo-pipe call
//! (§6.2 "Dyldo loader").

pub const TASK_CREATED_REQUEST: u32 = 1;
pub const TASK_CREATED_REPLY: u32 = 2;

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("malformed dyldo-pipe payload")]
pub struct DecodeError;

/// `TaskCreatedRequest` payload: `task_handle:u64 | binary_path`.
pub fn encode_request(task_handle: u64, binary_path: &str, out: &mut [u8]) -> Option<usize> {
    let needed = 8 + binary_path.len();
    let dst = out.get_mut(..needed)?;
    dst[..8].copy_from_slice(&task_handle.to_le_bytes());
    dst[8..].copy_from_slice(binary_path.as_bytes());
    Some(needed)
}

/// A decoded `TaskCreatedRequest`, the server (`dyldo`) side of
/// [`encode_request`].
pub struct Request<'a> {
    pub task_handle: u64,
    pub path: &'a str,
}

pub fn decode_request(payload: &[u8]) -> Result<Request<'_>, DecodeError> {
    let task_handle = u64::from_le_bytes(payload.get(0..8).ok_or(DecodeError)?.try_into().unwrap());
    let path = core::str::from_utf8(payload.get(8..).ok_or(DecodeError)?).map_err(|_| DecodeError)?;
    Ok(Request { task_handle, path })
}

/// `TaskCreatedReply` payload: `task_handle:u64 | status:i32 | entry_point:u64`.
pub struct Reply {
    pub task_handle: u64,
    pub status: i32,
    pub entry_point: u64,
}

pub fn decode_reply(payload: &[u8]) -> Result<Reply, DecodeError> {
    let task_handle = u64::from_le_bytes(payload.get(0..8).ok_or(DecodeError)?.try_into().unwrap());
    let status = i32::from_le_bytes(payload.get(8..12).ok_or(DecodeError)?.try_into().unwrap());
    let entry_point = u64::from_le_bytes(payload.get(12..20).ok_or(DecodeError)?.try_into().unwrap());
    Ok(Reply { task_handle, status, entry_point })
}

/// The server (`dyldo`) side of [`decode_reply`].
pub fn encode_reply(task_handle: u64, status: i32, entry_point: u64, out: &mut [u8; 20]) {
    out[0..8].copy_from_slice(&task_handle.to_le_bytes());
    out[8..12].copy_from_slice(&status.to_le_bytes());
    out[12..20].copy_from_slice(&entry_point.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_round_trips() {
        let mut buf = [0u8; 20];
        buf[0..8].copy_from_slice(&7u64.to_le_bytes());
        buf[8..12].copy_from_slice(&0i32.to_le_bytes());
        buf[12..20].copy_from_slice(&0x4000_00u64.to_le_bytes());
        let reply = decode_reply(&buf).unwrap();
        assert_eq!(reply.task_handle, 7);
        assert_eq!(reply.status, 0);
        assert_eq!(reply.entry_point, 0x4000_00);
    }

    #[test]
    fn request_round_trips() {
        let mut buf = [0u8; 64];
        let len = encode_request(9, "/lib/libc.so", &mut buf).unwrap();
        let decoded = decode_request(&buf[..len]).unwrap();
        assert_eq!(decoded.task_handle, 9);
        assert_eq!(decoded.path, "/lib/libc.so");
    }

    #[test]
    fn reply_encode_decode_round_trips() {
        let mut buf = [0u8; 20];
        encode_reply(3, -1, 0, &mut buf);
        let decoded = decode_reply(&buf).unwrap();
        assert_eq!(decoded.task_handle, 3);
        assert_eq!(decoded.status, -1);
        assert_eq!(decoded.entry_point, 0);
    }
}

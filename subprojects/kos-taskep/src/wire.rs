//! `CreateTaskRequest`/`CreateTaskReply` encoding (§6.2 "Task-creation
//! endpoint"), the public entry point a client RPCs to run a binary out of
//! the init bundle. Same tagged-record shape as every other wire module in
//! this tree (`kos-dispensary::wire`, `kos-loader::wire`): the schema is
//! fixed and known to both ends.

use alloc::string::String;
use alloc::vec::Vec;

pub const CREATE_TASK_REQUEST: u32 = 1;
pub const CREATE_TASK_REPLY: u32 = 2;

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("malformed create-task payload")]
pub struct DecodeError;

/// `CreateTaskRequest` payload: `path_len:u16 | path | argc:u16 |
/// (arg_len:u16 | arg)*`.
pub fn encode_request(path: &str, args: &[&str], out: &mut Vec<u8>) {
    out.extend_from_slice(&(path.len() as u16).to_le_bytes());
    out.extend_from_slice(path.as_bytes());
    out.extend_from_slice(&(args.len() as u16).to_le_bytes());
    for arg in args {
        out.extend_from_slice(&(arg.len() as u16).to_le_bytes());
        out.extend_from_slice(arg.as_bytes());
    }
}

/// A decoded `CreateTaskRequest`, owning its strings since the client's
/// argv has no buffer to borrow from once the server's `receive` call
/// returns (unlike the launch-info page's later borrow of the same data).
pub struct Request {
    pub path: String,
    pub args: Vec<String>,
}

pub fn decode_request(payload: &[u8]) -> Result<Request, DecodeError> {
    let mut cursor = 0usize;
    let path_len = read_u16(payload, &mut cursor)?;
    let path_bytes = payload.get(cursor..cursor + path_len).ok_or(DecodeError)?;
    let path = String::from(core::str::from_utf8(path_bytes).map_err(|_| DecodeError)?);
    cursor += path_len;

    let argc = read_u16(payload, &mut cursor)?;
    let mut args = Vec::with_capacity(argc);
    for _ in 0..argc {
        let arg_len = read_u16(payload, &mut cursor)?;
        let arg_bytes = payload.get(cursor..cursor + arg_len).ok_or(DecodeError)?;
        args.push(String::from(core::str::from_utf8(arg_bytes).map_err(|_| DecodeError)?));
        cursor += arg_len;
    }

    Ok(Request { path, args })
}

fn read_u16(payload: &[u8], cursor: &mut usize) -> Result<usize, DecodeError> {
    let bytes = payload.get(*cursor..*cursor + 2).ok_or(DecodeError)?;
    *cursor += 2;
    Ok(u16::from_le_bytes(bytes.try_into().unwrap()) as usize)
}

/// `CreateTaskReply` payload: `status:i32 | handle:u64` (§7: a failed
/// create surfaces as `status != 0`, `handle == 0`).
pub fn encode_reply(status: i32, handle: u64, out: &mut [u8; 12]) {
    out[0..4].copy_from_slice(&status.to_le_bytes());
    out[4..12].copy_from_slice(&handle.to_le_bytes());
}

pub struct Reply {
    pub status: i32,
    pub handle: u64,
}

pub fn decode_reply(payload: &[u8]) -> Result<Reply, DecodeError> {
    let status = i32::from_le_bytes(payload.get(0..4).ok_or(DecodeError)?.try_into().unwrap());
    let handle = u64::from_le_bytes(payload.get(4..12).ok_or(DecodeError)?.try_into().unwrap());
    Ok(Reply { status, handle })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trips_with_multiple_args() {
        let mut buf = Vec::new();
        encode_request("/sbin/init", &["-v", "--once"], &mut buf);
        let decoded = decode_request(&buf).unwrap();
        assert_eq!(decoded.path, "/sbin/init");
        assert_eq!(decoded.args, alloc::vec![String::from("-v"), String::from("--once")]);
    }

    #[test]
    fn request_round_trips_with_no_args() {
        let mut buf = Vec::new();
        encode_request("/sbin/init", &[], &mut buf);
        let decoded = decode_request(&buf).unwrap();
        assert_eq!(decoded.path, "/sbin/init");
        assert!(decoded.args.is_empty());
    }

    #[test]
    fn reply_round_trips() {
        let mut buf = [0u8; 12];
        encode_reply(0, 0x42, &mut buf);
        let decoded = decode_reply(&buf).unwrap();
        assert_eq!(decoded.status, 0);
        assert_eq!(decoded.handle, 0x42);
    }

    #[test]
    fn truncated_request_is_rejected() {
        assert!(decode_request(&[5, 0, b'a']).is_err());
    }
}

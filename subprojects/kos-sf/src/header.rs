//! The 16-byte packet header shared by every RPC endpoint (§4.2, §6.2).

use static_assertions::const_assert_eq;
use zerocopy::little_endian::{U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Wire-format header: `(type:u32, reply_port:u64, tag:u32)`.
///
/// Every endpoint in §6.2 reuses this exact framing; only the payload
/// schema and the `type` discriminant values differ per endpoint.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct Header {
    pub message_type: U32,
    pub reply_port: U64,
    pub tag: U32,
}

const_assert_eq!(size_of::<Header>(), 16);

impl Header {
    pub fn new(message_type: u32, reply_port: u64, tag: u32) -> Self {
        Header {
            message_type: message_type.into(),
            reply_port: reply_port.into(),
            tag: tag.into(),
        }
    }
}

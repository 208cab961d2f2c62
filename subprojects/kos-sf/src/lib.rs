//! # kos-sf
//!
//! The RPC wire framing shared by every endpoint (§4.2, §6.2): a 16-byte
//! `(type, reply_port, tag)` header in front of a per-endpoint payload.
//! Grounded on the teacher's `nx-sf`, which layers the same
//! header-then-payload shape (HIPC framing + a CMIF header) under its own
//! service APIs; this system's endpoints need none of HIPC's buffer
//! descriptor machinery, so the framing collapses to the header plus a
//! flat payload slice.

#![no_std]

extern crate alloc;

pub mod client;
pub mod error;
pub mod header;
pub mod server;

pub use client::Client;
pub use error::PacketError;
pub use header::Header;
pub use server::Server;

#[cfg(test)]
mod tests {
    use super::header::Header;
    use zerocopy::IntoBytes;

    #[test]
    fn header_round_trips_through_bytes() {
        let header = Header::new(7, 0x1122_3344_5566_7788, 42);
        let bytes = header.as_bytes();
        assert_eq!(bytes.len(), 16);
        let parsed: Header = zerocopy::FromBytes::read_from_bytes(bytes).unwrap();
        assert_eq!(parsed.message_type.get(), 7);
        assert_eq!(parsed.reply_port.get(), 0x1122_3344_5566_7788);
        assert_eq!(parsed.tag.get(), 42);
    }
}

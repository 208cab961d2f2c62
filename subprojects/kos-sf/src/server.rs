//! Server-side RPC framing (§4.2 "A server:").

use alloc::vec::Vec;

use kos_svc::handle::PortHandle;
use kos_svc::port;
use zerocopy::IntoBytes;

use crate::error::PacketError;
use crate::header::Header;

/// A single well-known port a server blocks on (§4.2 step 1).
pub struct Server {
    port: PortHandle,
}

impl Server {
    pub fn new(port: PortHandle) -> Self {
        Server { port }
    }

    pub fn port(&self) -> PortHandle {
        self.port
    }

    /// Blocks until a request arrives, validates the header, and returns
    /// it along with the payload slice (§4.2 step 2).
    pub fn receive<'a>(&self, buf: &'a mut [u8], timeout_us: u64) -> Result<(Header, &'a [u8]), PacketError> {
        let received = port::receive(self.port, buf, timeout_us).map_err(PacketError::from_kernel)?;
        if received < 16 {
            return Err(PacketError::Malformed {
                received,
                needed: 16,
            });
        }
        let header = zerocopy::FromBytes::read_from_bytes(&buf[..16])
            .map_err(|_| PacketError::Malformed { received, needed: 16 })?;
        Ok((header, &buf[16..received]))
    }

    /// Sends a framed reply to the caller's `reply_port` (§4.2 step 3).
    pub fn reply(&self, reply_port: u64, message_type: u32, tag: u32, payload: &[u8]) -> Result<(), PacketError> {
        let reply_port = unsafe { PortHandle::from_raw(reply_port) };
        let header = Header::new(message_type, 0, tag);
        let mut buf = Vec::with_capacity(16 + payload.len());
        buf.extend_from_slice(header.as_bytes());
        buf.extend_from_slice(payload);
        port::send(reply_port, &buf).map_err(PacketError::from_kernel)
    }
}

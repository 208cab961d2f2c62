//! Client-side RPC framing (§4.2 "A client:").

use alloc::vec::Vec;

use kos_svc::handle::PortHandle;
use kos_svc::port;

use crate::error::PacketError;
use crate::header::Header;

/// An RPC client bound to one server port, reusing a single reply port
/// across calls as the teacher's service proxies reuse one session handle
/// (§4.2 step 1: "allocates a reply port (or reuses a dedicated one)").
pub struct Client {
    server: PortHandle,
    reply: PortHandle,
}

impl Client {
    /// Creates a reply port and binds it to `server`.
    pub fn connect(server: PortHandle) -> Result<Self, PacketError> {
        let reply = port::create().map_err(PacketError::from_kernel)?;
        Ok(Client { server, reply })
    }

    /// The reply port this client receives responses on, for embedding in
    /// a request header.
    pub fn reply_port(&self) -> PortHandle {
        self.reply
    }

    /// Sends a framed request and blocks for the matching reply, retrying
    /// receives whose `tag` doesn't match (another outstanding call's
    /// reply arrived first on the shared reply port).
    pub fn call(
        &self,
        message_type: u32,
        tag: u32,
        payload: &[u8],
        recv_buf: &mut [u8],
        timeout_us: u64,
    ) -> Result<(Header, usize), PacketError> {
        self.send(message_type, tag, payload)?;
        loop {
            let (header, len) = self.receive_reply(recv_buf, timeout_us)?;
            if header.tag.get() == tag {
                return Ok((header, len));
            }
        }
    }

    /// Writes header + payload to the server port without waiting for a
    /// reply (§4.2 step 3).
    pub fn send(&self, message_type: u32, tag: u32, payload: &[u8]) -> Result<(), PacketError> {
        let header = Header::new(message_type, self.reply.to_raw(), tag);
        let mut buf = Vec::with_capacity(16 + payload.len());
        buf.extend_from_slice(zerocopy::IntoBytes::as_bytes(&header));
        buf.extend_from_slice(payload);
        port::send(self.server, &buf).map_err(PacketError::from_kernel)
    }

    fn receive_reply(&self, buf: &mut [u8], timeout_us: u64) -> Result<(Header, usize), PacketError> {
        let received = port::receive(self.reply, buf, timeout_us).map_err(PacketError::from_kernel)?;
        if received < 16 {
            return Err(PacketError::Malformed {
                received,
                needed: 16,
            });
        }
        let header = zerocopy::FromBytes::read_from_bytes(&buf[..16])
            .map_err(|_| PacketError::Malformed { received, needed: 16 })?;
        Ok((header, received))
    }
}

//! The task-creation endpoint's RPC server (§6.2, §2 boot flow): decodes a
//! `CreateTaskRequest`, opens the named binary out of the init bundle,
//! creates a task for it, and drives `kos_loader::load` to place it.

use kos_bundle::Bundle;
use kos_sf::{PacketError, Server};
use kos_svc::handle::PortHandle;
use kos_svc::task;

use crate::wire::{self, CREATE_TASK_REPLY, CREATE_TASK_REQUEST};

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error(transparent)]
    Rpc(#[from] PacketError),
}

/// Services one `CreateTaskRequest` off `server`, blocking up to
/// `timeout_us`. `dyldo` is resolved once by the caller before entering its
/// receive loop (§4.1: "the task-creation flow gates on 'dynamic-linker
/// port registered' before servicing any create request") rather than
/// re-looked-up per request.
pub fn serve_one(bundle: &Bundle<'_>, dyldo: PortHandle, server: &Server, timeout_us: u64) -> Result<(), ServeError> {
    let mut buf = [0u8; 512];
    let (header, payload) = server.receive(&mut buf, timeout_us)?;
    if header.message_type.get() != CREATE_TASK_REQUEST {
        return Ok(());
    }
    let reply_port = header.reply_port.get();
    let tag = header.tag.get();

    let Ok(request) = wire::decode_request(payload) else {
        let mut reply = [0u8; 12];
        wire::encode_reply(-1, 0, &mut reply);
        return Ok(server.reply(reply_port, CREATE_TASK_REPLY, tag, &reply)?);
    };

    let (status, handle) = match create_task(bundle, dyldo, &request) {
        Ok(handle) => (0, handle.to_raw()),
        Err(err) => {
            log::warn!("task endpoint: failed to create {:?}: {err}", request.path);
            (-1, 0)
        }
    };

    let mut reply = [0u8; 12];
    wire::encode_reply(status, handle, &mut reply);
    Ok(server.reply(reply_port, CREATE_TASK_REPLY, tag, &reply)?)
}

/// Runs [`serve_one`] forever on `port`.
pub fn serve_forever(bundle: &Bundle<'_>, dyldo: PortHandle, port: PortHandle) -> ! {
    let server = Server::new(port);
    loop {
        if let Err(err) = serve_one(bundle, dyldo, &server, u64::MAX) {
            log::warn!("task endpoint: dropping malformed request: {err}");
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CreateError {
    #[error("{0:?} not found in the init bundle")]
    NotFound(alloc::string::String),
    #[error(transparent)]
    Contents(#[from] kos_bundle::LzfseError),
    #[error(transparent)]
    Kernel(#[from] kos_svc::KernelError),
    #[error(transparent)]
    Load(#[from] kos_loader::LoadError),
}

fn create_task(
    bundle: &Bundle<'_>,
    dyldo: PortHandle,
    request: &wire::Request,
) -> Result<kos_svc::handle::TaskHandle, CreateError> {
    let file = bundle.open(&request.path).ok_or_else(|| CreateError::NotFound(request.path.clone()))?;
    let contents = file.contents()?;

    let target = task::create(None)?;
    let _ = task::set_name(target, &request.path);

    let args: alloc::vec::Vec<&str> = request.args.iter().map(alloc::string::String::as_str).collect();
    kos_loader::load(target, &contents, &request.path, &args, Some(dyldo))?;

    Ok(target)
}

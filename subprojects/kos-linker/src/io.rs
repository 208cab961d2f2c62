//! Whole-file reads over the legacy file-IO endpoint (§4.6 step 1: "the
//! linker re-opens the executable by path... because the dynamic section
//! references file offsets, not trusting whatever is already mapped").
//!
//! The linker needs random access to program headers, `.dynamic`,
//! `.dynsym`, and relocation tables scattered across a file, so rather than
//! chase each offset with its own `ReadDirect` round trip, the whole file
//! is pulled into one buffer up front and handed to [`kos_elf::ElfImage`]
//! exactly as the root-server loader treats its own pre-mapped image.

use alloc::string::ToString;
use alloc::vec::Vec;

use kos_svc::handle::PortHandle;

use crate::error::LinkError;

pub fn read_whole_file(fileio: PortHandle, path: &str, timeout_us: u64) -> Result<Vec<u8>, LinkError> {
    let opened = kos_fileio::open(fileio, path, timeout_us)?
        .ok_or_else(|| LinkError::OpenFailed(kos_fileio::wire::STATUS_ENOENT, path.to_string()))?;
    let max_block = kos_fileio::max_read_block(fileio, timeout_us)?;

    let mut contents = Vec::with_capacity(opened.length as usize);
    let mut offset = 0u64;
    let mut chunk = alloc::vec![0u8; max_block as usize];
    while offset < opened.length {
        let want = core::cmp::min(max_block as u64, opened.length - offset) as u32;
        let got = kos_fileio::read_direct(fileio, opened.handle, offset, want, &mut chunk, timeout_us)?;
        if got.is_empty() {
            break;
        }
        contents.extend_from_slice(got);
        offset += got.len() as u64;
    }
    let _ = kos_fileio::close(fileio, opened.handle, timeout_us);
    Ok(contents)
}

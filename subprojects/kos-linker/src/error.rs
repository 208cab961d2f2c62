//! Failure modes of the dynamic linker (§7).

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error(transparent)]
    Image(#[from] kos_elf::ImageError),
    #[error("{0} is not a dynamically linked object")]
    NotDynamic(alloc::string::String),
    #[error("e_machine {0:#x} does not match this kernel's architecture")]
    UnsupportedArch(u16),
    #[error("{0} has no PT_DYNAMIC segment")]
    MissingDynamic(alloc::string::String),
    #[error("DT_NEEDED {0:?} was not found on the library search path")]
    MissingDependency(alloc::string::String),
    #[error("'{name}' is defined as a global symbol by both '{first}' and '{second}'")]
    DuplicateGlobalSymbol {
        name: alloc::string::String,
        first: alloc::string::String,
        second: alloc::string::String,
    },
    #[error("relocation type {0:#x} is not implemented for this architecture")]
    UnknownRelocation(u32),
    #[error("PT_LOAD requests both WRITE and EXEC, refused")]
    WriteExec,
    #[error("relocation at {0:#x} targets an address outside every loaded segment")]
    RelocationOutOfRange(u64),
    #[error("undefined symbol '{0}'")]
    UndefinedSymbol(alloc::string::String),
    #[error(transparent)]
    Mem(#[from] kos_mem::region::MemError),
    #[error(transparent)]
    Kernel(#[from] kos_svc::KernelError),
    #[error(transparent)]
    Rpc(#[from] kos_sf::PacketError),
    #[error("file-io reported status {0} opening '{1}'")]
    OpenFailed(u8, alloc::string::String),
    #[error("'{0}' is not valid UTF-8")]
    BadPath(alloc::string::String),
    #[error(transparent)]
    TlsPage(#[from] crate::tls_page::BuildError),
}

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Failed to load native artifact '{}': {source}", .path.display())]
    ArtifactLoad {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },
    #[error("Symbol '{symbol}' not found in '{}': {source}", .path.display())]
    SymbolResolution {
        symbol: &'static str,
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },
    #[error("'{symbol}' is not exported by '{}'", .path.display())]
    UnboundSymbol { symbol: &'static str, path: PathBuf },
    #[error("ABI version mismatch: artifact exports version {found}, expected {expected}")]
    AbiMismatch { expected: u32, found: u32 },
    #[error("Native call '{symbol}' failed: {message}")]
    NativeCallFault {
        symbol: &'static str,
        message: String,
    },
    #[error("Native call '{symbol}' returned a malformed buffer (len {len} > cap {cap})")]
    MalformedDescriptor {
        symbol: &'static str,
        len: usize,
        cap: usize,
    },
    #[error("Proof rejected by '{symbol}': {message}")]
    ProofRejected {
        symbol: &'static str,
        message: String,
    },
}

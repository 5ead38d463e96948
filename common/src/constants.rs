/// Version of the C ABI described by this crate. Bumped whenever a shared
/// `#[repr(C)]` type or an exported signature changes.
pub const ABI_VERSION: u32 = 1;

/// Base name of the native artifact (`libnewbp.so`, `libnewbp.dylib`, `newbp.dll`).
pub const LIBRARY_NAME: &str = "newbp";
pub const DEFAULT_LIBRARY_DIR: &str = "target/release";

pub const NAIVE_PROVE_SYMBOL: &str = "naive_prove";
pub const NAIVE_VERIFY_SYMBOL: &str = "naive_verify";
pub const PROVE_MULTIPLE_SYMBOL: &str = "bulletproofs_prove_multiple";
pub const VERIFY_SYMBOL: &str = "bulletproofs_verify";
pub const BUFFER_FREE_SYMBOL: &str = "newbp_buffer_free";
pub const LAST_ERROR_SYMBOL: &str = "newbp_last_error";
pub const ABI_VERSION_SYMBOL: &str = "newbp_abi_version";
pub const LOGGING_INIT_SYMBOL: &str = "newbp_logging_init";

/// Size in bytes of a blinding scalar and of a compressed commitment.
pub const SCALAR_BYTES: usize = 32;

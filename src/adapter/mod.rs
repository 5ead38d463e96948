//! Foreign call adapter for the newbp native library.
//!
//! ```text
//! NativeProver::load(path)        libloading: map the artifact
//!       │
//!       ▼
//! symbol resolution               naive_prove (required) + companions
//!       │
//!       ▼
//! invoke_naive_prove()            one synchronous native call
//!       │
//!       ▼
//! ProofBuffer                     owned (ptr, len, cap), released on drop
//! ```

mod buffer;
mod error;
mod loader;

pub use buffer::ProofBuffer;
pub use error::AdapterError;
pub use loader::{
    default_library_path, AbiVersionFn, BufferFreeFn, LastErrorFn, LoggingInitFn, NaiveProveFn,
    NativeProver, ProveMultipleFn, ProverSymbols, VerifyFn,
};

#[cfg(test)]
mod tests;

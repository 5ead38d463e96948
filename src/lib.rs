//! Loader for the newbp native range-proof library.
//!
//! The library is reached only through dynamic symbol resolution; see
//! [`adapter::NativeProver`].

pub mod adapter;
pub mod cli;

pub use adapter::{default_library_path, AdapterError, NativeProver, ProofBuffer, ProverSymbols};

//! Bulletproofs range proofs served by the newbp native library.

pub mod bundle;
pub mod errors;
pub mod prover;

pub use bundle::ProofBundle;
pub use errors::RangeProofError;
pub use prover::{blinding_from_bytes, naive_prove, verify, RangeProver};

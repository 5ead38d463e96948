use bulletproofs::ProofError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RangeProofError {
    #[error("Invalid bit size {0}, expected one of 8, 16, 32, 64")]
    InvalidBitSize(usize),
    #[error("No witness values supplied")]
    EmptyWitness,
    #[error("Invalid input length, expected {0} blindings but got {1}")]
    LengthMismatch(usize, usize),
    #[error("Unsupported aggregation of {count} values, expected a power of two up to {max}")]
    UnsupportedAggregation { count: usize, max: usize },
    #[error("Proof is {found} bytes, expected {expected} for {count} values of {bit_size} bits")]
    ProofLength {
        found: usize,
        expected: usize,
        count: usize,
        bit_size: usize,
    },
    #[error("Value {value} does not fit in {bit_size} bits")]
    ValueOutOfRange { value: u64, bit_size: usize },
    #[error("Bulletproofs error: {0:?}")]
    Bulletproofs(ProofError),
    #[error("Proof bundle encoding error: {0}")]
    Serialization(#[from] postcard::Error),
    #[error("Range proof verification failed")]
    VerificationFailed,
}

impl From<ProofError> for RangeProofError {
    fn from(err: ProofError) -> Self {
        match err {
            ProofError::VerificationError => RangeProofError::VerificationFailed,
            other => RangeProofError::Bulletproofs(other),
        }
    }
}

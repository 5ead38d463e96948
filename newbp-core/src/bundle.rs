use bulletproofs::RangeProof;
use curve25519_dalek::ristretto::CompressedRistretto;
use serde::{Deserialize, Serialize};

use crate::errors::RangeProofError;

/// A range proof together with the Pedersen commitments it speaks about.
///
/// This is the payload carried inside every descriptor returned by the
/// proving entry points of the native library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofBundle {
    pub bit_size: u32,
    pub commitments: Vec<[u8; 32]>,
    pub proof: Vec<u8>,
}

impl ProofBundle {
    pub(crate) fn new(bit_size: usize, proof: &RangeProof, commitments: &[CompressedRistretto]) -> Self {
        Self {
            bit_size: bit_size as u32,
            commitments: commitments.iter().map(|c| c.to_bytes()).collect(),
            proof: proof.to_bytes(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, RangeProofError> {
        Ok(postcard::to_stdvec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RangeProofError> {
        Ok(postcard::from_bytes(bytes)?)
    }

    pub fn num_values(&self) -> usize {
        self.commitments.len()
    }

    pub(crate) fn range_proof(&self) -> Result<RangeProof, RangeProofError> {
        Ok(RangeProof::from_bytes(&self.proof)?)
    }

    pub(crate) fn compressed_commitments(&self) -> Vec<CompressedRistretto> {
        self.commitments
            .iter()
            .map(|bytes| CompressedRistretto(*bytes))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_truncated_bytes() {
        let bundle = ProofBundle {
            bit_size: 64,
            commitments: vec![[7u8; 32]; 2],
            proof: vec![1, 2, 3],
        };
        let bytes = bundle.to_bytes().unwrap();
        assert_eq!(ProofBundle::from_bytes(&bytes).unwrap(), bundle);

        let err = ProofBundle::from_bytes(&bytes[..bytes.len() - 2]).unwrap_err();
        assert!(matches!(err, RangeProofError::Serialization(_)));
    }

    #[test]
    fn garbage_proof_bytes_fail_to_parse() {
        let bundle = ProofBundle {
            bit_size: 64,
            commitments: vec![[0u8; 32]],
            proof: vec![0xff; 5],
        };
        assert!(bundle.range_proof().is_err());
    }
}

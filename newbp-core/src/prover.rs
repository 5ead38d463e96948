use bulletproofs::{BulletproofGens, PedersenGens, RangeProof};
use curve25519_dalek::scalar::Scalar;
use merlin::Transcript;
use rand::{CryptoRng, RngCore};

use crate::bundle::ProofBundle;
use crate::errors::RangeProofError;

/// Domain separator shared by every prover and verifier transcript.
pub const TRANSCRIPT_LABEL: &[u8] = b"doctest example";

/// Secret proven by [`naive_prove`].
pub const NAIVE_SECRET: u64 = 1037574391;

pub const DEFAULT_BIT_SIZE: usize = 64;

const SUPPORTED_BIT_SIZES: [usize; 4] = [8, 16, 32, 64];

/// Largest number of values a single aggregated proof may cover.
pub const MAX_AGGREGATION: usize = 64;

/// Encoded size of a range proof over `count` values of `bit_size` bits:
/// four points and three scalars, then `2 * log2(bit_size * count)` inner
/// product points and two scalars.
pub fn expected_proof_len(bit_size: usize, count: usize) -> usize {
    let rounds = (bit_size * count).trailing_zeros() as usize;
    (2 * rounds + 9) * 32
}

fn check_aggregation(count: usize) -> Result<(), RangeProofError> {
    if !count.is_power_of_two() || count > MAX_AGGREGATION {
        return Err(RangeProofError::UnsupportedAggregation {
            count,
            max: MAX_AGGREGATION,
        });
    }
    Ok(())
}

/// Interprets 32 little-endian bytes as a blinding scalar, reducing modulo
/// the group order.
pub fn blinding_from_bytes(bytes: [u8; 32]) -> Scalar {
    Scalar::from_bytes_mod_order(bytes)
}

/// Bulletproofs range prover over `[0, 2^bit_size)`.
pub struct RangeProver {
    pc_gens: PedersenGens,
    bit_size: usize,
}

impl RangeProver {
    pub fn new(bit_size: usize) -> Result<Self, RangeProofError> {
        if !SUPPORTED_BIT_SIZES.contains(&bit_size) {
            return Err(RangeProofError::InvalidBitSize(bit_size));
        }
        Ok(Self {
            pc_gens: PedersenGens::default(),
            bit_size,
        })
    }

    pub fn bit_size(&self) -> usize {
        self.bit_size
    }

    fn check_range(&self, value: u64) -> Result<(), RangeProofError> {
        if self.bit_size < 64 && value >> self.bit_size != 0 {
            return Err(RangeProofError::ValueOutOfRange {
                value,
                bit_size: self.bit_size,
            });
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, name = "RangeProver::prove_single")]
    pub fn prove_single(
        &self,
        value: u64,
        blinding: &Scalar,
    ) -> Result<ProofBundle, RangeProofError> {
        self.check_range(value)?;
        let bp_gens = BulletproofGens::new(self.bit_size, 1);
        let mut transcript = Transcript::new(TRANSCRIPT_LABEL);

        let (proof, commitment) = RangeProof::prove_single(
            &bp_gens,
            &self.pc_gens,
            &mut transcript,
            value,
            blinding,
            self.bit_size,
        )?;
        Ok(ProofBundle::new(self.bit_size, &proof, &[commitment]))
    }

    /// Aggregated proof that every value lies in range.
    ///
    /// The aggregation size must be a power of two; shorter witnesses are
    /// padded with zero values under fresh random blindings, and the padding
    /// commitments are kept in the bundle so it verifies on its own.
    #[tracing::instrument(skip_all, name = "RangeProver::prove_multiple")]
    pub fn prove_multiple<R: RngCore + CryptoRng>(
        &self,
        values: &[u64],
        blindings: &[Scalar],
        rng: &mut R,
    ) -> Result<ProofBundle, RangeProofError> {
        if values.is_empty() {
            return Err(RangeProofError::EmptyWitness);
        }
        if values.len() != blindings.len() {
            return Err(RangeProofError::LengthMismatch(values.len(), blindings.len()));
        }
        for &value in values {
            self.check_range(value)?;
        }

        let parties = values.len().next_power_of_two();
        check_aggregation(parties)?;
        let mut values = values.to_vec();
        let mut blindings = blindings.to_vec();
        if parties != values.len() {
            tracing::debug!(
                given = values.len(),
                padded = parties,
                "padding witness to a power of two"
            );
        }
        values.resize(parties, 0);
        blindings.resize_with(parties, || Scalar::random(&mut *rng));

        let bp_gens = BulletproofGens::new(self.bit_size, parties);
        let mut transcript = Transcript::new(TRANSCRIPT_LABEL);
        let (proof, commitments) = RangeProof::prove_multiple(
            &bp_gens,
            &self.pc_gens,
            &mut transcript,
            &values,
            &blindings,
            self.bit_size,
        )?;
        Ok(ProofBundle::new(self.bit_size, &proof, &commitments))
    }
}

#[tracing::instrument(skip_all, name = "verify")]
pub fn verify(bundle: &ProofBundle) -> Result<(), RangeProofError> {
    let bit_size = bundle.bit_size as usize;
    if !SUPPORTED_BIT_SIZES.contains(&bit_size) {
        return Err(RangeProofError::InvalidBitSize(bit_size));
    }
    let count = bundle.num_values();
    if count == 0 {
        return Err(RangeProofError::EmptyWitness);
    }
    // Generator setup grows with the commitment count, so bound it first.
    check_aggregation(count)?;
    let expected = expected_proof_len(bit_size, count);
    if bundle.proof.len() != expected {
        return Err(RangeProofError::ProofLength {
            found: bundle.proof.len(),
            expected,
            count,
            bit_size,
        });
    }
    let commitments = bundle.compressed_commitments();
    let proof = bundle.range_proof()?;

    let pc_gens = PedersenGens::default();
    let bp_gens = BulletproofGens::new(bit_size, commitments.len());
    let mut transcript = Transcript::new(TRANSCRIPT_LABEL);
    if commitments.len() == 1 {
        proof.verify_single(&bp_gens, &pc_gens, &mut transcript, &commitments[0], bit_size)?;
    } else {
        proof.verify_multiple(&bp_gens, &pc_gens, &mut transcript, &commitments, bit_size)?;
    }
    Ok(())
}

/// Proves that [`NAIVE_SECRET`] lies in `[0, 2^64)` under a random blinding.
pub fn naive_prove<R: RngCore + CryptoRng>(rng: &mut R) -> Result<ProofBundle, RangeProofError> {
    tracing::info!("i will start proving!");
    let prover = RangeProver::new(DEFAULT_BIT_SIZE)?;
    let blinding = Scalar::random(rng);
    let bundle = prover.prove_single(NAIVE_SECRET, &blinding)?;
    tracing::info!(
        proof_bytes = bundle.proof.len(),
        commitment = %hex_prefix(&bundle.commitments[0]),
        "naive proof generated"
    );
    Ok(bundle)
}

fn hex_prefix(bytes: &[u8; 32]) -> String {
    hex::encode(&bytes[..4])
}

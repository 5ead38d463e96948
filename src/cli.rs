use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use common::constants::SCALAR_BYTES;
use eyre::{Result, WrapErr};
use newbp_core::ProofBundle;
use rand::Rng;

use crate::adapter::{NativeProver, ProofBuffer};

/// Printed once a command finished without error.
pub const COMPLETION_MESSAGE: &str = "done!";

/// Drive the newbp native range-proof library.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the native artifact [default: target/release/libnewbp.so]
    #[arg(long, global = true, env = "NEWBP_LIB")]
    pub lib: Option<PathBuf>,

    /// Let the native library install its own log subscriber
    #[arg(long, global = true)]
    pub native_logs: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Call naive_prove once (the default command)
    Prove(OutputArgs),

    /// Aggregated 64-bit range proof over a list of values
    ProveMultiple {
        /// Comma-separated values to prove in range
        #[arg(required = true, value_delimiter = ',')]
        values: Vec<u64>,

        /// Hex-encoded 32-byte little-endian blinding, once per value.
        /// Random blindings are drawn when omitted.
        #[arg(long = "blinding", value_parser = parse_blinding)]
        blindings: Vec<[u8; 32]>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Verify a proof bundle written by `prove --out`
    Verify {
        /// File holding the proof bundle bytes
        proof: PathBuf,

        /// Only accept single-value proofs from naive_prove
        #[arg(long)]
        naive: bool,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct OutputArgs {
    /// Print the returned bytes as hex
    #[arg(long)]
    pub hex: bool,

    /// Write the returned bytes to a file
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

fn parse_blinding(s: &str) -> Result<[u8; 32], String> {
    let bytes = hex::decode(s.trim_start_matches("0x")).map_err(|e| e.to_string())?;
    <[u8; SCALAR_BYTES]>::try_from(bytes.as_slice())
        .map_err(|_| format!("expected {SCALAR_BYTES} bytes, got {}", bytes.len()))
}

/// Run `command` against `prover`, writing user-facing output to `out`.
///
/// The completion message is written only if every step succeeded.
pub fn execute<W: Write>(prover: &NativeProver, command: Command, out: &mut W) -> Result<()> {
    match command {
        Command::Prove(output) => {
            let proof = prover.invoke_naive_prove()?;
            report(&proof, &output, out)?;
        }
        Command::ProveMultiple {
            values,
            mut blindings,
            output,
        } => {
            if blindings.is_empty() {
                let mut rng = rand::thread_rng();
                blindings = values.iter().map(|_| rng.gen()).collect();
            }
            let proof = prover.invoke_prove_multiple(&values, &blindings)?;
            report(&proof, &output, out)?;
        }
        Command::Verify { proof, naive } => {
            let bytes = fs::read(&proof)
                .wrap_err_with(|| format!("Failed to read proof from {}", proof.display()))?;
            if naive {
                prover.invoke_naive_verify(&bytes)?;
            } else {
                prover.invoke_verify(&bytes)?;
            }
            tracing::info!("proof in {} is valid", proof.display());
        }
    }
    writeln!(out, "{COMPLETION_MESSAGE}")?;
    Ok(())
}

fn report<W: Write>(proof: &ProofBuffer<'_>, output: &OutputArgs, out: &mut W) -> Result<()> {
    let raw = proof.descriptor();
    tracing::info!(ptr = ?raw.ptr, len = raw.len, cap = raw.cap, "native call returned");

    match ProofBundle::from_bytes(proof.as_bytes()) {
        Ok(bundle) => tracing::info!(
            commitments = bundle.num_values(),
            bit_size = bundle.bit_size,
            proof_bytes = bundle.proof.len(),
            "decoded proof bundle"
        ),
        Err(e) => tracing::warn!("returned bytes are not a proof bundle: {e}"),
    }

    if output.hex {
        writeln!(out, "{}", hex::encode(proof.as_bytes()))?;
    }
    if let Some(path) = &output.out {
        fs::write(path, proof.as_bytes())
            .wrap_err_with(|| format!("Failed to write proof to {}", path.display()))?;
        tracing::info!("proof written to {}", path.display());
    }
    Ok(())
}

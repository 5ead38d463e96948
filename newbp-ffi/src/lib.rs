use std::any::Any;
use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::{c_char, c_int};
use std::panic;
use std::ptr;
use std::slice;

use common::constants::ABI_VERSION;
use common::{ByteBuffer, Bytes32Vec, U64Vec};
use newbp_core::prover::DEFAULT_BIT_SIZE;
use newbp_core::{blinding_from_bytes, ProofBundle, RangeProver};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(err: String) {
    tracing::error!("{err}");
    LAST_ERROR.with(|last| {
        *last.borrow_mut() = Some(CString::new(err).unwrap_or_else(|_| {
            CString::new("Error message contained null byte").unwrap_or_default()
        }));
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|last| {
        *last.borrow_mut() = None;
    });
}

fn panic_message(payload: Box<dyn Any + Send>, function: &str) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        format!("Unknown panic in {function}")
    }
}

fn encode_bundle(bundle: &ProofBundle) -> ByteBuffer {
    match bundle.to_bytes() {
        Ok(bytes) => ByteBuffer::from_vec(bytes),
        Err(e) => {
            set_last_error(format!("Failed to encode proof bundle: {}", e));
            ByteBuffer::null()
        }
    }
}

fn decode_bundle(proof_ptr: *const u8, proof_len: usize, function: &str) -> Option<ProofBundle> {
    if proof_ptr.is_null() {
        set_last_error(format!("Null pointer passed to {function}"));
        return None;
    }
    let bytes = unsafe { slice::from_raw_parts(proof_ptr, proof_len) };
    match ProofBundle::from_bytes(bytes) {
        Ok(bundle) => Some(bundle),
        Err(e) => {
            set_last_error(format!("Failed to decode proof bundle: {}", e));
            None
        }
    }
}

/// Get the last error message. Returns NULL if no error has occurred.
/// The returned string is valid until the next error occurs or the thread exits.
#[no_mangle]
pub extern "C" fn newbp_last_error() -> *const c_char {
    LAST_ERROR.with(|last| match &*last.borrow() {
        Some(err) => err.as_ptr(),
        None => ptr::null(),
    })
}

/// Version of the shared C ABI this library was built against.
#[no_mangle]
pub extern "C" fn newbp_abi_version() -> u32 {
    ABI_VERSION
}

/// Install a stderr log subscriber honouring `RUST_LOG` (default `info`).
/// Does nothing if the host process already installed one.
#[no_mangle]
pub extern "C" fn newbp_logging_init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .try_init();
}

/// Prove that a fixed secret lies in `[0, 2^64)`.
///
/// Returns a buffer holding the encoded proof bundle. On failure the buffer's
/// `ptr` is NULL; call newbp_last_error() to get the error message.
/// The caller must release the buffer with newbp_buffer_free().
#[no_mangle]
pub extern "C" fn naive_prove() -> ByteBuffer {
    clear_last_error();

    let result = panic::catch_unwind(|| match newbp_core::naive_prove(&mut rand::thread_rng()) {
        Ok(bundle) => encode_bundle(&bundle),
        Err(e) => {
            set_last_error(format!("Failed to prove: {}", e));
            ByteBuffer::null()
        }
    });

    result.unwrap_or_else(|e| {
        set_last_error(panic_message(e, "naive_prove"));
        ByteBuffer::null()
    })
}

/// Verify a single-value proof bundle produced by naive_prove().
///
/// # Arguments
/// * `proof_ptr` - Pointer to the encoded proof bundle
/// * `proof_len` - Length of the proof bundle
///
/// Returns 0 if the proof is valid, -1 otherwise.
#[no_mangle]
pub extern "C" fn naive_verify(proof_ptr: *const u8, proof_len: usize) -> c_int {
    clear_last_error();

    let result = panic::catch_unwind(|| {
        let Some(bundle) = decode_bundle(proof_ptr, proof_len, "naive_verify") else {
            return -1;
        };
        if bundle.num_values() != 1 || bundle.bit_size as usize != DEFAULT_BIT_SIZE {
            set_last_error(format!(
                "Expected a single {}-bit proof, got {} values of {} bits",
                DEFAULT_BIT_SIZE,
                bundle.num_values(),
                bundle.bit_size
            ));
            return -1;
        }
        match newbp_core::verify(&bundle) {
            Ok(()) => 0,
            Err(e) => {
                set_last_error(format!("Failed to verify: {}", e));
                -1
            }
        }
    });

    result.unwrap_or_else(|e| {
        set_last_error(panic_message(e, "naive_verify"));
        -1
    })
}

/// Create an aggregated 64-bit range proof over `witness`.
///
/// # Arguments
/// * `witness` - Values to prove in range
/// * `blindings` - One 32-byte little-endian blinding scalar per value
///
/// A witness whose length is not a power of two is padded with zero values;
/// the padding commitments are part of the returned bundle.
///
/// Returns a buffer with a NULL `ptr` on error. Call newbp_last_error() to get
/// the error message. The caller must release the buffer with newbp_buffer_free().
#[no_mangle]
pub extern "C" fn bulletproofs_prove_multiple(
    witness: *const U64Vec,
    blindings: *const Bytes32Vec,
) -> ByteBuffer {
    clear_last_error();

    let result = panic::catch_unwind(|| {
        if witness.is_null() || blindings.is_null() {
            set_last_error("Null pointer passed to bulletproofs_prove_multiple".to_string());
            return ByteBuffer::null();
        }

        let values = unsafe { (*witness).as_slice() };
        let blindings: Vec<_> = unsafe { (*blindings).as_slice() }
            .iter()
            .map(|bytes| blinding_from_bytes(*bytes))
            .collect();

        let bundle = RangeProver::new(DEFAULT_BIT_SIZE).and_then(|prover| {
            prover.prove_multiple(values, &blindings, &mut rand::thread_rng())
        });
        match bundle {
            Ok(bundle) => encode_bundle(&bundle),
            Err(e) => {
                set_last_error(format!("Failed to prove: {}", e));
                ByteBuffer::null()
            }
        }
    });

    result.unwrap_or_else(|e| {
        set_last_error(panic_message(e, "bulletproofs_prove_multiple"));
        ByteBuffer::null()
    })
}

/// Verify any proof bundle produced by this library.
///
/// Returns 0 if the proof is valid, -1 otherwise.
#[no_mangle]
pub extern "C" fn bulletproofs_verify(proof_ptr: *const u8, proof_len: usize) -> c_int {
    clear_last_error();

    let result = panic::catch_unwind(|| {
        let Some(bundle) = decode_bundle(proof_ptr, proof_len, "bulletproofs_verify") else {
            return -1;
        };
        match newbp_core::verify(&bundle) {
            Ok(()) => 0,
            Err(e) => {
                set_last_error(format!("Failed to verify: {}", e));
                -1
            }
        }
    });

    result.unwrap_or_else(|e| {
        set_last_error(panic_message(e, "bulletproofs_verify"));
        -1
    })
}

/// Free a buffer returned by this library. NULL buffers are ignored.
///
/// # Safety
/// The buffer must have been returned by this library, must not have been
/// freed before, and must not be used after this call.
#[no_mangle]
pub unsafe extern "C" fn newbp_buffer_free(buffer: ByteBuffer) {
    if !buffer.is_null() {
        drop(buffer.into_vec());
    }
}

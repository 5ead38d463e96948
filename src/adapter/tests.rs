use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::sync::atomic::{AtomicUsize, Ordering};

use common::constants::{ABI_VERSION, NAIVE_PROVE_SYMBOL, PROVE_MULTIPLE_SYMBOL};
use common::ByteBuffer;
use serial_test::serial;

use super::*;

static PROVE_CALLS: AtomicUsize = AtomicUsize::new(0);
static FREE_CALLS: AtomicUsize = AtomicUsize::new(0);

const FAULT_MESSAGE: &CStr = c"prover exploded";

fn reset_counters() {
    PROVE_CALLS.store(0, Ordering::SeqCst);
    FREE_CALLS.store(0, Ordering::SeqCst);
}

/// `{ptr: "", len: 0, cap: 0}`
extern "C" fn empty_prove() -> ByteBuffer {
    PROVE_CALLS.fetch_add(1, Ordering::SeqCst);
    ByteBuffer {
        ptr: c"".as_ptr() as *mut u8,
        len: 0,
        cap: 0,
    }
}

extern "C" fn vec_prove() -> ByteBuffer {
    PROVE_CALLS.fetch_add(1, Ordering::SeqCst);
    let mut data = Vec::with_capacity(16);
    data.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
    ByteBuffer::from_vec(data)
}

extern "C" fn faulting_prove() -> ByteBuffer {
    PROVE_CALLS.fetch_add(1, Ordering::SeqCst);
    ByteBuffer::null()
}

extern "C" fn malformed_prove() -> ByteBuffer {
    PROVE_CALLS.fetch_add(1, Ordering::SeqCst);
    ByteBuffer {
        ptr: c"abcd".as_ptr() as *mut u8,
        len: 4,
        cap: 2,
    }
}

/// Counts releases; only reclaims buffers built by `vec_prove`.
extern "C" fn counting_free(buffer: ByteBuffer) {
    FREE_CALLS.fetch_add(1, Ordering::SeqCst);
    if buffer.cap > 0 {
        drop(unsafe { buffer.into_vec() });
    }
}

extern "C" fn fault_message() -> *const c_char {
    FAULT_MESSAGE.as_ptr()
}

extern "C" fn wrong_abi_version() -> u32 {
    ABI_VERSION + 1
}

extern "C" fn current_abi_version() -> u32 {
    ABI_VERSION
}

extern "C" fn reject_all(_proof: *const u8, _len: usize) -> c_int {
    -1
}

fn stub_prover(naive_prove: NaiveProveFn) -> NativeProver {
    let mut symbols = ProverSymbols::new(naive_prove);
    symbols.buffer_free = Some(counting_free);
    symbols.last_error = Some(fault_message);
    symbols.abi_version = Some(current_abi_version);
    unsafe { NativeProver::from_symbols("stub", symbols) }.unwrap()
}

#[test]
#[serial]
fn empty_descriptor_is_returned_as_is() {
    reset_counters();
    let prover = stub_prover(empty_prove);
    let proof = prover.invoke_naive_prove().unwrap();

    let raw = proof.descriptor();
    assert!(!raw.is_null());
    assert_eq!((raw.len, raw.cap), (0, 0));
    assert!(proof.is_empty());
    assert_eq!(proof.as_bytes(), &[] as &[u8]);
    assert_eq!(PROVE_CALLS.load(Ordering::SeqCst), 1);
}

#[test]
#[serial]
fn one_invocation_is_one_native_call() {
    reset_counters();
    let prover = stub_prover(vec_prove);

    let proof = prover.invoke_naive_prove().unwrap();
    assert_eq!(PROVE_CALLS.load(Ordering::SeqCst), 1);
    assert_eq!(proof.as_bytes(), &[0xde, 0xad, 0xbe, 0xef]);
    assert!(proof.len() <= proof.capacity());
    assert_eq!(proof.capacity(), 16);
    drop(proof);

    let _second = prover.invoke_naive_prove().unwrap();
    assert_eq!(PROVE_CALLS.load(Ordering::SeqCst), 2);
}

#[test]
#[serial]
fn buffers_are_released_exactly_once() {
    reset_counters();
    let prover = stub_prover(vec_prove);
    {
        let first = prover.invoke_naive_prove().unwrap();
        let second = prover.invoke_naive_prove().unwrap();
        assert_eq!(first.to_vec(), second.to_vec());
        assert_eq!(FREE_CALLS.load(Ordering::SeqCst), 0);
    }
    assert_eq!(FREE_CALLS.load(Ordering::SeqCst), 2);

    // Ownership handed to the caller is not released by the adapter.
    let raw = prover.invoke_naive_prove().unwrap().into_raw();
    assert_eq!(FREE_CALLS.load(Ordering::SeqCst), 2);
    counting_free(raw);
    assert_eq!(FREE_CALLS.load(Ordering::SeqCst), 3);
}

#[test]
#[serial]
fn fault_yields_no_descriptor() {
    reset_counters();
    let prover = stub_prover(faulting_prove);
    let err = prover.invoke_naive_prove().unwrap_err();
    match err {
        AdapterError::NativeCallFault { symbol, message } => {
            assert_eq!(symbol, NAIVE_PROVE_SYMBOL);
            assert_eq!(message, "prover exploded");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(PROVE_CALLS.load(Ordering::SeqCst), 1);
    assert_eq!(FREE_CALLS.load(Ordering::SeqCst), 0);
}

#[test]
#[serial]
fn fault_without_last_error_symbol() {
    let symbols = ProverSymbols::new(faulting_prove);
    let prover = unsafe { NativeProver::from_symbols("bare", symbols) }.unwrap();
    let err = prover.invoke_naive_prove().unwrap_err();
    assert!(err.to_string().contains("returned a null buffer"));
    assert!(prover.last_error().is_none());
}

#[test]
#[serial]
fn malformed_descriptor_is_not_released() {
    reset_counters();
    let prover = stub_prover(malformed_prove);
    let err = prover.invoke_naive_prove().unwrap_err();
    assert!(matches!(
        err,
        AdapterError::MalformedDescriptor { len: 4, cap: 2, .. }
    ));
    assert_eq!(FREE_CALLS.load(Ordering::SeqCst), 0);
}

#[test]
fn abi_mismatch_is_rejected() {
    let mut symbols = ProverSymbols::new(empty_prove);
    symbols.abi_version = Some(wrong_abi_version);
    let err = unsafe { NativeProver::from_symbols("stale", symbols) }
        .err()
        .unwrap();
    assert!(matches!(
        err,
        AdapterError::AbiMismatch { expected, found } if expected == ABI_VERSION && found == ABI_VERSION + 1
    ));
}

#[test]
fn optional_entry_points_must_be_bound() {
    let prover = stub_prover(empty_prove);
    let err = prover.invoke_prove_multiple(&[1], &[[0u8; 32]]).unwrap_err();
    assert!(matches!(
        err,
        AdapterError::UnboundSymbol { symbol, .. } if symbol == PROVE_MULTIPLE_SYMBOL
    ));
    assert!(prover.invoke_verify(&[]).is_err());
}

#[test]
fn rejected_proof_carries_library_message() {
    let mut symbols = ProverSymbols::new(empty_prove);
    symbols.verify = Some(reject_all);
    symbols.last_error = Some(fault_message);
    let prover = unsafe { NativeProver::from_symbols("stub", symbols) }.unwrap();
    let err = prover.invoke_verify(b"not a proof").unwrap_err();
    assert!(matches!(
        err,
        AdapterError::ProofRejected { ref message, .. } if message == "prover exploded"
    ));
}

#[test]
fn missing_artifact_is_a_load_error() {
    let path = std::env::temp_dir()
        .join("newbp-does-not-exist")
        .join(libloading::library_filename("newbp"));
    match NativeProver::load(&path) {
        Err(AdapterError::ArtifactLoad { path: reported, .. }) => assert_eq!(reported, path),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("loaded a nonexistent artifact"),
    }
}

#[cfg(target_os = "linux")]
#[test]
fn library_without_entry_point_fails_resolution() {
    match NativeProver::load("libc.so.6") {
        Err(AdapterError::SymbolResolution { symbol, .. }) => {
            assert_eq!(symbol, NAIVE_PROVE_SYMBOL)
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("libc does not export naive_prove"),
    }
}

#[test]
fn default_path_points_at_release_build() {
    let path = default_library_path();
    assert!(path.starts_with("target/release"));
    let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(file_name.contains("newbp"));
}

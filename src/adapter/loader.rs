use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::path::{Path, PathBuf};

use common::constants::{
    ABI_VERSION, ABI_VERSION_SYMBOL, BUFFER_FREE_SYMBOL, DEFAULT_LIBRARY_DIR, LAST_ERROR_SYMBOL,
    LIBRARY_NAME, LOGGING_INIT_SYMBOL, NAIVE_PROVE_SYMBOL, NAIVE_VERIFY_SYMBOL,
    PROVE_MULTIPLE_SYMBOL, VERIFY_SYMBOL,
};
use common::{ByteBuffer, Bytes32Vec, U64Vec};
use libloading::Library;

use super::{AdapterError, ProofBuffer};

pub type NaiveProveFn = unsafe extern "C" fn() -> ByteBuffer;
pub type ProveMultipleFn = unsafe extern "C" fn(*const U64Vec, *const Bytes32Vec) -> ByteBuffer;
pub type VerifyFn = unsafe extern "C" fn(*const u8, usize) -> c_int;
pub type BufferFreeFn = unsafe extern "C" fn(ByteBuffer);
pub type LastErrorFn = unsafe extern "C" fn() -> *const c_char;
pub type AbiVersionFn = unsafe extern "C" fn() -> u32;
pub type LoggingInitFn = unsafe extern "C" fn();

/// `target/release/libnewbp.so` (or the platform's equivalent file name).
pub fn default_library_path() -> PathBuf {
    Path::new(DEFAULT_LIBRARY_DIR).join(libloading::library_filename(LIBRARY_NAME))
}

/// Entry points of a native prover. Only `naive_prove` is mandatory.
#[derive(Clone, Copy, Debug)]
pub struct ProverSymbols {
    pub naive_prove: NaiveProveFn,
    pub naive_verify: Option<VerifyFn>,
    pub prove_multiple: Option<ProveMultipleFn>,
    pub verify: Option<VerifyFn>,
    pub buffer_free: Option<BufferFreeFn>,
    pub last_error: Option<LastErrorFn>,
    pub abi_version: Option<AbiVersionFn>,
    pub logging_init: Option<LoggingInitFn>,
}

impl ProverSymbols {
    pub fn new(naive_prove: NaiveProveFn) -> Self {
        Self {
            naive_prove,
            naive_verify: None,
            prove_multiple: None,
            verify: None,
            buffer_free: None,
            last_error: None,
            abi_version: None,
            logging_init: None,
        }
    }

    /// # Safety
    /// Each symbol found in `library` must have the signature of the field it
    /// is stored in.
    unsafe fn resolve(library: &Library, path: &Path) -> Result<Self, AdapterError> {
        let naive_prove = required(library, path, NAIVE_PROVE_SYMBOL)?;
        Ok(Self {
            naive_prove,
            naive_verify: optional(library, NAIVE_VERIFY_SYMBOL),
            prove_multiple: optional(library, PROVE_MULTIPLE_SYMBOL),
            verify: optional(library, VERIFY_SYMBOL),
            buffer_free: optional(library, BUFFER_FREE_SYMBOL),
            last_error: optional(library, LAST_ERROR_SYMBOL),
            abi_version: optional(library, ABI_VERSION_SYMBOL),
            logging_init: optional(library, LOGGING_INIT_SYMBOL),
        })
    }
}

unsafe fn required<T: Copy>(
    library: &Library,
    path: &Path,
    name: &'static str,
) -> Result<T, AdapterError> {
    library
        .get::<T>(name.as_bytes())
        .map(|symbol| *symbol)
        .map_err(|source| AdapterError::SymbolResolution {
            symbol: name,
            path: path.to_path_buf(),
            source,
        })
}

unsafe fn optional<T: Copy>(library: &Library, name: &'static str) -> Option<T> {
    match library.get::<T>(name.as_bytes()) {
        Ok(symbol) => Some(*symbol),
        Err(e) => {
            tracing::debug!("optional symbol '{name}' unavailable: {e}");
            None
        }
    }
}

/// A bound native prover: the resolved entry points plus the library that
/// keeps them mapped.
pub struct NativeProver {
    origin: PathBuf,
    symbols: ProverSymbols,
    // Must outlive every call through `symbols`; never unloaded before drop.
    _library: Option<Library>,
}

impl NativeProver {
    /// Load the artifact at `path` and bind its entry points.
    ///
    /// Fails with [`AdapterError::ArtifactLoad`] before any symbol lookup if
    /// the artifact cannot be mapped, and with
    /// [`AdapterError::SymbolResolution`] if it does not export `naive_prove`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AdapterError> {
        let path = path.as_ref().to_path_buf();
        let _span = tracing::info_span!("NativeProver::load", path = %path.display()).entered();

        // SAFETY: loading runs the artifact's initializers; the path is
        // trusted to point at a newbp build.
        let library = unsafe { Library::new(&path) }.map_err(|source| {
            AdapterError::ArtifactLoad {
                path: path.clone(),
                source,
            }
        })?;
        // SAFETY: the signatures come from the shared `common` definitions the
        // artifact is built against; the ABI version handshake in `bind`
        // catches artifacts built from a different revision.
        let symbols = unsafe { ProverSymbols::resolve(&library, &path)? };

        let prover = Self::bind(path, symbols, Some(library))?;
        tracing::info!("native artifact loaded");
        Ok(prover)
    }

    /// Build a prover from entry points that are already in the process, such
    /// as a statically linked library or test stubs.
    ///
    /// # Safety
    /// Every function pointer must honour the signature of its field, and
    /// `buffer_free` must accept every non-null buffer returned by the
    /// proving functions.
    pub unsafe fn from_symbols(
        origin: impl Into<PathBuf>,
        symbols: ProverSymbols,
    ) -> Result<Self, AdapterError> {
        Self::bind(origin.into(), symbols, None)
    }

    fn bind(
        origin: PathBuf,
        symbols: ProverSymbols,
        library: Option<Library>,
    ) -> Result<Self, AdapterError> {
        match symbols.abi_version {
            Some(abi_version) => {
                let found = unsafe { abi_version() };
                if found != ABI_VERSION {
                    return Err(AdapterError::AbiMismatch {
                        expected: ABI_VERSION,
                        found,
                    });
                }
            }
            None => tracing::warn!(
                "'{}' does not export {ABI_VERSION_SYMBOL}, skipping ABI check",
                origin.display()
            ),
        }
        if symbols.buffer_free.is_none() {
            tracing::warn!(
                "'{}' does not export {BUFFER_FREE_SYMBOL}, returned buffers stay owned by the library",
                origin.display()
            );
        }

        Ok(Self {
            origin,
            symbols,
            _library: library,
        })
    }

    pub fn origin(&self) -> &Path {
        &self.origin
    }

    pub fn symbols(&self) -> &ProverSymbols {
        &self.symbols
    }

    /// Route the library's own log output through a subscriber installed on
    /// its side. A no-op for artifacts without logging support.
    pub fn init_native_logging(&self) {
        if let Some(logging_init) = self.symbols.logging_init {
            unsafe { logging_init() };
        }
    }

    /// Call `naive_prove` exactly once.
    #[tracing::instrument(skip_all, name = "NativeProver::invoke_naive_prove")]
    pub fn invoke_naive_prove(&self) -> Result<ProofBuffer<'_>, AdapterError> {
        let raw = unsafe { (self.symbols.naive_prove)() };
        self.accept(NAIVE_PROVE_SYMBOL, raw)
    }

    /// Aggregated range proof over `values`, one 32-byte blinding per value.
    #[tracing::instrument(skip_all, name = "NativeProver::invoke_prove_multiple")]
    pub fn invoke_prove_multiple(
        &self,
        values: &[u64],
        blindings: &[[u8; 32]],
    ) -> Result<ProofBuffer<'_>, AdapterError> {
        let prove_multiple = self.bound(self.symbols.prove_multiple, PROVE_MULTIPLE_SYMBOL)?;
        let witness = U64Vec::from_slice(values);
        let blindings = Bytes32Vec::from_slice(blindings);
        let raw = unsafe { prove_multiple(&witness, &blindings) };
        self.accept(PROVE_MULTIPLE_SYMBOL, raw)
    }

    /// Check a proof produced by `naive_prove`.
    pub fn invoke_naive_verify(&self, proof: &[u8]) -> Result<(), AdapterError> {
        let naive_verify = self.bound(self.symbols.naive_verify, NAIVE_VERIFY_SYMBOL)?;
        self.check(NAIVE_VERIFY_SYMBOL, naive_verify, proof)
    }

    /// Check any proof produced by the library.
    pub fn invoke_verify(&self, proof: &[u8]) -> Result<(), AdapterError> {
        let verify = self.bound(self.symbols.verify, VERIFY_SYMBOL)?;
        self.check(VERIFY_SYMBOL, verify, proof)
    }

    fn bound<T>(&self, symbol: Option<T>, name: &'static str) -> Result<T, AdapterError> {
        symbol.ok_or_else(|| AdapterError::UnboundSymbol {
            symbol: name,
            path: self.origin.clone(),
        })
    }

    fn check(&self, symbol: &'static str, verify: VerifyFn, proof: &[u8]) -> Result<(), AdapterError> {
        let status = unsafe { verify(proof.as_ptr(), proof.len()) };
        if status == 0 {
            return Ok(());
        }
        Err(AdapterError::ProofRejected {
            symbol,
            message: self
                .last_error()
                .unwrap_or_else(|| format!("returned status {status}")),
        })
    }

    fn accept(&self, symbol: &'static str, raw: ByteBuffer) -> Result<ProofBuffer<'_>, AdapterError> {
        if raw.is_null() {
            return Err(AdapterError::NativeCallFault {
                symbol,
                message: self
                    .last_error()
                    .unwrap_or_else(|| "returned a null buffer".to_string()),
            });
        }
        // The allocation cannot be released safely when its capacity is wrong.
        if !raw.is_well_formed() {
            return Err(AdapterError::MalformedDescriptor {
                symbol,
                len: raw.len,
                cap: raw.cap,
            });
        }
        tracing::debug!(len = raw.len, cap = raw.cap, "{symbol} returned");
        Ok(ProofBuffer::new(raw, self.symbols.buffer_free))
    }

    /// The library's message for the last failed call on this thread.
    pub fn last_error(&self) -> Option<String> {
        let last_error = self.symbols.last_error?;
        let message = unsafe { last_error() };
        if message.is_null() {
            return None;
        }
        Some(unsafe { CStr::from_ptr(message) }.to_string_lossy().into_owned())
    }
}

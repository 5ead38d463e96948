use std::fmt;
use std::marker::PhantomData;
use std::mem;

use common::ByteBuffer;

use super::loader::{BufferFreeFn, NativeProver};

/// A buffer returned by the native library, owned by the caller.
///
/// The allocation belongs to the library's allocator, so it is handed back to
/// `newbp_buffer_free` when this value is dropped. The borrow of the
/// [`NativeProver`] keeps the artifact mapped for as long as the buffer lives.
/// Artifacts that export no release function leave the allocation with the
/// library.
pub struct ProofBuffer<'lib> {
    raw: ByteBuffer,
    release: Option<BufferFreeFn>,
    _prover: PhantomData<&'lib NativeProver>,
}

impl<'lib> ProofBuffer<'lib> {
    pub(crate) fn new(raw: ByteBuffer, release: Option<BufferFreeFn>) -> Self {
        Self {
            raw,
            release,
            _prover: PhantomData,
        }
    }

    /// The `(ptr, len, cap)` triple exactly as the native call returned it.
    pub fn descriptor(&self) -> ByteBuffer {
        self.raw
    }

    pub fn len(&self) -> usize {
        self.raw.len
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.raw.cap
    }

    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: the descriptor was checked to be non-null with len <= cap
        // when the buffer was created, and it is not released before drop.
        unsafe { self.raw.as_slice() }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    /// Gives up ownership without releasing the allocation. The caller
    /// becomes responsible for passing the descriptor to `newbp_buffer_free`.
    pub fn into_raw(self) -> ByteBuffer {
        let raw = self.raw;
        mem::forget(self);
        raw
    }
}

impl AsRef<[u8]> for ProofBuffer<'_> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for ProofBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProofBuffer")
            .field("ptr", &self.raw.ptr)
            .field("len", &self.raw.len)
            .field("cap", &self.raw.cap)
            .finish()
    }
}

impl Drop for ProofBuffer<'_> {
    fn drop(&mut self) {
        if let Some(release) = self.release {
            tracing::trace!(len = self.raw.len, cap = self.raw.cap, "releasing native buffer");
            unsafe { release(self.raw) };
        }
    }
}

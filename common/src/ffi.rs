use std::mem::ManuallyDrop;
use std::ptr;
use std::slice;

use crate::constants::SCALAR_BYTES;

/// Growable byte buffer handed across the C ABI as a `(ptr, len, cap)` triple.
///
/// A buffer produced by [`ByteBuffer::from_vec`] owns the allocation of the
/// original `Vec<u8>`; it must be given back to the allocator that produced it
/// (see `newbp_buffer_free`) exactly once. A null `ptr` marks a failed call.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteBuffer {
    pub ptr: *mut u8,
    pub len: usize,
    pub cap: usize,
}

impl ByteBuffer {
    /// The descriptor returned when a native call fails.
    pub const fn null() -> Self {
        Self {
            ptr: ptr::null_mut(),
            len: 0,
            cap: 0,
        }
    }

    /// Releases ownership of `data` into a descriptor.
    pub fn from_vec(data: Vec<u8>) -> Self {
        let mut data = ManuallyDrop::new(data);
        Self {
            ptr: data.as_mut_ptr(),
            len: data.len(),
            cap: data.capacity(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `len <= cap`, the only invariant checkable from the outside.
    pub fn is_well_formed(&self) -> bool {
        self.len <= self.cap
    }

    /// Reclaims the allocation as a `Vec<u8>`. Returns `None` for the null
    /// descriptor.
    ///
    /// # Safety
    /// The descriptor must come from [`ByteBuffer::from_vec`] in the same
    /// allocator and must not have been reclaimed before.
    pub unsafe fn into_vec(self) -> Option<Vec<u8>> {
        if self.is_null() {
            return None;
        }
        Some(Vec::from_raw_parts(self.ptr, self.len, self.cap))
    }

    /// Borrows the initialized bytes.
    ///
    /// # Safety
    /// `ptr` must be valid for reads of `len` bytes for the whole of `'a`.
    pub unsafe fn as_slice<'a>(&self) -> &'a [u8] {
        if self.ptr.is_null() || self.len == 0 {
            &[]
        } else {
            slice::from_raw_parts(self.ptr, self.len)
        }
    }
}

impl Default for ByteBuffer {
    fn default() -> Self {
        Self::null()
    }
}

/// Borrowed `u64` sequence passed into the native library. Never freed by
/// the callee.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct U64Vec {
    pub ptr: *const u64,
    pub len: usize,
    pub cap: usize,
}

impl U64Vec {
    pub fn from_slice(values: &[u64]) -> Self {
        Self {
            ptr: values.as_ptr(),
            len: values.len(),
            cap: values.len(),
        }
    }

    /// # Safety
    /// `ptr` must be valid for reads of `len` elements for the whole of `'a`.
    pub unsafe fn as_slice<'a>(&self) -> &'a [u64] {
        if self.ptr.is_null() || self.len == 0 {
            &[]
        } else {
            slice::from_raw_parts(self.ptr, self.len)
        }
    }
}

/// Borrowed sequence of 32-byte little-endian scalars.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Bytes32Vec {
    pub ptr: *const [u8; SCALAR_BYTES],
    pub len: usize,
    pub cap: usize,
}

impl Bytes32Vec {
    pub fn from_slice(values: &[[u8; SCALAR_BYTES]]) -> Self {
        Self {
            ptr: values.as_ptr(),
            len: values.len(),
            cap: values.len(),
        }
    }

    /// # Safety
    /// `ptr` must be valid for reads of `len` elements for the whole of `'a`.
    pub unsafe fn as_slice<'a>(&self) -> &'a [[u8; SCALAR_BYTES]] {
        if self.ptr.is_null() || self.len == 0 {
            &[]
        } else {
            slice::from_raw_parts(self.ptr, self.len)
        }
    }
}

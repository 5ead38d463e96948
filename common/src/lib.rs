//! Types shared across the newbp C ABI.
//!
//! Both the native library and the loader compile these definitions, so the
//! layout of every value crossing the boundary is checked by the compiler on
//! each side instead of being redeclared by hand at the call site.

pub mod constants;
pub mod ffi;

pub use ffi::{ByteBuffer, Bytes32Vec, U64Vec};

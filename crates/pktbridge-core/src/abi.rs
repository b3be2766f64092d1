//! # Packet Bridge ABI v1.0.0
//!
//! Low-level FFI memory layouts shared by the host and the native packet engine.
//! All structures use `#[repr(C)]` so either side may be compiled separately.

use std::ffi::c_void;
use std::os::raw::c_int;
use std::ptr;

/// FFI-safe byte span
///
/// Non-owning `(pointer, length)` descriptor. Whoever produced the span owns
/// the memory; the descriptor itself never frees anything.
///
/// **Memory Layout (16 bytes on 64-bit)**:
/// - Offset 0: `data` (pointer, 8 bytes)
/// - Offset 8: `len` (usize, 8 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FfiBuffer {
    /// Pointer to the first byte (null for an empty span)
    pub data: *mut u8,
    /// Number of valid bytes
    pub len: usize,
}

impl FfiBuffer {
    /// Create an empty (null, 0) span
    pub const fn empty() -> Self {
        Self {
            data: ptr::null_mut(),
            len: 0,
        }
    }

    /// Describe a borrowed slice
    ///
    /// An empty slice becomes the null descriptor rather than a pointer to
    /// element zero, which does not exist.
    pub fn from_slice(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::empty();
        }
        Self {
            data: bytes.as_ptr() as *mut u8,
            len: bytes.len(),
        }
    }

    /// Describe a mutable slice the engine is allowed to write into
    pub fn from_mut_slice(bytes: &mut [u8]) -> Self {
        if bytes.is_empty() {
            return Self::empty();
        }
        Self {
            data: bytes.as_mut_ptr(),
            len: bytes.len(),
        }
    }

    /// Verify span is well formed for FFI crossing
    pub fn is_valid(&self) -> bool {
        // Null is only allowed for the empty span
        !self.data.is_null() || self.len == 0
    }

    /// Check if span has no bytes
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reinterpret the span as a slice
    ///
    /// # Safety
    /// * `data` must be valid for reads of `len` bytes for all of `'a`
    /// * The memory must not be mutated while the slice is alive
    pub unsafe fn as_slice<'a>(&self) -> &'a [u8] {
        if self.data.is_null() || self.len == 0 {
            return &[];
        }
        std::slice::from_raw_parts(self.data, self.len)
    }

    /// Check whether this span lies entirely inside `outer`
    pub fn is_within(&self, outer: &[u8]) -> bool {
        if self.len == 0 {
            return true;
        }
        let start = outer.as_ptr() as usize;
        let end = start + outer.len();
        let data = self.data as usize;
        match data.checked_add(self.len) {
            Some(data_end) => data >= start && data_end <= end,
            None => false,
        }
    }
}

impl Default for FfiBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

/// FFI-safe packet header: a key span and a value span
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FfiHeader {
    pub key: FfiBuffer,
    pub val: FfiBuffer,
}

impl FfiHeader {
    /// Describe a borrowed key/value pair
    pub fn from_slices(key: &[u8], val: &[u8]) -> Self {
        Self {
            key: FfiBuffer::from_slice(key),
            val: FfiBuffer::from_slice(val),
        }
    }
}

/// Allocation entry point the engine calls back into
///
/// Returns 0 and fills `out` on success, or a nonzero status on failure.
pub type AllocFn = unsafe extern "C" fn(user_data: *mut c_void, size: usize, out: *mut FfiBuffer) -> c_int;

/// Host allocation strategy handed to the engine for one build call
///
/// **Memory Layout (16 bytes on 64-bit)**:
/// - Offset 0: `user_data` (pointer, 8 bytes)
/// - Offset 8: `alloc` (nullable fn pointer, 8 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FfiAlloc {
    /// Opaque context passed back to `alloc`
    pub user_data: *mut c_void,
    /// Allocation callback (None is rejected by the engine)
    pub alloc: Option<AllocFn>,
}

impl FfiAlloc {
    /// Create an allocator descriptor with no callback
    pub const fn none() -> Self {
        Self {
            user_data: ptr::null_mut(),
            alloc: None,
        }
    }
}

impl Default for FfiAlloc {
    fn default() -> Self {
        Self::none()
    }
}

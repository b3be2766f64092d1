//! # FFI Entry Points
//!
//! C ABI surface of the packet engine. All functions return an errno-style
//! status and write results through out-pointers. Panics never cross the
//! boundary; they are caught and reported as `EIO`.

use std::os::raw::c_int;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::slice;

use pktbridge_core::{FfiAlloc, FfiBuffer, FfiHeader, NativeStatus, STATUS_OK};

use crate::layout::{self, FlatPacket};

/// Run an entry point body, converting panics into `EIO`
fn guarded<F>(op: &'static str, body: F) -> c_int
where
    F: FnOnce() -> Result<(), c_int>,
{
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(())) => STATUS_OK,
        Ok(Err(status)) => status,
        Err(_) => {
            tracing::error!(op, "panic caught at engine boundary");
            NativeStatus::Internal.code()
        }
    }
}

/// Borrow an input span, rejecting null-with-length descriptors
///
/// # Safety
/// A non-null `buf.data` must be readable for `buf.len` bytes for `'a`.
unsafe fn input<'a>(buf: &FfiBuffer) -> Result<&'a [u8], NativeStatus> {
    if !buf.is_valid() {
        return Err(NativeStatus::InvalidArgument);
    }
    Ok(buf.as_slice())
}

/// Borrow a packed view for reading
///
/// # Safety
/// `pkt` must reference a live buffer produced by `pkt_build`.
unsafe fn packet<'a>(pkt: &FfiBuffer) -> Result<FlatPacket<'a>, NativeStatus> {
    if pkt.data.is_null() {
        return Err(NativeStatus::InvalidArgument);
    }
    FlatPacket::parse(pkt.as_slice())
}

// ============================================================================
// VERSION
// ============================================================================

/// ABI version this engine was compiled against
#[no_mangle]
pub extern "C" fn pkt_abi_version() -> u32 {
    crate::FFI_ABI_VERSION
}

// ============================================================================
// BUILD
// ============================================================================

/// Pack headers and payload into a buffer obtained from `alloc`
///
/// Computes the packed size, calls `alloc.alloc` exactly once with it, writes
/// the flat layout into the returned buffer, and sets `*out` to the packed
/// span. The engine does not retain the buffer.
///
/// # Arguments
/// * `num_headers` - Number of entries in `headers`
/// * `headers` - Header array (may be null when `num_headers` is 0)
/// * `payload` - Payload span (null descriptor for an empty payload)
/// * `alloc` - Host allocator, invoked synchronously before returning
/// * `out` - Receives the packed view
///
/// # Returns
/// - 0 on success
/// - EFAULT: `out` is null
/// - EINVAL: malformed span, missing alloc fn, or null header array
/// - E2BIG: packed size overflows
/// - ENOMEM: allocator returned a buffer smaller than requested
/// - any nonzero status returned by the allocator, unchanged
///
/// # Safety
/// * `headers` must point to `num_headers` readable `FfiHeader`s
/// * Every span must be readable for its length
/// * `alloc.user_data` must be valid for `alloc.alloc`
#[no_mangle]
pub unsafe extern "C" fn pkt_build(
    num_headers: usize,
    headers: *const FfiHeader,
    payload: FfiBuffer,
    alloc: FfiAlloc,
    out: *mut FfiBuffer,
) -> c_int {
    guarded("pkt_build", || {
        if out.is_null() {
            return Err(NativeStatus::BadAddress.into());
        }

        let raw_headers: &[FfiHeader] = if num_headers == 0 {
            &[]
        } else if headers.is_null() {
            return Err(NativeStatus::InvalidArgument.into());
        } else {
            slice::from_raw_parts(headers, num_headers)
        };

        let mut pairs = Vec::with_capacity(raw_headers.len());
        for hdr in raw_headers {
            pairs.push((input(&hdr.key)?, input(&hdr.val)?));
        }
        let payload = input(&payload)?;

        let alloc_fn = alloc.alloc.ok_or(NativeStatus::InvalidArgument)?;
        let size = layout::packed_size(pairs.iter().copied(), payload.len())?;

        let mut buf = FfiBuffer::empty();
        let status = alloc_fn(alloc.user_data, size, &mut buf);
        if status != STATUS_OK {
            return Err(status);
        }
        if buf.data.is_null() || buf.len < size {
            return Err(NativeStatus::OutOfMemory.into());
        }

        let dest = slice::from_raw_parts_mut(buf.data, size);
        layout::write_packet(dest, pairs.iter().copied(), payload);

        *out = FfiBuffer {
            data: buf.data,
            len: size,
        };
        Ok(())
    })
}

// ============================================================================
// ACCESSORS
// ============================================================================

/// Get the number of headers in a packed view
///
/// # Returns
/// - 0 on success, EFAULT if `out` is null, EINVAL on a malformed layout
///
/// # Safety
/// `pkt` must reference a live buffer produced by `pkt_build`.
#[no_mangle]
pub unsafe extern "C" fn pkt_num_headers(pkt: FfiBuffer, out: *mut usize) -> c_int {
    guarded("pkt_num_headers", || {
        if out.is_null() {
            return Err(NativeStatus::BadAddress.into());
        }
        *out = packet(&pkt)?.header_count();
        Ok(())
    })
}

/// Get the header at `idx`
///
/// Note: the returned spans point into the packet buffer. O(1).
///
/// # Returns
/// - 0 on success, ERANGE if `idx >= num_headers`, EFAULT if `out` is null
///
/// # Safety
/// `pkt` must reference a live buffer produced by `pkt_build`.
#[no_mangle]
pub unsafe extern "C" fn pkt_header(pkt: FfiBuffer, idx: usize, out: *mut FfiHeader) -> c_int {
    guarded("pkt_header", || {
        if out.is_null() {
            return Err(NativeStatus::BadAddress.into());
        }
        let (key, val) = packet(&pkt)?.header(idx)?;
        *out = FfiHeader::from_slices(key, val);
        Ok(())
    })
}

/// Get the packet payload
///
/// Note: the returned span points into the packet buffer. An empty payload
/// is reported as the null descriptor.
///
/// # Safety
/// `pkt` must reference a live buffer produced by `pkt_build`.
#[no_mangle]
pub unsafe extern "C" fn pkt_payload(pkt: FfiBuffer, out: *mut FfiBuffer) -> c_int {
    guarded("pkt_payload", || {
        if out.is_null() {
            return Err(NativeStatus::BadAddress.into());
        }
        *out = FfiBuffer::from_slice(packet(&pkt)?.payload());
        Ok(())
    })
}

/// Get the value of the first header whose key matches `key`
///
/// # Returns
/// - 0 on success, ENOENT if no header matches
///
/// # Safety
/// `pkt` must reference a live buffer produced by `pkt_build`, and `key`
/// must be readable for its length.
#[no_mangle]
pub unsafe extern "C" fn pkt_find_header(pkt: FfiBuffer, key: FfiBuffer, out: *mut FfiBuffer) -> c_int {
    guarded("pkt_find_header", || {
        if out.is_null() {
            return Err(NativeStatus::BadAddress.into());
        }
        let key = input(&key)?;
        *out = FfiBuffer::from_slice(packet(&pkt)?.find(key)?);
        Ok(())
    })
}

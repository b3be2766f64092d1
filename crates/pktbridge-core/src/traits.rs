//! # Behavior Contracts
//!
//! The operations a native packet engine must expose to the host. The host
//! never interprets the packed layout itself; it only calls these.

use std::os::raw::c_int;

use crate::abi::{FfiAlloc, FfiBuffer, FfiHeader};
use crate::error::{NativeStatus, STATUS_OK};

/// Native packet engine contract
///
/// Each operation returns a raw status (`0` on success, an errno-style code
/// otherwise) and writes its result through `out`. The packet argument of the
/// read accessors is the opaque view returned by a successful `build`.
pub trait PacketEngine: Send + Sync {
    /// Pack `headers` and `payload` into a buffer obtained from `alloc`
    ///
    /// Must call `alloc` at most once, with the exact packed size, and must
    /// not retain the buffer after returning.
    ///
    /// # Safety
    /// * Every span in `headers` and `payload` must be readable for its length
    /// * `alloc.user_data` must be whatever `alloc.alloc` expects
    unsafe fn build(
        &self,
        headers: &[FfiHeader],
        payload: FfiBuffer,
        alloc: FfiAlloc,
        out: &mut FfiBuffer,
    ) -> c_int;

    /// Number of headers in a packed view
    ///
    /// # Safety
    /// `pkt` must reference a live buffer produced by `build`.
    unsafe fn header_count(&self, pkt: FfiBuffer, out: &mut usize) -> c_int;

    /// Header at `index`; spans point into the packed buffer
    ///
    /// # Safety
    /// `pkt` must reference a live buffer produced by `build`.
    unsafe fn header_at(&self, pkt: FfiBuffer, index: usize, out: &mut FfiHeader) -> c_int;

    /// Payload span inside the packed buffer
    ///
    /// # Safety
    /// `pkt` must reference a live buffer produced by `build`.
    unsafe fn payload(&self, pkt: FfiBuffer, out: &mut FfiBuffer) -> c_int;

    /// Value of the first header whose key equals `key`
    ///
    /// Engines without a native lookup may rely on this default, which scans
    /// with `header_count` and `header_at`. Returns `ENOENT` when absent.
    ///
    /// # Safety
    /// `pkt` must reference a live buffer produced by `build`, and `key` must
    /// be readable for its length.
    unsafe fn find_header(&self, pkt: FfiBuffer, key: FfiBuffer, out: &mut FfiBuffer) -> c_int {
        let mut count = 0usize;
        let status = self.header_count(pkt, &mut count);
        if status != STATUS_OK {
            return status;
        }

        let wanted = key.as_slice();
        for index in 0..count {
            let mut hdr = FfiHeader::default();
            let status = self.header_at(pkt, index, &mut hdr);
            if status != STATUS_OK {
                return status;
            }
            if hdr.key.as_slice() == wanted {
                *out = hdr.val;
                return STATUS_OK;
            }
        }
        NativeStatus::NotFound.code()
    }

    /// ABI version the engine was built against (`major << 16 | minor << 8 | patch`)
    fn abi_version(&self) -> u32;

    /// Short engine name for logging
    fn name(&self) -> &'static str {
        "unnamed"
    }
}

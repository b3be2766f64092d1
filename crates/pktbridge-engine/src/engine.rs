//! `PacketEngine` adapter over the C entry points.

use std::os::raw::c_int;
use std::ptr;

use pktbridge_core::{FfiAlloc, FfiBuffer, FfiHeader, PacketEngine};

use crate::ffi;

/// The flat-layout engine, driven through its C ABI
///
/// Stateless; every call goes straight to the `pkt_*` functions, exactly as a
/// host linked against the engine library would call them.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatEngine;

impl FlatEngine {
    pub const fn new() -> Self {
        Self
    }
}

impl PacketEngine for FlatEngine {
    unsafe fn build(
        &self,
        headers: &[FfiHeader],
        payload: FfiBuffer,
        alloc: FfiAlloc,
        out: &mut FfiBuffer,
    ) -> c_int {
        // No headers: hand over a null array instead of a dangling pointer
        let hdrs = if headers.is_empty() {
            ptr::null()
        } else {
            headers.as_ptr()
        };
        ffi::pkt_build(headers.len(), hdrs, payload, alloc, out)
    }

    unsafe fn header_count(&self, pkt: FfiBuffer, out: &mut usize) -> c_int {
        ffi::pkt_num_headers(pkt, out)
    }

    unsafe fn header_at(&self, pkt: FfiBuffer, index: usize, out: &mut FfiHeader) -> c_int {
        ffi::pkt_header(pkt, index, out)
    }

    unsafe fn payload(&self, pkt: FfiBuffer, out: &mut FfiBuffer) -> c_int {
        ffi::pkt_payload(pkt, out)
    }

    unsafe fn find_header(&self, pkt: FfiBuffer, key: FfiBuffer, out: &mut FfiBuffer) -> c_int {
        ffi::pkt_find_header(pkt, key, out)
    }

    fn abi_version(&self) -> u32 {
        ffi::pkt_abi_version()
    }

    fn name(&self) -> &'static str {
        "flat"
    }
}

//! # Allocation Trampoline
//!
//! The `extern "C"` function handed to the engine as its allocator, plus the
//! per-call context its `user_data` points at.

use std::ffi::c_void;
use std::os::raw::c_int;
use std::panic::{catch_unwind, AssertUnwindSafe};

use pktbridge_core::{FfiAlloc, FfiBuffer, NativeStatus, STATUS_OK};

use super::registry::{AllocationBridge, CallToken};
use crate::error::PacketError;

/// Per-call context passed through the engine as `user_data`
///
/// Lives on the builder's stack for exactly one native build call.
#[derive(Debug)]
pub struct CallContext<'a> {
    bridge: &'a AllocationBridge,
    token: CallToken,
}

impl<'a> CallContext<'a> {
    pub fn new(bridge: &'a AllocationBridge, token: CallToken) -> Self {
        Self { bridge, token }
    }

    /// Allocator descriptor whose `user_data` borrows this context
    ///
    /// The descriptor is only valid while `self` is alive and not moved.
    pub fn as_alloc(&self) -> FfiAlloc {
        FfiAlloc {
            user_data: self as *const Self as *mut c_void,
            alloc: Some(bridge_alloc),
        }
    }
}

/// Allocation callback the engine invokes mid-build
///
/// Looks up the callback registered for the context's token and runs it.
///
/// # Returns
/// - 0 with `*out` filled on success
/// - EFAULT if `user_data` or `out` is null
/// - ENOMEM if the host could not allocate
/// - EINVAL for any other callback failure
///
/// A panic here (unknown token, double invocation) cannot unwind into the
/// engine, so it is logged and the process aborts.
///
/// # Safety
/// `user_data` must point to a live `CallContext`.
pub unsafe extern "C" fn bridge_alloc(user_data: *mut c_void, size: usize, out: *mut FfiBuffer) -> c_int {
    if user_data.is_null() || out.is_null() {
        return NativeStatus::BadAddress.code();
    }
    let ctx = &*(user_data as *const CallContext<'_>);

    let result = catch_unwind(AssertUnwindSafe(|| ctx.bridge.invoke(ctx.token, size)));
    match result {
        Ok(Ok(buf)) => {
            *out = buf;
            STATUS_OK
        }
        Ok(Err(PacketError::AllocationFailure { requested })) => {
            tracing::warn!(token = %ctx.token, requested, "host allocation failed");
            NativeStatus::OutOfMemory.code()
        }
        Ok(Err(err)) => {
            tracing::warn!(token = %ctx.token, error = %err, "allocation callback failed");
            NativeStatus::InvalidArgument.code()
        }
        Err(_) => {
            tracing::error!(token = %ctx.token, size, "fatal: allocation bridge misuse");
            std::process::abort();
        }
    }
}

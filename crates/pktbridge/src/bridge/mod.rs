//! Allocation bridge - lets the native engine request host memory mid-call.
//!
//! A build registers a one-shot callback and receives a [`Registration`]
//! guard. The guard's token travels through the engine inside a
//! [`CallContext`]; the engine calls [`bridge_alloc`], which routes back to
//! that exact callback. Dropping the guard unregisters the token.

mod registry;
mod trampoline;

use std::sync::{Arc, LazyLock};

pub use registry::{AllocCallback, AllocationBridge, CallToken, Registration};
pub use trampoline::{bridge_alloc, CallContext};

/// Global allocation registry (thread-safe)
/// Shared by every builder that does not bring its own
static GLOBAL_BRIDGE: LazyLock<Arc<AllocationBridge>> = LazyLock::new(|| Arc::new(AllocationBridge::new()));

/// Get a handle to the global allocation registry
pub fn global() -> Arc<AllocationBridge> {
    Arc::clone(&GLOBAL_BRIDGE)
}

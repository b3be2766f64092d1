//! # pktbridge Core
//!
//! Shared contract between the host-side packet builder and the native
//! packet engine. Defines FFI memory layouts, status codes, and the engine
//! operations the host is allowed to call.
//!
//! ## Module Organization
//!
//! - `abi`: FFI-safe buffer, header, and allocator layouts
//! - `error`: Native status codes (errno-style) and their meaning
//! - `traits`: The `PacketEngine` contract (build + three read accessors)

pub mod abi;
pub mod error;
pub mod traits;

// Re-export commonly used types
pub use abi::{AllocFn, FfiAlloc, FfiBuffer, FfiHeader};
pub use error::{NativeStatus, STATUS_OK};
pub use traits::PacketEngine;

/// ABI version for compatibility checking
pub const FFI_ABI_VERSION: u32 = 1u32 << 16; // 1.0.0

/// Major component of a packed ABI version
pub const fn abi_major(version: u32) -> u32 {
    version >> 16
}

//! # pktbridge Engine
//!
//! Reference implementation of the native packet engine. The host treats it
//! as a foreign library: it only ever reaches it through the C entry points
//! in [`ffi`], either directly or via the [`FlatEngine`] adapter.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────┐
//! │   Host (pktbridge)       │
//! │   - AllocationBridge     │
//! │   - PacketBuilder        │
//! └────────────┬─────────────┘
//!              │ FFI Boundary (pkt_build, pkt_header, ...)
//!              ▼              ▲ alloc callback
//! ┌──────────────────────────┐
//! │   Engine (this crate)    │
//! │   - size computation     │
//! │   - flat layout writer   │
//! │   - O(1) accessors       │
//! └──────────────────────────┘
//! ```
//!
//! The engine never allocates packet memory itself. It asks the host for a
//! buffer of the exact packed size and writes into it.

pub mod engine;
pub mod ffi;
pub mod layout;

pub use engine::FlatEngine;
pub use pktbridge_core::{FfiAlloc, FfiBuffer, FfiHeader, NativeStatus, PacketEngine};

/// Library version
pub const PKTBRIDGE_ENGINE_VERSION: &str = "0.1.0";

/// FFI ABI version (must match pktbridge-core)
pub const FFI_ABI_VERSION: u32 = pktbridge_core::FFI_ABI_VERSION;

//! # pktbridge
//!
//! Host side of the packet bridge. Builds packets through a foreign packet
//! engine while keeping every byte of packet memory host-owned, then reads
//! headers and payload back without copying.
//!
//! ## Modules
//!
//! - [`bridge`]: token registry that answers the engine's mid-call
//!   allocation requests
//! - [`packet`]: builder, owning handle and zero-copy reader
//! - [`error`]: native status mapping and the host error type
//! - [`config`]: builder limits
//!
//! ## Example
//!
//! ```no_run
//! use pktbridge::{Header, PacketBuilder};
//!
//! let builder = PacketBuilder::new();
//! let handle = builder.build(&[Header::new("a0_id", "1")], b"hello")?;
//!
//! let reader = handle.reader();
//! assert_eq!(reader.header_count()?, 1);
//! assert_eq!(&*reader.payload()?, b"hello");
//! # Ok::<(), pktbridge::PacketError>(())
//! ```

pub mod bridge;
pub mod config;
pub mod error;
pub mod packet;

pub use bridge::{AllocationBridge, CallToken};
pub use config::BuilderConfig;
pub use error::{check_status, PacketError, PacketResult};
pub use packet::{
    Header, HeaderView, PacketBuilder, PacketHandle, PacketReader, PayloadView, PACKET_DEP_KEY,
    PACKET_ID_KEY,
};
pub use pktbridge_core::{NativeStatus, PacketEngine};

/// Library version
pub const PKTBRIDGE_VERSION: &str = "0.1.0";

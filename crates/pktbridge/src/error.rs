//! Error types for the host side of the packet bridge.

use std::os::raw::c_int;

use pktbridge_core::{NativeStatus, STATUS_OK};
use thiserror::Error;

/// Main error type for all packet operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    /// Header or payload input rejected before any native call.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Host allocator could not provide a buffer of the requested size.
    #[error("Allocation failure: could not allocate {requested} bytes")]
    AllocationFailure { requested: usize },

    /// Native operation returned a mapped nonzero status.
    #[error("Native status {code}: {}", .kind.message())]
    NativeStatus { code: c_int, kind: NativeStatus },

    /// Read accessor given an out-of-bounds header index.
    #[error("Header index {index} out of range (count {count})")]
    IndexOutOfRange { index: usize, count: usize },

    /// Read attempted after the handle released its buffer.
    #[error("Packet handle used after release")]
    UseAfterRelease,

    /// Native operation returned a code outside the known set.
    #[error("Unknown native status: {0}")]
    UnknownNativeStatus(c_int),

    /// Engine broke the boundary contract (e.g. a span outside the buffer).
    #[error("Engine contract violation: {0}")]
    EngineContract(String),

    /// Builder configuration rejected.
    #[error("Config error: {0}")]
    Config(String),
}

impl PacketError {
    /// Native status kind, if this error came from the engine
    pub fn native_kind(&self) -> Option<NativeStatus> {
        match self {
            Self::NativeStatus { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<NativeStatus> for PacketError {
    fn from(kind: NativeStatus) -> Self {
        Self::NativeStatus {
            code: kind.code(),
            kind,
        }
    }
}

/// Result type alias using PacketError.
pub type PacketResult<T> = std::result::Result<T, PacketError>;

/// Translate a raw native status into a result
///
/// Pure and total: 0 is success, every mapped code becomes `NativeStatus`,
/// anything else is `UnknownNativeStatus`.
pub fn check_status(code: c_int) -> PacketResult<()> {
    if code == STATUS_OK {
        return Ok(());
    }
    match NativeStatus::from_code(code) {
        Some(kind) => Err(PacketError::NativeStatus { code, kind }),
        None => Err(PacketError::UnknownNativeStatus(code)),
    }
}

//! # Packet Handle
//!
//! Sole owner of a built packet's backing buffer plus the engine's parsed
//! view into it.
//!
//! ## Lifecycle
//!
//! - `Valid`: buffer and view alive, every read permitted
//! - `Released`: buffer freed; every read fails with `UseAfterRelease`
//!
//! The only transition is `Valid -> Released`, via [`PacketHandle::release`]
//! or drop. Views borrow the handle and `release` takes `&mut self`, so no
//! view can survive a release.

use std::fmt;
use std::sync::Arc;

use pktbridge_core::{FfiBuffer, PacketEngine};

use super::reader::PacketReader;
use crate::error::{PacketError, PacketResult};

enum HandleState {
    Valid { buffer: Vec<u8>, view: FfiBuffer },
    Released,
}

/// Owning handle to a built packet
pub struct PacketHandle {
    state: HandleState,
    engine: Arc<dyn PacketEngine>,
}

// The view only points into `buffer`, which this handle owns exclusively
// and never mutates after the build returns.
unsafe impl Send for PacketHandle {}
unsafe impl Sync for PacketHandle {}

impl PacketHandle {
    /// Take ownership of a freshly packed buffer
    ///
    /// `view` must lie inside `buffer`; the builder checks this.
    pub(crate) fn new(engine: Arc<dyn PacketEngine>, buffer: Vec<u8>, view: FfiBuffer) -> Self {
        Self {
            state: HandleState::Valid { buffer, view },
            engine,
        }
    }

    /// Free the backing buffer; later reads fail with `UseAfterRelease`
    pub fn release(&mut self) {
        if let HandleState::Valid { buffer, .. } = &self.state {
            tracing::trace!(bytes = buffer.len(), "packet released");
        }
        self.state = HandleState::Released;
    }

    /// Check if the handle has been released
    pub fn is_released(&self) -> bool {
        matches!(self.state, HandleState::Released)
    }

    /// Packed buffer bytes
    pub fn as_bytes(&self) -> PacketResult<&[u8]> {
        self.live().map(|(buffer, _)| buffer)
    }

    /// Packed size in bytes
    pub fn packed_len(&self) -> PacketResult<usize> {
        self.as_bytes().map(<[u8]>::len)
    }

    /// Zero-copy read accessors borrowing this handle
    pub fn reader(&self) -> PacketReader<'_> {
        PacketReader::new(self)
    }

    /// Buffer and engine view, or `UseAfterRelease`
    pub(crate) fn live(&self) -> PacketResult<(&[u8], FfiBuffer)> {
        match &self.state {
            HandleState::Valid { buffer, view } => Ok((buffer.as_slice(), *view)),
            HandleState::Released => Err(PacketError::UseAfterRelease),
        }
    }

    pub(crate) fn engine(&self) -> &dyn PacketEngine {
        self.engine.as_ref()
    }
}

impl Drop for PacketHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for PacketHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("PacketHandle");
        dbg.field("engine", &self.engine.name());
        match &self.state {
            HandleState::Valid { buffer, .. } => dbg.field("packed_len", &buffer.len()),
            HandleState::Released => dbg.field("released", &true),
        };
        dbg.finish()
    }
}

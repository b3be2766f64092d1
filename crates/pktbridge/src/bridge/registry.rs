//! # Allocation Registry
//!
//! Thread-safe table mapping short-lived call tokens to one-shot host
//! allocation callbacks. A native build call carries its token across the
//! boundary and asks back through it for a buffer sized at call time.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use pktbridge_core::FfiBuffer;

use crate::error::PacketResult;

/// One-shot allocation callback: requested size in, buffer descriptor out
pub type AllocCallback = Box<dyn FnOnce(usize) -> PacketResult<FfiBuffer> + Send + Sync>;

/// Identifier correlating one in-flight build call with its callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallToken(u64);

impl CallToken {
    /// Raw token value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CallToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "call#{}", self.0)
    }
}

// ============================================================================
// TOKEN ALLOCATION
// ============================================================================

/// Token allocator for generating unique call identifiers
struct TokenAllocator {
    /// Next token to allocate
    next_token: AtomicU64,
}

impl TokenAllocator {
    /// Create new allocator starting at token 1
    fn new() -> Self {
        Self {
            next_token: AtomicU64::new(1),
        }
    }

    /// Allocate next unique token
    fn allocate(&self) -> CallToken {
        CallToken(self.next_token.fetch_add(1, Ordering::Relaxed))
    }
}

// ============================================================================
// ALLOCATION BRIDGE
// ============================================================================

/// Registry of outstanding allocation callbacks
///
/// Each slot holds `Some(callback)` until the native side invokes it, and
/// `None` afterwards until the owning build unregisters the token. Safe for
/// concurrent builds from multiple threads.
pub struct AllocationBridge {
    /// Map of token -> pending callback
    slots: DashMap<CallToken, Option<AllocCallback>>,

    /// Token allocator
    allocator: TokenAllocator,

    /// Callbacks actually run, across all tokens
    invocations: AtomicU64,
}

impl AllocationBridge {
    /// Create new empty registry
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            allocator: TokenAllocator::new(),
            invocations: AtomicU64::new(0),
        }
    }

    /// Register a callback and get a scoped registration
    ///
    /// The token is never shared with another outstanding registration.
    /// Dropping the returned guard unregisters it, on every exit path.
    pub fn register(&self, callback: AllocCallback) -> Registration<'_> {
        let token = self.allocator.allocate();
        self.slots.insert(token, Some(callback));
        tracing::trace!(%token, "allocation callback registered");
        Registration {
            bridge: self,
            token,
        }
    }

    /// Invoke the callback registered for `token`
    ///
    /// # Panics
    /// If `token` is unknown or its callback has already run. The native
    /// engine only ever calls back with the token it was just given, so
    /// either case is a programmer error.
    pub fn invoke(&self, token: CallToken, size: usize) -> PacketResult<FfiBuffer> {
        let callback = match self.slots.get_mut(&token) {
            Some(mut slot) => slot.take(),
            None => panic!("allocation requested for unregistered token {token}"),
        };
        // Slot lock is released before the host allocation runs
        match callback {
            Some(callback) => {
                self.invocations.fetch_add(1, Ordering::Relaxed);
                callback(size)
            }
            None => panic!("allocation callback for {token} invoked twice"),
        }
    }

    /// Remove the entry for `token`
    ///
    /// # Returns
    /// true if the token was registered
    pub fn unregister(&self, token: CallToken) -> bool {
        let removed = self.slots.remove(&token).is_some();
        if removed {
            tracing::trace!(%token, "allocation callback unregistered");
        }
        removed
    }

    /// Check whether `token` is currently registered
    pub fn contains(&self, token: CallToken) -> bool {
        self.slots.contains_key(&token)
    }

    /// Number of outstanding registrations
    pub fn outstanding(&self) -> usize {
        self.slots.len()
    }

    /// Total callbacks invoked since creation
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }
}

impl Default for AllocationBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AllocationBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllocationBridge")
            .field("outstanding", &self.outstanding())
            .field("invocations", &self.invocations())
            .finish()
    }
}

/// Scoped registry slot; unregisters its token when dropped
#[must_use = "dropping the registration unregisters the callback immediately"]
pub struct Registration<'a> {
    bridge: &'a AllocationBridge,
    token: CallToken,
}

impl Registration<'_> {
    /// Token to hand across the boundary
    pub fn token(&self) -> CallToken {
        self.token
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.bridge.unregister(self.token);
    }
}

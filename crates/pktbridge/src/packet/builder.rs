//! # Packet Builder
//!
//! Runs one native build per call. The host owns every byte of the result:
//! the engine asks for memory through the allocation bridge and the builder
//! answers from a fresh `Vec<u8>`, which then moves into the returned
//! [`PacketHandle`].
//!
//! ## Flow
//!
//! 1. Validate inputs against [`BuilderConfig`] (no allocation on failure)
//! 2. Register a one-shot allocation callback and get a token
//! 3. Call the engine with a [`CallContext`] carrying that token
//! 4. Drop the registration, then collect whatever the callback allocated
//! 5. Map the status; on success wrap buffer and view in a handle

use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;
use pktbridge_core::{abi_major, FfiBuffer, FfiHeader, PacketEngine, FFI_ABI_VERSION};
use pktbridge_engine::FlatEngine;

use super::handle::PacketHandle;
use super::header::Header;
use crate::bridge::{self, AllocCallback, AllocationBridge, CallContext};
use crate::config::BuilderConfig;
use crate::error::{check_status, PacketError, PacketResult};

/// What the allocation callback left behind for the builder
#[derive(Default)]
enum Pending {
    #[default]
    Empty,
    Allocated(Vec<u8>),
    Failed {
        requested: usize,
    },
}

/// Builds packets through a native engine
pub struct PacketBuilder {
    engine: Arc<dyn PacketEngine>,
    bridge: Arc<AllocationBridge>,
    config: BuilderConfig,
}

impl PacketBuilder {
    /// Builder over the flat engine and the global bridge
    pub fn new() -> Self {
        Self {
            engine: Arc::new(FlatEngine::new()),
            bridge: bridge::global(),
            config: BuilderConfig::default(),
        }
    }

    /// Builder with default engine and bridge, custom limits
    pub fn with_config(config: BuilderConfig) -> PacketResult<Self> {
        Self::with_engine(Arc::new(FlatEngine::new()), bridge::global(), config)
    }

    /// Fully custom builder
    ///
    /// # Arguments
    /// * `engine` - Native engine performing the build and reads
    /// * `bridge` - Registry routing the engine's allocation requests
    /// * `config` - Limits checked before and during the build
    ///
    /// Fails with `EngineContract` if the engine's ABI major version differs
    /// from the host's.
    pub fn with_engine(
        engine: Arc<dyn PacketEngine>,
        bridge: Arc<AllocationBridge>,
        config: BuilderConfig,
    ) -> PacketResult<Self> {
        config.validate()?;
        let version = engine.abi_version();
        if abi_major(version) != abi_major(FFI_ABI_VERSION) {
            return Err(PacketError::EngineContract(format!(
                "engine '{}' speaks ABI {:#x}, host expects {:#x}",
                engine.name(),
                version,
                FFI_ABI_VERSION
            )));
        }
        Ok(Self {
            engine,
            bridge,
            config,
        })
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn bridge(&self) -> &Arc<AllocationBridge> {
        &self.bridge
    }

    /// Pack `headers` and `payload` into a new packet
    ///
    /// Inputs are only read during the call; nothing is retained.
    ///
    /// # Returns
    /// A handle owning the packed buffer, or:
    /// - `InvalidArgument` if the inputs break the configured limits
    /// - `AllocationFailure` if the host could not provide the buffer
    /// - `NativeStatus` / `UnknownNativeStatus` if the engine failed
    /// - `EngineContract` if the engine reported success inconsistently
    pub fn build(&self, headers: &[Header], payload: &[u8]) -> PacketResult<PacketHandle> {
        self.validate(headers, payload)?;

        let ffi_headers: Vec<FfiHeader> = headers.iter().map(Header::as_ffi).collect();
        let pending = Arc::new(Mutex::new(Pending::Empty));
        let mut out = FfiBuffer::empty();

        let status = {
            let registration = self.bridge.register(self.allocator(Arc::clone(&pending)));
            let ctx = CallContext::new(&self.bridge, registration.token());
            tracing::debug!(
                token = %registration.token(),
                engine = self.engine.name(),
                headers = headers.len(),
                payload = payload.len(),
                "building packet"
            );
            // SAFETY: header and payload spans borrow `headers` and `payload`,
            // and `ctx` outlives the call
            unsafe {
                self.engine.build(
                    &ffi_headers,
                    FfiBuffer::from_slice(payload),
                    ctx.as_alloc(),
                    &mut out,
                )
            }
        };

        let slot = mem::take(&mut *pending.lock());
        match (check_status(status), slot) {
            (Err(_), Pending::Failed { requested }) => {
                tracing::warn!(requested, "packet build failed: host allocation");
                Err(PacketError::AllocationFailure { requested })
            }
            (Err(err), _) => {
                tracing::warn!(status, error = %err, "packet build failed");
                Err(err)
            }
            (Ok(()), Pending::Allocated(buffer)) => {
                if out.is_empty() || !out.is_valid() || !out.is_within(&buffer) {
                    return Err(PacketError::EngineContract(format!(
                        "packed view of {} bytes is outside the {} byte allocation",
                        out.len,
                        buffer.len()
                    )));
                }
                tracing::debug!(packed = out.len, "packet built");
                Ok(PacketHandle::new(Arc::clone(&self.engine), buffer, out))
            }
            (Ok(()), _) => Err(PacketError::EngineContract(
                "engine reported success without allocating".into(),
            )),
        }
    }

    /// Reject inputs that break the configured limits
    fn validate(&self, headers: &[Header], payload: &[u8]) -> PacketResult<()> {
        if headers.len() > self.config.max_headers {
            return Err(PacketError::InvalidArgument(format!(
                "{} headers exceeds limit of {}",
                headers.len(),
                self.config.max_headers
            )));
        }

        if self.config.reject_empty_keys {
            if let Some(index) = headers.iter().position(|h| h.key.is_empty()) {
                return Err(PacketError::InvalidArgument(format!(
                    "header {} has an empty key",
                    index
                )));
            }
        }

        let content = headers
            .iter()
            .try_fold(payload.len(), |acc, h| acc.checked_add(h.content_len()));
        match content {
            Some(total) if total <= self.config.max_packet_size => Ok(()),
            Some(total) => Err(PacketError::InvalidArgument(format!(
                "{} content bytes exceeds packet limit of {}",
                total, self.config.max_packet_size
            ))),
            None => Err(PacketError::InvalidArgument(
                "content size overflows".into(),
            )),
        }
    }

    /// One-shot callback that allocates into `slot`
    fn allocator(&self, slot: Arc<Mutex<Pending>>) -> AllocCallback {
        let limit = self.config.max_packet_size;
        Box::new(move |size| {
            let mut slot = slot.lock();
            if size > limit {
                *slot = Pending::Failed { requested: size };
                return Err(PacketError::AllocationFailure { requested: size });
            }

            let mut buffer = Vec::new();
            if buffer.try_reserve_exact(size).is_err() {
                *slot = Pending::Failed { requested: size };
                return Err(PacketError::AllocationFailure { requested: size });
            }
            buffer.resize(size, 0);

            // Heap storage does not move when the Vec moves into the slot
            let view = FfiBuffer::from_mut_slice(&mut buffer);
            *slot = Pending::Allocated(buffer);
            Ok(view)
        })
    }
}

impl Default for PacketBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PacketBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketBuilder")
            .field("engine", &self.engine.name())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pktbridge_core::{FfiAlloc, NativeStatus};
    use std::os::raw::c_int;

    /// Engine that fails with `status` without ever allocating
    struct RefusingEngine(c_int);

    /// Engine that allocates `size` bytes, then returns `status`
    struct AllocatingEngine {
        size: usize,
        status: c_int,
        escape: bool,
    }

    impl PacketEngine for RefusingEngine {
        unsafe fn build(&self, _: &[FfiHeader], _: FfiBuffer, _: FfiAlloc, _: &mut FfiBuffer) -> c_int {
            self.0
        }
        unsafe fn header_count(&self, _: FfiBuffer, _: &mut usize) -> c_int {
            libc::EIO
        }
        unsafe fn header_at(&self, _: FfiBuffer, _: usize, _: &mut FfiHeader) -> c_int {
            libc::EIO
        }
        unsafe fn payload(&self, _: FfiBuffer, _: &mut FfiBuffer) -> c_int {
            libc::EIO
        }
        fn abi_version(&self) -> u32 {
            FFI_ABI_VERSION
        }
    }

    impl PacketEngine for AllocatingEngine {
        unsafe fn build(&self, _: &[FfiHeader], _: FfiBuffer, alloc: FfiAlloc, out: &mut FfiBuffer) -> c_int {
            let mut buf = FfiBuffer::empty();
            let status = (alloc.alloc.unwrap())(alloc.user_data, self.size, &mut buf);
            if status != 0 {
                return status;
            }
            *out = if self.escape {
                FfiBuffer { data: buf.data.add(1), len: buf.len }
            } else {
                buf
            };
            self.status
        }
        unsafe fn header_count(&self, _: FfiBuffer, out: &mut usize) -> c_int {
            *out = 0;
            0
        }
        unsafe fn header_at(&self, _: FfiBuffer, _: usize, _: &mut FfiHeader) -> c_int {
            libc::ERANGE
        }
        unsafe fn payload(&self, _: FfiBuffer, out: &mut FfiBuffer) -> c_int {
            *out = FfiBuffer::empty();
            0
        }
        fn abi_version(&self) -> u32 {
            FFI_ABI_VERSION
        }
    }

    /// Engine from an incompatible ABI generation
    struct FutureEngine;

    impl PacketEngine for FutureEngine {
        unsafe fn build(&self, _: &[FfiHeader], _: FfiBuffer, _: FfiAlloc, _: &mut FfiBuffer) -> c_int {
            libc::EIO
        }
        unsafe fn header_count(&self, _: FfiBuffer, _: &mut usize) -> c_int {
            libc::EIO
        }
        unsafe fn header_at(&self, _: FfiBuffer, _: usize, _: &mut FfiHeader) -> c_int {
            libc::EIO
        }
        unsafe fn payload(&self, _: FfiBuffer, _: &mut FfiBuffer) -> c_int {
            libc::EIO
        }
        fn abi_version(&self) -> u32 {
            2 << 16
        }
    }

    fn builder_over(engine: impl PacketEngine + 'static) -> PacketBuilder {
        PacketBuilder::with_engine(
            Arc::new(engine),
            Arc::new(AllocationBridge::new()),
            BuilderConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_native_failure_before_allocation() {
        let builder = builder_over(RefusingEngine(libc::EINVAL));
        let err = builder.build(&[Header::new("k", "v")], b"p").unwrap_err();

        assert_eq!(err.native_kind(), Some(NativeStatus::InvalidArgument));
        assert_eq!(builder.bridge().invocations(), 0);
        assert_eq!(builder.bridge().outstanding(), 0);
    }

    #[test]
    fn test_unknown_status_surfaces_raw_code() {
        let builder = builder_over(RefusingEngine(4242));
        let err = builder.build(&[], b"").unwrap_err();
        assert_eq!(err, PacketError::UnknownNativeStatus(4242));
    }

    #[test]
    fn test_engine_failure_after_allocation_frees_buffer() {
        let builder = builder_over(AllocatingEngine {
            size: 32,
            status: libc::EIO,
            escape: false,
        });
        let err = builder.build(&[], b"").unwrap_err();

        assert_eq!(err.native_kind(), Some(NativeStatus::Internal));
        assert_eq!(builder.bridge().invocations(), 1);
        assert_eq!(builder.bridge().outstanding(), 0);
    }

    #[test]
    fn test_oversized_request_is_allocation_failure() {
        let config = BuilderConfig {
            max_packet_size: 16,
            ..BuilderConfig::default()
        };
        let builder = PacketBuilder::with_engine(
            Arc::new(AllocatingEngine {
                size: 17,
                status: 0,
                escape: false,
            }),
            Arc::new(AllocationBridge::new()),
            config,
        )
        .unwrap();

        let err = builder.build(&[], b"").unwrap_err();
        assert_eq!(err, PacketError::AllocationFailure { requested: 17 });
        assert_eq!(builder.bridge().outstanding(), 0);
    }

    #[test]
    fn test_success_without_allocation_is_contract_violation() {
        let builder = builder_over(RefusingEngine(0));
        let err = builder.build(&[], b"").unwrap_err();
        assert!(matches!(err, PacketError::EngineContract(_)));
    }

    #[test]
    fn test_view_outside_allocation_is_contract_violation() {
        let builder = builder_over(AllocatingEngine {
            size: 8,
            status: 0,
            escape: true,
        });
        let err = builder.build(&[], b"").unwrap_err();
        assert!(matches!(err, PacketError::EngineContract(_)));
        assert_eq!(builder.bridge().outstanding(), 0);
    }

    #[test]
    fn test_limits_reject_before_native_call() {
        let config = BuilderConfig {
            max_packet_size: 4,
            max_headers: 1,
            reject_empty_keys: true,
        };
        let builder = PacketBuilder::with_engine(
            Arc::new(RefusingEngine(0)),
            Arc::new(AllocationBridge::new()),
            config,
        )
        .unwrap();

        let two = [Header::new("a", ""), Header::new("b", "")];
        assert!(matches!(builder.build(&two, b""), Err(PacketError::InvalidArgument(_))));

        let empty_key = [Header::new("", "v")];
        assert!(matches!(builder.build(&empty_key, b""), Err(PacketError::InvalidArgument(_))));

        assert!(matches!(builder.build(&[], b"12345"), Err(PacketError::InvalidArgument(_))));
        assert_eq!(builder.bridge().invocations(), 0);
    }

    #[test]
    fn test_abi_major_mismatch_rejected() {
        let err = PacketBuilder::with_engine(
            Arc::new(FutureEngine),
            Arc::new(AllocationBridge::new()),
            BuilderConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PacketError::EngineContract(_)));
    }

    #[test]
    fn test_builder_keeps_config() {
        let config = BuilderConfig {
            max_headers: 3,
            ..BuilderConfig::default()
        };
        let builder = PacketBuilder::with_config(config.clone()).unwrap();
        assert_eq!(builder.config(), &config);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = BuilderConfig {
            max_packet_size: 0,
            ..BuilderConfig::default()
        };
        assert!(matches!(
            PacketBuilder::with_config(config),
            Err(PacketError::Config(_))
        ));
    }
}

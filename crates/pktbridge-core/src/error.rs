//! # Native Status Codes
//!
//! Packet Bridge ABI v1.0.0 - Error Propagation
//! Every engine operation returns a `c_int` status. Zero is success; nonzero
//! values are OS-style error numbers drawn from a closed set.

use std::fmt;
use std::os::raw::c_int;

/// Status returned by a successful engine call
pub const STATUS_OK: c_int = 0;

/// Native engine status codes
///
/// `#[repr(i32)]` keeps the discriminants identical to the errno values the
/// engine writes across the boundary.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeStatus {
    /// Malformed argument or packet layout (EINVAL)
    InvalidArgument = libc::EINVAL,
    /// Allocator could not provide the requested buffer (ENOMEM)
    OutOfMemory = libc::ENOMEM,
    /// Index past the end of the header table (ERANGE)
    OutOfRange = libc::ERANGE,
    /// Requested header key is absent (ENOENT)
    NotFound = libc::ENOENT,
    /// Required output pointer was null (EFAULT)
    BadAddress = libc::EFAULT,
    /// Packed size does not fit in the address space (E2BIG)
    TooLarge = libc::E2BIG,
    /// Engine failed internally, e.g. a caught panic (EIO)
    Internal = libc::EIO,
}

impl NativeStatus {
    /// All mapped statuses, in discriminant-independent order
    pub const ALL: [NativeStatus; 7] = [
        NativeStatus::InvalidArgument,
        NativeStatus::OutOfMemory,
        NativeStatus::OutOfRange,
        NativeStatus::NotFound,
        NativeStatus::BadAddress,
        NativeStatus::TooLarge,
        NativeStatus::Internal,
    ];

    /// Convert a raw status back to its variant
    ///
    /// Returns `None` for success (0) and for codes outside the closed set.
    pub fn from_code(code: c_int) -> Option<Self> {
        match code {
            libc::EINVAL => Some(NativeStatus::InvalidArgument),
            libc::ENOMEM => Some(NativeStatus::OutOfMemory),
            libc::ERANGE => Some(NativeStatus::OutOfRange),
            libc::ENOENT => Some(NativeStatus::NotFound),
            libc::EFAULT => Some(NativeStatus::BadAddress),
            libc::E2BIG => Some(NativeStatus::TooLarge),
            libc::EIO => Some(NativeStatus::Internal),
            _ => None,
        }
    }

    /// Raw status value
    pub const fn code(self) -> c_int {
        self as c_int
    }

    /// Get human-readable error message
    pub fn message(&self) -> &'static str {
        match self {
            NativeStatus::InvalidArgument => "Invalid argument",
            NativeStatus::OutOfMemory => "Out of memory",
            NativeStatus::OutOfRange => "Index out of range",
            NativeStatus::NotFound => "Not found",
            NativeStatus::BadAddress => "Bad address",
            NativeStatus::TooLarge => "Packet too large",
            NativeStatus::Internal => "Internal engine error",
        }
    }
}

impl fmt::Display for NativeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeStatus::{:?} ({}): {}", self, self.code(), self.message())
    }
}

impl std::error::Error for NativeStatus {}

impl From<NativeStatus> for c_int {
    fn from(status: NativeStatus) -> Self {
        status.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_round_trip() {
        for status in NativeStatus::ALL {
            assert_eq!(NativeStatus::from_code(status.code()), Some(status));
        }
    }

    #[test]
    fn success_and_unknown_are_unmapped() {
        assert_eq!(NativeStatus::from_code(STATUS_OK), None);
        assert_eq!(NativeStatus::from_code(-1), None);
        assert_eq!(NativeStatus::from_code(9999), None);
    }

    #[test]
    fn codes_are_distinct() {
        let mut codes: Vec<c_int> = NativeStatus::ALL.iter().map(|s| s.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), NativeStatus::ALL.len());
    }

    #[test]
    fn error_messages_non_empty() {
        for status in NativeStatus::ALL {
            assert!(!status.message().is_empty());
        }
    }

    #[test]
    fn converts_into_raw_status() {
        let raw: c_int = NativeStatus::NotFound.into();
        assert_eq!(raw, libc::ENOENT);
    }

    #[test]
    fn display_includes_code() {
        let text = NativeStatus::OutOfRange.to_string();
        assert!(text.contains("OutOfRange"));
        assert!(text.contains(&libc::ERANGE.to_string()));
    }
}

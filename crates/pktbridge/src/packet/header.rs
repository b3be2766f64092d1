//! Owned header input.

use pktbridge_core::FfiHeader;

/// Key of the packet id header; at most one per packet
pub const PACKET_ID_KEY: &[u8] = b"a0_id";

/// Key of a dependency header; repeated once per referenced packet id
pub const PACKET_DEP_KEY: &[u8] = b"a0_dep";

/// A key/value pair of raw bytes
///
/// Headers are ordered and keys may repeat; the packed layout keeps both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Header {
    pub key: Vec<u8>,
    pub val: Vec<u8>,
}

impl Header {
    pub fn new(key: impl Into<Vec<u8>>, val: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            val: val.into(),
        }
    }

    /// `a0_id` header carrying this packet's id
    pub fn id(val: impl Into<Vec<u8>>) -> Self {
        Self::new(PACKET_ID_KEY, val)
    }

    /// `a0_dep` header referencing another packet's id
    pub fn dep(val: impl Into<Vec<u8>>) -> Self {
        Self::new(PACKET_DEP_KEY, val)
    }

    /// Total content bytes (key + value)
    pub fn content_len(&self) -> usize {
        self.key.len() + self.val.len()
    }

    /// Borrowed FFI descriptor; valid while `self` is
    pub(crate) fn as_ffi(&self) -> FfiHeader {
        FfiHeader::from_slices(&self.key, &self.val)
    }
}

impl<K, V> From<(K, V)> for Header
where
    K: Into<Vec<u8>>,
    V: Into<Vec<u8>>,
{
    fn from((key, val): (K, V)) -> Self {
        Self::new(key, val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_from_tuple() {
        let hdr: Header = ("a0_id", b"1234".to_vec()).into();
        assert_eq!(hdr.key, b"a0_id");
        assert_eq!(hdr.val, b"1234");
        assert_eq!(hdr.content_len(), 9);
    }

    #[test]
    fn test_special_key_constructors() {
        assert_eq!(Header::id("x").key, b"a0_id");
        assert_eq!(Header::dep("y").key, b"a0_dep");
        assert_eq!(Header::dep("y").val, b"y");
    }

    #[test]
    fn test_empty_header_descriptor_is_null() {
        let hdr = Header::default();
        let ffi = hdr.as_ffi();
        assert!(ffi.key.data.is_null());
        assert!(ffi.val.data.is_null());
    }
}

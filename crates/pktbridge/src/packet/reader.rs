//! # Packet Reader
//!
//! Zero-copy accessors over a built packet. Every view borrows the
//! [`PacketHandle`] it came from, so it cannot outlive the packed buffer.
//!
//! Spans handed back by the engine are never dereferenced directly: each is
//! checked against the owned buffer and turned into a subslice of it.

use std::collections::HashMap;
use std::ops::Deref;

use pktbridge_core::{FfiBuffer, FfiHeader, NativeStatus};

use super::handle::PacketHandle;
use super::header::{Header, PACKET_DEP_KEY, PACKET_ID_KEY};
use crate::error::{check_status, PacketError, PacketResult};

/// Borrowed header inside a packed buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeaderView<'a> {
    pub key: &'a [u8],
    pub val: &'a [u8],
}

impl HeaderView<'_> {
    /// Copy into an owned header
    pub fn to_header(&self) -> Header {
        Header::new(self.key, self.val)
    }
}

/// Borrowed payload inside a packed buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadView<'a>(&'a [u8]);

impl<'a> PayloadView<'a> {
    pub fn as_slice(&self) -> &'a [u8] {
        self.0
    }
}

impl Deref for PayloadView<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.0
    }
}

impl AsRef<[u8]> for PayloadView<'_> {
    fn as_ref(&self) -> &[u8] {
        self.0
    }
}

/// Read accessors bound to one packet handle
#[derive(Debug, Clone, Copy)]
pub struct PacketReader<'a> {
    handle: &'a PacketHandle,
}

impl<'a> PacketReader<'a> {
    pub(crate) fn new(handle: &'a PacketHandle) -> Self {
        Self { handle }
    }

    /// Number of headers, including duplicates
    pub fn header_count(&self) -> PacketResult<usize> {
        let (_, view) = self.handle.live()?;
        let mut count = 0usize;
        // SAFETY: `view` references the handle's live buffer
        let status = unsafe { self.handle.engine().header_count(view, &mut count) };
        check_status(status)?;
        Ok(count)
    }

    /// Header at `index` in the original order
    ///
    /// # Arguments
    /// * `index` - Zero-based position, must be below `header_count()`
    ///
    /// # Returns
    /// Borrowed key and value, or `IndexOutOfRange`.
    pub fn header_at(&self, index: usize) -> PacketResult<HeaderView<'a>> {
        let count = self.header_count()?;
        if index >= count {
            return Err(PacketError::IndexOutOfRange { index, count });
        }

        let (buffer, view) = self.handle.live()?;
        let mut hdr = FfiHeader::default();
        // SAFETY: `view` references the handle's live buffer
        let status = unsafe { self.handle.engine().header_at(view, index, &mut hdr) };
        match check_status(status) {
            Err(err) if err.native_kind() == Some(NativeStatus::OutOfRange) => {
                return Err(PacketError::IndexOutOfRange { index, count });
            }
            other => other?,
        }

        Ok(HeaderView {
            key: subslice(buffer, hdr.key, "header key")?,
            val: subslice(buffer, hdr.val, "header value")?,
        })
    }

    /// Payload bytes; empty when the packet was built without one
    pub fn payload(&self) -> PacketResult<PayloadView<'a>> {
        let (buffer, view) = self.handle.live()?;
        let mut out = FfiBuffer::empty();
        // SAFETY: `view` references the handle's live buffer
        let status = unsafe { self.handle.engine().payload(view, &mut out) };
        check_status(status)?;
        Ok(PayloadView(subslice(buffer, out, "payload")?))
    }

    /// All headers in order, duplicates included
    pub fn headers(&self) -> PacketResult<Vec<HeaderView<'a>>> {
        let count = self.header_count()?;
        (0..count).map(|index| self.header_at(index)).collect()
    }

    /// Headers as a map; for a repeated key the later value wins
    pub fn header_map(&self) -> PacketResult<HashMap<&'a [u8], &'a [u8]>> {
        let headers = self.headers()?;
        let mut map = HashMap::with_capacity(headers.len());
        for hdr in headers {
            map.insert(hdr.key, hdr.val);
        }
        Ok(map)
    }

    /// Value of the first header whose key equals `key`
    pub fn find_header(&self, key: &[u8]) -> PacketResult<Option<&'a [u8]>> {
        let (buffer, view) = self.handle.live()?;
        let mut out = FfiBuffer::empty();
        // SAFETY: `view` references the handle's live buffer and `key`
        // outlives the call
        let status = unsafe {
            self.handle
                .engine()
                .find_header(view, FfiBuffer::from_slice(key), &mut out)
        };
        match check_status(status) {
            Ok(()) => Ok(Some(subslice(buffer, out, "header value")?)),
            Err(err) if err.native_kind() == Some(NativeStatus::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Packet id: value of the first `a0_id` header, if any
    pub fn id(&self) -> PacketResult<Option<&'a [u8]>> {
        self.find_header(PACKET_ID_KEY)
    }

    /// Ids of referenced packets: every `a0_dep` value in index order
    pub fn deps(&self) -> PacketResult<Vec<&'a [u8]>> {
        Ok(self
            .headers()?
            .into_iter()
            .filter(|hdr| hdr.key == PACKET_DEP_KEY)
            .map(|hdr| hdr.val)
            .collect())
    }

    /// Copy every header out of the packet
    pub fn to_owned_headers(&self) -> PacketResult<Vec<Header>> {
        Ok(self.headers()?.iter().map(HeaderView::to_header).collect())
    }
}

/// Map an engine span onto the owned buffer
fn subslice<'a>(buffer: &'a [u8], span: FfiBuffer, what: &str) -> PacketResult<&'a [u8]> {
    if span.is_empty() {
        return Ok(&[]);
    }
    if !span.is_valid() || !span.is_within(buffer) {
        return Err(PacketError::EngineContract(format!(
            "{} span of {} bytes lies outside the packet buffer",
            what, span.len
        )));
    }
    let start = span.data as usize - buffer.as_ptr() as usize;
    Ok(&buffer[start..start + span.len])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subslice_maps_interior_span() {
        let buffer = vec![0u8, 1, 2, 3, 4, 5];
        let span = FfiBuffer::from_slice(&buffer[2..5]);
        assert_eq!(subslice(&buffer, span, "test").unwrap(), &[2, 3, 4]);
    }

    #[test]
    fn test_subslice_rejects_foreign_span() {
        let buffer = vec![0u8; 8];
        let other = vec![1u8; 8];
        let span = FfiBuffer::from_slice(&other);
        let err = subslice(&buffer, span, "payload").unwrap_err();
        assert!(matches!(err, PacketError::EngineContract(_)));
    }

    #[test]
    fn test_subslice_rejects_overhanging_span() {
        let buffer = vec![0u8; 8];
        let span = FfiBuffer {
            data: buffer[4..].as_ptr() as *mut u8,
            len: 8,
        };
        assert!(subslice(&buffer, span, "payload").is_err());
    }

    #[test]
    fn test_subslice_empty_span() {
        let buffer = vec![0u8; 4];
        assert!(subslice(&buffer, FfiBuffer::empty(), "payload")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_payload_view_derefs() {
        let bytes = b"abc";
        let view = PayloadView(bytes);
        assert_eq!(view.len(), 3);
        assert_eq!(&*view, b"abc");
        assert_eq!(view.as_slice(), b"abc");
    }
}

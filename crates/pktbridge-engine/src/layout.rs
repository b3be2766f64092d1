//! # Flat Packet Layout
//!
//! A packet is one contiguous buffer: an offset table followed by content.
//!
//! ```text
//! +-------------------------------+
//! | num headers (u64)             |
//! +-------------------------------+
//! | offset for hdr 0 key (u64)    |
//! | offset for hdr 0 val (u64)    |
//! | ...                           |
//! | offset for hdr N key (u64)    |
//! | offset for hdr N val (u64)    |
//! +-------------------------------+
//! | offset for payload (u64)      |
//! +-------------------------------+
//! | hdr 0 key | hdr 0 val | ...   |
//! +-------------------------------+
//! | payload content               |
//! +-------------------------------+
//! ```
//!
//! All words are little-endian. The table is contiguous, so the end of entry
//! `j` is entry `j + 1` and lengths are never stored. Header access is O(1).

use pktbridge_core::NativeStatus;

/// Width of every table word
pub const WORD: usize = 8;

fn write_word(out: &mut [u8], pos: usize, value: usize) {
    out[pos..pos + WORD].copy_from_slice(&(value as u64).to_le_bytes());
}

fn read_word(buf: &[u8], pos: usize) -> Result<usize, NativeStatus> {
    let end = pos.checked_add(WORD).ok_or(NativeStatus::InvalidArgument)?;
    let bytes = buf.get(pos..end).ok_or(NativeStatus::InvalidArgument)?;
    let mut word = [0u8; WORD];
    word.copy_from_slice(bytes);
    usize::try_from(u64::from_le_bytes(word)).map_err(|_| NativeStatus::InvalidArgument)
}

/// Size of the offset table (count word, 2 words per header, payload word)
fn table_size(num_headers: usize) -> Option<usize> {
    num_headers
        .checked_mul(2 * WORD)?
        .checked_add(2 * WORD)
}

/// Total packed size for the given headers and payload length
///
/// Returns `TooLarge` if the size overflows `usize`.
pub fn packed_size<'a, I>(headers: I, payload_len: usize) -> Result<usize, NativeStatus>
where
    I: ExactSizeIterator<Item = (&'a [u8], &'a [u8])>,
{
    let mut size = table_size(headers.len()).ok_or(NativeStatus::TooLarge)?;
    for (key, val) in headers {
        size = size
            .checked_add(key.len())
            .and_then(|s| s.checked_add(val.len()))
            .ok_or(NativeStatus::TooLarge)?;
    }
    size.checked_add(payload_len).ok_or(NativeStatus::TooLarge)
}

/// Write a packet into `out`
///
/// `out` must be exactly `packed_size(headers, payload.len())` bytes long.
pub fn write_packet<'a, I>(out: &mut [u8], headers: I, payload: &[u8])
where
    I: ExactSizeIterator<Item = (&'a [u8], &'a [u8])>,
{
    let num_headers = headers.len();
    write_word(out, 0, num_headers);

    let mut idx_off = WORD;
    let mut off = table_size(num_headers).unwrap_or(out.len());

    for (key, val) in headers {
        write_word(out, idx_off, off);
        idx_off += WORD;
        out[off..off + key.len()].copy_from_slice(key);
        off += key.len();

        write_word(out, idx_off, off);
        idx_off += WORD;
        out[off..off + val.len()].copy_from_slice(val);
        off += val.len();
    }

    write_word(out, idx_off, off);
    out[off..off + payload.len()].copy_from_slice(payload);
}

/// Read-only, validated view over a packed buffer
#[derive(Debug, Clone, Copy)]
pub struct FlatPacket<'a> {
    buf: &'a [u8],
    num_headers: usize,
    payload_off: usize,
}

impl<'a> FlatPacket<'a> {
    /// Validate the header table and wrap the buffer
    pub fn parse(buf: &'a [u8]) -> Result<Self, NativeStatus> {
        let num_headers = read_word(buf, 0)?;
        let table = table_size(num_headers).ok_or(NativeStatus::InvalidArgument)?;
        if table > buf.len() {
            return Err(NativeStatus::InvalidArgument);
        }

        let payload_off = read_word(buf, table - WORD)?;
        if payload_off < table || payload_off > buf.len() {
            return Err(NativeStatus::InvalidArgument);
        }

        Ok(Self {
            buf,
            num_headers,
            payload_off,
        })
    }

    /// Number of headers
    pub fn header_count(&self) -> usize {
        self.num_headers
    }

    /// Header at `index` as (key, val)
    pub fn header(&self, index: usize) -> Result<(&'a [u8], &'a [u8]), NativeStatus> {
        if index >= self.num_headers {
            return Err(NativeStatus::OutOfRange);
        }

        let entry = WORD + 2 * index * WORD;
        let key_off = read_word(self.buf, entry)?;
        let val_off = read_word(self.buf, entry + WORD)?;
        // next key offset, or the payload offset after the last header
        let end = read_word(self.buf, entry + 2 * WORD)?;

        let table = table_size(self.num_headers).ok_or(NativeStatus::InvalidArgument)?;
        if key_off < table || key_off > val_off || val_off > end || end > self.payload_off {
            return Err(NativeStatus::InvalidArgument);
        }

        Ok((&self.buf[key_off..val_off], &self.buf[val_off..end]))
    }

    /// Payload bytes (possibly empty)
    pub fn payload(&self) -> &'a [u8] {
        &self.buf[self.payload_off..]
    }

    /// Value of the first header with an exactly matching key
    pub fn find(&self, key: &[u8]) -> Result<&'a [u8], NativeStatus> {
        for index in 0..self.num_headers {
            let (k, v) = self.header(index)?;
            if k == key {
                return Ok(v);
            }
        }
        Err(NativeStatus::NotFound)
    }
}

use crate::error::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};
use log::warn;
use memchr::memmem;

/// A single `seek` consuming more than this many bytes usually means a
/// signature landed somewhere unexpected; worth a warning.
const LARGE_SEEK: usize = 64 * 1024;

/// Cursor over the decompressed payload bytes.
///
/// All event parsers read forward through this; the dispatcher repositions
/// it to just past each matched signature.
#[derive(Debug)]
pub struct Payload {
    data: Vec<u8>,
    offset: usize,
}

impl Payload {
    pub fn new(data: Vec<u8>) -> Self {
        Payload { data, offset: 0 }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pos(&self) -> usize {
        self.offset
    }

    pub fn set_pos(&mut self, offset: usize) {
        self.offset = offset;
    }

    /// Advances past `n` bytes without looking at them.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        if self.offset + n > self.data.len() {
            return Err(Error::UnexpectedEnd);
        }
        self.offset += n;
        Ok(())
    }

    /// Returns the next `n` bytes and advances past them.
    pub fn bytes(&mut self, n: usize) -> Result<&[u8]> {
        if self.offset + n > self.data.len() {
            return Err(Error::UnexpectedEnd);
        }
        let b = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(b)
    }

    /// One byte as an integer.
    pub fn int(&mut self) -> Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    /// Length-prefixed string: one length byte, then that many bytes.
    /// Non-UTF-8 content is replaced rather than rejected; usernames come
    /// from the game client and are not always clean.
    pub fn string(&mut self) -> Result<String> {
        let len = self.int()? as usize;
        let b = self.bytes(len)?;
        Ok(String::from_utf8_lossy(b).into_owned())
    }

    /// Little-endian u32. The stream writes a length byte before fixed-size
    /// integers; it is implicit for us, so it gets skipped.
    pub fn u32_le(&mut self) -> Result<u32> {
        self.skip(1)?;
        let b = self.bytes(4)?;
        Ok(LittleEndian::read_u32(b))
    }

    /// Little-endian u64, same implicit length byte as [`Payload::u32_le`].
    pub fn u64_le(&mut self) -> Result<u64> {
        self.skip(1)?;
        let b = self.bytes(8)?;
        Ok(LittleEndian::read_u64(b))
    }

    /// Advances until the next occurrence of `pattern` is fully consumed.
    /// Fails with [`Error::UnexpectedEnd`] when the pattern never shows up.
    pub fn seek(&mut self, pattern: &[u8]) -> Result<()> {
        match memmem::find(&self.data[self.offset..], pattern) {
            Some(idx) => {
                let consumed = idx + pattern.len();
                if consumed > LARGE_SEEK {
                    warn!("large seek: consumed {} bytes", consumed);
                }
                self.offset += consumed;
                Ok(())
            }
            None => {
                self.offset = self.data.len();
                Err(Error::UnexpectedEnd)
            }
        }
    }
}

//! Position-tracked reader over BER input
//!
//! The cursor keeps a current position and an end bound. Opening a
//! constructed value narrows the bound to the value's content (or, for the
//! indefinite form, marks the region as terminated by End-of-Contents) and
//! closing it restores the outer bound. Offsets reported by the cursor are
//! absolute: a cursor over a nested payload is created with the payload's
//! offset in the outermost input as its base.

use crate::ber::types::{BerLength, BerTag};
use crate::config::Encoding;
use dermodel_core::{CodecResult, ErrorKind};

/// Saved cursor state for backtracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    pos: usize,
    end: usize,
    indefinite: bool,
}

/// Handle returned by [`Cursor::open`], consumed by [`Cursor::close`]
#[must_use = "an opened view must be closed"]
#[derive(Debug)]
pub struct View {
    outer_end: usize,
    outer_indefinite: bool,
    indefinite: bool,
}

/// Reader over a complete in-memory input
///
/// # Error Handling
///
/// Reads past the current end bound fail with `Truncated`; malformed tags and
/// lengths are reported by [`BerTag::decode`] and [`BerLength::decode`].
pub struct Cursor<'a> {
    buffer: &'a [u8],
    position: usize,
    end: usize,
    indefinite: bool,
    base: usize,
    encoding: Encoding,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at the start of `buffer`
    ///
    /// # Arguments
    /// * `buffer` - Complete BER/DER input
    /// * `encoding` - Strictness applied to length fields
    pub fn new(buffer: &'a [u8], encoding: Encoding) -> Self {
        Self::with_base(buffer, 0, encoding)
    }

    /// Cursor whose offsets are shifted by `base`
    ///
    /// # Arguments
    /// * `buffer` - Nested payload, e.g. the content of an OCTET STRING
    /// * `base` - Offset of `buffer` within the outermost input
    /// * `encoding` - Strictness applied to length fields
    pub fn with_base(buffer: &'a [u8], base: usize, encoding: Encoding) -> Self {
        Self {
            buffer,
            position: 0,
            end: buffer.len(),
            indefinite: false,
            base,
            encoding,
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Absolute offset of the current position
    pub fn offset(&self) -> usize {
        self.base + self.position
    }

    /// Bytes left before the current end bound
    pub fn remaining(&self) -> usize {
        self.end.saturating_sub(self.position)
    }

    /// True when the current region has no more values
    ///
    /// For an indefinite region this means the next two bytes are an
    /// End-of-Contents marker (or the input is exhausted).
    pub fn at_end(&self) -> bool {
        if self.position >= self.end {
            return true;
        }
        self.indefinite && self.at_end_of_contents()
    }

    fn at_end_of_contents(&self) -> bool {
        self.remaining() >= 2
            && self.buffer[self.position] == 0x00
            && self.buffer[self.position + 1] == 0x00
    }

    /// Snapshot the position and bounds for a later [`restore`](Self::restore)
    pub fn save(&self) -> Mark {
        Mark {
            pos: self.position,
            end: self.end,
            indefinite: self.indefinite,
        }
    }

    /// Return to a state captured by [`save`](Self::save)
    pub fn restore(&mut self, mark: Mark) {
        self.position = mark.pos;
        self.end = mark.end;
        self.indefinite = mark.indefinite;
    }

    /// Byte at the current position, without advancing
    pub fn peek_byte(&self) -> CodecResult<u8> {
        if self.position >= self.end {
            return Err(ErrorKind::Truncated {
                needed: 1,
                available: 0,
            });
        }
        Ok(self.buffer[self.position])
    }

    pub fn read_byte(&mut self) -> CodecResult<u8> {
        let byte = self.peek_byte()?;
        self.position += 1;
        Ok(byte)
    }

    /// Read `count` bytes, advancing the position
    ///
    /// # Arguments
    /// * `count` - Number of bytes to read
    ///
    /// # Error Handling
    /// Returns `Truncated` if fewer than `count` bytes remain in the region.
    pub fn read_bytes(&mut self, count: usize) -> CodecResult<&'a [u8]> {
        let available = self.remaining();
        if count > available {
            return Err(ErrorKind::Truncated {
                needed: count,
                available,
            });
        }
        let start = self.position;
        self.position += count;
        Ok(&self.buffer[start..start + count])
    }

    pub fn read_tag(&mut self) -> CodecResult<BerTag> {
        let (tag, consumed) = BerTag::decode(&self.buffer[self.position..self.end])?;
        self.position += consumed;
        Ok(tag)
    }

    /// Read a length field; non-minimal forms are rejected in DER mode
    pub fn read_length(&mut self) -> CodecResult<BerLength> {
        let (length, consumed) = BerLength::decode(
            &self.buffer[self.position..self.end],
            self.encoding.is_strict(),
        )?;
        self.position += consumed;
        Ok(length)
    }

    /// Read a tag and rewind, `None` at the end of the region
    pub fn peek_tag(&mut self) -> CodecResult<Option<BerTag>> {
        if self.at_end() {
            return Ok(None);
        }
        let start = self.position;
        let tag = self.read_tag();
        self.position = start;
        tag.map(Some)
    }

    /// Read a tag and its length
    ///
    /// # Error Handling
    /// Returns `MalformedContent` for a primitive tag with indefinite length.
    pub fn read_header(&mut self) -> CodecResult<(BerTag, BerLength)> {
        let tag = self.read_tag()?;
        let length = self.read_length()?;
        if length.is_indefinite() && !tag.is_constructed() {
            return Err(ErrorKind::MalformedContent(format!(
                "indefinite length on primitive {}",
                tag
            )));
        }
        Ok((tag, length))
    }

    /// Read the content of a value whose header has just been read
    pub fn read_content(&mut self, length: BerLength) -> CodecResult<&'a [u8]> {
        match length {
            BerLength::Definite(n) => self.read_bytes(n),
            BerLength::Indefinite => Err(ErrorKind::MalformedContent(
                "indefinite length where primitive content was expected".to_string(),
            )),
        }
    }

    /// Bound the cursor to the content of a constructed value
    ///
    /// # Arguments
    /// * `length` - Length read from the value's header
    ///
    /// # Returns
    /// A [`View`] that must be handed back to [`close`](Self::close).
    pub fn open(&mut self, length: BerLength) -> CodecResult<View> {
        let view = View {
            outer_end: self.end,
            outer_indefinite: self.indefinite,
            indefinite: length.is_indefinite(),
        };
        match length {
            BerLength::Definite(n) => {
                let available = self.remaining();
                if n > available {
                    return Err(ErrorKind::Truncated {
                        needed: n,
                        available,
                    });
                }
                self.end = self.position + n;
                self.indefinite = false;
            }
            BerLength::Indefinite => {
                self.indefinite = true;
            }
        }
        Ok(view)
    }

    /// Leave a view, checking it was fully consumed
    ///
    /// A definite view must end exactly at its bound; an indefinite view must
    /// be positioned on its End-of-Contents marker, which is consumed.
    pub fn close(&mut self, view: View) -> CodecResult<()> {
        if view.indefinite {
            if !self.at_end_of_contents() {
                if self.position >= self.end {
                    return Err(ErrorKind::Truncated {
                        needed: 2,
                        available: self.remaining(),
                    });
                }
                return Err(ErrorKind::TrailingData {
                    remaining: self.remaining(),
                });
            }
            self.position += 2;
        } else if self.position != self.end {
            return Err(ErrorKind::TrailingData {
                remaining: self.remaining(),
            });
        }
        self.end = view.outer_end;
        self.indefinite = view.outer_indefinite;
        Ok(())
    }

    /// Capture one complete TLV, nested indefinite forms included
    pub fn read_raw_tlv(&mut self) -> CodecResult<&'a [u8]> {
        let start = self.position;
        let mut open_indefinite = 0usize;
        loop {
            let (_, length) = self.read_header()?;
            match length {
                BerLength::Definite(n) => {
                    self.read_bytes(n)?;
                }
                BerLength::Indefinite => open_indefinite += 1,
            }
            while open_indefinite > 0 && self.at_end_of_contents() {
                self.position += 2;
                open_indefinite -= 1;
            }
            if open_indefinite == 0 {
                break;
            }
        }
        Ok(&self.buffer[start..self.position])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_and_remaining() {
        let data = [0x01, 0x02, 0x03];
        let mut cursor = Cursor::new(&data, Encoding::Der);
        assert_eq!(cursor.peek_byte().unwrap(), 0x01);
        assert_eq!(cursor.read_byte().unwrap(), 0x01);
        assert_eq!(cursor.read_bytes(2).unwrap(), &[0x02, 0x03]);
        assert_eq!(cursor.remaining(), 0);
        assert!(matches!(
            cursor.read_bytes(1),
            Err(ErrorKind::Truncated {
                needed: 1,
                available: 0
            })
        ));
    }

    #[test]
    fn test_save_restore() {
        let data = [0x30, 0x03, 0x01, 0x01, 0xFF];
        let mut cursor = Cursor::new(&data, Encoding::Der);
        let mark = cursor.save();
        let (tag, length) = cursor.read_header().unwrap();
        let _view = cursor.open(length).unwrap();
        assert!(tag.is_constructed());
        assert_eq!(cursor.offset(), 2);
        cursor.restore(mark);
        assert_eq!(cursor.offset(), 0);
        assert_eq!(cursor.remaining(), 5);
    }

    #[test]
    fn test_definite_view() {
        let data = [0x30, 0x03, 0x01, 0x01, 0xFF, 0x05, 0x00];
        let mut cursor = Cursor::new(&data, Encoding::Der);
        let (_, length) = cursor.read_header().unwrap();
        let view = cursor.open(length).unwrap();
        assert_eq!(cursor.remaining(), 3);
        cursor.read_raw_tlv().unwrap();
        assert!(cursor.at_end());
        cursor.close(view).unwrap();
        assert_eq!(cursor.remaining(), 2);
    }

    #[test]
    fn test_definite_view_with_trailing_data() {
        let data = [0x30, 0x04, 0x05, 0x00, 0x05, 0x00];
        let mut cursor = Cursor::new(&data, Encoding::Der);
        let (_, length) = cursor.read_header().unwrap();
        let view = cursor.open(length).unwrap();
        cursor.read_raw_tlv().unwrap();
        assert_eq!(
            cursor.close(view),
            Err(ErrorKind::TrailingData { remaining: 2 })
        );
    }

    #[test]
    fn test_indefinite_view() {
        let data = [0x30, 0x80, 0x01, 0x01, 0xFF, 0x00, 0x00];
        let mut cursor = Cursor::new(&data, Encoding::Der);
        let (_, length) = cursor.read_header().unwrap();
        let view = cursor.open(length).unwrap();
        assert!(!cursor.at_end());
        cursor.read_raw_tlv().unwrap();
        assert!(cursor.at_end());
        cursor.close(view).unwrap();
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_view_longer_than_input() {
        let data = [0x30, 0x05, 0x02, 0x01];
        let mut cursor = Cursor::new(&data, Encoding::Der);
        let (_, length) = cursor.read_header().unwrap();
        assert!(matches!(
            cursor.open(length),
            Err(ErrorKind::Truncated {
                needed: 5,
                available: 2
            })
        ));
    }

    #[test]
    fn test_raw_tlv_nested_indefinite() {
        let data = [0x30, 0x80, 0x30, 0x80, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02];
        let mut cursor = Cursor::new(&data, Encoding::Ber);
        let raw = cursor.read_raw_tlv().unwrap();
        assert_eq!(raw.len(), 10);
        assert_eq!(cursor.remaining(), 1);
    }

    #[test]
    fn test_peek_tag_and_base_offset() {
        let data = [0x02, 0x01, 0x05];
        let mut cursor = Cursor::with_base(&data, 10, Encoding::Der);
        let tag = cursor.peek_tag().unwrap().unwrap();
        assert_eq!(tag.number(), 2);
        assert_eq!(cursor.offset(), 10);
        cursor.read_raw_tlv().unwrap();
        assert_eq!(cursor.offset(), 13);
        assert_eq!(cursor.peek_tag().unwrap(), None);
    }

    #[test]
    fn test_indefinite_primitive_rejected() {
        let data = [0x04, 0x80, 0x00, 0x00];
        let mut cursor = Cursor::new(&data, Encoding::Ber);
        assert!(matches!(
            cursor.read_header(),
            Err(ErrorKind::MalformedContent(_))
        ));
    }
}

//! Bounds-checked header cursor
//!
//! The cursor is the only place in the crate that turns an offset into bytes.
//! A header is either fully inside the buffer and handed out whole, or it is
//! not handed out at all.
//!
//! # Design
//!
//! - [`Checked`] windows can only be created here, so every [`Header`] view
//!   has passed the `offset + LEN <= len` check
//! - Advancing is by value: a failed read leaves the caller's cursor intact
//! - No allocation, no panics on short input

/// Byte window proven to lie inside the packet buffer.
///
/// Only this crate can build or read one. Accessor offsets are relative to
/// the window start and header views only use constant offsets below their
/// own `LEN`.
#[derive(Debug, Clone, Copy)]
pub struct Checked<'a> {
    bytes: &'a [u8],
}

impl Checked<'_> {
    /// Single byte at `at`
    #[inline(always)]
    pub(crate) fn u8_at(&self, at: usize) -> u8 {
        self.bytes[at]
    }

    /// Network-order u16 at `at`, returned in host order
    #[inline(always)]
    pub(crate) fn be_u16_at(&self, at: usize) -> u16 {
        u16::from_be_bytes(self.array_at(at))
    }

    /// Fixed-size copy starting at `at`
    #[inline(always)]
    pub(crate) fn array_at<const N: usize>(&self, at: usize) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[at..at + N]);
        out
    }
}

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// Fixed-size protocol header shape.
///
/// Sealed: only the views in [`crate::headers`] implement it, so `LEN`
/// always covers every offset their accessors touch.
pub trait Header<'a>: sealed::Sealed + Sized {
    /// Size of the fixed part of the header in bytes
    const LEN: usize;

    /// Build the view from a window of exactly `LEN` bytes
    fn from_checked(bytes: Checked<'a>) -> Self;
}

/// Read position into one packet buffer.
///
/// Invariant: `offset <= buf.len()`.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    /// Cursor at the start of `buf`
    #[inline(always)]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    /// Current byte offset
    #[inline(always)]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Total buffer length
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if the underlying buffer is empty
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes left after the current offset
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// Read header `H` at the current offset.
    ///
    /// Returns the view and a cursor advanced by `H::LEN`, or `None` when the
    /// header does not fit before the end of the buffer.
    #[inline]
    pub fn read<H: Header<'a>>(self) -> Option<(H, Cursor<'a>)> {
        let window = self.window(H::LEN)?;
        let next = Cursor {
            buf: self.buf,
            offset: self.offset + H::LEN,
        };
        Some((H::from_checked(window), next))
    }

    /// Advance past `len` bytes without looking at them
    #[inline]
    pub fn skip(self, len: usize) -> Option<Cursor<'a>> {
        self.window(len)?;
        Some(Cursor {
            buf: self.buf,
            offset: self.offset + len,
        })
    }

    #[inline(always)]
    fn window(&self, len: usize) -> Option<Checked<'a>> {
        let end = self.offset.checked_add(len)?;
        self.buf.get(self.offset..end).map(|bytes| Checked { bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair<'a> {
        raw: Checked<'a>,
    }

    impl sealed::Sealed for Pair<'_> {}

    impl<'a> Header<'a> for Pair<'a> {
        const LEN: usize = 2;

        fn from_checked(raw: Checked<'a>) -> Self {
            Self { raw }
        }
    }

    #[test]
    fn test_read_advances_by_header_len() {
        let buf = [0x12, 0x34, 0x56, 0x78, 0x9a];
        let cursor = Cursor::new(&buf);

        let (first, cursor) = cursor.read::<Pair>().unwrap();
        assert_eq!(first.raw.be_u16_at(0), 0x1234);
        assert_eq!(cursor.offset(), 2);

        let (second, cursor) = cursor.read::<Pair>().unwrap();
        assert_eq!(second.raw.be_u16_at(0), 0x5678);
        assert_eq!(cursor.offset(), 4);
        assert_eq!(cursor.remaining(), 1);

        // One byte left, header needs two
        assert!(cursor.read::<Pair>().is_none());
        assert_eq!(cursor.offset(), 4);
    }

    #[test]
    fn test_empty_buffer() {
        let cursor = Cursor::new(&[]);
        assert!(cursor.is_empty());
        assert!(cursor.read::<Pair>().is_none());
        assert_eq!(cursor.skip(0).map(|c| c.offset()), Some(0));
        assert!(cursor.skip(1).is_none());
    }

    #[test]
    fn test_exact_fit() {
        let buf = [0xff, 0x00];
        let (pair, cursor) = Cursor::new(&buf).read::<Pair>().unwrap();
        assert_eq!(pair.raw.array_at::<2>(0), [0xff, 0x00]);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_skip_overflow() {
        let buf = [0u8; 4];
        let cursor = Cursor::new(&buf).skip(3).unwrap();
        assert!(cursor.skip(usize::MAX).is_none());
        assert!(cursor.skip(2).is_none());
        assert_eq!(cursor.skip(1).unwrap().remaining(), 0);
    }

    #[test]
    fn test_checked_accessors() {
        let buf = [0xde, 0xad, 0xbe, 0xef];
        let cursor = Cursor::new(&buf);
        let window = cursor.window(4).unwrap();
        assert_eq!(window.u8_at(0), 0xde);
        assert_eq!(window.be_u16_at(2), 0xbeef);
        assert_eq!(window.array_at::<2>(2), [0xbe, 0xef]);
    }
}

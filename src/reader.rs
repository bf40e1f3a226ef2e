//! Low-level read primitives shared by all decoders.
//!
//! [`ByteReader`] is a cursor over an immutable byte slice. Positioned reads
//! (`read_at`, `read_many_at`, ...) never touch the cursor; the un-positioned
//! variants read at the cursor and advance it. Every read either returns
//! exactly the bytes it promises or fails with [`Error::OutOfBounds`].

use std::io::SeekFrom;

use crate::{Error, Result};

/// Byte order of multi-byte fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Interpret a byte-order marker read as the two raw bytes in file order.
    ///
    /// `0xFFFE` is little-endian, `0xFEFF` big-endian; anything else fails
    /// with [`Error::InvalidByteOrder`].
    pub fn from_marker(marker: u16) -> Result<Self> {
        match marker {
            0xFFFE => Ok(ByteOrder::Little),
            0xFEFF => Ok(ByteOrder::Big),
            other => Err(Error::InvalidByteOrder(other)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ByteOrder::Little => "little",
            ByteOrder::Big => "big",
        }
    }
}

/// A fixed-width value that can be decoded from bytes in either order.
pub trait Primitive: Sized + Copy {
    const SIZE: usize;

    /// Decode from exactly `Self::SIZE` bytes.
    fn from_bytes(bytes: &[u8], order: ByteOrder) -> Self;
}

macro_rules! primitive {
    ($($t:ty),*) => {$(
        impl Primitive for $t {
            const SIZE: usize = std::mem::size_of::<$t>();

            #[inline]
            fn from_bytes(bytes: &[u8], order: ByteOrder) -> Self {
                let mut b = [0u8; std::mem::size_of::<$t>()];
                b.copy_from_slice(&bytes[..Self::SIZE]);
                match order {
                    ByteOrder::Little => <$t>::from_le_bytes(b),
                    ByteOrder::Big => <$t>::from_be_bytes(b),
                }
            }
        }
    )*};
}

primitive!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Positioned, typed reads over a borrowed byte buffer.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    order: ByteOrder,
    pos: u64,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8], order: ByteOrder) -> Self {
        Self {
            data,
            order,
            pos: 0,
        }
    }

    /// The whole underlying buffer.
    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    #[inline]
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// A copy of this reader using a different byte order.
    pub fn with_order(&self, order: ByteOrder) -> Self {
        Self {
            data: self.data,
            order,
            pos: self.pos,
        }
    }

    /// Borrow `len` bytes at `offset`.
    pub fn bytes_at(&self, offset: u64, len: usize) -> Result<&'a [u8]> {
        let oob = || Error::OutOfBounds {
            offset,
            len,
            size: self.data.len(),
        };
        let start = usize::try_from(offset).map_err(|_| oob())?;
        let end = start.checked_add(len).ok_or_else(oob)?;
        self.data.get(start..end).ok_or_else(oob)
    }

    /// Read exactly `N` bytes at `offset` into a fixed-size array.
    pub fn array_at<const N: usize>(&self, offset: u64) -> Result<[u8; N]> {
        let mut b = [0u8; N];
        b.copy_from_slice(self.bytes_at(offset, N)?);
        Ok(b)
    }

    /// Read one value at `offset` without moving the cursor.
    #[inline]
    pub fn read_at<T: Primitive>(&self, offset: u64) -> Result<T> {
        Ok(T::from_bytes(self.bytes_at(offset, T::SIZE)?, self.order))
    }

    /// Read `count` consecutive values at `offset` without moving the cursor.
    pub fn read_many_at<T: Primitive>(&self, offset: u64, count: usize) -> Result<Vec<T>> {
        let len = count.checked_mul(T::SIZE).ok_or(Error::OutOfBounds {
            offset,
            len: usize::MAX,
            size: self.data.len(),
        })?;
        let bytes = self.bytes_at(offset, len)?;
        Ok(bytes
            .chunks_exact(T::SIZE)
            .map(|c| T::from_bytes(c, self.order))
            .collect())
    }

    /// Read one value at the cursor and advance past it.
    pub fn read<T: Primitive>(&mut self) -> Result<T> {
        let v = self.read_at(self.pos)?;
        self.pos += T::SIZE as u64;
        Ok(v)
    }

    /// Read `count` values at the cursor and advance past them.
    pub fn read_many<T: Primitive>(&mut self, count: usize) -> Result<Vec<T>> {
        let v = self.read_many_at(self.pos, count)?;
        self.pos += (count * T::SIZE) as u64;
        Ok(v)
    }

    /// Read `len` raw bytes at the cursor and advance past them.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let b = self.bytes_at(self.pos, len)?;
        self.pos += len as u64;
        Ok(b)
    }

    /// Move the cursor. Seeking past the end is allowed; the next read fails.
    pub fn seek(&mut self, to: SeekFrom) -> Result<u64> {
        let target = match to {
            SeekFrom::Start(p) => Some(p),
            SeekFrom::Current(d) => self.pos.checked_add_signed(d),
            SeekFrom::End(d) => (self.data.len() as u64).checked_add_signed(d),
        };
        self.pos = target.ok_or_else(|| Error::decode(self.data, self.pos, "seek before start"))?;
        Ok(self.pos)
    }

    /// Current cursor position.
    #[inline]
    pub fn tell(&self) -> u64 {
        self.pos
    }

    /// Verify that the bytes at `offset` match `expected`.
    ///
    /// Returns [`Error::BadMagic`] naming both values on mismatch.
    pub fn expect_magic(&self, offset: u64, expected: &[u8]) -> Result<()> {
        let got = self.bytes_at(offset, expected.len())?;
        if got != expected {
            return Err(Error::BadMagic {
                offset,
                expected: expected.to_vec(),
                actual: got.to_vec(),
            });
        }
        Ok(())
    }

    /// Extract a null-terminated string at `offset`.
    pub fn null_string_at(&self, offset: u64) -> Result<String> {
        let slice = usize::try_from(offset)
            .ok()
            .and_then(|o| self.data.get(o..))
            .ok_or(Error::OutOfBounds {
                offset,
                len: 1,
                size: self.data.len(),
            })?;
        let end = slice
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::decode(self.data, offset, "unterminated string"))?;
        decode_shift_jis(&slice[..end], offset)
    }

    /// Read a string stored as a `u16` byte count followed by its bytes.
    ///
    /// `offset` is the position of the length prefix.
    pub fn prefixed_string_at(&self, offset: u64) -> Result<String> {
        let len: u16 = self.read_at(offset)?;
        let bytes = self.bytes_at(offset + 2, len as usize)?;
        decode_shift_jis(bytes, offset)
    }
}

/// Decode Shift-JIS text; failure reports the offset and first bytes.
pub(crate) fn decode_shift_jis(bytes: &[u8], offset: u64) -> Result<String> {
    encoding_rs::SHIFT_JIS
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|s| s.into_owned())
        .ok_or_else(|| Error::StringDecode {
            offset,
            bytes: bytes.iter().take(16).copied().collect(),
        })
}

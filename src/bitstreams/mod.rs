use std::{borrow::Cow, io::Read};

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::error::{CodecError, Result};
use crate::utils::encodings::{UniversalCode, UnaryCode, GammaCode, DeltaCode, ZetaCode, NibbleCode};

/// Longest unary run a [`BinaryReader`] accepts before giving up with
/// [`CodecError::CodeTooLong`].
pub const DEFAULT_MAX_UNARY_LENGTH: u64 = 1 << 20;

/// Reads `len` (<= 64) bits starting at bit `index`, most significant first.
///
/// The caller guarantees that `[index, index + len)` lies inside `bytes`.
#[inline(always)]
fn fetch_bits(bytes: &[u8], mut index: u64, len: u64) -> u64 {
    debug_assert!(len <= 64);

    let mut x = 0u64;
    let mut remaining = len;

    while remaining > 0 {
        let byte = bytes[(index >> 3) as usize];
        let free = 8 - (index & 7);
        let take = remaining.min(free);
        let gap = free - take;

        x = (x << take) | ((byte >> gap) as u64 & ((1 << take) - 1));

        index += take;
        remaining -= take;
    }

    x
}

/// Stores the low `len` (<= 64) bits of `x` starting at bit `index`, most significant first.
///
/// Bits that are not covered by the range are left untouched.
#[inline(always)]
fn store_bits(bytes: &mut [u8], mut index: u64, x: u64, len: u64) {
    debug_assert!(len <= 64);

    let mut remaining = len;

    while remaining > 0 {
        let byte = &mut bytes[(index >> 3) as usize];
        let free = 8 - (index & 7);
        let take = remaining.min(free);
        let gap = free - take;

        let chunk = ((x >> (remaining - take)) & ((1 << take) - 1)) as u8;
        let mask = (((1u16 << take) - 1) as u8) << gap;
        *byte = (*byte & !mask) | (chunk << gap);

        index += take;
        remaining -= take;
    }
}

/// Fixed-capacity byte storage addressed bit by bit.
///
/// Bit `i` is stored in byte `i / 8`, under the mask `0x80 >> (i % 8)`: the first
/// bit of the buffer is the most significant bit of the first byte. The capacity
/// is always `8 * len()` bits and never changes.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug, Default)]
pub struct BitBuffer {
    bytes: Box<[u8]>,
}

impl BitBuffer {
    /// Creates a zeroed buffer of `len` bytes.
    pub fn new(len: usize) -> Self {
        Self { bytes: vec![0u8; len].into_boxed_slice() }
    }

    /// Creates a zeroed buffer large enough to hold `bits` bits.
    pub fn with_capacity_bits(bits: u64) -> Self {
        Self::new(((bits + 7) >> 3) as usize)
    }

    pub fn from_bytes(bytes: impl Into<Box<[u8]>>) -> Self {
        Self { bytes: bytes.into() }
    }

    #[inline(always)]
    pub fn capacity_bits(&self) -> u64 {
        (self.bytes.len() as u64) << 3
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Box<[u8]> {
        self.bytes
    }

    #[inline(always)]
    fn check_index(&self, index: u64) -> Result<()> {
        if index >= self.capacity_bits() {
            return Err(CodecError::IndexOutOfBounds { index, capacity: self.capacity_bits() });
        }
        Ok(())
    }

    /// Returns the bit at position `index`.
    pub fn read_bit_at(&self, index: u64) -> Result<bool> {
        self.check_index(index)?;
        Ok(fetch_bits(&self.bytes, index, 1) == 1)
    }

    /// Sets the bit at position `index`.
    pub fn write_bit_at(&mut self, index: u64, bit: bool) -> Result<()> {
        self.check_index(index)?;
        store_bits(&mut self.bytes, index, bit as u64, 1);
        Ok(())
    }
}

impl From<Vec<u8>> for BitBuffer {
    fn from(value: Vec<u8>) -> Self {
        Self::from_bytes(value)
    }
}

impl AsRef<[u8]> for BitBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Sequential bit cursor writing into a borrowed [`BitBuffer`].
///
/// The buffer is never resized: a write that does not fit fails with
/// [`CodecError::BufferOverflow`] and leaves both the buffer and the cursor as they were.
#[derive(Debug)]
pub struct BinaryWriter<'a> {
    os: &'a mut BitBuffer,
    /// Current bit position in the buffer
    position: u64,
    /// The number of bits written so far
    written_bits: u64,
    /// Highest position ever reached by the cursor
    high_water: u64,
}

impl<'a> BinaryWriter<'a> {
    pub fn new(os: &'a mut BitBuffer) -> Self {
        BinaryWriter {
            os,
            position: 0,
            written_bits: 0,
            high_water: 0,
        }
    }

    #[inline(always)]
    pub fn position(&self) -> u64 {
        self.position
    }

    #[inline(always)]
    pub fn written_bits(&self) -> u64 {
        self.written_bits
    }

    /// Resets the written bits counter, e.g. to `0` after a [`Self::flush()`].
    pub fn set_written_bits(&mut self, written_bits: u64) {
        self.written_bits = written_bits;
    }

    #[inline(always)]
    pub fn capacity_bits(&self) -> u64 {
        self.os.capacity_bits()
    }

    #[inline(always)]
    pub fn remaining_bits(&self) -> u64 {
        self.os.capacity_bits() - self.position
    }

    /// Moves the cursor to bit `pos`; `pos` may be equal to the capacity.
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        if pos > self.os.capacity_bits() {
            return Err(CodecError::IndexOutOfBounds { index: pos, capacity: self.os.capacity_bits() });
        }

        debug!(from = self.position, to = pos, "writer seek");
        self.position = pos;
        Ok(())
    }

    /// Fails with [`CodecError::BufferOverflow`] unless `len` more bits fit in the buffer.
    #[inline(always)]
    pub fn reserve(&self, len: u64) -> Result<()> {
        let available = self.remaining_bits();
        if len > available {
            return Err(CodecError::BufferOverflow {
                position: self.position,
                requested: len,
                available,
            });
        }
        Ok(())
    }

    #[inline(always)]
    fn advance(&mut self, len: u64) {
        self.position += len;
        self.written_bits += len;
        self.high_water = self.high_water.max(self.position);
    }

    /// Writes a single bit.
    #[inline(always)]
    pub fn write_bit(&mut self, bit: bool) -> Result<u64> {
        self.reserve(1)?;
        store_bits(&mut self.os.bytes, self.position, bit as u64, 1);
        self.advance(1);
        Ok(1)
    }

    /// Writes the low `len` bits of `x`, most significant first.
    ///
    /// Fails with [`CodecError::InvalidArgument`] if `len > 64` or if `x` needs more than `len` bits.
    #[inline(always)]
    pub fn write_bits(&mut self, x: u64, len: u64) -> Result<u64> {
        if len > 64 {
            return Err(CodecError::InvalidArgument(format!("cannot write {} bits of a 64-bit integer", len)));
        }
        if len < 64 && x >> len != 0 {
            return Err(CodecError::InvalidArgument(format!("{} does not fit in {} bits", x, len)));
        }
        self.reserve(len)?;

        store_bits(&mut self.os.bytes, self.position, x, len);
        self.advance(len);
        Ok(len)
    }

    /// Writes up to 128 bits; used by codes whose fields may exceed a word.
    #[inline(always)]
    pub(crate) fn write_bits_wide(&mut self, x: u128, len: u64) -> Result<u64> {
        if len <= 64 {
            return self.write_bits(x as u64, len);
        }

        self.reserve(len)?;
        self.write_bits((x >> 64) as u64, len - 64)?;
        self.write_bits(x as u64, 64)?;
        Ok(len)
    }

    /// Writes `len` zero bits.
    pub(crate) fn write_zeros(&mut self, len: u64) -> Result<u64> {
        self.reserve(len)?;

        let mut remaining = len;
        while remaining > 0 {
            let chunk = remaining.min(64);
            store_bits(&mut self.os.bytes, self.position, 0, chunk);
            self.advance(chunk);
            remaining -= chunk;
        }
        Ok(len)
    }

    /// Writes `len` bits taken from `bits`: the first bit is bit 7 of `bits[0]`,
    /// the ninth is bit 7 of `bits[1]` and so on.
    pub fn write_bytes(&mut self, bits: &[u8], len: u64) -> Result<u64> {
        if len > (bits.len() as u64) << 3 {
            return Err(CodecError::InvalidArgument(
                format!("cannot write {} bits out of {} bytes", len, bits.len())
            ));
        }
        self.reserve(len)?;

        let full = (len >> 3) as usize;
        for &b in &bits[..full] {
            self.write_bits(b as u64, 8)?;
        }

        let residual = len & 7;
        if residual != 0 {
            self.write_bits((bits[full] >> (8 - residual)) as u64, residual)?;
        }

        Ok(len)
    }

    /// Pads with zeroes up to the next byte boundary and returns the number of padding bits.
    pub fn align(&mut self) -> Result<u64> {
        let residual = self.position & 7;
        if residual == 0 {
            return Ok(0);
        }
        self.write_zeros(8 - residual)
    }

    /// Aligns the stream and returns the number of bytes holding written data.
    ///
    /// Calling it again without writing in between changes nothing.
    pub fn flush(&mut self) -> Result<usize> {
        let padding = self.align()?;
        let used = ((self.high_water + 7) >> 3) as usize;

        debug!(padding, used_bytes = used, written_bits = self.written_bits, "flush");

        Ok(used)
    }

    #[inline(always)]
    pub fn write_unary(&mut self, x: u64) -> Result<u64> {
        UnaryCode::write_next(self, x, None)
    }

    #[inline(always)]
    pub fn write_gamma(&mut self, x: u64) -> Result<u64> {
        GammaCode::write_next(self, x, None)
    }

    #[inline(always)]
    pub fn write_delta(&mut self, x: u64) -> Result<u64> {
        DeltaCode::write_next(self, x, None)
    }

    #[inline(always)]
    pub fn write_zeta(&mut self, x: u64, k: u64) -> Result<u64> {
        ZetaCode::write_next(self, x, Some(k))
    }

    #[inline(always)]
    pub fn write_nibble(&mut self, x: u64) -> Result<u64> {
        NibbleCode::write_next(self, x, None)
    }
}

/// Sequential bit cursor over a byte source.
///
/// The source is either borrowed (a slice or a [`BitBuffer`]) or owned (drained from a
/// [`Read`] implementation). Reads never mutate the source, so any number of readers
/// may share one finalized buffer.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct BinaryReader<'a> {
    is: Cow<'a, [u8]>,
    /// Number of readable bits
    bit_len: u64,
    /// Current bit position
    position: u64,
    /// Number of bits consumed since creation or last seek
    read_bits: u64,
    max_unary_length: u64,
}

impl<'a> BinaryReader<'a> {
    pub fn new(input_stream: &'a [u8]) -> Self {
        Self::from_cow(Cow::Borrowed(input_stream))
    }

    pub fn from_buffer(buffer: &'a BitBuffer) -> Self {
        Self::new(buffer.as_bytes())
    }

    fn from_cow(is: Cow<'a, [u8]>) -> Self {
        BinaryReader {
            bit_len: (is.len() as u64) << 3,
            is,
            position: 0,
            read_bits: 0,
            max_unary_length: DEFAULT_MAX_UNARY_LENGTH,
        }
    }

    /// Drains `input_stream` and reads from the collected bytes.
    pub fn from_stream<R: Read>(mut input_stream: R) -> std::io::Result<BinaryReader<'static>> {
        let mut bytes = Vec::new();
        input_stream.read_to_end(&mut bytes)?;

        debug!(bytes = bytes.len(), "reader drained stream");

        Ok(BinaryReader::from_cow(Cow::Owned(bytes)))
    }

    /// Restricts the readable bits to the first `bit_len`, e.g. to exclude padding.
    pub fn with_bit_len(mut self, bit_len: u64) -> Result<Self> {
        let capacity = (self.is.len() as u64) << 3;
        if bit_len > capacity {
            return Err(CodecError::IndexOutOfBounds { index: bit_len, capacity });
        }

        self.bit_len = bit_len;
        self.position = self.position.min(bit_len);
        Ok(self)
    }

    /// Sets the longest unary run accepted by [`Self::read_unary()`].
    pub fn set_max_unary_length(&mut self, max_unary_length: u64) {
        self.max_unary_length = max_unary_length;
    }

    #[inline(always)]
    pub fn max_unary_length(&self) -> u64 {
        self.max_unary_length
    }

    #[inline(always)]
    pub fn position(&self) -> u64 {
        self.position
    }

    #[inline(always)]
    pub fn read_bits_count(&self) -> u64 {
        self.read_bits
    }

    #[inline(always)]
    pub fn bits_available(&self) -> u64 {
        self.bit_len - self.position
    }

    #[inline(always)]
    pub fn bit_len(&self) -> u64 {
        self.bit_len
    }

    /// Moves the cursor to bit `pos`; `pos` may be equal to the stream length.
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        if pos > self.bit_len {
            return Err(CodecError::IndexOutOfBounds { index: pos, capacity: self.bit_len });
        }

        self.position = pos;
        self.read_bits = 0;
        Ok(())
    }

    #[inline(always)]
    fn ensure(&self, len: u64) -> Result<()> {
        let available = self.bits_available();
        if len > available {
            return Err(CodecError::EndOfStream {
                position: self.position,
                requested: len,
                available,
            });
        }
        Ok(())
    }

    #[inline(always)]
    fn consume(&mut self, len: u64) {
        self.position += len;
        self.read_bits += len;
    }

    /// Skips `len` bits.
    pub fn skip(&mut self, len: u64) -> Result<u64> {
        self.ensure(len)?;
        self.consume(len);
        Ok(len)
    }

    /// Skips to the next byte boundary and returns the number of skipped bits.
    pub fn align(&mut self) -> Result<u64> {
        let residual = self.position & 7;
        if residual == 0 {
            return Ok(0);
        }
        self.skip(8 - residual)
    }

    #[inline(always)]
    pub fn read_bit(&mut self) -> Result<bool> {
        self.ensure(1)?;
        let bit = fetch_bits(&self.is, self.position, 1) == 1;
        self.consume(1);
        Ok(bit)
    }

    /// Reads `len` (<= 64) bits, most significant first.
    #[inline(always)]
    pub fn read_bits(&mut self, len: u64) -> Result<u64> {
        if len > 64 {
            return Err(CodecError::InvalidArgument(format!("cannot read {} bits into a 64-bit integer", len)));
        }
        self.ensure(len)?;

        let x = fetch_bits(&self.is, self.position, len);
        self.consume(len);
        Ok(x)
    }

    #[inline(always)]
    pub(crate) fn read_bits_wide(&mut self, len: u64) -> Result<u128> {
        if len <= 64 {
            return Ok(self.read_bits(len)? as u128);
        }
        if len > 128 {
            return Err(CodecError::InvalidArgument(format!("cannot read {} bits into a 128-bit integer", len)));
        }
        self.ensure(len)?;

        let high = self.read_bits(len - 64)? as u128;
        let low = self.read_bits(64)? as u128;
        Ok(high << 64 | low)
    }

    /// Reads `len` bits into a byte vector, in the layout used by [`BinaryWriter::write_bytes()`].
    pub fn read_bytes(&mut self, len: u64) -> Result<Vec<u8>> {
        self.ensure(len)?;

        let mut bytes = Vec::with_capacity(((len + 7) >> 3) as usize);
        for _ in 0..len >> 3 {
            bytes.push(self.read_bits(8)? as u8);
        }

        let residual = len & 7;
        if residual != 0 {
            bytes.push((self.read_bits(residual)? << (8 - residual)) as u8);
        }

        Ok(bytes)
    }

    /// Counts the zeroes up to the next one and consumes them together with the one.
    ///
    /// Scans a byte at a time. Runs longer than the configured maximum fail with
    /// [`CodecError::CodeTooLong`]; a stream ending before the one fails with
    /// [`CodecError::EndOfStream`], and in both cases the cursor does not move.
    pub(crate) fn scan_unary(&mut self) -> Result<u64> {
        let start = self.position;
        let mut pos = start;

        loop {
            if pos >= self.bit_len {
                return Err(CodecError::EndOfStream {
                    position: start,
                    requested: pos - start + 1,
                    available: self.bit_len - start,
                });
            }

            let offset = pos & 7;
            let in_byte = (8 - offset).min(self.bit_len - pos);
            let byte = self.is[(pos >> 3) as usize] << offset;
            let zeros = (byte.leading_zeros() as u64).min(in_byte);

            if pos + zeros - start > self.max_unary_length {
                return Err(CodecError::CodeTooLong { position: start, limit: self.max_unary_length });
            }

            if zeros < in_byte {
                let x = pos + zeros - start;
                self.consume(x + 1);
                return Ok(x);
            }

            pos += in_byte;
        }
    }

    #[inline(always)]
    pub fn read_unary(&mut self) -> Result<u64> {
        UnaryCode::read_next(self, None)
    }

    #[inline(always)]
    pub fn read_gamma(&mut self) -> Result<u64> {
        GammaCode::read_next(self, None)
    }

    #[inline(always)]
    pub fn read_delta(&mut self) -> Result<u64> {
        DeltaCode::read_next(self, None)
    }

    #[inline(always)]
    pub fn read_zeta(&mut self, k: u64) -> Result<u64> {
        ZetaCode::read_next(self, Some(k))
    }

    #[inline(always)]
    pub fn read_nibble(&mut self) -> Result<u64> {
        NibbleCode::read_next(self, None)
    }
}

#[cfg(test)]
mod tests;

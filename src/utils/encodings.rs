use crate::bitstreams::{BinaryReader, BinaryWriter};
use crate::error::{CodecError, Result};
use crate::utils::EncodingType;

/// A stateless code for natural numbers, working on top of the bit streams.
///
/// `zk` is the shrinking parameter of the zeta codes and is ignored by every other code.
/// Writers return the number of bits written. A write that does not fit in the
/// buffer fails before touching it, since [`UniversalCode::code_len()`] is checked first.
pub trait UniversalCode {
    fn read_next(reader: &mut BinaryReader<'_>, zk: Option<u64>) -> Result<u64>;
    fn write_next(writer: &mut BinaryWriter<'_>, x: u64, zk: Option<u64>) -> Result<u64>;
    /// The length in bits of the code word of `x`.
    fn code_len(x: u64, zk: Option<u64>) -> Result<u64>;
    fn to_encoding_type() -> EncodingType;
}

/// Position of the most significant bit of `x`, which must be non-zero.
#[inline(always)]
fn msb(x: u64) -> u64 {
    (u64::BITS - 1 - x.leading_zeros()) as u64
}

/// Shifts `x` from `[0, u64::MAX - 1]` to `[1, u64::MAX]`.
#[inline(always)]
fn successor(x: u64) -> Result<u64> {
    x.checked_add(1)
        .ok_or_else(|| CodecError::InvalidArgument(format!("{} is out of the codable range", x)))
}

#[inline(always)]
fn check_zeta_k(zk: Option<u64>) -> Result<u64> {
    match zk {
        Some(k) if (1..=64).contains(&k) => Ok(k),
        Some(k) => Err(CodecError::InvalidArgument(format!("zeta parameter must be in [1, 64], got {}", k))),
        None => Err(CodecError::InvalidArgument("zeta codes need a shrinking parameter".to_string())),
    }
}

/// `x` zeroes followed by a one.
pub struct UnaryCode;

impl UniversalCode for UnaryCode {
    #[inline(always)]
    fn read_next(reader: &mut BinaryReader<'_>, _zk: Option<u64>) -> Result<u64> {
        reader.scan_unary()
    }

    #[inline(always)]
    fn write_next(writer: &mut BinaryWriter<'_>, x: u64, zk: Option<u64>) -> Result<u64> {
        writer.reserve(Self::code_len(x, zk)?)?;

        writer.write_zeros(x)?;
        writer.write_bit(true)?;

        Ok(x + 1)
    }

    #[inline(always)]
    fn code_len(x: u64, _zk: Option<u64>) -> Result<u64> {
        successor(x)
    }

    #[inline(always)]
    fn to_encoding_type() -> EncodingType {
        EncodingType::UNARY
    }
}

/// Elias' gamma: the bit length of `x + 1` in unary, then `x + 1` without its leading one.
pub struct GammaCode;

impl UniversalCode for GammaCode {
    #[inline(always)]
    fn read_next(reader: &mut BinaryReader<'_>, _zk: Option<u64>) -> Result<u64> {
        let start = reader.position();
        let msb = UnaryCode::read_next(reader, None)?;
        if msb >= u64::BITS as u64 {
            return Err(CodecError::CodeTooLong { position: start, limit: u64::BITS as u64 - 1 });
        }

        Ok(((1 << msb) | reader.read_bits(msb)?) - 1)
    }

    #[inline(always)]
    fn write_next(writer: &mut BinaryWriter<'_>, x: u64, zk: Option<u64>) -> Result<u64> {
        writer.reserve(Self::code_len(x, zk)?)?;

        let x = x + 1; // Code [0, +inf - 1]
        let msb = msb(x);

        Ok(UnaryCode::write_next(writer, msb, None)? + writer.write_bits(x & !(1 << msb), msb)?)
    }

    #[inline(always)]
    fn code_len(x: u64, _zk: Option<u64>) -> Result<u64> {
        Ok(2 * msb(successor(x)?) + 1)
    }

    #[inline(always)]
    fn to_encoding_type() -> EncodingType {
        EncodingType::GAMMA
    }
}

/// Elias' delta: like gamma, but the bit length is itself gamma-coded.
pub struct DeltaCode;

impl UniversalCode for DeltaCode {
    #[inline(always)]
    fn read_next(reader: &mut BinaryReader<'_>, _zk: Option<u64>) -> Result<u64> {
        let start = reader.position();
        let msb = GammaCode::read_next(reader, None)?;
        if msb >= u64::BITS as u64 {
            return Err(CodecError::CodeTooLong { position: start, limit: u64::BITS as u64 - 1 });
        }

        Ok(((1 << msb) | reader.read_bits(msb)?) - 1)
    }

    #[inline(always)]
    fn write_next(writer: &mut BinaryWriter<'_>, x: u64, zk: Option<u64>) -> Result<u64> {
        writer.reserve(Self::code_len(x, zk)?)?;

        let x = x + 1; // Code [0, +inf - 1]
        let msb = msb(x);

        Ok(GammaCode::write_next(writer, msb, None)? + writer.write_bits(x & !(1 << msb), msb)?)
    }

    #[inline(always)]
    fn code_len(x: u64, _zk: Option<u64>) -> Result<u64> {
        let msb = msb(successor(x)?);
        Ok(GammaCode::code_len(msb, None)? + msb)
    }

    #[inline(always)]
    fn to_encoding_type() -> EncodingType {
        EncodingType::DELTA
    }
}

/// Boldi and Vigna's zeta codes with shrinking parameter `k`.
///
/// The value `v = x + 1` falls in the block `[2^(hk), 2^((h+1)k))` with `h = msb(v) / k`;
/// `h` is written in unary and `v` within its block in minimal binary. Let
/// `left = 2^(hk)` and `z = hk + k`: a value with `v - left < left` takes `z - 1`
/// bits and is written as `v - left`, any other takes `z` bits and is written as `v`.
/// Zeta(1) is exactly gamma.
pub struct ZetaCode;

impl UniversalCode for ZetaCode {
    #[inline(always)]
    fn read_next(reader: &mut BinaryReader<'_>, zk: Option<u64>) -> Result<u64> {
        let zk = check_zeta_k(zk)?;
        let start = reader.position();

        let h = UnaryCode::read_next(reader, None)?;
        let hk = match h.checked_mul(zk) {
            Some(hk) if hk < u64::BITS as u64 => hk,
            _ => return Err(CodecError::CodeTooLong { position: start, limit: (u64::BITS as u64 - 1) / zk }),
        };

        let left = 1u128 << hk;
        let m = reader.read_bits_wide(hk + zk - 1)?;
        let v = if m < left { m + left } else { (m << 1) | reader.read_bit()? as u128 };

        if v > u64::MAX as u128 {
            return Err(CodecError::CodeTooLong { position: start, limit: u64::BITS as u64 });
        }

        Ok(v as u64 - 1)
    }

    #[inline(always)]
    fn write_next(writer: &mut BinaryWriter<'_>, x: u64, zk: Option<u64>) -> Result<u64> {
        writer.reserve(Self::code_len(x, zk)?)?;
        let zk = check_zeta_k(zk)?;

        let x = x as u128 + 1;
        let h = msb(x as u64) / zk;
        let hk = h * zk;
        let unary = UnaryCode::write_next(writer, h, None)?;
        let left = 1u128 << hk;

        Ok(unary +
            if x - left < left
                {writer.write_bits_wide(x - left, hk + zk - 1)?}
            else
                {writer.write_bits_wide(x, hk + zk)?})
    }

    #[inline(always)]
    fn code_len(x: u64, zk: Option<u64>) -> Result<u64> {
        let zk = check_zeta_k(zk)?;
        let x = successor(x)?;
        let h = msb(x) / zk;
        let hk = h * zk;
        let left = 1u64 << hk;

        Ok(h + 1 + if x - left < left {hk + zk - 1} else {hk + zk})
    }

    #[inline(always)]
    fn to_encoding_type() -> EncodingType {
        EncodingType::ZETA
    }
}

/// Variable-length nibble coding: the binary representation of `x`, left-padded to a
/// multiple of three bits, split in 3-bit blocks, each one preceded by a flag bit that is
/// one only on the last block.
pub struct NibbleCode;

impl UniversalCode for NibbleCode {
    #[inline(always)]
    fn read_next(reader: &mut BinaryReader<'_>, _zk: Option<u64>) -> Result<u64> {
        let start = reader.position();
        let mut x = 0u64;

        loop {
            if x >> (u64::BITS - 3) != 0 {
                return Err(CodecError::CodeTooLong { position: start, limit: u64::BITS as u64 });
            }

            let last = reader.read_bit()?;
            x = x << 3 | reader.read_bits(3)?;

            if last {
                return Ok(x);
            }
        }
    }

    #[inline(always)]
    fn write_next(writer: &mut BinaryWriter<'_>, x: u64, zk: Option<u64>) -> Result<u64> {
        let len = Self::code_len(x, zk)?;
        writer.reserve(len)?;

        let mut h = len / 4 - 1;
        loop {
            writer.write_bit(h == 0)?;
            writer.write_bits(x >> (h * 3) & 7, 3)?;

            if h == 0 {
                break;
            }
            h -= 1;
        }

        Ok(len)
    }

    #[inline(always)]
    fn code_len(x: u64, _zk: Option<u64>) -> Result<u64> {
        let msb = if x == 0 { 0 } else { msb(x) };
        Ok((msb / 3 + 1) << 2)
    }

    #[inline(always)]
    fn to_encoding_type() -> EncodingType {
        EncodingType::NIBBLE
    }
}

/// Writes `x` with the code selected at runtime by `coding`.
pub fn write_with(coding: EncodingType, writer: &mut BinaryWriter<'_>, x: u64, zk: Option<u64>) -> Result<u64> {
    match coding {
        EncodingType::UNARY => UnaryCode::write_next(writer, x, zk),
        EncodingType::GAMMA => GammaCode::write_next(writer, x, zk),
        EncodingType::DELTA => DeltaCode::write_next(writer, x, zk),
        EncodingType::ZETA => ZetaCode::write_next(writer, x, zk),
        EncodingType::NIBBLE => NibbleCode::write_next(writer, x, zk),
    }
}

/// Reads a value written by [`write_with`] with the same `coding` and `zk`.
pub fn read_with(coding: EncodingType, reader: &mut BinaryReader<'_>, zk: Option<u64>) -> Result<u64> {
    match coding {
        EncodingType::UNARY => UnaryCode::read_next(reader, zk),
        EncodingType::GAMMA => GammaCode::read_next(reader, zk),
        EncodingType::DELTA => DeltaCode::read_next(reader, zk),
        EncodingType::ZETA => ZetaCode::read_next(reader, zk),
        EncodingType::NIBBLE => NibbleCode::read_next(reader, zk),
    }
}

/// The length of the code word of `x` in the code selected by `coding`.
pub fn len_with(coding: EncodingType, x: u64, zk: Option<u64>) -> Result<u64> {
    match coding {
        EncodingType::UNARY => UnaryCode::code_len(x, zk),
        EncodingType::GAMMA => GammaCode::code_len(x, zk),
        EncodingType::DELTA => DeltaCode::code_len(x, zk),
        EncodingType::ZETA => ZetaCode::code_len(x, zk),
        EncodingType::NIBBLE => NibbleCode::code_len(x, zk),
    }
}

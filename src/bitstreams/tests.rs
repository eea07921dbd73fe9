use std::fs;

use super::{BinaryWriter, BinaryReader, BitBuffer, DEFAULT_MAX_UNARY_LENGTH};
use crate::CodecError;

#[test]
fn test_bit_buffer_msb_first_layout() {
    let mut buffer = BitBuffer::new(2);

    buffer.write_bit_at(0, true).unwrap();
    buffer.write_bit_at(7, true).unwrap();
    buffer.write_bit_at(9, true).unwrap();

    assert_eq!(buffer.as_bytes(), &[0b1000_0001, 0b0100_0000]);
    assert!(buffer.read_bit_at(0).unwrap());
    assert!(!buffer.read_bit_at(1).unwrap());
    assert!(buffer.read_bit_at(9).unwrap());

    buffer.write_bit_at(0, false).unwrap();
    assert_eq!(buffer.as_bytes()[0], 0b0000_0001);
}

#[test]
fn test_bit_buffer_out_of_range() {
    let mut buffer = BitBuffer::new(1);

    assert_eq!(buffer.capacity_bits(), 8);
    assert_eq!(buffer.read_bit_at(8), Err(CodecError::IndexOutOfBounds { index: 8, capacity: 8 }));
    assert_eq!(buffer.write_bit_at(100, true), Err(CodecError::IndexOutOfBounds { index: 100, capacity: 8 }));
    assert!(BitBuffer::default().read_bit_at(0).is_err());
}

#[test]
fn test_bit_buffer_capacity_rounding() {
    assert_eq!(BitBuffer::with_capacity_bits(0).len(), 0);
    assert_eq!(BitBuffer::with_capacity_bits(1).len(), 1);
    assert_eq!(BitBuffer::with_capacity_bits(8).len(), 1);
    assert_eq!(BitBuffer::with_capacity_bits(9).capacity_bits(), 16);
}

#[test]
fn test_bit_buffer_conversions() {
    let buffer = BitBuffer::from(vec![0b0110_0000, 0xFF]);

    let bytes: &[u8] = buffer.as_ref();
    assert_eq!(buffer.capacity_bits(), 16);
    assert_eq!(bytes, &[0b0110_0000, 0xFF]);

    let mut binary_reader = BinaryReader::new(bytes);
    assert_eq!(binary_reader.bit_len(), 16);
    assert_eq!(binary_reader.read_unary().unwrap(), 1);

    let bytes = buffer.into_bytes();
    assert_eq!(&*bytes, &[0b0110_0000, 0xFF]);
}

#[test]
fn test_simple_integer_writing() {
    let mut buffer = BitBuffer::new(2);
    let mut writer = BinaryWriter::new(&mut buffer);

    writer.write_bits(5, 3).unwrap();
    writer.write_bits(10, 4).unwrap();
    writer.write_bits(5, 3).unwrap();
    writer.flush().unwrap();

    let mut binary_reader = BinaryReader::from_buffer(&buffer);

    assert_eq!(binary_reader.read_bits(3).unwrap(), 5);
    assert_eq!(binary_reader.read_bits(4).unwrap(), 10);
    assert_eq!(binary_reader.read_bits(3).unwrap(), 5);
    assert_eq!(buffer.as_bytes(), &[0b1011_0101, 0b0100_0000]);
}

#[test]
fn test_full_width_integers() {
    let mut buffer = BitBuffer::new(17);
    let mut writer = BinaryWriter::new(&mut buffer);

    writer.write_bit(true).unwrap();
    writer.write_bits(u64::MAX, 64).unwrap();
    writer.write_bits(0x0123_4567_89AB_CDEF, 64).unwrap();
    writer.write_bits(0, 0).unwrap();

    let mut binary_reader = BinaryReader::from_buffer(&buffer);

    assert!(binary_reader.read_bit().unwrap());
    assert_eq!(binary_reader.read_bits(64).unwrap(), u64::MAX);
    assert_eq!(binary_reader.read_bits(64).unwrap(), 0x0123_4567_89AB_CDEF);
    assert_eq!(binary_reader.read_bits(0).unwrap(), 0);
    assert_eq!(binary_reader.position(), 129);
}

#[test]
fn test_write_bits_invalid_arguments() {
    let mut buffer = BitBuffer::new(16);
    let mut writer = BinaryWriter::new(&mut buffer);

    assert!(matches!(writer.write_bits(8, 3), Err(CodecError::InvalidArgument(_))));
    assert!(matches!(writer.write_bits(0, 65), Err(CodecError::InvalidArgument(_))));
    assert!(matches!(writer.write_bits(1, 0), Err(CodecError::InvalidArgument(_))));
    assert_eq!(writer.position(), 0);
    assert_eq!(writer.written_bits(), 0);
}

#[test]
fn test_buffer_overflow_leaves_cursor() {
    let mut buffer = BitBuffer::new(1);
    let mut writer = BinaryWriter::new(&mut buffer);

    writer.write_bits(0b101, 3).unwrap();
    assert_eq!(
        writer.write_bits(0b111111, 6),
        Err(CodecError::BufferOverflow { position: 3, requested: 6, available: 5 })
    );
    assert_eq!(writer.position(), 3);

    writer.write_bits(0b11111, 5).unwrap();
    assert!(matches!(writer.write_bit(false), Err(CodecError::BufferOverflow { .. })));
    assert_eq!(writer.position(), 8);
    assert_eq!(buffer.as_bytes(), &[0b1011_1111]);
}

#[test]
fn test_flush_is_idempotent() {
    let mut buffer = BitBuffer::new(4);
    let mut writer = BinaryWriter::new(&mut buffer);

    writer.write_bits(0b1, 1).unwrap();
    assert_eq!(writer.flush().unwrap(), 1);
    assert_eq!(writer.position(), 8);
    assert_eq!(writer.flush().unwrap(), 1);
    assert_eq!(writer.position(), 8);
    assert_eq!(writer.align().unwrap(), 0);

    writer.write_bits(0b11, 2).unwrap();
    assert_eq!(writer.align().unwrap(), 6);
    assert_eq!(writer.written_bits(), 16);
    assert_eq!(buffer.as_bytes(), &[0b1000_0000, 0b1100_0000, 0, 0]);
}

#[test]
fn test_flush_pads_over_stale_bits() {
    let mut buffer = BitBuffer::from_bytes(vec![0xFF]);
    let mut writer = BinaryWriter::new(&mut buffer);

    writer.write_bits(0b10, 2).unwrap();
    writer.flush().unwrap();

    assert_eq!(buffer.as_bytes(), &[0b1000_0000]);
}

#[test]
fn test_write_and_read_bytes() {
    let mut buffer = BitBuffer::new(8);
    let mut writer = BinaryWriter::new(&mut buffer);

    writer.write_bit(true).unwrap();
    writer.write_bytes(&[0xAA, 0xBB, 0xCC, 0xDD], 32).unwrap();
    writer.write_bytes(&[0b1110_0000], 3).unwrap();
    assert!(matches!(writer.write_bytes(&[0xFF], 9), Err(CodecError::InvalidArgument(_))));

    let mut binary_reader = BinaryReader::from_buffer(&buffer);

    assert!(binary_reader.read_bit().unwrap());
    assert_eq!(binary_reader.read_bytes(32).unwrap(), vec![0xAA, 0xBB, 0xCC, 0xDD]);
    assert_eq!(binary_reader.read_bytes(3).unwrap(), vec![0b1110_0000]);
}

#[test]
fn test_end_of_stream() {
    let bytes = [0b1010_0000u8];
    let mut binary_reader = BinaryReader::new(&bytes);

    assert_eq!(binary_reader.read_bits(3).unwrap(), 0b101);
    assert_eq!(
        binary_reader.read_bits(6),
        Err(CodecError::EndOfStream { position: 3, requested: 6, available: 5 })
    );
    assert_eq!(binary_reader.position(), 3);
    assert_eq!(binary_reader.read_bits(5).unwrap(), 0);
    assert!(matches!(binary_reader.read_bit(), Err(CodecError::EndOfStream { .. })));
}

#[test]
fn test_with_bit_len_hides_padding() {
    let bytes = [0b1100_0000u8];
    let mut binary_reader = BinaryReader::new(&bytes).with_bit_len(2).unwrap();

    assert_eq!(binary_reader.bit_len(), 2);
    assert_eq!(binary_reader.bits_available(), 2);
    assert_eq!(binary_reader.read_bits(2).unwrap(), 0b11);
    assert!(binary_reader.read_bit().is_err());
    assert!(BinaryReader::new(&bytes).with_bit_len(9).is_err());
}

#[test]
fn test_reposition() {
    let mut buffer = BitBuffer::new(4);
    let mut writer = BinaryWriter::new(&mut buffer);

    writer.write_unary(10).unwrap();
    writer.write_unary(5).unwrap();
    writer.write_unary(5).unwrap();

    let mut binary_reader = BinaryReader::from_buffer(&buffer);

    binary_reader.seek(11).unwrap();
    assert_eq!(binary_reader.read_unary().unwrap(), 5);
    binary_reader.seek(17).unwrap();
    assert_eq!(binary_reader.read_unary().unwrap(), 5);
    binary_reader.seek(0).unwrap();
    assert_eq!(binary_reader.read_unary().unwrap(), 10);
    assert_eq!(binary_reader.read_bits_count(), 11);
}

#[test]
fn test_seek_past_end() {
    let bytes = [0u8; 2];
    let mut binary_reader = BinaryReader::new(&bytes);

    binary_reader.seek(16).unwrap();
    assert_eq!(binary_reader.bits_available(), 0);
    assert_eq!(binary_reader.seek(17), Err(CodecError::IndexOutOfBounds { index: 17, capacity: 16 }));
    assert_eq!(binary_reader.position(), 16);
}

#[test]
fn test_skip_and_align() {
    let bytes = [0b0001_0000u8, 0b1000_0000];
    let mut binary_reader = BinaryReader::new(&bytes);

    binary_reader.skip(3).unwrap();
    assert!(binary_reader.read_bit().unwrap());
    assert_eq!(binary_reader.align().unwrap(), 4);
    assert_eq!(binary_reader.align().unwrap(), 0);
    assert!(binary_reader.read_bit().unwrap());
    assert!(binary_reader.skip(8).is_err());
}

#[test]
fn test_written_bits_number_correctness() {
    let mut buffer = BitBuffer::new(4);
    let mut writer = BinaryWriter::new(&mut buffer);

    writer.write_unary(10).unwrap();
    writer.write_unary(5).unwrap();
    writer.write_unary(5).unwrap();

    assert_eq!(writer.written_bits(), 23);

    writer.set_written_bits(0);
    writer.write_unary(0).unwrap();
    assert_eq!(writer.written_bits(), 1);
    assert_eq!(writer.position(), 24);
}

#[test]
fn test_writer_seek_overwrites() {
    let mut buffer = BitBuffer::new(2);
    let mut writer = BinaryWriter::new(&mut buffer);

    writer.write_bits(0xFFFF, 16).unwrap();
    writer.seek(4).unwrap();
    writer.write_bits(0, 4).unwrap();
    assert!(writer.seek(17).is_err());
    assert_eq!(writer.flush().unwrap(), 2);

    assert_eq!(buffer.as_bytes(), &[0xF0, 0xFF]);
}

#[test]
fn test_reposition_over_64_bits() {
    let mut buffer = BitBuffer::new(16);
    let mut writer = BinaryWriter::new(&mut buffer);

    writer.write_unary(32).unwrap();
    writer.write_unary(30).unwrap();
    writer.write_unary(31).unwrap();
    writer.write_unary(31).unwrap();

    let mut binary_reader = BinaryReader::from_buffer(&buffer);

    binary_reader.seek(33).unwrap();
    assert_eq!(binary_reader.read_unary().unwrap(), 30);
    binary_reader.seek(64).unwrap();
    assert_eq!(binary_reader.read_unary().unwrap(), 31);
    binary_reader.seek(0).unwrap();
    assert_eq!(binary_reader.read_unary().unwrap(), 32);
    binary_reader.seek(96).unwrap();
    assert_eq!(binary_reader.read_unary().unwrap(), 31);
}

#[test]
fn test_readers_share_a_buffer() {
    let mut buffer = BitBuffer::new(8);
    let mut writer = BinaryWriter::new(&mut buffer);

    for x in 0..10 {
        writer.write_gamma(x).unwrap();
    }
    writer.flush().unwrap();

    let mut first = BinaryReader::from_buffer(&buffer);
    let mut second = first.clone();

    for x in 0..10 {
        assert_eq!(first.read_gamma().unwrap(), x);
    }
    for x in 0..10 {
        assert_eq!(second.read_gamma().unwrap(), x);
    }
}

#[test]
fn test_read_from_stream() {
    let mut buffer = BitBuffer::new(64);
    let mut writer = BinaryWriter::new(&mut buffer);

    for x in 0..100 {
        writer.write_zeta(x, 4).unwrap();
    }
    let used = writer.flush().unwrap();

    let path = std::env::temp_dir().join(format!("webgraph_codes_stream_{}", std::process::id()));
    fs::write(&path, &buffer.as_bytes()[..used]).unwrap();

    let mut binary_reader = BinaryReader::from_stream(fs::File::open(&path).unwrap()).unwrap();
    fs::remove_file(&path).unwrap();

    for x in 0..100 {
        assert_eq!(binary_reader.read_zeta(4).unwrap(), x);
    }
    assert!(binary_reader.read_zeta(4).is_err());
}

#[test]
fn test_max_unary_length() {
    let bytes = [0u8, 0b0001_0000];
    let mut binary_reader = BinaryReader::new(&bytes);

    assert_eq!(binary_reader.max_unary_length(), DEFAULT_MAX_UNARY_LENGTH);

    binary_reader.set_max_unary_length(10);
    assert_eq!(binary_reader.max_unary_length(), 10);
    assert_eq!(binary_reader.read_unary(), Err(CodecError::CodeTooLong { position: 0, limit: 10 }));
    assert_eq!(binary_reader.position(), 0);

    binary_reader.set_max_unary_length(11);
    assert_eq!(binary_reader.read_unary().unwrap(), 11);
}

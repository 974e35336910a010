//! Primitive data types of the Bedrock wire format and the cursor used to read and write them.
//!
//! Unlike the Java edition, fixed-width integers are little-endian and most lengths are
//! LEB128 varints. Signed varints are zigzag-encoded.

use core::str;

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Represents datatypes in errors
#[derive(Eq, PartialEq, Clone, Debug)]
pub enum DataType {
    UnsignedVarInt,
    VarInt,
    VarLong,
    String,
    Bytes,
    Nbt,
    Other(&'static str),
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::UnsignedVarInt => write!(f, "UnsignedVarInt"),
            DataType::VarInt => write!(f, "VarInt"),
            DataType::VarLong => write!(f, "VarLong"),
            DataType::String => write!(f, "String"),
            DataType::Bytes => write!(f, "Bytes"),
            DataType::Nbt => write!(f, "NBT"),
            DataType::Other(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Eq, PartialEq, Clone, Debug)]
pub enum ErrorReason {
    ValueTooLarge,
    ValueTooSmall,
    ValueEmpty,
    UnknownValue,
    NotEnoughData { needed: usize, remaining: usize },
    InvalidFormat(String),
}

impl std::fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorReason::ValueTooLarge => write!(f, "Value too large"),
            ErrorReason::ValueTooSmall => write!(f, "Value too small"),
            ErrorReason::ValueEmpty => write!(f, "Value empty"),
            ErrorReason::UnknownValue => write!(f, "Unknown value"),
            ErrorReason::NotEnoughData { needed, remaining } => write!(
                f,
                "Not enough data: needed {needed} bytes, {remaining} remaining"
            ),
            ErrorReason::InvalidFormat(reason) => write!(f, "Invalid format: {}", reason),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Encoding error for {0}: {1}")]
    Encoding(DataType, ErrorReason),

    #[error("Decoding error for {0}: {1}")]
    Decoding(DataType, ErrorReason),
}

/// A growable byte buffer with a read offset.
///
/// Writes always append to the end of the buffer, reads consume from `offset`. The same type is
/// used for both directions so that a decoder can be handed a buffer produced by an encoder.
#[derive(Default, Clone, Debug)]
pub struct BinaryStream {
    buffer: BytesMut,
    offset: usize,
}

impl BinaryStream {
    const SEGMENT_BITS: u64 = 0x7F; // 0111 1111
    const CONTINUE_BIT: u64 = 0x80; // 1000 0000

    /// An unsigned 32-bit varint never takes more than 5 bytes.
    const MAX_VARINT_BYTES: usize = 5;
    /// An unsigned 64-bit varint never takes more than 10 bytes.
    const MAX_VARLONG_BYTES: usize = 10;

    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stream positioned at the first byte of `data`.
    pub fn from_bytes<T: AsRef<[u8]>>(data: T) -> Self {
        Self {
            buffer: BytesMut::from(data.as_ref()),
            offset: 0,
        }
    }

    /// Whether every byte of the buffer has been read.
    pub fn feof(&self) -> bool {
        self.offset >= self.buffer.len()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns the whole buffer, regardless of the read offset.
    pub fn get_buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the stream and returns the written bytes.
    pub fn into_bytes(self) -> Bytes {
        self.buffer.freeze()
    }

    fn take(&mut self, len: usize, data_type: DataType) -> Result<&[u8], CodecError> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(CodecError::Decoding(
                data_type,
                ErrorReason::NotEnoughData {
                    needed: len,
                    remaining,
                },
            ));
        }

        let start = self.offset;
        self.offset += len;
        Ok(&self.buffer[start..start + len])
    }

    fn take_array<const N: usize>(&mut self, data_type: DataType) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, data_type)?);
        Ok(out)
    }

    /// Appends raw bytes.
    pub fn put(&mut self, bytes: &[u8]) {
        self.buffer.put_slice(bytes);
    }

    /// Reads exactly `len` raw bytes.
    pub fn get(&mut self, len: usize) -> Result<&[u8], CodecError> {
        self.take(len, DataType::Bytes)
    }

    pub fn put_byte(&mut self, value: u8) {
        self.buffer.put_u8(value);
    }

    pub fn get_byte(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1, DataType::Other("Byte"))?[0])
    }

    pub fn put_bool(&mut self, value: bool) {
        self.buffer.put_u8(value as u8);
    }

    pub fn get_bool(&mut self) -> Result<bool, CodecError> {
        Ok(self.take(1, DataType::Other("Bool"))?[0] != 0)
    }

    pub fn put_l_short(&mut self, value: i16) {
        self.buffer.put_i16_le(value);
    }

    pub fn get_l_short(&mut self) -> Result<i16, CodecError> {
        Ok(i16::from_le_bytes(self.take_array(DataType::Other("Short"))?))
    }

    pub fn put_l_ushort(&mut self, value: u16) {
        self.buffer.put_u16_le(value);
    }

    pub fn get_l_ushort(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.take_array(DataType::Other("Short"))?))
    }

    pub fn put_l_uint(&mut self, value: u32) {
        self.buffer.put_u32_le(value);
    }

    pub fn get_l_uint(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.take_array(DataType::Other("Int"))?))
    }

    pub fn put_l_long(&mut self, value: i64) {
        self.buffer.put_i64_le(value);
    }

    pub fn get_l_long(&mut self) -> Result<i64, CodecError> {
        Ok(i64::from_le_bytes(self.take_array(DataType::Other("Long"))?))
    }

    pub fn put_l_float(&mut self, value: f32) {
        self.buffer.put_f32_le(value);
    }

    pub fn get_l_float(&mut self) -> Result<f32, CodecError> {
        Ok(f32::from_le_bytes(self.take_array(DataType::Other("Float"))?))
    }

    pub fn put_l_double(&mut self, value: f64) {
        self.buffer.put_f64_le(value);
    }

    pub fn get_l_double(&mut self) -> Result<f64, CodecError> {
        Ok(f64::from_le_bytes(self.take_array(DataType::Other("Double"))?))
    }

    /// Writes `value` as LEB128. Used by every varint flavour.
    fn write_varint(&mut self, mut value: u64) {
        loop {
            let byte = (value & Self::SEGMENT_BITS) as u8;
            value >>= 7;

            if value == 0 {
                self.buffer.put_u8(byte);
                break;
            }
            self.buffer.put_u8(byte | Self::CONTINUE_BIT as u8);
        }
    }

    /// Reads a LEB128 value of at most `max_bytes` bytes.
    fn read_varint(&mut self, data_type: DataType, max_bytes: usize) -> Result<u64, CodecError> {
        let mut value: u64 = 0;

        for i in 0..max_bytes {
            let byte = self.take(1, data_type.clone())?[0] as u64;
            let shift = 7 * i;
            let segment = byte & Self::SEGMENT_BITS;

            // The tenth byte of a 64-bit varint only has room for a single bit.
            if shift == 63 && segment > 1 {
                return Err(CodecError::Decoding(data_type, ErrorReason::ValueTooLarge));
            }
            value |= segment << shift;

            if byte & Self::CONTINUE_BIT == 0 {
                return Ok(value);
            }
        }

        Err(CodecError::Decoding(data_type, ErrorReason::ValueTooLarge))
    }

    pub fn put_unsigned_var_int(&mut self, value: u32) {
        self.write_varint(value as u64);
    }

    pub fn get_unsigned_var_int(&mut self) -> Result<u32, CodecError> {
        let value = self.read_varint(DataType::UnsignedVarInt, Self::MAX_VARINT_BYTES)?;
        u32::try_from(value)
            .map_err(|_| CodecError::Decoding(DataType::UnsignedVarInt, ErrorReason::ValueTooLarge))
    }

    /// Writes a zigzag-encoded signed varint.
    pub fn put_var_int(&mut self, value: i32) {
        self.write_varint(((value << 1) ^ (value >> 31)) as u32 as u64);
    }

    pub fn get_var_int(&mut self) -> Result<i32, CodecError> {
        let raw = self.read_varint(DataType::VarInt, Self::MAX_VARINT_BYTES)?;
        let raw = u32::try_from(raw)
            .map_err(|_| CodecError::Decoding(DataType::VarInt, ErrorReason::ValueTooLarge))?;
        Ok(((raw >> 1) as i32) ^ -((raw & 1) as i32))
    }

    /// Writes a zigzag-encoded signed 64-bit varint.
    pub fn put_var_long(&mut self, value: i64) {
        self.write_varint(((value << 1) ^ (value >> 63)) as u64);
    }

    pub fn get_var_long(&mut self) -> Result<i64, CodecError> {
        let raw = self.read_varint(DataType::VarLong, Self::MAX_VARLONG_BYTES)?;
        Ok(((raw >> 1) as i64) ^ -((raw & 1) as i64))
    }

    /// Writes a byte string prefixed with its length as an unsigned varint.
    pub fn put_string_bytes(&mut self, bytes: &[u8]) {
        self.put_unsigned_var_int(bytes.len() as u32);
        self.put(bytes);
    }

    pub fn get_string_bytes(&mut self) -> Result<Bytes, CodecError> {
        let len = self.get_unsigned_var_int()? as usize;
        Ok(Bytes::copy_from_slice(self.take(len, DataType::String)?))
    }

    /// Writes a UTF-8 string prefixed with its size in bytes as an unsigned varint.
    pub fn put_string<T: AsRef<str>>(&mut self, string: T) {
        self.put_string_bytes(string.as_ref().as_bytes());
    }

    pub fn get_string(&mut self) -> Result<String, CodecError> {
        let len = self.get_unsigned_var_int()? as usize;
        let data = self.take(len, DataType::String)?;

        let utf8_str = str::from_utf8(data).map_err(|err| {
            CodecError::Decoding(
                DataType::String,
                ErrorReason::InvalidFormat(format!("String UTF-8 decoding error: {err}")),
            )
        })?;
        Ok(utf8_str.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsigned_varint_write() {
        let values: [(u32, &[u8]); 6] = [
            (0, &[0x00]),
            (1, &[0x01]),
            (127, &[0x7F]),
            (128, &[0x80, 0x01]),
            (300, &[0xAC, 0x02]),
            (u32::MAX, &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]),
        ];

        for (value, expected) in values {
            let mut stream = BinaryStream::new();
            stream.put_unsigned_var_int(value);
            assert_eq!(stream.get_buffer(), expected, "encoding {value}");

            let mut reader = BinaryStream::from_bytes(expected);
            assert_eq!(reader.get_unsigned_var_int().unwrap(), value);
            assert!(reader.feof());
        }
    }

    #[test]
    fn test_varint_zigzag() {
        let values: [(i32, &[u8]); 6] = [
            (0, &[0x00]),
            (-1, &[0x01]),
            (1, &[0x02]),
            (-2, &[0x03]),
            (i32::MAX, &[0xFE, 0xFF, 0xFF, 0xFF, 0x0F]),
            (i32::MIN, &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]),
        ];

        for (value, expected) in values {
            let mut stream = BinaryStream::new();
            stream.put_var_int(value);
            assert_eq!(stream.get_buffer(), expected, "encoding {value}");
            assert_eq!(BinaryStream::from_bytes(expected).get_var_int().unwrap(), value);
        }
    }

    #[test]
    fn test_varlong_extremes() {
        for value in [i64::MIN, -1, 0, 1, i64::MAX] {
            let mut stream = BinaryStream::new();
            stream.put_var_long(value);
            assert!(stream.len() <= 10);
            assert_eq!(stream.get_var_long().unwrap(), value);
        }
    }

    #[test]
    fn test_varint_too_long() {
        let mut stream = BinaryStream::from_bytes([0x80, 0x80, 0x80, 0x80, 0x80, 0x01]);
        assert_eq!(
            stream.get_unsigned_var_int(),
            Err(CodecError::Decoding(
                DataType::UnsignedVarInt,
                ErrorReason::ValueTooLarge
            ))
        );
    }

    #[test]
    fn test_varint_overflowing_u32() {
        // Five bytes, but the last one carries more than the 4 bits left in a u32.
        let mut stream = BinaryStream::from_bytes([0xFF, 0xFF, 0xFF, 0xFF, 0x1F]);
        assert!(matches!(
            stream.get_unsigned_var_int(),
            Err(CodecError::Decoding(_, ErrorReason::ValueTooLarge))
        ));
    }

    #[test]
    fn test_read_past_end() {
        let mut stream = BinaryStream::from_bytes([0x01]);
        assert!(matches!(
            stream.get_l_short(),
            Err(CodecError::Decoding(
                _,
                ErrorReason::NotEnoughData {
                    needed: 2,
                    remaining: 1
                }
            ))
        ));

        let mut empty = BinaryStream::new();
        assert!(empty.feof());
        assert!(empty.get_unsigned_var_int().is_err());
    }

    #[test]
    fn test_little_endian_layout() {
        let mut stream = BinaryStream::new();
        stream.put_l_short(0x0102);
        stream.put_l_uint(0x0A0B0C0D);
        assert_eq!(stream.get_buffer(), &[0x02, 0x01, 0x0D, 0x0C, 0x0B, 0x0A]);

        assert_eq!(stream.get_l_short().unwrap(), 0x0102);
        assert_eq!(stream.get_l_uint().unwrap(), 0x0A0B0C0D);
        assert!(stream.feof());
    }

    #[test]
    fn test_string() {
        let mut stream = BinaryStream::new();
        stream.put_string("minecraft:stone");
        stream.put_string("こんにちは");

        assert_eq!(stream.get_buffer()[0], 15);
        assert_eq!(stream.get_string().unwrap(), "minecraft:stone");
        assert_eq!(stream.get_string().unwrap(), "こんにちは");
    }

    #[test]
    fn test_string_invalid_utf8() {
        let mut stream = BinaryStream::from_bytes([0x03, 0xFF, 0xFF, 0xFF]);
        assert!(matches!(
            stream.get_string(),
            Err(CodecError::Decoding(DataType::String, ErrorReason::InvalidFormat(_)))
        ));
    }

    #[test]
    fn test_string_length_exceeds_data() {
        let mut stream = BinaryStream::from_bytes([0x0A, b'h', b'i']);
        assert!(matches!(
            stream.get_string_bytes(),
            Err(CodecError::Decoding(
                DataType::String,
                ErrorReason::NotEnoughData { .. }
            ))
        ));
    }
}

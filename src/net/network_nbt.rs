//! Network NBT, the little-endian dialect of NBT used on the Bedrock wire and by the vanilla
//! block state resource files.
//!
//! It differs from the Java edition in three ways: every fixed-width number is little-endian,
//! `Int`/`Long` payloads are zigzag varints and string/array/list lengths are varints.
//! The tag model itself is `hematite_nbt`'s [`Value`].

use std::collections::HashMap;

use nbt::Value;

use super::packet::data_types::{BinaryStream, CodecError, DataType, ErrorReason};

pub const TAG_END: u8 = 0;
pub const TAG_BYTE: u8 = 1;
pub const TAG_SHORT: u8 = 2;
pub const TAG_INT: u8 = 3;
pub const TAG_LONG: u8 = 4;
pub const TAG_FLOAT: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_BYTE_ARRAY: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_LIST: u8 = 9;
pub const TAG_COMPOUND: u8 = 10;
pub const TAG_INT_ARRAY: u8 = 11;
pub const TAG_LONG_ARRAY: u8 = 12;

/// Nesting limit for lists and compounds. Vanilla block states nest two or three levels, and
/// the decoder recurses once per level, so this must stay small enough for a 2 MiB thread stack.
const MAX_DEPTH: usize = 64;
const MAX_STRING_BYTES: usize = i16::MAX as usize;

fn invalid(reason: impl Into<String>) -> CodecError {
    CodecError::Decoding(DataType::Nbt, ErrorReason::InvalidFormat(reason.into()))
}

/// Returns the tag id `value` is written with.
pub fn tag_id(value: &Value) -> u8 {
    match value {
        Value::Byte(_) => TAG_BYTE,
        Value::Short(_) => TAG_SHORT,
        Value::Int(_) => TAG_INT,
        Value::Long(_) => TAG_LONG,
        Value::Float(_) => TAG_FLOAT,
        Value::Double(_) => TAG_DOUBLE,
        Value::ByteArray(_) => TAG_BYTE_ARRAY,
        Value::String(_) => TAG_STRING,
        Value::List(_) => TAG_LIST,
        Value::Compound(_) => TAG_COMPOUND,
        Value::IntArray(_) => TAG_INT_ARRAY,
        Value::LongArray(_) => TAG_LONG_ARRAY,
    }
}

/// Reads one named root tag.
pub fn read_root(stream: &mut BinaryStream) -> Result<(String, Value), CodecError> {
    let tag = stream.get_byte()?;
    if tag == TAG_END {
        return Err(invalid("Root tag cannot be TAG_End"));
    }
    let name = read_string(stream)?;
    let value = read_payload(stream, tag, 0)?;
    Ok((name, value))
}

/// Reads one named root tag and requires it to be a compound.
pub fn read_compound_root(stream: &mut BinaryStream) -> Result<HashMap<String, Value>, CodecError> {
    match read_root(stream)? {
        (_, Value::Compound(compound)) => Ok(compound),
        (_, other) => Err(invalid(format!(
            "Expected a compound root, found tag {}",
            tag_id(&other)
        ))),
    }
}

/// Writes `value` as a named root tag.
pub fn write_root(stream: &mut BinaryStream, name: &str, value: &Value) -> Result<(), CodecError> {
    stream.put_byte(tag_id(value));
    write_string(stream, name)?;
    write_payload(stream, value, 0)
}

fn read_string(stream: &mut BinaryStream) -> Result<String, CodecError> {
    let string = stream.get_string()?;
    if string.len() > MAX_STRING_BYTES {
        return Err(CodecError::Decoding(
            DataType::String,
            ErrorReason::ValueTooLarge,
        ));
    }
    Ok(string)
}

fn write_string(stream: &mut BinaryStream, string: &str) -> Result<(), CodecError> {
    if string.len() > MAX_STRING_BYTES {
        return Err(CodecError::Encoding(
            DataType::String,
            ErrorReason::ValueTooLarge,
        ));
    }
    stream.put_string(string);
    Ok(())
}

fn read_length(stream: &mut BinaryStream) -> Result<usize, CodecError> {
    let len = stream.get_var_int()?;
    usize::try_from(len).map_err(|_| CodecError::Decoding(DataType::Nbt, ErrorReason::ValueTooSmall))
}

fn read_payload(stream: &mut BinaryStream, tag: u8, depth: usize) -> Result<Value, CodecError> {
    if depth > MAX_DEPTH {
        return Err(invalid("Maximum nesting depth exceeded"));
    }

    let value = match tag {
        TAG_BYTE => Value::Byte(stream.get_byte()? as i8),
        TAG_SHORT => Value::Short(stream.get_l_short()?),
        TAG_INT => Value::Int(stream.get_var_int()?),
        TAG_LONG => Value::Long(stream.get_var_long()?),
        TAG_FLOAT => Value::Float(stream.get_l_float()?),
        TAG_DOUBLE => Value::Double(stream.get_l_double()?),
        TAG_BYTE_ARRAY => {
            let len = read_length(stream)?;
            Value::ByteArray(stream.get(len)?.iter().map(|&b| b as i8).collect())
        }
        TAG_STRING => Value::String(read_string(stream)?),
        TAG_LIST => {
            let element_tag = stream.get_byte()?;
            let len = read_length(stream)?;
            if element_tag == TAG_END && len > 0 {
                return Err(invalid("Non-empty list of TAG_End"));
            }

            // Every element needs at least one byte, so cap the preallocation.
            let mut list = Vec::with_capacity(len.min(stream.remaining()));
            for _ in 0..len {
                list.push(read_payload(stream, element_tag, depth + 1)?);
            }
            Value::List(list)
        }
        TAG_COMPOUND => {
            let mut compound = HashMap::new();
            loop {
                let entry_tag = stream.get_byte()?;
                if entry_tag == TAG_END {
                    break;
                }
                let name = read_string(stream)?;
                let value = read_payload(stream, entry_tag, depth + 1)?;
                compound.insert(name, value);
            }
            Value::Compound(compound)
        }
        TAG_INT_ARRAY => {
            let len = read_length(stream)?;
            let mut ints = Vec::with_capacity(len.min(stream.remaining()));
            for _ in 0..len {
                ints.push(stream.get_var_int()?);
            }
            Value::IntArray(ints)
        }
        _ => {
            return Err(CodecError::Decoding(
                DataType::Nbt,
                ErrorReason::InvalidFormat(format!("Unknown tag type {tag}")),
            ))
        }
    };

    Ok(value)
}

fn write_payload(stream: &mut BinaryStream, value: &Value, depth: usize) -> Result<(), CodecError> {
    if depth > MAX_DEPTH {
        return Err(CodecError::Encoding(
            DataType::Nbt,
            ErrorReason::InvalidFormat("Maximum nesting depth exceeded".to_string()),
        ));
    }

    match value {
        Value::Byte(v) => stream.put_byte(*v as u8),
        Value::Short(v) => stream.put_l_short(*v),
        Value::Int(v) => stream.put_var_int(*v),
        Value::Long(v) => stream.put_var_long(*v),
        Value::Float(v) => stream.put_l_float(*v),
        Value::Double(v) => stream.put_l_double(*v),
        Value::ByteArray(bytes) => {
            stream.put_var_int(bytes.len() as i32);
            for b in bytes {
                stream.put_byte(*b as u8);
            }
        }
        Value::String(string) => write_string(stream, string)?,
        Value::List(list) => {
            let element_tag = list.first().map(tag_id).unwrap_or(TAG_END);
            if list.iter().any(|element| tag_id(element) != element_tag) {
                return Err(CodecError::Encoding(
                    DataType::Nbt,
                    ErrorReason::InvalidFormat("List elements must share a tag type".to_string()),
                ));
            }

            stream.put_byte(element_tag);
            stream.put_var_int(list.len() as i32);
            for element in list {
                write_payload(stream, element, depth + 1)?;
            }
        }
        Value::Compound(compound) => {
            // Sorted so that equal compounds always produce equal bytes.
            let mut entries: Vec<_> = compound.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            for (name, entry) in entries {
                stream.put_byte(tag_id(entry));
                write_string(stream, name)?;
                write_payload(stream, entry, depth + 1)?;
            }
            stream.put_byte(TAG_END);
        }
        Value::IntArray(ints) => {
            stream.put_var_int(ints.len() as i32);
            for i in ints {
                stream.put_var_int(*i);
            }
        }
        Value::LongArray(_) => {
            return Err(CodecError::Encoding(
                DataType::Nbt,
                ErrorReason::InvalidFormat("TAG_Long_Array has no network encoding".to_string()),
            ))
        }
    }

    Ok(())
}

//! Snapshot format used to move a chunk to another thread. It is only ever read back by the same
//! build, so it favours speed over compactness and carries no compatibility guarantees.
//!
//! Layout:
//!
//! Version (Byte)
//! Chunk X, Chunk Z (VarInt)
//! Dimension (Byte)
//! Subchunk bitmap (LShort): bit `y` is set for subchunks that have layers
//! For each set bit, the layer count (Byte) then for each layer:
//!   bits per block (Byte), the words (LInt each), palette size (UnsignedVarInt), palette (LInt each)
//! Biome ids (256 Bytes)

use bytes::Bytes;

use super::SerializerError;
use crate::net::network_nbt;
use crate::net::packet::data_types::{BinaryStream, CodecError};
use crate::world::palette::PalettedBlockArray;
use crate::world::{Chunk, Dimension, SubChunk, BIOME_ARRAY_SIZE, MAX_SUBCHUNKS};

const TERRAIN_VERSION: u8 = 1;

pub fn serialize_terrain(chunk: &Chunk) -> Bytes {
    let mut stream = BinaryStream::new();
    stream.put_byte(TERRAIN_VERSION);
    stream.put_var_int(chunk.x());
    stream.put_var_int(chunk.z());
    stream.put_byte(chunk.dimension().id());

    let mut bitmap = 0u16;
    for (y, sub_chunk) in chunk.sub_chunks().iter().enumerate() {
        if !sub_chunk.layers().is_empty() {
            bitmap |= 1 << y;
        }
    }
    stream.put_l_ushort(bitmap);

    for sub_chunk in chunk.sub_chunks() {
        if sub_chunk.layers().is_empty() {
            continue;
        }
        stream.put_byte(sub_chunk.layers().len() as u8);
        for layer in sub_chunk.layers() {
            stream.put_byte(layer.bits_per_block());
            for word in layer.word_array() {
                stream.put_l_uint(*word);
            }
            stream.put_unsigned_var_int(layer.palette().len() as u32);
            for id in layer.palette() {
                stream.put_l_uint(*id);
            }
        }
    }

    stream.put(chunk.biome_ids());
    stream.into_bytes()
}

pub fn deserialize_terrain(data: &[u8]) -> Result<Chunk, SerializerError> {
    let mut stream = BinaryStream::from_bytes(data);
    let version = stream.get_byte()?;
    if version != TERRAIN_VERSION {
        return Err(SerializerError::UnsupportedVersion(version));
    }

    let x = stream.get_var_int()?;
    let z = stream.get_var_int()?;
    let dimension = Dimension::from_id(stream.get_byte()?)?;
    let mut chunk = Chunk::new(x, z, dimension);

    let bitmap = stream.get_l_ushort()?;
    for y in 0..MAX_SUBCHUNKS {
        if bitmap & (1 << y) == 0 {
            continue;
        }
        let layer_count = stream.get_byte()?;
        let mut layers = Vec::with_capacity(layer_count as usize);
        for _ in 0..layer_count {
            let bits_per_block = stream.get_byte()?;
            PalettedBlockArray::validate_bits_per_block(bits_per_block)?;
            let word_count = PalettedBlockArray::expected_word_count(bits_per_block);
            let mut words = Vec::with_capacity(word_count);
            for _ in 0..word_count {
                words.push(stream.get_l_uint()?);
            }

            let palette_len = stream.get_unsigned_var_int()? as usize;
            // Every entry takes 4 bytes, so a larger claim cannot be satisfied.
            let mut palette = Vec::with_capacity(palette_len.min(stream.remaining() / 4));
            for _ in 0..palette_len {
                palette.push(stream.get_l_uint()?);
            }

            layers.push(PalettedBlockArray::from_data(bits_per_block, words, palette)?);
        }
        chunk.set_sub_chunk(y, SubChunk::new(layers))?;
    }

    let mut biome_ids = [0u8; BIOME_ARRAY_SIZE];
    biome_ids.copy_from_slice(stream.get(BIOME_ARRAY_SIZE)?);
    chunk.set_biome_ids(biome_ids);

    Ok(chunk)
}

/// Tile entities as back to back network NBT compounds, the way they are appended to the chunk
/// payload.
pub fn serialize_tiles(chunk: &Chunk) -> Result<Bytes, CodecError> {
    let mut stream = BinaryStream::new();
    for tile in chunk.tiles() {
        network_nbt::write_root(&mut stream, "", tile)?;
    }
    Ok(stream.into_bytes())
}

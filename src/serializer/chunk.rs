//! The chunk payload of `LevelChunkPacket`.
//!
//! Subchunks are written bottom-up in the v8 storage format, followed by the biomes, a zero byte
//! for border blocks and the tile entities. Clients on 1.18.0 or newer expect four extra empty
//! subchunks under an overworld chunk, since their world starts at y=-64, and biomes stored as
//! palettes instead of a flat column array.
use bytes::Bytes;

use crate::convert::block_mapping::BlockMapping;
use crate::convert::protocol::MappingProtocol;
use crate::net::packet::data_types::BinaryStream;
use crate::net::packet::SerializerContext;
use crate::world::palette::PalettedBlockArray;
use crate::world::{Chunk, Dimension, SubChunk};

/// Empty subchunks sent under y=0 to 1.18 overworld clients.
pub const LOWER_PADDING_SIZE: usize = 4;

/// Number of biome palettes a 1.18 client reads, one per subchunk of its taller world.
pub const BIOME_PALETTE_COUNT: usize = 25;

const SUB_CHUNK_VERSION: u8 = 8;

/// Subchunk count to announce in the packet for a chunk holding `base` subchunks.
pub fn padded_sub_chunk_count(base: usize, protocol: MappingProtocol, dimension: Dimension) -> usize {
    base + lower_padding(protocol, dimension)
}

fn lower_padding(protocol: MappingProtocol, dimension: Dimension) -> usize {
    if protocol.has_negative_height() && dimension == Dimension::Overworld {
        LOWER_PADDING_SIZE
    } else {
        0
    }
}

pub fn serialize_full_chunk(
    chunk: &Chunk,
    mapping: &BlockMapping,
    _context: &SerializerContext,
    protocol: MappingProtocol,
    tiles: &[u8],
) -> Bytes {
    let mut stream = BinaryStream::new();

    for _ in 0..lower_padding(protocol, chunk.dimension()) {
        // An empty subchunk: version, no layers.
        stream.put_byte(SUB_CHUNK_VERSION);
        stream.put_byte(0);
    }

    let sub_chunk_count = chunk.sub_chunk_count();
    for sub_chunk in &chunk.sub_chunks()[..sub_chunk_count] {
        serialize_sub_chunk(sub_chunk, mapping, protocol, &mut stream);
    }

    if protocol.has_negative_height() {
        let biomes = biome_palette(chunk);
        for _ in 0..BIOME_PALETTE_COUNT {
            write_layer(&biomes, |biome_id| biome_id, &mut stream);
        }
    } else {
        stream.put(chunk.biome_ids());
    }

    // No border blocks.
    stream.put_byte(0);
    stream.put(tiles);

    stream.into_bytes()
}

pub fn serialize_sub_chunk(
    sub_chunk: &SubChunk,
    mapping: &BlockMapping,
    protocol: MappingProtocol,
    stream: &mut BinaryStream,
) {
    stream.put_byte(SUB_CHUNK_VERSION);
    stream.put_byte(sub_chunk.layers().len() as u8);
    for layer in sub_chunk.layers() {
        write_layer(
            layer,
            |internal_id| mapping.to_runtime_id(internal_id, protocol),
            stream,
        );
    }
}

/// Writes one palette layer, translating every palette entry with `map_id`.
fn write_layer<F>(layer: &PalettedBlockArray, map_id: F, stream: &mut BinaryStream)
where
    F: Fn(u32) -> u32,
{
    // The low bit flags the palette as runtime ids rather than persistent NBT states.
    stream.put_byte((layer.bits_per_block() << 1) | 1);
    for word in layer.word_array() {
        stream.put_l_uint(*word);
    }

    // A uniform layer has a single implied palette entry and no size.
    if layer.bits_per_block() != 0 {
        stream.put_var_int(layer.palette().len() as i32);
    }
    for id in layer.palette() {
        stream.put_var_int(map_id(*id) as i32);
    }
}

/// The 2D biome column array spread over a 3D palette, every y level holding the same biome.
fn biome_palette(chunk: &Chunk) -> PalettedBlockArray {
    let mut palette = PalettedBlockArray::new(u32::from(chunk.biome_id(0, 0)));
    for x in 0..16 {
        for z in 0..16 {
            let biome_id = u32::from(chunk.biome_id(x, z));
            if biome_id == palette.get(x, 0, z) {
                continue;
            }
            for y in 0..16 {
                palette.set(x, y, z, biome_id);
            }
        }
    }
    palette
}

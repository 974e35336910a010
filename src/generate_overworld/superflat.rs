use crate::world::block::{full_id, legacy_ids};
use crate::world::{Chunk, Dimension, BIOME_ARRAY_SIZE};

pub const PLAINS_BIOME: u8 = 1;

/// Generates a superflat chunk: one layer of bedrock, two of dirt and grass on top.
pub fn generate_chunk(x: i32, z: i32, dimension: Dimension) -> Chunk {
    let mut chunk = Chunk::new(x, z, dimension);

    for y in 0..4 {
        //height
        let block = match y {
            0 => full_id(legacy_ids::BEDROCK, 0),
            1 | 2 => full_id(legacy_ids::DIRT, 0), // layers 1 and 2
            _ => full_id(legacy_ids::GRASS, 0),
        };
        for z in 0..16 {
            for x in 0..16 {
                chunk.set_full_block(x, y, z, block);
            }
        }
    }

    chunk.set_biome_ids([PLAINS_BIOME; BIOME_ARRAY_SIZE]);
    chunk
}

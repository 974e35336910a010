//! In-memory chunk model: 16 subchunks of palette-compressed block layers, a 2D biome array and
//! the chunk's tile entities.
pub mod block;
pub mod palette;

use std::collections::HashMap;

use nbt::Value;
use thiserror::Error;

use block::AIR;
use palette::PalettedBlockArray;

pub const MAX_SUBCHUNKS: usize = 16;
pub const SUBCHUNK_HEIGHT: usize = 16;
pub const BIOME_ARRAY_SIZE: usize = 256;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    #[error("Unknown dimension id: {0}")]
    UnknownDimension(u8),

    #[error("Subchunk index {0} is out of range")]
    SubChunkOutOfRange(usize),

    #[error("Tile entities must be compounds")]
    TileNotCompound,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dimension {
    Overworld,
    Nether,
    End,
}

impl Dimension {
    pub fn id(self) -> u8 {
        match self {
            Dimension::Overworld => 0,
            Dimension::Nether => 1,
            Dimension::End => 2,
        }
    }

    pub fn from_id(id: u8) -> Result<Self, WorldError> {
        match id {
            0 => Ok(Dimension::Overworld),
            1 => Ok(Dimension::Nether),
            2 => Ok(Dimension::End),
            other => Err(WorldError::UnknownDimension(other)),
        }
    }
}

/// A 16x16x16 section of a chunk. Layer 0 holds the blocks, further layers hold things like water
/// logged into another block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubChunk {
    layers: Vec<PalettedBlockArray>,
}

impl SubChunk {
    pub fn new(layers: Vec<PalettedBlockArray>) -> Self {
        Self { layers }
    }

    pub fn layers(&self) -> &[PalettedBlockArray] {
        &self.layers
    }

    pub fn get_full_block(&self, x: usize, y: usize, z: usize) -> u32 {
        self.layers
            .first()
            .map_or(AIR, |layer| layer.get(x, y, z))
    }

    pub fn set_full_block(&mut self, x: usize, y: usize, z: usize, full_id: u32) {
        if self.layers.is_empty() {
            if full_id == AIR {
                return;
            }
            self.layers.push(PalettedBlockArray::new(AIR));
        }
        self.layers[0].set(x, y, z, full_id);
    }

    /// A subchunk is empty when it holds nothing but air.
    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(|layer| layer.is_uniform(AIR))
    }

    /// Compacts every layer and drops the ones holding only air.
    pub fn collect_garbage(&mut self) {
        for layer in &mut self.layers {
            layer.collect_garbage();
        }
        self.layers.retain(|layer| !layer.is_uniform(AIR));
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    x: i32,
    z: i32,
    dimension: Dimension,
    sub_chunks: Vec<SubChunk>,
    biome_ids: [u8; BIOME_ARRAY_SIZE],
    tiles: Vec<Value>,
}

impl Chunk {
    pub fn new(x: i32, z: i32, dimension: Dimension) -> Self {
        Self {
            x,
            z,
            dimension,
            sub_chunks: vec![SubChunk::default(); MAX_SUBCHUNKS],
            biome_ids: [0; BIOME_ARRAY_SIZE],
            tiles: Vec::new(),
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn z(&self) -> i32 {
        self.z
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn sub_chunks(&self) -> &[SubChunk] {
        &self.sub_chunks
    }

    pub fn sub_chunk(&self, y: usize) -> Result<&SubChunk, WorldError> {
        self.sub_chunks
            .get(y)
            .ok_or(WorldError::SubChunkOutOfRange(y))
    }

    pub fn set_sub_chunk(&mut self, y: usize, sub_chunk: SubChunk) -> Result<(), WorldError> {
        let slot = self
            .sub_chunks
            .get_mut(y)
            .ok_or(WorldError::SubChunkOutOfRange(y))?;
        *slot = sub_chunk;
        Ok(())
    }

    /// `y` is the absolute height inside the chunk, 0 to 255.
    pub fn get_full_block(&self, x: usize, y: usize, z: usize) -> u32 {
        self.sub_chunks[y / SUBCHUNK_HEIGHT].get_full_block(x, y % SUBCHUNK_HEIGHT, z)
    }

    pub fn set_full_block(&mut self, x: usize, y: usize, z: usize, full_id: u32) {
        self.sub_chunks[y / SUBCHUNK_HEIGHT].set_full_block(x, y % SUBCHUNK_HEIGHT, z, full_id);
    }

    /// Number of subchunks up to and including the highest non-empty one.
    pub fn sub_chunk_count(&self) -> usize {
        self.sub_chunks
            .iter()
            .rposition(|sub| !sub.is_empty())
            .map_or(0, |y| y + 1)
    }

    fn biome_index(x: usize, z: usize) -> usize {
        (x << 4) | z
    }

    pub fn biome_id(&self, x: usize, z: usize) -> u8 {
        self.biome_ids[Self::biome_index(x, z)]
    }

    pub fn set_biome_id(&mut self, x: usize, z: usize, biome_id: u8) {
        self.biome_ids[Self::biome_index(x, z)] = biome_id;
    }

    pub fn biome_ids(&self) -> &[u8; BIOME_ARRAY_SIZE] {
        &self.biome_ids
    }

    pub fn set_biome_ids(&mut self, biome_ids: [u8; BIOME_ARRAY_SIZE]) {
        self.biome_ids = biome_ids;
    }

    /// Tile entities, each a compound tag.
    pub fn tiles(&self) -> &[Value] {
        &self.tiles
    }

    pub fn add_tile(&mut self, tile: HashMap<String, Value>) {
        self.tiles.push(Value::Compound(tile));
    }

    pub fn push_tile(&mut self, tile: Value) -> Result<(), WorldError> {
        match tile {
            Value::Compound(_) => {
                self.tiles.push(tile);
                Ok(())
            }
            _ => Err(WorldError::TileNotCompound),
        }
    }

    pub fn collect_garbage(&mut self) {
        for sub_chunk in &mut self.sub_chunks {
            sub_chunk.collect_garbage();
        }
    }
}

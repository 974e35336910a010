//! Chunk serialization: a compact snapshot format for handing chunks to worker threads, and the
//! network layout clients expect.
pub mod chunk;
pub mod fast;

use thiserror::Error;

use crate::net::packet::data_types::CodecError;
use crate::world::palette::PaletteError;
use crate::world::WorldError;

#[derive(Error, Debug)]
pub enum SerializerError {
    #[error("Unsupported terrain snapshot version {0}")]
    UnsupportedVersion(u8),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Invalid block storage: {0}")]
    Palette(#[from] PaletteError),

    #[error("Invalid chunk: {0}")]
    World(#[from] WorldError),
}

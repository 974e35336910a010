//! Chunk delivery for a Minecraft Bedrock server: block runtime id mappings for every supported
//! protocol, and off-thread encoding of chunks into compressed `LevelChunkPacket` batches.
pub mod args;
pub mod config;
pub mod consts;
pub mod convert;
pub mod fs_manager;
pub mod generate_overworld;
pub mod logging;
pub mod net;
pub mod serializer;
pub mod task;
pub mod world;

#[cfg(test)]
mod test_support;

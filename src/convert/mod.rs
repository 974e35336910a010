//! Translation between the server's internal ids and the ids each client protocol expects.
pub mod block_mapping;
pub mod item_dictionary;
pub mod legacy_ids;
pub mod protocol;

use std::path::PathBuf;

use thiserror::Error;

use crate::net::packet::data_types::CodecError;
use protocol::MappingProtocol;

/// Errors raised while building the mapping tables. All of them mean the data directory is
/// broken or does not match this build.
#[derive(Error, Debug)]
pub enum MappingError {
    #[error("Missing required resource file {}: {source}", .path.display())]
    MissingResource {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to decode {}: {source}", .path.display())]
    Decode { path: PathBuf, source: CodecError },

    #[error("Invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("No legacy ID matches {string_id} for {protocol}")]
    UnknownLegacyId {
        string_id: String,
        protocol: MappingProtocol,
    },

    #[error("Mapped state {name} does not appear in the network table of {protocol}")]
    StateNotInTable {
        name: String,
        protocol: MappingProtocol,
    },

    #[error("The placeholder block is not mapped for {0}")]
    PlaceholderUnmapped(MappingProtocol),

    #[error("Unsupported protocol: {0}")]
    UnsupportedProtocol(u32),
}

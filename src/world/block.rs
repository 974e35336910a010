//! Internal block state ids.
//!
//! The server identifies a block state by a legacy numeric id and a 4-bit metadata value packed
//! into one integer: `(legacy_id << INTERNAL_METADATA_BITS) | meta`.

pub const INTERNAL_METADATA_BITS: u32 = 4;
pub const INTERNAL_METADATA_MASK: u32 = (1 << INTERNAL_METADATA_BITS) - 1;

/// Highest metadata value the internal representation can hold.
pub const MAX_METADATA: u16 = INTERNAL_METADATA_MASK as u16;

/// Numeric legacy block ids used by the server itself.
pub mod legacy_ids {
    pub const AIR: u32 = 0;
    pub const STONE: u32 = 1;
    pub const GRASS: u32 = 2;
    pub const DIRT: u32 = 3;
    pub const BEDROCK: u32 = 7;
    pub const WOOL: u32 = 35;
    pub const CHEST: u32 = 54;
    /// Placeholder shown by clients for blocks they are not told about.
    pub const INFO_UPDATE: u32 = 248;
}

/// Packs a legacy id and metadata into an internal block state id.
pub const fn full_id(legacy_id: u32, meta: u32) -> u32 {
    (legacy_id << INTERNAL_METADATA_BITS) | (meta & INTERNAL_METADATA_MASK)
}

pub const fn legacy_id(full_id: u32) -> u32 {
    full_id >> INTERNAL_METADATA_BITS
}

pub const fn meta(full_id: u32) -> u32 {
    full_id & INTERNAL_METADATA_MASK
}

/// The internal id of air. Empty storage is filled with it.
pub const AIR: u32 = full_id(legacy_ids::AIR, 0);

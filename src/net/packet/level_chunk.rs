use bytes::Bytes;

use super::data_types::BinaryStream;
use super::{ClientboundPacket, PacketError, ParsablePacket, SerializerContext};

/// Sends a whole chunk column to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelChunkPacket {
    pub chunk_x: i32,
    pub chunk_z: i32,
    pub sub_chunk_count: u32,
    /// Blob hashes, only present when the client blob cache is in use.
    pub blob_ids: Option<Vec<u64>>,
    pub payload: Bytes,
}

impl LevelChunkPacket {
    pub fn new(chunk_x: i32, chunk_z: i32, sub_chunk_count: u32, payload: Bytes) -> Self {
        Self {
            chunk_x,
            chunk_z,
            sub_chunk_count,
            blob_ids: None,
            payload,
        }
    }

    pub fn with_cache(
        chunk_x: i32,
        chunk_z: i32,
        sub_chunk_count: u32,
        blob_ids: Vec<u64>,
        payload: Bytes,
    ) -> Self {
        Self {
            chunk_x,
            chunk_z,
            sub_chunk_count,
            blob_ids: Some(blob_ids),
            payload,
        }
    }

    pub fn is_cache_enabled(&self) -> bool {
        self.blob_ids.is_some()
    }
}

impl ClientboundPacket for LevelChunkPacket {
    const NETWORK_ID: u32 = 0x3a;

    fn encode_payload(&self, stream: &mut BinaryStream, _context: &SerializerContext) {
        stream.put_var_int(self.chunk_x);
        stream.put_var_int(self.chunk_z);
        stream.put_unsigned_var_int(self.sub_chunk_count);
        stream.put_bool(self.is_cache_enabled());
        if let Some(blob_ids) = &self.blob_ids {
            stream.put_unsigned_var_int(blob_ids.len() as u32);
            for blob_id in blob_ids {
                stream.put_l_long(*blob_id as i64);
            }
        }
        stream.put_string_bytes(&self.payload);
    }
}

impl ParsablePacket for LevelChunkPacket {
    const NETWORK_ID: u32 = <Self as ClientboundPacket>::NETWORK_ID;

    fn decode_payload(stream: &mut BinaryStream) -> Result<Self, PacketError> {
        let chunk_x = stream.get_var_int()?;
        let chunk_z = stream.get_var_int()?;
        let sub_chunk_count = stream.get_unsigned_var_int()?;
        let blob_ids = if stream.get_bool()? {
            let count = stream.get_unsigned_var_int()?;
            let mut blob_ids = Vec::new();
            for _ in 0..count {
                blob_ids.push(stream.get_l_long()? as u64);
            }
            Some(blob_ids)
        } else {
            None
        };
        let payload = stream.get_string_bytes()?;

        Ok(Self {
            chunk_x,
            chunk_z,
            sub_chunk_count,
            blob_ids,
            payload,
        })
    }
}

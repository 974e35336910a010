use bytes::Bytes;

use super::data_types::BinaryStream;
use super::{ClientboundPacket, Packet, PacketError, SerializerContext};

/// Several packets framed back to back, each prefixed by its length as an unsigned varint.
/// This is the buffer that gets compressed and sent in one go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketBatch {
    buffer: Bytes,
}

impl PacketBatch {
    pub fn from_packets<P: ClientboundPacket>(
        context: &SerializerContext,
        packets: &[P],
    ) -> Self {
        let mut stream = BinaryStream::new();
        for packet in packets {
            stream.put_string_bytes(&packet.encode(context));
        }
        Self {
            buffer: stream.into_bytes(),
        }
    }

    /// Wraps a buffer received from elsewhere, usually after decompression.
    pub fn from_buffer<T: Into<Bytes>>(buffer: T) -> Self {
        Self {
            buffer: buffer.into(),
        }
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_buffer(self) -> Bytes {
        self.buffer
    }

    /// Splits the batch back into its packets.
    pub fn packets(&self) -> Result<Vec<Packet>, PacketError> {
        let mut stream = BinaryStream::from_bytes(&self.buffer);
        let mut packets = Vec::new();
        while !stream.feof() {
            packets.push(Packet::new(stream.get_string_bytes()?)?);
        }
        Ok(packets)
    }
}

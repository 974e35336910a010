//! This module abstracts away a Bedrock packet, so that it can be used in a simple and
//! standardized way.

pub mod batch;
pub mod data_types;
pub mod level_chunk;

use core::fmt;
use std::sync::Arc;

use bytes::Bytes;
use data_types::{BinaryStream, CodecError};
use thiserror::Error;

use crate::convert::item_dictionary::ItemTypeDictionary;

/// The packet id occupies the low 10 bits of the header, the rest addresses split-screen
/// sub-clients, which are always 0 here.
const PID_MASK: u32 = 0x3ff;

/// A raw, undecoded Bedrock packet.
///
/// Structure of a packet inside a batch:
///
/// Header (UnsignedVarInt): packet id and sub-client ids
/// Data (Byte Array): the packet fields
pub struct Packet {
    /// An ID that each Packet has, taken from the header.
    id: u32,

    /// The raw bytes making the packet, header included.
    data: Bytes,

    /// The raw bytes making the PAYLOAD of the packet.
    payload: Bytes,
}

impl Packet {
    /// Initalizes a new `Packet` by parsing the header off `data`.
    pub fn new<T: Into<Bytes>>(data: T) -> Result<Self, PacketError> {
        let data: Bytes = data.into();
        let mut stream = BinaryStream::from_bytes(&data);
        let header = stream.get_unsigned_var_int()?;
        let payload = data.slice(stream.offset()..);

        Ok(Self {
            id: header & PID_MASK,
            data,
            payload,
        })
    }

    /// This is the WHOLE packet.
    pub fn get_full_packet(&self) -> &[u8] {
        &self.data
    }

    /// This is the PAYLOAD, so the bytes except the header.
    pub fn get_payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn get_id(&self) -> u32 {
        self.id
    }

    /// Returns the number of bytes in the packet.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn hex_repr(data: &[u8]) -> String {
    data.iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// When printing a `Packet`, the hexadecimal representation will be shown.
impl fmt::Display for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex_repr(&self.data))
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PACKET (Length: {} / ID: {:#x})", self.len(), self.id)
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

#[derive(Error, Debug)]
pub enum PacketError {
    #[error("Unexpected packet id {actual:#x}, expected {expected:#x}")]
    UnexpectedId { expected: u32, actual: u32 },

    #[error("{0} unread bytes left after decoding the packet")]
    TrailingBytes(usize),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Per-encode state shared by every packet written for a given protocol generation.
#[derive(Clone, Debug)]
pub struct SerializerContext {
    item_dictionary: Arc<ItemTypeDictionary>,
}

impl SerializerContext {
    pub fn new(item_dictionary: Arc<ItemTypeDictionary>) -> Self {
        Self { item_dictionary }
    }

    pub fn item_dictionary(&self) -> &ItemTypeDictionary {
        &self.item_dictionary
    }
}

/// A packet the server sends to clients.
pub trait ClientboundPacket {
    const NETWORK_ID: u32;

    fn encode_payload(&self, stream: &mut BinaryStream, context: &SerializerContext);

    /// Header followed by the payload.
    fn encode(&self, context: &SerializerContext) -> Bytes {
        let mut stream = BinaryStream::new();
        stream.put_unsigned_var_int(Self::NETWORK_ID);
        self.encode_payload(&mut stream, context);
        stream.into_bytes()
    }
}

/// A packet that can be read back from its raw form.
pub trait ParsablePacket: Sized {
    const NETWORK_ID: u32;

    fn decode_payload(stream: &mut BinaryStream) -> Result<Self, PacketError>;

    fn parse(packet: &Packet) -> Result<Self, PacketError> {
        if packet.get_id() != Self::NETWORK_ID {
            return Err(PacketError::UnexpectedId {
                expected: Self::NETWORK_ID,
                actual: packet.get_id(),
            });
        }

        let mut stream = BinaryStream::from_bytes(packet.get_payload());
        let decoded = Self::decode_payload(&mut stream)?;
        if !stream.feof() {
            return Err(PacketError::TrailingBytes(stream.remaining()));
        }
        Ok(decoded)
    }
}

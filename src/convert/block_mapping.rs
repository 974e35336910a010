//! The block runtime id registry.
//!
//! Every protocol ships its own ordered table of block states. A state's position in that table is
//! the runtime id the client knows it by. The registry pairs those positions with the server's
//! internal ids through the legacy state map, once at startup, and is read-only afterwards.
use std::collections::HashMap;
use std::path::Path;

use log::{debug, info};
use nbt::Value;

use super::legacy_ids::LegacyBlockIdMap;
use super::protocol::MappingProtocol;
use super::MappingError;
use crate::consts::resources;
use crate::fs_manager;
use crate::net::network_nbt;
use crate::net::packet::data_types::{BinaryStream, CodecError, DataType, ErrorReason};
use crate::world::block::{full_id, legacy_ids, MAX_METADATA};

/// A block state as the client describes it: a compound with a `name`, its `states` and usually a
/// `version`.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockState {
    name: String,
    tag: HashMap<String, Value>,
}

impl BlockState {
    pub fn from_compound(tag: HashMap<String, Value>) -> Result<Self, CodecError> {
        let name = match tag.get("name") {
            Some(Value::String(name)) => name.clone(),
            _ => {
                return Err(CodecError::Decoding(
                    DataType::Nbt,
                    ErrorReason::InvalidFormat("Block state has no name".to_string()),
                ))
            }
        };
        Ok(Self { name, tag })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> &HashMap<String, Value> {
        &self.tag
    }
}

/// One record of the legacy state map: a legacy string id and metadata, and the state it became.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyStateEntry {
    pub string_id: String,
    pub meta: u16,
    pub state: BlockState,
}

/// Decodes a canonical block state table: root compounds back to back until the end.
pub fn decode_canonical_states(data: &[u8]) -> Result<Vec<BlockState>, CodecError> {
    let mut stream = BinaryStream::from_bytes(data);
    let mut states = Vec::new();
    while !stream.feof() {
        states.push(BlockState::from_compound(network_nbt::read_compound_root(
            &mut stream,
        )?)?);
    }
    Ok(states)
}

/// Decodes a legacy state map: (string id, little-endian u16 meta, root compound) records.
pub fn decode_legacy_state_map(data: &[u8]) -> Result<Vec<LegacyStateEntry>, CodecError> {
    let mut stream = BinaryStream::from_bytes(data);
    let mut entries = Vec::new();
    while !stream.feof() {
        let string_id = stream.get_string()?;
        let meta = stream.get_l_ushort()?;
        let state = BlockState::from_compound(network_nbt::read_compound_root(&mut stream)?)?;
        entries.push(LegacyStateEntry {
            string_id,
            meta,
            state,
        });
    }
    Ok(entries)
}

#[derive(Debug)]
struct ProtocolTable {
    known_states: Vec<BlockState>,
    legacy_to_runtime: HashMap<u32, u32>,
    runtime_to_legacy: HashMap<u32, u32>,
    placeholder_runtime_id: u32,
}

#[derive(Debug)]
pub struct BlockMapping {
    tables: HashMap<MappingProtocol, ProtocolTable>,
}

impl BlockMapping {
    /// Builds the tables of every supported protocol from the data directory.
    pub fn load(data_path: &Path) -> Result<Self, MappingError> {
        let legacy_ids = LegacyBlockIdMap::load(data_path)?;
        Self::load_with(data_path, &legacy_ids)
    }

    pub fn load_with(data_path: &Path, legacy_ids: &LegacyBlockIdMap) -> Result<Self, MappingError> {
        let mut tables = HashMap::new();
        for protocol in MappingProtocol::ALL {
            let table = Self::build_table(data_path, legacy_ids, protocol)?;
            info!(
                "Loaded {} block states for {protocol}, {} of them mapped",
                table.known_states.len(),
                table.runtime_to_legacy.len()
            );
            tables.insert(protocol, table);
        }
        Ok(Self { tables })
    }

    fn read_table<T>(
        data_path: &Path,
        file_name: &str,
        decode: fn(&[u8]) -> Result<T, CodecError>,
    ) -> Result<T, MappingError> {
        let (path, contents) = fs_manager::read_resource(data_path, file_name)?;
        decode(&contents).map_err(|source| MappingError::Decode { path, source })
    }

    fn build_table(
        data_path: &Path,
        legacy_ids: &LegacyBlockIdMap,
        protocol: MappingProtocol,
    ) -> Result<ProtocolTable, MappingError> {
        let route = protocol.route();
        let known_states = Self::read_table(
            data_path,
            &format!(
                "{}{}.nbt",
                resources::CANONICAL_BLOCK_STATES,
                route.canonical_states
            ),
            decode_canonical_states,
        )?;
        let legacy_state_map = Self::read_table(
            data_path,
            &format!(
                "{}{}.bin",
                resources::R12_TO_CURRENT_BLOCK_MAP,
                route.legacy_state_map
            ),
            decode_legacy_state_map,
        )?;

        let mut candidates: HashMap<&str, Vec<usize>> = HashMap::new();
        for (position, state) in known_states.iter().enumerate() {
            candidates.entry(state.name()).or_default().push(position);
        }

        let mut legacy_to_runtime = HashMap::new();
        let mut runtime_to_legacy = HashMap::new();
        let mut skipped = 0;
        for entry in &legacy_state_map {
            let legacy_id = legacy_ids
                .string_to_legacy(&entry.string_id)
                .ok_or_else(|| MappingError::UnknownLegacyId {
                    string_id: entry.string_id.clone(),
                    protocol,
                })?;

            // Internal ids only hold 4 bits of metadata.
            if entry.meta > MAX_METADATA {
                skipped += 1;
                continue;
            }

            let runtime_id = candidates
                .get(entry.state.name())
                .and_then(|positions| {
                    positions
                        .iter()
                        .copied()
                        .find(|&position| known_states[position] == entry.state)
                })
                .ok_or_else(|| MappingError::StateNotInTable {
                    name: entry.state.name().to_string(),
                    protocol,
                })?;

            let internal_id = full_id(legacy_id, entry.meta as u32);
            legacy_to_runtime.insert(internal_id, runtime_id as u32);
            runtime_to_legacy.insert(runtime_id as u32, internal_id);
        }
        if skipped > 0 {
            debug!("Skipped {skipped} legacy states with metadata above {MAX_METADATA} for {protocol}");
        }

        let placeholder_runtime_id = legacy_to_runtime
            .get(&full_id(legacy_ids::INFO_UPDATE, 0))
            .copied()
            .ok_or(MappingError::PlaceholderUnmapped(protocol))?;

        Ok(ProtocolTable {
            known_states,
            legacy_to_runtime,
            runtime_to_legacy,
            placeholder_runtime_id,
        })
    }

    fn table(&self, protocol: MappingProtocol) -> &ProtocolTable {
        &self.tables[&protocol]
    }

    /// Runtime id of `internal_id` for `protocol`. Unknown ids get the placeholder block.
    pub fn to_runtime_id(&self, internal_id: u32, protocol: MappingProtocol) -> u32 {
        let table = self.table(protocol);
        table
            .legacy_to_runtime
            .get(&internal_id)
            .copied()
            .unwrap_or(table.placeholder_runtime_id)
    }

    /// Internal id a runtime id of `protocol` was registered for, if any.
    pub fn from_runtime_id(&self, runtime_id: u32, protocol: MappingProtocol) -> Option<u32> {
        self.table(protocol)
            .runtime_to_legacy
            .get(&runtime_id)
            .copied()
    }

    /// The canonical state table of `protocol`, indexed by runtime id.
    pub fn known_states(&self, protocol: MappingProtocol) -> &[BlockState] {
        &self.table(protocol).known_states
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, Fixture};
    use crate::world::block::{legacy_id, meta};

    fn load(fixture: &Fixture) -> Result<BlockMapping, MappingError> {
        let dir = fixture.write();
        BlockMapping::load(dir.path())
    }

    #[test]
    fn test_known_states_for_every_protocol() {
        let fixture = Fixture::standard();
        let mapping = load(&fixture).unwrap();

        for protocol in MappingProtocol::ALL {
            let states = mapping.known_states(protocol);
            assert!(!states.is_empty());
            assert_eq!(states.len(), fixture.states.len());
        }
    }

    #[test]
    fn test_round_trip() {
        let mapping = load(&Fixture::standard()).unwrap();
        let ids = [
            full_id(legacy_ids::AIR, 0),
            full_id(legacy_ids::STONE, 0),
            full_id(legacy_ids::STONE, 1),
            full_id(legacy_ids::GRASS, 0),
            full_id(legacy_ids::WOOL, 1),
            full_id(legacy_ids::INFO_UPDATE, 0),
        ];

        for protocol in MappingProtocol::ALL {
            for id in ids {
                let runtime_id = mapping.to_runtime_id(id, protocol);
                assert_eq!(mapping.from_runtime_id(runtime_id, protocol), Some(id));
            }
        }
    }

    #[test]
    fn test_runtime_ids_point_at_matching_states() {
        let mapping = load(&Fixture::standard()).unwrap();
        for protocol in MappingProtocol::ALL {
            let runtime_id = mapping.to_runtime_id(full_id(legacy_ids::STONE, 1), protocol);
            let state = &mapping.known_states(protocol)[runtime_id as usize];
            assert_eq!(state.name(), "minecraft:stone");
            assert_eq!(
                state.tag()["states"],
                test_support::compound(vec![(
                    "stone_type",
                    Value::String("granite".to_string())
                )])
            );
        }
    }

    #[test]
    fn test_tables_differ_between_protocols() {
        // One fixture table is stored in reverse order.
        let mapping = load(&Fixture::standard()).unwrap();
        let stone = full_id(legacy_ids::STONE, 0);
        assert_ne!(
            mapping.to_runtime_id(stone, MappingProtocol::V1_18_10),
            mapping.to_runtime_id(stone, MappingProtocol::V1_17_0)
        );
    }

    #[test]
    fn test_unknown_ids_get_the_placeholder() {
        let mapping = load(&Fixture::standard()).unwrap();
        for protocol in MappingProtocol::ALL {
            let placeholder = mapping.to_runtime_id(full_id(legacy_ids::INFO_UPDATE, 0), protocol);
            assert_eq!(mapping.to_runtime_id(full_id(4000, 3), protocol), placeholder);
            assert_eq!(mapping.to_runtime_id(u32::MAX, protocol), placeholder);
        }
    }

    #[test]
    fn test_unmapped_runtime_ids() {
        let mapping = load(&Fixture::standard()).unwrap();
        let protocol = MappingProtocol::CURRENT;
        // The light block is in the canonical table but nothing maps to it.
        let light = mapping
            .known_states(protocol)
            .iter()
            .position(|state| state.name() == "minecraft:light_block")
            .unwrap();
        assert_eq!(mapping.from_runtime_id(light as u32, protocol), None);
        assert_eq!(mapping.from_runtime_id(100_000, protocol), None);
    }

    #[test]
    fn test_high_metadata_is_skipped() {
        // The fixture maps stone:16 to granite after stone:0. Had it been registered, its packed
        // id would have collided with stone:0.
        let fixture = Fixture::standard();
        assert!(fixture
            .legacy_entries
            .iter()
            .any(|(string_id, meta, _)| string_id == "minecraft:stone" && *meta == 16));

        let mapping = load(&fixture).unwrap();
        for protocol in MappingProtocol::ALL {
            let runtime_id = mapping.to_runtime_id(full_id(legacy_ids::STONE, 0), protocol);
            let state = &mapping.known_states(protocol)[runtime_id as usize];
            assert_eq!(
                state.tag()["states"],
                test_support::compound(vec![("stone_type", Value::String("stone".to_string()))])
            );
        }
    }

    #[test]
    fn test_later_registrations_win() {
        let mut fixture = Fixture::standard();
        let bedrock = fixture.state_named("minecraft:bedrock");
        fixture
            .legacy_entries
            .push(("minecraft:bedrock".to_string(), 1, bedrock));
        let mapping = load(&fixture).unwrap();

        let protocol = MappingProtocol::CURRENT;
        let runtime_id = mapping.to_runtime_id(full_id(legacy_ids::BEDROCK, 0), protocol);
        assert_eq!(
            mapping.to_runtime_id(full_id(legacy_ids::BEDROCK, 1), protocol),
            runtime_id
        );
        let back = mapping.from_runtime_id(runtime_id, protocol).unwrap();
        assert_eq!((legacy_id(back), meta(back)), (legacy_ids::BEDROCK, 1));
    }

    #[test]
    fn test_exact_structural_match() {
        // Same name and properties, different version: not the same state.
        let mut fixture = Fixture::standard();
        let mut stone = fixture.state_named("minecraft:stone");
        if let Value::Compound(tag) = &mut stone {
            tag.insert("version".to_string(), Value::Int(1));
        }
        fixture
            .legacy_entries
            .push(("minecraft:stone".to_string(), 5, stone));

        assert!(matches!(
            load(&fixture),
            Err(MappingError::StateNotInTable { name, .. }) if name == "minecraft:stone"
        ));
    }

    #[test]
    fn test_unknown_legacy_string_id() {
        let mut fixture = Fixture::standard();
        let stone = fixture.state_named("minecraft:stone");
        fixture
            .legacy_entries
            .push(("minecraft:not_a_block".to_string(), 0, stone));

        assert!(matches!(
            load(&fixture),
            Err(MappingError::UnknownLegacyId { string_id, .. }) if string_id == "minecraft:not_a_block"
        ));
    }

    #[test]
    fn test_state_missing_from_table() {
        let mut fixture = Fixture::standard();
        fixture.legacy_entries.push((
            "minecraft:stone".to_string(),
            6,
            test_support::state("minecraft:unknown", vec![]),
        ));

        assert!(matches!(
            load(&fixture),
            Err(MappingError::StateNotInTable { name, .. }) if name == "minecraft:unknown"
        ));
    }

    #[test]
    fn test_placeholder_must_be_mapped() {
        let mut fixture = Fixture::standard();
        fixture
            .legacy_entries
            .retain(|(string_id, _, _)| string_id != "minecraft:info_update");

        assert!(matches!(
            load(&fixture),
            Err(MappingError::PlaceholderUnmapped(_))
        ));
    }

    #[test]
    fn test_missing_resource() {
        let dir = Fixture::standard().write();
        std::fs::remove_file(dir.path().join("canonical_block_states-1.17.30.nbt")).unwrap();

        match BlockMapping::load(dir.path()) {
            Err(MappingError::MissingResource { path, .. }) => {
                assert!(path.ends_with("canonical_block_states-1.17.30.nbt"))
            }
            other => panic!("Expected a missing resource, got {other:?}"),
        }
    }

    #[test]
    fn test_corrupt_resource() {
        let dir = Fixture::standard().write();
        let path = dir.path().join("r12_to_current_block_map.bin");
        let mut data = std::fs::read(&path).unwrap();
        data.truncate(data.len() - 3);
        std::fs::write(&path, data).unwrap();

        assert!(matches!(
            BlockMapping::load(dir.path()),
            Err(MappingError::Decode { .. })
        ));
    }

    #[test]
    fn test_deeply_nested_state_is_a_decode_error() {
        // {name: "minecraft:stone", deep: [[[...]]]} nested far past what the decoder accepts
        let mut stream = BinaryStream::new();
        stream.put_byte(network_nbt::TAG_COMPOUND);
        stream.put_string("");
        stream.put_byte(network_nbt::TAG_STRING);
        stream.put_string("name");
        stream.put_string("minecraft:stone");
        stream.put_byte(network_nbt::TAG_LIST);
        stream.put_string("deep");
        for _ in 0..400 {
            stream.put_byte(network_nbt::TAG_LIST);
            stream.put_var_int(1);
        }
        stream.put_byte(network_nbt::TAG_END);
        stream.put_var_int(0);
        stream.put_byte(network_nbt::TAG_END);
        let data = stream.get_buffer().to_vec();

        let dir = Fixture::standard().write();
        std::fs::write(dir.path().join("canonical_block_states.nbt"), &data).unwrap();
        let path = dir.path().to_path_buf();

        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(move || {
                let direct = decode_canonical_states(&data).is_err();
                let loaded = matches!(BlockMapping::load(&path), Err(MappingError::Decode { .. }));
                (direct, loaded)
            })
            .unwrap();

        assert_eq!(handle.join().unwrap(), (true, true));
    }

    #[test]
    fn test_decoding_is_idempotent() {
        let fixture = Fixture::standard();
        let data = test_support::encode_states(&fixture.states);

        let first = decode_canonical_states(&data).unwrap();
        let second = decode_canonical_states(&data).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), fixture.states.len());
    }

    #[test]
    fn test_state_without_name() {
        let data = test_support::encode_states(&[test_support::compound(vec![(
            "states",
            test_support::compound(vec![]),
        )])]);
        assert!(decode_canonical_states(&data).is_err());
    }
}

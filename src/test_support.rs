//! Resource fixtures for tests: a small but complete data directory for every protocol.
use std::collections::HashMap;
use std::sync::Arc;

use nbt::Value;
use once_cell::sync::Lazy;
use tempfile::TempDir;

use crate::convert::block_mapping::BlockMapping;
use crate::convert::item_dictionary::{ItemDictionaries, ItemTypeDictionary, ItemTypeEntry};
use crate::convert::protocol::MappingProtocol;
use crate::net::network_nbt;
use crate::net::packet::data_types::BinaryStream;
use crate::net::packet::SerializerContext;

const STATE_VERSION: i32 = 17_959_425;

/// Canonical table stored back to front, so its runtime ids differ from every other table.
const REVERSED_CANONICAL_SUFFIX: &str = "-1.17.0";

static MAPPING: Lazy<Arc<BlockMapping>> = Lazy::new(|| {
    let dir = Fixture::standard().write();
    Arc::new(BlockMapping::load(dir.path()).expect("fixture mappings load"))
});

static ITEMS: Lazy<Arc<ItemDictionaries>> = Lazy::new(|| {
    let dir = Fixture::standard().write();
    Arc::new(ItemDictionaries::load(dir.path()).expect("fixture item lists load"))
});

pub fn block_mapping() -> Arc<BlockMapping> {
    Arc::clone(&MAPPING)
}

pub fn item_dictionaries() -> Arc<ItemDictionaries> {
    Arc::clone(&ITEMS)
}

pub fn serializer_context() -> SerializerContext {
    SerializerContext::new(Arc::new(ItemTypeDictionary::new(vec![ItemTypeEntry {
        string_id: "minecraft:stone".to_string(),
        numeric_id: 1,
        component_based: false,
    }])))
}

pub fn compound(entries: Vec<(&str, Value)>) -> Value {
    Value::Compound(
        entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect::<HashMap<_, _>>(),
    )
}

/// A block state compound the way the vanilla tables store them.
pub fn state(name: &str, properties: Vec<(&str, Value)>) -> Value {
    compound(vec![
        ("name", Value::String(name.to_string())),
        ("states", compound(properties)),
        ("version", Value::Int(STATE_VERSION)),
    ])
}

pub fn encode_states(states: &[Value]) -> Vec<u8> {
    let mut stream = BinaryStream::new();
    for state in states {
        network_nbt::write_root(&mut stream, "", state).unwrap();
    }
    stream.get_buffer().to_vec()
}

fn encode_legacy_entries(entries: &[(String, u16, Value)]) -> Vec<u8> {
    let mut stream = BinaryStream::new();
    for (string_id, meta, state) in entries {
        stream.put_string(string_id);
        stream.put_l_ushort(*meta);
        network_nbt::write_root(&mut stream, "", state).unwrap();
    }
    stream.get_buffer().to_vec()
}

fn string(value: &str) -> Value {
    Value::String(value.to_string())
}

/// Contents of a data directory. Tests tweak the fields to produce broken directories.
pub struct Fixture {
    pub states: Vec<Value>,
    pub legacy_entries: Vec<(String, u16, Value)>,
    pub block_ids: Vec<(&'static str, u32)>,
    pub items: Vec<(&'static str, i16, bool)>,
}

impl Fixture {
    pub fn standard() -> Self {
        let states = vec![
            state("minecraft:air", vec![]),
            state("minecraft:stone", vec![("stone_type", string("stone"))]),
            state("minecraft:stone", vec![("stone_type", string("granite"))]),
            state("minecraft:grass", vec![]),
            state("minecraft:dirt", vec![("dirt_type", string("normal"))]),
            state("minecraft:bedrock", vec![("infiniburn_bit", Value::Byte(0))]),
            state("minecraft:wool", vec![("color", string("white"))]),
            state("minecraft:wool", vec![("color", string("orange"))]),
            state("minecraft:info_update", vec![]),
            state("minecraft:light_block", vec![("block_light_level", Value::Int(15))]),
        ];

        let find = |name: &str, nth: usize| -> Value {
            states
                .iter()
                .filter(|state| match state {
                    Value::Compound(tag) => tag.get("name") == Some(&string(name)),
                    _ => false,
                })
                .nth(nth)
                .cloned()
                .unwrap()
        };
        let legacy_entries = vec![
            ("minecraft:air".to_string(), 0, find("minecraft:air", 0)),
            ("minecraft:stone".to_string(), 0, find("minecraft:stone", 0)),
            ("minecraft:stone".to_string(), 1, find("minecraft:stone", 1)),
            // Metadata too large for internal ids, must be skipped.
            ("minecraft:stone".to_string(), 16, find("minecraft:stone", 1)),
            ("minecraft:grass".to_string(), 0, find("minecraft:grass", 0)),
            ("minecraft:dirt".to_string(), 0, find("minecraft:dirt", 0)),
            ("minecraft:bedrock".to_string(), 0, find("minecraft:bedrock", 0)),
            ("minecraft:wool".to_string(), 0, find("minecraft:wool", 0)),
            ("minecraft:wool".to_string(), 1, find("minecraft:wool", 1)),
            ("minecraft:info_update".to_string(), 0, find("minecraft:info_update", 0)),
        ];

        Self {
            states,
            legacy_entries,
            block_ids: vec![
                ("minecraft:air", 0),
                ("minecraft:stone", 1),
                ("minecraft:grass", 2),
                ("minecraft:dirt", 3),
                ("minecraft:bedrock", 7),
                ("minecraft:wool", 35),
                ("minecraft:chest", 54),
                ("minecraft:info_update", 248),
            ],
            items: vec![
                ("minecraft:stone", 1, false),
                ("minecraft:grass", 2, false),
                ("minecraft:dirt", 3, false),
                ("minecraft:shield", 355, true),
            ],
        }
    }

    /// First state named `name`.
    pub fn state_named(&self, name: &str) -> Value {
        self.states
            .iter()
            .find(|state| match state {
                Value::Compound(tag) => tag.get("name") == Some(&string(name)),
                _ => false,
            })
            .cloned()
            .unwrap()
    }

    /// Writes every file of every protocol to a fresh directory.
    pub fn write(&self) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path();

        let mut reversed = self.states.clone();
        reversed.reverse();

        for protocol in MappingProtocol::ALL {
            let route = protocol.route();

            let states = if route.canonical_states == REVERSED_CANONICAL_SUFFIX {
                &reversed
            } else {
                &self.states
            };
            std::fs::write(
                path.join(format!("canonical_block_states{}.nbt", route.canonical_states)),
                encode_states(states),
            )
            .unwrap();

            std::fs::write(
                path.join(format!(
                    "r12_to_current_block_map{}.bin",
                    route.legacy_state_map
                )),
                encode_legacy_entries(&self.legacy_entries),
            )
            .unwrap();

            let items: serde_json::Map<String, serde_json::Value> = self
                .items
                .iter()
                .map(|(string_id, runtime_id, component_based)| {
                    (
                        string_id.to_string(),
                        serde_json::json!({
                            "runtime_id": runtime_id,
                            "component_based": component_based,
                        }),
                    )
                })
                .collect();
            std::fs::write(
                path.join(format!("required_item_list{}.json", route.item_list)),
                serde_json::to_string(&items).unwrap(),
            )
            .unwrap();
        }

        let block_ids: serde_json::Map<String, serde_json::Value> = self
            .block_ids
            .iter()
            .map(|(string_id, id)| (string_id.to_string(), serde_json::json!(id)))
            .collect();
        std::fs::write(
            path.join("block_id_map.json"),
            serde_json::to_string(&block_ids).unwrap(),
        )
        .unwrap();

        dir
    }
}

/// Writes the standard fixture.
pub fn write_resources() -> TempDir {
    Fixture::standard().write()
}

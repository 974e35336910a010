use std::collections::HashMap;
use std::path::Path;

use super::MappingError;
use crate::consts::resources;
use crate::fs_manager;

/// Translates legacy string block ids (`minecraft:stone`) to their numeric ids.
#[derive(Debug, Clone, Default)]
pub struct LegacyBlockIdMap {
    string_to_legacy: HashMap<String, u32>,
    legacy_to_string: HashMap<u32, String>,
}

impl LegacyBlockIdMap {
    pub fn from_json<T: AsRef<[u8]>>(json: T) -> Result<Self, serde_json::Error> {
        let string_to_legacy: HashMap<String, u32> = serde_json::from_slice(json.as_ref())?;
        let legacy_to_string = string_to_legacy
            .iter()
            .map(|(string_id, legacy_id)| (*legacy_id, string_id.clone()))
            .collect();

        Ok(Self {
            string_to_legacy,
            legacy_to_string,
        })
    }

    /// Reads `block_id_map.json` from the data directory.
    pub fn load(data_path: &Path) -> Result<Self, MappingError> {
        let (path, contents) = fs_manager::read_resource(data_path, resources::BLOCK_ID_MAP)?;
        Self::from_json(&contents).map_err(|source| MappingError::Json { path, source })
    }

    pub fn string_to_legacy(&self, string_id: &str) -> Option<u32> {
        self.string_to_legacy.get(string_id).copied()
    }

    pub fn legacy_to_string(&self, legacy_id: u32) -> Option<&str> {
        self.legacy_to_string.get(&legacy_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.string_to_legacy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.string_to_legacy.is_empty()
    }
}

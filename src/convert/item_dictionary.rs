//! Item identifier dictionaries, one per item list generation.
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use log::debug;
use serde::Deserialize;

use super::protocol::MappingProtocol;
use super::MappingError;
use crate::consts::resources;
use crate::fs_manager;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTypeEntry {
    pub string_id: String,
    pub numeric_id: i16,
    pub component_based: bool,
}

#[derive(Deserialize)]
struct RawItemEntry {
    runtime_id: i16,
    component_based: bool,
}

/// Maps item string ids to the numeric ids a client generation expects, and back.
#[derive(Debug, Clone, Default)]
pub struct ItemTypeDictionary {
    entries: Vec<ItemTypeEntry>,
    string_to_int: HashMap<String, i16>,
    int_to_string: HashMap<i16, String>,
}

impl ItemTypeDictionary {
    pub fn new(entries: Vec<ItemTypeEntry>) -> Self {
        let mut string_to_int = HashMap::with_capacity(entries.len());
        let mut int_to_string = HashMap::with_capacity(entries.len());
        for entry in &entries {
            string_to_int.insert(entry.string_id.clone(), entry.numeric_id);
            int_to_string.insert(entry.numeric_id, entry.string_id.clone());
        }

        Self {
            entries,
            string_to_int,
            int_to_string,
        }
    }

    /// Parses a `required_item_list` document.
    pub fn from_json<T: AsRef<[u8]>>(json: T) -> Result<Self, serde_json::Error> {
        let raw: HashMap<String, RawItemEntry> = serde_json::from_slice(json.as_ref())?;
        let mut entries: Vec<ItemTypeEntry> = raw
            .into_iter()
            .map(|(string_id, entry)| ItemTypeEntry {
                string_id,
                numeric_id: entry.runtime_id,
                component_based: entry.component_based,
            })
            .collect();
        entries.sort_by_key(|entry| entry.numeric_id);

        Ok(Self::new(entries))
    }

    pub fn entries(&self) -> &[ItemTypeEntry] {
        &self.entries
    }

    pub fn from_string_id(&self, string_id: &str) -> Option<i16> {
        self.string_to_int.get(string_id).copied()
    }

    pub fn from_int_id(&self, numeric_id: i16) -> Option<&str> {
        self.int_to_string.get(&numeric_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Every item dictionary the server needs, shared between the protocols using the same one.
#[derive(Debug, Clone)]
pub struct ItemDictionaries {
    dictionaries: HashMap<MappingProtocol, Arc<ItemTypeDictionary>>,
}

impl ItemDictionaries {
    pub fn load(data_path: &Path) -> Result<Self, MappingError> {
        let mut loaded: HashMap<MappingProtocol, Arc<ItemTypeDictionary>> = HashMap::new();
        let mut dictionaries = HashMap::new();

        for protocol in MappingProtocol::ALL {
            let generation = protocol.dictionary_protocol();
            let dictionary = match loaded.get(&generation) {
                Some(dictionary) => Arc::clone(dictionary),
                None => {
                    let dictionary = Arc::new(Self::load_dictionary(data_path, generation)?);
                    debug!(
                        "Loaded {} item types for {generation}",
                        dictionary.len()
                    );
                    loaded.insert(generation, Arc::clone(&dictionary));
                    dictionary
                }
            };
            dictionaries.insert(protocol, dictionary);
        }

        Ok(Self { dictionaries })
    }

    fn load_dictionary(
        data_path: &Path,
        generation: MappingProtocol,
    ) -> Result<ItemTypeDictionary, MappingError> {
        let file_name = format!(
            "{}{}.json",
            resources::REQUIRED_ITEM_LIST,
            generation.route().item_list
        );
        let (path, contents) = fs_manager::read_resource(data_path, &file_name)?;
        ItemTypeDictionary::from_json(&contents).map_err(|source| MappingError::Json { path, source })
    }

    /// The dictionary of the item list generation `protocol` belongs to.
    pub fn dictionary(&self, protocol: MappingProtocol) -> Arc<ItemTypeDictionary> {
        Arc::clone(&self.dictionaries[&protocol])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn test_from_json() {
        let dictionary = ItemTypeDictionary::from_json(
            r#"{
                "minecraft:stone": {"runtime_id": 1, "component_based": false},
                "minecraft:shield": {"runtime_id": 355, "component_based": true}
            }"#,
        )
        .unwrap();

        assert_eq!(dictionary.len(), 2);
        assert_eq!(dictionary.from_string_id("minecraft:shield"), Some(355));
        assert_eq!(dictionary.from_int_id(1), Some("minecraft:stone"));
        assert_eq!(dictionary.from_int_id(2), None);
        assert_eq!(dictionary.entries()[0].string_id, "minecraft:stone");
        assert!(dictionary.entries()[1].component_based);
    }

    #[test]
    fn test_negative_runtime_ids() {
        let dictionary = ItemTypeDictionary::from_json(
            r#"{"minecraft:camera": {"runtime_id": -202, "component_based": false}}"#,
        )
        .unwrap();
        assert_eq!(dictionary.from_string_id("minecraft:camera"), Some(-202));
    }

    #[test]
    fn test_load_shares_generations() {
        let data = test_support::write_resources();
        let dictionaries = ItemDictionaries::load(data.path()).unwrap();

        let a = dictionaries.dictionary(MappingProtocol::V1_17_30);
        let b = dictionaries.dictionary(MappingProtocol::V1_17_40);
        assert!(Arc::ptr_eq(&a, &b));

        let current = dictionaries.dictionary(MappingProtocol::V1_18_10);
        assert!(!Arc::ptr_eq(&a, &current));
        assert_eq!(current.from_string_id("minecraft:stone"), Some(1));
    }

    #[test]
    fn test_load_missing_generation() {
        let data = test_support::write_resources();
        std::fs::remove_file(data.path().join("required_item_list-1.17.10.json")).unwrap();
        assert!(matches!(
            ItemDictionaries::load(data.path()),
            Err(MappingError::MissingResource { .. })
        ));
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let data = test_support::write_resources();
        std::fs::write(
            data.path().join("required_item_list.json"),
            b"{\"minecraft:st\xffne\": {\"runtime_id\": 1, \"component_based\": false}}",
        )
        .unwrap();

        assert!(matches!(
            ItemDictionaries::load(data.path()),
            Err(MappingError::Json { .. })
        ));
    }
}

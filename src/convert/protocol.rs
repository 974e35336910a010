//! Supported Bedrock protocol revisions and which resource tables each of them reads.
use std::collections::BTreeMap;
use std::fmt;

use super::MappingError;

/// Protocol revisions that get their own block mapping. Variants are declared in ascending
/// protocol order, so comparisons follow protocol age.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MappingProtocol {
    V1_17_0,
    V1_17_10,
    V1_17_30,
    V1_17_40,
    V1_18_0,
    V1_18_10,
}

/// File name suffixes of the tables a protocol is built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceRoute {
    pub canonical_states: &'static str,
    pub legacy_state_map: &'static str,
    pub item_list: &'static str,
}

impl MappingProtocol {
    pub const ALL: [MappingProtocol; 6] = [
        MappingProtocol::V1_18_10,
        MappingProtocol::V1_18_0,
        MappingProtocol::V1_17_40,
        MappingProtocol::V1_17_30,
        MappingProtocol::V1_17_10,
        MappingProtocol::V1_17_0,
    ];

    pub const CURRENT: MappingProtocol = MappingProtocol::V1_18_10;

    /// First revision where the overworld reaches below y=0.
    pub const NEGATIVE_HEIGHT: MappingProtocol = MappingProtocol::V1_18_0;

    pub fn protocol_id(self) -> u32 {
        match self {
            MappingProtocol::V1_17_0 => 440,
            MappingProtocol::V1_17_10 => 448,
            MappingProtocol::V1_17_30 => 465,
            MappingProtocol::V1_17_40 => 471,
            MappingProtocol::V1_18_0 => 475,
            MappingProtocol::V1_18_10 => 486,
        }
    }

    pub fn from_protocol_id(protocol_id: u32) -> Result<Self, MappingError> {
        Self::ALL
            .into_iter()
            .find(|protocol| protocol.protocol_id() == protocol_id)
            .ok_or(MappingError::UnsupportedProtocol(protocol_id))
    }

    pub fn minecraft_version(self) -> &'static str {
        match self {
            MappingProtocol::V1_17_0 => "1.17.0",
            MappingProtocol::V1_17_10 => "1.17.10",
            MappingProtocol::V1_17_30 => "1.17.30",
            MappingProtocol::V1_17_40 => "1.17.40",
            MappingProtocol::V1_18_0 => "1.18.0",
            MappingProtocol::V1_18_10 => "1.18.10",
        }
    }

    pub fn route(self) -> ResourceRoute {
        let (canonical_states, legacy_state_map, item_list) = match self {
            MappingProtocol::V1_18_10 => ("", "", ""),
            MappingProtocol::V1_18_0 => ("-1.18.0", "-1.18.0", "-1.18.0"),
            // 1.17.40 clients already use the 1.18.0 tables.
            MappingProtocol::V1_17_40 => ("-1.18.0", "-1.18.0", "-1.17.40"),
            MappingProtocol::V1_17_30 => ("-1.17.30", "-1.18.0", "-1.17.40"),
            MappingProtocol::V1_17_10 => ("-1.17.10", "-1.17.10", "-1.17.10"),
            MappingProtocol::V1_17_0 => ("-1.17.0", "-1.17.10", "-1.17.10"),
        };
        ResourceRoute {
            canonical_states,
            legacy_state_map,
            item_list,
        }
    }

    /// The revision whose item dictionary this protocol shares.
    pub fn dictionary_protocol(self) -> MappingProtocol {
        match self {
            MappingProtocol::V1_18_10 => MappingProtocol::V1_18_10,
            MappingProtocol::V1_18_0 => MappingProtocol::V1_18_0,
            MappingProtocol::V1_17_40 | MappingProtocol::V1_17_30 => MappingProtocol::V1_17_40,
            MappingProtocol::V1_17_10 | MappingProtocol::V1_17_0 => MappingProtocol::V1_17_10,
        }
    }

    pub fn has_negative_height(self) -> bool {
        self >= Self::NEGATIVE_HEIGHT
    }
}

impl fmt::Display for MappingProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.minecraft_version(), self.protocol_id())
    }
}

/// Groups viewers by the mapping protocol they speak, so each protocol is encoded once.
pub fn sort_by_protocol<T, I, F>(
    viewers: I,
    protocol_id_of: F,
) -> Result<BTreeMap<MappingProtocol, Vec<T>>, MappingError>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> u32,
{
    let mut sorted: BTreeMap<MappingProtocol, Vec<T>> = BTreeMap::new();
    for viewer in viewers {
        let protocol = MappingProtocol::from_protocol_id(protocol_id_of(&viewer))?;
        sorted.entry(protocol).or_default().push(viewer);
    }
    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_follows_protocol_ids() {
        let mut ids: Vec<u32> = MappingProtocol::ALL
            .iter()
            .map(|protocol| protocol.protocol_id())
            .collect();
        let mut sorted = MappingProtocol::ALL.to_vec();
        sorted.sort();
        ids.sort();

        assert_eq!(
            sorted.iter().map(|p| p.protocol_id()).collect::<Vec<_>>(),
            ids
        );
        assert!(MappingProtocol::V1_18_0 > MappingProtocol::V1_17_40);
    }

    #[test]
    fn test_from_protocol_id() {
        for protocol in MappingProtocol::ALL {
            assert_eq!(
                MappingProtocol::from_protocol_id(protocol.protocol_id()).unwrap(),
                protocol
            );
        }
        assert!(matches!(
            MappingProtocol::from_protocol_id(100),
            Err(MappingError::UnsupportedProtocol(100))
        ));
    }

    #[test]
    fn test_routes() {
        let route = MappingProtocol::V1_17_30.route();
        assert_eq!(route.canonical_states, "-1.17.30");
        assert_eq!(route.legacy_state_map, "-1.18.0");
        assert_eq!(route.item_list, "-1.17.40");

        let route = MappingProtocol::V1_17_40.route();
        assert_eq!(route.canonical_states, "-1.18.0");
        assert_eq!(route.item_list, "-1.17.40");

        assert_eq!(MappingProtocol::CURRENT.route().canonical_states, "");
        assert_eq!(MappingProtocol::V1_17_0.route().legacy_state_map, "-1.17.10");
    }

    #[test]
    fn test_dictionary_protocol_shares_item_list() {
        for protocol in MappingProtocol::ALL {
            assert_eq!(
                protocol.route().item_list,
                protocol.dictionary_protocol().route().item_list
            );
        }
    }

    #[test]
    fn test_negative_height() {
        assert!(MappingProtocol::V1_18_10.has_negative_height());
        assert!(MappingProtocol::V1_18_0.has_negative_height());
        assert!(!MappingProtocol::V1_17_40.has_negative_height());
    }

    #[test]
    fn test_sort_by_protocol() {
        let viewers = vec![("a", 486), ("b", 440), ("c", 486), ("d", 475)];
        let sorted = sort_by_protocol(viewers, |viewer| viewer.1).unwrap();

        assert_eq!(sorted.len(), 3);
        assert_eq!(
            sorted[&MappingProtocol::V1_18_10],
            vec![("a", 486), ("c", 486)]
        );
        assert_eq!(sorted[&MappingProtocol::V1_17_0], vec![("b", 440)]);
        assert_eq!(sorted[&MappingProtocol::V1_18_0], vec![("d", 475)]);

        assert!(sort_by_protocol(vec![1u32], |id| *id).is_err());
    }
}

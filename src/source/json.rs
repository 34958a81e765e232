// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::io;

use serde::Deserialize;

use super::model::{Element, NodeElement, WayElement};
use crate::Result;

/// Top-level shape of an [Overpass API JSON](https://wiki.openstreetmap.org/wiki/OSM_JSON) document.
#[derive(Debug, Deserialize)]
struct Document {
    elements: Vec<RawElement>,
}

/// A single entry of `elements`, validated for the fields its type requires.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawElement {
    Node {
        id: RawId,
        lat: f64,
        lon: f64,
        #[serde(default)]
        tags: HashMap<String, String>,
    },
    Way {
        id: RawId,
        nodes: Vec<RawId>,
        #[serde(default)]
        tags: HashMap<String, String>,
    },
    #[serde(other)]
    Other,
}

/// Element ids are usually integers, but some tools emit them as strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Str(String),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Int(i) => i.to_string(),
            RawId::Str(s) => s,
        }
    }
}

impl RawElement {
    fn into_element(self) -> Option<Element> {
        match self {
            Self::Node { id, lat, lon, tags } => Some(Element::Node(NodeElement {
                id: id.into(),
                lat,
                lon,
                tags,
            })),
            Self::Way { id, nodes, tags } => Some(Element::Way(WayElement {
                id: id.into(),
                nodes: nodes.into_iter().map(String::from).collect(),
                tags,
            })),
            Self::Other => None,
        }
    }
}

fn collect_elements(doc: Document) -> Vec<Element> {
    let total = doc.elements.len();
    let elements: Vec<Element> = doc
        .elements
        .into_iter()
        .filter_map(RawElement::into_element)
        .collect();

    if elements.len() != total {
        log::debug!(
            "ignored {} elements which are neither nodes nor ways",
            total - elements.len()
        );
    }
    elements
}

/// Parses all elements from a JSON document provided by a reader.
pub(super) fn elements_from_io<R: io::Read>(reader: R) -> Result<Vec<Element>> {
    let doc: Document = serde_json::from_reader(reader)?;
    Ok(collect_elements(doc))
}

/// Parses all elements from an in-memory JSON document.
pub(super) fn elements_from_buffer(data: &[u8]) -> Result<Vec<Element>> {
    let doc: Document = serde_json::from_slice(data)?;
    Ok(collect_elements(doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    macro_rules! tags {
        {} => { HashMap::default() };
        {$( $k:literal : $v:literal ),+} => {
            HashMap::from_iter([ $( ($k.to_string(), $v.to_string()) ),+ ])
        };
    }

    const SIMPLE_JSON: &[u8] = include_bytes!("test_fixtures/simple.json");

    fn get_expected_elements() -> Vec<Element> {
        vec![
            Element::Node(NodeElement {
                id: "10".to_string(),
                lat: 33.5,
                lon: -117.5,
                tags: tags! {"highway": "traffic_signals"},
            }),
            Element::Node(NodeElement {
                id: "20".to_string(),
                lat: 33.5078125,
                lon: -117.5,
                tags: tags! {},
            }),
            Element::Node(NodeElement {
                id: "30".to_string(),
                lat: 33.5078125,
                lon: -117.515625,
                tags: tags! {"highway": "stop"},
            }),
            Element::Node(NodeElement {
                id: "40".to_string(),
                lat: 33.515625,
                lon: -117.53125,
                tags: tags! {},
            }),
            Element::Way(WayElement {
                id: "1".to_string(),
                nodes: vec!["10".to_string(), "20".to_string(), "30".to_string()],
                tags: tags! {"highway": "residential", "name": "Main St"},
            }),
            Element::Way(WayElement {
                id: "2".to_string(),
                nodes: vec!["30".to_string(), "40".to_string()],
                tags: tags! {"highway": "service"},
            }),
            Element::Way(WayElement {
                id: "3".to_string(),
                nodes: vec!["30".to_string(), "99".to_string()],
                tags: tags! {"name": "Oak Ave"},
            }),
        ]
    }

    #[test]
    fn parse_from_buf() -> Result<()> {
        assert_eq!(elements_from_buffer(SIMPLE_JSON)?, get_expected_elements());
        Ok(())
    }

    #[test]
    fn parse_from_io() -> Result<()> {
        assert_eq!(
            elements_from_io(io::Cursor::new(SIMPLE_JSON))?,
            get_expected_elements()
        );
        Ok(())
    }

    #[test]
    fn string_ids() -> Result<()> {
        let data = br#"{"elements": [
            {"type": "node", "id": "n1", "lat": 1.5, "lon": 2},
            {"type": "way", "id": "w1", "nodes": ["n1", 2]}
        ]}"#;
        let elements = elements_from_buffer(data)?;
        assert_eq!(elements.len(), 2);
        match &elements[0] {
            Element::Node(n) => assert_eq!(n.id, "n1"),
            other => panic!("expected a node, got {other:?}"),
        }
        match &elements[1] {
            Element::Way(w) => assert_eq!(w.nodes, vec!["n1".to_string(), "2".to_string()]),
            other => panic!("expected a way, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn missing_elements_is_malformed() {
        let err = elements_from_buffer(br#"{"version": 0.6}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedSource(_)), "{err:?}");
    }

    #[test]
    fn node_without_coordinates_is_malformed() {
        let data = br#"{"elements": [{"type": "node", "id": 1, "lat": 1.0}]}"#;
        let err = elements_from_buffer(data).unwrap_err();
        assert!(matches!(err, Error::MalformedSource(_)), "{err:?}");
    }

    #[test]
    fn way_without_nodes_is_malformed() {
        let data = br#"{"elements": [{"type": "way", "id": 1, "tags": {"name": "A"}}]}"#;
        let err = elements_from_buffer(data).unwrap_err();
        assert!(matches!(err, Error::MalformedSource(_)), "{err:?}");
    }

    #[test]
    fn not_json_is_malformed() {
        let err = elements_from_buffer(b"<osm></osm>").unwrap_err();
        assert!(matches!(err, Error::MalformedSource(_)), "{err:?}");
    }
}

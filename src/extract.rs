// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Conversion of raw map [Elements](Element) into a node table and an edge table.

use std::collections::HashSet;

use crate::source::{Element, NodeElement, WayElement};
use crate::{Edge, Node, Tables};

/// Helper object used for storing state related to converting map [Elements](Element)
/// into [Tables].
#[derive(Debug, Default)]
struct Extractor {
    tables: Tables,
    seen_nodes: HashSet<String>,
    seen_edges: HashSet<String>,
    duplicate_nodes: usize,
    colliding_edge_ids: usize,
    unnamed_ways: usize,
}

impl Extractor {
    fn add_element(&mut self, e: Element) {
        match e {
            Element::Node(n) => self.add_node(n),
            Element::Way(w) => self.add_way(w),
        }
    }

    fn add_node(&mut self, n: NodeElement) {
        if !self.seen_nodes.insert(n.id.clone()) {
            log::warn!("duplicate node {} - keeping the first occurrence", n.id);
            self.duplicate_nodes += 1;
            return;
        }

        let (has_traffic_signal, has_stop) = traffic_control(&n);
        self.tables.nodes.push(Node {
            id: n.id,
            lat: n.lat,
            lon: n.lon,
            has_traffic_signal,
            has_stop,
        });
    }

    fn add_way(&mut self, w: WayElement) {
        let name = match w.tags.get("name") {
            Some(name) if !name.is_empty() => name,
            _ => {
                log::debug!("skipping way {} without a name", w.id);
                self.unnamed_ways += 1;
                return;
            }
        };

        for pair in w.nodes.windows(2) {
            let edge = Edge {
                id: edge_id(&w.id, &pair[0], &pair[1]),
                name: name.clone(),
                node1: pair[0].clone(),
                node2: pair[1].clone(),
            };

            if !self.seen_edges.insert(edge.id.clone()) {
                log::warn!("edge id {} is not unique (way {})", edge.id, w.id);
                self.colliding_edge_ids += 1;
            }
            self.tables.edges.push(edge);
        }
    }

    fn finish(self) -> Tables {
        log::info!(
            "extracted {} nodes and {} edges ({} duplicate nodes dropped, {} unnamed ways skipped, {} non-unique edge ids)",
            self.tables.nodes.len(),
            self.tables.edges.len(),
            self.duplicate_nodes,
            self.unnamed_ways,
            self.colliding_edge_ids,
        );
        self.tables
    }
}

/// Returns `(has_traffic_signal, has_stop)` for a node, based on its `highway` tag.
fn traffic_control(n: &NodeElement) -> (bool, bool) {
    match n.tags.get("highway").map(String::as_str) {
        Some("traffic_signals") => (true, false),
        Some("stop") => (false, true),
        _ => (false, false),
    }
}

/// Builds the label of an edge by concatenating the way id and both node ids.
///
/// The result is not guaranteed to be unique - way `1` with nodes `23`, `4`
/// and way `12` with nodes `3`, `4` both produce `1234`.
pub fn edge_id(way_id: &str, node1: &str, node2: &str) -> String {
    let mut id = String::with_capacity(way_id.len() + node1.len() + node2.len());
    id.push_str(way_id);
    id.push_str(node1);
    id.push_str(node2);
    id
}

/// Converts map elements into a node table and an edge table.
///
/// Every node element becomes a [Node] (later duplicates of an id are dropped).
/// Every way with a non-empty `name` tag becomes one [Edge] per consecutive
/// pair of its nodes; unnamed ways are not part of the street network.
/// Edges may reference nodes absent from the node table - see [crate::filter].
pub fn extract<I: IntoIterator<Item = Element>>(elements: I) -> Tables {
    let mut x = Extractor::default();
    elements.into_iter().for_each(|e| x.add_element(e));
    x.finish()
}

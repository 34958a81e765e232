// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::btree_map::{BTreeMap, Entry};

use crate::{Dataset, Error, Node, Result, WeightedEdge};

/// Represents a connection from a specific [Node] in a [Graph].
#[derive(Debug, Clone, PartialEq)]
pub struct Adjacent {
    pub to: String,
    pub weight: f64,
}

/// Undirected, weighted street graph handed over to rendering.
///
/// Every node is labelled with its id, and every edge carries the `weight`
/// computed by the [weight](crate::weight) stage. Parallel edges between
/// the same pair of nodes collapse into one, with the weight of the last one added.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Graph(BTreeMap<String, (Node, Vec<Adjacent>)>);

impl Graph {
    /// Creates a graph from processed tables.
    ///
    /// Every edge endpoint must exist in `nodes`,
    /// otherwise [Error::InvariantViolation] is returned.
    pub fn from_tables(nodes: &[Node], edges: &[WeightedEdge]) -> Result<Self> {
        let mut g = Self::default();
        for n in nodes {
            g.set_node(n.clone());
        }
        for e in edges {
            for id in [&e.edge.node1, &e.edge.node2] {
                if !g.0.contains_key(id.as_str()) {
                    return Err(Error::InvariantViolation(format!(
                        "edge {} references node {} which is not in the node table",
                        e.edge.id, id
                    )));
                }
            }
            g.set_edge(&e.edge.node1, &e.edge.node2, e.weight);
        }
        Ok(g)
    }

    /// Creates a graph from a [Dataset].
    pub fn from_dataset(d: &Dataset) -> Result<Self> {
        Self::from_tables(&d.nodes, &d.edges)
    }

    /// Returns the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of distinct undirected edges, self-loops included.
    pub fn edge_count(&self) -> usize {
        self.edges().count()
    }

    /// Returns an iterator over all distinct undirected edges
    /// as `(node_id, node_id, weight)` triples, each reported once.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.0
            .iter()
            .flat_map(|(from, (_, edges))| {
                edges
                    .iter()
                    .map(move |e| (from.as_str(), e.to.as_str(), e.weight))
            })
            .filter(|&(from, to, _)| from <= to)
    }

    /// Returns an iterator over all [Nodes](Node) in the graph, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.0.values().map(|(node, _)| node)
    }

    /// Retrieves a [Node] with the provided id.
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.0.get(id).map(|(node, _)| node)
    }

    /// Returns the display label of a node, which is its id.
    pub fn label(&self, id: &str) -> Option<&str> {
        self.get_node(id).map(|n| n.id.as_str())
    }

    /// Gets all [Adjacent] connections of a node with a given id.
    pub fn get_edges(&self, id: &str) -> &[Adjacent] {
        self.0
            .get(id)
            .map(|(_, e)| e.as_slice())
            .unwrap_or_default()
    }

    /// Gets the weight of an edge between two nodes.
    /// If such an edge doesn't exist, returns [f64::INFINITY].
    pub fn get_edge(&self, a: &str, b: &str) -> f64 {
        self.get_edges(a)
            .iter()
            .find(|e| e.to == b)
            .map(|e| e.weight)
            .unwrap_or(f64::INFINITY)
    }

    fn set_node(&mut self, node: Node) {
        match self.0.entry(node.id.clone()) {
            Entry::Vacant(e) => {
                e.insert((node, Vec::default()));
            }
            Entry::Occupied(mut e) => {
                e.get_mut().0 = node;
            }
        }
    }

    fn set_directed_edge(&mut self, from: &str, to: &str, weight: f64) {
        if let Some((_, edges)) = self.0.get_mut(from) {
            if let Some(candidate) = edges.iter_mut().find(|e| e.to == to) {
                candidate.weight = weight;
            } else {
                edges.push(Adjacent {
                    to: to.to_string(),
                    weight,
                });
            }
        }
    }

    fn set_edge(&mut self, a: &str, b: &str, weight: f64) {
        self.set_directed_edge(a, b, weight);
        if a != b {
            self.set_directed_edge(b, a, weight);
        }
    }
}

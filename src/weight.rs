// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Attaching weights to filtered edges.

use std::collections::HashMap;

use crate::{manhattan_distance, Edge, Error, Node, Result, WeightedEdge};

/// Read-only lookup of [Nodes](Node) by their id, built once per node table.
#[derive(Debug, Default, Clone)]
pub struct NodeIndex<'a>(HashMap<&'a str, &'a Node>);

impl<'a> NodeIndex<'a> {
    /// Indexes all nodes of a table. If ids repeat, the first node wins.
    pub fn new(nodes: &'a [Node]) -> Self {
        let mut index = HashMap::with_capacity(nodes.len());
        for n in nodes {
            index.entry(n.id.as_str()).or_insert(n);
        }
        Self(index)
    }

    /// Retrieves a [Node] with the provided id.
    pub fn get(&self, id: &str) -> Option<&'a Node> {
        self.0.get(id).copied()
    }

    fn endpoint(&self, edge: &Edge, id: &str) -> Result<&'a Node> {
        self.get(id).ok_or_else(|| {
            Error::InvariantViolation(format!(
                "edge {} references node {} which is not in the node table",
                edge.id, id
            ))
        })
    }
}

/// Calculates the weight of a single edge:
/// the [manhattan_distance] between its endpoints.
///
/// Both endpoints must be present in the index - a missing endpoint
/// means the [integrity filter](crate::filter) did not run or was bypassed,
/// and is reported as [Error::InvariantViolation].
pub fn edge_weight(index: &NodeIndex<'_>, edge: &Edge) -> Result<f64> {
    let left = index.endpoint(edge, &edge.node1)?;
    let right = index.endpoint(edge, &edge.node2)?;
    Ok(manhattan_distance(left.lat, left.lon, right.lat, right.lon))
}

/// Attaches a weight and a normalized weight to every edge.
///
/// Self-loops get a weight of zero and are kept.
pub fn weigh<I: IntoIterator<Item = Edge>>(
    index: &NodeIndex<'_>,
    edges: I,
) -> Result<Vec<WeightedEdge>> {
    let weighted = edges
        .into_iter()
        .map(|e| edge_weight(index, &e).map(|w| WeightedEdge::new(e, w)))
        .collect::<Result<Vec<_>>>()?;

    let zero_weight = weighted.iter().filter(|e| e.weight == 0.0).count();
    log::info!(
        "weighted {} edges ({} with zero weight)",
        weighted.len(),
        zero_weight
    );
    Ok(weighted)
}

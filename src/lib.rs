// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Conversion of [OpenStreetMap](https://www.openstreetmap.org/) extracts into
//! weighted street graph tables.
//!
//! The conversion runs in three strictly sequential stages:
//! 1. [extract] turns raw map elements into a node table and an edge table,
//!    one edge per consecutive pair of nodes of every named way,
//! 2. [filter] restricts both tables to mutually consistent entries,
//! 3. [weight] attaches a coordinate-difference weight and its integer-normalized
//!    counterpart to every edge.
//!
//! The [pipeline] module ties the stages together with tabular I/O,
//! and [Graph] is the hand-off structure for rendering the result.
//!
//! # Example
//!
//! ```no_run
//! let paths = streetgraph::pipeline::Paths::in_dir("data/mapdata.json", "data");
//! let options = streetgraph::pipeline::Options::default();
//! let summary = streetgraph::pipeline::run(&paths, &options)
//!     .expect("failed to convert mapdata.json");
//!
//! println!("{} nodes, {} edges", summary.processed_nodes, summary.processed_edges);
//! ```

mod distance;
mod error;
pub mod extract;
pub mod filter;
mod graph;
pub mod pipeline;
pub mod source;
pub mod table;
pub mod weight;

pub use distance::{manhattan_distance, normalize_weight, NORMALIZATION_FACTOR};
pub use error::{Error, Result};
pub use graph::{Adjacent, Graph};

/// A point of the street network.
///
/// `id` is unique within a node table. Nodes are never mutated after extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub has_traffic_signal: bool,
    pub has_stop: bool,
}

/// One routable segment between two consecutive nodes of a named way.
///
/// `node1` and `node2` only name nodes; until the [filter] stage runs
/// they might not exist in the corresponding node table.
///
/// `id` is the concatenation of the way id and both node ids. It is a label,
/// not a key: different ways may produce identical ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub id: String,
    pub name: String,
    pub node1: String,
    pub node2: String,
}

/// An [Edge] with its weight attached by the [weight] stage.
///
/// `weight` is never negative, and `normalized_weight` always equals
/// [normalize_weight] of `weight`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedEdge {
    pub edge: Edge,
    pub weight: f64,
    pub normalized_weight: i64,
}

impl WeightedEdge {
    /// Attaches `weight` (and its normalized counterpart) to an edge.
    pub fn new(edge: Edge, weight: f64) -> Self {
        Self {
            edge,
            weight,
            normalized_weight: normalize_weight(weight),
        }
    }
}

/// A node table together with an edge table.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Tables {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// The final, weighted tables: every edge endpoint exists in `nodes`,
/// and every node is referenced by at least one edge.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Dataset {
    pub nodes: Vec<Node>,
    pub edges: Vec<WeightedEdge>,
}

// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

/// Represents an [OSM node](https://wiki.openstreetmap.org/wiki/Node).
#[derive(Debug, Clone, PartialEq)]
pub struct NodeElement {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub tags: HashMap<String, String>,
}

/// Represents an [OSM way](https://wiki.openstreetmap.org/wiki/Way).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WayElement {
    pub id: String,
    pub nodes: Vec<String>,
    pub tags: HashMap<String, String>,
}

/// Union over the [OSM elements](https://wiki.openstreetmap.org/wiki/Elements)
/// relevant for building a street graph. Other element types are dropped
/// while reading.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Node(NodeElement),
    Way(WayElement),
}

// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Flat, comma-separated node and edge tables.
//!
//! | Table          | Columns                                             |
//! |----------------|-----------------------------------------------------|
//! | nodes          | `id, lat, lon, traffic_signals, stop`               |
//! | edges          | `id, name, node1, node2`                            |
//! | weighted edges | `id, name, node1, node2, weight, normalized_weight` |
//!
//! Flags are written as `TRUE`/`FALSE` and read case-insensitively.
//! Coordinates and weights must be finite numbers.

use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::{Edge, Error, Node, Result, WeightedEdge};

pub const NODE_HEADER: [&str; 5] = ["id", "lat", "lon", "traffic_signals", "stop"];
pub const EDGE_HEADER: [&str; 4] = ["id", "name", "node1", "node2"];
pub const WEIGHTED_EDGE_HEADER: [&str; 6] =
    ["id", "name", "node1", "node2", "weight", "normalized_weight"];

fn flag(b: bool) -> &'static str {
    if b {
        "TRUE"
    } else {
        "FALSE"
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if s.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(serde::de::Error::custom(format!(
            "expected TRUE or FALSE, got {s:?}"
        )))
    }
}

fn deserialize_coordinate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = f64::deserialize(deserializer)?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(serde::de::Error::custom(format!(
            "expected a finite coordinate, got {v}"
        )))
    }
}

fn deserialize_weight<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = f64::deserialize(deserializer)?;
    if v.is_finite() && v >= 0.0 {
        Ok(v)
    } else {
        Err(serde::de::Error::custom(format!(
            "expected a finite, non-negative weight, got {v}"
        )))
    }
}

/// Writes a node table, including the header row.
pub fn write_nodes<W: io::Write>(w: W, nodes: &[Node]) -> Result<()> {
    let mut w = csv::Writer::from_writer(w);
    w.write_record(NODE_HEADER)?;
    for n in nodes {
        w.write_record([
            n.id.as_str(),
            n.lat.to_string().as_str(),
            n.lon.to_string().as_str(),
            flag(n.has_traffic_signal),
            flag(n.has_stop),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Writes an edge table without weights, including the header row.
pub fn write_edges<W: io::Write>(w: W, edges: &[Edge]) -> Result<()> {
    let mut w = csv::Writer::from_writer(w);
    w.write_record(EDGE_HEADER)?;
    for e in edges {
        w.write_record([&e.id, &e.name, &e.node1, &e.node2])?;
    }
    w.flush()?;
    Ok(())
}

/// Writes an edge table with weights, including the header row.
pub fn write_weighted_edges<W: io::Write>(w: W, edges: &[WeightedEdge]) -> Result<()> {
    let mut w = csv::Writer::from_writer(w);
    w.write_record(WEIGHTED_EDGE_HEADER)?;
    for e in edges {
        w.write_record([
            e.edge.id.as_str(),
            e.edge.name.as_str(),
            e.edge.node1.as_str(),
            e.edge.node2.as_str(),
            e.weight.to_string().as_str(),
            e.normalized_weight.to_string().as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct NodeRow {
    id: String,
    #[serde(deserialize_with = "deserialize_coordinate")]
    lat: f64,
    #[serde(deserialize_with = "deserialize_coordinate")]
    lon: f64,
    #[serde(deserialize_with = "deserialize_flag")]
    traffic_signals: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    stop: bool,
}

impl From<NodeRow> for Node {
    fn from(r: NodeRow) -> Self {
        Node {
            id: r.id,
            lat: r.lat,
            lon: r.lon,
            has_traffic_signal: r.traffic_signals,
            has_stop: r.stop,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EdgeRow {
    id: String,
    name: String,
    node1: String,
    node2: String,
}

impl From<EdgeRow> for Edge {
    fn from(r: EdgeRow) -> Self {
        Edge {
            id: r.id,
            name: r.name,
            node1: r.node1,
            node2: r.node2,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WeightedEdgeRow {
    id: String,
    name: String,
    node1: String,
    node2: String,
    #[serde(deserialize_with = "deserialize_weight")]
    weight: f64,
    normalized_weight: i64,
}

impl From<WeightedEdgeRow> for WeightedEdge {
    fn from(r: WeightedEdgeRow) -> Self {
        WeightedEdge {
            edge: Edge {
                id: r.id,
                name: r.name,
                node1: r.node1,
                node2: r.node2,
            },
            weight: r.weight,
            normalized_weight: r.normalized_weight,
        }
    }
}

fn classify(e: csv::Error) -> Error {
    if e.is_io_error() {
        Error::Csv(e)
    } else {
        Error::MalformedSource(e.to_string())
    }
}

fn read_rows<R, Row, T>(r: R) -> Result<Vec<T>>
where
    R: io::Read,
    Row: for<'de> Deserialize<'de>,
    T: From<Row>,
{
    csv::Reader::from_reader(r)
        .deserialize::<Row>()
        .map(|row| row.map(T::from).map_err(classify))
        .collect()
}

fn open<P: AsRef<Path>>(path: P) -> Result<File> {
    let path = path.as_ref();
    File::open(path).map_err(|e| Error::SourceUnavailable(path.to_path_buf(), e))
}

/// Reads a node table written by [write_nodes].
///
/// Node ids stay unique: only the first row of every id is kept.
pub fn read_nodes<R: io::Read>(r: R) -> Result<Vec<Node>> {
    let mut nodes = read_rows::<_, NodeRow, Node>(r)?;
    let total = nodes.len();

    let mut seen = HashSet::with_capacity(total);
    nodes.retain(|n| {
        let first = seen.insert(n.id.clone());
        if !first {
            log::warn!("duplicate node {} - keeping the first row", n.id);
        }
        first
    });

    if nodes.len() != total {
        log::warn!("dropped {} duplicate node rows", total - nodes.len());
    }
    Ok(nodes)
}

/// Reads an edge table written by [write_edges].
///
/// Extra columns (like `weight`) are ignored.
pub fn read_edges<R: io::Read>(r: R) -> Result<Vec<Edge>> {
    read_rows::<_, EdgeRow, _>(r)
}

/// Reads an edge table written by [write_weighted_edges].
pub fn read_weighted_edges<R: io::Read>(r: R) -> Result<Vec<WeightedEdge>> {
    read_rows::<_, WeightedEdgeRow, _>(r)
}

/// Reads a node table from a file. A missing file is [Error::SourceUnavailable].
pub fn read_nodes_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<Node>> {
    read_nodes(io::BufReader::new(open(path)?))
}

/// Reads an edge table from a file. A missing file is [Error::SourceUnavailable].
pub fn read_edges_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<Edge>> {
    read_edges(io::BufReader::new(open(path)?))
}

/// Reads a weighted edge table from a file. A missing file is [Error::SourceUnavailable].
pub fn read_weighted_edges_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<WeightedEdge>> {
    read_weighted_edges(io::BufReader::new(open(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes() -> Vec<Node> {
        vec![
            Node {
                id: "10".to_string(),
                lat: 33.5,
                lon: -117.5,
                has_traffic_signal: true,
                has_stop: false,
            },
            Node {
                id: "30".to_string(),
                lat: 33.5078125,
                lon: -117.515625,
                has_traffic_signal: false,
                has_stop: true,
            },
        ]
    }

    fn edge() -> Edge {
        Edge {
            id: "11030".to_string(),
            name: "Main St, North".to_string(),
            node1: "10".to_string(),
            node2: "30".to_string(),
        }
    }

    fn written<F: FnOnce(&mut Vec<u8>) -> Result<()>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn node_table_format() {
        let out = written(|b| write_nodes(b, &nodes()));
        assert_eq!(
            out,
            "id,lat,lon,traffic_signals,stop\n\
             10,33.5,-117.5,TRUE,FALSE\n\
             30,33.5078125,-117.515625,FALSE,TRUE\n"
        );
    }

    #[test]
    fn edge_table_format() {
        let out = written(|b| write_edges(b, &[edge()]));
        assert_eq!(out, "id,name,node1,node2\n11030,\"Main St, North\",10,30\n");
    }

    #[test]
    fn weighted_edge_table_format() {
        let out = written(|b| write_weighted_edges(b, &[WeightedEdge::new(edge(), 0.0234375)]));
        assert_eq!(
            out,
            "id,name,node1,node2,weight,normalized_weight\n\
             11030,\"Main St, North\",10,30,0.0234375,2343\n"
        );
    }

    #[test]
    fn read_back_written_tables() -> Result<()> {
        let out = written(|b| write_nodes(b, &nodes()));
        assert_eq!(read_nodes(out.as_bytes())?, nodes());

        let out = written(|b| write_weighted_edges(b, &[WeightedEdge::new(edge(), 0.0234375)]));
        assert_eq!(read_edges(out.as_bytes())?, vec![edge()]);
        assert_eq!(
            read_weighted_edges(out.as_bytes())?,
            vec![WeightedEdge::new(edge(), 0.0234375)]
        );
        Ok(())
    }

    #[test]
    fn flags_are_case_insensitive() -> Result<()> {
        let data = "id,lat,lon,traffic_signals,stop\n1,1.0,2.0,True,false\n";
        let n = read_nodes(data.as_bytes())?;
        assert!(n[0].has_traffic_signal);
        assert!(!n[0].has_stop);
        Ok(())
    }

    #[test]
    fn invalid_flag_is_malformed() {
        let data = "id,lat,lon,traffic_signals,stop\n1,1.0,2.0,yes,FALSE\n";
        let err = read_nodes(data.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MalformedSource(_)), "{err:?}");
    }

    #[test]
    fn non_finite_coordinates_are_malformed() {
        for row in ["1,NaN,2.0,FALSE,FALSE", "1,1.0,inf,FALSE,FALSE", "1,-inf,2.0,FALSE,FALSE"] {
            let data = format!("id,lat,lon,traffic_signals,stop\n{row}\n");
            let err = read_nodes(data.as_bytes()).unwrap_err();
            assert!(matches!(err, Error::MalformedSource(_)), "{row}: {err:?}");
        }
    }

    #[test]
    fn invalid_weights_are_malformed() {
        for weight in ["NaN", "inf", "-0.5"] {
            let data = format!(
                "id,name,node1,node2,weight,normalized_weight\n112,Main St,1,2,{weight},0\n"
            );
            let err = read_weighted_edges(data.as_bytes()).unwrap_err();
            assert!(matches!(err, Error::MalformedSource(_)), "{weight}: {err:?}");
        }
    }

    #[test]
    fn duplicate_node_rows_keep_the_first() -> Result<()> {
        let data = "id,lat,lon,traffic_signals,stop\n\
                    1,1.0,1.0,FALSE,FALSE\n\
                    2,2.0,2.0,FALSE,FALSE\n\
                    1,5.0,5.0,FALSE,TRUE\n";
        let n = read_nodes(data.as_bytes())?;
        assert_eq!(n.len(), 2);
        assert_eq!(n[0].id, "1");
        assert_eq!(n[0].lat, 1.0);
        assert!(!n[0].has_stop);
        assert_eq!(n[1].id, "2");
        Ok(())
    }

    #[test]
    fn missing_column_is_malformed() {
        let data = "id,name,node1\n1,Main St,10\n";
        let err = read_edges(data.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MalformedSource(_)), "{err:?}");
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_nodes_from_file(dir.path().join("nodes.csv")).unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(..)), "{err:?}");
    }
}

// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Restricting node and edge tables to mutually consistent entries.

use std::collections::HashSet;

use crate::Tables;

/// Drops dangling edges, then drops nodes which no remaining edge references.
///
/// This is a single pass, edges first. After it:
/// - both endpoints of every edge exist in the node table,
/// - every node is an endpoint of at least one edge.
///
/// Nodes are only dropped when no surviving edge references them,
/// so the second step can never create new dangling edges, and running
/// the filter over its own output changes nothing.
pub fn filter(tables: Tables) -> Tables {
    let Tables { nodes, edges } = tables;
    let (node_count, edge_count) = (nodes.len(), edges.len());

    let edges: Vec<_> = {
        let known_nodes: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        edges
            .into_iter()
            .filter(|e| {
                let keep = known_nodes.contains(e.node1.as_str())
                    && known_nodes.contains(e.node2.as_str());
                if !keep {
                    log::debug!("dropping edge {} with a dangling node reference", e.id);
                }
                keep
            })
            .collect()
    };

    let nodes: Vec<_> = {
        let referenced_nodes: HashSet<&str> = edges
            .iter()
            .flat_map(|e| [e.node1.as_str(), e.node2.as_str()])
            .collect();
        nodes
            .into_iter()
            .filter(|n| referenced_nodes.contains(n.id.as_str()))
            .collect()
    };

    log::info!(
        "integrity filter kept {}/{} nodes and {}/{} edges",
        nodes.len(),
        node_count,
        edges.len(),
        edge_count,
    );
    Tables { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Edge, Node};

    fn node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            lat: 0.0,
            lon: 0.0,
            has_traffic_signal: false,
            has_stop: false,
        }
    }

    fn edge(node1: &str, node2: &str) -> Edge {
        Edge {
            id: format!("1{node1}{node2}"),
            name: "Main St".to_string(),
            node1: node1.to_string(),
            node2: node2.to_string(),
        }
    }

    fn ids(t: &Tables) -> (Vec<&str>, Vec<&str>) {
        (
            t.nodes.iter().map(|n| n.id.as_str()).collect(),
            t.edges.iter().map(|e| e.id.as_str()).collect(),
        )
    }

    fn check_invariants(t: &Tables) {
        let nodes: HashSet<&str> = t.nodes.iter().map(|n| n.id.as_str()).collect();
        for e in &t.edges {
            assert!(nodes.contains(e.node1.as_str()), "dangling {}", e.node1);
            assert!(nodes.contains(e.node2.as_str()), "dangling {}", e.node2);
        }
        for n in &t.nodes {
            assert!(
                t.edges.iter().any(|e| e.node1 == n.id || e.node2 == n.id),
                "orphan {}",
                n.id
            );
        }
    }

    #[test]
    fn drops_dangling_edges_and_orphaned_nodes() {
        //  10 ── 20 ── 30 ── 99 (missing)
        //                    │
        //                    40 ── 50
        let t = filter(Tables {
            nodes: vec![node("10"), node("20"), node("30"), node("40"), node("50"), node("60")],
            edges: vec![
                edge("10", "20"),
                edge("20", "30"),
                edge("30", "99"),
                edge("99", "40"),
                edge("40", "50"),
            ],
        });

        check_invariants(&t);
        assert_eq!(
            ids(&t),
            (
                vec!["10", "20", "30", "40", "50"],
                vec!["11020", "12030", "14050"]
            )
        );
    }

    #[test]
    fn node_only_reachable_through_missing_node_is_dropped() {
        let t = filter(Tables {
            nodes: vec![node("10"), node("20"), node("30")],
            edges: vec![edge("10", "20"), edge("30", "99")],
        });

        check_invariants(&t);
        assert_eq!(ids(&t), (vec!["10", "20"], vec!["11020"]));
    }

    #[test]
    fn filter_is_idempotent() {
        let once = filter(Tables {
            nodes: vec![node("1"), node("2"), node("3"), node("4")],
            edges: vec![edge("1", "2"), edge("2", "5"), edge("3", "3")],
        });
        let twice = filter(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn self_loops_are_kept() {
        let t = filter(Tables {
            nodes: vec![node("10")],
            edges: vec![edge("10", "10")],
        });
        assert_eq!(ids(&t), (vec!["10"], vec!["11010"]));
    }

    #[test]
    fn empty_tables() {
        assert_eq!(filter(Tables::default()), Tables::default());

        let t = filter(Tables {
            nodes: vec![node("1"), node("2")],
            edges: vec![],
        });
        assert!(t.nodes.is_empty());
    }
}

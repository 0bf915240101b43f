//! Nutrient co-occurrence graph backed by petgraph::UnGraph.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

use crate::config::RecordId;

/// Node data stored in the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct NutrientNode {
    pub id: RecordId,
    pub label: String,
}

/// Wrapper around petgraph::UnGraph with nutrient-specific lookups.
#[derive(Debug, Clone, Default)]
pub struct NutrientGraph {
    graph: UnGraph<NutrientNode, f64>,
    /// O(1) label → NodeIndex lookup.
    label_index: HashMap<String, NodeIndex>,
}

impl NutrientGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a nutrient node, or return the existing node with the same label.
    pub fn add_nutrient(&mut self, id: RecordId, label: String) -> NodeIndex {
        if let Some(&idx) = self.label_index.get(&label) {
            return idx;
        }
        let idx = self.graph.add_node(NutrientNode {
            id,
            label: label.clone(),
        });
        self.label_index.insert(label, idx);
        idx
    }

    /// Add or overwrite the undirected edge `a`–`b`.
    pub fn set_edge(&mut self, a: NodeIndex, b: NodeIndex, weight: f64) {
        self.graph.update_edge(a, b, weight);
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.label_index.contains_key(label)
    }

    pub fn node_index(&self, label: &str) -> Option<NodeIndex> {
        self.label_index.get(label).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &NutrientNode {
        &self.graph[idx]
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &NutrientNode)> {
        self.graph
            .node_indices()
            .map(move |idx| (idx, &self.graph[idx]))
    }

    /// Edges as `(source, target, weight)` in insertion order.
    pub fn edges(&self) -> Vec<(NodeIndex, NodeIndex, f64)> {
        self.graph
            .edge_references()
            .map(|e| (e.source(), e.target(), *e.weight()))
            .collect()
    }

    /// Weight of the edge between two labels, if any.
    pub fn weight(&self, a: &str, b: &str) -> Option<f64> {
        let (ai, bi) = (self.node_index(a)?, self.node_index(b)?);
        self.graph
            .find_edge(ai, bi)
            .and_then(|e| self.graph.edge_weight(e))
            .copied()
    }

    /// Neighbours of a node with edge weights.
    pub fn neighbours(&self, idx: NodeIndex) -> impl Iterator<Item = (NodeIndex, f64)> + '_ {
        self.graph.edges(idx).map(move |e| {
            let other = if e.source() == idx {
                e.target()
            } else {
                e.source()
            };
            (other, *e.weight())
        })
    }

    pub fn has_self_loops(&self) -> bool {
        self.graph.edge_references().any(|e| e.source() == e.target())
    }

    /// Sum of all edge weights.
    pub fn total_weight(&self) -> f64 {
        self.graph.edge_weights().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NutrientGraph {
        let mut g = NutrientGraph::new();
        let a = g.add_nutrient(RecordId::new("203"), "Protein".into());
        let b = g.add_nutrient(RecordId::new("204"), "Fat".into());
        g.add_nutrient(RecordId::new("205"), "Carbohydrate".into());
        g.set_edge(a, b, 0.75);
        g
    }

    #[test]
    fn labels_are_unique_keys() {
        let mut g = sample();
        let again = g.add_nutrient(RecordId::new("999"), "Protein".into());
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.node(again).id.as_str(), "203");
    }

    #[test]
    fn weight_is_symmetric() {
        let g = sample();
        assert_eq!(g.weight("Protein", "Fat"), Some(0.75));
        assert_eq!(g.weight("Fat", "Protein"), Some(0.75));
        assert_eq!(g.weight("Fat", "Carbohydrate"), None);
    }

    #[test]
    fn set_edge_overwrites() {
        let mut g = sample();
        let a = g.node_index("Protein").unwrap();
        let b = g.node_index("Fat").unwrap();
        g.set_edge(b, a, 0.9);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.weight("Protein", "Fat"), Some(0.9));
    }

    #[test]
    fn neighbours_and_totals() {
        let g = sample();
        let fat = g.node_index("Fat").unwrap();
        let n: Vec<_> = g.neighbours(fat).collect();
        assert_eq!(n.len(), 1);
        assert_eq!(g.node(n[0].0).label, "Protein");
        assert!((g.total_weight() - 0.75).abs() < 1e-12);
        assert!(!g.has_self_loops());
    }
}

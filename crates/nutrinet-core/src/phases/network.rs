//! Phase 4: Turn the thresholded correlation matrix into a labelled graph.

use std::collections::{HashMap, HashSet};

use crate::config::{NutrientDefinitions, RecordId};
use crate::error::{Error, Result};
use crate::graph::matrix::CorrelationMatrix;
use crate::graph::nutrient_graph::NutrientGraph;

/// Build the nutrient graph: one node per matrix axis label, one edge per
/// nonzero upper-triangle cell.
///
/// Node labels go through two lookups: axis position → nutrient id, then
/// nutrient id → description. Every nutrient id must have a description.
pub fn build_graph(
    matrix: &CorrelationMatrix,
    definitions: &NutrientDefinitions,
) -> Result<NutrientGraph> {
    if !matrix.is_symmetric() {
        return Err(Error::InvalidMatrix(
            "correlation matrix is not symmetric".to_string(),
        ));
    }

    // Pass 1: axis position -> nutrient id
    let ids: &[RecordId] = matrix.labels();

    // Pass 2: nutrient id -> description
    let labels = describe(ids, definitions)?;

    let mut graph = NutrientGraph::new();
    let nodes: Vec<_> = ids
        .iter()
        .zip(labels)
        .map(|(id, label)| graph.add_nutrient(id.clone(), label))
        .collect();

    for (i, j, weight) in matrix.upper_nonzero() {
        graph.set_edge(nodes[i], nodes[j], weight);
    }

    Ok(graph)
}

/// Run the graph construction phase.
pub fn run_network_phase(
    matrix: &CorrelationMatrix,
    definitions: &NutrientDefinitions,
) -> Result<NutrientGraph> {
    let graph = build_graph(matrix, definitions)?;
    log::info!(
        "nutrient graph: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

/// Map each id to its description. Descriptions shared by several ids get the
/// id appended so every node keeps its own label.
fn describe(ids: &[RecordId], definitions: &NutrientDefinitions) -> Result<Vec<String>> {
    let mut labels = Vec::with_capacity(ids.len());
    for id in ids {
        let desc = definitions.get(id).ok_or_else(|| Error::Lookup {
            nutrient_id: id.to_string(),
        })?;
        labels.push(desc.clone());
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in &labels {
        *counts.entry(label.as_str()).or_insert(0) += 1;
    }
    let duplicated: HashSet<String> = counts
        .into_iter()
        .filter(|&(_, c)| c > 1)
        .map(|(label, _)| label.to_string())
        .collect();

    if !duplicated.is_empty() {
        log::warn!(
            "{} nutrient descriptions are shared by several ids; suffixing with ids",
            duplicated.len()
        );
        for (label, id) in labels.iter_mut().zip(ids) {
            if duplicated.contains(label.as_str()) {
                *label = format!("{label} [{id}]");
            }
        }
    }

    Ok(labels)
}

//! Phase 7: Describe each community by its most representative foods.

use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};

use crate::config::{FoodCatalog, PresenceRecord, RecordId};
use crate::graph::nutrient_graph::NutrientGraph;
use crate::phases::communities::Partition;

/// A food with its presence count across one community's nutrients.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodScore {
    pub id: RecordId,
    pub name: String,
    pub total: usize,
}

/// Summary of one community.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub community: usize,
    pub nutrients: Vec<String>,
    pub foods: Vec<FoodScore>,
}

/// Run the report phase.
pub fn run_report_phase(
    graph: &NutrientGraph,
    partition: &Partition,
    presence: &[PresenceRecord],
    foods: &FoodCatalog,
    top: usize,
) -> Vec<ClusterSummary> {
    let summaries = summarize_clusters(graph, partition, presence, foods, top);
    log::info!("summarised {} communities", summaries.len());
    summaries
}

/// For every community, ascending by id: sum presence per food over the
/// community's nutrients and keep the `top` foods by total. Foods with equal
/// totals keep the order in which they first appear in `presence`.
pub fn summarize_clusters(
    graph: &NutrientGraph,
    partition: &Partition,
    presence: &[PresenceRecord],
    foods: &FoodCatalog,
    top: usize,
) -> Vec<ClusterSummary> {
    let nutrient_community: HashMap<&RecordId, usize> = graph
        .nodes()
        .map(|(idx, node)| (&node.id, partition.community_of(idx)))
        .collect();

    // community -> (food -> slot, [(food, total)] in first-appearance order)
    let mut tallies: BTreeMap<usize, Tally> = BTreeMap::new();
    for record in presence.iter().filter(|r| r.present) {
        if let Some(&c) = nutrient_community.get(&record.nutrient_id) {
            tallies.entry(c).or_default().add(&record.food_id);
        }
    }

    partition
        .communities()
        .into_iter()
        .map(|(community, members)| {
            let nutrients = members
                .iter()
                .map(|&idx| graph.node(idx).label.clone())
                .collect();

            let mut totals = tallies
                .remove(&community)
                .map(|t| t.totals)
                .unwrap_or_default();
            // sort_by is stable: ties keep first-appearance order
            totals.sort_by(|a, b| b.1.cmp(&a.1));
            totals.truncate(top);

            let ranked = totals
                .into_iter()
                .map(|(id, total)| FoodScore {
                    name: food_name(foods, id),
                    id: id.clone(),
                    total,
                })
                .collect();

            ClusterSummary {
                community,
                nutrients,
                foods: ranked,
            }
        })
        .collect()
}

/// Write one `-- name; name; ...` line per community, then the modularity.
pub fn render_report<W: Write>(
    summaries: &[ClusterSummary],
    modularity: f64,
    out: &mut W,
) -> io::Result<()> {
    for summary in summaries {
        let names: Vec<&str> = summary.foods.iter().map(|f| f.name.as_str()).collect();
        writeln!(out, "-- {}", names.join("; "))?;
    }
    writeln!(out, "Modularity: {modularity}")
}

#[derive(Default)]
struct Tally<'a> {
    slots: HashMap<&'a RecordId, usize>,
    totals: Vec<(&'a RecordId, usize)>,
}

impl<'a> Tally<'a> {
    fn add(&mut self, food: &'a RecordId) {
        match self.slots.get(food) {
            Some(&slot) => self.totals[slot].1 += 1,
            None => {
                self.slots.insert(food, self.totals.len());
                self.totals.push((food, 1));
            }
        }
    }
}

fn food_name(foods: &FoodCatalog, id: &RecordId) -> String {
    foods
        .get(id)
        .cloned()
        .unwrap_or_else(|| id.to_string())
}

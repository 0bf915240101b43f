//! Phase 6: Community detection via Louvain algorithm.
//!
//! Pure Rust implementation with no external community detection library.
//! Visiting order and tie-breaking are fixed (node index order, lowest
//! community id wins ties), so a given graph always yields the same partition.

use petgraph::graph::NodeIndex;
use std::collections::{BTreeMap, HashMap};

use crate::graph::nutrient_graph::NutrientGraph;

/// Sweeps of local moves allowed per level before contracting anyway.
const MAX_SWEEPS: usize = 100;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Assignment of every graph node to exactly one community.
///
/// Community ids are `0..community_count()`, numbered in order of their
/// lowest node index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    assignment: Vec<usize>,
    count: usize,
}

impl Partition {
    /// Build from groups of node indices. Every index in `0..node_count` must
    /// appear in exactly one group.
    fn from_groups(groups: &[Vec<usize>], node_count: usize) -> Self {
        let mut raw = vec![usize::MAX; node_count];
        for (g, members) in groups.iter().enumerate() {
            for &m in members {
                raw[m] = g;
            }
        }

        let mut relabel: HashMap<usize, usize> = HashMap::new();
        let assignment: Vec<usize> = raw
            .into_iter()
            .map(|g| {
                let next = relabel.len();
                *relabel.entry(g).or_insert(next)
            })
            .collect();

        Self {
            count: relabel.len(),
            assignment,
        }
    }

    pub fn community_of(&self, node: NodeIndex) -> usize {
        self.assignment[node.index()]
    }

    /// Community id per node, indexed by node index.
    pub fn assignments(&self) -> &[usize] {
        &self.assignment
    }

    pub fn node_count(&self) -> usize {
        self.assignment.len()
    }

    pub fn community_count(&self) -> usize {
        self.count
    }

    /// Members of each community, ascending by community id then node index.
    pub fn communities(&self) -> BTreeMap<usize, Vec<NodeIndex>> {
        let mut groups: BTreeMap<usize, Vec<NodeIndex>> = BTreeMap::new();
        for (node, &c) in self.assignment.iter().enumerate() {
            groups.entry(c).or_default().push(NodeIndex::new(node));
        }
        groups
    }
}

/// Output of the communities phase.
#[derive(Debug, Clone)]
pub struct CommunityResult {
    pub partition: Partition,
    pub modularity: f64,
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Run the communities phase: Louvain clustering plus modularity of the result.
pub fn run_communities_phase(graph: &NutrientGraph, resolution: f64) -> CommunityResult {
    let adj = AdjList::from_graph(graph);

    if adj.total_weight() == 0.0 {
        log::warn!("nutrient graph has no edges; every nutrient is its own community");
    }

    let groups = louvain(&adj, resolution);
    let partition = Partition::from_groups(&groups, adj.adj.len());
    let q = modularity(graph, &partition);

    log::info!(
        "{} communities, modularity {:.4}",
        partition.community_count(),
        q
    );

    CommunityResult {
        partition,
        modularity: q,
    }
}

/// Newman modularity Q of `partition` over the weighted graph.
///
/// `Q = Σ_c [ L_c / m − (d_c / 2m)² ]` where `L_c` is the weight inside
/// community `c`, `d_c` the summed weighted degree of its members and `m` the
/// total edge weight. An edgeless graph has Q = 0.
pub fn modularity(graph: &NutrientGraph, partition: &Partition) -> f64 {
    let m = graph.total_weight();
    if m == 0.0 {
        return 0.0;
    }

    let k = partition.community_count();
    let mut internal = vec![0.0; k];
    let mut degree = vec![0.0; k];

    for (a, b, w) in graph.edges() {
        let ca = partition.community_of(a);
        let cb = partition.community_of(b);
        if ca == cb {
            internal[ca] += w;
        }
        degree[ca] += w;
        degree[cb] += w;
    }

    let m2 = 2.0 * m;
    internal
        .iter()
        .zip(&degree)
        .map(|(l, d)| l / m - (d / m2) * (d / m2))
        .sum()
}

// ---------------------------------------------------------------------------
// Adjacency list for undirected weighted graph
// ---------------------------------------------------------------------------

struct AdjList {
    /// adjacency: index -> Vec<(neighbour_index, weight)>
    adj: Vec<Vec<(usize, f64)>>,
}

impl AdjList {
    fn from_graph(graph: &NutrientGraph) -> Self {
        let mut adj = vec![Vec::new(); graph.node_count()];
        for (a, b, w) in graph.edges() {
            let (ai, bi) = (a.index(), b.index());
            adj[ai].push((bi, w));
            adj[bi].push((ai, w));
        }
        Self { adj }
    }

    fn total_weight(&self) -> f64 {
        let mut total = 0.0;
        for neighbours in &self.adj {
            for &(_, w) in neighbours {
                total += w;
            }
        }
        total / 2.0 // Each edge counted twice
    }
}

// ---------------------------------------------------------------------------
// Louvain algorithm
// ---------------------------------------------------------------------------

/// Run the Louvain community detection algorithm with multi-level aggregation.
///
/// Standard Louvain repeats two phases until convergence:
///   Phase 1: local node moves to maximise modularity gain
///   Phase 2: contract the graph (merge communities into super-nodes)
///
/// Returns groups of original node indices.
fn louvain(adj: &AdjList, resolution: f64) -> Vec<Vec<usize>> {
    let n = adj.adj.len();
    if n == 0 {
        return Vec::new();
    }

    let m = adj.total_weight();
    if m == 0.0 {
        // No edges: each node is its own community
        return (0..n).map(|i| vec![i]).collect();
    }
    let m2 = m * 2.0; // constant across all levels

    // groups[i] = original-graph node indices belonging to current super-node i
    let mut groups: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();

    // Current-level adjacency. A super-node's internal weight is kept as a
    // self-loop entry so its degree stays the sum of its members' degrees.
    let mut cur_adj: Vec<Vec<(usize, f64)>> = adj.adj.clone();
    let mut cur_n = n;

    loop {
        if cur_n < 2 {
            break;
        }

        let degree: Vec<f64> = (0..cur_n)
            .map(|i| cur_adj[i].iter().map(|&(_, w)| w).sum())
            .collect();

        // ---- Phase 1: local node moves ----
        let mut community: Vec<usize> = (0..cur_n).collect();
        let mut sigma_tot: Vec<f64> = degree.clone();
        let mut any_moved = false;

        let mut improved = true;
        let mut sweeps = 0;
        while improved && sweeps < MAX_SWEEPS {
            improved = false;
            sweeps += 1;

            for i in 0..cur_n {
                let ci = community[i];
                let ki = degree[i];

                // Sum of edge weights from i to each neighbouring community
                let mut comm_weights: BTreeMap<usize, f64> = BTreeMap::new();
                for &(j, w) in &cur_adj[i] {
                    if j == i {
                        continue;
                    }
                    *comm_weights.entry(community[j]).or_insert(0.0) += w;
                }

                let ki_in = comm_weights.get(&ci).copied().unwrap_or(0.0);

                // Temporarily remove i from its community
                sigma_tot[ci] -= ki;
                let stay = ki_in - resolution * sigma_tot[ci] * ki / m2;

                let mut best_comm = ci;
                let mut best_gain = 0.0;

                for (&cj, &kj_in) in &comm_weights {
                    if cj == ci {
                        continue;
                    }
                    let delta = (kj_in - resolution * sigma_tot[cj] * ki / m2) - stay;
                    // BTreeMap iterates ascending, so strict > keeps the lowest id on ties
                    if delta > best_gain {
                        best_gain = delta;
                        best_comm = cj;
                    }
                }

                community[i] = best_comm;
                sigma_tot[best_comm] += ki;

                if best_comm != ci {
                    improved = true;
                    any_moved = true;
                }
            }
        }

        if !any_moved {
            break;
        }

        // Compact community labels to 0..new_n
        let mut label_map: HashMap<usize, usize> = HashMap::new();
        for &c in &community {
            let next = label_map.len();
            label_map.entry(c).or_insert(next);
        }
        let mapped: Vec<usize> = community.iter().map(|c| label_map[c]).collect();
        let new_n = label_map.len();

        if new_n == cur_n {
            break;
        }

        // Merge original-node groups according to new communities
        let mut new_groups: Vec<Vec<usize>> = vec![Vec::new(); new_n];
        for (i, &c) in mapped.iter().enumerate() {
            new_groups[c].extend_from_slice(&groups[i]);
        }
        groups = new_groups;

        // ---- Phase 2: contract graph ----
        let mut new_adj: Vec<Vec<(usize, f64)>> = vec![Vec::new(); new_n];
        for i in 0..cur_n {
            let ci = mapped[i];
            for &(j, w) in &cur_adj[i] {
                let cj = mapped[j];
                if let Some(entry) = new_adj[ci].iter_mut().find(|(nb, _)| *nb == cj) {
                    entry.1 += w;
                } else {
                    new_adj[ci].push((cj, w));
                }
            }
        }

        cur_adj = new_adj;
        cur_n = new_n;
    }

    groups
}

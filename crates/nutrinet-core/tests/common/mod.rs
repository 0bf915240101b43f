//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use nutrinet_core::config::{PipelineConfig, PresenceRecord};
use nutrinet_core::graph::matrix::CorrelationMatrix;
use nutrinet_core::graph::nutrient_graph::NutrientGraph;
use nutrinet_core::phases;
use nutrinet_core::phases::communities::Partition;
use nutrinet_core::phases::loading::LoadedData;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Fixture path resolution
// ---------------------------------------------------------------------------

/// Resolve `tests/fixtures/{name}` relative to the workspace root.
pub fn fixture_path(name: &str) -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir)
        .join("../../tests/fixtures")
        .join(name)
        .canonicalize()
        .unwrap_or_else(|_| {
            Path::new(manifest_dir)
                .join("../../tests/fixtures")
                .join(name)
        })
}

/// Config reading from a fixture and writing into a fresh temp directory.
/// Keep the returned `TempDir` alive for as long as the output is needed.
pub fn fixture_config(fixture_name: &str) -> (PipelineConfig, TempDir) {
    let out = tempfile::tempdir().expect("create temp dir");
    let config = PipelineConfig {
        data_dir: fixture_path(fixture_name).to_string_lossy().to_string(),
        output_dir: out.path().join("results").to_string_lossy().to_string(),
        ..Default::default()
    };
    (config, out)
}

/// Write a data directory from raw file contents.
pub fn write_dataset(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    for (name, contents) in files {
        std::fs::write(dir.path().join(name), contents).expect("write fixture file");
    }
    dir
}

// ---------------------------------------------------------------------------
// Phase runners
// ---------------------------------------------------------------------------

pub struct PhaseResult {
    pub config: PipelineConfig,
    pub loaded: LoadedData,
    pub presence: Vec<PresenceRecord>,
    pub correlation: CorrelationMatrix,
    pub graph: NutrientGraph,
    pub partition: Partition,
    pub modularity: f64,
    _out: TempDir,
}

/// Run every phase except export on a fixture directory.
pub fn run_all_phases(fixture_name: &str) -> PhaseResult {
    let (config, out) = fixture_config(fixture_name);
    let loaded = phases::loading::run_loading_phase(&config).expect("load fixture");
    let presence = phases::presence::run_presence_phase(&loaded.records);
    let (_, correlation) =
        phases::correlation::run_correlation_phase(&presence, config.correlation_threshold)
            .expect("correlate");
    let graph = phases::network::run_network_phase(&correlation, &loaded.definitions)
        .expect("build graph");
    let communities = phases::communities::run_communities_phase(&graph, config.resolution);
    PhaseResult {
        config,
        loaded,
        presence,
        correlation,
        graph,
        partition: communities.partition,
        modularity: communities.modularity,
        _out: out,
    }
}

/// Modularity straight from the definition: (1/2m) Σ_ij [A_ij − k_i k_j / 2m] δ(c_i, c_j).
pub fn reference_modularity(graph: &NutrientGraph, partition: &Partition) -> f64 {
    let n = graph.node_count();
    let mut a = vec![vec![0.0; n]; n];
    for (s, t, w) in graph.edges() {
        a[s.index()][t.index()] += w;
        a[t.index()][s.index()] += w;
    }
    let k: Vec<f64> = a.iter().map(|row| row.iter().sum()).collect();
    let m2: f64 = k.iter().sum();
    if m2 == 0.0 {
        return 0.0;
    }
    let c = partition.assignments();
    let mut q = 0.0;
    for i in 0..n {
        for j in 0..n {
            if c[i] == c[j] {
                q += a[i][j] - k[i] * k[j] / m2;
            }
        }
    }
    q / m2
}

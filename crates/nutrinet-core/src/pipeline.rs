//! Sequential phase orchestrator with timing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{PipelineConfig, PipelineResult};
use crate::error::Result;
use crate::graph::nutrient_graph::NutrientGraph;
use crate::output::{build_result, export_graph, RunCounts};
use crate::phases;
use crate::phases::communities::Partition;
use crate::phases::report::ClusterSummary;

/// Phase labels for progress reporting.
pub const PHASE_LABELS: &[(&str, &str)] = &[
    ("loading", "Reading nutrient data"),
    ("presence", "Reducing values to presence"),
    ("correlation", "Correlating nutrients"),
    ("network", "Building nutrient graph"),
    ("export", "Writing GraphML"),
    ("communities", "Detecting communities"),
    ("report", "Ranking representative foods"),
];

/// Progress callback type: (phase_name, label).
pub type ProgressCallback = Box<dyn FnMut(&str, &str)>;

/// Everything a finished run produced.
#[derive(Debug)]
pub struct PipelineRun {
    pub graph: NutrientGraph,
    pub graph_path: PathBuf,
    pub partition: Partition,
    pub modularity: f64,
    pub summaries: Vec<ClusterSummary>,
    pub result: PipelineResult,
}

/// Times each phase and reports progress before it starts.
struct PhaseClock {
    progress: Option<ProgressCallback>,
    timings: HashMap<String, f64>,
}

impl PhaseClock {
    fn run<T>(&mut self, name: &str, phase: impl FnOnce() -> Result<T>) -> Result<T> {
        if let Some(ref mut cb) = self.progress {
            let label = PHASE_LABELS
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, l)| *l)
                .unwrap_or(name);
            cb(name, label);
        }

        let start = Instant::now();
        let out = phase()?;
        let elapsed = start.elapsed().as_secs_f64();
        log::debug!("phase {name} took {:.1}ms", elapsed * 1000.0);
        self.timings.insert(name.to_string(), elapsed);
        Ok(out)
    }
}

/// Execute the seven-phase pipeline: load → presence → correlation → graph →
/// export → communities → report. Any failure aborts the run.
pub fn run_pipeline(
    config: &PipelineConfig,
    progress_callback: Option<ProgressCallback>,
) -> Result<PipelineRun> {
    let total_start = Instant::now();
    let mut clock = PhaseClock {
        progress: progress_callback,
        timings: HashMap::new(),
    };

    let loaded = clock.run("loading", || phases::loading::run_loading_phase(config))?;

    let presence = clock.run("presence", || {
        Ok(phases::presence::run_presence_phase(&loaded.records))
    })?;

    let (presence_matrix, correlation) = clock.run("correlation", || {
        phases::correlation::run_correlation_phase(&presence, config.correlation_threshold)
    })?;

    let graph = clock.run("network", || {
        phases::network::run_network_phase(&correlation, &loaded.definitions)
    })?;

    let graph_path = clock.run("export", || {
        export_graph(&graph, Path::new(&config.output_dir), &config.graph_file)
    })?;

    let communities = clock.run("communities", || {
        Ok(phases::communities::run_communities_phase(
            &graph,
            config.resolution,
        ))
    })?;

    let summaries = clock.run("report", || {
        Ok(phases::report::run_report_phase(
            &graph,
            &communities.partition,
            &presence,
            &loaded.foods,
            config.top_foods,
        ))
    })?;

    let counts = RunCounts {
        records: loaded.records.len(),
        presence_records: presence.len(),
        foods: presence_matrix.foods().len(),
        nutrients: presence_matrix.nutrients().len(),
    };
    let total_ms = total_start.elapsed().as_secs_f64() * 1000.0;
    let result = build_result(
        config,
        &counts,
        &graph,
        &summaries,
        communities.modularity,
        &clock.timings,
        total_ms,
    );

    Ok(PipelineRun {
        graph,
        graph_path,
        partition: communities.partition,
        modularity: communities.modularity,
        summaries,
        result,
    })
}

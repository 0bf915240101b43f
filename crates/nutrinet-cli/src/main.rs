//! Nutrinet CLI: nutrient co-occurrence networks from USDA nutrient data.

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use nutrinet_core::config::PipelineConfig;
use nutrinet_core::output::write_output;
use nutrinet_core::phases::report::render_report;
use nutrinet_core::pipeline::{self, PipelineRun};

#[derive(Parser)]
#[command(
    name = "nutrinet",
    about = "Nutrinet - Cluster nutrients by the foods they appear in together"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the nutrient network from a USDA SR release and report its communities
    Analyze {
        /// Directory holding NUT_DATA.txt, NUTR_DEF.txt and FOOD_DES.txt
        #[arg(default_value = ".")]
        data_dir: PathBuf,

        /// Directory the GraphML file is written to
        #[arg(long, default_value = "results")]
        output_dir: String,

        /// GraphML file name inside the output directory
        #[arg(long, default_value = "nut_data.graphml")]
        graph_file: String,

        /// Food description file name inside the data directory
        #[arg(long, default_value = "FOOD_DES.txt")]
        food_file: String,

        /// Report food ids instead of reading food descriptions
        #[arg(long)]
        no_food_file: bool,

        /// Minimum correlation for two nutrients to be linked
        #[arg(long, default_value = "0.5")]
        threshold: f64,

        /// Representative foods listed per community
        #[arg(long, default_value = "10")]
        top: usize,

        /// Louvain resolution parameter
        #[arg(long, default_value = "1.0")]
        resolution: f64,

        /// Also write a JSON run summary to this path
        #[arg(long)]
        json: Option<String>,

        /// Debug logging and per-phase timing breakdown
        #[arg(long)]
        verbose: bool,

        /// Suppress everything except the report and errors
        #[arg(long)]
        quiet: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            data_dir,
            output_dir,
            graph_file,
            food_file,
            no_food_file,
            threshold,
            top,
            resolution,
            json,
            verbose,
            quiet,
        } => {
            init_logging(verbose, quiet);

            let config = PipelineConfig {
                data_dir: data_dir.to_string_lossy().to_string(),
                output_dir,
                graph_file,
                food_descriptions_file: (!no_food_file).then_some(food_file),
                correlation_threshold: threshold,
                top_foods: top,
                resolution,
                json_output: json,
                verbose,
                quiet,
                ..Default::default()
            };

            let run = if quiet {
                run_quiet(&config)
            } else {
                run_with_progress(&config)
            };

            print_report(&run);

            if let Some(ref path) = config.json_output {
                if let Err(e) = write_output(&run.result, path) {
                    eprintln!("Error writing output: {e}");
                    std::process::exit(1);
                }
            }

            if !quiet {
                print_footer(&config, &run, verbose);
            }
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_quiet(config: &PipelineConfig) -> PipelineRun {
    match pipeline::run_pipeline(config, None) {
        Ok(run) => run,
        Err(e) => {
            eprintln!("Analysis failed: {e}");
            std::process::exit(1);
        }
    }
}

fn run_with_progress(config: &PipelineConfig) -> PipelineRun {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(spinner.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message("Initialising...");
    pb.enable_steady_tick(std::time::Duration::from_millis(80));

    let progress: pipeline::ProgressCallback = {
        let pb = pb.clone();
        Box::new(move |_name, label| {
            pb.set_message(label.to_string());
        })
    };

    let start = Instant::now();
    let run = match pipeline::run_pipeline(config, Some(progress)) {
        Ok(r) => r,
        Err(e) => {
            pb.finish_and_clear();
            eprintln!("Analysis failed: {e}");
            std::process::exit(1);
        }
    };
    pb.finish_and_clear();
    log::debug!(
        "pipeline finished in {:.1}ms",
        start.elapsed().as_secs_f64() * 1000.0
    );
    run
}

fn print_report(run: &PipelineRun) {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = render_report(&run.summaries, run.modularity, &mut out).and_then(|_| out.flush())
    {
        eprintln!("Error writing report: {e}");
        std::process::exit(1);
    }
}

/// Summary block on stderr so stdout carries only the report.
fn print_footer(config: &PipelineConfig, run: &PipelineRun, verbose: bool) {
    let stat = |key: &str| {
        run.result
            .stats
            .get(key)
            .cloned()
            .unwrap_or(serde_json::json!(0))
    };

    eprintln!(
        "\n{}  Nutrinet Analysis: {}",
        style("✓").green().bold(),
        style(&config.data_dir).bold()
    );
    eprintln!("  {:<14} {}", "Foods:", stat("foods"));
    eprintln!("  {:<14} {}", "Nutrients:", stat("nutrients"));
    eprintln!("  {:<14} {}", "Links:", stat("edges"));
    eprintln!("  {:<14} {}", "Communities:", stat("communities"));
    eprintln!("  {:<14} {:.4}", "Modularity:", run.modularity);

    if verbose {
        if let Some(serde_json::Value::Object(timings)) = run.result.metadata.get("phase_timings")
        {
            eprintln!("\n  Phase Timings:");
            for (phase, _) in pipeline::PHASE_LABELS {
                if let Some(secs) = timings.get(*phase).and_then(|v| v.as_f64()) {
                    eprintln!("    {:<14} {:.1}ms", phase, secs * 1000.0);
                }
            }
        }
    }

    eprintln!(
        "\n  {} {}",
        style("Graph written to:").green(),
        run.graph_path.display()
    );
    if let Some(ref path) = config.json_output {
        eprintln!("  {} {}", style("Summary written to:").green(), path);
    }
}

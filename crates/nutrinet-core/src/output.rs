//! GraphML export of the nutrient graph and JSON serialisation of the run summary.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::config::{CommunityOutput, FoodOutput, PipelineConfig, PipelineResult};
use crate::error::{Error, Result};
use crate::graph::nutrient_graph::NutrientGraph;
use crate::phases::report::ClusterSummary;

const GRAPHML_HEADER: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    "\n",
    r#"<graphml xmlns="http://graphml.graphdrawing.org/xmlns" "#,
    r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
    r#"xsi:schemaLocation="http://graphml.graphdrawing.org/xmlns "#,
    r#"http://graphml.graphdrawing.org/xmlns/1.0/graphml.xsd">"#,
    "\n",
);

/// Row counts gathered while the pipeline runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunCounts {
    pub records: usize,
    pub presence_records: usize,
    pub foods: usize,
    pub nutrients: usize,
}

/// Serialise the graph as GraphML. Node ids are the nutrient labels; each
/// node carries its nutrient id and each edge its correlation weight.
pub fn write_graphml<W: Write>(graph: &NutrientGraph, out: &mut W) -> std::io::Result<()> {
    out.write_all(GRAPHML_HEADER.as_bytes())?;
    writeln!(
        out,
        r#"  <key id="d0" for="node" attr.name="nutrient_id" attr.type="string"/>"#
    )?;
    writeln!(
        out,
        r#"  <key id="d1" for="edge" attr.name="weight" attr.type="double"/>"#
    )?;
    writeln!(out, r#"  <graph edgedefault="undirected">"#)?;

    for (_, node) in graph.nodes() {
        writeln!(out, r#"    <node id="{}">"#, escape_xml(&node.label))?;
        writeln!(
            out,
            r#"      <data key="d0">{}</data>"#,
            escape_xml(node.id.as_str())
        )?;
        writeln!(out, "    </node>")?;
    }

    for (a, b, weight) in graph.edges() {
        writeln!(
            out,
            r#"    <edge source="{}" target="{}">"#,
            escape_xml(&graph.node(a).label),
            escape_xml(&graph.node(b).label)
        )?;
        writeln!(out, r#"      <data key="d1">{weight}</data>"#)?;
        writeln!(out, "    </edge>")?;
    }

    writeln!(out, "  </graph>")?;
    writeln!(out, "</graphml>")
}

/// Write the graph to `dir/file_name`, creating `dir` if needed.
pub fn export_graph(graph: &NutrientGraph, dir: &Path, file_name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let path = dir.join(file_name);
    let file = File::create(&path).map_err(|e| Error::io(&path, e))?;
    let mut writer = BufWriter::new(file);
    write_graphml(graph, &mut writer).map_err(|e| Error::io(&path, e))?;
    writer.flush().map_err(|e| Error::io(&path, e))?;

    log::info!(
        "wrote {} nodes and {} edges to {}",
        graph.node_count(),
        graph.edge_count(),
        path.display()
    );
    Ok(path)
}

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Build the PipelineResult summary for a finished run.
pub fn build_result(
    config: &PipelineConfig,
    counts: &RunCounts,
    graph: &NutrientGraph,
    summaries: &[ClusterSummary],
    modularity: f64,
    timings: &HashMap<String, f64>,
    total_ms: f64,
) -> PipelineResult {
    let mut metadata = HashMap::new();
    metadata.insert(
        "generated_at".to_string(),
        serde_json::Value::String(Utc::now().to_rfc3339()),
    );
    metadata.insert(
        "nutrinet_version".to_string(),
        serde_json::Value::String(env!("CARGO_PKG_VERSION").to_string()),
    );
    metadata.insert(
        "data_dir".to_string(),
        serde_json::Value::String(config.data_dir.clone()),
    );
    metadata.insert(
        "graph_path".to_string(),
        serde_json::Value::String(config.graph_path().to_string_lossy().to_string()),
    );
    metadata.insert(
        "correlation_threshold".to_string(),
        serde_json::json!(config.correlation_threshold),
    );
    metadata.insert(
        "duration_ms".to_string(),
        serde_json::json!(((total_ms * 10.0).round() / 10.0)),
    );
    metadata.insert(
        "phase_timings".to_string(),
        serde_json::to_value(timings).unwrap_or_default(),
    );

    let mut stats = HashMap::new();
    stats.insert("records".to_string(), serde_json::json!(counts.records));
    stats.insert(
        "presence_records".to_string(),
        serde_json::json!(counts.presence_records),
    );
    stats.insert("foods".to_string(), serde_json::json!(counts.foods));
    stats.insert("nutrients".to_string(), serde_json::json!(counts.nutrients));
    stats.insert("edges".to_string(), serde_json::json!(graph.edge_count()));
    stats.insert(
        "communities".to_string(),
        serde_json::json!(summaries.len()),
    );

    let communities = summaries
        .iter()
        .map(|s| CommunityOutput {
            id: s.community,
            nutrients: s.nutrients.clone(),
            foods: s
                .foods
                .iter()
                .map(|f| FoodOutput {
                    id: f.id.to_string(),
                    name: f.name.clone(),
                    total: f.total,
                })
                .collect(),
        })
        .collect();

    PipelineResult {
        version: "1.0".to_string(),
        metadata,
        stats,
        modularity,
        communities,
    }
}

/// Write the run summary to a JSON file.
pub fn write_output(result: &PipelineResult, output_path: &str) -> Result<()> {
    if let Some(parent) = Path::new(output_path).parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(output_path, json).map_err(|e| Error::io(output_path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecordId;
    use crate::phases::report::FoodScore;

    fn sample_graph() -> NutrientGraph {
        let mut g = NutrientGraph::new();
        let a = g.add_nutrient(RecordId::new("203"), "Protein".into());
        let b = g.add_nutrient(RecordId::new("606"), "Fatty acids, <sat> & \"total\"".into());
        g.set_edge(a, b, 0.625);
        g
    }

    #[test]
    fn graphml_contains_nodes_and_weighted_edges() {
        let mut buf = Vec::new();
        write_graphml(&sample_graph(), &mut buf).unwrap();
        let xml = String::from_utf8(buf).unwrap();

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"<graph edgedefault="undirected">"#));
        assert!(xml.contains(r#"<node id="Protein">"#));
        assert!(xml.contains(r#"<data key="d0">203</data>"#));
        assert!(xml.contains(
            r#"<edge source="Protein" target="Fatty acids, &lt;sat&gt; &amp; &quot;total&quot;">"#
        ));
        assert!(xml.contains(r#"<data key="d1">0.625</data>"#));
        assert!(xml.trim_end().ends_with("</graphml>"));
    }

    #[test]
    fn export_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("results");
        let path = export_graph(&sample_graph(), &dir, "nut_data.graphml").unwrap();
        assert_eq!(path, dir.join("nut_data.graphml"));
        let xml = std::fs::read_to_string(&path).unwrap();
        assert_eq!(xml.matches("<node ").count(), 2);
        assert_eq!(xml.matches("<edge ").count(), 1);
    }

    #[test]
    fn export_into_file_path_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("results");
        std::fs::write(&blocker, "not a directory").unwrap();
        let err = export_graph(&sample_graph(), &blocker, "nut_data.graphml").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn build_result_json_roundtrip() {
        let config = PipelineConfig::default();
        let graph = sample_graph();
        let summaries = vec![ClusterSummary {
            community: 0,
            nutrients: vec!["Protein".into()],
            foods: vec![FoodScore {
                id: RecordId::new("1001"),
                name: "Butter, salted".into(),
                total: 3,
            }],
        }];
        let counts = RunCounts {
            records: 10,
            presence_records: 8,
            foods: 4,
            nutrients: 2,
        };
        let result = build_result(
            &config,
            &counts,
            &graph,
            &summaries,
            0.25,
            &HashMap::new(),
            12.34,
        );

        let json = serde_json::to_string_pretty(&result).unwrap();
        let parsed: PipelineResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.version, "1.0");
        assert_eq!(parsed.modularity, 0.25);
        assert_eq!(parsed.communities.len(), 1);
        assert_eq!(parsed.communities[0].foods[0].name, "Butter, salted");
        for key in ["generated_at", "nutrinet_version", "phase_timings", "duration_ms"] {
            assert!(parsed.metadata.contains_key(key), "Missing metadata key: {key}");
        }
        for key in ["records", "presence_records", "foods", "nutrients", "edges", "communities"] {
            assert!(parsed.stats.contains_key(key), "Missing stat key: {key}");
        }
    }

    #[test]
    fn write_output_creates_parent() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out/summary.json");
        write_output(&PipelineResult::default(), path.to_str().unwrap()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"version\": \"1.0\""));
    }
}

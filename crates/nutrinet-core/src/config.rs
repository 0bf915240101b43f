//! Core data types and configuration for a Nutrinet run.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Marker character wrapped around fields in the USDA flat files.
pub const STRIP_MARKER: char = '~';

/// A single cleaned field: numeric when it parses, text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field {
    Number(f64),
    Text(String),
}

impl Field {
    /// Strip the marker from both ends and try to read a number.
    pub fn clean(raw: &str) -> Self {
        let text = raw.trim_matches(STRIP_MARKER);
        match text.trim().parse::<f64>() {
            Ok(v) => Self::Number(v),
            Err(_) => Self::Text(text.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(_) => None,
        }
    }
}

/// Canonical identifier for foods and nutrients.
///
/// Numeric ids are stored in their shortest decimal form so `~01001~` in one
/// file and `1001` in another refer to the same food.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(raw: &str) -> Self {
        Self::from_field(Field::clean(raw))
    }

    pub fn from_field(field: Field) -> Self {
        match field {
            Field::Number(v) => Self(format!("{v}")),
            Field::Text(t) => Self(t),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<f64> {
        self.0.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl Ord for RecordId {
    fn cmp(&self, other: &Self) -> Ordering {
        let by_kind = match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_kind.then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for RecordId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A raw nutrient measurement row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientRecord {
    pub food_id: RecordId,
    pub nutrient_id: RecordId,
    pub value: Field,
}

/// A measurement reduced to "this food contains this nutrient".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresenceRecord {
    pub food_id: RecordId,
    pub nutrient_id: RecordId,
    pub present: bool,
}

impl PresenceRecord {
    /// Back to a measurement with the coerced value of 1.
    pub fn to_measurement(&self) -> NutrientRecord {
        NutrientRecord {
            food_id: self.food_id.clone(),
            nutrient_id: self.nutrient_id.clone(),
            value: Field::Number(if self.present { 1.0 } else { 0.0 }),
        }
    }
}

/// nutrient id -> human-readable description.
pub type NutrientDefinitions = HashMap<RecordId, String>;

/// food id -> long food description.
pub type FoodCatalog = HashMap<RecordId, String>;

/// Configuration for a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_nutrient_data_file")]
    pub nutrient_data_file: String,
    #[serde(default = "default_nutrient_definitions_file")]
    pub nutrient_definitions_file: String,
    #[serde(default = "default_food_descriptions_file")]
    pub food_descriptions_file: Option<String>,
    #[serde(default = "default_delimiter")]
    pub delimiter: u8,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_graph_file")]
    pub graph_file: String,
    #[serde(default = "default_correlation_threshold")]
    pub correlation_threshold: f64,
    #[serde(default = "default_top_foods")]
    pub top_foods: usize,
    #[serde(default = "default_resolution")]
    pub resolution: f64,
    pub json_output: Option<String>,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub quiet: bool,
}

fn default_data_dir() -> String {
    ".".to_string()
}
fn default_nutrient_data_file() -> String {
    "NUT_DATA.txt".to_string()
}
fn default_nutrient_definitions_file() -> String {
    "NUTR_DEF.txt".to_string()
}
fn default_food_descriptions_file() -> Option<String> {
    Some("FOOD_DES.txt".to_string())
}
fn default_delimiter() -> u8 {
    b'^'
}
fn default_output_dir() -> String {
    "results".to_string()
}
fn default_graph_file() -> String {
    "nut_data.graphml".to_string()
}
fn default_correlation_threshold() -> f64 {
    0.5
}
fn default_top_foods() -> usize {
    10
}
fn default_resolution() -> f64 {
    1.0
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            nutrient_data_file: default_nutrient_data_file(),
            nutrient_definitions_file: default_nutrient_definitions_file(),
            food_descriptions_file: default_food_descriptions_file(),
            delimiter: default_delimiter(),
            output_dir: default_output_dir(),
            graph_file: default_graph_file(),
            correlation_threshold: default_correlation_threshold(),
            top_foods: default_top_foods(),
            resolution: default_resolution(),
            json_output: None,
            verbose: false,
            quiet: false,
        }
    }
}

impl PipelineConfig {
    pub fn nutrient_data_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.nutrient_data_file)
    }

    pub fn nutrient_definitions_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.nutrient_definitions_file)
    }

    pub fn food_descriptions_path(&self) -> Option<PathBuf> {
        self.food_descriptions_file
            .as_ref()
            .map(|f| Path::new(&self.data_dir).join(f))
    }

    pub fn graph_path(&self) -> PathBuf {
        Path::new(&self.output_dir).join(&self.graph_file)
    }
}

/// Result of a pipeline run, serialised as the JSON summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub stats: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub modularity: f64,
    #[serde(default)]
    pub communities: Vec<CommunityOutput>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for PipelineResult {
    fn default() -> Self {
        Self {
            version: default_version(),
            metadata: HashMap::new(),
            stats: HashMap::new(),
            modularity: 0.0,
            communities: Vec::new(),
        }
    }
}

/// Community in the output JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityOutput {
    pub id: usize,
    pub nutrients: Vec<String>,
    pub foods: Vec<FoodOutput>,
}

/// Representative food in the output JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodOutput {
    pub id: String,
    pub name: String,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_strips_marker_and_parses() {
        assert_eq!(Field::clean("~1.50~"), Field::Number(1.5));
        assert_eq!(Field::clean("0"), Field::Number(0.0));
        assert_eq!(Field::clean("~Protein~"), Field::Text("Protein".to_string()));
        assert_eq!(Field::clean("~~"), Field::Text(String::new()));
    }

    #[test]
    fn record_id_canonical_numeric_form() {
        assert_eq!(RecordId::new("~01001~"), RecordId::new("1001"));
        assert_eq!(RecordId::new("203.0").as_str(), "203");
        assert_eq!(RecordId::new("~g~").as_str(), "g");
    }

    #[test]
    fn record_id_ordering_numeric_before_text() {
        let mut ids = vec![
            RecordId::new("abc"),
            RecordId::new("1000"),
            RecordId::new("203"),
            RecordId::new("aaa"),
        ];
        ids.sort();
        let rendered: Vec<&str> = ids.iter().map(|i| i.as_str()).collect();
        assert_eq!(rendered, vec!["203", "1000", "aaa", "abc"]);
    }

    #[test]
    fn presence_to_measurement_is_unit_value() {
        let p = PresenceRecord {
            food_id: RecordId::new("1"),
            nutrient_id: RecordId::new("203"),
            present: true,
        };
        assert_eq!(p.to_measurement().value, Field::Number(1.0));
    }

    #[test]
    fn pipeline_config_defaults() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.correlation_threshold, 0.5);
        assert_eq!(cfg.top_foods, 10);
        assert_eq!(cfg.resolution, 1.0);
        assert_eq!(cfg.delimiter, b'^');
        assert_eq!(cfg.graph_path(), Path::new("results").join("nut_data.graphml"));
        assert_eq!(cfg.nutrient_data_path(), Path::new(".").join("NUT_DATA.txt"));
    }

    #[test]
    fn pipeline_config_from_partial_json() {
        let cfg: PipelineConfig =
            serde_json::from_str(r#"{"data_dir": "sr28", "top_foods": 5}"#).unwrap();
        assert_eq!(cfg.data_dir, "sr28");
        assert_eq!(cfg.top_foods, 5);
        assert_eq!(cfg.nutrient_definitions_file, "NUTR_DEF.txt");
        assert_eq!(cfg.food_descriptions_file.as_deref(), Some("FOOD_DES.txt"));
    }

    #[test]
    fn pipeline_result_default() {
        let result = PipelineResult::default();
        assert_eq!(result.version, "1.0");
        assert!(result.communities.is_empty());
        assert_eq!(result.modularity, 0.0);
    }
}

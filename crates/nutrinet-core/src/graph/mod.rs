pub mod matrix;
pub mod nutrient_graph;

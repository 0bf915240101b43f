//! Dense matrices indexed by stable id lists.

use std::collections::{BTreeSet, HashMap};

use crate::config::{PresenceRecord, RecordId};
use crate::error::{Error, Result};

/// Food × nutrient presence table. Unobserved cells are 0.
#[derive(Debug, Clone)]
pub struct PresenceMatrix {
    foods: Vec<RecordId>,
    nutrients: Vec<RecordId>,
    /// Column-major: `columns[nutrient][food]`.
    columns: Vec<Vec<f64>>,
}

impl PresenceMatrix {
    /// Pivot presence records. Rows and columns are sorted by id; repeated
    /// observations of the same pair land on the same cell.
    pub fn from_records(records: &[PresenceRecord]) -> Self {
        let foods: Vec<RecordId> = records
            .iter()
            .map(|r| &r.food_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect();
        let nutrients: Vec<RecordId> = records
            .iter()
            .map(|r| &r.nutrient_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect();

        let food_index: HashMap<&RecordId, usize> =
            foods.iter().enumerate().map(|(i, id)| (id, i)).collect();
        let nutrient_index: HashMap<&RecordId, usize> =
            nutrients.iter().enumerate().map(|(i, id)| (id, i)).collect();

        let mut columns = vec![vec![0.0; foods.len()]; nutrients.len()];
        for r in records.iter().filter(|r| r.present) {
            let f = food_index[&r.food_id];
            let n = nutrient_index[&r.nutrient_id];
            columns[n][f] = 1.0;
        }

        Self {
            foods,
            nutrients,
            columns,
        }
    }

    pub fn foods(&self) -> &[RecordId] {
        &self.foods
    }

    pub fn nutrients(&self) -> &[RecordId] {
        &self.nutrients
    }

    pub fn column(&self, nutrient: usize) -> &[f64] {
        &self.columns[nutrient]
    }

    pub fn get(&self, food: usize, nutrient: usize) -> f64 {
        self.columns[nutrient][food]
    }
}

/// Square nutrient × nutrient matrix, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    labels: Vec<RecordId>,
    values: Vec<f64>,
}

impl CorrelationMatrix {
    pub fn new(labels: Vec<RecordId>, values: Vec<f64>) -> Result<Self> {
        let n = labels.len();
        if values.len() != n * n {
            return Err(Error::InvalidMatrix(format!(
                "{} labels but {} cells",
                n,
                values.len()
            )));
        }
        Ok(Self { labels, values })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[RecordId] {
        &self.labels
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.labels.len() + j]
    }

    pub fn is_symmetric(&self) -> bool {
        let n = self.len();
        (0..n).all(|i| (i + 1..n).all(|j| self.get(i, j) == self.get(j, i)))
    }

    /// Zero every cell strictly below `threshold`, NaN included.
    pub fn thresholded(mut self, threshold: f64) -> Self {
        for v in &mut self.values {
            if v.is_nan() || *v < threshold {
                *v = 0.0;
            }
        }
        self
    }

    /// Nonzero cells of the upper triangle as `(i, j, weight)` with `i < j`.
    pub fn upper_nonzero(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let n = self.len();
        (0..n).flat_map(move |i| {
            (i + 1..n).filter_map(move |j| {
                let w = self.get(i, j);
                (w != 0.0).then_some((i, j, w))
            })
        })
    }
}

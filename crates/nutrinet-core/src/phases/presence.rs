//! Phase 2: Reduce measurements to binary presence.

use crate::config::{NutrientRecord, PresenceRecord};

/// Keep every record with a positive numeric value as a presence record,
/// preserving source order. Zero, negative, NaN and text values are dropped.
pub fn to_presence(records: &[NutrientRecord]) -> Vec<PresenceRecord> {
    records
        .iter()
        .filter(|r| r.value.as_number().is_some_and(|v| v > 0.0))
        .map(|r| PresenceRecord {
            food_id: r.food_id.clone(),
            nutrient_id: r.nutrient_id.clone(),
            present: true,
        })
        .collect()
}

/// Run the presence phase.
pub fn run_presence_phase(records: &[NutrientRecord]) -> Vec<PresenceRecord> {
    let presence = to_presence(records);
    log::info!(
        "{} of {} measurements indicate presence",
        presence.len(),
        records.len()
    );
    presence
}

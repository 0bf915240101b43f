//! Phase 1: Read the USDA flat files into typed records.
//!
//! Rows are `^`-delimited with `~` around text fields. Only fixed column
//! positions are read; trailing columns are ignored. Files are decoded
//! lossily because the SR releases are Latin-1.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder};

use crate::config::{
    Field, FoodCatalog, NutrientDefinitions, NutrientRecord, PipelineConfig, RecordId,
    STRIP_MARKER,
};
use crate::error::{Error, Result};

/// NUT_DATA: NDB_No, Nutr_No, Nutr_Val.
const NUT_DATA_COLUMNS: [usize; 3] = [0, 1, 2];
/// NUTR_DEF: Nutr_No, NutrDesc.
const NUTR_DEF_COLUMNS: [usize; 2] = [0, 3];
/// FOOD_DES: NDB_No, Long_Desc.
const FOOD_DES_COLUMNS: [usize; 2] = [0, 2];

/// Everything the loader produces for one run.
#[derive(Debug, Default)]
pub struct LoadedData {
    pub records: Vec<NutrientRecord>,
    pub definitions: NutrientDefinitions,
    pub foods: FoodCatalog,
}

/// Run the loading phase: read measurements, definitions and (optionally)
/// food descriptions from `config.data_dir`.
pub fn run_loading_phase(config: &PipelineConfig) -> Result<LoadedData> {
    let records = load_nutrient_data(&config.nutrient_data_path(), config.delimiter)?;
    let definitions =
        load_nutrient_definitions(&config.nutrient_definitions_path(), config.delimiter)?;

    let foods = match config.food_descriptions_path() {
        Some(path) if path.exists() => load_food_catalog(&path, config.delimiter)?,
        Some(path) => {
            log::warn!(
                "food descriptions {} not found; reporting food ids",
                path.display()
            );
            FoodCatalog::new()
        }
        None => FoodCatalog::new(),
    };

    log::info!(
        "loaded {} measurements, {} nutrient definitions, {} food descriptions",
        records.len(),
        definitions.len(),
        foods.len()
    );

    Ok(LoadedData {
        records,
        definitions,
        foods,
    })
}

pub fn load_nutrient_data(path: &Path, delimiter: u8) -> Result<Vec<NutrientRecord>> {
    parse_nutrient_data(open(path)?, path, delimiter)
}

pub fn load_nutrient_definitions(path: &Path, delimiter: u8) -> Result<NutrientDefinitions> {
    parse_nutrient_definitions(open(path)?, path, delimiter)
}

pub fn load_food_catalog(path: &Path, delimiter: u8) -> Result<FoodCatalog> {
    parse_food_catalog(open(path)?, path, delimiter)
}

/// Parse measurement rows from any reader. `source` is only used in errors.
pub fn parse_nutrient_data<R: Read>(
    reader: R,
    source: &Path,
    delimiter: u8,
) -> Result<Vec<NutrientRecord>> {
    let mut records = Vec::new();
    read_columns(reader, source, delimiter, &NUT_DATA_COLUMNS, |fields| {
        records.push(NutrientRecord {
            food_id: RecordId::new(&fields[0]),
            nutrient_id: RecordId::new(&fields[1]),
            value: Field::clean(&fields[2]),
        });
    })?;
    Ok(records)
}

pub fn parse_nutrient_definitions<R: Read>(
    reader: R,
    source: &Path,
    delimiter: u8,
) -> Result<NutrientDefinitions> {
    let mut definitions = NutrientDefinitions::new();
    read_columns(reader, source, delimiter, &NUTR_DEF_COLUMNS, |fields| {
        definitions.insert(RecordId::new(&fields[0]), strip_text(&fields[1]));
    })?;
    Ok(definitions)
}

pub fn parse_food_catalog<R: Read>(
    reader: R,
    source: &Path,
    delimiter: u8,
) -> Result<FoodCatalog> {
    let mut foods = FoodCatalog::new();
    read_columns(reader, source, delimiter, &FOOD_DES_COLUMNS, |fields| {
        foods.insert(RecordId::new(&fields[0]), strip_text(&fields[1]));
    })?;
    Ok(foods)
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| Error::DataFormat {
        path: path.to_path_buf(),
        source,
    })
}

fn strip_text(raw: &str) -> String {
    raw.trim_matches(STRIP_MARKER).to_string()
}

/// Walk every row and hand the selected columns, in `columns` order, to `on_row`.
/// Fails on the first row that is too short to contain every column.
fn read_columns<R, F>(
    reader: R,
    source: &Path,
    delimiter: u8,
    columns: &[usize],
    mut on_row: F,
) -> Result<()>
where
    R: Read,
    F: FnMut(&[String]),
{
    let expected = columns.iter().copied().max().map_or(0, |m| m + 1);
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut record = ByteRecord::new();
    let mut selected: Vec<String> = Vec::with_capacity(columns.len());
    let mut row = 0u64;

    loop {
        let more = rdr
            .read_byte_record(&mut record)
            .map_err(|err| Error::Csv {
                path: source.to_path_buf(),
                source: err,
            })?;
        if !more {
            break;
        }
        row += 1;

        // A lone CR or whitespace line at the end of a file.
        if record.len() == 1 && record[0].iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        if record.len() < expected {
            let line = record.position().map_or(row, |p| p.line());
            return Err(Error::Parse {
                path: source.to_path_buf(),
                line,
                expected,
                found: record.len(),
            });
        }

        selected.clear();
        selected.extend(
            columns
                .iter()
                .map(|&c| String::from_utf8_lossy(&record[c]).into_owned()),
        );
        on_row(&selected);
    }

    Ok(())
}

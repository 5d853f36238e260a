//! Loads known cells and their yields from a JSON file at startup.
//!
//! The file is an array of `{ "id": "<h3 cell>", "gold": n, "wood": n, "ore": n }`
//! objects. Missing yields default to zero; invalid ids are skipped.

use std::io;
use std::path::Path;

use h3o::CellIndex;
use hexmap_shared::ResourceInfo;
use serde::Deserialize;
use tracing::{info, warn};

use crate::state::{AppState, SeededCell};

#[derive(Debug, Deserialize)]
struct SeedEntry {
    #[serde(alias = "cellId", alias = "cell_id", alias = "h3")]
    id: String,
    #[serde(flatten)]
    info: ResourceInfo,
}

#[derive(Debug, Default, PartialEq)]
pub struct ParsedSeed {
    pub cells: Vec<(String, SeededCell)>,
    pub skipped: usize,
}

pub fn parse_seed(bytes: &[u8]) -> Result<ParsedSeed, serde_json::Error> {
    let entries: Vec<SeedEntry> = serde_json::from_slice(bytes)?;
    let mut parsed = ParsedSeed::default();
    for entry in entries {
        match entry.id.trim().parse::<CellIndex>() {
            Ok(cell) => parsed.cells.push((
                cell.to_string(),
                SeededCell {
                    resolution: u8::from(cell.resolution()),
                    info: entry.info,
                },
            )),
            Err(e) => {
                warn!(id = %entry.id, error = %e, "skipping seed entry with invalid cell id");
                parsed.skipped += 1;
            }
        }
    }
    Ok(parsed)
}

/// Read `path` into `state.seeded`. Returns the number of cells loaded.
pub async fn load(state: &AppState, path: &Path) -> io::Result<usize> {
    let bytes = tokio::fs::read(path).await?;
    let parsed = parse_seed(&bytes)?;
    let count = parsed.cells.len();
    for (id, cell) in parsed.cells {
        state.seeded.insert(id, cell);
    }
    info!(
        path = %path.display(),
        loaded = count,
        skipped = parsed.skipped,
        "loaded seed cells"
    );
    Ok(count)
}

use thiserror::Error;

use crate::xlsx::Cell;

/// Marker substrings used to locate the header row.
const HEADER_MARKERS: [&str; 3] = ["liquor", "brand name", "proof"];

const CODE_COL: &str = "LIQUOR";
const BRAND_COL: &str = "BRAND NAME";
const PROOF_COL: &str = "PROOF";
const PRICE_COL: &str = "LICENSEE";
const ADA_COL: &str = "ADA";

/// Resolved column positions for one price book layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Schema {
    pub header_row: usize,
    pub code: usize,
    pub brand: usize,
    pub proof: usize,
    pub list_price: usize,
    pub ada: usize,
}

/// A layout we refuse to parse. A missing required column means the upstream
/// schema shifted, and diffing against the master would be unsafe.
#[derive(Debug, PartialEq, Error)]
pub enum SchemaError {
    #[error("no header row found")]
    HeaderNotFound,
    #[error("required column '{0}' missing from header row")]
    MissingColumn(&'static str),
}

impl Schema {
    /// Locate the header row and resolve the five required columns.
    ///
    /// The header row is found heuristically: the first row whose non-empty,
    /// trimmed, lower-cased cells contain at least two of the three marker
    /// labels. Later rows that also match are ignored.
    pub fn detect(grid: &[Vec<Cell>]) -> Result<Schema, SchemaError> {
        let header_row = find_header_row(grid).ok_or(SchemaError::HeaderNotFound)?;
        let labels: Vec<String> = grid[header_row].iter().map(|c| c.to_text()).collect();

        let col = |name: &'static str| {
            labels
                .iter()
                .position(|l| l.eq_ignore_ascii_case(name))
                .ok_or(SchemaError::MissingColumn(name))
        };

        Ok(Schema {
            header_row,
            code: col(CODE_COL)?,
            brand: col(BRAND_COL)?,
            proof: col(PROOF_COL)?,
            list_price: col(PRICE_COL)?,
            ada: col(ADA_COL)?,
        })
    }
}

fn find_header_row(grid: &[Vec<Cell>]) -> Option<usize> {
    grid.iter().position(|row| {
        let cells: Vec<String> = row
            .iter()
            .filter(|c| !c.is_empty())
            .map(|c| c.to_text().to_lowercase())
            .collect();
        let hits = HEADER_MARKERS
            .iter()
            .filter(|m| cells.iter().any(|c| c.contains(*m)))
            .count();
        hits >= 2
    })
}

// ── Tests ──

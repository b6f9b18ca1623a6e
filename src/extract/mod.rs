//! Price book extraction: raw cell grid → ordered product records.
//!
//! Price books are multi-section sheets: a preamble, a header row somewhere
//! below it, then data rows interleaved with single-cell category banners.
//! Extraction locates the header heuristically, maps the required columns,
//! and walks the remaining rows forward, carrying the current category.

pub mod schema;

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::record::ProductRecord;
use crate::xlsx::Cell;
use schema::{Schema, SchemaError};

/// Single-cell rows made only of letters, spaces, `/`, `&`, `-` are
/// category banners.
static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z /&-]+$").unwrap());

/// Why a data row produced no record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkipReason {
    /// The identifier cell is empty or not digits-only.
    NonNumericCode,
    /// The row is too short to reach the identifier column.
    ColumnMismatch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowSkip {
    /// 0-based row index in the source grid.
    pub row: usize,
    pub reason: SkipReason,
}

/// Everything one parse pass produced: records plus per-row diagnostics.
#[derive(Debug, Default, PartialEq)]
pub struct Extraction {
    pub records: Vec<ProductRecord>,
    pub skipped: Vec<RowSkip>,
}

/// Parse a raw price book grid into product records, in document order.
///
/// Fails closed: a missing header row or required column returns an error and
/// no records, so a reshaped upstream sheet can never produce a bogus diff.
/// Individual bad rows are skipped with a reason, never fatal.
pub fn extract(grid: &[Vec<Cell>], date_added: NaiveDate) -> Result<Extraction, SchemaError> {
    let schema = Schema::detect(grid)?;
    let mut out = Extraction::default();
    let mut category: Option<String> = None;

    for (idx, row) in grid.iter().enumerate().skip(schema.header_row + 1) {
        let filled: Vec<&Cell> = row.iter().filter(|c| !c.is_empty()).collect();
        if filled.is_empty() {
            continue;
        }

        // A lone text cell names the category for all rows until the next
        // banner. Anything alongside it makes this an ordinary data row.
        if let [only] = filled.as_slice() {
            let text = only.to_text();
            if SECTION_RE.is_match(&text) {
                category = Some(text);
                continue;
            }
        }

        match build_record(row, &schema, category.as_deref(), date_added) {
            Ok(record) => out.records.push(record),
            Err(reason) => out.skipped.push(RowSkip { row: idx, reason }),
        }
    }

    Ok(out)
}

fn build_record(
    row: &[Cell],
    schema: &Schema,
    category: Option<&str>,
    date_added: NaiveDate,
) -> Result<ProductRecord, SkipReason> {
    let code = row
        .get(schema.code)
        .ok_or(SkipReason::ColumnMismatch)?
        .to_text();
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(SkipReason::NonNumericCode);
    }

    let cell = |i: usize| row.get(i).unwrap_or(&Cell::Empty);

    Ok(ProductRecord {
        code,
        brand: cell(schema.brand).to_text(),
        proof: cell(schema.proof).to_number(),
        list_price: cell(schema.list_price).to_number(),
        ada: cell(schema.ada).to_text(),
        category: category.map(str::to_string),
        date_added,
    })
}

// ── Tests ──

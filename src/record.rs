use std::path::Path;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

static FILE_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}-\d{1,2}-\d{2}").unwrap());

/// One priced item from a spirits price book.
///
/// `code` is the stable key for diffing; everything numeric is optional
/// because upstream cells are free-form and an unparseable value must never
/// sink the row. Serde renames match the persisted snapshot columns exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "CODE")]
    pub code: String,
    #[serde(rename = "Brand")]
    pub brand: String,
    #[serde(rename = "Proof")]
    pub proof: Option<f64>,
    #[serde(rename = "List Price")]
    pub list_price: Option<f64>,
    #[serde(rename = "ADA")]
    pub ada: String,
    #[serde(rename = "Category")]
    pub category: Option<String>,
    #[serde(rename = "Date Added")]
    pub date_added: NaiveDate,
}

/// Date embedded in a price book filename (`M(M)-D(D)-YY`), if any.
pub fn date_from_path(path: &Path) -> Option<NaiveDate> {
    let name = path.file_name()?.to_str()?;
    let m = FILE_DATE_RE.find(name)?;
    NaiveDate::parse_from_str(m.as_str(), "%m-%d-%y").ok()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_date_padded() {
        let d = date_from_path(Path::new("downloads/Price_Book_04-15-25.xlsx"));
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 4, 15));
    }

    #[test]
    fn filename_date_unpadded() {
        let d = date_from_path(Path::new("Web-Price-Book-4-1-24.xlsx"));
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 4, 1));
    }

    #[test]
    fn filename_without_date() {
        assert_eq!(date_from_path(Path::new("price_book_current.xlsx")), None);
    }

    #[test]
    fn filename_with_bogus_date() {
        // Matches the shape but not a real calendar date.
        assert_eq!(date_from_path(Path::new("book_88-99-25.xlsx")), None);
    }
}

use std::collections::HashSet;

use crate::record::ProductRecord;

/// Added/removed record sets between two price book snapshots.
#[derive(Debug, Default, PartialEq)]
pub struct Delta {
    pub added: Vec<ProductRecord>,
    pub removed: Vec<ProductRecord>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Set difference by product code, preserving each side's document order.
///
/// Codes are treated as a best-effort key: unique within one extraction but
/// possibly recycled across upstream revisions.
pub fn diff(new: &[ProductRecord], master: &[ProductRecord]) -> Delta {
    let new_codes: HashSet<&str> = new.iter().map(|r| r.code.as_str()).collect();
    let old_codes: HashSet<&str> = master.iter().map(|r| r.code.as_str()).collect();

    Delta {
        added: new
            .iter()
            .filter(|r| !old_codes.contains(r.code.as_str()))
            .cloned()
            .collect(),
        removed: master
            .iter()
            .filter(|r| !new_codes.contains(r.code.as_str()))
            .cloned()
            .collect(),
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(code: &str) -> ProductRecord {
        ProductRecord {
            code: code.to_string(),
            brand: format!("Brand {code}"),
            proof: Some(90.0),
            list_price: Some(29.99),
            ada: String::new(),
            category: Some("WHISKEY".to_string()),
            date_added: NaiveDate::from_ymd_opt(2025, 4, 15).unwrap(),
        }
    }

    fn codes(records: &[ProductRecord]) -> Vec<&str> {
        records.iter().map(|r| r.code.as_str()).collect()
    }

    #[test]
    fn identity_yields_empty_delta() {
        let x = vec![rec("100"), rec("200"), rec("300")];
        let delta = diff(&x, &x);
        assert!(delta.is_empty());
    }

    #[test]
    fn added_and_removed_are_disjoint_differences() {
        let master = vec![rec("100"), rec("200")];
        let new = vec![rec("200"), rec("300")];
        let delta = diff(&new, &master);
        assert_eq!(codes(&delta.added), vec!["300"]);
        assert_eq!(codes(&delta.removed), vec!["100"]);
    }

    #[test]
    fn output_order_follows_each_source() {
        let master = vec![rec("900"), rec("500"), rec("100")];
        let new = vec![rec("030"), rec("020"), rec("010")];
        let delta = diff(&new, &master);
        assert_eq!(codes(&delta.added), vec!["030", "020", "010"]);
        assert_eq!(codes(&delta.removed), vec!["900", "500", "100"]);
    }

    #[test]
    fn diff_is_idempotent() {
        let master = vec![rec("100"), rec("200")];
        let new = vec![rec("200"), rec("300")];
        assert_eq!(diff(&new, &master), diff(&new, &master));
    }

    #[test]
    fn empty_master_means_everything_added() {
        let new = vec![rec("100"), rec("200")];
        let delta = diff(&new, &[]);
        assert_eq!(codes(&delta.added), vec!["100", "200"]);
        assert!(delta.removed.is_empty());
    }
}

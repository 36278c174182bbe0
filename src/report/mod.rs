//! Reporting utilities: row selection and formatted terminal output.

pub mod format;

use crate::domain::MergedRecord;

/// The `top_n` most used merged rows, by ascending rank.
///
/// Rows sharing a rank (duplicate join keys) keep their merged order.
pub fn top_by_rank(records: &[MergedRecord], top_n: usize) -> Vec<MergedRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|r| r.usage.rank);
    sorted.truncate(top_n);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testutil::roster;

    #[test]
    fn top_by_rank_orders_and_truncates() {
        let mut records = roster();
        records.reverse();

        let top = top_by_rank(&records, 3);
        let names: Vec<&str> = top.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Bravo", "Charlie"]);

        assert_eq!(top_by_rank(&records, 100).len(), records.len());
    }
}

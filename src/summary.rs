//! # Destination Summarization
//!
//! Aggregates per-shipment export rows into the top-destinations bar chart
//! shape: one row per destination ranked by quantity, with everything past
//! the cut folded into a single `"Others"` row.

use std::collections::HashMap;

use serde::Serialize;

/// Default number of named destinations kept before folding into `"Others"`.
pub const DEFAULT_TOP_N: usize = 5;

/// One shipment row, already filtered to a year and product by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationRecord {
    /// Short display name, the grouping key ("China", "India", ...).
    pub short_destination: String,
    /// Full name, carried for popups and tables.
    pub long_destination: String,
    /// Exported quantity in tonnes.
    pub quantity: f64,
    /// Number of export transactions.
    pub transaction: u64,
}

/// One aggregated row of the top-destinations chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestinationSummary {
    pub destination: String,
    pub quantity: f64,
    pub transaction: u64,
}

/// Summarize shipment rows into the top `top_n` destinations plus `"Others"`.
///
/// Rows are grouped by `short_destination` with quantity and transaction
/// counts summed per group. Groups sort descending by summed quantity, ties
/// broken by destination name ascending so the ranking is deterministic. The
/// top `top_n` groups are kept verbatim; any remainder is folded into one
/// synthetic `"Others"` row, omitted entirely when nothing remains. Empty
/// input yields an empty vector.
///
/// Quantities accumulate as plain floats - rounding and formatting belong to
/// the chart layer. The sum of quantities across the returned rows equals the
/// sum across the input rows.
///
/// # Example
/// ```
/// use mining_map::{summarize_destinations, DestinationRecord};
///
/// let rows = vec![
///     DestinationRecord {
///         short_destination: "China".into(),
///         long_destination: "People's Republic of China".into(),
///         quantity: 100.0,
///         transaction: 5,
///     },
///     DestinationRecord {
///         short_destination: "India".into(),
///         long_destination: "Republic of India".into(),
///         quantity: 50.0,
///         transaction: 2,
///     },
/// ];
///
/// let summary = summarize_destinations(&rows, 5);
/// assert_eq!(summary[0].destination, "China");
/// ```
pub fn summarize_destinations(
    rows: &[DestinationRecord],
    top_n: usize,
) -> Vec<DestinationSummary> {
    let mut groups: HashMap<&str, (f64, u64)> = HashMap::new();
    for row in rows {
        let entry = groups.entry(row.short_destination.as_str()).or_default();
        entry.0 += row.quantity;
        entry.1 += row.transaction;
    }

    let mut ranked: Vec<DestinationSummary> = groups
        .into_iter()
        .map(|(destination, (quantity, transaction))| DestinationSummary {
            destination: destination.to_string(),
            quantity,
            transaction,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.quantity
            .total_cmp(&a.quantity)
            .then_with(|| a.destination.cmp(&b.destination))
    });

    if ranked.len() <= top_n {
        return ranked;
    }

    let rest = ranked.split_off(top_n);
    let mut others = DestinationSummary {
        destination: "Others".to_string(),
        quantity: 0.0,
        transaction: 0,
    };
    for row in rest {
        others.quantity += row.quantity;
        others.transaction += row.transaction;
    }
    ranked.push(others);

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(short: &str, quantity: f64, transaction: u64) -> DestinationRecord {
        DestinationRecord {
            short_destination: short.to_string(),
            long_destination: short.to_string(),
            quantity,
            transaction,
        }
    }

    #[test]
    fn test_top_n_with_others() {
        let rows = vec![
            record("China", 100.0, 5),
            record("India", 50.0, 2),
            record("USA", 10.0, 1),
        ];

        let summary = summarize_destinations(&rows, 2);
        assert_eq!(
            summary,
            vec![
                DestinationSummary {
                    destination: "China".into(),
                    quantity: 100.0,
                    transaction: 5,
                },
                DestinationSummary {
                    destination: "India".into(),
                    quantity: 50.0,
                    transaction: 2,
                },
                DestinationSummary {
                    destination: "Others".into(),
                    quantity: 10.0,
                    transaction: 1,
                },
            ]
        );
    }

    #[test]
    fn test_no_others_row_without_remainder() {
        let rows = vec![record("China", 100.0, 5), record("India", 50.0, 2)];
        let summary = summarize_destinations(&rows, 5);
        assert_eq!(summary.len(), 2);
        assert!(summary.iter().all(|s| s.destination != "Others"));
    }

    #[test]
    fn test_groups_are_summed() {
        let rows = vec![
            record("China", 60.0, 3),
            record("China", 40.0, 2),
            record("India", 50.0, 2),
        ];
        let summary = summarize_destinations(&rows, 5);
        assert_eq!(summary[0].destination, "China");
        assert_eq!(summary[0].quantity, 100.0);
        assert_eq!(summary[0].transaction, 5);
    }

    #[test]
    fn test_quantity_conservation() {
        let rows = vec![
            record("China", 1234.56, 10),
            record("India", 0.1, 1),
            record("USA", 0.2, 1),
            record("Zambia", 98.7, 4),
            record("Belgium", 7.0, 2),
            record("India", 11.3, 1),
            record("South Korea", 3.9, 1),
        ];
        let input_total: f64 = rows.iter().map(|r| r.quantity).sum();

        let summary = summarize_destinations(&rows, 3);
        let output_total: f64 = summary.iter().map(|s| s.quantity).sum();
        assert!((input_total - output_total).abs() < 1e-6);
    }

    #[test]
    fn test_row_count_bound() {
        let rows: Vec<DestinationRecord> = (0..12)
            .map(|i| record(&format!("dest-{i:02}"), f64::from(i), 1))
            .collect();

        let summary = summarize_destinations(&rows, 5);
        assert_eq!(summary.len(), 6); // 5 named + Others
        assert_eq!(summary[5].destination, "Others");
    }

    #[test]
    fn test_ties_break_by_name() {
        let rows = vec![
            record("Zambia", 50.0, 1),
            record("Belgium", 50.0, 1),
            record("India", 50.0, 1),
        ];
        let summary = summarize_destinations(&rows, 3);
        let names: Vec<&str> = summary.iter().map(|s| s.destination.as_str()).collect();
        assert_eq!(names, vec!["Belgium", "India", "Zambia"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(summarize_destinations(&[], 5).is_empty());
    }

    #[test]
    fn test_idempotent() {
        let rows = vec![
            record("China", 100.0, 5),
            record("India", 50.0, 2),
            record("USA", 10.0, 1),
        ];
        assert_eq!(
            summarize_destinations(&rows, 2),
            summarize_destinations(&rows, 2)
        );
    }
}

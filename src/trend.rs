//! # Trend Reshaping
//!
//! Turns a flat list of `{date, product, metric}` rows into the per-date
//! records a multi-series time chart consumes.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

/// One reported metric for a product on a date.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendRow {
    pub date: String,
    pub product: String,
    pub metric: f64,
}

/// One chart entry: a date plus the metrics reported for it, keyed by
/// product name.
///
/// Serializes flat, the way chart widgets expect it:
/// `{"date": "2020", "Cobalt": 10.0, "Copper": 5.0}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

/// Reshape flat trend rows into one entry per distinct date.
///
/// Entries appear in the order their date is first seen in the input; that
/// order is stable across runs. Each entry carries a value only for products
/// that reported that date - missing products mean "no data", never zero,
/// and the chart layer renders the gap.
///
/// Duplicate `(date, product)` pairs resolve last-write-wins: the later row
/// silently overwrites the earlier one, matching the upstream datasets which
/// are deduplicated at curation time.
///
/// # Example
/// ```
/// use mining_map::{transform_trend, TrendRow};
///
/// let rows = vec![
///     TrendRow { date: "2020".into(), product: "Cobalt".into(), metric: 10.0 },
///     TrendRow { date: "2020".into(), product: "Copper".into(), metric: 5.0 },
///     TrendRow { date: "2021".into(), product: "Cobalt".into(), metric: 12.0 },
/// ];
///
/// let series = transform_trend(&rows);
/// assert_eq!(series.len(), 2);
/// assert_eq!(series[0].values["Copper"], 5.0);
/// assert!(!series[1].values.contains_key("Copper"));
/// ```
pub fn transform_trend(rows: &[TrendRow]) -> Vec<TrendPoint> {
    let mut series: Vec<TrendPoint> = Vec::new();
    let mut by_date: HashMap<&str, usize> = HashMap::new();

    for row in rows {
        let idx = match by_date.get(row.date.as_str()) {
            Some(&idx) => idx,
            None => {
                series.push(TrendPoint {
                    date: row.date.clone(),
                    values: BTreeMap::new(),
                });
                by_date.insert(row.date.as_str(), series.len() - 1);
                series.len() - 1
            }
        };
        series[idx].values.insert(row.product.clone(), row.metric);
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(date: &str, product: &str, metric: f64) -> TrendRow {
        TrendRow {
            date: date.to_string(),
            product: product.to_string(),
            metric,
        }
    }

    #[test]
    fn test_sparse_series() {
        let rows = vec![
            row("2020", "Cobalt", 10.0),
            row("2020", "Copper", 5.0),
            row("2021", "Cobalt", 12.0),
        ];

        let series = transform_trend(&rows);
        assert_eq!(series.len(), 2);

        assert_eq!(series[0].date, "2020");
        assert_eq!(series[0].values["Cobalt"], 10.0);
        assert_eq!(series[0].values["Copper"], 5.0);

        assert_eq!(series[1].date, "2021");
        assert_eq!(series[1].values["Cobalt"], 12.0);
        assert!(!series[1].values.contains_key("Copper"));
    }

    #[test]
    fn test_dates_keep_first_appearance_order() {
        let rows = vec![
            row("2022", "Cobalt", 1.0),
            row("2019", "Cobalt", 2.0),
            row("2022", "Copper", 3.0),
            row("2020", "Cobalt", 4.0),
        ];

        let series = transform_trend(&rows);
        let dates: Vec<&str> = series.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(dates, vec!["2022", "2019", "2020"]);
    }

    #[test]
    fn test_every_pair_lands_under_its_product_key() {
        let rows = vec![
            row("2019", "Cobalt", 7.5),
            row("2019", "Copper", 8.5),
            row("2020", "Copper", 9.5),
        ];

        let series = transform_trend(&rows);
        for input in &rows {
            let point = series.iter().find(|p| p.date == input.date).unwrap();
            assert_eq!(point.values[&input.product], input.metric);
        }
    }

    #[test]
    fn test_duplicate_pair_last_write_wins() {
        let rows = vec![
            row("2020", "Cobalt", 10.0),
            row("2020", "Cobalt", 99.0),
        ];

        let series = transform_trend(&rows);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].values["Cobalt"], 99.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(transform_trend(&[]).is_empty());
    }

    #[test]
    fn test_idempotent() {
        let rows = vec![
            row("2020", "Cobalt", 10.0),
            row("2021", "Cobalt", 12.0),
        ];
        assert_eq!(transform_trend(&rows), transform_trend(&rows));
    }

    #[test]
    fn test_serializes_flat() {
        let rows = vec![row("2020", "Cobalt", 10.0), row("2020", "Copper", 5.0)];
        let series = transform_trend(&rows);
        let json = serde_json::to_value(&series[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"date": "2020", "Cobalt": 10.0, "Copper": 5.0})
        );
    }
}

//! # Share Computation
//!
//! Filters annual share rows to the selected year, converts fractional
//! shares into display percentages and attaches the deterministic color key
//! the chart theme resolves into an actual color.

use serde::Serialize;

/// One annual share row (share of production by nationality or project
/// group). Shares are fractions in `0..=1`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareRow {
    pub year: String,
    /// Product the share is scoped to; `None` for all-product rows.
    pub product: Option<String>,
    /// Category label the chart groups by (nationality, project group...).
    pub category: String,
    pub quantity: f64,
    pub quantity_share: f64,
    pub transaction: u64,
    pub transaction_share: f64,
}

/// One donut slice: category, rounded quantity, percentage and color key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareSlice {
    pub category: String,
    pub quantity: f64,
    pub share_percent: f64,
    pub color_key: String,
}

/// One per-project export share table row.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectShareRow {
    pub year: String,
    pub product: String,
    pub project: String,
    pub quantity: f64,
    pub quantity_share: f64,
    pub transaction: u64,
    pub transaction_share: f64,
}

/// One export share table entry with both shares as percentages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectShare {
    pub product: String,
    pub exporter: String,
    pub quantity: f64,
    pub quantity_percent: f64,
    pub transaction: u64,
    pub transaction_percent: f64,
}

/// Convert a fractional share to a percentage rounded to `decimals` places.
///
/// # Example
/// ```
/// use mining_map::to_percent;
/// assert_eq!(to_percent(0.3456, 1), 34.6);
/// assert_eq!(to_percent(0.3456, 2), 34.56);
/// ```
pub fn to_percent(fraction: f64, decimals: u32) -> f64 {
    round_to(fraction * 100.0, decimals)
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Derive the display-color key for a category label.
///
/// Lowercased with non-alphanumeric runs collapsed to a single `-`; the
/// theme layer resolves the key to an actual color. Pure, so the same label
/// always maps to the same key within a rendering session.
///
/// # Example
/// ```
/// use mining_map::color_key;
/// assert_eq!(color_key("DR Congo"), "dr-congo");
/// assert_eq!(color_key("China and Canada"), "china-and-canada");
/// ```
pub fn color_key(label: &str) -> String {
    let mut key = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_alphanumeric() {
            key.extend(c.to_lowercase());
        } else if !key.ends_with('-') && !key.is_empty() {
            key.push('-');
        }
    }
    key.trim_end_matches('-').to_string()
}

/// Build donut slices for one selected year (and optionally one product).
///
/// Quantities are rounded to one decimal for the slice labels; the share
/// fraction becomes a percentage rounded to `decimals` places (call sites
/// use 1 or 2 depending on the chart).
pub fn share_slices(
    rows: &[ShareRow],
    year: &str,
    product: Option<&str>,
    decimals: u32,
) -> Vec<ShareSlice> {
    rows.iter()
        .filter(|row| row.year == year)
        .filter(|row| product.is_none() || row.product.as_deref() == product)
        .map(|row| ShareSlice {
            category: row.category.clone(),
            quantity: round_to(row.quantity, 1),
            share_percent: to_percent(row.quantity_share, decimals),
            color_key: color_key(&row.category),
        })
        .collect()
}

/// Build the export-share-by-project table for one selected year.
///
/// Both the quantity and transaction shares become percentages at two
/// decimals.
pub fn project_shares(rows: &[ProjectShareRow], year: &str) -> Vec<ProjectShare> {
    rows.iter()
        .filter(|row| row.year == year)
        .map(|row| ProjectShare {
            product: row.product.clone(),
            exporter: row.project.clone(),
            quantity: row.quantity,
            quantity_percent: to_percent(row.quantity_share, 2),
            transaction: row.transaction,
            transaction_percent: to_percent(row.transaction_share, 2),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn share_row(year: &str, product: Option<&str>, category: &str, share: f64) -> ShareRow {
        ShareRow {
            year: year.to_string(),
            product: product.map(str::to_string),
            category: category.to_string(),
            quantity: 1234.567,
            quantity_share: share,
            transaction: 42,
            transaction_share: share,
        }
    }

    #[test]
    fn test_to_percent_rounding() {
        assert_eq!(to_percent(0.3456, 1), 34.6);
        assert_eq!(to_percent(0.3456, 2), 34.56);
        assert_eq!(to_percent(1.0, 1), 100.0);
        assert_eq!(to_percent(0.0, 2), 0.0);
    }

    #[test]
    fn test_color_key() {
        assert_eq!(color_key("China"), "china");
        assert_eq!(color_key("DR Congo"), "dr-congo");
        assert_eq!(color_key("China and Canada"), "china-and-canada");
        assert_eq!(color_key("China/Canada"), "china-canada");
        assert_eq!(color_key("  Unknown  "), "unknown");
    }

    #[test]
    fn test_color_key_deterministic() {
        assert_eq!(color_key("South Africa"), color_key("South Africa"));
    }

    #[test]
    fn test_share_slices_filter_by_year() {
        let rows = vec![
            share_row("2022", None, "China", 0.5),
            share_row("2023", None, "China", 0.6),
            share_row("2023", None, "Australia", 0.4),
        ];

        let slices = share_slices(&rows, "2023", None, 1);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].category, "China");
        assert_eq!(slices[0].share_percent, 60.0);
        assert_eq!(slices[0].quantity, 1234.6);
        assert_eq!(slices[0].color_key, "china");
    }

    #[test]
    fn test_share_slices_filter_by_product() {
        let rows = vec![
            share_row("2023", Some("Cobalt"), "China", 0.7),
            share_row("2023", Some("Copper"), "China", 0.3),
        ];

        let slices = share_slices(&rows, "2023", Some("Cobalt"), 1);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].share_percent, 70.0);
    }

    #[test]
    fn test_share_slices_empty() {
        assert!(share_slices(&[], "2023", None, 1).is_empty());
        let rows = vec![share_row("2022", None, "China", 0.5)];
        assert!(share_slices(&rows, "1999", None, 1).is_empty());
    }

    #[test]
    fn test_project_shares_two_decimal_percents() {
        let rows = vec![ProjectShareRow {
            year: "2023".to_string(),
            product: "Cobalt".to_string(),
            project: "ruashi".to_string(),
            quantity: 512.25,
            quantity_share: 0.12345,
            transaction: 17,
            transaction_share: 0.0789,
        }];

        let table = project_shares(&rows, "2023");
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].exporter, "ruashi");
        assert_eq!(table[0].quantity_percent, 12.35);
        assert_eq!(table[0].transaction_percent, 7.89);
    }

    #[test]
    fn test_project_shares_filters_year() {
        let rows = vec![ProjectShareRow {
            year: "2021".to_string(),
            product: "Copper".to_string(),
            project: "kamoto".to_string(),
            quantity: 1.0,
            quantity_share: 0.5,
            transaction: 1,
            transaction_share: 0.5,
        }];
        assert!(project_shares(&rows, "2023").is_empty());
    }
}

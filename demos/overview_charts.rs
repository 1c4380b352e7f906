//! Aggregating export statistics into chart-ready shapes.
//!
//! Run with: cargo run --example overview_charts

use mining_map::{
    decode_rows, share_slices, summarize_destinations, transform_trend, RawExportRow, RawShareRow,
    TrendRow, DEFAULT_TOP_N,
};

// Export-by-destination rows, quantities as strings the way the upstream
// export ships them.
static DESTINATIONS: &str = r#"[
    {"year": "2023", "product": "Cobalt", "short_destination": "China",
     "long_destination": "People's Republic of China", "quantity": "61200.5", "transaction": "402"},
    {"year": "2023", "product": "Cobalt", "short_destination": "Finland",
     "long_destination": "Republic of Finland", "quantity": "9100.0", "transaction": "55"},
    {"year": "2023", "product": "Cobalt", "short_destination": "India",
     "long_destination": "Republic of India", "quantity": "4410.7", "transaction": "38"},
    {"year": "2023", "product": "Cobalt", "short_destination": "Zambia",
     "long_destination": "Republic of Zambia", "quantity": "3020.2", "transaction": "61"},
    {"year": "2023", "product": "Cobalt", "short_destination": "South Korea",
     "long_destination": "Republic of Korea", "quantity": "2200.0", "transaction": "12"},
    {"year": "2023", "product": "Cobalt", "short_destination": "Belgium",
     "long_destination": "Kingdom of Belgium", "quantity": "1100.9", "transaction": "9"},
    {"year": "2023", "product": "Cobalt", "short_destination": "USA",
     "long_destination": "United States of America", "quantity": "950.3", "transaction": "7"},
    {"year": "2022", "product": "Cobalt", "short_destination": "China",
     "long_destination": "People's Republic of China", "quantity": "58800.1", "transaction": "390"}
]"#;

static NATIONALITY_SHARES: &str = r#"[
    {"year": "2023", "nationality": "China", "quantity": "88000.4",
     "quantity_share": "0.524", "transaction": 512, "transaction_share": "0.471"},
    {"year": "2023", "nationality": "DR Congo", "quantity": "31000.0",
     "quantity_share": "0.185", "transaction": 201, "transaction_share": "0.185"},
    {"year": "2023", "nationality": "Switzerland", "quantity": "27500.8",
     "quantity_share": "0.164", "transaction": 164, "transaction_share": "0.151"},
    {"year": "2023", "nationality": "Kazakhstan", "quantity": "21300.2",
     "quantity_share": "0.127", "transaction": 210, "transaction_share": "0.193"}
]"#;

fn trend_row(date: &str, product: &str, metric: f64) -> TrendRow {
    TrendRow {
        date: date.to_string(),
        product: product.to_string(),
        metric,
    }
}

fn main() {
    let selected_year = "2023";
    let selected_product = "Cobalt";

    // The page filters by year and product, then hands the rows over
    let rows: Vec<RawExportRow> = decode_rows(DESTINATIONS).expect("bundled dataset is valid");
    let filtered: Vec<_> = rows
        .iter()
        .filter(|row| row.year == selected_year && row.product == selected_product)
        .map(RawExportRow::record)
        .collect();

    println!(
        "1. Top destinations of {selected_product} in {selected_year} (top {DEFAULT_TOP_N}):"
    );
    let summary = summarize_destinations(&filtered, DEFAULT_TOP_N);
    for row in &summary {
        println!(
            "   {:<12} {:>10.1} t in {:>3} transaction(s)",
            row.destination, row.quantity, row.transaction
        );
    }

    // Trend chart: one entry per year, keyed by product. The 2023 copper
    // figure is not reported yet, so that entry stays sparse.
    println!("\n2. Export quantity trend:");
    let trend_rows = vec![
        trend_row("2021", "Cobalt", 93_200.0),
        trend_row("2021", "Copper", 1_800_400.0),
        trend_row("2022", "Cobalt", 111_700.0),
        trend_row("2022", "Copper", 2_236_100.0),
        trend_row("2023", "Cobalt", 128_400.0),
    ];
    for point in transform_trend(&trend_rows) {
        println!("   {}", serde_json::to_string(&point).expect("serializable"));
    }

    // Donut chart: nationality shares as percentages with color keys
    println!("\n3. Share of production by nationality in {selected_year}:");
    let share_rows: Vec<RawShareRow> =
        decode_rows(NATIONALITY_SHARES).expect("bundled dataset is valid");
    let share_rows: Vec<_> = share_rows.iter().map(RawShareRow::share_row).collect();
    for slice in share_slices(&share_rows, selected_year, None, 1) {
        println!(
            "   {:<12} {:>5.1}%  (color: var(--color-{}))",
            slice.category, slice.share_percent, slice.color_key
        );
    }
}

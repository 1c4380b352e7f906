//! Clustering map markers for a moving viewport.
//!
//! Run with: cargo run --example viewport_clusters

use mining_map::{
    decode_rows, load_geo_points, Bounds, ClusterConfig, ClusterFeature, ClusterIndex,
    RawPointFeature,
};

// A handful of infrastructure point features, in the shape the marker
// dataset ships in: coordinates as numeric strings plus a properties bag.
static FEATURES: &str = r#"[
    {"_project_id": "ruashi", "project_name": "Ruashi Mining",
     "latitude": "-11.624", "longitude": "27.578", "province": "Haut-Katanga"},
    {"_project_id": "etoile", "project_name": "Chemaf Etoile",
     "latitude": "-11.645", "longitude": "27.577", "province": "Haut-Katanga"},
    {"_project_id": "kipushi", "project_name": "Kipushi Corp",
     "latitude": "-11.760", "longitude": "27.235", "province": "Haut-Katanga"},
    {"_project_id": "kamoto", "project_name": "Kamoto Copper Company",
     "latitude": "-10.717", "longitude": "25.350", "province": "Lualaba"},
    {"_project_id": "mutanda", "project_name": "Mutanda Mining",
     "latitude": "-10.789", "longitude": "25.785", "province": "Lualaba"},
    {"_project_id": "tenke", "project_name": "Tenke Fungurume",
     "latitude": "-10.618", "longitude": "26.123", "province": "Lualaba"},
    {"_project_id": "kibali", "project_name": "Kibali Goldmines",
     "latitude_longitude": "3.108, 29.598", "province": "Haut-Uele"}
]"#;

fn main() {
    let features: Vec<RawPointFeature> = decode_rows(FEATURES).expect("bundled dataset is valid");
    let points = load_geo_points(features);
    println!("Loaded {} point features\n", points.len());

    let index = ClusterIndex::build(points, ClusterConfig::default());

    // The dashboard's initial view over the DRC
    let viewport = Bounds::new(18.0, -14.0, 32.0, 6.0);

    println!("1. Zooming in over the same viewport:");
    for zoom in [3.0, 4.3, 6.5, 10.0] {
        let visible = index.clusters_in(&viewport, zoom);
        println!("   zoom {zoom:>4}: {} marker(s)", visible.len());
        for feature in &visible {
            let (lng, lat) = feature.position();
            match feature {
                ClusterFeature::Cluster(c) => {
                    println!("      cluster #{} x{} at {lat:.3},{lng:.3}", c.id, c.point_count);
                }
                ClusterFeature::Leaf(l) => {
                    println!("      point `{}` at {lat:.3},{lng:.3}", l.point_id);
                }
            }
        }
    }

    // Click-to-expand: fly the camera to the zoom where the cluster splits
    println!("\n2. Expanding the first visible cluster:");
    let clicked = index
        .clusters_in(&viewport, 4.0)
        .into_iter()
        .find_map(|f| match f {
            ClusterFeature::Cluster(c) => Some(c),
            ClusterFeature::Leaf(_) => None,
        });

    match clicked {
        Some(cluster) => {
            let target = index.expansion_zoom(cluster.id, 20).expect("known cluster");
            println!(
                "   cluster #{} ({} points) splits at zoom {target}",
                cluster.id, cluster.point_count
            );
            for leaf in index.cluster_leaves(cluster.id).expect("known cluster") {
                let name = leaf
                    .properties
                    .get("project_name")
                    .and_then(|v| v.as_str())
                    .unwrap_or(&leaf.id);
                println!("      contains `{name}`");
            }
        }
        None => println!("   nothing clustered at zoom 4"),
    }

    // Transient map states never error
    println!("\n3. Inverted viewport (map still initializing):");
    let inverted = Bounds::new(32.0, 6.0, 18.0, -14.0);
    println!(
        "   {} marker(s) returned",
        index.clusters_in(&inverted, 4.0).len()
    );
}

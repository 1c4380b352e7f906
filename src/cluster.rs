//! # Marker Clustering
//!
//! Hierarchical clustering of map markers with viewport queries.
//!
//! The index is built once per dataset version and queried on every pan/zoom:
//! points are projected into the Web Mercator unit square, then merged
//! tier-by-tier from `max_zoom` down to `min_zoom`. Two entries merge at a
//! tier when their projected distance falls within the configured pixel
//! radius at that zoom. Each tier keeps its own R-tree, so a viewport query
//! is a single envelope lookup against the tier matching the current zoom.
//!
//! ## Algorithm
//! 1. Drop invalid points (logged, never fatal) and sort the rest so the
//!    produced clusters depend only on the point set, not its order
//! 2. Project every point into the unit square
//! 3. For each zoom from deepest to shallowest, greedily merge entries of the
//!    tier above that sit within the aggregation radius; a merged cluster is
//!    positioned at the point-count-weighted centroid of its members
//! 4. Queries clamp the requested zoom to the configured range and return
//!    clusters and individual leaves intersecting the viewport

use std::collections::HashMap;

use log::{debug, warn};
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::mercator::{lat_to_y, lng_to_x, x_to_lng, y_to_lat};
use crate::{Bounds, GeoPoint};

/// Configuration for the cluster index.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Aggregation radius in pixels at the configured tile extent.
    /// Default: 40.0
    pub radius: f64,

    /// Tile extent in pixels the radius is expressed against.
    /// Default: 512.0
    pub extent: f64,

    /// Shallowest zoom tier to build. Default: 0
    pub min_zoom: u8,

    /// Deepest zoom tier on which points are still clustered.
    /// Default: 16
    pub max_zoom: u8,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            radius: 40.0,
            extent: 512.0,
            min_zoom: 0,
            max_zoom: 16,
        }
    }
}

impl ClusterConfig {
    /// Aggregation radius in unit-square terms at a zoom tier.
    fn unit_radius(&self, zoom: u8) -> f64 {
        self.radius / (self.extent * 2f64.powi(i32::from(zoom)))
    }
}

// ============================================================================
// Query Result Types
// ============================================================================

/// A synthetic aggregate marker standing in for two or more points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    /// Stable identifier, valid for the lifetime of the index.
    pub id: u64,
    pub longitude: f64,
    pub latitude: f64,
    /// Number of leaf points this cluster transitively contains.
    pub point_count: u32,
}

/// An individual point marker, carrying its source record's properties.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaf {
    pub point_id: String,
    pub longitude: f64,
    pub latitude: f64,
    /// Opaque passthrough from the source [`GeoPoint`].
    pub properties: Map<String, Value>,
}

/// One visible marker returned by a viewport query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClusterFeature {
    Cluster(Cluster),
    Leaf(Leaf),
}

impl ClusterFeature {
    pub fn is_cluster(&self) -> bool {
        matches!(self, Self::Cluster(_))
    }

    /// Marker position as `(lng, lat)`.
    pub fn position(&self) -> (f64, f64) {
        match self {
            Self::Cluster(c) => (c.longitude, c.latitude),
            Self::Leaf(l) => (l.longitude, l.latitude),
        }
    }

    /// Number of source points represented by this marker (1 for a leaf).
    pub fn point_count(&self) -> u32 {
        match self {
            Self::Cluster(c) => c.point_count,
            Self::Leaf(_) => 1,
        }
    }
}

// ============================================================================
// Internal Tier Structure
// ============================================================================

/// A projected entry with its index for R-tree queries.
#[derive(Debug, Clone, Copy)]
struct IndexedEntry {
    idx: usize,
    x: f64,
    y: f64,
}

impl RTreeObject for IndexedEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for IndexedEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

#[derive(Debug, Clone)]
enum EntryKind {
    /// Index into the owned point set.
    Point(usize),
    /// A cluster and its member entries in the next-deeper tier.
    Cluster { id: u64, children: Vec<usize> },
}

#[derive(Debug, Clone)]
struct TierEntry {
    x: f64,
    y: f64,
    num_points: u32,
    kind: EntryKind,
}

struct Tier {
    entries: Vec<TierEntry>,
    tree: RTree<IndexedEntry>,
}

impl Tier {
    fn from_entries(entries: Vec<TierEntry>) -> Self {
        let indexed = entries
            .iter()
            .enumerate()
            .map(|(idx, e)| IndexedEntry {
                idx,
                x: e.x,
                y: e.y,
            })
            .collect();
        Self {
            entries,
            tree: RTree::bulk_load(indexed),
        }
    }
}

// ============================================================================
// Cluster Index
// ============================================================================

/// An immutable hierarchical cluster index over a fixed set of points.
///
/// Built once per dataset version; queries never mutate it, so sharing
/// references across callers is inherently safe. There is no incremental
/// insertion - rebuild when the underlying point set changes.
///
/// # Example
/// ```
/// use mining_map::{Bounds, ClusterConfig, ClusterIndex, GeoPoint};
///
/// let points = vec![
///     GeoPoint::new("a", 26.321, -11.366),
///     GeoPoint::new("b", 26.322, -11.365),
/// ];
/// let index = ClusterIndex::build(points, ClusterConfig::default());
///
/// // The two nearby markers merge at a shallow zoom
/// let world = Bounds::new(-180.0, -85.0, 180.0, 85.0);
/// let visible = index.clusters_in(&world, 4.0);
/// assert_eq!(visible.len(), 1);
/// assert_eq!(visible[0].point_count(), 2);
/// ```
pub struct ClusterIndex {
    config: ClusterConfig,
    points: Vec<GeoPoint>,
    /// `tiers[i]` serves zoom `min_zoom + i`; the final element holds the
    /// unclustered leaves one tier below `max_zoom`.
    tiers: Vec<Tier>,
    /// Cluster id -> (tier vector index where it formed, entry index).
    registry: HashMap<u64, (usize, usize)>,
}

impl ClusterIndex {
    /// Build the index from a set of points.
    ///
    /// Deterministic and pure: the same point set and config always produce
    /// the same index, regardless of input order. A point with out-of-range
    /// or non-finite coordinates is skipped with a warning; a single bad
    /// record never aborts construction. An empty input yields a valid index
    /// whose queries return empty vectors.
    pub fn build(points: Vec<GeoPoint>, config: ClusterConfig) -> Self {
        let mut config = config;
        config.min_zoom = config.min_zoom.min(config.max_zoom);

        let mut kept: Vec<GeoPoint> = Vec::with_capacity(points.len());
        for point in points {
            if point.is_valid() {
                kept.push(point);
            } else {
                warn!(
                    "skipping point `{}`: invalid coordinates ({}, {})",
                    point.id, point.latitude, point.longitude
                );
            }
        }

        // Insertion order must not be observable in the produced clusters.
        kept.sort_by(|a, b| {
            a.id.cmp(&b.id)
                .then(a.longitude.total_cmp(&b.longitude))
                .then(a.latitude.total_cmp(&b.latitude))
        });

        let leaves: Vec<TierEntry> = kept
            .iter()
            .enumerate()
            .map(|(i, p)| TierEntry {
                x: lng_to_x(p.longitude),
                y: lat_to_y(p.latitude),
                num_points: 1,
                kind: EntryKind::Point(i),
            })
            .collect();

        let tier_count = usize::from(config.max_zoom - config.min_zoom) + 1;
        let mut tiers: Vec<Tier> = Vec::with_capacity(tier_count + 1);
        let mut registry = HashMap::new();
        let mut next_id: u64 = 0;

        // Deepest first: leaves, then one clustered tier per zoom down to
        // min_zoom. The vector is reversed into query order at the end.
        tiers.push(Tier::from_entries(leaves));
        for zoom in (config.min_zoom..=config.max_zoom).rev() {
            let deeper = tiers.last().expect("leaf tier exists");
            let entries = cluster_tier(deeper, config.unit_radius(zoom), &mut next_id);
            tiers.push(Tier::from_entries(entries));
        }
        tiers.reverse();

        for (tier_idx, tier) in tiers.iter().enumerate() {
            for (entry_idx, entry) in tier.entries.iter().enumerate() {
                if let EntryKind::Cluster { id, children } = &entry.kind {
                    // Register the formation tier: the single multi-child
                    // entry for this id. Carried single-child copies at
                    // shallower tiers only stand in until it is seen.
                    if children.len() > 1 || !registry.contains_key(id) {
                        registry.insert(*id, (tier_idx, entry_idx));
                    }
                }
            }
        }

        debug!(
            "built cluster index: {} points, {} zoom tiers, {} clusters",
            kept.len(),
            tiers.len(),
            next_id
        );

        Self {
            config,
            points: kept,
            tiers,
            registry,
        }
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Everything visible in the viewport at a zoom level.
    ///
    /// `zoom` is floored to an integer tier and clamped to the configured
    /// `[min_zoom, max_zoom]` range. Returns every cluster or individual
    /// point whose position falls inside `bounds`, in deterministic order.
    /// A box with `min > max` on either axis yields an empty result rather
    /// than an error, so viewport-driven callers stay resilient while the
    /// map widget initializes.
    pub fn clusters_in(&self, bounds: &Bounds, zoom: f64) -> Vec<ClusterFeature> {
        if self.points.is_empty() {
            return Vec::new();
        }
        if !bounds.is_well_formed() {
            debug!(
                "ignoring inverted viewport box: [{}, {}, {}, {}]",
                bounds.min_lng, bounds.min_lat, bounds.max_lng, bounds.max_lat
            );
            return Vec::new();
        }

        let tier = &self.tiers[self.tier_index(zoom)];

        // Latitude flips under projection: min_lat maps to the larger y.
        let envelope = AABB::from_corners(
            [
                lng_to_x(bounds.min_lng.clamp(-180.0, 180.0)),
                lat_to_y(bounds.max_lat),
            ],
            [
                lng_to_x(bounds.max_lng.clamp(-180.0, 180.0)),
                lat_to_y(bounds.min_lat),
            ],
        );

        let mut hits: Vec<usize> = tier
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|e| e.idx)
            .collect();
        hits.sort_unstable();

        hits.into_iter()
            .map(|i| self.feature(&tier.entries[i]))
            .collect()
    }

    /// The smallest zoom tier at which a cluster splits apart.
    ///
    /// Always strictly greater than any tier the cluster is observable at;
    /// the result is clamped to `max` so callers can avoid unusable deep
    /// zooms. Returns `None` for an id the index never produced.
    pub fn expansion_zoom(&self, cluster_id: u64, max: u8) -> Option<u8> {
        let &(tier_idx, _) = self.registry.get(&cluster_id)?;
        let formation_zoom = self.config.min_zoom + tier_idx as u8;
        Some(formation_zoom.saturating_add(1).min(max))
    }

    /// The leaf points a cluster transitively contains, in deterministic
    /// order. Returns `None` for an unknown id.
    pub fn cluster_leaves(&self, cluster_id: u64) -> Option<Vec<&GeoPoint>> {
        let &(tier_idx, entry_idx) = self.registry.get(&cluster_id)?;
        let mut leaves = Vec::new();
        self.collect_leaves(tier_idx, entry_idx, &mut leaves);
        Some(leaves)
    }

    fn collect_leaves<'a>(&'a self, tier_idx: usize, entry_idx: usize, out: &mut Vec<&'a GeoPoint>) {
        match &self.tiers[tier_idx].entries[entry_idx].kind {
            EntryKind::Point(p) => out.push(&self.points[*p]),
            EntryKind::Cluster { children, .. } => {
                for &child in children {
                    self.collect_leaves(tier_idx + 1, child, out);
                }
            }
        }
    }

    fn tier_index(&self, zoom: f64) -> usize {
        let floored = zoom.floor();
        let clamped = floored
            .max(f64::from(self.config.min_zoom))
            .min(f64::from(self.config.max_zoom)) as u8;
        usize::from(clamped - self.config.min_zoom)
    }

    fn feature(&self, entry: &TierEntry) -> ClusterFeature {
        match &entry.kind {
            EntryKind::Point(p) => {
                let point = &self.points[*p];
                ClusterFeature::Leaf(Leaf {
                    point_id: point.id.clone(),
                    longitude: point.longitude,
                    latitude: point.latitude,
                    properties: point.properties.clone(),
                })
            }
            EntryKind::Cluster { id, .. } => ClusterFeature::Cluster(Cluster {
                id: *id,
                longitude: x_to_lng(entry.x),
                latitude: y_to_lat(entry.y),
                point_count: entry.num_points,
            }),
        }
    }
}

/// Greedily merge the entries of the next-deeper tier at one zoom's radius.
///
/// Entries are visited in index order; an unvisited entry seeds a group with
/// every unvisited neighbour within the radius. Groups of one are carried
/// down unchanged (clusters keep their id), larger groups become a new
/// cluster at the point-count-weighted centroid of their members.
fn cluster_tier(deeper: &Tier, radius: f64, next_id: &mut u64) -> Vec<TierEntry> {
    let mut assigned = vec![false; deeper.entries.len()];
    let mut entries = Vec::new();

    for (i, entry) in deeper.entries.iter().enumerate() {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;

        let mut members = vec![i];
        for neighbour in deeper
            .tree
            .locate_within_distance([entry.x, entry.y], radius * radius)
        {
            if !assigned[neighbour.idx] {
                assigned[neighbour.idx] = true;
                members.push(neighbour.idx);
            }
        }
        // Neighbour iteration order is tree-internal; sort so centroid
        // accumulation and child order stay deterministic.
        members.sort_unstable();

        if members.len() == 1 {
            let carried = match &entry.kind {
                EntryKind::Point(p) => EntryKind::Point(*p),
                EntryKind::Cluster { id, .. } => EntryKind::Cluster {
                    id: *id,
                    children: vec![i],
                },
            };
            entries.push(TierEntry {
                x: entry.x,
                y: entry.y,
                num_points: entry.num_points,
                kind: carried,
            });
        } else {
            let total: u32 = members.iter().map(|&m| deeper.entries[m].num_points).sum();
            let weight = f64::from(total);
            let x = members
                .iter()
                .map(|&m| deeper.entries[m].x * f64::from(deeper.entries[m].num_points))
                .sum::<f64>()
                / weight;
            let y = members
                .iter()
                .map(|&m| deeper.entries[m].y * f64::from(deeper.entries[m].num_points))
                .sum::<f64>()
                / weight;

            let id = *next_id;
            *next_id += 1;
            entries.push(TierEntry {
                x,
                y,
                num_points: total,
                kind: EntryKind::Cluster {
                    id,
                    children: members,
                },
            });
        }
    }

    entries
}

// ============================================================================
// Tests
// ============================================================================

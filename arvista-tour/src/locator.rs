//! Resolving POI offsets from the named nodes of a loaded asset

use std::f32::consts::TAU;

use arvista_core::{flatten_named, AssetMetrics, AssetTree, NodeId, Result, Vector3f};
use itertools::Itertools;

use crate::poi::{normalize_name, PoiCatalog, PoiId};

/// Where POIs without a matching node go: evenly spaced on a circle around
/// the asset origin, in catalog order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackLayout {
    /// Circle radius in normalized offset units
    pub radius: f32,
    /// Circle height in normalized offset units
    pub height: f32,
}

impl FallbackLayout {
    /// Offset of the POI at catalog position `index` out of `count`
    pub fn offset(&self, index: usize, count: usize) -> Vector3f {
        let angle = TAU * index as f32 / count.max(1) as f32;
        Vector3f::new(self.radius * angle.cos(), self.height, self.radius * angle.sin())
    }
}

impl Default for FallbackLayout {
    fn default() -> Self {
        Self { radius: 0.35, height: 0.0 }
    }
}

/// How each POI got its offset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocatorReport {
    /// POIs placed on a node, with the node that won
    pub matched: Vec<(PoiId, NodeId)>,
    /// POIs placed on the fallback circle
    pub fallback: Vec<PoiId>,
}

impl LocatorReport {
    pub fn is_complete(&self) -> bool {
        self.fallback.is_empty()
    }
}

/// For each catalog entry, the node whose normalized name equals the entry's
/// normalized anchor. `named` is taken in order and a later match replaces
/// an earlier one.
pub fn match_anchors(named: &[(NodeId, String)], catalog: &PoiCatalog) -> Vec<Option<NodeId>> {
    let by_anchor = catalog
        .iter()
        .enumerate()
        .map(|(index, poi)| (normalize_name(&poi.anchor_node_name), index))
        .into_group_map();

    let mut slots = vec![None; catalog.len()];
    for (node, name) in named {
        if let Some(indices) = by_anchor.get(&normalize_name(name)) {
            for &index in indices {
                slots[index] = Some(*node);
            }
        }
    }
    slots
}

/// Reconciles the POI catalog with the asset's named nodes
#[derive(Debug, Clone, Default)]
pub struct PoiLocator {
    layout: FallbackLayout,
}

impl PoiLocator {
    pub fn new(layout: FallbackLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &FallbackLayout {
        &self.layout
    }

    /// Assign every POI its offset: subtree bounding-box centre of the
    /// matching node, minus the asset centre, divided by the asset's longest
    /// edge. POIs without a usable node get the fallback layout.
    ///
    /// Runs once per catalog; a second call fails with `AlreadyResolved`.
    pub fn resolve<T>(
        &self,
        catalog: &mut PoiCatalog,
        tree: &T,
        root: NodeId,
        metrics: &AssetMetrics,
    ) -> Result<LocatorReport>
    where
        T: AssetTree + ?Sized,
    {
        if catalog.is_resolved() {
            return Err(arvista_core::Error::AlreadyResolved);
        }

        let named = flatten_named(tree, root);
        let slots = match_anchors(&named, catalog);
        let count = catalog.len();
        let mut report = LocatorReport::default();

        let offsets = catalog
            .iter()
            .zip(slots)
            .enumerate()
            .map(|(index, (poi, slot))| {
                let located = slot.and_then(|node| {
                    let bounds = tree.subtree_bounds(node)?;
                    Some((node, metrics.normalize(&bounds.center())))
                });
                match located {
                    Some((node, offset)) => {
                        report.matched.push((poi.id, node));
                        offset
                    }
                    None => {
                        tracing::warn!(
                            poi = poi.id,
                            anchor = %poi.anchor_node_name,
                            "no asset node with geometry for POI anchor; using fallback layout"
                        );
                        report.fallback.push(poi.id);
                        self.layout.offset(index, count)
                    }
                }
            })
            .collect::<Vec<_>>();

        catalog.assign_offsets(offsets)?;
        tracing::info!(
            matched = report.matched.len(),
            fallback = report.fallback.len(),
            "POI offsets resolved"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poi::PointOfInterest;
    use approx::assert_relative_eq;
    use arvista_core::{Aabb, InMemoryScene, Point3f};

    fn cube(center: Point3f) -> Aabb {
        Aabb::from_center_half_extents(center, Vector3f::repeat(0.1))
    }

    #[test]
    fn test_match_is_case_and_separator_insensitive() {
        let catalog = PoiCatalog::new(vec![
            PointOfInterest::new(1, "Town hall", "town_hall"),
            PointOfInterest::new(2, "Pier", "Pier-North"),
        ])
        .unwrap();
        let named = vec![
            (NodeId(4), "TOWN HALL".to_string()),
            (NodeId(5), "pier_north".to_string()),
            (NodeId(6), "pier_south".to_string()),
        ];

        assert_eq!(match_anchors(&named, &catalog), vec![Some(NodeId(4)), Some(NodeId(5))]);
    }

    #[test]
    fn test_duplicate_names_last_in_preorder_wins() {
        let mut scene = InMemoryScene::new();
        let root = scene.add_node("map", None);
        let district = scene.add_node("district", Some(root));
        scene.add_mesh("Fountain", Some(district), cube(Point3f::new(1.0, 0.0, 0.0)));
        let later = scene.add_mesh("fountain", Some(root), cube(Point3f::new(-1.0, 0.0, 0.0)));
        scene.add_mesh("ground", Some(root), Aabb::new(Point3f::new(-2.0, 0.0, -2.0), Point3f::new(2.0, 0.0, 2.0)));

        let mut catalog = PoiCatalog::new(vec![PointOfInterest::new(1, "Fountain", "fountain")]).unwrap();
        let metrics = AssetMetrics::from_bounds(&scene.subtree_bounds(root).unwrap()).unwrap();
        let report = PoiLocator::default().resolve(&mut catalog, &scene, root, &metrics).unwrap();

        assert_eq!(report.matched, vec![(1, later)]);
        assert_relative_eq!(catalog.get(0).unwrap().offset().unwrap(), Vector3f::new(-0.25, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_node_without_geometry_falls_back() {
        let mut scene = InMemoryScene::new();
        let root = scene.add_mesh("map", None, Aabb::new(Point3f::origin(), Point3f::new(1.0, 1.0, 1.0)));
        scene.add_node("bell_tower", Some(root));

        let mut catalog = PoiCatalog::new(vec![PointOfInterest::new(1, "Bell tower", "bell tower")]).unwrap();
        let metrics = AssetMetrics::from_bounds(&scene.subtree_bounds(root).unwrap()).unwrap();
        let layout = FallbackLayout { radius: 0.4, height: 0.1 };
        let report = PoiLocator::new(layout).resolve(&mut catalog, &scene, root, &metrics).unwrap();

        assert_eq!(report.fallback, vec![1]);
        assert_relative_eq!(catalog.get(0).unwrap().offset().unwrap(), Vector3f::new(0.4, 0.1, 0.0));
    }

    #[test]
    fn test_resolve_runs_once() {
        let mut scene = InMemoryScene::new();
        let root = scene.add_mesh("a", None, Aabb::new(Point3f::origin(), Point3f::new(1.0, 1.0, 1.0)));
        let mut catalog = PoiCatalog::new(vec![PointOfInterest::new(1, "A", "a")]).unwrap();
        let metrics = AssetMetrics::from_bounds(&scene.subtree_bounds(root).unwrap()).unwrap();
        let locator = PoiLocator::default();

        locator.resolve(&mut catalog, &scene, root, &metrics).unwrap();
        let before = catalog.clone();
        assert!(locator.resolve(&mut catalog, &scene, root, &metrics).is_err());
        assert_eq!(catalog, before);
    }

    #[test]
    fn test_fallback_angles_follow_catalog_order() {
        let layout = FallbackLayout { radius: 1.0, height: 0.0 };
        assert_relative_eq!(layout.offset(0, 4), Vector3f::new(1.0, 0.0, 0.0));
        assert_relative_eq!(layout.offset(1, 4), Vector3f::new(0.0, 0.0, 1.0), epsilon = 1e-6);
        assert_relative_eq!(layout.offset(2, 4), Vector3f::new(-1.0, 0.0, 0.0), epsilon = 1e-6);
    }
}

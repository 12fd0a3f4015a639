//! Integration tests for POI resolution and the tour state machine

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use approx::assert_relative_eq;
use arvista_core::{Aabb, AssetMetrics, AssetTree, InMemoryScene, NodeId, Point3f, SceneGraph, Vector3f};
use arvista_tour::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ANCHORS: [&str; 8] = [
    "Old_Town_Hall",
    "harbour-pier",
    "Cathedral",
    "market square",
    "CASTLE",
    "botanic_garden",
    "river-bridge",
    "Observatory",
];

/// Catalog of eight POIs named after `ANCHORS`
fn catalog() -> PoiCatalog {
    let pois = ANCHORS
        .iter()
        .enumerate()
        .map(|(i, anchor)| {
            PointOfInterest::new(i as u32 + 1, anchor.replace(['_', '-'], " "), anchor.to_string())
                .with_description(format!("Stop {}", i + 1))
        })
        .collect();
    PoiCatalog::new(pois).unwrap()
}

/// City asset with nodes for all anchors except the last three
fn city_asset() -> (InMemoryScene, NodeId, Vec<NodeId>) {
    let mut scene = InMemoryScene::new();
    let root = scene.add_node("city", None);
    scene.add_mesh(
        "terrain",
        Some(root),
        Aabb::new(Point3f::new(-10.0, 0.0, -10.0), Point3f::new(10.0, 0.5, 10.0)),
    );
    let landmarks = scene.add_node("landmarks", Some(root));

    let authored = ["old town hall", "HARBOUR_PIER", "cathedral", "Market-Square", "castle"];
    let nodes = authored
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let x = -8.0 + 4.0 * i as f32;
            let center = Point3f::new(x, 1.0, x * 0.5);
            scene.add_mesh(*name, Some(landmarks), Aabb::from_center_half_extents(center, Vector3f::new(0.5, 1.0, 0.5)))
        })
        .collect();

    (scene, root, nodes)
}

fn tour(n: usize) -> TourController {
    let pois = (0..n as u32).map(|i| PointOfInterest::new(i, format!("P{i}"), format!("p{i}"))).collect();
    let mut catalog = PoiCatalog::new(pois).unwrap();
    let mut scene = InMemoryScene::new();
    let root = scene.add_mesh("root", None, Aabb::new(Point3f::origin(), Point3f::new(1.0, 1.0, 1.0)));
    let metrics = AssetMetrics::from_bounds(&scene.subtree_bounds(root).unwrap()).unwrap();
    PoiLocator::default().resolve(&mut catalog, &scene, root, &metrics).unwrap();
    TourController::new(catalog, NodeId(99), TourSettings::default()).unwrap()
}

#[test]
fn test_fallback_completeness() {
    let (scene, root, nodes) = city_asset();
    let mut catalog = catalog();
    let metrics = AssetMetrics::from_bounds(&scene.subtree_bounds(root).unwrap()).unwrap();
    let layout = FallbackLayout { radius: 0.35, height: 0.0 };

    let report = PoiLocator::new(layout).resolve(&mut catalog, &scene, root, &metrics).unwrap();

    assert_eq!(report.matched.len(), 5);
    assert_eq!(report.fallback, vec![6, 7, 8]);
    assert!(catalog.iter().all(|p| p.offset().is_some()));

    for (poi, node) in catalog.iter().take(5).zip(&nodes) {
        let center = scene.subtree_bounds(*node).unwrap().center();
        let expected = (center - metrics.center()) / metrics.max_dimension();
        assert_eq!(poi.offset().unwrap(), expected);
    }

    let mut angles = Vec::new();
    for (index, poi) in catalog.iter().enumerate().skip(5) {
        let offset = poi.offset().unwrap();
        assert_relative_eq!(Vector3f::new(offset.x, 0.0, offset.z).norm(), 0.35, epsilon = 1e-6);
        assert_relative_eq!(offset.y, 0.0);
        assert_eq!(offset, layout.offset(index, 8));
        angles.push(offset.z.atan2(offset.x));
    }
    for (i, a) in angles.iter().enumerate() {
        for b in &angles[i + 1..] {
            assert!((a - b).abs() > 1e-3, "fallback angles must be distinct");
        }
    }
}

#[test]
fn test_index_wraparound_visits_all() {
    let mut tour = tour(8);
    let now = Instant::now();

    for step in 0..8 {
        assert_eq!(tour.state().current_index(), step);
        tour.next(now);
    }

    assert_eq!(tour.state().current_index(), 0);
    assert_eq!(tour.visited_count(), 8);
    assert_eq!(tour.state().visited(), &tour.catalog().ids().collect::<BTreeSet<_>>());
}

#[test]
fn test_completion_fires_exactly_once() {
    let mut tour = tour(8);
    let now = Instant::now();
    let mut completions = 0;

    for _ in 0..7 {
        tour.next(now);
    }
    completions += count_complete(tour.drain_events());
    assert_eq!(completions, 0);
    assert_eq!(tour.visited_count(), 7);

    tour.show_current();
    completions += count_complete(tour.drain_events());
    assert_eq!(completions, 1);

    for _ in 0..20 {
        tour.next(now);
        tour.show_current();
        tour.previous(now);
        tour.select(3, now);
    }
    completions += count_complete(tour.drain_events());
    assert_eq!(completions, 1);
}

fn count_complete(events: Vec<TourEvent>) -> usize {
    events.iter().filter(|e| **e == TourEvent::TourComplete).count()
}

#[test]
fn test_visited_set_is_monotonic_subset() {
    let mut rng = StdRng::seed_from_u64(0x7075);
    let mut tour = tour(8);
    let ids: BTreeSet<u32> = tour.catalog().ids().collect();
    let start = Instant::now();
    let mut previous = BTreeSet::new();

    for step in 0..500u64 {
        let now = start + Duration::from_millis(step * 16);
        match rng.gen_range(0..4) {
            0 => tour.next(now),
            1 => tour.previous(now),
            2 => tour.show_current(),
            _ => {
                let offset = tour.catalog().get(rng.gen_range(0..8)).unwrap().offset().unwrap();
                tour.select_by_offset_hit(offset, now);
            }
        }

        let visited = tour.state().visited().clone();
        assert!(visited.is_superset(&previous));
        assert!(visited.is_subset(&ids));
        previous = visited;
    }
}

#[test]
fn test_transition_ends_exactly_on_target() {
    let (mut scene, root, _) = city_asset();
    let mut catalog = catalog();
    let metrics = AssetMetrics::from_bounds(&scene.subtree_bounds(root).unwrap()).unwrap();
    PoiLocator::default().resolve(&mut catalog, &scene, root, &metrics).unwrap();

    let avatar = scene.add_node("avatar", None);
    let first = catalog.get(0).unwrap().offset().unwrap();
    scene.attach(avatar, root, first);

    let settings = TourSettings { transition: Duration::from_millis(600), hop_height: 0.1, pick_tolerance: 0.05 };
    let mut tour = TourController::new(catalog, avatar, settings).unwrap();
    let start = Instant::now();
    tour.next(start);
    tour.next(start + Duration::from_millis(200));

    let target = tour.current().offset().unwrap();
    let mut t = start + Duration::from_millis(200);
    while !tour.animator().is_idle() {
        t += Duration::from_millis(16);
        tour.tick(t, &mut scene);
    }

    assert_eq!(scene.local_offset(avatar), Some(target));
    assert_eq!(tour.state().current_index(), 2);
}

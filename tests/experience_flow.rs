//! End-to-end tests of the experience: load, search, place, tour, restart

use std::time::{Duration, Instant};

use approx::assert_relative_eq;
use arvista::prelude::*;
use arvista::arvista_core::Matrix4;
use tokio::sync::oneshot;

const CONFIG: &str = r#"
ar_target_size = 0.3
transition_duration_ms = 400

[[poi]]
id = 1
name = "Town hall"
anchor = "town_hall"
description = "Seat of the council"
icon = "🏛"

[[poi]]
id = 2
name = "Harbour"
anchor = "harbour"

[[poi]]
id = 3
name = "Cathedral"
anchor = "cathedral"

[[poi]]
id = 4
name = "Market"
anchor = "market-square"

[[poi]]
id = 5
name = "Castle"
anchor = "castle"

[[poi]]
id = 6
name = "Garden"
anchor = "botanic_garden"

[[poi]]
id = 7
name = "Bridge"
anchor = "river_bridge"

[[poi]]
id = 8
name = "Observatory"
anchor = "observatory"
"#;

struct Platform {
    requests: usize,
    reject: bool,
}

impl HitTestPlatform for Platform {
    fn request_hit_test_source(&mut self, _space: ReferenceSpace) -> HitTestSourceRequest {
        let (tx, rx) = oneshot::channel();
        self.requests += 1;
        let _ = tx.send(if self.reject {
            Err(PlatformError("hit-test unsupported".to_string()))
        } else {
            Ok(HitTestSource::new(self.requests as u64))
        });
        rx
    }
}

struct Frame(Option<Point3f>);

impl HitTestFrame for Frame {
    fn hit_test_results(&self, _source: &HitTestSource) -> Vec<Matrix4<f32>> {
        self.0
            .iter()
            .map(|p| Pose::from_position(*p).to_homogeneous())
            .collect()
    }
}

/// 10 m wide map with five of the eight anchors authored
fn experience() -> (Experience<InMemoryScene>, Result<LoadedAsset>) {
    let mut scene = InMemoryScene::new();
    let map = scene.add_node("Map", None);
    scene.add_mesh("ground", Some(map), Aabb::new(Point3f::new(-5.0, 0.0, -5.0), Point3f::new(5.0, 0.2, 5.0)));
    for (i, name) in ["Town Hall", "HARBOUR", "cathedral", "market_square", "Castle"].iter().enumerate() {
        let x = -4.0 + 2.0 * i as f32;
        scene.add_mesh(
            *name,
            Some(map),
            Aabb::from_center_half_extents(Point3f::new(x, 0.5, 1.0), Vector3f::new(0.3, 0.3, 0.3)),
        );
    }
    let nodes = ContentNodes {
        reticle: scene.add_node("reticle", None),
        avatar: scene.add_node("avatar", None),
        markers: (1..=8).map(|i| scene.add_node(format!("marker-{i}"), None)).collect(),
    };
    let loaded = scene.loaded_asset(map).ok_or(Error::InvalidAsset("no geometry".to_string()));
    let config = ExperienceConfig::from_toml_str(CONFIG).unwrap();
    (Experience::new(config, scene, nodes).unwrap(), loaded)
}

fn placed_experience(now: Instant) -> Experience<InMemoryScene> {
    let (mut exp, loaded) = experience();
    exp.on_asset_loaded(loaded).unwrap();
    exp.on_session_start();
    let mut platform = Platform { requests: 0, reject: false };
    exp.handle(UiCommand::ConfirmPlacement, now);
    exp.on_frame(now, &mut platform, &Frame(Some(Point3f::new(0.0, -1.0, -1.0))));
    assert_eq!(exp.placement_state(), PlacementState::Placed);
    exp.drain_events();
    exp
}

#[test]
fn test_placement_waits_for_surface_then_scales_to_target() {
    let (mut exp, loaded) = experience();
    let report = exp.on_asset_loaded(loaded).unwrap();
    assert_eq!(report.fallback, vec![6, 7, 8]);

    exp.on_session_start();
    let root = NodeId(0);
    let mut platform = Platform { requests: 0, reject: false };
    let now = Instant::now();

    for _ in 0..500 {
        exp.handle(UiCommand::ConfirmPlacement, now);
        exp.on_frame(now, &mut platform, &Frame(None));
        assert_eq!(exp.placement_state(), PlacementState::Unplaced);
        assert!(!exp.scene().is_visible(exp.nodes().reticle));
        assert!(!exp.scene().is_visible(root));
    }

    exp.handle(UiCommand::ConfirmPlacement, now);
    exp.on_frame(now, &mut platform, &Frame(Some(Point3f::new(0.2, -1.3, -0.5))));

    assert_eq!(exp.placement_state(), PlacementState::Placed);
    assert_relative_eq!(exp.scene().uniform_scale(root).unwrap(), 0.03, epsilon = 1e-7);
    assert!(exp.scene().is_visible(root));
    assert!(exp.scene().is_visible(exp.nodes().avatar));
    assert!(exp.nodes().markers.iter().all(|m| exp.scene().is_visible(*m)));
    assert!(!exp.scene().is_visible(exp.nodes().reticle));
    assert!(exp.drain_events().contains(&UiEvent::PlacementChanged(PlacementState::Placed)));
    assert_eq!(exp.tracker_status(), TrackerStatus::NotRequested);
}

#[test]
fn test_reticle_follows_surface_but_confirm_expires() {
    let (mut exp, loaded) = experience();
    exp.on_asset_loaded(loaded).unwrap();
    exp.on_session_start();
    let mut platform = Platform { requests: 0, reject: false };
    let now = Instant::now();

    exp.handle(UiCommand::ConfirmPlacement, now);
    exp.on_frame(now, &mut platform, &Frame(None));
    exp.on_frame(now, &mut platform, &Frame(Some(Point3f::new(1.0, -1.0, 0.0))));

    assert_eq!(exp.placement_state(), PlacementState::Unplaced);
    let reticle = exp.nodes().reticle;
    assert!(exp.scene().is_visible(reticle));
    assert_eq!(exp.scene().pose(reticle).unwrap().position, Point3f::new(1.0, -1.0, 0.0));
}

#[test]
fn test_tour_commands_ignored_while_searching() {
    let (mut exp, loaded) = experience();
    exp.on_asset_loaded(loaded).unwrap();
    exp.on_session_start();
    exp.drain_events();

    exp.handle(UiCommand::Next, Instant::now());
    exp.handle(UiCommand::ShowCurrent, Instant::now());

    assert!(exp.drain_events().is_empty());
    assert_eq!(exp.visited_count(), (0, 8));
}

#[test]
fn test_full_tour_completes_once() {
    let now = Instant::now();
    let mut exp = placed_experience(now);

    for _ in 0..8 {
        exp.handle(UiCommand::Next, now);
    }
    exp.handle(UiCommand::ShowCurrent, now);
    exp.handle(UiCommand::Next, now);

    let events = exp.drain_events();
    let completions = events.iter().filter(|e| **e == UiEvent::TourComplete).count();
    assert_eq!(completions, 1);
    assert_eq!(exp.visited_count(), (8, 8));
    assert_eq!(exp.current_poi().unwrap().id, 2);
    assert!(events.contains(&UiEvent::ShowDetail {
        id: 1,
        title: "Town hall".to_string(),
        description: "Seat of the council".to_string(),
        icon: "🏛".to_string(),
    }));
}

#[test]
fn test_avatar_settles_on_current_poi() {
    let start = Instant::now();
    let mut exp = placed_experience(start);
    let mut platform = Platform { requests: 0, reject: false };

    exp.handle(UiCommand::Previous, start);
    for step in 1..=40 {
        exp.on_frame(start + Duration::from_millis(step * 16), &mut platform, &Frame(None));
    }

    let avatar = exp.nodes().avatar;
    let target = exp.current_poi().unwrap().offset();
    assert_eq!(exp.current_poi().unwrap().id, 8);
    assert_eq!(exp.scene().local_offset(avatar), target);
    assert_eq!(platform.requests, 0);
}

#[test]
fn test_pick_marker_selects_its_poi() {
    let now = Instant::now();
    let mut exp = placed_experience(now);

    let marker = exp.nodes().markers[3];
    let world = exp.scene().world_position(marker).unwrap();
    let camera = PreviewCamera::looking_at(world + Vector3f::new(0.0, 0.0, 0.5), world, 0.8, 1.0);
    let mut picker = MarkerPicker::new(camera, (200.0, 200.0), 0.005);
    picker.set_targets(exp.nodes().markers.clone());
    exp.set_picker(Box::new(picker));

    exp.handle(UiCommand::PickAt { x: 100.0, y: 100.0 }, now);

    let events = exp.drain_events();
    assert!(events.contains(&UiEvent::CurrentPoi { index: 3, id: 4 }));
    assert!(events.iter().any(|e| matches!(e, UiEvent::ShowDetail { id: 4, .. })));
    assert_eq!(exp.visited_count(), (1, 8));

    exp.handle(UiCommand::PickAt { x: 0.0, y: 0.0 }, now);
    assert!(exp.drain_events().is_empty());
}

#[test]
fn test_asset_failure_keeps_placement_unreachable() {
    let (mut exp, _) = experience();
    assert!(exp.on_asset_loaded(Err(Error::InvalidAsset("404".to_string()))).is_none());
    exp.on_session_start();
    let mut platform = Platform { requests: 0, reject: false };
    let now = Instant::now();

    exp.handle(UiCommand::ConfirmPlacement, now);
    exp.on_frame(now, &mut platform, &Frame(Some(Point3f::origin())));

    assert!(!exp.has_asset());
    assert_eq!(exp.placement_state(), PlacementState::Unplaced);
    assert!(exp.current_poi().is_none());
}

#[test]
fn test_ar_unavailable_reported_once() {
    let (mut exp, loaded) = experience();
    exp.on_asset_loaded(loaded).unwrap();
    exp.on_session_start();
    let mut platform = Platform { requests: 0, reject: true };
    let now = Instant::now();

    for _ in 0..10 {
        exp.handle(UiCommand::ConfirmPlacement, now);
        exp.on_frame(now, &mut platform, &Frame(Some(Point3f::origin())));
    }

    let unavailable = exp
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, UiEvent::ArUnavailable(_)))
        .count();
    assert_eq!(unavailable, 1);
    assert_eq!(platform.requests, 1);
    assert_eq!(exp.tracker_status(), TrackerStatus::Failed);
}

#[test]
fn test_session_restart_reruns_search() {
    let now = Instant::now();
    let mut exp = placed_experience(now);
    let root = NodeId(0);

    exp.on_session_end();
    assert_eq!(exp.session_phase(), SessionPhase::Preview);
    assert!(exp.scene().is_visible(root));
    assert_eq!(exp.scene().uniform_scale(root), Some(1.0));

    exp.on_session_start();
    assert_eq!(exp.placement_state(), PlacementState::Unplaced);
    assert!(!exp.scene().is_visible(root));
    assert!(!exp.scene().is_visible(exp.nodes().avatar));

    let mut platform = Platform { requests: 0, reject: false };
    exp.handle(UiCommand::ConfirmPlacement, now);
    exp.on_frame(now, &mut platform, &Frame(Some(Point3f::new(3.0, 0.0, 0.0))));
    assert_eq!(exp.placement_state(), PlacementState::Placed);
    assert_eq!(exp.scene().pose(root).unwrap().position, Point3f::new(3.0, 0.0, 0.0));
}

#[test]
fn test_pick_distinguishes_pois_sharing_an_anchor() {
    let config = ExperienceConfig::from_toml_str(
        r#"
        [[poi]]
        id = 10
        name = "Harbour"
        anchor = "harbour"

        [[poi]]
        id = 11
        name = "Ferry terminal"
        anchor = "harbour"
        "#,
    )
    .unwrap();

    let mut scene = InMemoryScene::new();
    let map = scene.add_node("map", None);
    scene.add_mesh("ground", Some(map), Aabb::new(Point3f::new(-5.0, 0.0, -5.0), Point3f::new(5.0, 0.2, 5.0)));
    scene.add_mesh(
        "harbour",
        Some(map),
        Aabb::from_center_half_extents(Point3f::new(2.0, 0.5, 1.0), Vector3f::new(0.3, 0.3, 0.3)),
    );
    let nodes = ContentNodes {
        reticle: scene.add_node("reticle", None),
        avatar: scene.add_node("avatar", None),
        markers: vec![scene.add_node("marker-10", None), scene.add_node("marker-11", None)],
    };
    let loaded = scene.loaded_asset(map).ok_or(Error::InvalidAsset("no geometry".to_string()));
    let mut exp = Experience::new(config, scene, nodes).unwrap();
    exp.on_asset_loaded(loaded).unwrap();
    exp.drain_events();

    let second = exp.nodes().markers[1];
    let world = exp.scene().world_position(second).unwrap();
    let camera = PreviewCamera::looking_at(world + Vector3f::new(0.0, 0.0, 2.0), world, 0.8, 1.0);
    let mut picker = MarkerPicker::new(camera, (200.0, 200.0), 0.05);
    picker.set_targets([second]);
    exp.set_picker(Box::new(picker));

    exp.handle(UiCommand::PickAt { x: 100.0, y: 100.0 }, Instant::now());

    let events = exp.drain_events();
    assert!(events.contains(&UiEvent::CurrentPoi { index: 1, id: 11 }));
    assert_eq!(exp.current_poi().unwrap().id, 11);
    assert_eq!(exp.tour().unwrap().state().visited().iter().copied().collect::<Vec<_>>(), vec![11]);
}

//! Scripted AR session
//!
//! Drives the experience through asset load, a surface search, placement and
//! a short guided tour, with a fake platform that answers hit-test requests a
//! few frames late and a surface that only shows up after a while.
//!
//! ```text
//! RUST_LOG=debug cargo run -p arvista-demos --bin scripted_session -- --search-frames 90
//! ```

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use arvista::arvista_core::Matrix4;
use arvista::prelude::*;
use clap::Parser;
use nalgebra::UnitQuaternion;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::oneshot;

const DEFAULT_CONFIG: &str = include_str!("tour.toml");

#[derive(Parser)]
#[command(name = "scripted_session")]
#[command(about = "Run a placement and tour session against a simulated AR runtime")]
struct Args {
    /// Experience config (TOML); the bundled city tour when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frames before a surface becomes detectable
    #[arg(long, default_value_t = 120)]
    search_frames: u32,

    /// Simulated frame interval in milliseconds
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,

    /// Number of "next" presses once placed
    #[arg(long, default_value_t = 9)]
    tour_steps: usize,

    /// Frames the platform takes to answer a hit-test request
    #[arg(long, default_value_t = 3)]
    resolve_delay: u32,

    /// Make the platform refuse hit-testing
    #[arg(long)]
    no_hit_test: bool,

    /// Seed for the surface jitter
    #[arg(long, default_value_t = 7)]
    seed: u64,
}

/// Answers hit-test requests after a fixed number of frames
struct ScriptedPlatform {
    pending: Vec<oneshot::Sender<std::result::Result<HitTestSource, PlatformError>>>,
    resolve_delay: u32,
    age: u32,
    issued: u64,
    reject: bool,
}

impl ScriptedPlatform {
    fn new(resolve_delay: u32, reject: bool) -> Self {
        Self {
            pending: Vec::new(),
            resolve_delay,
            age: 0,
            issued: 0,
            reject,
        }
    }

    fn advance(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        self.age += 1;
        if self.age < self.resolve_delay {
            return;
        }
        for tx in self.pending.drain(..) {
            let answer = if self.reject {
                Err(PlatformError("hit-test feature not granted".to_string()))
            } else {
                self.issued += 1;
                Ok(HitTestSource::new(self.issued))
            };
            // the tracker may have released the request already
            let _ = tx.send(answer);
        }
    }
}

impl HitTestPlatform for ScriptedPlatform {
    fn request_hit_test_source(&mut self, space: ReferenceSpace) -> HitTestSourceRequest {
        tracing::debug!(?space, "hit-test source requested");
        let (tx, rx) = oneshot::channel();
        self.pending.push(tx);
        self.age = 0;
        rx
    }
}

struct SurfaceFrame {
    surface: Option<Pose>,
}

impl HitTestFrame for SurfaceFrame {
    fn hit_test_results(&self, _source: &HitTestSource) -> Vec<Matrix4<f32>> {
        self.surface.iter().map(Pose::to_homogeneous).collect()
    }
}

/// A 40 m city block with six of the eight tour anchors modelled
fn build_city(scene: &mut InMemoryScene) -> NodeId {
    let city = scene.add_node("City", None);
    scene.add_mesh(
        "terrain",
        Some(city),
        Aabb::new(Point3f::new(-20.0, 0.0, -15.0), Point3f::new(20.0, 0.5, 15.0)),
    );

    let district = scene.add_node("old_town", Some(city));
    let landmarks = [
        ("Town_Hall", Point3f::new(-12.0, 2.0, -6.0), 2.0),
        ("Harbour", Point3f::new(14.0, 0.5, 10.0), 3.0),
        ("cathedral", Point3f::new(-4.0, 4.0, 2.0), 1.5),
        ("Market Square", Point3f::new(2.0, 0.6, -3.0), 2.5),
        ("castle", Point3f::new(8.0, 5.0, -10.0), 3.5),
        ("River-Bridge", Point3f::new(0.0, 0.8, 8.0), 2.0),
    ];
    for (name, center, half) in landmarks {
        scene.add_mesh(
            name,
            Some(district),
            Aabb::from_center_half_extents(center, Vector3f::new(half, half, half)),
        );
    }
    city
}

fn report_events(experience: &mut Experience<InMemoryScene>) -> bool {
    let mut complete = false;
    for event in experience.drain_events() {
        match event {
            UiEvent::PlacementChanged(state) => tracing::info!(?state, "placement"),
            UiEvent::ArUnavailable(reason) => tracing::warn!(%reason, "AR unavailable"),
            UiEvent::CurrentPoi { index, id } => tracing::info!(index, id, "current POI"),
            UiEvent::VisitedCount { visited, total } => tracing::info!("visited {visited}/{total}"),
            UiEvent::ShowDetail { title, description, icon, .. } => {
                tracing::info!("{icon} {title}: {description}")
            }
            UiEvent::CloseDetail => tracing::debug!("detail closed"),
            UiEvent::TourComplete => {
                tracing::info!("tour complete");
                complete = true;
            }
        }
    }
    complete
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ExperienceConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ExperienceConfig::from_toml_str(DEFAULT_CONFIG)?,
    };

    let mut scene = InMemoryScene::new();
    let city = build_city(&mut scene);
    let nodes = ContentNodes {
        reticle: scene.add_node("reticle", None),
        avatar: scene.add_node("avatar", None),
        markers: config
            .pois
            .iter()
            .map(|poi| scene.add_node(format!("marker_{}", poi.id), None))
            .collect(),
    };
    let loaded = scene
        .loaded_asset(city)
        .ok_or_else(|| Error::InvalidAsset("city has no geometry".to_string()));

    let mut experience = Experience::new(config, scene, nodes)?;
    let Some(report) = experience.on_asset_loaded(loaded) else {
        bail!("asset could not be bound");
    };
    tracing::info!(matched = report.matched.len(), fallback = ?report.fallback, "POIs resolved");

    let frame = Duration::from_millis(args.frame_ms);
    let mut now = Instant::now();

    // preview: browse one POI before entering AR
    experience.handle(UiCommand::ShowCurrent, now);
    report_events(&mut experience);

    experience.on_session_start();
    let mut platform = ScriptedPlatform::new(args.resolve_delay, args.no_hit_test);
    let mut rng = StdRng::seed_from_u64(args.seed);
    let floor = Point3f::new(0.0, -1.4, -1.2);

    let search_budget = args.search_frames + 600;
    let mut frames = 0;
    while experience.placement_state() == PlacementState::Unplaced {
        if frames >= search_budget || experience.tracker_status() == TrackerStatus::Failed {
            report_events(&mut experience);
            experience.on_session_end();
            bail!("no placement after {frames} frames");
        }
        platform.advance();
        let surface = (frames >= args.search_frames).then(|| {
            let jitter = Vector3f::new(rng.gen_range(-0.01..0.01), 0.0, rng.gen_range(-0.01..0.01));
            let yaw = rng.gen_range(-0.05..0.05);
            Pose::new(floor + jitter, UnitQuaternion::from_euler_angles(0.0, yaw, 0.0))
        });
        // the user taps once the reticle has been visible for a moment
        if experience.scene().is_visible(experience.nodes().reticle) && rng.gen_bool(0.2) {
            experience.handle(UiCommand::ConfirmPlacement, now);
        }
        experience.on_frame(now, &mut platform, &SurfaceFrame { surface });
        report_events(&mut experience);
        now += frame;
        frames += 1;
    }
    tracing::info!(frames, "placed");

    let transition = Duration::from_millis(experience.config().transition_duration_ms);
    let settle_frames = transition.as_millis() as u64 / args.frame_ms.max(1) + 2;
    for step in 0..args.tour_steps {
        experience.handle(UiCommand::Next, now);
        for _ in 0..settle_frames {
            experience.on_frame(now, &mut platform, &SurfaceFrame { surface: None });
            now += frame;
        }
        if report_events(&mut experience) {
            tracing::info!(step, "every POI visited");
        }
        if let Some(poi) = experience.current_poi() {
            let avatar = experience.nodes().avatar;
            tracing::debug!(
                poi = %poi.display_name,
                position = ?experience.scene().world_position(avatar),
                "avatar settled"
            );
        }
    }

    experience.on_session_end();
    let (visited, total) = experience.visited_count();
    tracing::info!(visited, total, "session ended");
    Ok(())
}

//! # arvista
//!
//! Place a virtual map onto a real-world surface once per AR session, then
//! explore a fixed tour of points of interest on it.
//!
//! This is the umbrella crate: it re-exports the member crates and adds the
//! [`Experience`] orchestrator that wires them into a frame loop.
//!
//! ## Crates
//!
//! - **arvista-core**: poses, bounds, collaborator traits, in-memory scene, config
//! - **arvista-placement**: hit-test tracking, one-shot placement, session lifecycle
//! - **arvista-tour**: POI resolution, transitions, tour state machine
//!
//! ## Quick Start
//!
//! ```rust
//! use arvista::prelude::*;
//!
//! let config = ExperienceConfig::from_toml_str(
//!     r#"
//!     [[poi]]
//!     id = 1
//!     name = "Harbour"
//!     anchor = "harbour"
//!     "#,
//! )
//! .unwrap();
//!
//! let mut scene = InMemoryScene::new();
//! let map = scene.add_node("map", None);
//! scene.add_mesh("harbour", Some(map), Aabb::new(Point3f::origin(), Point3f::new(2.0, 0.2, 1.0)));
//! let nodes = ContentNodes {
//!     reticle: scene.add_node("reticle", None),
//!     avatar: scene.add_node("avatar", None),
//!     markers: vec![scene.add_node("marker-1", None)],
//! };
//! let loaded = scene.loaded_asset(map).ok_or(Error::InvalidAsset("empty".into()));
//!
//! let mut experience = Experience::new(config, scene, nodes).unwrap();
//! experience.on_asset_loaded(loaded);
//! experience.on_session_start();
//! assert_eq!(experience.placement_state(), PlacementState::Unplaced);
//! ```

pub mod experience;
pub mod ui;

pub use experience::*;
pub use ui::*;

pub use arvista_core;
pub use arvista_placement;
pub use arvista_tour;

/// Common imports
pub mod prelude {
    pub use crate::experience::{ContentNodes, Experience};
    pub use crate::ui::{UiCommand, UiEvent};
    pub use arvista_core::{
        Aabb, AssetMetrics, AssetTree, Error, ExperienceConfig, HitTestFrame, HitTestPlatform,
        HitTestSource, HitTestSourceRequest, InMemoryScene, LoadedAsset, MarkerPicker, NodeId,
        PlatformError, Point3f, Pose, PreviewCamera, ReferenceSpace, Result, SceneGraph, Vector3f,
    };
    pub use arvista_placement::{PlacementState, SessionPhase, TrackerStatus};
    pub use arvista_tour::{PoiCatalog, PoiId, PointOfInterest, TourEvent};
}

//! # arvista tour
//!
//! Points of interest on a placed scene and the guided tour over them.
//!
//! - [`PoiCatalog`] holds the authored POIs.
//! - [`PoiLocator`] resolves each POI's scale-invariant offset from the
//!   loaded asset's named nodes, with a deterministic fallback layout.
//! - [`TransitionAnimator`] eases a node between two offsets over wall-clock time.
//! - [`TourController`] owns the current index and visited set, and reports
//!   completion exactly once.

pub mod poi;
pub mod locator;
pub mod animator;
pub mod tour;

pub use poi::*;
pub use locator::*;
pub use animator::*;
pub use tour::*;

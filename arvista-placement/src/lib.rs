//! # arvista placement
//!
//! Discovers a real-world surface pose through the platform's hit-test
//! capability and binds the virtual scene to it exactly once per AR session.
//!
//! - [`PoseTracker`] owns the per-session hit-test source state machine
//!   (`NotRequested -> Requesting -> Ready | Failed`) and yields one
//!   [`ReticleSample`] per frame.
//! - [`PlacementController`] runs the at-most-once placement transaction.
//! - [`SessionLifecycleCoordinator`] owns both through a [`SessionContext`]
//!   and resets them on session boundaries.

pub mod pose_tracker;
pub mod placement;
pub mod session;

pub use pose_tracker::*;
pub use placement::*;
pub use session::*;

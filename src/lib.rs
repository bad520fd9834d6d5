//! # trikiln: triangle-collage image approximation by simulated annealing
//!
//! Approximates a target raster image with a small stack of translucent
//! colored triangles. A metropolis-style annealer mutates the scene one
//! reversible edit at a time and keeps the edits that survive the cooling
//! schedule.
//!
//! ## Architecture
//!
//! - `scene`: triangles and the scene that stacks them
//! - `mutation`: the reversible edit vocabulary and its sampling weights
//! - `state`: scene plus canvas, with the propose/accept/undo guard
//! - `render`: the drawing backend trait the optimizer evaluates through
//! - `cost`: pixel-difference cost against the target image
//! - `metrics`: resolution-invariant quality numbers (MSE, PSNR)
//! - `anneal`: the cooling schedule and the metropolis acceptance loop

pub mod anneal;
pub mod cost;
pub mod metrics;
pub mod mutation;
pub mod render;
pub mod scene;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types at crate root for convenience
pub use anneal::{AnnealConfig, Annealer, ConfigError, CostFn};
pub use cost::{DiffSink, ImageCost};
pub use metrics::CostSnapshot;
pub use mutation::MutationKind;
pub use render::{Camera, Renderer};
pub use scene::{Scene, Triangle};
pub use state::{PendingMutation, SceneState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Decorative canvas backgrounds.
//!
//! Simulation lives in plain Rust ([`viz`]) behind the [`scene::Scene`]
//! trait so it runs and tests on the host; the browser glue is compiled only
//! for wasm32.

pub mod color;
pub mod error;
pub mod grid;
pub mod mesh;
pub mod paint;
pub mod rng;
pub mod scene;
pub mod viz;

// Only compile wasm-specific code when targeting wasm32.
#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use error::VizError;
pub use scene::{Frame, Profile, Scene, Viewport};
pub use viz::Kind;

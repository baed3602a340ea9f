//! Sheep-vs-wolves steering simulation.
//!
//! Agents accumulate steering forces (seek, separation, alignment, cohesion and
//! sensor-driven attraction or avoidance) against a frozen per-tick snapshot,
//! then integrate. The `wasm` module exposes the engine to a browser renderer.

pub mod algorithms;
pub mod engine;
pub mod error;
pub mod math;
pub mod models;
pub mod sim;

#[cfg(not(target_arch = "wasm32"))]
pub mod logging;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use engine::Engine;
pub use error::{PastureError, Result};
pub use math::Vec2;
pub use models::animal::{Agent, AgentConfig, AgentHook, Kinematics};
pub use models::pasture::PastureConfig;
pub use models::sensor::{
    Activation, Behavior, Sensor, SensorConfig, SensorHook, SensorKind, Target,
};
pub use sim::{AgentId, AgentView, Commands, SensorId, Snapshot, World, WorldBounds};

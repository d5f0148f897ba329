//! Orchestration: the worker runtime, its state, and the public bridge API.

mod config;
mod frame_bridge;
mod runtime;
mod state;

pub use config::BridgeConfig;
pub use frame_bridge::FrameBridge;

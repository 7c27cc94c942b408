//! A hierarchical, timer-driven boss fight: a generic state machine, the
//! boss that runs on it, and the arena systems around it.

pub mod app;
pub mod components;
pub mod config;
pub mod effects;
pub mod engine;
pub mod error;
pub mod fsm;
pub mod logging;
pub mod recording;
pub mod scene;
pub mod systems;

//! Strategos - Opponent AI core for real-time strategy matches

pub mod command;
pub mod core;
pub mod engine;
pub mod resource;
pub mod strategy;
pub mod tactics;
pub mod terrain;
pub mod world;

pub use crate::core::{AiConfig, CoreError, Result};
pub use crate::engine::AiCore;

pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod kv;
pub mod persist;
pub mod predictions;
pub mod ranking;
pub mod schedule;
pub mod score;
pub mod scoring;
pub mod simulate;
pub mod standings;
pub mod state;

pub use engine::{Engine, SaveHandle};
pub use error::{EngineError, Result};

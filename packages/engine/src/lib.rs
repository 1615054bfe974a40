pub mod cache;
pub mod config;
pub mod database;
pub mod engine;
pub mod entity;
pub mod error;
pub mod models;
pub mod services;

pub use engine::Engine;
pub use error::{EngineError, EngineResult};

pub mod conditions;
pub mod config;
pub mod effects;
pub mod engine;
pub mod persistence;
pub mod state;

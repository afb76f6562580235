// Public API for integration tests and potential library usage

pub mod api;
pub mod app;
pub mod config;
pub mod csrf;
pub mod error;
pub mod identity;
pub mod playfield;
pub mod render;
pub mod session;
pub mod state;
pub mod store;
pub mod types;

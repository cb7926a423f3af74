//! Title voting backend: registration and login issuing signed access tokens,
//! per-user title management, and a typed client with its access gate.

pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod memory;
pub mod state;
pub mod titles;

//! # Formentor - Cupra We Connect bridge
//!
//! A standalone daemon that exposes a Cupra/VW "We Connect" vehicle account
//! over a local REST API: periodic polling with stale-cache fallback, typed
//! per-vehicle entity rendering and the remote actions (charging, climate,
//! target SOC, AC charge speed) the official app offers.
//!
//! ## Architecture
//!
//! The application follows a modular architecture with clear separation of
//! concerns:
//!
//! - `config`: Configuration management and validation
//! - `logging`: Structured logging and tracing
//! - `weconnect`: Cloud API client and the typed vehicle model
//! - `coordinator`: Periodic refresh with stale-cache fallback
//! - `commands`: Remote command dispatchers with guard semantics
//! - `entities`: Presentational entity rendering per platform
//! - `bridge`: Daemon lifecycle and status publication
//! - `web`: HTTP server and REST API

pub mod bridge;
pub mod commands;
pub mod config;
pub mod coordinator;
pub mod entities;
pub mod error;
pub mod logging;
pub mod web;
pub mod weconnect;

// Re-export commonly used types
pub use bridge::{BridgeContext, CupraBridge};
pub use config::Config;
pub use coordinator::UpdateCoordinator;
pub use error::{FormentorError, Result};
pub use weconnect::{VehicleGateway, VehicleSnapshot, WeConnectClient};

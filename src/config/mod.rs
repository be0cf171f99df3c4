//! # Configuration Module
//!
//! This module provides the engine configuration and its validation.

pub mod config;

pub use config::{AdapterConfig, OverlayConfig, default_concurrency};

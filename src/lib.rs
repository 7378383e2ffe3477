//! restoview library
//!
//! This module exposes the gateway, cache, CLI and UI modules for use in integration tests.

pub mod app;
pub mod cache;
pub mod cli;
pub mod data;
pub mod map;
pub mod ui;

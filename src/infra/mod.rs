//! Infrastructure layer (adapters/implementations).
//!
//! This module contains IO-heavy integrations (SQLite, filesystem config).

pub mod app_config;
pub mod db;

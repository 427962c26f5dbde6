//! Communication Bridge data layer.
//!
//! Durable storage for the caregiver-customized vocabulary (quick phrases and
//! picture cards with inline images and recordings) and the voice settings of
//! an assistive text-to-speech board.

pub mod application;
pub mod commands;
pub mod domain;
pub mod infra;

pub use domain::{StoreError, StoreResult};
pub use infra::db::{StoreConfig, StoreHandle};

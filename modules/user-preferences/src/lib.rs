#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Per-user preferences.
//!
//! Every tenant-scoped read and write goes through a
//! [`authgate_security::SubjectScope`] obtained from the isolation guard, so
//! one caller can never see or change another caller's record. The aggregate
//! statistics are system-level and take no subject at all.

pub mod api;
pub mod config;
pub mod domain;
pub mod infra;
pub mod module;

pub use config::PreferencesConfig;
pub use domain::model::{Preferences, PreferencesStats, PreferencesUpdate};
pub use module::PreferencesModule;

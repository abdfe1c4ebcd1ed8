//! Winder Common Library
//!
//! Shared constants, configuration loading and core vocabulary types for
//! all winder workspace crates.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and validated config types
//! - [`consts`] - System-wide default constants
//! - [`hal`] - Output-line vocabulary and the `StepBus` backend trait
//! - [`state`] - Controller lifecycle and feed-direction enums
//!
//! # Usage
//!
//! ```rust,no_run
//! use winder_common::config::{ConfigLoader, WinderConfig};
//! use std::path::Path;
//!
//! let config = WinderConfig::load(Path::new("config/winder.toml")).unwrap();
//! config.validate().unwrap();
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod state;

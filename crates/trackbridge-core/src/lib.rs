//! Core traits, types, and error handling for trackbridge.
//!
//! This crate holds the tracker-agnostic pieces: the domain model, the
//! [`FieldValue`] union for custom field payloads, the [`IssueTracker`] trait
//! and configuration.

pub mod config;
pub mod error;
pub mod provider;
pub mod types;
pub mod value;

pub use config::{Config, YouTrackConfig};
pub use error::{Error, Result};
pub use provider::IssueTracker;
pub use types::*;
pub use value::FieldValue;

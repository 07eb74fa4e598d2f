//! YouTrack provider implementation for trackbridge.
//!
//! This crate talks to the YouTrack REST API: issue search and CRUD,
//! comments, tags, links, saved searches, projects, field schemas and users.
//! Custom field writes are tagged from the value's shape (see [`infer`]),
//! and [`YouTrackService`] puts input checks and page clamping in front of
//! any [`trackbridge_core::IssueTracker`].

mod client;
mod codec;
mod inference;
mod notify;
mod service;
mod tags;
mod types;

pub use client::YouTrackClient;
pub use inference::{infer, FieldKind, InferredField};
pub use notify::{CommentSink, FailureReport, NotificationQueue, NotificationSink};
pub use service::{page_request, YouTrackService, DEFAULT_LIMIT, DEFAULT_OFFSET, MAX_LIMIT};
